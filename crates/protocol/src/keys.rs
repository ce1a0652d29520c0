//! Well-known keys and origin tags
//!
//! Collectors parse lines by key, so these names are part of the format.

/// Timestamp header key
pub const TIMESTAMP: &str = "ts";
/// Caller header key
pub const FILE: &str = "file";
/// Severity literal header key
pub const LOG_LEVEL: &str = "logLev";
/// Origin tag key
pub const OBJ: &str = "obj";
pub const HOST: &str = "host";
/// Free-text message key
pub const INFO: &str = "info";
/// Offline data payload
pub const DATA: &str = "data";
pub const ERR: &str = "err";
/// Elapsed milliseconds
pub const COST: &str = "cost";
pub const REQ_ID: &str = "reqId";
pub const REQ_CLIENT_IP: &str = "reqClientIP";
pub const REQ_HOST: &str = "reqHost";
pub const REQ_URI: &str = "reqUri";
pub const REQ_PARAMS: &str = "reqParams";
pub const RET_DATA: &str = "retData";
pub const RET_CODE: &str = "retCode";

/// Origin tags used by the call-site helpers
pub mod obj {
    pub const INIT: &str = "INIT";
    pub const START: &str = "START";
    pub const LOAD_CONFIG: &str = "LOAD_CONFIG";
    /// Request begin
    pub const REQ_BEGIN: &str = "RB";
    /// Inside request handling
    pub const REQ: &str = "REQ";
    /// Request end
    pub const REQ_END: &str = "RE";
}
