//! Call-site logging API
//!
//! `Logger` is the handle applications log through. It is created once,
//! owned by the caller and passed around; there is no global instance.
//!
//! The helper methods fix the key layout of common events so collectors can
//! rely on it:
//!
//! | Helper | Fields after the header |
//! |--------|-------------------------|
//! | `log_start` | `obj=START info cost` |
//! | `log` | `obj info` |
//! | `log_data` | `obj data` |
//! | `log_err` | `obj info err` |
//! | `log_third_party` | `obj host info cost` |
//! | `log_panic` | `obj info err` at fatal, then panics |
//! | `log_req` | `obj reqId info` |
//! | `log_req_data` | `obj reqId data` |
//! | `log_req_err` | `obj reqId info err` |
//! | `log_req_third_party` | `obj reqId host info cost` |
//! | `log_req_begin` | `obj=RB reqId reqClientIP reqUri reqParams cost` |
//! | `log_req_end` | `obj=RE reqId retData cost` |
//!
//! `cost` is the number of milliseconds since the `Instant` passed in.
//! Helpers never fail: delivery errors go to a rate-limited diagnostic.
//! Use `emit` to get them back.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use kvtab_config::LogConfig;
use kvtab_protocol::keys::{self, obj};
use kvtab_protocol::{Caller, Field, KvTabEncoder, LogRecord, Severity};
use kvtab_sinks::{
    AsyncSink, AsyncSinkConfig, BufferedAccumulator, RateLimitedLogger, RotatingFile,
    SizeTrackingAccumulator,
};
use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::gate::Gate;
use crate::router::{Router, SinkReport};
use crate::sink_handle::SinkHandle;

/// Sink receiving every record at or above the configured threshold
pub const PRIMARY_SINK: &str = "primary";

/// Sink receiving error and fatal records
pub const SECONDARY_SINK: &str = "secondary";

/// Application-facing logger
pub struct Logger {
    router: Router,
    error_logger: RateLimitedLogger,
}

impl Logger {
    /// Log through an already assembled router
    pub fn new(router: Router) -> Self {
        Self {
            router,
            error_logger: RateLimitedLogger::default(),
        }
    }

    /// Open the main and error log files described by `config`
    ///
    /// Each file gets its own rotation, buffering and async sink. Must be
    /// called inside a Tokio runtime.
    pub fn from_config(config: &LogConfig) -> Result<Self> {
        config.validate()?;
        let threshold = config.severity()?;

        let primary = open_file_sink(PRIMARY_SINK, &config.log_file_path(), config)?;
        let secondary = open_file_sink(SECONDARY_SINK, &config.error_log_file_path(), config)?;

        let mut router = Router::new(KvTabEncoder::default());
        router.register_sink(SinkHandle::new(
            PRIMARY_SINK,
            Gate::at_least(threshold),
            Arc::new(primary),
        ));
        router.register_sink(SinkHandle::new(
            SECONDARY_SINK,
            Gate::errors(),
            Arc::new(secondary),
        ));

        tracing::info!(
            path = %config.log_file_path().display(),
            error_path = %config.error_log_file_path().display(),
            threshold = %threshold,
            "logger initialized"
        );

        Ok(Self::new(router))
    }

    #[inline]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Whether a record of `severity` would reach any file
    #[inline]
    pub fn enabled(&self, severity: Severity) -> bool {
        self.router.enabled(severity)
    }

    /// Log one record with the caller's location
    ///
    /// Returns the number of sinks that accepted the line.
    #[track_caller]
    pub fn emit(
        &self,
        severity: Severity,
        origin: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Result<usize> {
        let record = LogRecord::new(severity, origin)
            .with_caller(Caller::here())
            .with_message(message)
            .with_fields(fields);
        self.router.route(&record)
    }

    /// Startup finished; `start` is when startup began
    #[track_caller]
    pub fn log_start(&self, severity: Severity, info: &str, start: Instant) {
        let record = self
            .record(severity, obj::START)
            .with_message(info.to_owned())
            .with_field(cost(start));
        self.submit(&record);
    }

    #[track_caller]
    pub fn log(&self, severity: Severity, origin: &str, info: &str) {
        let record = self.record(severity, origin).with_message(info.to_owned());
        self.submit(&record);
    }

    /// Offline data; structs and maps are written as JSON
    #[track_caller]
    pub fn log_data<T>(&self, severity: Severity, origin: &str, data: T)
    where
        T: Serialize + Send + Sync + 'static,
    {
        let record = self
            .record(severity, origin)
            .with_field(Field::any(keys::DATA, data));
        self.submit(&record);
    }

    #[track_caller]
    pub fn log_err(&self, severity: Severity, origin: &str, info: &str, err: &dyn fmt::Display) {
        let record = self
            .record(severity, origin)
            .with_message(info.to_owned())
            .with_field(Field::error(keys::ERR, err));
        self.submit(&record);
    }

    /// Call to another service (database, cache, CDN) outside a request
    #[track_caller]
    pub fn log_third_party(
        &self,
        severity: Severity,
        origin: &str,
        host: &str,
        info: &str,
        start: Instant,
    ) {
        let record = self.record(severity, origin).with_fields([
            Field::string(keys::HOST, host.to_owned()),
            Field::string(keys::INFO, info.to_owned()),
            cost(start),
        ]);
        self.submit(&record);
    }

    /// Log at fatal, sync, then panic with `info` and `err`
    ///
    /// Meant for unrecoverable initialization failures.
    #[track_caller]
    pub fn log_panic(&self, origin: &str, info: &str, err: &dyn fmt::Display) -> ! {
        let record = self
            .record(Severity::Fatal, origin)
            .with_message(info.to_owned())
            .with_field(Field::error(keys::ERR, err));
        self.submit(&record);
        if let Err(e) = self.router.sync() {
            self.error_logger.error("sync", "sync before panic failed", &e);
        }
        panic!("info={info}\terr={err}");
    }

    #[track_caller]
    pub fn log_req(&self, severity: Severity, origin: &str, req_id: &str, info: &str) {
        let record = self.record(severity, origin).with_fields([
            Field::string(keys::REQ_ID, req_id.to_owned()),
            Field::string(keys::INFO, info.to_owned()),
        ]);
        self.submit(&record);
    }

    #[track_caller]
    pub fn log_req_data<T>(&self, severity: Severity, origin: &str, req_id: &str, data: T)
    where
        T: Serialize + Send + Sync + 'static,
    {
        let record = self.record(severity, origin).with_fields([
            Field::string(keys::REQ_ID, req_id.to_owned()),
            Field::any(keys::DATA, data),
        ]);
        self.submit(&record);
    }

    #[track_caller]
    pub fn log_req_err(
        &self,
        severity: Severity,
        origin: &str,
        req_id: &str,
        info: &str,
        err: &dyn fmt::Display,
    ) {
        let record = self.record(severity, origin).with_fields([
            Field::string(keys::REQ_ID, req_id.to_owned()),
            Field::string(keys::INFO, info.to_owned()),
            Field::error(keys::ERR, err),
        ]);
        self.submit(&record);
    }

    /// Call to another service while handling a request
    #[track_caller]
    pub fn log_req_third_party(
        &self,
        severity: Severity,
        origin: &str,
        req_id: &str,
        host: &str,
        info: &str,
        start: Instant,
    ) {
        let record = self.record(severity, origin).with_fields([
            Field::string(keys::REQ_ID, req_id.to_owned()),
            Field::string(keys::HOST, host.to_owned()),
            Field::string(keys::INFO, info.to_owned()),
            cost(start),
        ]);
        self.submit(&record);
    }

    /// Request fully received; `start` is when receiving began
    #[track_caller]
    pub fn log_req_begin(
        &self,
        severity: Severity,
        req_id: &str,
        client_ip: &str,
        uri: &str,
        params: &str,
        start: Instant,
    ) {
        let record = self.record(severity, obj::REQ_BEGIN).with_fields([
            Field::string(keys::REQ_ID, req_id.to_owned()),
            Field::string(keys::REQ_CLIENT_IP, client_ip.to_owned()),
            Field::string(keys::REQ_URI, uri.to_owned()),
            Field::string(keys::REQ_PARAMS, params.to_owned()),
            cost(start),
        ]);
        self.submit(&record);
    }

    /// Request handled; `start` is the same instant given to `log_req_begin`
    #[track_caller]
    pub fn log_req_end(&self, severity: Severity, req_id: &str, ret_data: &str, start: Instant) {
        let record = self.record(severity, obj::REQ_END).with_fields([
            Field::string(keys::REQ_ID, req_id.to_owned()),
            Field::string(keys::RET_DATA, ret_data.to_owned()),
            cost(start),
        ]);
        self.submit(&record);
    }

    /// Flush both files
    pub fn sync(&self) -> Result<()> {
        self.router.sync()
    }

    /// Drain the queues and sync; the logger keeps working synchronously after
    pub async fn shutdown(&self) -> Result<Vec<SinkReport>> {
        let reports = self.router.shutdown().await?;
        for SinkReport { sink, report } in &reports {
            tracing::debug!(
                sink = %sink,
                drained = report.drained,
                discarded = report.discarded,
                "logger sink shut down"
            );
        }
        Ok(reports)
    }

    /// Delivery failures swallowed by the helper methods
    pub fn failed_records(&self) -> u64 {
        self.error_logger.total_error_count()
    }

    #[track_caller]
    fn record(&self, severity: Severity, origin: &str) -> LogRecord {
        LogRecord::new(severity, origin.to_owned()).with_caller(Caller::here())
    }

    fn submit(&self, record: &LogRecord) {
        match self.router.route(record) {
            Ok(_) => {}
            Err(e @ PipelineError::Encode(_)) => {
                self.error_logger.error("encode", "dropped log record", &e);
            }
            Err(e) => {
                for failure in e.sink_failures() {
                    self.error_logger
                        .error(&failure.sink, "log delivery failed", &failure.error);
                }
                if e.sink_failures().is_empty() {
                    self.error_logger.error("route", "log delivery failed", &e);
                }
            }
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

/// Milliseconds since `start`
fn cost(start: Instant) -> Field {
    let elapsed = i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX);
    Field::int(keys::COST, elapsed)
}

/// Rotating file behind a size-tracked buffer behind an async sink
fn open_file_sink(name: &str, path: &Path, config: &LogConfig) -> Result<AsyncSink> {
    let file = RotatingFile::open(path, config.max_size_bytes(), config.max_log_file_num).map_err(
        |source| PipelineError::Open {
            path: path.to_path_buf(),
            source,
        },
    )?;
    let buffered = BufferedAccumulator::with_capacity(file, config.buffer_size);
    let writer = SizeTrackingAccumulator::new(buffered, config.max_size_bytes());

    let sink_config = AsyncSinkConfig::default()
        .with_name(name)
        .with_queue_size(config.queue_size)
        .with_flush_interval(config.flush_interval())
        .with_drain_grace(config.drain_grace());

    Ok(AsyncSink::spawn(writer, sink_config)?)
}
