//! Tab-separated key=value line encoder
//!
//! `KvTabEncoder` holds the immutable configuration and a buffer pool. Each
//! record is rendered by a fresh `EntryEncoder` that owns one pooled buffer;
//! the entry encoder is consumed by `encode`, which hands the finished line
//! back to the caller. Nothing retains the buffer after that.
//!
//! # Value rendering
//!
//! | Value | Output |
//! |-------|--------|
//! | `Str` / `ByteStr` | raw bytes |
//! | `Binary` | base64 (standard, padded) |
//! | `Bool` / `I64` / `U64` | decimal literal |
//! | `F64` / `F32` | shortest decimal; `"NaN"`, `"+Inf"`, `"-Inf"` quoted |
//! | `Duration` / `Time` | configured encoder, integer nanoseconds if it writes nothing |
//! | `Array` | `[a b c]` |
//! | `Object` | `{<sep>k=v<sep>k2=v2}` |
//! | `Reflected` | JSON, `null` when absent |

use std::fmt::{self, Write as FmtWrite};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Local};

use crate::error::EncodeError;
use crate::field::{Field, Reflect, Value};
use crate::keys;
use crate::pool::BufferPool;
use crate::record::LogRecord;

/// Renders a timestamp into the line buffer
pub type TimeEncoder = Arc<dyn Fn(&DateTime<Local>, &mut BytesMut) + Send + Sync>;

/// Renders a duration into the line buffer
pub type DurationEncoder = Arc<dyn Fn(Duration, &mut BytesMut) + Send + Sync>;

/// Month-day local time with milliseconds: `01-02T15:04:05.000`
pub fn day_milli_time(time: &DateTime<Local>, buf: &mut BytesMut) {
    let _ = write!(buf, "{}", time.format("%m-%dT%H:%M:%S%.3f"));
}

/// Floating-point seconds: `1.5`
pub fn seconds_duration(duration: Duration, buf: &mut BytesMut) {
    let _ = write!(buf, "{}", duration.as_secs_f64());
}

/// Encoder configuration shared by every entry encoder
#[derive(Clone)]
pub struct EncoderConfig {
    /// Key of the timestamp header (default: `ts`)
    pub time_key: String,

    /// Key of the caller header; empty disables it (default: `file`)
    pub caller_key: String,

    /// Key of the severity literal header; empty disables it (default: `logLev`)
    pub message_key: String,

    /// Key the record origin is written under (default: `obj`)
    pub origin_key: String,

    /// Key the record message is written under (default: `info`)
    pub info_key: String,

    /// Byte between tokens (default: tab)
    pub separator: u8,

    /// Line terminator (default: `\n`)
    pub line_ending: String,

    /// Timestamp renderer (default: `day_milli_time`)
    pub encode_time: TimeEncoder,

    /// Duration renderer (default: `seconds_duration`)
    pub encode_duration: DurationEncoder,

    /// Capacity hint for pooled line buffers
    pub buffer_capacity: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            time_key: keys::TIMESTAMP.into(),
            caller_key: keys::FILE.into(),
            message_key: keys::LOG_LEVEL.into(),
            origin_key: keys::OBJ.into(),
            info_key: keys::INFO.into(),
            separator: b'\t',
            line_ending: "\n".into(),
            encode_time: Arc::new(day_milli_time),
            encode_duration: Arc::new(seconds_duration),
            buffer_capacity: crate::DEFAULT_LINE_CAPACITY,
        }
    }
}

impl EncoderConfig {
    /// Replace the timestamp renderer
    #[must_use]
    pub fn with_time_encoder<F>(mut self, f: F) -> Self
    where
        F: Fn(&DateTime<Local>, &mut BytesMut) + Send + Sync + 'static,
    {
        self.encode_time = Arc::new(f);
        self
    }

    /// Replace the duration renderer
    #[must_use]
    pub fn with_duration_encoder<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration, &mut BytesMut) + Send + Sync + 'static,
    {
        self.encode_duration = Arc::new(f);
        self
    }

    /// Drop the caller header
    #[must_use]
    pub fn without_caller(mut self) -> Self {
        self.caller_key.clear();
        self
    }
}

impl fmt::Debug for EncoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderConfig")
            .field("time_key", &self.time_key)
            .field("caller_key", &self.caller_key)
            .field("message_key", &self.message_key)
            .field("origin_key", &self.origin_key)
            .field("info_key", &self.info_key)
            .field("separator", &(self.separator as char))
            .field("line_ending", &self.line_ending)
            .field("buffer_capacity", &self.buffer_capacity)
            .finish_non_exhaustive()
    }
}

/// Shared, cheaply clonable line encoder
///
/// Clones share the configuration and the buffer pool. Encoding never
/// touches shared mutable state apart from the lock-free pool, so one
/// encoder can serve any number of threads.
#[derive(Clone, Debug)]
pub struct KvTabEncoder {
    config: Arc<EncoderConfig>,
    pool: Arc<BufferPool>,
}

impl KvTabEncoder {
    /// Create an encoder with its own buffer pool
    pub fn new(config: EncoderConfig) -> Self {
        let pool = Arc::new(BufferPool::new(config.buffer_capacity));
        Self::with_pool(config, pool)
    }

    /// Create an encoder drawing line buffers from `pool`
    pub fn with_pool(config: EncoderConfig, pool: Arc<BufferPool>) -> Self {
        Self {
            config: Arc::new(config),
            pool,
        }
    }

    #[inline]
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    #[inline]
    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    /// Start a single-use entry encoder with a fresh pooled buffer
    pub fn entry(&self) -> EntryEncoder<'_> {
        EntryEncoder {
            config: &self.config,
            buf: self.pool.get(),
            reflect_buf: Vec::new(),
        }
    }

    /// Render one record into a pooled line buffer
    ///
    /// Return the line with `recycle` once every consumer is done with it.
    pub fn encode(&self, record: &LogRecord) -> Result<BytesMut, EncodeError> {
        self.entry().encode(record)
    }

    /// Hand a line buffer (or the partial line of an `EncodeError`) back
    #[inline]
    pub fn recycle(&self, line: BytesMut) {
        self.pool.put(line);
    }
}

impl Default for KvTabEncoder {
    fn default() -> Self {
        Self::new(EncoderConfig::default())
    }
}

/// Per-record encoder owning one line buffer
///
/// Never shared: created by `KvTabEncoder::entry` and consumed by `encode`.
pub struct EntryEncoder<'a> {
    config: &'a EncoderConfig,
    buf: BytesMut,

    /// Scratch space for JSON payloads, so a failed serialization leaves the
    /// line untouched
    reflect_buf: Vec<u8>,
}

/// Serialization failure of one field
struct FieldFailure {
    key: String,
    source: serde_json::Error,
}

impl EntryEncoder<'_> {
    /// Render the record and hand off the line buffer
    pub fn encode(mut self, record: &LogRecord) -> Result<BytesMut, EncodeError> {
        match self.encode_record(record) {
            Ok(()) => Ok(self.buf),
            Err(FieldFailure { key, source }) => Err(EncodeError {
                key,
                source,
                partial: self.buf,
            }),
        }
    }

    fn encode_record(&mut self, record: &LogRecord) -> Result<(), FieldFailure> {
        let config = self.config;

        // 01-02T15:04:05.000
        self.buf.extend_from_slice(config.time_key.as_bytes());
        self.buf.put_u8(b'=');
        self.append_time(record.time());

        // src/server.rs:42
        if !config.caller_key.is_empty()
            && let Some(caller) = record.caller()
        {
            self.add_key(&config.caller_key);
            let _ = write!(self.buf, "{caller}");
        }

        if !config.message_key.is_empty() {
            self.add_key(&config.message_key);
            self.buf
                .extend_from_slice(record.severity().literal().as_bytes());
        }

        if !config.origin_key.is_empty() && !record.origin().is_empty() {
            self.add_key(&config.origin_key);
            self.buf.extend_from_slice(record.origin().as_bytes());
        }

        if !config.info_key.is_empty()
            && let Some(message) = record.message()
        {
            self.add_key(&config.info_key);
            self.buf.extend_from_slice(message.as_bytes());
        }

        for field in record.fields() {
            self.add_field(field)?;
        }

        self.buf.extend_from_slice(config.line_ending.as_bytes());
        Ok(())
    }

    fn add_field(&mut self, field: &Field) -> Result<(), FieldFailure> {
        let failure = |source| FieldFailure {
            key: field.key().to_string(),
            source,
        };

        match field.value() {
            // Serialize before writing the key so a failure leaves no trace
            Value::Reflected(payload) => {
                self.reflect(payload.as_deref()).map_err(failure)?;
                self.add_key(field.key());
                self.buf.extend_from_slice(&self.reflect_buf);
            }
            value => {
                self.add_key(field.key());
                self.append_value(value).map_err(failure)?;
            }
        }
        Ok(())
    }

    fn add_key(&mut self, key: &str) {
        self.buf.put_u8(self.config.separator);
        self.buf.extend_from_slice(key.as_bytes());
        self.buf.put_u8(b'=');
    }

    fn append_value(&mut self, value: &Value) -> serde_json::Result<()> {
        match value {
            Value::Str(s) => self.buf.extend_from_slice(s.as_bytes()),
            Value::ByteStr(bytes) => self.buf.extend_from_slice(bytes),
            Value::Binary(bytes) => {
                self.buf.extend_from_slice(STANDARD.encode(bytes).as_bytes());
            }
            Value::Bool(true) => self.buf.extend_from_slice(b"true"),
            Value::Bool(false) => self.buf.extend_from_slice(b"false"),
            Value::I64(v) => {
                let _ = write!(self.buf, "{v}");
            }
            Value::U64(v) => {
                let _ = write!(self.buf, "{v}");
            }
            Value::F64(v) => self.append_f64(*v),
            Value::F32(v) => self.append_f32(*v),
            Value::Duration(d) => self.append_duration(*d),
            Value::Time(t) => self.append_time(t),
            Value::Array(items) => {
                self.buf.put_u8(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.buf.put_u8(b' ');
                    }
                    self.append_value(item)?;
                }
                self.buf.put_u8(b']');
            }
            Value::Object(fields) => {
                self.buf.put_u8(b'{');
                for field in fields {
                    self.add_key(field.key());
                    self.append_value(field.value())?;
                }
                self.buf.put_u8(b'}');
            }
            Value::Reflected(payload) => {
                self.reflect(payload.as_deref())?;
                self.buf.extend_from_slice(&self.reflect_buf);
            }
        }
        Ok(())
    }

    /// Serialize a payload into the scratch buffer
    fn reflect(&mut self, payload: Option<&dyn Reflect>) -> serde_json::Result<()> {
        self.reflect_buf.clear();
        match payload {
            None => self.reflect_buf.extend_from_slice(b"null"),
            Some(value) => value.write_json(&mut self.reflect_buf)?,
        }
        Ok(())
    }

    fn append_f64(&mut self, v: f64) {
        if v.is_nan() {
            self.buf.extend_from_slice(br#""NaN""#);
        } else if v == f64::INFINITY {
            self.buf.extend_from_slice(br#""+Inf""#);
        } else if v == f64::NEG_INFINITY {
            self.buf.extend_from_slice(br#""-Inf""#);
        } else {
            let _ = write!(self.buf, "{v}");
        }
    }

    fn append_f32(&mut self, v: f32) {
        if v.is_finite() {
            let _ = write!(self.buf, "{v}");
        } else {
            self.append_f64(f64::from(v));
        }
    }

    fn append_duration(&mut self, duration: Duration) {
        let before = self.buf.len();
        (self.config.encode_duration)(duration, &mut self.buf);
        if self.buf.len() == before {
            // Encoder wrote nothing - keep the token well-formed
            let nanos = i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX);
            let _ = write!(self.buf, "{nanos}");
        }
    }

    fn append_time(&mut self, time: &DateTime<Local>) {
        let before = self.buf.len();
        (self.config.encode_time)(time, &mut self.buf);
        if self.buf.len() == before {
            let nanos = time.timestamp_nanos_opt().unwrap_or_default();
            let _ = write!(self.buf, "{nanos}");
        }
    }
}
