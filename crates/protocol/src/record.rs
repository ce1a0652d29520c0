//! Log record
//!
//! One log call: severity, origin, optional caller and message, fields.
//! Records are built once, encoded once and dropped.

use std::borrow::Cow;
use std::fmt;
use std::panic::Location;

use chrono::{DateTime, Local};

use crate::field::Field;
use crate::severity::Severity;

/// Source location of a log call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    file: &'static str,
    line: u32,
}

impl Caller {
    /// Create a caller from a file path and line number
    #[inline]
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// Location of the function that called this one
    ///
    /// Combined with `#[track_caller]` on the public logging methods this
    /// resolves to the user's call site.
    #[inline]
    #[track_caller]
    pub fn here() -> Self {
        let location = Location::caller();
        Self::new(location.file(), location.line())
    }

    /// Full file path as compiled
    #[inline]
    pub fn file(&self) -> &'static str {
        self.file
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Last two path components, e.g. `src/server.rs`
    pub fn short_file(&self) -> &'static str {
        let file = self.file;
        let mut separators = file
            .char_indices()
            .rev()
            .filter(|(_, c)| *c == '/' || *c == '\\');

        match (separators.next(), separators.next()) {
            (Some(_), Some((idx, _))) => &file[idx + 1..],
            _ => file,
        }
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.short_file(), self.line)
    }
}

/// One log call, ready for encoding
#[derive(Debug, Clone)]
pub struct LogRecord {
    severity: Severity,
    time: DateTime<Local>,
    origin: Cow<'static, str>,
    message: Option<Cow<'static, str>>,
    caller: Option<Caller>,
    fields: Vec<Field>,
}

impl LogRecord {
    /// Create a record stamped with the current local time
    pub fn new(severity: Severity, origin: impl Into<Cow<'static, str>>) -> Self {
        Self {
            severity,
            time: Local::now(),
            origin: origin.into(),
            message: None,
            caller: None,
            fields: Vec::new(),
        }
    }

    /// Set the message rendered under the info key
    #[must_use]
    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the caller location
    #[must_use]
    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Override the capture time
    #[must_use]
    pub fn with_time(mut self, time: DateTime<Local>) -> Self {
        self.time = time;
        self
    }

    /// Append one field
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Append fields in order
    #[must_use]
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    #[inline]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[inline]
    pub fn time(&self) -> &DateTime<Local> {
        &self.time
    }

    #[inline]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[inline]
    pub fn caller(&self) -> Option<&Caller> {
        self.caller.as_ref()
    }

    #[inline]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}
