//! Severity gates
//!
//! A gate decides whether a sink receives a record, before anything is
//! encoded.

use std::fmt;
use std::sync::Arc;

use kvtab_protocol::Severity;

/// Predicate over severities
#[derive(Clone)]
pub enum Gate {
    /// Accept `threshold` and everything more severe
    AtLeast(Severity),

    /// Accept whatever the predicate accepts
    Custom(Arc<dyn Fn(Severity) -> bool + Send + Sync>),
}

impl Gate {
    #[inline]
    pub fn at_least(threshold: Severity) -> Self {
        Self::AtLeast(threshold)
    }

    /// Error and fatal only
    #[inline]
    pub fn errors() -> Self {
        Self::AtLeast(Severity::Error)
    }

    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(Severity) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    #[inline]
    pub fn enabled(&self, severity: Severity) -> bool {
        match self {
            Self::AtLeast(threshold) => severity >= *threshold,
            Self::Custom(predicate) => predicate(severity),
        }
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::AtLeast(Severity::default())
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtLeast(threshold) => f.debug_tuple("AtLeast").field(threshold).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
