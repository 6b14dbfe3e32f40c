//! Structured error types shared across the nested sampling crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`NestError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (dimensions, iteration index, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the nested sampler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum NestError {
    /// Too few points, or a singular covariance, for a full ellipsoid fit.
    #[error("degenerate input: {0}")]
    Degenerate(ErrorInfo),
    /// A shape matrix is not positive semi-definite.
    #[error("invalid shape: {0}")]
    InvalidShape(ErrorInfo),
    /// The replacement search exhausted its attempt budget.
    #[error("sampling stalled: {0}")]
    SamplingStalled(ErrorInfo),
    /// A run observed its cancellation flag.
    #[error("cancelled: {0}")]
    Cancelled(ErrorInfo),
    /// Invalid dimensions or mismatched point lengths.
    #[error("geometry error: {0}")]
    Geometry(ErrorInfo),
    /// Invalid run configuration.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Serialization and I/O errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl NestError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            NestError::Degenerate(info)
            | NestError::InvalidShape(info)
            | NestError::SamplingStalled(info)
            | NestError::Cancelled(info)
            | NestError::Geometry(info)
            | NestError::Config(info)
            | NestError::Serde(info) => info,
        }
    }

    /// Whether callers are expected to recover locally (fallback ellipsoid or
    /// eigenvalue clamping) instead of aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, NestError::Degenerate(_) | NestError::InvalidShape(_))
    }
}
