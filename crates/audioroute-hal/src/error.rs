//! Module error types and status handling.
//!
//! This module provides safe error handling for calls into the audio
//! device module, converting peer-reported failures into Rust's Result
//! type.

use thiserror::Error;

/// Error type for device-module operations.
///
/// Every variant corresponds to a failure reported by (or on the way to)
/// the negotiating peer. The routing layer propagates these verbatim and
/// never retries beyond what the negotiation protocol itself prescribes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    /// The module is not reachable (transport down, module not attached).
    #[error("audio module is unavailable")]
    Unavailable,

    /// The module rejected the request outright.
    #[error("audio module rejected the request: {message}")]
    Rejected { message: String },

    /// The module does not know the referenced object.
    #[error("not found in module: {item}")]
    NotFound { item: String },

    /// Malformed request detected before reaching the module.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl ModuleError {
    /// Creates a rejection error with a message.
    pub fn rejected(message: impl Into<String>) -> Self {
        ModuleError::Rejected {
            message: message.into(),
        }
    }

    /// Creates a not found error with an item description.
    pub fn not_found(item: impl Into<String>) -> Self {
        ModuleError::NotFound { item: item.into() }
    }

    /// Creates an invalid argument error with a message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ModuleError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns true if the failure indicates the module itself is gone,
    /// as opposed to a per-request rejection.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ModuleError::Unavailable)
    }
}

/// Result type for device-module operations.
pub type ModuleResult<T> = Result<T, ModuleError>;
