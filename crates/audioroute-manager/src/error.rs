//! Routing manager error types.

use audioroute_hal::ModuleError;
use thiserror::Error;

/// Error type for routing manager operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The catalog was never loaded, the module went away, or a
    /// negotiation deadlocked (the module refused its own suggestion).
    #[error("route manager is not initialized")]
    NotInitialized,

    /// Malformed request: missing flags on a creation path, unknown
    /// handle on release, no port matching a descriptor.
    #[error("invalid request: {0}")]
    BadValue(String),

    /// Failure reported by the device module, propagated verbatim.
    #[error(transparent)]
    Module(#[from] ModuleError),
}

impl RouteError {
    /// Creates a bad value error with a message.
    pub fn bad_value(message: impl Into<String>) -> Self {
        RouteError::BadValue(message.into())
    }
}

/// Result type for routing manager operations.
pub type RouteResult<T> = Result<T, RouteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_error_conversion() {
        let err: RouteError = ModuleError::rejected("busy").into();
        assert!(matches!(err, RouteError::Module(_)));
        assert_eq!(err.to_string(), "audio module rejected the request: busy");
    }

    #[test]
    fn test_bad_value_display() {
        let err = RouteError::bad_value("no flags");
        assert_eq!(err.to_string(), "invalid request: no flags");
    }
}
