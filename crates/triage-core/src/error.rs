//! Error types for OpsTriage core operations.
//!
//! Adapter-internal failures never cross the pipeline boundary as errors;
//! they are caught and replaced with empty bundles. The variants here cover
//! the failures that *are* surfaced: bad configuration at construction time,
//! unknown incidents at the request boundary, and invalid values.

use thiserror::Error;

/// Result alias used across all triage crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is invalid or incomplete. Raised once at startup,
    /// never per request.
    #[error("configuration error: {0}")]
    Config(String),

    /// The requested incident does not exist.
    #[error("incident not found: {incident_id}")]
    NotFound {
        /// The incident id that could not be resolved.
        incident_id: String,
    },

    /// A data-source adapter failed internally.
    #[error("adapter '{adapter}' failed: {message}")]
    Adapter {
        /// Adapter name (e.g. "tickets", "logs").
        adapter: String,
        /// Failure description.
        message: String,
    },

    /// A field carried a value outside its accepted domain.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// Field or parameter name.
        field: String,
        /// What was wrong with it.
        message: String,
    },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not-found error for an incident id.
    pub fn not_found(incident_id: impl Into<String>) -> Self {
        Self::NotFound {
            incident_id: incident_id.into(),
        }
    }

    /// Create an adapter failure error.
    pub fn adapter(adapter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Adapter {
            adapter: adapter.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-value error.
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether this error is the distinct not-found outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinct() {
        let err = Error::not_found("INC999");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "incident not found: INC999");

        let err = Error::config("missing variables");
        assert!(!err.is_not_found());
    }

    #[test]
    fn adapter_error_names_adapter() {
        let err = Error::adapter("logs", "backend unreachable");
        assert_eq!(err.to_string(), "adapter 'logs' failed: backend unreachable");
    }
}
