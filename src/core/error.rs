//! Error types.
//!
//! Strata distinguishes configuration faults, which are the caller's to fix,
//! from construction faults, which wrap a collaborator's failure and are
//! fatal to the single `create()` call that hit them. Shutdown failures are
//! logged warnings, never error values: shutdown is total-effort.

use thiserror::Error;

/// Boxed error type used at the collaborator seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Common Strata error conditions.
#[derive(Debug, Error)]
pub enum StrataError {
    /// Malformed or contradictory service configuration.
    ///
    /// Raised only by explicit validation. Absent or invalid optional fields
    /// fall back to their documented defaults instead of erroring.
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    /// A coordination cache or the ensemble client failed to construct.
    ///
    /// Always logged with the attempted configuration before being surfaced;
    /// never retried here. Retry policy belongs to the caller.
    #[error("failed to construct {context}")]
    Construction {
        context: String,
        #[source]
        source: BoxError,
    },
}

impl StrataError {
    /// Create a Configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a Construction error wrapping a collaborator failure.
    pub fn construction(context: impl Into<String>, source: BoxError) -> Self {
        Self::Construction {
            context: context.into(),
            source,
        }
    }

    /// Check if this error is a configuration fault.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Check if this error wraps a construction failure.
    pub fn is_construction(&self) -> bool {
        matches!(self, Self::Construction { .. })
    }
}

/// Result type using StrataError.
pub type StrataResult<T> = Result<T, StrataError>;
