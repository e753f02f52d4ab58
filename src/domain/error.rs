//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Errors raised by collection operations.
///
/// Retry failures have their own generic type, see [`crate::domain::retry::RetryError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    #[error("invalid argument `{argument}`: {message}")]
    InvalidArgument {
        argument: &'static str,
        message: String,
    },

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("sequence is dispatching a change notification; reentrant mutation refused")]
    ReentrancyViolation,

    #[error("cannot parse `{value}`: {message}")]
    Parse { value: String, message: String },
}

impl CollectionError {
    pub(crate) fn invalid_argument(argument: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            message: message.into(),
        }
    }

    pub(crate) fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::invalid_argument("index", format!("{} is out of range for length {}", index, len))
    }
}

/// Result type for collection operations.
pub type CollectionResult<T> = Result<T, CollectionError>;
