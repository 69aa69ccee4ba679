//! Error types for the interaction controller
//!
//! Most runtime conditions (missing menu, too few slides, no intersection
//! support) are silent degradations and never surface here. These errors
//! cover configuration decoding, selector parsing and host binding failures.

use thiserror::Error;

/// Errors that can occur while configuring or binding the controller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageflowError {
    /// Configuration JSON could not be decoded
    #[error("config error: {0}")]
    Config(String),

    /// A configuration value is outside its allowed range
    #[error("invalid config value '{field}': {reason}")]
    InvalidConfig {
        /// The offending field
        field: &'static str,
        /// Why it was rejected
        reason: &'static str,
    },

    /// A selector could not be parsed
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector {
        /// The selector text
        selector: String,
        /// What the parser rejected
        reason: &'static str,
    },

    /// The host environment failed an operation the binding depends on
    #[error("host error in '{op}': {message}")]
    Host {
        /// The operation that was attempted
        op: &'static str,
        /// Message reported by the host
        message: String,
    },
}

impl PageflowError {
    /// Create a host error with message.
    pub fn host(op: &'static str, message: impl Into<String>) -> Self {
        Self::Host {
            op,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for PageflowError {
    fn from(e: serde_json::Error) -> Self {
        PageflowError::Config(e.to_string())
    }
}

/// Result type alias for controller operations
pub type PageflowResult<T> = Result<T, PageflowError>;
