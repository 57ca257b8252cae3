//! Error types for configuration and emission.
//!
//! Configuration errors are fatal and synchronous: they surface from
//! `setup_logging` before any pipeline is installed. Emission errors surface
//! from the log call itself; nothing is swallowed on the way to the stream.

use thiserror::Error;

/// Errors raised while building a logging configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The censor wordlist was not an ordered sequence of field names.
    #[error("wordlist must be an array of field names or unset, got {found}")]
    InvalidWordlist { found: &'static str },

    /// A wordlist entry was not a string.
    #[error("wordlist entry at index {index} must be a string, got {found}")]
    InvalidWordlistEntry { index: usize, found: &'static str },
}

/// Errors raised by a log call.
#[derive(Debug, Error)]
pub enum EmitError {
    /// A logger handle emitted before `setup_logging` installed a pipeline.
    #[error("logging is not configured; call setup_logging first")]
    NotConfigured,

    /// A field value had no JSON representation and the fallback handler
    /// was disabled.
    #[error("field {field:?} could not be serialized: {reason}")]
    Serialize { field: String, reason: String },

    /// The configured serializer failed on the final record.
    #[error("serializer failed: {0}")]
    Render(#[from] serde_json::Error),

    /// A processor override ran to the end without rendering a payload.
    #[error("processor chain ended without rendering a payload")]
    NotRendered,

    /// Writing the rendered line to the output stream failed.
    #[error("failed to write log line: {0}")]
    Io(#[from] std::io::Error),
}
