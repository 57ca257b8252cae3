//! cloudline - Structured single-line JSON logging for serverless runtimes
//!
//! This crate configures a structured logging pipeline that renders every
//! log event as one line of JSON, the shape AWS CloudWatch Logs ingests and
//! indexes cleanly, with two extras for human readers:
//!
//! 1. **Callouts** - up to two field values repeated in clear text at the
//!    front of the line, so a scan of the stream shows what matters
//! 2. **Censoring** - configured field values replaced with a fixed marker
//!    before they reach the stream
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `pipeline` - the ordered processor sequence every record runs through
//! - `config` - the `setup_logging` configuration surface
//! - `runtime` - runtime assembly and process-wide installation
//! - `logger` - the lazily bound logger handle
//! - `level` - severity ordering and per-source thresholds
//! - `record` - the event record and the field builder
//! - `error` - configuration and emission errors
//!
//! ## Usage
//!
//! ```
//! use cloudline::{fields, LoggerConfig, OutputTarget};
//!
//! let (target, _buffer) = OutputTarget::sink();
//! let logger = cloudline::setup_and_get_logger(
//!     LoggerConfig::new()
//!         .wordlist_to_censor(["password"])
//!         .target(target),
//! )
//! .unwrap();
//!
//! logger
//!     .warning_with("login", fields!(status_code = 403, password = "abc123"))
//!     .unwrap();
//! ```
//!
//! Emission runs the whole pipeline synchronously in the calling thread;
//! nothing is buffered, batched, or shipped by this crate. The host runtime
//! owns delivery of whatever reaches the output stream.

pub mod config;
pub mod error;
pub mod level;
pub mod logger;
pub mod pipeline;
pub mod record;
pub mod runtime;

pub use config::{Fallback, LoggerConfig, DEFAULT_CALLOUTS, NOISY_LOG_SOURCES};
pub use error::{ConfigError, EmitError};
pub use level::{Level, LevelPolicy};
pub use logger::{get_logger, Logger};
pub use pipeline::censor::{Censor, REDACTION_MARKER};
pub use pipeline::render::CalloutRenderer;
pub use pipeline::threadlocal;
pub use pipeline::{LogCall, Pipeline, Processor, StageOutput};
pub use record::{format_error_chain, is_truthy, EventRecord, Fields};
pub use runtime::{setup_logging, LoggerRuntime, OutputTarget};

/// Configure logging and return a lazily bound logger in one call.
///
/// The one-fits-all path: [`setup_logging`] followed by [`get_logger`]. Call
/// the two separately when the handle needs a name or initial context.
pub fn setup_and_get_logger(config: LoggerConfig) -> Result<Logger, ConfigError> {
    setup_logging(config)?;
    Ok(get_logger())
}
