//! Logging configuration.
//!
//! A [`LoggerConfig`] collects every knob recognized by `setup_logging`.
//! The defaults are a one-fits-all setup for a serverless function: JSON
//! lines on stdout, `Info` minimum level, the usual chatty AWS SDK logger
//! namespaces raised to `Warning`.

use std::sync::Arc;

use serde_json::Value;

use crate::error::EmitError;
use crate::level::Level;
use crate::pipeline::render::SerializerFn;
use crate::pipeline::Processor;
use crate::runtime::OutputTarget;

/// Default callout keys. A default value only: nothing requires records to
/// carry these fields.
pub const DEFAULT_CALLOUTS: [&str; 2] = ["status_code", "event"];

/// Logger namespaces that output a lot of unnecessary messages.
pub const NOISY_LOG_SOURCES: [&str; 3] = ["boto", "boto3", "botocore"];

/// Handler for field values that have no JSON representation.
///
/// The `Repr` handler is installed by default; `Disabled` restores error
/// propagation from the log call.
#[derive(Debug, Clone, Copy)]
pub enum Fallback {
    /// Replace the value with a placeholder naming the conversion failure.
    Repr,
    /// Propagate the failure as [`EmitError::Serialize`].
    Disabled,
    /// Caller-supplied replacement, given the field name and the reason.
    Custom(fn(field: &str, reason: &str) -> Value),
}

impl Default for Fallback {
    fn default() -> Self {
        Fallback::Repr
    }
}

impl Fallback {
    pub(crate) fn handle(&self, field: &str, reason: &str) -> Result<Value, EmitError> {
        match self {
            Fallback::Repr => Ok(Value::String(format!("<unserializable: {}>", reason))),
            Fallback::Disabled => Err(EmitError::Serialize {
                field: field.to_string(),
                reason: reason.to_string(),
            }),
            Fallback::Custom(f) => Ok(f(field, reason)),
        }
    }
}

/// Configuration for the logging pipeline and the output stream.
///
/// Built with chained setters; every knob has a default. The raw wordlist
/// value is validated when `setup_logging` constructs the censor stage, so a
/// malformed shape fails the setup call itself.
pub struct LoggerConfig {
    pub(crate) wordlist: Option<Value>,
    pub(crate) callouts: Vec<String>,
    pub(crate) processors: Option<Vec<Box<dyn Processor>>>,
    pub(crate) serializer: Option<Arc<SerializerFn>>,
    pub(crate) sort_keys: bool,
    pub(crate) level: Level,
    pub(crate) noisy_log_sources: Vec<String>,
    pub(crate) target: OutputTarget,
    pub(crate) fallback: Fallback,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            wordlist: None,
            callouts: DEFAULT_CALLOUTS.iter().map(|s| s.to_string()).collect(),
            processors: None,
            serializer: None,
            sort_keys: false,
            level: Level::Info,
            noisy_log_sources: NOISY_LOG_SOURCES.iter().map(|s| s.to_string()).collect(),
            target: OutputTarget::Stdout,
            fallback: Fallback::default(),
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field names whose values are censored when present and truthy.
    pub fn wordlist_to_censor<I, S>(mut self, wordlist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<Value> = wordlist
            .into_iter()
            .map(|s| Value::String(s.into()))
            .collect();
        self.wordlist = Some(Value::Array(words));
        self
    }

    /// Raw wordlist value, e.g. straight out of a configuration file.
    /// Shape validation happens at setup time.
    pub fn wordlist_value(mut self, wordlist: Value) -> Self {
        self.wordlist = Some(wordlist);
        self
    }

    /// Keys printed in clear text on the front of the line. Only the first
    /// two entries are called out.
    pub fn callouts<I, S>(mut self, callouts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.callouts = callouts.into_iter().map(|s| s.into()).collect();
        self
    }

    /// Explicit processor list, replacing the default stage order entirely.
    /// The list must end with a rendering processor.
    pub fn processors(mut self, processors: Vec<Box<dyn Processor>>) -> Self {
        self.processors = Some(processors);
        self
    }

    /// Custom serializer for the terminal rendering stage.
    pub fn serializer<F>(mut self, serializer: F) -> Self
    where
        F: Fn(&crate::record::EventRecord) -> Result<String, serde_json::Error>
            + Send
            + Sync
            + 'static,
    {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    /// Sort record keys in the JSON body instead of keeping insertion order.
    pub fn sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }

    /// Global minimum severity.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sources whose threshold is raised to `Warning` regardless of the
    /// global level.
    pub fn noisy_log_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.noisy_log_sources = sources.into_iter().map(|s| s.into()).collect();
        self
    }

    /// Destination stream for rendered lines.
    pub fn target(mut self, target: OutputTarget) -> Self {
        self.target = target;
        self
    }

    /// Handler for values with no JSON representation.
    pub fn fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }
}
