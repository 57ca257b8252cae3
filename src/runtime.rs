//! Runtime assembly and process-wide installation.
//!
//! `setup_logging` turns a [`LoggerConfig`] into an immutable
//! [`LoggerRuntime`] (the processor pipeline plus the output stream and
//! level policy) and installs it in the process-wide slot that lazy logger
//! handles resolve against. Every call rebuilds and replaces the runtime
//! wholesale, so a host environment's earlier configuration never leaks into
//! the new one.

use std::io::Write;
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::{Mutex, RwLock};

use crate::config::{Fallback, LoggerConfig};
use crate::error::{ConfigError, EmitError};
use crate::level::{Level, LevelPolicy};
use crate::logger::Logger;
use crate::pipeline::censor::Censor;
use crate::pipeline::render::CalloutRenderer;
use crate::pipeline::stages::{
    AddLogLevel, ByteDecoder, ExceptionFormatter, LevelFilter, MergeThreadLocal,
    PositionalFormatter, StackRenderer, TimeStamper,
};
use crate::pipeline::{LogCall, Pipeline, Processor};
use crate::record::EventRecord;

/// Destination stream for rendered lines.
///
/// `Stdout` is the default: serverless hosts collect the function's standard
/// output stream. `Sink` captures lines into a shared buffer, the seam used
/// by this crate's own tests.
#[derive(Debug, Clone)]
pub enum OutputTarget {
    Stdout,
    Stderr,
    Sink(Arc<Mutex<Vec<u8>>>),
}

impl OutputTarget {
    /// In-memory capture target, returning the buffer to read back from.
    pub fn sink() -> (Self, Arc<Mutex<Vec<u8>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        (OutputTarget::Sink(buffer.clone()), buffer)
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        match self {
            OutputTarget::Stdout => {
                let mut out = std::io::stdout().lock();
                writeln!(out, "{}", line)
            }
            OutputTarget::Stderr => {
                let mut out = std::io::stderr().lock();
                writeln!(out, "{}", line)
            }
            OutputTarget::Sink(buffer) => {
                let mut buffer = buffer.lock();
                writeln!(buffer, "{}", line)
            }
        }
    }
}

/// An assembled logging runtime: pipeline, level policy, output stream, and
/// the fallback handler for unserializable field values. Immutable once
/// built; shared behind `Arc`.
pub struct LoggerRuntime {
    pipeline: Pipeline,
    policy: Arc<LevelPolicy>,
    target: OutputTarget,
    fallback: Fallback,
}

impl LoggerRuntime {
    /// Build a runtime from a configuration without installing it.
    ///
    /// An invalid wordlist shape fails here, synchronously.
    pub fn new(config: LoggerConfig) -> Result<Self, ConfigError> {
        let censor = Censor::from_config(config.wordlist.as_ref())?;

        let mut policy = LevelPolicy::new(config.level);
        for source in &config.noisy_log_sources {
            policy.set_source(source, Level::Warning);
        }
        let policy = Arc::new(policy);

        let processors = match config.processors {
            Some(processors) => processors,
            None => default_processors(
                policy.clone(),
                censor,
                CalloutRenderer::new(&config.callouts, config.serializer, config.sort_keys),
            ),
        };

        Ok(Self {
            pipeline: Pipeline::new(processors),
            policy,
            target: config.target,
            fallback: config.fallback,
        })
    }

    /// A logger handle bound to this runtime explicitly, bypassing the
    /// process-wide slot.
    pub fn logger(self: &Arc<Self>) -> Logger {
        Logger::bound_to(self.clone())
    }

    pub fn level_policy(&self) -> &LevelPolicy {
        &self.policy
    }

    pub(crate) fn fallback(&self) -> Fallback {
        self.fallback
    }

    /// Run a record through the pipeline and write the rendered line, if the
    /// record survives filtering.
    pub(crate) fn emit(&self, call: &LogCall, record: EventRecord) -> Result<(), EmitError> {
        match self.pipeline.run(call, record)? {
            Some(line) => self.target.write_line(&line).map_err(EmitError::from),
            None => Ok(()),
        }
    }
}

/// The default processor order.
fn default_processors(
    policy: Arc<LevelPolicy>,
    censor: Censor,
    renderer: CalloutRenderer,
) -> Vec<Box<dyn Processor>> {
    vec![
        // If the severity is too low, abort the pipeline and throw the
        // record away.
        Box::new(LevelFilter::new(policy)),
        // Add the severity to the record.
        Box::new(AddLogLevel),
        // Apply %-style positional formatting to the message.
        Box::new(PositionalFormatter),
        // Add an ISO-8601 timestamp.
        Box::new(TimeStamper),
        // If stack_info is set, remove it and render the call stack.
        Box::new(StackRenderer),
        // If exc_info is set, remove it and render the exception.
        Box::new(ExceptionFormatter),
        // Decode byte-valued fields to text.
        Box::new(ByteDecoder),
        // Censor configured fields.
        Box::new(censor),
        // Merge the thread-local bound context.
        Box::new(MergeThreadLocal),
        // Render the callout header and the final JSON body.
        Box::new(renderer),
    ]
}

lazy_static! {
    static ref INSTALLED: RwLock<Option<Arc<LoggerRuntime>>> = RwLock::new(None);
}

/// Configure logging for the application.
///
/// Builds the runtime and installs it process-wide, fully overwriting any
/// previous installation. Must be called at cold start, before other threads
/// emit through cached handles.
pub fn setup_logging(config: LoggerConfig) -> Result<Arc<LoggerRuntime>, ConfigError> {
    let runtime = Arc::new(LoggerRuntime::new(config)?);
    *INSTALLED.write() = Some(runtime.clone());
    Ok(runtime)
}

/// The currently installed runtime, if any.
pub(crate) fn installed() -> Option<Arc<LoggerRuntime>> {
    INSTALLED.read().clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Fields;
    use serde_json::json;

    fn captured(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8(buffer.lock().clone()).unwrap()
    }

    #[test]
    fn test_invalid_wordlist_fails_setup() {
        let config = LoggerConfig::new().wordlist_value(json!("password"));
        assert!(matches!(
            LoggerRuntime::new(config),
            Err(ConfigError::InvalidWordlist { .. })
        ));
    }

    #[test]
    fn test_end_to_end_censored_callout_line() {
        let (target, buffer) = OutputTarget::sink();
        let config = LoggerConfig::new()
            .wordlist_to_censor(["password"])
            .callouts(["status_code", "event"])
            .target(target);

        let runtime = Arc::new(LoggerRuntime::new(config).unwrap());
        runtime
            .logger()
            .warning_with(
                "login",
                Fields::new().with("status_code", 403).with("password", "abc123"),
            )
            .unwrap();

        let line = captured(&buffer);
        assert!(line.starts_with("[WARNING] \"403\" \"login\" "));

        let body = &line[line.find('{').unwrap()..];
        let record: EventRecord = serde_json::from_str(body).unwrap();
        assert_eq!(record["password"], json!("*CENSORED*"));
        assert_eq!(record["status_code"], json!(403));
        assert_eq!(record["event"], json!("login"));
        assert_eq!(record["level"], json!("warning"));
        assert!(record.contains_key("timestamp"));
    }

    #[test]
    fn test_below_threshold_produces_no_output() {
        let (target, buffer) = OutputTarget::sink();
        let config = LoggerConfig::new().level(Level::Error).target(target);

        let runtime = Arc::new(LoggerRuntime::new(config).unwrap());
        runtime.logger().info("quiet").unwrap();

        assert!(captured(&buffer).is_empty());
    }

    #[test]
    fn test_noisy_source_raised_to_warning() {
        let (target, buffer) = OutputTarget::sink();
        let config = LoggerConfig::new()
            .level(Level::Debug)
            .noisy_log_sources(["chatty"])
            .target(target);

        let runtime = Arc::new(LoggerRuntime::new(config).unwrap());
        runtime.logger().named("chatty.client").info("dropped").unwrap();
        runtime.logger().named("app").info("kept").unwrap();

        let output = captured(&buffer);
        assert!(!output.contains("dropped"));
        assert!(output.contains("kept"));
    }

    #[test]
    fn test_second_setup_replaces_noisy_sources() {
        let first = LoggerRuntime::new(
            LoggerConfig::new().noisy_log_sources(["first"]),
        )
        .unwrap();
        let second = LoggerRuntime::new(
            LoggerConfig::new().noisy_log_sources(["second"]),
        )
        .unwrap();

        assert_eq!(
            first.level_policy().effective(Some("first")),
            Level::Warning
        );
        // A rebuilt runtime carries only its own overrides; sources from the
        // first configuration revert to the global level.
        assert_eq!(second.level_policy().effective(Some("first")), Level::Info);
        assert_eq!(
            second.level_policy().effective(Some("second")),
            Level::Warning
        );
    }

    #[test]
    fn test_thread_local_context_merged() {
        let (target, buffer) = OutputTarget::sink();
        let runtime =
            Arc::new(LoggerRuntime::new(LoggerConfig::new().target(target)).unwrap());

        crate::pipeline::threadlocal::clear();
        crate::pipeline::threadlocal::bind("request_id", "r-42");
        runtime.logger().info("tick").unwrap();
        crate::pipeline::threadlocal::clear();

        let line = captured(&buffer);
        let body = &line[line.find('{').unwrap()..];
        let record: EventRecord = serde_json::from_str(body).unwrap();
        assert_eq!(record["request_id"], json!("r-42"));
    }

    #[test]
    fn test_global_install_and_replace() {
        let (target, buffer) = OutputTarget::sink();
        setup_logging(LoggerConfig::new().target(target)).unwrap();

        crate::logger::get_logger().info("first line").unwrap();
        assert!(captured(&buffer).contains("first line"));

        // Re-setup swaps the slot; a fresh handle sees the new runtime.
        let (target2, buffer2) = OutputTarget::sink();
        setup_logging(LoggerConfig::new().target(target2)).unwrap();

        crate::logger::get_logger().info("second line").unwrap();
        assert!(captured(&buffer2).contains("second line"));
        assert!(!captured(&buffer).contains("second line"));
    }
}
