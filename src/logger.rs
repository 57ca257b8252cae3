//! The bound logger handle.
//!
//! A [`Logger`] is a cheap, cloneable handle carrying an optional name and a
//! set of bound context fields. Handles obtained from [`get_logger`] resolve
//! the installed runtime lazily on first emission and cache it from then on;
//! handles from [`LoggerRuntime::logger`](crate::runtime::LoggerRuntime::logger)
//! are bound to their runtime explicitly.

use std::sync::{Arc, OnceLock};

use serde::Serialize;

use crate::error::EmitError;
use crate::level::Level;
use crate::pipeline::LogCall;
use crate::record::{EventRecord, Fields};
use crate::runtime::{self, LoggerRuntime};

/// A correctly configured bound logger, created lazily when necessary.
///
/// Safe to obtain before `setup_logging`; emitting before installation is an
/// [`EmitError::NotConfigured`].
#[derive(Clone, Default)]
pub struct Logger {
    name: Option<String>,
    context: Fields,
    runtime: OnceLock<Arc<LoggerRuntime>>,
}

impl Logger {
    pub(crate) fn bound_to(runtime: Arc<LoggerRuntime>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(runtime);
        Self {
            name: None,
            context: Fields::new(),
            runtime: cell,
        }
    }

    /// Set the logger's name, used for per-source level overrides.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Pre-populate the record's initial context with a field.
    pub fn bind(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.context = self.context.with(key, value);
        self
    }

    fn resolve(&self) -> Result<&Arc<LoggerRuntime>, EmitError> {
        if let Some(cached) = self.runtime.get() {
            return Ok(cached);
        }
        let installed = runtime::installed().ok_or(EmitError::NotConfigured)?;
        // First use freezes the handle's runtime.
        Ok(self.runtime.get_or_init(|| installed))
    }

    /// Emit a record at the given severity.
    pub fn log(&self, level: Level, event: &str, fields: Fields) -> Result<(), EmitError> {
        let runtime = self.resolve()?;
        let fallback = runtime.fallback();

        let mut record = EventRecord::new();
        self.context.merge_into(&mut record, fallback)?;
        fields.merge_into(&mut record, fallback)?;
        record.insert(
            "event".to_string(),
            serde_json::Value::String(event.to_string()),
        );

        let call = LogCall {
            logger_name: self.name.clone(),
            level,
        };
        runtime.emit(&call, record)
    }

    pub fn debug(&self, event: &str) -> Result<(), EmitError> {
        self.log(Level::Debug, event, Fields::new())
    }

    pub fn debug_with(&self, event: &str, fields: Fields) -> Result<(), EmitError> {
        self.log(Level::Debug, event, fields)
    }

    pub fn info(&self, event: &str) -> Result<(), EmitError> {
        self.log(Level::Info, event, Fields::new())
    }

    pub fn info_with(&self, event: &str, fields: Fields) -> Result<(), EmitError> {
        self.log(Level::Info, event, fields)
    }

    pub fn warning(&self, event: &str) -> Result<(), EmitError> {
        self.log(Level::Warning, event, Fields::new())
    }

    pub fn warning_with(&self, event: &str, fields: Fields) -> Result<(), EmitError> {
        self.log(Level::Warning, event, fields)
    }

    pub fn error(&self, event: &str) -> Result<(), EmitError> {
        self.log(Level::Error, event, Fields::new())
    }

    pub fn error_with(&self, event: &str, fields: Fields) -> Result<(), EmitError> {
        self.log(Level::Error, event, fields)
    }

    pub fn critical(&self, event: &str) -> Result<(), EmitError> {
        self.log(Level::Critical, event, Fields::new())
    }

    pub fn critical_with(&self, event: &str, fields: Fields) -> Result<(), EmitError> {
        self.log(Level::Critical, event, fields)
    }
}

/// Convenience function that returns a lazily bound logger.
pub fn get_logger() -> Logger {
    Logger::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Fallback, LoggerConfig};
    use crate::runtime::OutputTarget;
    use serde_json::json;

    /// A value with no JSON representation.
    struct Opaque;

    impl Serialize for Opaque {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("opaque handle"))
        }
    }

    fn sink_runtime(config: LoggerConfig) -> (Arc<LoggerRuntime>, Arc<parking_lot::Mutex<Vec<u8>>>) {
        let (target, buffer) = OutputTarget::sink();
        let runtime = Arc::new(LoggerRuntime::new(config.target(target)).unwrap());
        (runtime, buffer)
    }

    fn body(line: &str) -> EventRecord {
        serde_json::from_str(&line[line.find('{').unwrap()..]).unwrap()
    }

    #[test]
    fn test_unconfigured_handle_errors() {
        let logger = Logger::default();
        // No cached runtime and nothing installed by this handle.
        if logger.runtime.get().is_none() && runtime_slot_empty() {
            assert!(matches!(
                logger.info("too early"),
                Err(EmitError::NotConfigured)
            ));
        }
    }

    fn runtime_slot_empty() -> bool {
        // The global slot may be populated by a neighboring test; only
        // assert the unconfigured path when it is actually empty.
        crate::runtime::installed().is_none()
    }

    #[test]
    fn test_bound_context_included() {
        let (runtime, buffer) = sink_runtime(LoggerConfig::new());
        let logger = runtime.logger().bind("service", "auth");

        logger.info("tick").unwrap();

        let line = String::from_utf8(buffer.lock().clone()).unwrap();
        let record = body(&line);
        assert_eq!(record["service"], json!("auth"));
        assert_eq!(record["event"], json!("tick"));
    }

    #[test]
    fn test_call_fields_override_bound_context() {
        let (runtime, buffer) = sink_runtime(LoggerConfig::new());
        let logger = runtime.logger().bind("stage", "bound");

        logger
            .info_with("tick", Fields::new().with("stage", "call"))
            .unwrap();

        let line = String::from_utf8(buffer.lock().clone()).unwrap();
        assert_eq!(body(&line)["stage"], json!("call"));
    }

    #[test]
    fn test_disabled_fallback_propagates_from_log_call() {
        let (runtime, buffer) =
            sink_runtime(LoggerConfig::new().fallback(Fallback::Disabled));
        let logger = runtime.logger();

        let result = logger.info_with("tick", Fields::new().with("bad", Opaque));

        assert!(matches!(result, Err(EmitError::Serialize { .. })));
        assert!(buffer.lock().is_empty());
    }

    #[test]
    fn test_default_fallback_replaces_value() {
        let (runtime, buffer) = sink_runtime(LoggerConfig::new());
        let logger = runtime.logger();

        logger
            .info_with("tick", Fields::new().with("bad", Opaque))
            .unwrap();

        let line = String::from_utf8(buffer.lock().clone()).unwrap();
        let bad = body(&line)["bad"].as_str().unwrap().to_string();
        assert!(bad.starts_with("<unserializable:"));
    }

    #[test]
    fn test_positional_args_through_emission() {
        let (runtime, buffer) = sink_runtime(LoggerConfig::new());
        let logger = runtime.logger();

        logger
            .info_with("user %s logged in", Fields::new().arg("bob"))
            .unwrap();

        let line = String::from_utf8(buffer.lock().clone()).unwrap();
        let record = body(&line);
        assert_eq!(record["event"], json!("user bob logged in"));
        assert!(!record.contains_key("positional_args"));
    }

    #[test]
    fn test_error_attachment_rendered() {
        let (runtime, buffer) = sink_runtime(LoggerConfig::new());
        let logger = runtime.logger();

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        logger
            .error_with("write failed", Fields::new().err(&io))
            .unwrap();

        let line = String::from_utf8(buffer.lock().clone()).unwrap();
        let record = body(&line);
        assert!(!record.contains_key("exc_info"));
        assert_eq!(record["exception"], json!("disk gone"));
    }
}
