//! The built-in non-terminal pipeline stages.

use std::backtrace::Backtrace;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::error::EmitError;
use crate::level::LevelPolicy;
use crate::record::{
    is_truthy, value_text, EventRecord, EXC_INFO_KEY, POSITIONAL_ARGS_KEY, STACK_INFO_KEY,
};

use super::{LogCall, Processor, StageOutput};

/// Drops the record when the call's severity is below the effective
/// threshold for its logger name.
pub struct LevelFilter {
    policy: Arc<LevelPolicy>,
}

impl LevelFilter {
    pub fn new(policy: Arc<LevelPolicy>) -> Self {
        Self { policy }
    }
}

impl Processor for LevelFilter {
    fn process(&self, call: &LogCall, record: EventRecord) -> Result<StageOutput, EmitError> {
        if self.policy.allows(call.logger_name.as_deref(), call.level) {
            Ok(StageOutput::Record(record))
        } else {
            Ok(StageOutput::Drop)
        }
    }
}

/// Writes the call's severity into the `level` field.
pub struct AddLogLevel;

impl Processor for AddLogLevel {
    fn process(&self, call: &LogCall, mut record: EventRecord) -> Result<StageOutput, EmitError> {
        record.insert(
            "level".to_string(),
            Value::String(call.level.as_str().to_string()),
        );
        Ok(StageOutput::Record(record))
    }
}

/// Substitutes `positional_args` into `%s` placeholders in the `event`
/// message, then removes the args field. `%%` escapes a literal percent;
/// placeholders beyond the supplied arguments are left as-is.
pub struct PositionalFormatter;

fn apply_args(message: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(message.len());
    let mut remaining = args.iter();
    let mut chars = message.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('s') => {
                chars.next();
                match remaining.next() {
                    Some(value) => out.push_str(&value_text(value)),
                    None => out.push_str("%s"),
                }
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }
    out
}

impl Processor for PositionalFormatter {
    fn process(&self, _call: &LogCall, mut record: EventRecord) -> Result<StageOutput, EmitError> {
        let args = match record.remove(POSITIONAL_ARGS_KEY) {
            Some(Value::Array(args)) if !args.is_empty() => args,
            _ => return Ok(StageOutput::Record(record)),
        };

        if let Some(Value::String(message)) = record.get("event") {
            let formatted = apply_args(message, &args);
            record.insert("event".to_string(), Value::String(formatted));
        }

        Ok(StageOutput::Record(record))
    }
}

/// Adds an ISO-8601 UTC timestamp under `timestamp`.
pub struct TimeStamper;

impl Processor for TimeStamper {
    fn process(&self, _call: &LogCall, mut record: EventRecord) -> Result<StageOutput, EmitError> {
        record.insert(
            "timestamp".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        Ok(StageOutput::Record(record))
    }
}

/// If the `stack_info` flag is set, removes it and renders the current call
/// stack into `stack`.
pub struct StackRenderer;

impl Processor for StackRenderer {
    fn process(&self, _call: &LogCall, mut record: EventRecord) -> Result<StageOutput, EmitError> {
        let Some(flag) = record.remove(STACK_INFO_KEY) else {
            return Ok(StageOutput::Record(record));
        };

        if is_truthy(&flag) {
            let stack = Backtrace::force_capture().to_string();
            record.insert("stack".to_string(), Value::String(stack));
        }

        Ok(StageOutput::Record(record))
    }
}

/// If `exc_info` is set, removes it and renders its value into `exception`.
///
/// A bare boolean flag carries nothing to render in Rust (there is no
/// ambient "current exception") and is only removed. String values pass
/// through verbatim; structured values render as their JSON text.
pub struct ExceptionFormatter;

impl Processor for ExceptionFormatter {
    fn process(&self, _call: &LogCall, mut record: EventRecord) -> Result<StageOutput, EmitError> {
        let Some(info) = record.remove(EXC_INFO_KEY) else {
            return Ok(StageOutput::Record(record));
        };

        if !is_truthy(&info) || matches!(info, Value::Bool(_)) {
            return Ok(StageOutput::Record(record));
        }

        record.insert("exception".to_string(), Value::String(value_text(&info)));
        Ok(StageOutput::Record(record))
    }
}

/// Decodes top-level byte-array values to text.
///
/// Only non-empty arrays whose every element is an integer in 0..=255 and
/// whose bytes form valid UTF-8 are rewritten; anything else is left alone.
pub struct ByteDecoder;

fn decode_bytes(value: &Value) -> Option<String> {
    let array = value.as_array()?;
    if array.is_empty() {
        return None;
    }
    let mut bytes = Vec::with_capacity(array.len());
    for item in array {
        let n = item.as_u64()?;
        if n > 255 {
            return None;
        }
        bytes.push(n as u8);
    }
    String::from_utf8(bytes).ok()
}

impl Processor for ByteDecoder {
    fn process(&self, _call: &LogCall, mut record: EventRecord) -> Result<StageOutput, EmitError> {
        for (_key, value) in record.iter_mut() {
            if let Some(text) = decode_bytes(value) {
                *value = Value::String(text);
            }
        }
        Ok(StageOutput::Record(record))
    }
}

/// Merges the thread-local bound context under the record's own fields:
/// per-call fields win on key collisions.
pub struct MergeThreadLocal;

impl Processor for MergeThreadLocal {
    fn process(&self, _call: &LogCall, record: EventRecord) -> Result<StageOutput, EmitError> {
        let mut merged = super::threadlocal::snapshot();
        if merged.is_empty() {
            return Ok(StageOutput::Record(record));
        }

        for (key, value) in record {
            merged.insert(key, value);
        }
        Ok(StageOutput::Record(merged))
    }
}
