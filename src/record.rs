//! The event record and the field builder.
//!
//! An event record is a JSON object built incrementally as it moves through
//! the pipeline. Each stage owns the record while processing it and hands it
//! off to the next stage by value.

use serde::Serialize;
use serde_json::Value;

use crate::config::Fallback;
use crate::error::EmitError;

/// Mapping of field names to JSON values, in insertion order.
pub type EventRecord = serde_json::Map<String, Value>;

/// Key under which positional formatting arguments travel until the
/// formatting stage consumes them.
pub(crate) const POSITIONAL_ARGS_KEY: &str = "positional_args";

/// Key that requests exception rendering.
pub(crate) const EXC_INFO_KEY: &str = "exc_info";

/// Key that requests a stack capture.
pub(crate) const STACK_INFO_KEY: &str = "stack_info";

/// Truthiness of a JSON value: null, `false`, zero, the empty string, the
/// empty array, and the empty object are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Clear-text rendition of a value: strings render bare, everything else
/// renders as its JSON text.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Format an error and its source chain into a single line.
pub fn format_error_chain(err: &(dyn std::error::Error)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": caused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// A field value, or the reason it could not be converted to JSON.
///
/// Conversion failures are carried until emit time, where the configured
/// fallback handler decides between a placeholder and an error.
#[derive(Debug, Clone)]
pub(crate) enum FieldValue {
    Value(Value),
    Unserializable(String),
}

impl FieldValue {
    fn from_serialize(value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => FieldValue::Value(v),
            Err(e) => FieldValue::Unserializable(e.to_string()),
        }
    }

    fn resolve(&self, field: &str, fallback: Fallback) -> Result<Value, EmitError> {
        match self {
            FieldValue::Value(v) => Ok(v.clone()),
            FieldValue::Unserializable(reason) => fallback.handle(field, reason),
        }
    }
}

/// Ordered key/value fields attached to a log call or bound on a handle.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    entries: Vec<(String, FieldValue)>,
    args: Vec<FieldValue>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field. The value is converted to JSON immediately; a conversion
    /// failure is resolved at emit time by the fallback handler.
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.entries.push((key.into(), FieldValue::from_serialize(value)));
        self
    }

    /// Append a positional argument for `%s`-style message formatting.
    pub fn arg(mut self, value: impl Serialize) -> Self {
        self.args.push(FieldValue::from_serialize(value));
        self
    }

    /// Attach an error: its source chain is formatted into the `exc_info`
    /// field, which the exception stage moves into `exception`.
    pub fn err(self, err: &(dyn std::error::Error)) -> Self {
        self.with(EXC_INFO_KEY, format_error_chain(err))
    }

    /// Request a stack capture via the `stack_info` flag.
    pub fn stack(self) -> Self {
        self.with(STACK_INFO_KEY, true)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.args.is_empty()
    }

    /// Merge the fields into a record, resolving carried conversion failures
    /// against the fallback handler.
    pub(crate) fn merge_into(
        &self,
        record: &mut EventRecord,
        fallback: Fallback,
    ) -> Result<(), EmitError> {
        for (key, value) in &self.entries {
            let resolved = value.resolve(key, fallback)?;
            record.insert(key.clone(), resolved);
        }

        if !self.args.is_empty() {
            let mut resolved = Vec::with_capacity(self.args.len());
            for value in &self.args {
                resolved.push(value.resolve(POSITIONAL_ARGS_KEY, fallback)?);
            }
            record.insert(POSITIONAL_ARGS_KEY.to_string(), Value::Array(resolved));
        }

        Ok(())
    }
}

/// Build a [`Fields`] set from literal key/value pairs.
///
/// ```
/// use cloudline::fields;
///
/// let f = fields!(status_code = 403, user = "bob");
/// assert!(!f.is_empty());
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::record::Fields::new()
    };
    ($($key:ident = $value:expr),+ $(,)?) => {
        $crate::record::Fields::new()$(.with(stringify!($key), $value))+
    };
}
