//! Callout extraction and terminal JSON rendering.
//!
//! Renders a log line compatible with AWS CloudWatch Logs: a clear-text
//! header naming the severity and up to two called-out field values, followed
//! by the whole record as a single-line JSON object. Called-out fields stay
//! in the JSON body as well.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::EmitError;
use crate::record::{is_truthy, value_text, EventRecord};

use super::{LogCall, Processor, StageOutput};

/// A `serde_json::to_string`-compatible dump function.
pub type SerializerFn =
    dyn Fn(&EventRecord) -> Result<String, serde_json::Error> + Send + Sync;

/// Terminal stage: builds the `[<LEVEL>] "<callout>" ...` header and appends
/// the serialized record.
///
/// Fewer than two configured callout keys, or keys absent from a particular
/// record, are silently skipped; no placeholder is emitted.
pub struct CalloutRenderer {
    callout_one: Option<String>,
    callout_two: Option<String>,
    serializer: Option<Arc<SerializerFn>>,
    sort_keys: bool,
}

impl CalloutRenderer {
    /// # Arguments
    /// * `callouts` - Keys printed in clear text; only the first two are used
    /// * `serializer` - Dump function, `None` for the built-in JSON dump
    /// * `sort_keys` - Sort keys in the built-in dump instead of keeping
    ///   insertion order
    pub fn new(
        callouts: &[String],
        serializer: Option<Arc<SerializerFn>>,
        sort_keys: bool,
    ) -> Self {
        Self {
            callout_one: callouts.first().cloned(),
            callout_two: callouts.get(1).cloned(),
            serializer,
            sort_keys,
        }
    }

    fn dump(&self, record: &EventRecord) -> Result<String, serde_json::Error> {
        if let Some(serializer) = &self.serializer {
            return serializer(record);
        }
        if self.sort_keys {
            let sorted: BTreeMap<&String, &Value> = record.iter().collect();
            return serde_json::to_string(&sorted);
        }
        serde_json::to_string(record)
    }

    fn push_callout(header: &mut String, record: &EventRecord, key: Option<&String>) {
        let Some(key) = key else { return };
        let Some(value) = record.get(key) else { return };
        if is_truthy(value) {
            header.push('"');
            header.push_str(&value_text(value));
            header.push_str("\" ");
        }
    }
}

impl Processor for CalloutRenderer {
    fn process(&self, call: &LogCall, record: EventRecord) -> Result<StageOutput, EmitError> {
        let mut header = format!("[{}] ", call.level.as_header());

        Self::push_callout(&mut header, &record, self.callout_one.as_ref());
        Self::push_callout(&mut header, &record, self.callout_two.as_ref());

        let body = self.dump(&record)?;
        header.push_str(&body);
        Ok(StageOutput::Rendered(header))
    }
}
