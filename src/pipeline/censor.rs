//! Field censoring.
//!
//! Replaces the values of configured fields with a fixed redaction marker so
//! secrets never reach the log stream. The stage's only state is its
//! wordlist, which serializes as plain data; the censoring behavior is
//! re-derived from the wordlist on reconstruction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::record::{is_truthy, EventRecord};

use super::{LogCall, Processor, StageOutput};

/// Marker written in place of a censored value.
pub const REDACTION_MARKER: &str = "*CENSORED*";

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Censor stage: replaces wordlist field values with [`REDACTION_MARKER`].
///
/// With no wordlist the stage is a direct pass-through. Keys absent from a
/// record, or present with a falsy value, are left untouched; the stage
/// never adds a field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Censor {
    wordlist: Option<Vec<String>>,
}

impl Censor {
    pub fn new(wordlist: Option<Vec<String>>) -> Self {
        Self { wordlist }
    }

    /// Reconstruct a censor stage from a raw configuration value.
    ///
    /// Only an array of strings, or null, is accepted; any other shape is a
    /// configuration error raised here, not deferred to the first log call.
    pub fn from_config(raw: Option<&Value>) -> Result<Self, ConfigError> {
        let raw = match raw {
            None | Some(Value::Null) => return Ok(Self::new(None)),
            Some(value) => value,
        };

        let entries = match raw {
            Value::Array(entries) => entries,
            other => {
                return Err(ConfigError::InvalidWordlist {
                    found: json_type_name(other),
                })
            }
        };

        let mut wordlist = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            match entry {
                Value::String(s) => wordlist.push(s.clone()),
                other => {
                    return Err(ConfigError::InvalidWordlistEntry {
                        index,
                        found: json_type_name(other),
                    })
                }
            }
        }

        Ok(Self::new(Some(wordlist)))
    }

    pub fn wordlist(&self) -> Option<&[String]> {
        self.wordlist.as_deref()
    }
}

impl Processor for Censor {
    fn process(
        &self,
        _call: &LogCall,
        mut record: EventRecord,
    ) -> Result<StageOutput, crate::error::EmitError> {
        let Some(wordlist) = &self.wordlist else {
            return Ok(StageOutput::Record(record));
        };

        for key in wordlist {
            if let Some(value) = record.get_mut(key) {
                if is_truthy(value) {
                    *value = Value::String(REDACTION_MARKER.to_string());
                }
            }
        }

        Ok(StageOutput::Record(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use proptest::prelude::*;
    use serde_json::json;

    fn call() -> LogCall {
        LogCall {
            logger_name: None,
            level: Level::Info,
        }
    }

    fn run(censor: &Censor, record: EventRecord) -> EventRecord {
        match censor.process(&call(), record).unwrap() {
            StageOutput::Record(r) => r,
            _ => panic!("censor must pass the record through"),
        }
    }

    fn record_from(value: Value) -> EventRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_censors_truthy_values() {
        let censor = Censor::new(Some(vec!["password".to_string()]));
        let record = record_from(json!({"event": "login", "password": "abc123"}));

        let out = run(&censor, record);
        assert_eq!(out["password"], json!(REDACTION_MARKER));
        assert_eq!(out["event"], json!("login"));
    }

    #[test]
    fn test_falsy_and_absent_values_untouched() {
        let censor = Censor::new(Some(vec!["password".to_string(), "token".to_string()]));
        let record = record_from(json!({"event": "login", "password": ""}));

        let out = run(&censor, record);
        assert_eq!(out["password"], json!(""));
        // Absent keys are never added.
        assert!(!out.contains_key("token"));
    }

    #[test]
    fn test_unset_wordlist_is_identity() {
        let censor = Censor::new(None);
        let record = record_from(json!({"password": "abc123"}));

        let out = run(&censor, record.clone());
        assert_eq!(out, record);
    }

    #[test]
    fn test_from_config_rejects_non_sequence() {
        let err = Censor::from_config(Some(&json!("password"))).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWordlist { .. }));

        let err = Censor::from_config(Some(&json!({"password": true}))).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWordlist { .. }));
    }

    #[test]
    fn test_from_config_rejects_non_string_entries() {
        let err = Censor::from_config(Some(&json!(["password", 7]))).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidWordlistEntry { index: 1, .. }
        ));
    }

    #[test]
    fn test_from_config_null_is_unset() {
        let censor = Censor::from_config(Some(&Value::Null)).unwrap();
        assert!(censor.wordlist().is_none());
    }

    #[test]
    fn test_state_round_trips_as_plain_data() {
        let censor = Censor::new(Some(vec!["password".to_string()]));
        let state = serde_json::to_string(&censor).unwrap();
        let rebuilt: Censor = serde_json::from_str(&state).unwrap();
        assert_eq!(rebuilt.wordlist(), censor.wordlist());
    }

    fn scalar_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[ -~]{0,12}".prop_map(Value::String),
        ]
    }

    proptest! {
        #[test]
        fn prop_only_truthy_wordlist_keys_change(
            entries in proptest::collection::btree_map("[a-z]{1,6}", scalar_value(), 0..8),
            wordlist in proptest::collection::vec("[a-z]{1,6}", 0..4),
        ) {
            let record: EventRecord = entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            let censor = Censor::new(Some(wordlist.clone()));
            let out = run(&censor, record.clone());

            prop_assert_eq!(out.len(), record.len());
            for (key, value) in &record {
                let expect_censored = wordlist.iter().any(|w| w == key) && is_truthy(value);
                if expect_censored {
                    prop_assert_eq!(&out[key], &json!(REDACTION_MARKER));
                } else {
                    prop_assert_eq!(&out[key], value);
                }
            }
        }
    }
}
