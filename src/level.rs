//! Severity levels and the per-source level policy.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Log severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    /// Lowercase name, as written into the record's `level` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Critical => "critical",
        }
    }

    /// Uppercase name, as rendered in the line header.
    pub fn as_header(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective-threshold policy: a global minimum level plus per-source
/// overrides for noisy logger namespaces.
///
/// Overrides match on dotted namespace prefixes, so raising `boto3` also
/// covers `boto3.resources`. The longest matching prefix wins.
#[derive(Debug, Clone)]
pub struct LevelPolicy {
    global: Level,
    overrides: HashMap<String, Level>,
}

impl LevelPolicy {
    pub fn new(global: Level) -> Self {
        Self {
            global,
            overrides: HashMap::new(),
        }
    }

    pub fn global(&self) -> Level {
        self.global
    }

    /// Set an individual source's threshold, overriding the global minimum.
    pub fn set_source(&mut self, source: &str, level: Level) {
        self.overrides.insert(source.to_string(), level);
    }

    /// Resolve the effective threshold for a logger name.
    pub fn effective(&self, name: Option<&str>) -> Level {
        let Some(name) = name else {
            return self.global;
        };

        let mut best: Option<(usize, Level)> = None;
        for (source, level) in &self.overrides {
            let matched = name == source
                || (name.len() > source.len()
                    && name.starts_with(source)
                    && name.as_bytes()[source.len()] == b'.');
            if matched {
                match best {
                    Some((len, _)) if len >= source.len() => {}
                    _ => best = Some((source.len(), *level)),
                }
            }
        }

        best.map(|(_, level)| level).unwrap_or(self.global)
    }

    /// Whether a call at `level` from `name` passes the threshold.
    pub fn allows(&self, name: Option<&str>, level: Level) -> bool {
        level >= self.effective(name)
    }
}
