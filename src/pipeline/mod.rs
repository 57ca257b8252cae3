//! The ordered log-processing pipeline.
//!
//! Every log call threads an event record through a fixed sequence of
//! processors:
//! 1. Level filtering (abort and discard below threshold)
//! 2. Severity level field
//! 3. Positional message formatting
//! 4. ISO-8601 timestamp
//! 5. Stack capture on request
//! 6. Exception rendering on request
//! 7. Byte-field decoding
//! 8. Field censoring
//! 9. Thread-local context merge
//! 10. Callout header + JSON rendering (terminal)

pub mod censor;
pub mod render;
pub mod stages;
pub mod threadlocal;

use crate::error::EmitError;
use crate::level::Level;
use crate::record::EventRecord;

/// Identity of a single log call: the logger's name, if any, and the
/// severity method that was invoked.
#[derive(Debug, Clone)]
pub struct LogCall {
    pub logger_name: Option<String>,
    pub level: Level,
}

/// Result of one processor step.
pub enum StageOutput {
    /// Hand the record to the next processor.
    Record(EventRecord),
    /// Abort the pipeline and discard the record silently.
    Drop,
    /// Terminal payload; no further processors run.
    Rendered(String),
}

/// A pipeline stage: maps a log call and an owned event record to the next
/// record, a drop, or the final rendered payload.
pub trait Processor: Send + Sync {
    fn process(&self, call: &LogCall, record: EventRecord) -> Result<StageOutput, EmitError>;
}

/// The installed processor sequence. Constructed once at setup and shared
/// read-only afterwards.
pub struct Pipeline {
    processors: Vec<Box<dyn Processor>>,
}

impl Pipeline {
    pub fn new(processors: Vec<Box<dyn Processor>>) -> Self {
        Self { processors }
    }

    /// Run the record through every processor.
    ///
    /// Returns `Ok(None)` when a stage dropped the record, `Ok(Some(line))`
    /// when the terminal stage rendered it. A chain that runs to the end
    /// without rendering is a configuration mistake surfaced as
    /// [`EmitError::NotRendered`].
    pub fn run(&self, call: &LogCall, record: EventRecord) -> Result<Option<String>, EmitError> {
        let mut current = record;
        for processor in &self.processors {
            match processor.process(call, current)? {
                StageOutput::Record(next) => current = next,
                StageOutput::Drop => return Ok(None),
                StageOutput::Rendered(line) => return Ok(Some(line)),
            }
        }
        Err(EmitError::NotRendered)
    }
}
