//! Thread-local bound context.
//!
//! Fields bound here are merged into every record emitted from the same
//! thread, independent of per-call arguments. Writes from one thread are
//! invisible to another; this is not a synchronization primitive.

use std::cell::RefCell;

use serde::Serialize;
use serde_json::Value;

use crate::record::EventRecord;

thread_local! {
    static CONTEXT: RefCell<EventRecord> = RefCell::new(EventRecord::new());
}

/// Bind a field into the current thread's context.
///
/// Values with no JSON representation are stored as a placeholder naming the
/// conversion failure; binding itself never fails.
pub fn bind(key: impl Into<String>, value: impl Serialize) {
    let value = serde_json::to_value(value)
        .unwrap_or_else(|e| Value::String(format!("<unserializable: {}>", e)));
    CONTEXT.with(|ctx| {
        ctx.borrow_mut().insert(key.into(), value);
    });
}

/// Remove a field from the current thread's context.
pub fn unbind(key: &str) {
    CONTEXT.with(|ctx| {
        ctx.borrow_mut().remove(key);
    });
}

/// Drop every field bound on the current thread.
pub fn clear() {
    CONTEXT.with(|ctx| {
        ctx.borrow_mut().clear();
    });
}

/// Copy of the current thread's context.
pub fn snapshot() -> EventRecord {
    CONTEXT.with(|ctx| ctx.borrow().clone())
}
