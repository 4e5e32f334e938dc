//! Process-wide binding of the single active sink.
//!
//! A registry is built once at the composition root and passed by reference
//! to everything that needs the sink. Exactly one implementation may be
//! bound per process; a second registration aborts startup rather than
//! letting two conflicting bindings serve traffic.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::sink::Sink;

/// The sink chosen for this process, together with its registered name.
#[derive(Clone)]
pub struct BoundSink {
    name: String,
    sink: Arc<dyn Sink>,
}

impl BoundSink {
    /// Name the sink was registered under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The sink implementation
    pub fn sink(&self) -> &dyn Sink {
        self.sink.as_ref()
    }
}

/// Holds at most one sink binding for the process lifetime.
pub struct SinkRegistry {
    slot: Mutex<Option<BoundSink>>,
}

impl SinkRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Bind the process sink under `name`.
    ///
    /// # Panics
    ///
    /// Panics if a sink is already bound. The slot is checked and filled
    /// under one lock, so concurrent registration attempts cannot both
    /// succeed.
    pub fn register<S: Sink + 'static>(&self, name: impl Into<String>, sink: S) {
        let name = name.into();
        let mut slot = self.slot.lock();
        if let Some(bound) = slot.as_ref() {
            panic!(
                "sink already registered: `{}` (refusing to bind `{}`)",
                bound.name, name
            );
        }
        info!(sink = %name, "registered sink");
        *slot = Some(BoundSink {
            name,
            sink: Arc::new(sink),
        });
    }

    /// The bound sink, or `None` if nothing was registered
    pub fn get(&self) -> Option<BoundSink> {
        self.slot.lock().clone()
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}
