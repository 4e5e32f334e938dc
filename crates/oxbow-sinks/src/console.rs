//! Console sink: prints record values to the host's stdout.

use std::collections::BTreeMap;
use std::io::Write;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Result, SinkError};
use crate::sink::{ProduceResponse, Sink, SinkState};

/// Sink that writes each record value to standard output, one per line.
///
/// Useful for smoke-testing a pipeline without a real backend. The key and
/// headers are accepted and ignored.
pub struct ConsoleSink {
    state: RwLock<SinkState>,
}

impl ConsoleSink {
    /// Create a console sink
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SinkState::Created),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SinkState {
        *self.state.read()
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn init(&self, _config: &[u8]) -> Result<()> {
        let mut state = self.state.write();
        if *state != SinkState::Created {
            return Err(SinkError::invalid_state(format!(
                "init called on {} sink",
                state
            )));
        }
        // No mandatory fields; the config payload is ignored.
        *state = SinkState::Initialized;
        debug!("console sink initialized");
        Ok(())
    }

    fn produce(
        &self,
        _key: &[u8],
        value: &[u8],
        _headers: &BTreeMap<String, String>,
    ) -> Result<ProduceResponse> {
        let state = self.state.read();
        if *state != SinkState::Initialized {
            return Err(SinkError::invalid_state(format!(
                "produce called on {} sink",
                state
            )));
        }

        let mut out = std::io::stdout().lock();
        out.write_all(value)
            .and_then(|_| out.write_all(b"\n"))
            .map_err(|e| SinkError::invocation(format!("console write failed: {e}")))?;

        Ok(ProduceResponse {
            bytes_written: value.len() as u64,
            message: Some("printed to console".to_string()),
        })
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.write();
        if *state == SinkState::Initialized {
            debug!("console sink closed");
        }
        *state = SinkState::Closed;
        Ok(())
    }
}
