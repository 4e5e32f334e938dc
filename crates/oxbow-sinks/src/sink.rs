//! The lifecycle contract every sink implements.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;

/// Lifecycle states a sink moves through.
///
/// `Failed` is absorbing: a sink whose init failed stays unusable and a
/// fresh instance must be constructed to try again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    /// Constructed, not yet initialized
    Created,
    /// Ready to accept records
    Initialized,
    /// Resources released
    Closed,
    /// Initialization failed
    Failed,
}

impl fmt::Display for SinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Initialized => write!(f, "initialized"),
            Self::Closed => write!(f, "closed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of a successful produce call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProduceResponse {
    /// Byte length of the record value that was accepted
    pub bytes_written: u64,
    /// Optional human-readable diagnostic from the sink
    pub message: Option<String>,
}

/// A sink accepts records one at a time and writes them somewhere.
///
/// Implementations are driven through a fixed sequence: `init` exactly once,
/// `produce` any number of times (possibly from many threads at once), then
/// `close` once at shutdown. `produce` outside the initialized state must be
/// rejected, never silently accepted.
pub trait Sink: Send + Sync {
    /// Decode `config` and perform all expensive setup up front.
    ///
    /// The payload is an opaque byte blob; each implementation defines its
    /// own mandatory fields and fails with a configuration error when they
    /// are missing or malformed.
    fn init(&self, config: &[u8]) -> Result<()>;

    /// Write one record, blocking until the backing resource has accepted
    /// it. Exactly one backing write happens per successful call.
    fn produce(
        &self,
        key: &[u8],
        value: &[u8],
        headers: &BTreeMap<String, String>,
    ) -> Result<ProduceResponse>;

    /// Release all held resources. Safe to call more than once; produce
    /// calls after the first close are rejected.
    fn close(&self) -> Result<()>;
}
