//! oxbow-sinks - Pluggable record sinks with a sandboxed WebAssembly variant
//!
//! This crate provides both the SDK (the [`Sink`] trait and registry) and a
//! runtime (CLI runner plus the built-in sinks) for delivering records to a
//! destination chosen at startup.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    oxbow-sinks (SDK + Runtime)              │
//! │  Sink, SinkRegistry, Record, SinkError, RunnerConfig        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    Built-in Sinks                           │
//! │  ├── console (host stdout, for smoke tests)                 │
//! │  └── wasm (untrusted guest module in a sandbox)             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    Sandbox                                  │
//! │  └── wasmtime, virtual stdin/stderr, stream-only WASI       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # SDK Usage (Library)
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use oxbow_sinks::{ConsoleSink, Sink, SinkRegistry};
//!
//! let registry = SinkRegistry::new();
//! registry.register("console", ConsoleSink::new());
//!
//! let bound = registry.get().expect("a sink is bound");
//! bound.sink().init(b"{}")?;
//!
//! let resp = bound.sink().produce(b"", b"hello", &BTreeMap::new())?;
//! assert_eq!(resp.bytes_written, 5);
//!
//! bound.sink().close()?;
//! # Ok::<(), oxbow_sinks::SinkError>(())
//! ```
//!
//! # CLI Usage (Binary)
//!
//! ```bash
//! # Feed stdin lines to the configured sink
//! oxbow-sinks -c sink.yaml run
//!
//! # Validate configuration
//! oxbow-sinks -c sink.yaml validate
//!
//! # List available sink kinds
//! oxbow-sinks sinks
//! ```

#![forbid(unsafe_code)]

// Core SDK types
pub mod error;
pub mod record;
pub mod registry;
pub mod sink;

// Built-in sinks
pub mod console;
pub mod wasm;

// Runner configuration
pub mod config;

// Re-export error types
pub use error::{Result, SinkError};

// Re-export the core trait and its companions at crate root
pub use record::Record;
pub use registry::{BoundSink, SinkRegistry};
pub use sink::{ProduceResponse, Sink, SinkState};

// Re-export the built-in sinks
pub use console::ConsoleSink;
pub use wasm::{WasmSink, WasmSinkConfig};

// Re-export config types
pub use config::RunnerConfig;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        BoundSink, ConsoleSink, ProduceResponse, Record, Result, Sink, SinkError, SinkRegistry,
        SinkState, WasmSink, WasmSinkConfig,
    };
}
