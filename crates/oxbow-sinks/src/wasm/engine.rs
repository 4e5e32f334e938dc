//! Sandboxed execution engine for WebAssembly sink modules.

use std::collections::BTreeMap;
use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};
use wasmtime::{Engine, Linker, Module, Store, StoreLimitsBuilder, TypedFunc};

use crate::error::{Result, SinkError};
use crate::record::Record;
use crate::sink::{ProduceResponse, Sink, SinkState};
use crate::wasm::abi::{EXPORT_PRODUCE, STATUS_SUCCESS};
use crate::wasm::loader;
use crate::wasm::wasi::{self, HostState};

const MAX_GUEST_MEMORY_BYTES: usize = 512 << 20;

/// Configuration for a WebAssembly sink, decoded from the init payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasmSinkConfig {
    /// Path to the compiled guest module.
    pub module_path: PathBuf,
    /// Forward the guest's stdout to the host's stdout. Off by default;
    /// unbound stdout writes succeed but go nowhere.
    #[serde(default)]
    pub bind_stdout: bool,
}

struct ModuleInstance {
    store: Store<HostState>,
    produce: TypedFunc<u32, u64>,
}

struct Inner {
    state: SinkState,
    instance: Option<ModuleInstance>,
}

/// Sink that delegates each record to an untrusted WebAssembly module.
///
/// Every call to `produce` runs the same sequence under one lock: refill
/// the guest's stdin with the encoded record, clear its stderr, invoke the
/// exported entry point, then interpret the returned status. Holding the
/// lock across the whole sequence means two records can never interleave
/// their I/O, at the cost of serializing callers. The engine sets no
/// deadline of its own; callers that need one must impose it outside.
pub struct WasmSink {
    inner: Mutex<Inner>,
}

impl WasmSink {
    /// Create a sink in the created state; `init` loads the module.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: SinkState::Created,
                instance: None,
            }),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SinkState {
        self.inner.lock().state
    }
}

impl Default for WasmSink {
    fn default() -> Self {
        Self::new()
    }
}

fn build_instance(config: &[u8]) -> Result<ModuleInstance> {
    let config: WasmSinkConfig = serde_json::from_slice(config)
        .map_err(|e| SinkError::config(format!("invalid wasm sink config: {e}")))?;
    if config.module_path.as_os_str().is_empty() {
        return Err(SinkError::config("module_path is required"));
    }

    let bytes = loader::read_module(&config.module_path)?;

    let engine = Engine::default();
    let module = Module::new(&engine, &bytes)
        .map_err(|e| SinkError::load(format!("failed to compile module: {e}")))?;

    let mut linker: Linker<HostState> = Linker::new(&engine);
    wasi::add_to_linker(&mut linker)
        .map_err(|e| SinkError::load(format!("failed to wire stream imports: {e}")))?;
    // Imports outside the stream surface resolve to functions that trap.
    linker
        .define_unknown_imports_as_traps(&module)
        .map_err(|e| SinkError::load(format!("failed to stub guest imports: {e}")))?;

    let limits = StoreLimitsBuilder::new()
        .memory_size(MAX_GUEST_MEMORY_BYTES)
        .build();
    let mut store = Store::new(&engine, HostState::new(config.bind_stdout, limits));
    store.limiter(|state| &mut state.limits);

    let instance = linker
        .instantiate(&mut store, &module)
        .map_err(|e| SinkError::load(format!("failed to instantiate module: {e}")))?;

    let produce = instance
        .get_typed_func::<u32, u64>(&mut store, EXPORT_PRODUCE)
        .map_err(|_| {
            SinkError::contract(format!(
                "guest module does not export `{EXPORT_PRODUCE}` with signature (u32) -> u64"
            ))
        })?;

    info!(
        module = %config.module_path.display(),
        bind_stdout = config.bind_stdout,
        "wasm sink module loaded"
    );

    Ok(ModuleInstance { store, produce })
}

impl Sink for WasmSink {
    fn init(&self, config: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.state != SinkState::Created {
            return Err(SinkError::invalid_state(format!(
                "init called on {} sink",
                inner.state
            )));
        }

        match build_instance(config) {
            Ok(instance) => {
                inner.instance = Some(instance);
                inner.state = SinkState::Initialized;
                Ok(())
            }
            Err(e) => {
                inner.state = SinkState::Failed;
                Err(e)
            }
        }
    }

    fn produce(
        &self,
        key: &[u8],
        value: &[u8],
        headers: &BTreeMap<String, String>,
    ) -> Result<ProduceResponse> {
        let mut inner = self.inner.lock();
        if inner.state != SinkState::Initialized {
            return Err(SinkError::invalid_state(format!(
                "produce called on {} sink",
                inner.state
            )));
        }
        let Some(instance) = inner.instance.as_mut() else {
            return Err(SinkError::invalid_state("produce called on torn-down sink"));
        };

        let encoded = Record {
            key,
            value,
            headers,
        }
        .encode()?;
        let input_len = u32::try_from(encoded.len())
            .map_err(|_| SinkError::protocol("record exceeds the guest's 4 GiB input limit"))?;

        // Fresh channels for every call: last call's input and error text
        // must not be observable in this one.
        {
            let state = instance.store.data_mut();
            state.stdin.fill(&encoded);
            state.stderr.reset();
        }

        trace!(input_len, "invoking guest produce");
        // Surface the root cause, not the backtrace context wasmtime
        // layers on top of it.
        let status = instance
            .produce
            .call(&mut instance.store, input_len)
            .map_err(|e| SinkError::trap(e.root_cause().to_string()))?;

        if status == STATUS_SUCCESS {
            return Ok(ProduceResponse {
                bytes_written: value.len() as u64,
                message: None,
            });
        }

        // Nonzero status claims that many bytes of error text in stderr.
        // Compare against what the guest actually wrote before slicing, so
        // an over-claimed length can neither panic nor leak stale bytes.
        let stderr = instance.store.data().stderr.contents();
        let written = stderr.len() as u64;
        if status > written {
            return Err(SinkError::protocol(format!(
                "guest reported {status} error bytes but wrote {written}"
            )));
        }
        let message = String::from_utf8_lossy(&stderr[..status as usize]).into_owned();
        Err(SinkError::invocation(message))
    }

    fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.instance.take().is_some() {
            debug!("wasm sink instance dropped");
        }
        inner.state = SinkState::Closed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let cfg: WasmSinkConfig =
            serde_json::from_str(r#"{"module_path": "/tmp/sink.wasm"}"#).unwrap();
        assert_eq!(cfg.module_path, PathBuf::from("/tmp/sink.wasm"));
        assert!(!cfg.bind_stdout);
    }

    #[test]
    fn test_config_requires_module_path() {
        assert!(serde_json::from_str::<WasmSinkConfig>("{}").is_err());
    }

    #[test]
    fn test_init_rejects_malformed_config() {
        let sink = WasmSink::new();
        let err = sink.init(b"not json").unwrap_err();
        assert!(matches!(err, SinkError::Config(_)));
        assert_eq!(sink.state(), SinkState::Failed);
    }

    #[test]
    fn test_init_rejects_empty_module_path() {
        let sink = WasmSink::new();
        let err = sink.init(br#"{"module_path": ""}"#).unwrap_err();
        assert!(matches!(err, SinkError::Config(_)));
    }

    #[test]
    fn test_produce_before_init_rejected() {
        let sink = WasmSink::new();
        let err = sink
            .produce(b"", b"v", &BTreeMap::new())
            .expect_err("produce must fail before init");
        assert!(matches!(err, SinkError::InvalidState(_)));
    }

    #[test]
    fn test_close_without_init_is_safe() {
        let sink = WasmSink::new();
        sink.close().unwrap();
        assert_eq!(sink.state(), SinkState::Closed);
    }
}
