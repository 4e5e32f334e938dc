//! Module loading and preflight checks.

use std::path::Path;

use tracing::debug;

use crate::error::{Result, SinkError};
use crate::wasm::abi::WASM_MAGIC;

/// Read a compiled module from disk, verifying the WebAssembly preamble.
///
/// Catching a text-format or truncated file here gives a load-time error
/// that names the path, instead of a compiler error from deep inside the
/// runtime.
pub fn read_module(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|e| {
        SinkError::load(format!("failed to read module at {}: {e}", path.display()))
    })?;

    if bytes.len() < 8 || bytes[..4] != WASM_MAGIC {
        return Err(SinkError::load(format!(
            "{} is not a compiled WebAssembly module",
            path.display()
        )));
    }

    debug!(path = %path.display(), size = bytes.len(), "read sink module");
    Ok(bytes)
}
