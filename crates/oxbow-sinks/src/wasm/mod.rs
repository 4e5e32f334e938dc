//! WebAssembly sink sandbox.
//!
//! A guest module runs with no ambient capabilities. All traffic between
//! host and guest moves through three virtual streams and one exported
//! function:
//!
//! ```text
//!   host                                 guest (wasm module)
//!   ----                                 -------------------
//!   encode record ──fill──▶ stdin ──fd_read──▶ produce(len)
//!                                               │
//!   host stdout ◀─(if bound)─ stdout ◀─fd_write─┤
//!   error text  ◀───────────  stderr ◀─fd_write─┘
//!                                               │
//!   status ◀──────────── return u64 ────────────┘
//! ```
//!
//! The host resets both channels before every invocation and interprets
//! the returned status afterwards: zero is success, anything else is the
//! length of the error text the guest left in stderr.

pub mod abi;

mod channel;
mod engine;
mod loader;
mod wasi;

pub use engine::{WasmSink, WasmSinkConfig};
