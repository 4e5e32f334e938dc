//! Binary interface shared between the host and guest sink modules.
//!
//! A guest module is a plain WebAssembly core module that imports a small
//! subset of `wasi_snapshot_preview1` for byte I/O and exports a single
//! entry point. Records travel over the virtual stdin channel; error text
//! travels back over the virtual stderr channel.

/// Import namespace the host satisfies for guest modules.
pub const WASI_NAMESPACE: &str = "wasi_snapshot_preview1";

/// Required guest entry point.
///
/// Signature: `(param input_len: u32) -> (result status: u64)`
///
/// The host writes the encoded record to the guest's stdin before each
/// call and passes its length as `input_len`. A status of [`STATUS_SUCCESS`]
/// means the record was handled; any other value is the number of bytes of
/// error text the guest wrote to stderr during the call.
pub const EXPORT_PRODUCE: &str = "produce";

/// Linear memory export the I/O shims read from and write to.
pub const EXPORT_MEMORY: &str = "memory";

/// Status value a guest returns from `produce` on success.
pub const STATUS_SUCCESS: u64 = 0;

/// Leading bytes of a compiled WebAssembly module (`\0asm`).
pub const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6d];

/// File descriptor the host feeds encoded records through.
pub const FD_STDIN: u32 = 0;

/// File descriptor forwarded to the host's stdout when bound, otherwise
/// counted and discarded.
pub const FD_STDOUT: u32 = 1;

/// File descriptor the host collects guest error text from.
pub const FD_STDERR: u32 = 2;

/// Most error text the host retains per call; writes past this fail with
/// `NOSPC` inside the guest.
pub const MAX_STDERR_BYTES: usize = 1 << 20;

/// WASI errno: no error.
pub const ERRNO_SUCCESS: i32 = 0;
/// WASI errno: bad file descriptor.
pub const ERRNO_BADF: i32 = 8;
/// WASI errno: bad address in iovec or result pointer.
pub const ERRNO_FAULT: i32 = 21;
/// WASI errno: host-side I/O failure.
pub const ERRNO_IO: i32 = 29;
/// WASI errno: no space left in the stderr channel.
pub const ERRNO_NOSPC: i32 = 51;
