//! Minimal `wasi_snapshot_preview1` surface for sink guests.
//!
//! Guests see exactly three streams: stdin (records in), stdout (optional
//! passthrough to the host), stderr (error text out). Stdin and stderr are
//! backed by host-owned [`ByteChannel`]s in the store data, so the host can
//! reset and inspect them between calls without the guest's cooperation;
//! stdout is forwarded chunk by chunk or discarded, never buffered. No
//! clocks, no filesystem, no randomness; imports outside this list trap.

use std::io::Write;

use wasmtime::{Caller, Extern, Linker, Memory, StoreLimits};

use crate::wasm::abi::{
    ERRNO_BADF, ERRNO_FAULT, ERRNO_IO, ERRNO_NOSPC, ERRNO_SUCCESS, EXPORT_MEMORY, FD_STDERR,
    FD_STDIN, FD_STDOUT, MAX_STDERR_BYTES, WASI_NAMESPACE,
};
use crate::wasm::channel::ByteChannel;

const FDSTAT_SIZE: usize = 24;
const FILETYPE_CHARACTER_DEVICE: u8 = 2;
// fd_read | fd_write
const RIGHTS_STREAM: u64 = 0x42;

/// Host-side state carried in each guest's store.
pub struct HostState {
    pub stdin: ByteChannel,
    pub stderr: ByteChannel,
    pub bind_stdout: bool,
    pub limits: StoreLimits,
}

impl HostState {
    pub fn new(bind_stdout: bool, limits: StoreLimits) -> Self {
        Self {
            stdin: ByteChannel::new(),
            stderr: ByteChannel::bounded(MAX_STDERR_BYTES),
            bind_stdout,
            limits,
        }
    }
}

/// Register the stream shims on a linker.
pub fn add_to_linker(linker: &mut Linker<HostState>) -> wasmtime::Result<()> {
    linker.func_wrap(WASI_NAMESPACE, "fd_read", fd_read)?;
    linker.func_wrap(WASI_NAMESPACE, "fd_write", fd_write)?;
    linker.func_wrap(WASI_NAMESPACE, "fd_close", fd_close)?;
    linker.func_wrap(WASI_NAMESPACE, "fd_fdstat_get", fd_fdstat_get)?;
    linker.func_wrap(WASI_NAMESPACE, "args_sizes_get", args_sizes_get)?;
    linker.func_wrap(WASI_NAMESPACE, "args_get", args_get)?;
    linker.func_wrap(WASI_NAMESPACE, "environ_sizes_get", environ_sizes_get)?;
    linker.func_wrap(WASI_NAMESPACE, "environ_get", environ_get)?;
    linker.func_wrap(WASI_NAMESPACE, "sched_yield", sched_yield)?;
    linker.func_wrap(WASI_NAMESPACE, "proc_exit", proc_exit)?;
    Ok(())
}

fn guest_memory(caller: &mut Caller<'_, HostState>) -> Option<Memory> {
    caller.get_export(EXPORT_MEMORY).and_then(Extern::into_memory)
}

fn load_u32(mem: &[u8], addr: usize) -> Option<u32> {
    let bytes = mem.get(addr..addr.checked_add(4)?)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

fn store_u32(mem: &mut [u8], addr: usize, value: u32) -> Option<()> {
    let dst = mem.get_mut(addr..addr.checked_add(4)?)?;
    dst.copy_from_slice(&value.to_le_bytes());
    Some(())
}

fn fd_read(
    mut caller: Caller<'_, HostState>,
    fd: u32,
    iovs: u32,
    iovs_len: u32,
    nread_ptr: u32,
) -> i32 {
    if fd != FD_STDIN {
        return ERRNO_BADF;
    }
    let Some(memory) = guest_memory(&mut caller) else {
        return ERRNO_FAULT;
    };
    let (mem, state) = memory.data_and_store_mut(&mut caller);

    let mut total: u32 = 0;
    for i in 0..iovs_len as usize {
        let base = iovs as usize + i * 8;
        let (Some(buf_ptr), Some(buf_len)) = (load_u32(mem, base), load_u32(mem, base + 4))
        else {
            return ERRNO_FAULT;
        };
        if buf_len == 0 {
            continue;
        }

        let chunk = state.stdin.take(buf_len as usize);
        if chunk.is_empty() {
            // Channel drained: report what we copied so far as EOF.
            break;
        }
        let start = buf_ptr as usize;
        let Some(dst) = mem.get_mut(start..start + chunk.len()) else {
            return ERRNO_FAULT;
        };
        dst.copy_from_slice(&chunk);
        total += chunk.len() as u32;
    }

    if store_u32(mem, nread_ptr as usize, total).is_none() {
        return ERRNO_FAULT;
    }
    ERRNO_SUCCESS
}

fn fd_write(
    mut caller: Caller<'_, HostState>,
    fd: u32,
    iovs: u32,
    iovs_len: u32,
    nwritten_ptr: u32,
) -> i32 {
    if fd != FD_STDOUT && fd != FD_STDERR {
        return ERRNO_BADF;
    }
    let Some(memory) = guest_memory(&mut caller) else {
        return ERRNO_FAULT;
    };
    let (mem, state) = memory.data_and_store_mut(&mut caller);
    let mut stdout = (fd == FD_STDOUT && state.bind_stdout).then(|| std::io::stdout().lock());

    // One chunk at a time, each against the stream's remaining budget. A
    // gathered write must never buffer on the host: a guest can stack
    // iovecs over the same page and claim far more logical bytes than it
    // has memory.
    let mut total: u32 = 0;
    for i in 0..iovs_len as usize {
        let base = iovs as usize + i * 8;
        let (Some(buf_ptr), Some(buf_len)) = (load_u32(mem, base), load_u32(mem, base + 4))
        else {
            return ERRNO_FAULT;
        };
        let start = buf_ptr as usize;
        let Some(end) = start.checked_add(buf_len as usize) else {
            return ERRNO_FAULT;
        };
        let Some(chunk) = mem.get(start..end) else {
            return ERRNO_FAULT;
        };
        // nwritten is a u32; stop at a short write and let the guest resume.
        let Some(next) = total.checked_add(buf_len) else {
            break;
        };

        if fd == FD_STDERR {
            if !state.stderr.try_append(chunk) {
                return ERRNO_NOSPC;
            }
        } else if let Some(out) = stdout.as_mut() {
            if out.write_all(chunk).is_err() {
                return ERRNO_IO;
            }
        }
        // An unbound stdout swallows the bytes but still reports them written.
        total = next;
    }

    if let Some(mut out) = stdout {
        if out.flush().is_err() {
            return ERRNO_IO;
        }
    }
    if store_u32(mem, nwritten_ptr as usize, total).is_none() {
        return ERRNO_FAULT;
    }
    ERRNO_SUCCESS
}

fn fd_close(fd: u32) -> i32 {
    if fd <= FD_STDERR {
        ERRNO_SUCCESS
    } else {
        ERRNO_BADF
    }
}

fn fd_fdstat_get(mut caller: Caller<'_, HostState>, fd: u32, stat_ptr: u32) -> i32 {
    if fd > FD_STDERR {
        return ERRNO_BADF;
    }
    let Some(memory) = guest_memory(&mut caller) else {
        return ERRNO_FAULT;
    };
    let mem = memory.data_mut(&mut caller);

    let start = stat_ptr as usize;
    let Some(stat) = start
        .checked_add(FDSTAT_SIZE)
        .and_then(|end| mem.get_mut(start..end))
    else {
        return ERRNO_FAULT;
    };
    stat.fill(0);
    stat[0] = FILETYPE_CHARACTER_DEVICE;
    stat[8..16].copy_from_slice(&RIGHTS_STREAM.to_le_bytes());
    ERRNO_SUCCESS
}

fn args_sizes_get(mut caller: Caller<'_, HostState>, count_ptr: u32, buf_size_ptr: u32) -> i32 {
    zero_sizes(&mut caller, count_ptr, buf_size_ptr)
}

fn args_get(_argv: u32, _argv_buf: u32) -> i32 {
    ERRNO_SUCCESS
}

fn environ_sizes_get(mut caller: Caller<'_, HostState>, count_ptr: u32, buf_size_ptr: u32) -> i32 {
    zero_sizes(&mut caller, count_ptr, buf_size_ptr)
}

fn environ_get(_environ: u32, _environ_buf: u32) -> i32 {
    ERRNO_SUCCESS
}

// Guests get no arguments and no environment.
fn zero_sizes(caller: &mut Caller<'_, HostState>, count_ptr: u32, buf_size_ptr: u32) -> i32 {
    let Some(memory) = guest_memory(caller) else {
        return ERRNO_FAULT;
    };
    let mem = memory.data_mut(&mut *caller);
    if store_u32(mem, count_ptr as usize, 0).is_none()
        || store_u32(mem, buf_size_ptr as usize, 0).is_none()
    {
        return ERRNO_FAULT;
    }
    ERRNO_SUCCESS
}

fn sched_yield() -> i32 {
    std::thread::yield_now();
    ERRNO_SUCCESS
}

fn proc_exit(code: u32) -> wasmtime::Result<()> {
    Err(wasmtime::Error::msg(format!("guest exited with code {code}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_store_u32() {
        let mut mem = [0u8; 16];
        store_u32(&mut mem, 4, 0xdead_beef).unwrap();
        assert_eq!(load_u32(&mem, 4), Some(0xdead_beef));
        assert_eq!(&mem[4..8], &0xdead_beef_u32.to_le_bytes());
    }

    #[test]
    fn test_load_store_out_of_bounds() {
        let mut mem = [0u8; 8];
        assert_eq!(load_u32(&mem, 6), None);
        assert_eq!(store_u32(&mut mem, usize::MAX - 1, 1), None);
    }

    #[test]
    fn test_fd_close_streams_only() {
        assert_eq!(fd_close(FD_STDIN), ERRNO_SUCCESS);
        assert_eq!(fd_close(FD_STDERR), ERRNO_SUCCESS);
        assert_eq!(fd_close(3), ERRNO_BADF);
    }
}
