//! Reusable byte channels backing the guest's virtual stdin and stderr.

/// A byte buffer with an explicit owner-controlled reset.
///
/// The host owns one channel per stream and reuses it across calls: stdin
/// is refilled with the next encoded record, stderr is cleared so error
/// text can never leak from one call into the next. Reads consume from a
/// cursor; writes append.
pub struct ByteChannel {
    buf: Vec<u8>,
    pos: usize,
    cap: Option<usize>,
}

impl ByteChannel {
    /// Channel with no size limit.
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            pos: 0,
            cap: None,
        }
    }

    /// Channel that rejects appends once `cap` bytes are held.
    pub fn bounded(cap: usize) -> Self {
        Self {
            buf: Vec::new(),
            pos: 0,
            cap: Some(cap),
        }
    }

    /// Drop all contents and rewind the read cursor.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.pos = 0;
    }

    /// Replace the contents, rewinding the read cursor to the start.
    pub fn fill(&mut self, bytes: &[u8]) {
        self.reset();
        self.buf.extend_from_slice(bytes);
    }

    /// Append bytes, refusing the whole write if it would exceed the cap.
    pub fn try_append(&mut self, bytes: &[u8]) -> bool {
        if let Some(cap) = self.cap {
            if self.buf.len() + bytes.len() > cap {
                return false;
            }
        }
        self.buf.extend_from_slice(bytes);
        true
    }

    /// Consume up to `max` bytes from the read cursor.
    pub fn take(&mut self, max: usize) -> Vec<u8> {
        let end = (self.pos + max).min(self.buf.len());
        let chunk = self.buf[self.pos..end].to_vec();
        self.pos = end;
        chunk
    }

    /// Bytes not yet consumed by [`take`](Self::take).
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Everything written since the last reset, consumed or not.
    pub fn contents(&self) -> &[u8] {
        &self.buf
    }
}
