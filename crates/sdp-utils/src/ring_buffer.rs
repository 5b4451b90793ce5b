//! A bounded byte buffer used to capture subprocess output without risking
//! unbounded memory growth from a runaway worker.

use std::collections::VecDeque;

/// Accumulates bytes up to `capacity`; once full, oldest bytes are dropped
/// from the front and `truncated` is set so callers can report that the
/// captured output is a suffix, not the full stream.
#[derive(Debug)]
pub struct RingBuffer {
    capacity: usize,
    buf: VecDeque<u8>,
    truncated: bool,
}

impl RingBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buf: VecDeque::with_capacity(capacity.min(64 * 1024)),
            truncated: false,
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if self.buf.len() == self.capacity {
                self.buf.pop_front();
                self.truncated = true;
            }
            self.buf.push_back(b);
        }
    }

    #[must_use]
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Lossy UTF-8 rendering of the captured bytes, with a `[...truncated]`
    /// marker prepended when earlier output was dropped.
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        let bytes: Vec<u8> = self.buf.iter().copied().collect();
        let rendered = String::from_utf8_lossy(&bytes).into_owned();
        if self.truncated {
            format!("[...truncated]\n{rendered}")
        } else {
            rendered
        }
    }
}
