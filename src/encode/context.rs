use std::collections::HashSet;

use bytes::BytesMut;
use tracing::trace;

use crate::constants::{CYCLE_CHECK_THRESHOLD, INITIAL_BUFFER_CAPACITY, MAX_DEPTH};
use crate::error::{Error, Result};

/// Per-call encoding state: the output buffer plus the bookkeeping that
/// bounds recursion.
///
/// Contexts are pooled and reused across calls; [`reset`](Self::reset) brings
/// one back to its initial state without giving up the buffer's capacity.
#[derive(Debug)]
pub struct EncodeContext {
    buf: BytesMut,
    depth: usize,
    ref_level: usize,
    seen: HashSet<usize>,
}

impl Default for EncodeContext {
    fn default() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            depth: 0,
            ref_level: 0,
            seen: HashSet::new(),
        }
    }
}

impl EncodeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buf(&self) -> &BytesMut {
        &self.buf
    }

    pub fn buf_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    pub(crate) fn into_buf(self) -> BytesMut {
        self.buf
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Enters a list, dictionary or record.
    pub fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Error::DepthExceeded { depth: MAX_DEPTH });
        }
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Follows a reference to `addr`.
    ///
    /// Only the level is counted until it passes the cycle-check threshold;
    /// past that, every pointee address is remembered and a repeat is a
    /// cycle. `None` marks an indirection without an identity of its own.
    pub fn enter_ref(&mut self, addr: Option<usize>, type_name: &'static str) -> Result<()> {
        self.ref_level += 1;
        if self.ref_level <= CYCLE_CHECK_THRESHOLD {
            return Ok(());
        }
        if self.ref_level == CYCLE_CHECK_THRESHOLD + 1 {
            trace!("reference level passed {}, tracking pointees", CYCLE_CHECK_THRESHOLD);
        }
        if let Some(addr) = addr {
            if !self.seen.insert(addr) {
                return Err(Error::Cycle { type_name });
            }
        }
        Ok(())
    }

    /// Returns from the reference entered with the same `addr`, so a pointee
    /// shared by siblings is not mistaken for a cycle.
    pub fn leave_ref(&mut self, addr: Option<usize>) {
        if self.ref_level > CYCLE_CHECK_THRESHOLD {
            if let Some(addr) = addr {
                self.seen.remove(&addr);
            }
        }
        self.ref_level -= 1;
    }

    /// Clears the output and all traversal state.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.depth = 0;
        self.ref_level = 0;
        self.seen.clear();
    }
}
