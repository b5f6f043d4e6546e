//! Receive buffer for accumulating partial reads.
//!
//! A single contiguous byte region shared between the transport and the
//! decoder. The transport writes into the tail at `write_offset`; the
//! framing state machine reads at `decode_offset`. Invariant:
//!
//! ```text
//! 0 <= decode_offset <= write_offset <= capacity
//! ```
//!
//! After every decode pass [`RecvBuffer::reclaim`] restores room for the
//! bytes the stalled step still needs: the region is reset when fully
//! drained, grown (by replacement, never in place) when the outstanding
//! message cannot fit, or compacted when only the tail is short. Capacity
//! never shrinks, so a connection's buffer settles at the size of its
//! largest message.

use super::wire_format::LENGTH_PREFIX_SIZE;

/// Contiguous receive region with an append cursor and a decode cursor.
pub(crate) struct RecvBuffer {
    buf: Box<[u8]>,
    /// Next position the transport may write into.
    write_offset: usize,
    /// Next unread byte for the state machine.
    decode_offset: usize,
}

impl RecvBuffer {
    /// Allocate a buffer with the given capacity.
    ///
    /// Capacities below the 4-byte length prefix are rounded up so a fresh
    /// decoder always exposes a non-empty writable tail.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity.max(LENGTH_PREFIX_SIZE)].into_boxed_slice(),
            write_offset: 0,
            decode_offset: 0,
        }
    }

    /// Total capacity in bytes.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Writable tail the transport may fill before the next decode call.
    #[inline]
    pub(crate) fn writable_tail(&mut self) -> &mut [u8] {
        &mut self.buf[self.write_offset..]
    }

    /// Remaining tail capacity.
    #[inline]
    pub(crate) fn writable_len(&self) -> usize {
        self.buf.len() - self.write_offset
    }

    /// Record that the transport appended `n` bytes at the tail.
    #[inline]
    pub(crate) fn commit(&mut self, n: usize) {
        debug_assert!(n <= self.writable_len());
        self.write_offset += n;
    }

    /// Bytes buffered but not yet consumed by the state machine.
    #[inline]
    pub(crate) fn available(&self) -> usize {
        debug_assert!(self.decode_offset <= self.write_offset);
        self.write_offset - self.decode_offset
    }

    /// The unconsumed bytes, starting at the decode cursor.
    #[inline]
    pub(crate) fn filled(&self) -> &[u8] {
        &self.buf[self.decode_offset..self.write_offset]
    }

    /// Advance the decode cursor past `n` consumed bytes.
    #[inline]
    pub(crate) fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.available());
        self.decode_offset += n;
    }

    /// Restore tail room after a decode pass.
    ///
    /// `need` is the shortfall reported by the stalled step (zero if the
    /// machine is between messages); `message_length` is the total declared
    /// length of the message in progress, used to bias growth toward
    /// whole-message residency.
    pub(crate) fn reclaim(&mut self, need: usize, message_length: usize) {
        let remain = self.available();

        if remain == 0 {
            // Everything consumed. Keep the allocation unless the next step
            // already knows it cannot fit.
            if need > self.buf.len() {
                let new_capacity = need << 1;
                tracing::debug!(capacity = new_capacity, "growing receive buffer");
                self.buf = vec![0u8; new_capacity].into_boxed_slice();
            }
            self.write_offset = 0;
            self.decode_offset = 0;
            return;
        }

        let required = remain + need;
        if required > self.buf.len() {
            // Unconsumed suffix plus the outstanding bytes exceed capacity:
            // replace the buffer and carry the suffix over.
            let new_capacity = usize::max(message_length / 2, required) << 1;
            tracing::debug!(capacity = new_capacity, remain, "growing receive buffer");
            let mut new_buf = vec![0u8; new_capacity].into_boxed_slice();
            new_buf[..remain].copy_from_slice(&self.buf[self.decode_offset..self.write_offset]);
            self.buf = new_buf;
            self.write_offset = remain;
            self.decode_offset = 0;
        } else if required > self.buf.len() - self.write_offset {
            // Fits overall but not in the tail: slide the suffix down.
            self.buf.copy_within(self.decode_offset..self.write_offset, 0);
            self.write_offset = remain;
            self.decode_offset = 0;
        }
    }

    /// Drop all buffered bytes and rewind both cursors. Capacity is kept.
    pub(crate) fn reset(&mut self) {
        self.write_offset = 0;
        self.decode_offset = 0;
    }
}
