/// UploadRing - cursor arithmetic of the per-frame constant upload ring
///
/// The ring is a fixed-capacity byte region reused cyclically for transient
/// per-draw constant data. This type owns only the arithmetic: 256-byte
/// rounding of reservations, pre-wrap when a reservation would reach or
/// exceed capacity (the remaining tail is discarded, there is no sub-256
/// wraparound), and the post-advance wrap back to zero.
///
/// No per-slot lifetime is tracked. Reuse is safe only because the caller's
/// frame loop submits and waits synchronously before the cursor can wrap
/// back onto a slot the GPU is still reading; with multi-frame pipelining a
/// per-slot last-used fence value would have to be checked here.

use crate::error::{Error, Result};

/// Constant-buffer views must cover a multiple of this many bytes
pub const CONSTANT_ALIGNMENT: u64 = 256;

/// A claimed span of the ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingSpan {
    /// Byte offset of the span inside the ring
    pub offset: u64,
    /// Reserved length: the requested size rounded up to 256 bytes
    pub reserved: u64,
}

/// Cursor state of the constant upload ring
#[derive(Debug)]
pub struct UploadRing {
    capacity: u64,
    cursor: u64,
}

impl UploadRing {
    /// Create a ring over `capacity` bytes
    ///
    /// # Arguments
    ///
    /// * `capacity` - Total ring size; a non-zero multiple of 256
    pub fn new(capacity: u64) -> Result<Self> {
        if capacity == 0 || capacity % CONSTANT_ALIGNMENT != 0 {
            return Err(Error::InvalidResource(format!(
                "ring capacity {} is not a non-zero multiple of {}",
                capacity, CONSTANT_ALIGNMENT
            )));
        }
        Ok(Self {
            capacity,
            cursor: 0,
        })
    }

    /// Total ring size in bytes
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Current byte cursor
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Claim the next aligned span for a payload of `size_in_bytes`
    ///
    /// # Arguments
    ///
    /// * `size_in_bytes` - Payload size; non-zero, at most the ring capacity
    pub fn reserve(&mut self, size_in_bytes: u64) -> Result<RingSpan> {
        if size_in_bytes == 0 {
            return Err(Error::InvalidResource(
                "constant payload must be non-empty".to_string(),
            ));
        }
        let reserved =
            (size_in_bytes + CONSTANT_ALIGNMENT - 1) & !(CONSTANT_ALIGNMENT - 1);
        if reserved > self.capacity {
            return Err(Error::InvalidResource(format!(
                "constant payload of {} bytes (reserving {}) exceeds ring capacity {}",
                size_in_bytes, reserved, self.capacity
            )));
        }

        // Reaching or exceeding the end wraps first; the tail is discarded
        if self.cursor + reserved >= self.capacity {
            self.cursor = 0;
        }

        let offset = self.cursor;
        self.cursor += reserved;
        if self.cursor >= self.capacity {
            self.cursor = 0;
        }

        Ok(RingSpan { offset, reserved })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "upload_ring_tests.rs"]
mod tests;
