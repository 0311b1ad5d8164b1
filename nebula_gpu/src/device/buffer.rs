/// Buffer trait - GPU buffer resource

use crate::device::{BufferId, HeapKind, ResourceState};
use crate::error::Result;

/// Buffer resource trait
///
/// Implemented by backend-specific buffer types (e.g., VulkanBuffer,
/// MockBuffer). The underlying GPU memory is released when the last
/// reference is dropped.
pub trait Buffer: Send + Sync {
    /// Unique identity of this buffer within its device
    fn id(&self) -> BufferId;

    /// Size in bytes
    fn size(&self) -> u64;

    /// Heap the buffer lives in
    fn heap(&self) -> HeapKind;

    /// Last state the buffer was declared to be in
    ///
    /// Tracked CPU-side as transitions are recorded; after a submission has
    /// completed this matches the state the GPU observes.
    fn state(&self) -> ResourceState;

    /// Write bytes through the persistent mapping
    ///
    /// Only valid for `HeapKind::Upload` buffers; device-local buffers are
    /// filled through recorded copies instead.
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset into the buffer in bytes
    /// * `data` - Data to write
    fn write(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Read bytes back from the buffer
    ///
    /// Backends only support this where the memory is CPU-readable; the mock
    /// device supports it for every buffer, which is what makes upload
    /// round-trips testable without a GPU.
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset into the buffer in bytes
    /// * `out` - Destination slice, filled completely
    fn read(&self, offset: u64, out: &mut [u8]) -> Result<()>;
}
