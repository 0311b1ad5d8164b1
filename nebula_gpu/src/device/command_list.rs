/// CommandList and CommandAllocator traits - recording of upload and copy work

use crate::device::{Buffer, ResourceState};
use crate::error::Result;

/// Backing memory for recorded commands
///
/// Must never be reset while a submission that recorded out of it is still
/// executing; callers enforce this by waiting on the fence first.
pub trait CommandAllocator: Send + Sync {
    /// Reclaim all memory recorded out of this allocator
    fn reset(&mut self) -> Result<()>;
}

/// Command list for recording copy and transition commands
///
/// Created in the recording state. Commands execute on the GPU in recording
/// order once the list is closed and handed to `CommandQueue::execute`.
pub trait CommandList: Send + Sync {
    /// Whether the list currently accepts commands
    fn is_recording(&self) -> bool;

    /// Close the list so it can be executed
    fn close(&mut self) -> Result<()>;

    /// Reopen the list for recording against a reset allocator
    ///
    /// # Arguments
    ///
    /// * `allocator` - The allocator backing the new recording
    fn reset(&mut self, allocator: &mut dyn CommandAllocator) -> Result<()>;

    /// Record a full-buffer copy from `src` to `dst`
    ///
    /// # Arguments
    ///
    /// * `src` - Source buffer (read in its entirety)
    /// * `dst` - Destination buffer, at least as large as `src`
    fn copy_buffer(&mut self, src: &dyn Buffer, dst: &dyn Buffer) -> Result<()>;

    /// Record a state transition of `buffer`
    ///
    /// # Arguments
    ///
    /// * `buffer` - The buffer to transition
    /// * `from` - State the buffer is currently in
    /// * `to` - State the buffer will be in after the barrier
    fn transition_buffer(
        &mut self,
        buffer: &dyn Buffer,
        from: ResourceState,
        to: ResourceState,
    ) -> Result<()>;
}
