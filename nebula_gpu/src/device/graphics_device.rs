/// GraphicsDevice trait - main device factory interface

use std::sync::Arc;

use crate::device::{
    Buffer, BufferDesc, CommandAllocator, CommandList, CommandQueue, DescriptorHeap,
    DescriptorHeapDesc, Fence, Texture, TextureDesc,
};
use crate::error::Result;

/// Main device trait
///
/// This is the central factory interface for GPU resources and the only
/// seam between the resource layer and a concrete graphics API. Implemented
/// by backend device types (e.g., VulkanDevice, MockDevice).
///
/// The hosting application owns the device; the resource layer borrows it
/// (via `Arc`) for the process lifetime.
pub trait GraphicsDevice: Send + Sync {
    /// Create a fence
    ///
    /// # Arguments
    ///
    /// * `initial_value` - The completed value the fence starts at
    fn create_fence(&self, initial_value: u64) -> Result<Arc<dyn Fence>>;

    /// Create a command allocator
    fn create_command_allocator(&self) -> Result<Box<dyn CommandAllocator>>;

    /// Create a command list recording out of `allocator`
    ///
    /// The list is returned in the recording state.
    fn create_command_list(
        &self,
        allocator: &mut dyn CommandAllocator,
    ) -> Result<Box<dyn CommandList>>;

    /// Create a buffer
    ///
    /// # Arguments
    ///
    /// * `desc` - Buffer descriptor
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Create a texture, fully uploaded from `pixels`
    ///
    /// The backend performs its own staging upload and blocks until the
    /// texture is shader-readable.
    ///
    /// # Arguments
    ///
    /// * `desc` - Texture descriptor
    /// * `pixels` - Tightly packed pixel data for mip 0
    fn create_texture(&self, desc: &TextureDesc, pixels: &[u8]) -> Result<Arc<dyn Texture>>;

    /// Create a descriptor heap
    ///
    /// # Arguments
    ///
    /// * `desc` - Heap descriptor (capacity, visibility)
    fn create_descriptor_heap(&self, desc: &DescriptorHeapDesc) -> Result<Arc<dyn DescriptorHeap>>;

    /// Copy `count` descriptors between heaps
    ///
    /// Both ranges must lie within their heap's capacity.
    ///
    /// # Arguments
    ///
    /// * `dst` - Destination heap
    /// * `dst_index` - First destination slot
    /// * `src` - Source heap (typically non-shader-visible)
    /// * `src_index` - First source slot
    /// * `count` - Number of descriptors to copy
    fn copy_descriptors(
        &self,
        dst: &dyn DescriptorHeap,
        dst_index: u32,
        src: &dyn DescriptorHeap,
        src_index: u32,
        count: u32,
    ) -> Result<()>;

    /// The device's graphics/execution queue
    fn graphics_queue(&self) -> Arc<dyn CommandQueue>;
}
