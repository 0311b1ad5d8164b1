/// DescriptorHeap trait - fixed-capacity table of resource-view descriptors

use crate::device::{Buffer, CpuDescriptor, DescriptorHeapId, GpuDescriptor, Texture};
use crate::error::Result;

/// Descriptor heap abstraction
///
/// A heap is a fixed-length array of descriptor slots. Shader-visible heaps
/// can be bound for GPU access; non-shader-visible heaps only stage
/// descriptors for later copies into a shader-visible heap. Capacity is
/// fixed at creation, heaps never grow.
pub trait DescriptorHeap: Send + Sync {
    /// Unique identity of this heap within its device
    fn id(&self) -> DescriptorHeapId;

    /// Number of descriptor slots
    fn capacity(&self) -> u32;

    /// Whether shader stages can bind this heap
    fn shader_visible(&self) -> bool;

    /// Handle to slot `index` for CPU-side descriptor creation and copies
    fn cpu_descriptor(&self, index: u32) -> Result<CpuDescriptor>;

    /// Handle to slot `index` for shader binding
    ///
    /// Fails on non-shader-visible heaps.
    fn gpu_descriptor(&self, index: u32) -> Result<GpuDescriptor>;

    /// Create a constant-buffer view in slot `index`
    ///
    /// # Arguments
    ///
    /// * `index` - Destination slot
    /// * `buffer` - Buffer the view points into
    /// * `offset` - Byte offset of the viewed span
    /// * `size_in_bytes` - Size of the viewed span (256-byte multiple)
    fn create_constant_view(
        &self,
        index: u32,
        buffer: &dyn Buffer,
        offset: u64,
        size_in_bytes: u64,
    ) -> Result<()>;

    /// Create a shader-resource view of `texture` in slot `index`
    fn create_texture_view(&self, index: u32, texture: &dyn Texture) -> Result<()>;
}
