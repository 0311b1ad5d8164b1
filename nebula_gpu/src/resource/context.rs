/// ResourceContext - GPU resource residency and synchronization
///
/// The context is the only object that touches device memory, fences and
/// descriptor heaps directly. It owns the fence-based CPU/GPU sync, the
/// synchronous submission cycle, the one-shot static upload protocol, the
/// constant upload ring with its paired descriptor creation, and the shared
/// shader-visible descriptor table.
///
/// One context is constructed explicitly at startup with the device, the
/// shared command recorder, the execution queue and the recorder's
/// allocator, and is driven by a single thread (`&mut self` throughout).
/// Teardown waits for the GPU before releasing anything.

use std::sync::Arc;

use slotmap::SlotMap;

use crate::device::{
    Buffer, BufferDesc, BufferUsage, CommandAllocator, CommandList, CommandQueue, CpuDescriptor,
    DescriptorHeap, DescriptorHeapDesc, Fence, GpuDescriptor, GraphicsDevice, HeapKind,
    ResourceState, Texture, TextureDesc,
};
use crate::error::{Error, Result};
use crate::resource::descriptor_table::DescriptorTable;
use crate::resource::upload_ring::{UploadRing, CONSTANT_ALIGNMENT};
use crate::{gpu_debug, gpu_info, gpu_trace, gpu_warn};

slotmap::new_key_type! {
    /// Key into the context's texture registry
    pub struct TextureKey;
}

/// Configuration of a resource context
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Capacity of the constant ring and the shared descriptor table, in
    /// 256-byte constant slots. Larger constants are possible, they only
    /// reduce how many fills fit before the ring wraps.
    pub max_constant_buffers: u32,
    /// Capacity of the CPU-only staging heap texture views are created in
    pub max_texture_descriptors: u32,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_constant_buffers: 1000,
            max_texture_descriptors: 256,
        }
    }
}

/// Counters of the work a context has performed
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceStats {
    /// Static buffers created through the upload protocol
    pub static_buffers_created: u64,
    /// Textures held in the registry
    pub textures_registered: u64,
    /// Constant ring fills
    pub constant_fills: u64,
    /// Descriptors copied into the shared table
    pub descriptors_copied: u64,
    /// Submission cycles (close/execute/wait/reset)
    pub submissions: u64,
}

/// GPU resource residency and synchronization context
pub struct ResourceContext {
    device: Arc<dyn GraphicsDevice>,
    queue: Arc<dyn CommandQueue>,
    command_list: Box<dyn CommandList>,
    command_allocator: Box<dyn CommandAllocator>,

    fence: Arc<dyn Fence>,
    fence_target: u64,

    ring_buffer: Arc<dyn Buffer>,
    ring: UploadRing,

    shared_heap: Arc<dyn DescriptorHeap>,
    table: DescriptorTable,

    staging_heap: Arc<dyn DescriptorHeap>,
    staging_cursor: u32,
    textures: SlotMap<TextureKey, Arc<dyn Texture>>,

    stats: ResourceStats,
}

impl ResourceContext {
    /// Create the context
    ///
    /// Must be called exactly once, before any other operation; the device,
    /// recorder, queue and allocator live for the process and are shared
    /// with the hosting application.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device, borrowed for the process lifetime
    /// * `command_list` - The shared command recorder, in the recording state
    /// * `queue` - The device's execution queue
    /// * `command_allocator` - The allocator backing `command_list`
    /// * `config` - Ring and heap capacities, fixed for the context lifetime
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        command_list: Box<dyn CommandList>,
        queue: Arc<dyn CommandQueue>,
        command_allocator: Box<dyn CommandAllocator>,
        config: ContextConfig,
    ) -> Result<Self> {
        if config.max_constant_buffers == 0 || config.max_texture_descriptors == 0 {
            return Err(Error::InitializationFailed(
                "context capacities must be non-zero".to_string(),
            ));
        }

        let fence = device.create_fence(0)?;

        // One upload buffer holds all transient constant data for the
        // process; memory is reused by wrapping the ring cursor.
        let ring_capacity = config.max_constant_buffers as u64 * CONSTANT_ALIGNMENT;
        let ring_buffer = device.create_buffer(&BufferDesc {
            size: ring_capacity,
            heap: HeapKind::Upload,
            usage: BufferUsage::CONSTANT,
            initial_state: ResourceState::GenericRead,
        })?;
        let ring = UploadRing::new(ring_capacity)?;

        // One shader-visible heap holds every descriptor bound for draws;
        // constant views and texture views live in separate regions of it.
        let shared_heap = device.create_descriptor_heap(&DescriptorHeapDesc {
            capacity: config.max_constant_buffers,
            shader_visible: true,
        })?;
        let table = DescriptorTable::new(config.max_constant_buffers)?;

        let staging_heap = device.create_descriptor_heap(&DescriptorHeapDesc {
            capacity: config.max_texture_descriptors,
            shader_visible: false,
        })?;

        gpu_info!(
            "nebula::ResourceContext",
            "initialized: {} constant slots ({} KiB ring), {} texture descriptors",
            config.max_constant_buffers,
            ring_capacity / 1024,
            config.max_texture_descriptors
        );

        Ok(Self {
            device,
            queue,
            command_list,
            command_allocator,
            fence,
            fence_target: 0,
            ring_buffer,
            ring,
            shared_heap,
            table,
            staging_heap,
            staging_cursor: 0,
            textures: SlotMap::with_key(),
            stats: ResourceStats::default(),
        })
    }

    // ========================================================================
    // Synchronization
    // ========================================================================

    /// Signal the next fence value on the queue and block until the device
    /// reaches it
    ///
    /// The block is skipped when the fence is already satisfied. A failed
    /// signal or wait means device loss; there is no retry path.
    pub fn signal_and_wait(&mut self) -> Result<()> {
        self.fence_target += 1;
        self.queue.signal(self.fence.as_ref(), self.fence_target)?;

        if self.fence.completed_value() < self.fence_target {
            self.fence.wait(self.fence_target)?;
        }
        Ok(())
    }

    /// Close the recorder, execute it, wait for completion, and reopen it
    ///
    /// On return the recorder is empty and recording, and every previously
    /// recorded command has finished on the GPU. Each call is a full CPU/GPU
    /// barrier: callers are implicitly synchronous, which is what makes ring
    /// and allocator reuse safe without per-slot tracking.
    pub fn close_execute_and_reset(&mut self) -> Result<()> {
        self.command_list.close()?;
        self.queue.execute(self.command_list.as_mut())?;

        // The allocator must never be reset while the GPU is still working
        // through a list recorded from it.
        self.signal_and_wait()?;
        self.command_allocator.reset()?;
        self.command_list.reset(self.command_allocator.as_mut())?;

        self.stats.submissions += 1;
        gpu_trace!(
            "nebula::ResourceContext",
            "submission {} complete (fence {})",
            self.stats.submissions,
            self.fence_target
        );
        Ok(())
    }

    // ========================================================================
    // Static uploads
    // ========================================================================

    /// Create an immutable device-local buffer populated from `data`
    ///
    /// The upload goes through a transient staging buffer and a recorded
    /// copy, then the destination is transitioned for shader reads and the
    /// whole recorder is submitted synchronously. When this returns, the
    /// buffer is fully populated and shader-readable; callers never race the
    /// upload. This stalls the GPU, which is acceptable at load time and
    /// wrong per frame (use the constant ring for per-draw data).
    ///
    /// # Arguments
    ///
    /// * `stride` - Size of one element in bytes
    /// * `count` - Number of elements
    /// * `data` - Exactly `stride * count` bytes of source data
    pub fn create_static_buffer(
        &mut self,
        stride: u32,
        count: u32,
        data: &[u8],
    ) -> Result<Arc<dyn Buffer>> {
        if stride == 0 || count == 0 {
            return Err(Error::InvalidResource(
                "static buffer stride and count must be non-zero".to_string(),
            ));
        }
        let size = stride as u64 * count as u64;
        if data.len() as u64 != size {
            return Err(Error::InvalidResource(format!(
                "static buffer data is {} bytes, expected {} ({} x {})",
                data.len(),
                size,
                stride,
                count
            )));
        }

        let buffer = self.device.create_buffer(&BufferDesc {
            size,
            heap: HeapKind::Default,
            usage: BufferUsage::VERTEX | BufferUsage::INDEX | BufferUsage::COPY_DST,
            initial_state: ResourceState::CopyDest,
        })?;

        // Transient staging buffer, released once the submission below has
        // completed.
        let staging = self.device.create_buffer(&BufferDesc {
            size,
            heap: HeapKind::Upload,
            usage: BufferUsage::COPY_SRC,
            initial_state: ResourceState::GenericRead,
        })?;
        staging.write(0, data)?;

        self.command_list
            .copy_buffer(staging.as_ref(), buffer.as_ref())?;
        self.command_list.transition_buffer(
            buffer.as_ref(),
            ResourceState::CopyDest,
            ResourceState::GenericRead,
        )?;

        self.close_execute_and_reset()?;

        self.stats.static_buffers_created += 1;
        gpu_debug!(
            "nebula::ResourceContext",
            "static buffer uploaded: {} x {} bytes",
            count,
            stride
        );
        Ok(buffer)
    }

    // ========================================================================
    // Constant ring
    // ========================================================================

    /// Copy `data` into the next ring slot and return a bindable handle
    ///
    /// Claims the next 256-byte-aligned span of the upload ring, creates a
    /// constant view over it at the table's next constant slot, and returns
    /// that slot's GPU handle. Never blocks and never waits on the fence:
    /// the caller's submission cadence keeps the ring from being overwritten
    /// while the GPU still reads an older slot.
    ///
    /// # Arguments
    ///
    /// * `data` - Constant payload; non-empty, at most the ring capacity
    pub fn fill_next_constant_buffer(&mut self, data: &[u8]) -> Result<GpuDescriptor> {
        let span = self.ring.reserve(data.len() as u64)?;
        self.ring_buffer.write(span.offset, data)?;

        let slot = self.table.next_constant_slot();
        self.shared_heap.create_constant_view(
            slot,
            self.ring_buffer.as_ref(),
            span.offset,
            span.reserved,
        )?;

        self.stats.constant_fills += 1;
        self.shared_heap.gpu_descriptor(slot)
    }

    /// Typed convenience over `fill_next_constant_buffer`
    pub fn fill_next_constant<T: bytemuck::Pod>(&mut self, value: &T) -> Result<GpuDescriptor> {
        self.fill_next_constant_buffer(bytemuck::bytes_of(value))
    }

    // ========================================================================
    // Shared descriptor table
    // ========================================================================

    /// Copy staged CPU-only descriptors into the shared table
    ///
    /// Copies `count` descriptors starting at `first` into the table's
    /// texture-view region and returns the GPU handle of the first copied
    /// slot. Consecutive calls produce contiguous ranges, which is what
    /// material descriptor ranges rely on.
    ///
    /// # Arguments
    ///
    /// * `first` - First staged descriptor; must come from this context's
    ///   staging heap
    /// * `count` - Number of descriptors to copy
    pub fn copy_descriptors_into_shared_heap(
        &mut self,
        first: CpuDescriptor,
        count: u32,
    ) -> Result<GpuDescriptor> {
        if first.heap != self.staging_heap.id() {
            return Err(Error::InvalidResource(format!(
                "descriptor handle from heap {:?} is not from this context's staging heap {:?}",
                first.heap,
                self.staging_heap.id()
            )));
        }

        let start = self.table.next_texture_range(count);
        self.device.copy_descriptors(
            self.shared_heap.as_ref(),
            start,
            self.staging_heap.as_ref(),
            first.index,
            count,
        )?;

        self.stats.descriptors_copied += count as u64;
        self.shared_heap.gpu_descriptor(start)
    }

    /// The shared shader-visible heap, for binding before draws
    pub fn descriptor_table_heap(&self) -> &Arc<dyn DescriptorHeap> {
        &self.shared_heap
    }

    // ========================================================================
    // Textures
    // ========================================================================

    /// Create a texture from decoded pixels and stage its view
    ///
    /// The device uploads the pixels synchronously; the resulting texture is
    /// stored in the context's registry for the process lifetime and its
    /// view is created in the CPU-only staging heap. The returned handle is
    /// the input `copy_descriptors_into_shared_heap` expects.
    ///
    /// # Arguments
    ///
    /// * `desc` - Texture dimensions and format
    /// * `pixels` - Tightly packed pixel data for mip 0
    pub fn create_texture(
        &mut self,
        desc: &TextureDesc,
        pixels: &[u8],
    ) -> Result<CpuDescriptor> {
        let texture = self.device.create_texture(desc, pixels)?;
        self.register_texture(texture)
    }

    /// Take ownership of an externally created texture and stage its view
    pub fn register_texture(&mut self, texture: Arc<dyn Texture>) -> Result<CpuDescriptor> {
        if self.staging_cursor >= self.staging_heap.capacity() {
            return Err(Error::InvalidResource(format!(
                "texture staging heap exhausted ({} descriptors)",
                self.staging_heap.capacity()
            )));
        }

        let index = self.staging_cursor;
        self.staging_heap
            .create_texture_view(index, texture.as_ref())?;
        self.staging_cursor += 1;

        self.textures.insert(texture);
        self.stats.textures_registered += 1;

        self.staging_heap.cpu_descriptor(index)
    }

    /// Number of textures held in the registry
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The device this context was created against
    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    /// Work counters
    pub fn stats(&self) -> ResourceStats {
        self.stats
    }

    /// Last fence value signaled on the queue
    pub fn fence_target(&self) -> u64 {
        self.fence_target
    }
}

impl Drop for ResourceContext {
    // Let the device finish before the ring, heaps and textures go away.
    fn drop(&mut self) {
        if self.signal_and_wait().is_err() {
            gpu_warn!(
                "nebula::ResourceContext",
                "teardown wait failed; device may still be using resources"
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
