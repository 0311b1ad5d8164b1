/// Buffer - Vulkan implementation of the Buffer trait

use nebula_gpu::nebula::device::{
    Buffer as DeviceBuffer, BufferId, HeapKind, ResourceState,
};
use nebula_gpu::nebula::{Error, Result};
use nebula_gpu::gpu_error;
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::sync::{Arc, Mutex};

use crate::vulkan_context::GpuContext;

/// Vulkan buffer implementation
pub struct Buffer {
    /// Shared GPU context (device, allocator, queue)
    ctx: Arc<GpuContext>,
    /// Vulkan buffer
    pub(crate) buffer: vk::Buffer,
    /// GPU memory allocation
    pub(crate) allocation: Option<Allocation>,
    /// Buffer size
    size: u64,
    /// Heap the buffer was placed in
    heap: HeapKind,
    /// Identity within the device
    id: BufferId,
    /// Last state declared through a recorded transition
    state: Mutex<ResourceState>,
}

impl Buffer {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        buffer: vk::Buffer,
        allocation: Allocation,
        size: u64,
        heap: HeapKind,
        id: BufferId,
        initial_state: ResourceState,
    ) -> Self {
        Self {
            ctx,
            buffer,
            allocation: Some(allocation),
            size,
            heap,
            id,
            state: Mutex::new(initial_state),
        }
    }

    pub(crate) fn set_state(&self, state: ResourceState) {
        *self.state.lock().unwrap() = state;
    }
}

impl DeviceBuffer for Buffer {
    fn id(&self) -> BufferId {
        self.id
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn heap(&self) -> HeapKind {
        self.heap
    }

    fn state(&self) -> ResourceState {
        *self.state.lock().unwrap()
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        if offset + data.len() as u64 > self.size {
            return Err(Error::InvalidResource(format!(
                "write of {} bytes at offset {} exceeds buffer size {}",
                data.len(),
                offset,
                self.size
            )));
        }
        unsafe {
            if let Some(allocation) = &self.allocation {
                // gpu-allocator keeps CpuToGpu memory persistently mapped
                let mapped_ptr = allocation
                    .mapped_ptr()
                    .ok_or_else(|| Error::InvalidResource("buffer is not CPU-accessible".to_string()))?
                    .as_ptr() as *mut u8;

                std::ptr::copy_nonoverlapping(
                    data.as_ptr(),
                    mapped_ptr.offset(offset as isize),
                    data.len(),
                );

                Ok(())
            } else {
                gpu_error!("nebula::vulkan", "Buffer write failed: no GPU allocation");
                Err(Error::BackendError("buffer has no allocation".to_string()))
            }
        }
    }

    fn read(&self, offset: u64, out: &mut [u8]) -> Result<()> {
        if offset + out.len() as u64 > self.size {
            return Err(Error::InvalidResource(format!(
                "read of {} bytes at offset {} exceeds buffer size {}",
                out.len(),
                offset,
                self.size
            )));
        }
        unsafe {
            if let Some(allocation) = &self.allocation {
                let mapped_ptr = allocation
                    .mapped_ptr()
                    .ok_or_else(|| Error::InvalidResource("buffer is not CPU-accessible".to_string()))?
                    .as_ptr() as *const u8;

                std::ptr::copy_nonoverlapping(
                    mapped_ptr.offset(offset as isize),
                    out.as_mut_ptr(),
                    out.len(),
                );

                Ok(())
            } else {
                gpu_error!("nebula::vulkan", "Buffer read failed: no GPU allocation");
                Err(Error::BackendError("buffer has no allocation".to_string()))
            }
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            // Free GPU memory
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - we still need to destroy the buffer
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            // Destroy buffer
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
