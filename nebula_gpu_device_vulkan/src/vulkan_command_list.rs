/// CommandList / CommandAllocator - Vulkan implementations
///
/// The allocator owns a command pool; the list owns one primary command
/// buffer allocated out of it, created in the recording state.

use nebula_gpu::nebula::device::{
    Buffer as DeviceBuffer, CommandAllocator as DeviceCommandAllocator,
    CommandList as DeviceCommandList, ResourceState,
};
use nebula_gpu::nebula::{Error, Result};
use nebula_gpu::gpu_err;
use ash::vk;
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_state::{state_access_flags, state_stage_flags};

/// Vulkan command allocator (command pool)
pub struct CommandAllocator {
    ctx: Arc<GpuContext>,
    pub(crate) command_pool: vk::CommandPool,
}

impl CommandAllocator {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        unsafe {
            let command_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = ctx
                .device
                .create_command_pool(&command_pool_create_info, None)
                .map_err(|e| gpu_err!("nebula::vulkan", "Failed to create command pool: {:?}", e))?;

            Ok(Self { ctx, command_pool })
        }
    }
}

impl DeviceCommandAllocator for CommandAllocator {
    fn reset(&mut self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .reset_command_pool(self.command_pool, vk::CommandPoolResetFlags::empty())
                .map_err(|e| gpu_err!("nebula::vulkan", "Failed to reset command pool: {:?}", e))?;
        }
        Ok(())
    }
}

impl Drop for CommandAllocator {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}

/// Vulkan command list implementation
pub struct CommandList {
    ctx: Arc<GpuContext>,
    command_buffer: vk::CommandBuffer,
    is_recording: bool,
}

impl CommandList {
    /// Allocate a command buffer out of `allocator` and begin recording
    pub(crate) fn new(ctx: Arc<GpuContext>, allocator: &CommandAllocator) -> Result<Self> {
        unsafe {
            let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(allocator.command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffers = ctx
                .device
                .allocate_command_buffers(&command_buffer_allocate_info)
                .map_err(|e| gpu_err!("nebula::vulkan", "Failed to allocate command buffer: {:?}", e))?;
            let command_buffer = command_buffers[0];

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            ctx.device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| gpu_err!("nebula::vulkan", "Failed to begin command buffer: {:?}", e))?;

            Ok(Self {
                ctx,
                command_buffer,
                is_recording: true,
            })
        }
    }

    /// Get the underlying Vulkan command buffer
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }
}

impl DeviceCommandList for CommandList {
    fn is_recording(&self) -> bool {
        self.is_recording
    }

    fn close(&mut self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("command list already closed".to_string()));
        }
        unsafe {
            self.ctx
                .device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| gpu_err!("nebula::vulkan", "Failed to end command buffer: {:?}", e))?;
        }
        self.is_recording = false;
        Ok(())
    }

    fn reset(&mut self, _allocator: &mut dyn DeviceCommandAllocator) -> Result<()> {
        if self.is_recording {
            return Err(Error::BackendError(
                "command list is still recording".to_string(),
            ));
        }
        unsafe {
            self.ctx
                .device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| gpu_err!("nebula::vulkan", "Failed to reset command buffer: {:?}", e))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.ctx
                .device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| gpu_err!("nebula::vulkan", "Failed to begin command buffer: {:?}", e))?;
        }
        self.is_recording = true;
        Ok(())
    }

    fn copy_buffer(&mut self, src: &dyn DeviceBuffer, dst: &dyn DeviceBuffer) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("command list not recording".to_string()));
        }
        if src.size() != dst.size() {
            return Err(Error::InvalidResource(format!(
                "full-buffer copy requires equal sizes (src {} bytes, dst {} bytes)",
                src.size(),
                dst.size()
            )));
        }

        // Buffers recorded here were created by this device
        let src = unsafe { &*(src as *const dyn DeviceBuffer as *const Buffer) };
        let dst = unsafe { &*(dst as *const dyn DeviceBuffer as *const Buffer) };

        unsafe {
            let region = vk::BufferCopy::default()
                .src_offset(0)
                .dst_offset(0)
                .size(src.size());

            self.ctx
                .device
                .cmd_copy_buffer(self.command_buffer, src.buffer, dst.buffer, &[region]);
        }
        Ok(())
    }

    fn transition_buffer(
        &mut self,
        buffer: &dyn DeviceBuffer,
        from: ResourceState,
        to: ResourceState,
    ) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("command list not recording".to_string()));
        }

        let vk_buffer = unsafe { &*(buffer as *const dyn DeviceBuffer as *const Buffer) };

        unsafe {
            let barrier = vk::BufferMemoryBarrier::default()
                .src_access_mask(state_access_flags(from))
                .dst_access_mask(state_access_flags(to))
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .buffer(vk_buffer.buffer)
                .offset(0)
                .size(vk::WHOLE_SIZE);

            self.ctx.device.cmd_pipeline_barrier(
                self.command_buffer,
                state_stage_flags(from),
                state_stage_flags(to),
                vk::DependencyFlags::empty(),
                &[],
                &[barrier],
                &[],
            );
        }

        vk_buffer.set_state(to);
        Ok(())
    }
}

impl Drop for CommandList {
    fn drop(&mut self) {
        // The command buffer is returned to its pool when the pool is
        // destroyed; nothing to destroy individually.
    }
}
