/// CommandQueue - Vulkan implementation of the CommandQueue trait

use nebula_gpu::nebula::device::{
    CommandList as DeviceCommandList, CommandQueue as DeviceCommandQueue, Fence as DeviceFence,
};
use nebula_gpu::nebula::{Error, Result};
use nebula_gpu::gpu_err;
use ash::vk;
use std::sync::Arc;

use crate::vulkan_command_list::CommandList;
use crate::vulkan_context::GpuContext;
use crate::vulkan_fence::Fence;

/// Vulkan graphics queue
pub struct Queue {
    ctx: Arc<GpuContext>,
}

impl Queue {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Self {
        Self { ctx }
    }
}

impl DeviceCommandQueue for Queue {
    fn execute(&self, list: &mut dyn DeviceCommandList) -> Result<()> {
        if list.is_recording() {
            return Err(Error::InvalidResource(
                "command list must be closed before execution".to_string(),
            ));
        }

        // Lists handed to this queue were created by this device
        let list = unsafe { &*(list as *const dyn DeviceCommandList as *const CommandList) };

        unsafe {
            let command_buffers = [list.command_buffer()];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

            self.ctx
                .device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], vk::Fence::null())
                .map_err(|e| gpu_err!("nebula::vulkan", "Failed to submit commands to GPU queue: {:?}", e))?;
        }
        Ok(())
    }

    fn signal(&self, fence: &dyn DeviceFence, value: u64) -> Result<()> {
        // Fences handed to this queue were created by this device
        let fence = unsafe { &*(fence as *const dyn DeviceFence as *const Fence) };

        unsafe {
            let signal_values = [value];
            let mut timeline_info = vk::TimelineSemaphoreSubmitInfo::default()
                .signal_semaphore_values(&signal_values);

            let signal_semaphores = [fence.semaphore];
            let submit_info = vk::SubmitInfo::default()
                .signal_semaphores(&signal_semaphores)
                .push_next(&mut timeline_info);

            self.ctx
                .device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], vk::Fence::null())
                .map_err(|e| gpu_err!("nebula::vulkan", "Failed to signal fence value {} on queue: {:?}", value, e))?;
        }
        Ok(())
    }
}
