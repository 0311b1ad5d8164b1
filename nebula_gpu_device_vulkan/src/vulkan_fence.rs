/// Fence - timeline-semaphore implementation of the Fence trait
///
/// A Vulkan timeline semaphore is the direct analog of a monotonic fence
/// counter: the queue signals increasing 64-bit values and the CPU can
/// query the completed value or block until a target is reached.

use nebula_gpu::nebula::device::Fence as DeviceFence;
use nebula_gpu::nebula::Result;
use nebula_gpu::gpu_err;
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan timeline-semaphore fence
pub struct Fence {
    ctx: Arc<GpuContext>,
    pub(crate) semaphore: vk::Semaphore,
}

impl Fence {
    pub(crate) fn new(ctx: Arc<GpuContext>, initial_value: u64) -> Result<Self> {
        unsafe {
            let mut type_info = vk::SemaphoreTypeCreateInfo::default()
                .semaphore_type(vk::SemaphoreType::TIMELINE)
                .initial_value(initial_value);

            let create_info = vk::SemaphoreCreateInfo::default().push_next(&mut type_info);

            let semaphore = ctx
                .device
                .create_semaphore(&create_info, None)
                .map_err(|e| gpu_err!("nebula::vulkan", "Failed to create timeline semaphore: {:?}", e))?;

            Ok(Self { ctx, semaphore })
        }
    }
}

impl DeviceFence for Fence {
    fn completed_value(&self) -> u64 {
        unsafe {
            self.ctx
                .device
                .get_semaphore_counter_value(self.semaphore)
                .unwrap_or(0)
        }
    }

    fn wait(&self, value: u64) -> Result<()> {
        unsafe {
            let semaphores = [self.semaphore];
            let values = [value];
            let wait_info = vk::SemaphoreWaitInfo::default()
                .semaphores(&semaphores)
                .values(&values);

            // Unbounded wait: a hung device is indistinguishable from a slow one
            self.ctx
                .device
                .wait_semaphores(&wait_info, u64::MAX)
                .map_err(|e| gpu_err!("nebula::vulkan", "Failed to wait for fence value {}: {:?}", value, e))?;
            Ok(())
        }
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_semaphore(self.semaphore, None);
        }
    }
}
