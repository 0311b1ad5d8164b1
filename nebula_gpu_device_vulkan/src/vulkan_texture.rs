/// Texture - Vulkan implementation of the Texture trait
///
/// Textures are created fully uploaded: a transient staging buffer, a
/// one-shot command buffer recording the layout transitions and the
/// buffer-to-image copy, and a blocking submit. Callers receive a
/// shader-readable image.

use nebula_gpu::nebula::device::{
    Texture as DeviceTexture, TextureDesc, TextureId, TextureInfo,
};
use nebula_gpu::nebula::{Error, Result};
use nebula_gpu::gpu_err;
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_state::texture_format_to_vk;

/// Vulkan texture implementation
pub struct Texture {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    allocation: Option<Allocation>,
    info: TextureInfo,
    id: TextureId,
}

impl Texture {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        desc: &TextureDesc,
        pixels: &[u8],
        id: TextureId,
    ) -> Result<Self> {
        let expected = desc.width as usize
            * desc.height as usize
            * desc.format.bytes_per_pixel() as usize;
        if pixels.len() != expected {
            return Err(Error::InvalidResource(format!(
                "texture data is {} bytes, expected {} for {}x{} {:?}",
                pixels.len(),
                expected,
                desc.width,
                desc.height,
                desc.format
            )));
        }

        let format = texture_format_to_vk(desc.format);

        unsafe {
            // Create the device-local image
            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D {
                    width: desc.width,
                    height: desc.height,
                    depth: 1,
                })
                .mip_levels(desc.mip_levels)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = ctx
                .device
                .create_image(&image_create_info, None)
                .map_err(|e| gpu_err!("nebula::vulkan", "Failed to create image: {:?}", e))?;

            let requirements = ctx.device.get_image_memory_requirements(image);

            let allocation = ctx
                .allocator
                .lock()
                .unwrap()
                .allocate(&gpu_allocator::vulkan::AllocationCreateDesc {
                    name: "texture",
                    requirements,
                    location: gpu_allocator::MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: gpu_allocator::vulkan::AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| {
                    ctx.device.destroy_image(image, None);
                    Error::OutOfMemory
                })?;

            ctx.device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| gpu_err!("nebula::vulkan", "Failed to bind image memory: {:?}", e))?;

            Self::upload_pixels(&ctx, image, desc, pixels)?;

            // Create the sampled view
            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: desc.mip_levels,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = ctx
                .device
                .create_image_view(&view_create_info, None)
                .map_err(|e| gpu_err!("nebula::vulkan", "Failed to create image view: {:?}", e))?;

            Ok(Self {
                ctx,
                image,
                view,
                allocation: Some(allocation),
                info: TextureInfo {
                    width: desc.width,
                    height: desc.height,
                    format: desc.format,
                    mip_levels: desc.mip_levels,
                },
                id,
            })
        }
    }

    /// One-shot staging upload: transition, copy, transition, submit, wait
    unsafe fn upload_pixels(
        ctx: &Arc<GpuContext>,
        image: vk::Image,
        desc: &TextureDesc,
        pixels: &[u8],
    ) -> Result<()> {
        // Transient command pool for this upload only
        let command_pool_create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(ctx.graphics_queue_family)
            .flags(vk::CommandPoolCreateFlags::TRANSIENT);

        let command_pool = ctx
            .device
            .create_command_pool(&command_pool_create_info, None)
            .map_err(|e| gpu_err!("nebula::vulkan", "Failed to create command pool for texture upload: {:?}", e))?;

        let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffers = ctx
            .device
            .allocate_command_buffers(&command_buffer_allocate_info)
            .map_err(|e| gpu_err!("nebula::vulkan", "Failed to allocate command buffer for texture upload: {:?}", e))?;
        let command_buffer = command_buffers[0];

        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        ctx.device
            .begin_command_buffer(command_buffer, &begin_info)
            .map_err(|e| gpu_err!("nebula::vulkan", "Failed to begin command buffer for texture upload: {:?}", e))?;

        let subresource_range = vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: desc.mip_levels,
            base_array_layer: 0,
            layer_count: 1,
        };

        // UNDEFINED -> TRANSFER_DST_OPTIMAL
        let barrier_to_transfer = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::UNDEFINED)
            .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(subresource_range)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);

        ctx.device.cmd_pipeline_barrier(
            command_buffer,
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier_to_transfer],
        );

        // Staging buffer
        let staging_buffer_create_info = vk::BufferCreateInfo::default()
            .size(pixels.len() as u64)
            .usage(vk::BufferUsageFlags::TRANSFER_SRC)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let staging_buffer = ctx
            .device
            .create_buffer(&staging_buffer_create_info, None)
            .map_err(|e| gpu_err!("nebula::vulkan", "Failed to create staging buffer for texture upload: {:?}", e))?;

        let staging_requirements = ctx.device.get_buffer_memory_requirements(staging_buffer);

        let staging_allocation = ctx
            .allocator
            .lock()
            .unwrap()
            .allocate(&gpu_allocator::vulkan::AllocationCreateDesc {
                name: "texture_staging_buffer",
                requirements: staging_requirements,
                location: gpu_allocator::MemoryLocation::CpuToGpu,
                linear: true,
                allocation_scheme: gpu_allocator::vulkan::AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|_e| Error::OutOfMemory)?;

        ctx.device
            .bind_buffer_memory(
                staging_buffer,
                staging_allocation.memory(),
                staging_allocation.offset(),
            )
            .map_err(|e| gpu_err!("nebula::vulkan", "Failed to bind staging buffer memory: {:?}", e))?;

        let mapped_ptr = staging_allocation
            .mapped_ptr()
            .ok_or_else(|| gpu_err!("nebula::vulkan", "Texture staging buffer is not mapped"))?
            .as_ptr() as *mut u8;
        std::ptr::copy_nonoverlapping(pixels.as_ptr(), mapped_ptr, pixels.len());

        // Copy mip 0
        let region = vk::BufferImageCopy::default()
            .buffer_offset(0)
            .buffer_row_length(0)
            .buffer_image_height(0)
            .image_subresource(vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            })
            .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
            .image_extent(vk::Extent3D {
                width: desc.width,
                height: desc.height,
                depth: 1,
            });

        ctx.device.cmd_copy_buffer_to_image(
            command_buffer,
            staging_buffer,
            image,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            &[region],
        );

        // TRANSFER_DST_OPTIMAL -> SHADER_READ_ONLY_OPTIMAL
        let barrier_to_shader = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(subresource_range)
            .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
            .dst_access_mask(vk::AccessFlags::SHADER_READ);

        ctx.device.cmd_pipeline_barrier(
            command_buffer,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier_to_shader],
        );

        // End recording, submit, and wait
        ctx.device
            .end_command_buffer(command_buffer)
            .map_err(|e| gpu_err!("nebula::vulkan", "Failed to end command buffer for texture upload: {:?}", e))?;

        let command_buffers_submit = [command_buffer];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers_submit);

        ctx.device
            .queue_submit(ctx.graphics_queue, &[submit_info], vk::Fence::null())
            .map_err(|e| gpu_err!("nebula::vulkan", "Failed to submit texture upload commands to GPU: {:?}", e))?;

        ctx.device
            .queue_wait_idle(ctx.graphics_queue)
            .map_err(|e| gpu_err!("nebula::vulkan", "Failed to wait for texture upload completion: {:?}", e))?;

        // Clean up staging buffer and command pool
        ctx.device.destroy_command_pool(command_pool, None);
        ctx.device.destroy_buffer(staging_buffer, None);
        ctx.allocator.lock().unwrap().free(staging_allocation).ok();

        Ok(())
    }
}

impl DeviceTexture for Texture {
    fn id(&self) -> TextureId {
        self.id
    }

    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);

            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            self.ctx.device.destroy_image(self.image, None);
        }
    }
}
