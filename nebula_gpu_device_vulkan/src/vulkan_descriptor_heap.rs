/// DescriptorHeap - Vulkan implementation of the DescriptorHeap trait
///
/// A heap is one descriptor set with two partially-bound array bindings:
/// binding 0 holds uniform-buffer views (the constant region), binding 1
/// holds sampled-image views (the texture region). Slot `i` of the heap is
/// array element `i` of either binding. Vulkan descriptor sets have no
/// shader-visibility split; the flag only controls whether GPU handles may
/// be minted, matching the CPU-staging-heap contract.
///
/// Descriptor writes and copies happen only while no submission is in
/// flight (the resource layer is fully synchronous), so no update-after-bind
/// semantics are needed.

use nebula_gpu::nebula::device::{
    Buffer as DeviceBuffer, CpuDescriptor, DescriptorHeap as DeviceDescriptorHeap,
    DescriptorHeapId, GpuDescriptor, Texture as DeviceTexture,
};
use nebula_gpu::nebula::{Error, Result};
use nebula_gpu::gpu_err;
use ash::vk;
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_texture::Texture;

const CONSTANT_BINDING: u32 = 0;
const TEXTURE_BINDING: u32 = 1;

/// Vulkan descriptor heap implementation
pub struct DescriptorHeap {
    ctx: Arc<GpuContext>,
    pool: vk::DescriptorPool,
    layout: vk::DescriptorSetLayout,
    pub(crate) set: vk::DescriptorSet,
    id: DescriptorHeapId,
    capacity: u32,
    shader_visible: bool,
}

impl DescriptorHeap {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        id: DescriptorHeapId,
        capacity: u32,
        shader_visible: bool,
    ) -> Result<Self> {
        unsafe {
            let bindings = [
                vk::DescriptorSetLayoutBinding::default()
                    .binding(CONSTANT_BINDING)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .descriptor_count(capacity)
                    .stage_flags(vk::ShaderStageFlags::ALL),
                vk::DescriptorSetLayoutBinding::default()
                    .binding(TEXTURE_BINDING)
                    .descriptor_type(vk::DescriptorType::SAMPLED_IMAGE)
                    .descriptor_count(capacity)
                    .stage_flags(vk::ShaderStageFlags::ALL),
            ];

            // Most slots are empty when the set is bound
            let binding_flags = [
                vk::DescriptorBindingFlags::PARTIALLY_BOUND,
                vk::DescriptorBindingFlags::PARTIALLY_BOUND,
            ];
            let mut binding_flags_info = vk::DescriptorSetLayoutBindingFlagsCreateInfo::default()
                .binding_flags(&binding_flags);

            let layout_info = vk::DescriptorSetLayoutCreateInfo::default()
                .bindings(&bindings)
                .push_next(&mut binding_flags_info);

            let layout = ctx
                .device
                .create_descriptor_set_layout(&layout_info, None)
                .map_err(|e| gpu_err!("nebula::vulkan", "Failed to create descriptor set layout: {:?}", e))?;

            let pool_sizes = [
                vk::DescriptorPoolSize {
                    ty: vk::DescriptorType::UNIFORM_BUFFER,
                    descriptor_count: capacity,
                },
                vk::DescriptorPoolSize {
                    ty: vk::DescriptorType::SAMPLED_IMAGE,
                    descriptor_count: capacity,
                },
            ];
            let pool_info = vk::DescriptorPoolCreateInfo::default()
                .pool_sizes(&pool_sizes)
                .max_sets(1);

            let pool = ctx
                .device
                .create_descriptor_pool(&pool_info, None)
                .map_err(|e| {
                    ctx.device.destroy_descriptor_set_layout(layout, None);
                    gpu_err!("nebula::vulkan", "Failed to create descriptor pool: {:?}", e)
                })?;

            let layouts = [layout];
            let allocate_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(pool)
                .set_layouts(&layouts);

            let sets = ctx
                .device
                .allocate_descriptor_sets(&allocate_info)
                .map_err(|e| {
                    ctx.device.destroy_descriptor_pool(pool, None);
                    ctx.device.destroy_descriptor_set_layout(layout, None);
                    gpu_err!("nebula::vulkan", "Failed to allocate descriptor set: {:?}", e)
                })?;

            Ok(Self {
                ctx,
                pool,
                layout,
                set: sets[0],
                id,
                capacity,
                shader_visible,
            })
        }
    }

    /// The underlying descriptor set, for binding by the application
    pub fn descriptor_set(&self) -> vk::DescriptorSet {
        self.set
    }

    fn check_index(&self, index: u32) -> Result<()> {
        if index >= self.capacity {
            return Err(Error::InvalidResource(format!(
                "descriptor index {} out of range (capacity {})",
                index, self.capacity
            )));
        }
        Ok(())
    }
}

impl DeviceDescriptorHeap for DescriptorHeap {
    fn id(&self) -> DescriptorHeapId {
        self.id
    }

    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn shader_visible(&self) -> bool {
        self.shader_visible
    }

    fn cpu_descriptor(&self, index: u32) -> Result<CpuDescriptor> {
        self.check_index(index)?;
        Ok(CpuDescriptor {
            heap: self.id,
            index,
        })
    }

    fn gpu_descriptor(&self, index: u32) -> Result<GpuDescriptor> {
        if !self.shader_visible {
            return Err(Error::InvalidResource(
                "heap is not shader-visible".to_string(),
            ));
        }
        self.check_index(index)?;
        Ok(GpuDescriptor {
            heap: self.id,
            index,
        })
    }

    fn create_constant_view(
        &self,
        index: u32,
        buffer: &dyn DeviceBuffer,
        offset: u64,
        size_in_bytes: u64,
    ) -> Result<()> {
        self.check_index(index)?;
        if size_in_bytes == 0 || size_in_bytes % 256 != 0 {
            return Err(Error::InvalidResource(format!(
                "constant view size {} is not a non-zero multiple of 256",
                size_in_bytes
            )));
        }
        if offset + size_in_bytes > buffer.size() {
            return Err(Error::InvalidResource(format!(
                "constant view [{}, {}) exceeds buffer size {}",
                offset,
                offset + size_in_bytes,
                buffer.size()
            )));
        }

        let vk_buffer = unsafe { &*(buffer as *const dyn DeviceBuffer as *const Buffer) };

        unsafe {
            let buffer_info = [vk::DescriptorBufferInfo::default()
                .buffer(vk_buffer.buffer)
                .offset(offset)
                .range(size_in_bytes)];

            let write = vk::WriteDescriptorSet::default()
                .dst_set(self.set)
                .dst_binding(CONSTANT_BINDING)
                .dst_array_element(index)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&buffer_info);

            self.ctx.device.update_descriptor_sets(&[write], &[]);
        }
        Ok(())
    }

    fn create_texture_view(&self, index: u32, texture: &dyn DeviceTexture) -> Result<()> {
        self.check_index(index)?;

        let vk_texture = unsafe { &*(texture as *const dyn DeviceTexture as *const Texture) };

        unsafe {
            let image_info = [vk::DescriptorImageInfo::default()
                .image_view(vk_texture.view)
                .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)];

            let write = vk::WriteDescriptorSet::default()
                .dst_set(self.set)
                .dst_binding(TEXTURE_BINDING)
                .dst_array_element(index)
                .descriptor_type(vk::DescriptorType::SAMPLED_IMAGE)
                .image_info(&image_info);

            self.ctx.device.update_descriptor_sets(&[write], &[]);
        }
        Ok(())
    }
}

impl DescriptorHeap {
    /// Copy `count` texture descriptors from `src` into this heap
    ///
    /// Constant views are always written in place, so cross-heap copies
    /// only ever move the texture binding.
    pub(crate) fn copy_from(
        &self,
        dst_index: u32,
        src: &DescriptorHeap,
        src_index: u32,
        count: u32,
    ) -> Result<()> {
        if count == 0 {
            return Err(Error::InvalidResource(
                "descriptor copy count must be non-zero".to_string(),
            ));
        }
        if src_index + count > src.capacity || dst_index + count > self.capacity {
            return Err(Error::InvalidResource(format!(
                "descriptor copy of {} slots out of range (src {}..{}, dst {}..{})",
                count, src_index, src.capacity, dst_index, self.capacity
            )));
        }

        unsafe {
            let copy = vk::CopyDescriptorSet::default()
                .src_set(src.set)
                .src_binding(TEXTURE_BINDING)
                .src_array_element(src_index)
                .dst_set(self.set)
                .dst_binding(TEXTURE_BINDING)
                .dst_array_element(dst_index)
                .descriptor_count(count);

            self.ctx.device.update_descriptor_sets(&[], &[copy]);
        }
        Ok(())
    }
}

impl Drop for DescriptorHeap {
    fn drop(&mut self) {
        unsafe {
            // Frees the set as well
            self.ctx.device.destroy_descriptor_pool(self.pool, None);
            self.ctx.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}
