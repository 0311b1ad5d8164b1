/*!
# NebulaGPU - Vulkan Device Backend

Vulkan implementation of the NebulaGPU device traits.

This crate provides a headless Vulkan 1.3 backend using the Ash library for
Vulkan bindings and gpu-allocator for memory management. The resource
layer's fence maps to a timeline semaphore, its descriptor heaps map to
descriptor sets with partially-bound array bindings, and buffer state
transitions map to pipeline barriers.

No surface or swapchain is created: presentation belongs to the hosting
application, not the resource layer.
*/

// Vulkan implementation modules
mod vulkan_context;
mod vulkan_device;
mod vulkan_fence;
mod vulkan_queue;
mod vulkan_buffer;
mod vulkan_texture;
mod vulkan_command_list;
mod vulkan_descriptor_heap;
mod vulkan_state;

#[cfg(feature = "vulkan-validation")]
mod vulkan_debug;

pub use vulkan_device::VulkanDevice;
pub use vulkan_buffer::Buffer as VulkanBuffer;
pub use vulkan_texture::Texture as VulkanTexture;
pub use vulkan_descriptor_heap::DescriptorHeap as VulkanDescriptorHeap;
