/// VulkanDevice - Vulkan implementation of the GraphicsDevice trait
///
/// Headless: no surface, no swapchain. The device exposes a single graphics
/// queue, which the resource layer drives through the CommandQueue trait.

use nebula_gpu::nebula::device::{
    Buffer as DeviceBuffer, BufferDesc, BufferId, BufferUsage, CommandAllocator as DeviceCommandAllocator,
    CommandList as DeviceCommandList, CommandQueue as DeviceCommandQueue,
    DescriptorHeap as DeviceDescriptorHeap, DescriptorHeapDesc, DescriptorHeapId, DeviceConfig,
    Fence as DeviceFence, GraphicsDevice, HeapKind, Texture as DeviceTexture, TextureDesc,
    TextureId,
};
use nebula_gpu::nebula::{Error, Result};
use nebula_gpu::{gpu_err, gpu_info};
use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use std::ffi::CString;
use std::mem::ManuallyDrop;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::vulkan_buffer::Buffer;
use crate::vulkan_command_list::{CommandAllocator, CommandList};
use crate::vulkan_context::GpuContext;
use crate::vulkan_descriptor_heap::DescriptorHeap;
use crate::vulkan_fence::Fence;
use crate::vulkan_queue::Queue;
use crate::vulkan_texture::Texture;

/// Vulkan device implementation
///
/// Central object for creating resources; completely separated from
/// windowing and presentation.
pub struct VulkanDevice {
    /// Shared GPU context for all resources; owns device/instance destruction
    ctx: Arc<GpuContext>,
    /// Physical device the logical device was created from
    #[allow(dead_code)]
    physical_device: vk::PhysicalDevice,
    /// The single graphics queue, shared with the resource layer
    queue: Arc<Queue>,
    /// Resource id allocator (buffers, textures)
    next_resource_id: AtomicU64,
    /// Heap id allocator
    next_heap_id: AtomicU32,
}

impl VulkanDevice {
    /// Create a new headless Vulkan device
    ///
    /// # Arguments
    ///
    /// * `config` - Application identity and validation toggle
    pub fn new(config: &DeviceConfig) -> Result<Self> {
        unsafe {
            // Create Vulkan Entry
            let entry = ash::Entry::load().map_err(|e| {
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

            let app_name = CString::new(config.app_name.as_str()).map_err(|_| {
                Error::InitializationFailed("application name contains a NUL byte".to_string())
            })?;
            let (major, minor, patch) = config.app_version;

            // Application Info
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"NebulaGPU")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            // Headless: no surface extensions
            #[allow(unused_mut)]
            let mut extension_names: Vec<*const std::os::raw::c_char> = Vec::new();
            #[allow(unused_mut)]
            let mut layer_names: Vec<*const std::os::raw::c_char> = Vec::new();

            #[cfg(feature = "vulkan-validation")]
            if config.enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
                layer_names.push(c"VK_LAYER_KHRONOS_validation".as_ptr());
            }

            #[cfg(not(feature = "vulkan-validation"))]
            if config.enable_validation {
                nebula_gpu::gpu_warn!(
                    "nebula::vulkan",
                    "validation requested but the vulkan-validation feature is not compiled in"
                );
            }

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None).map_err(|e| {
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

            // Setup debug messenger if validation is enabled
            #[cfg(feature = "vulkan-validation")]
            let (debug_utils_loader, debug_messenger) = if config.enable_validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
                let debug_info = crate::vulkan_debug::messenger_create_info();
                let messenger = debug_utils
                    .create_debug_utils_messenger(&debug_info, None)
                    .map_err(|e| {
                        Error::InitializationFailed(format!(
                            "Failed to create debug messenger: {:?}",
                            e
                        ))
                    })?;
                (Some(debug_utils), Some(messenger))
            } else {
                (None, None)
            };

            // Pick Physical Device
            let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
                Error::InitializationFailed(format!(
                    "Failed to enumerate physical devices: {:?}",
                    e
                ))
            })?;

            let physical_device = physical_devices.into_iter().next().ok_or_else(|| {
                Error::InitializationFailed("No Vulkan-capable GPU found".to_string())
            })?;

            // Find a graphics queue family
            let queue_families =
                instance.get_physical_device_queue_family_properties(physical_device);

            let graphics_family_index = queue_families
                .iter()
                .enumerate()
                .find(|(_, qf)| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|(i, _)| i as u32)
                .ok_or_else(|| {
                    Error::InitializationFailed("No graphics queue family found".to_string())
                })?;

            // Create Logical Device
            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .queue_priorities(&queue_priorities)];

            // Timeline semaphores back the fence; descriptor indexing with
            // partially-bound bindings backs the descriptor heaps.
            let mut features12 = vk::PhysicalDeviceVulkan12Features::default()
                .timeline_semaphore(true)
                .descriptor_indexing(true)
                .descriptor_binding_partially_bound(true);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .push_next(&mut features12);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;

            let graphics_queue = device.get_device_queue(graphics_family_index, 0);

            // Create GPU allocator
            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?;

            let ctx = Arc::new(GpuContext {
                entry,
                instance,
                device,
                allocator: ManuallyDrop::new(Mutex::new(allocator)),
                graphics_queue,
                graphics_queue_family: graphics_family_index,
                #[cfg(feature = "vulkan-validation")]
                debug_utils_loader,
                #[cfg(feature = "vulkan-validation")]
                debug_messenger,
            });

            gpu_info!(
                "nebula::vulkan",
                "device created (queue family {})",
                graphics_family_index
            );

            let queue = Arc::new(Queue::new(Arc::clone(&ctx)));

            Ok(Self {
                ctx,
                physical_device,
                queue,
                next_resource_id: AtomicU64::new(0),
                next_heap_id: AtomicU32::new(0),
            })
        }
    }

    fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
        let mut flags = vk::BufferUsageFlags::empty();
        if usage.contains(BufferUsage::VERTEX) {
            flags |= vk::BufferUsageFlags::VERTEX_BUFFER;
        }
        if usage.contains(BufferUsage::INDEX) {
            flags |= vk::BufferUsageFlags::INDEX_BUFFER;
        }
        if usage.contains(BufferUsage::CONSTANT) {
            flags |= vk::BufferUsageFlags::UNIFORM_BUFFER;
        }
        if usage.contains(BufferUsage::COPY_SRC) {
            flags |= vk::BufferUsageFlags::TRANSFER_SRC;
        }
        if usage.contains(BufferUsage::COPY_DST) {
            flags |= vk::BufferUsageFlags::TRANSFER_DST;
        }
        flags
    }
}

impl GraphicsDevice for VulkanDevice {
    fn create_fence(&self, initial_value: u64) -> Result<Arc<dyn DeviceFence>> {
        Ok(Arc::new(Fence::new(Arc::clone(&self.ctx), initial_value)?))
    }

    fn create_command_allocator(&self) -> Result<Box<dyn DeviceCommandAllocator>> {
        Ok(Box::new(CommandAllocator::new(Arc::clone(&self.ctx))?))
    }

    fn create_command_list(
        &self,
        allocator: &mut dyn DeviceCommandAllocator,
    ) -> Result<Box<dyn DeviceCommandList>> {
        // Allocators handed back here were created by this device
        let allocator =
            unsafe { &*(allocator as *const dyn DeviceCommandAllocator as *const CommandAllocator) };
        Ok(Box::new(CommandList::new(Arc::clone(&self.ctx), allocator)?))
    }

    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn DeviceBuffer>> {
        if desc.size == 0 {
            return Err(Error::InvalidResource(
                "buffer size must be non-zero".to_string(),
            ));
        }
        unsafe {
            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(desc.size)
                .usage(Self::buffer_usage_to_vk(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = self
                .ctx
                .device
                .create_buffer(&buffer_create_info, None)
                .map_err(|e| gpu_err!("nebula::vulkan", "Failed to create buffer of size {} bytes: {:?}", desc.size, e))?;

            let requirements = self.ctx.device.get_buffer_memory_requirements(buffer);

            let location = match desc.heap {
                HeapKind::Default => gpu_allocator::MemoryLocation::GpuOnly,
                HeapKind::Upload => gpu_allocator::MemoryLocation::CpuToGpu,
            };

            let allocation = self
                .ctx
                .allocator
                .lock()
                .unwrap()
                .allocate(&gpu_allocator::vulkan::AllocationCreateDesc {
                    name: "buffer",
                    requirements,
                    location,
                    linear: true,
                    allocation_scheme: gpu_allocator::vulkan::AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|_e| {
                    self.ctx.device.destroy_buffer(buffer, None);
                    Error::OutOfMemory
                })?;

            self.ctx
                .device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .map_err(|e| gpu_err!("nebula::vulkan", "Failed to bind buffer memory: {:?}", e))?;

            let id = BufferId::new(self.next_resource_id.fetch_add(1, Ordering::Relaxed) + 1);
            Ok(Arc::new(Buffer::new(
                Arc::clone(&self.ctx),
                buffer,
                allocation,
                desc.size,
                desc.heap,
                id,
                desc.initial_state,
            )))
        }
    }

    fn create_texture(&self, desc: &TextureDesc, pixels: &[u8]) -> Result<Arc<dyn DeviceTexture>> {
        let id = TextureId::new(self.next_resource_id.fetch_add(1, Ordering::Relaxed) + 1);
        Ok(Arc::new(Texture::new(
            Arc::clone(&self.ctx),
            desc,
            pixels,
            id,
        )?))
    }

    fn create_descriptor_heap(
        &self,
        desc: &DescriptorHeapDesc,
    ) -> Result<Arc<dyn DeviceDescriptorHeap>> {
        if desc.capacity == 0 {
            return Err(Error::InvalidResource(
                "descriptor heap capacity must be non-zero".to_string(),
            ));
        }
        let id = DescriptorHeapId::new(self.next_heap_id.fetch_add(1, Ordering::Relaxed) + 1);
        Ok(Arc::new(DescriptorHeap::new(
            Arc::clone(&self.ctx),
            id,
            desc.capacity,
            desc.shader_visible,
        )?))
    }

    fn copy_descriptors(
        &self,
        dst: &dyn DeviceDescriptorHeap,
        dst_index: u32,
        src: &dyn DeviceDescriptorHeap,
        src_index: u32,
        count: u32,
    ) -> Result<()> {
        // Heaps handed back here were created by this device
        let dst = unsafe { &*(dst as *const dyn DeviceDescriptorHeap as *const DescriptorHeap) };
        let src = unsafe { &*(src as *const dyn DeviceDescriptorHeap as *const DescriptorHeap) };
        dst.copy_from(dst_index, src, src_index, count)
    }

    fn graphics_queue(&self) -> Arc<dyn DeviceCommandQueue> {
        self.queue.clone()
    }
}
