/// GpuContext - Shared GPU resources for all Vulkan objects
///
/// Contains everything needed for GPU operations:
/// - Device for Vulkan API calls
/// - Allocator for memory management
/// - Queue for command submission
///
/// Every resource (buffer, texture, heap, fence) holds an `Arc<GpuContext>`,
/// so the context drops last and owns device/instance destruction; resource
/// handles are always destroyed against a live device.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::Mutex;

/// Shared GPU context for all Vulkan resources
pub struct GpuContext {
    /// Vulkan entry (keeps the loader alive)
    #[allow(dead_code)]
    pub entry: ash::Entry,

    /// Vulkan instance
    pub instance: ash::Instance,

    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator (shared, requires mutex for thread safety)
    /// Wrapped in ManuallyDrop so it is dropped BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Graphics queue for command submission
    pub graphics_queue: vk::Queue,

    /// Graphics queue family index
    pub graphics_queue_family: u32,

    /// Debug utils loader (validation builds only)
    #[cfg(feature = "vulkan-validation")]
    pub(crate) debug_utils_loader: Option<ash::ext::debug_utils::Instance>,

    /// Debug messenger handle (validation builds only)
    #[cfg(feature = "vulkan-validation")]
    pub(crate) debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            // Resources are gone (they keep this context alive); let any
            // in-flight work retire before tearing the device down.
            self.device.device_wait_idle().ok();

            ManuallyDrop::drop(&mut self.allocator);
            self.device.destroy_device(None);

            #[cfg(feature = "vulkan-validation")]
            if let (Some(loader), Some(messenger)) =
                (&self.debug_utils_loader, self.debug_messenger)
            {
                loader.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}
