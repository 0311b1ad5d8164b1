//! Integration tests for the Vulkan device backend
//!
//! These tests require a GPU and a Vulkan loader and are marked with
//! #[ignore]. Run with: cargo test --test vulkan_device_integration_tests -- --ignored
//!
//! Each test also skips itself gracefully when no Vulkan implementation is
//! available, so `--ignored` runs stay green on machines without a driver.

use std::sync::Arc;

use nebula_gpu::nebula::device::{
    Buffer, CommandQueue, DescriptorHeap, DeviceConfig, Fence, GraphicsDevice, ResourceState,
};
use nebula_gpu::nebula::resource::{ContextConfig, ResourceContext};
use nebula_gpu_device_vulkan::VulkanDevice;

/// Create a device, or None when no Vulkan implementation is present
fn try_create_device() -> Option<Arc<VulkanDevice>> {
    let config = DeviceConfig {
        enable_validation: false,
        ..DeviceConfig::default()
    };
    match VulkanDevice::new(&config) {
        Ok(device) => Some(Arc::new(device)),
        Err(e) => {
            eprintln!("skipping: no usable Vulkan device ({})", e);
            None
        }
    }
}

fn try_create_context(device: &Arc<VulkanDevice>) -> ResourceContext {
    let queue = device.graphics_queue();
    let mut allocator = device.create_command_allocator().unwrap();
    let list = device.create_command_list(allocator.as_mut()).unwrap();
    ResourceContext::new(
        device.clone(),
        list,
        queue,
        allocator,
        ContextConfig {
            max_constant_buffers: 64,
            max_texture_descriptors: 16,
        },
    )
    .unwrap()
}

// ============================================================================
// INTEGRATION TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_integration_fence_signal_and_wait() {
    let Some(device) = try_create_device() else {
        return;
    };
    let fence = device.create_fence(0).unwrap();
    let queue = device.graphics_queue();

    assert_eq!(fence.completed_value(), 0);
    queue.signal(fence.as_ref(), 1).unwrap();
    fence.wait(1).unwrap();
    assert!(fence.completed_value() >= 1);
}

#[test]
#[ignore] // Requires GPU
fn test_integration_static_buffer_upload() {
    let Some(device) = try_create_device() else {
        return;
    };
    let mut context = try_create_context(&device);

    let data: Vec<u8> = (0..48u8).collect();
    let buffer = context.create_static_buffer(12, 4, &data).unwrap();

    // The destination is device-local and shader-readable on return
    assert_eq!(buffer.state(), ResourceState::GenericRead);
    assert_eq!(buffer.size(), 48);
    // Device-local memory is not CPU-readable through the trait
    let mut out = [0u8; 4];
    assert!(buffer.read(0, &mut out).is_err());
}

#[test]
#[ignore] // Requires GPU
fn test_integration_constant_fills_and_descriptor_copies() {
    let Some(device) = try_create_device() else {
        return;
    };
    let mut context = try_create_context(&device);

    let first = context.fill_next_constant_buffer(&[1u8; 64]).unwrap();
    let second = context.fill_next_constant_buffer(&[2u8; 300]).unwrap();
    assert_eq!(first.index, 0);
    assert_eq!(second.index, 1);

    let staged = context
        .create_texture(
            &nebula_gpu::nebula::device::TextureDesc::default(),
            &[255u8; 4],
        )
        .unwrap();
    let handle = context.copy_descriptors_into_shared_heap(staged, 1).unwrap();
    assert_eq!(handle.heap, context.descriptor_table_heap().id());

    context.close_execute_and_reset().unwrap();
    assert_eq!(context.stats().submissions, 1);
}
