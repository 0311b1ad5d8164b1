//! Unit tests for the mock device
//!
//! Exercises the device trait contracts against the software implementation:
//! buffer mapping rules, command replay at submission, fence signaling and
//! descriptor slot bookkeeping.

use crate::device::mock_device::{MockDevice, MockSlot};
use crate::device::{
    Buffer, BufferDesc, BufferUsage, CommandAllocator, CommandList, CommandQueue, DescriptorHeap,
    DescriptorHeapDesc, Fence, GraphicsDevice, HeapKind, ResourceState, Texture, TextureDesc,
    TextureFormat,
};

fn upload_desc(size: u64) -> BufferDesc {
    BufferDesc {
        size,
        heap: HeapKind::Upload,
        usage: BufferUsage::COPY_SRC,
        initial_state: ResourceState::GenericRead,
    }
}

fn default_desc(size: u64) -> BufferDesc {
    BufferDesc {
        size,
        heap: HeapKind::Default,
        usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
        initial_state: ResourceState::CopyDest,
    }
}

// ============================================================================
// Buffer Tests
// ============================================================================

#[test]
fn test_upload_buffer_write_and_read() {
    let device = MockDevice::new();
    let buffer = device.create_buffer(&upload_desc(16)).unwrap();

    buffer.write(4, &[1, 2, 3, 4]).unwrap();

    let mut out = [0u8; 4];
    buffer.read(4, &mut out).unwrap();
    assert_eq!(out, [1, 2, 3, 4]);
}

#[test]
fn test_default_heap_buffer_rejects_write() {
    let device = MockDevice::new();
    let buffer = device.create_buffer(&default_desc(16)).unwrap();

    assert!(buffer.write(0, &[1, 2, 3]).is_err());
}

#[test]
fn test_buffer_write_out_of_bounds() {
    let device = MockDevice::new();
    let buffer = device.create_buffer(&upload_desc(8)).unwrap();

    assert!(buffer.write(4, &[0u8; 8]).is_err());
}

#[test]
fn test_zero_sized_buffer_rejected() {
    let device = MockDevice::new();
    assert!(device.create_buffer(&upload_desc(0)).is_err());
}

// ============================================================================
// CommandList / Queue Tests
// ============================================================================

#[test]
fn test_copy_executes_only_on_submission() {
    let device = MockDevice::new();
    let queue = device.graphics_queue();
    let mut allocator = device.create_command_allocator().unwrap();
    let mut list = device.create_command_list(allocator.as_mut()).unwrap();

    let src = device.create_buffer(&upload_desc(8)).unwrap();
    let dst = device.create_buffer(&default_desc(8)).unwrap();
    src.write(0, &[9u8; 8]).unwrap();

    list.copy_buffer(src.as_ref(), dst.as_ref()).unwrap();

    // Recorded but not executed: destination still zeroed
    let mut out = [1u8; 8];
    dst.read(0, &mut out).unwrap();
    assert_eq!(out, [0u8; 8]);

    list.close().unwrap();
    queue.execute(list.as_mut()).unwrap();

    dst.read(0, &mut out).unwrap();
    assert_eq!(out, [9u8; 8]);
    assert_eq!(device.executions(), 1);
}

#[test]
fn test_execute_rejects_open_list() {
    let device = MockDevice::new();
    let queue = device.graphics_queue();
    let mut allocator = device.create_command_allocator().unwrap();
    let mut list = device.create_command_list(allocator.as_mut()).unwrap();

    assert!(queue.execute(list.as_mut()).is_err());
}

#[test]
fn test_copy_requires_equal_sizes() {
    let device = MockDevice::new();
    let mut allocator = device.create_command_allocator().unwrap();
    let mut list = device.create_command_list(allocator.as_mut()).unwrap();

    let src = device.create_buffer(&upload_desc(8)).unwrap();
    let dst = device.create_buffer(&default_desc(16)).unwrap();
    assert!(list.copy_buffer(src.as_ref(), dst.as_ref()).is_err());
}

#[test]
fn test_transition_updates_state_on_execution() {
    let device = MockDevice::new();
    let queue = device.graphics_queue();
    let mut allocator = device.create_command_allocator().unwrap();
    let mut list = device.create_command_list(allocator.as_mut()).unwrap();

    let buffer = device.create_buffer(&default_desc(8)).unwrap();
    assert_eq!(buffer.state(), ResourceState::CopyDest);

    list.transition_buffer(
        buffer.as_ref(),
        ResourceState::CopyDest,
        ResourceState::GenericRead,
    )
    .unwrap();
    assert_eq!(buffer.state(), ResourceState::CopyDest);

    list.close().unwrap();
    queue.execute(list.as_mut()).unwrap();
    assert_eq!(buffer.state(), ResourceState::GenericRead);
}

#[test]
fn test_transition_with_wrong_source_state_fails() {
    let device = MockDevice::new();
    let queue = device.graphics_queue();
    let mut allocator = device.create_command_allocator().unwrap();
    let mut list = device.create_command_list(allocator.as_mut()).unwrap();

    let buffer = device.create_buffer(&default_desc(8)).unwrap();
    list.transition_buffer(
        buffer.as_ref(),
        ResourceState::GenericRead,
        ResourceState::CopyDest,
    )
    .unwrap();
    list.close().unwrap();

    assert!(queue.execute(list.as_mut()).is_err());
}

#[test]
fn test_list_reset_discards_recorded_commands() {
    let device = MockDevice::new();
    let queue = device.graphics_queue();
    let mut allocator = device.create_command_allocator().unwrap();
    let mut list = device.create_command_list(allocator.as_mut()).unwrap();

    let src = device.create_buffer(&upload_desc(8)).unwrap();
    let dst = device.create_buffer(&default_desc(8)).unwrap();
    src.write(0, &[7u8; 8]).unwrap();

    list.copy_buffer(src.as_ref(), dst.as_ref()).unwrap();
    list.close().unwrap();
    allocator.reset().unwrap();
    list.reset(allocator.as_mut()).unwrap();
    assert!(list.is_recording());

    // The discarded copy must not run
    list.close().unwrap();
    queue.execute(list.as_mut()).unwrap();
    let mut out = [1u8; 8];
    dst.read(0, &mut out).unwrap();
    assert_eq!(out, [0u8; 8]);
}

// ============================================================================
// Fence Tests
// ============================================================================

#[test]
fn test_fence_signal_and_wait() {
    let device = MockDevice::new();
    let queue = device.graphics_queue();
    let fence = device.create_fence(0).unwrap();

    assert_eq!(fence.completed_value(), 0);
    queue.signal(fence.as_ref(), 3).unwrap();
    assert_eq!(fence.completed_value(), 3);
    fence.wait(3).unwrap();
    fence.wait(1).unwrap();
}

#[test]
fn test_fence_completed_value_is_monotonic() {
    let device = MockDevice::new();
    let queue = device.graphics_queue();
    let fence = device.create_fence(0).unwrap();

    queue.signal(fence.as_ref(), 5).unwrap();
    queue.signal(fence.as_ref(), 2).unwrap();
    assert_eq!(fence.completed_value(), 5);
}

#[test]
fn test_fence_wait_on_unsignaled_value_fails() {
    let device = MockDevice::new();
    let fence = device.create_fence(0).unwrap();
    assert!(fence.wait(1).is_err());
}

// ============================================================================
// Texture Tests
// ============================================================================

#[test]
fn test_create_texture_validates_pixel_size() {
    let device = MockDevice::new();
    let desc = TextureDesc {
        width: 2,
        height: 2,
        format: TextureFormat::R8G8B8A8_UNORM,
        mip_levels: 1,
    };

    assert!(device.create_texture(&desc, &[0u8; 15]).is_err());

    let texture = device.create_texture(&desc, &[0u8; 16]).unwrap();
    assert_eq!(texture.info().width, 2);
    assert_eq!(texture.info().format, TextureFormat::R8G8B8A8_UNORM);
}

// ============================================================================
// Descriptor Heap Tests
// ============================================================================

#[test]
fn test_heap_handles_carry_heap_identity() {
    let device = MockDevice::new();
    let heap = device
        .create_descriptor_heap(&DescriptorHeapDesc {
            capacity: 4,
            shader_visible: true,
        })
        .unwrap();

    let cpu = heap.cpu_descriptor(2).unwrap();
    let gpu = heap.gpu_descriptor(2).unwrap();
    assert_eq!(cpu.heap, heap.id());
    assert_eq!(gpu.heap, heap.id());
    assert_eq!(cpu.index, 2);
    assert_eq!(gpu.index, 2);

    assert!(heap.cpu_descriptor(4).is_err());
}

#[test]
fn test_cpu_only_heap_has_no_gpu_descriptors() {
    let device = MockDevice::new();
    let heap = device
        .create_descriptor_heap(&DescriptorHeapDesc {
            capacity: 4,
            shader_visible: false,
        })
        .unwrap();

    assert!(heap.cpu_descriptor(0).is_ok());
    assert!(heap.gpu_descriptor(0).is_err());
}

#[test]
fn test_constant_view_requires_256_byte_multiple() {
    let device = MockDevice::new();
    let heap = device
        .create_descriptor_heap(&DescriptorHeapDesc {
            capacity: 4,
            shader_visible: true,
        })
        .unwrap();
    let buffer = device.create_buffer(&upload_desc(1024)).unwrap();

    assert!(heap
        .create_constant_view(0, buffer.as_ref(), 0, 100)
        .is_err());
    assert!(heap
        .create_constant_view(0, buffer.as_ref(), 0, 256)
        .is_ok());
    assert_eq!(
        device.heap_slot(heap.id(), 0),
        Some(MockSlot::ConstantView {
            buffer: buffer.id(),
            offset: 0,
            size_in_bytes: 256,
        })
    );
}

#[test]
fn test_copy_descriptors_between_heaps() {
    let device = MockDevice::new();
    let staging = device
        .create_descriptor_heap(&DescriptorHeapDesc {
            capacity: 4,
            shader_visible: false,
        })
        .unwrap();
    let shared = device
        .create_descriptor_heap(&DescriptorHeapDesc {
            capacity: 8,
            shader_visible: true,
        })
        .unwrap();

    let desc = TextureDesc::default();
    let texture = device.create_texture(&desc, &[0u8; 4]).unwrap();
    staging.create_texture_view(1, texture.as_ref()).unwrap();

    device
        .copy_descriptors(shared.as_ref(), 5, staging.as_ref(), 1, 1)
        .unwrap();
    assert_eq!(
        device.heap_slot(shared.id(), 5),
        Some(MockSlot::TextureView {
            texture: texture.id()
        })
    );
}

#[test]
fn test_copy_descriptors_rejects_uninitialized_source() {
    let device = MockDevice::new();
    let staging = device
        .create_descriptor_heap(&DescriptorHeapDesc {
            capacity: 4,
            shader_visible: false,
        })
        .unwrap();
    let shared = device
        .create_descriptor_heap(&DescriptorHeapDesc {
            capacity: 4,
            shader_visible: true,
        })
        .unwrap();

    assert!(device
        .copy_descriptors(shared.as_ref(), 0, staging.as_ref(), 0, 1)
        .is_err());
}

#[test]
fn test_copy_descriptors_rejects_out_of_range() {
    let device = MockDevice::new();
    let staging = device
        .create_descriptor_heap(&DescriptorHeapDesc {
            capacity: 2,
            shader_visible: false,
        })
        .unwrap();
    let shared = device
        .create_descriptor_heap(&DescriptorHeapDesc {
            capacity: 2,
            shader_visible: true,
        })
        .unwrap();

    assert!(device
        .copy_descriptors(shared.as_ref(), 1, staging.as_ref(), 0, 2)
        .is_err());
}
