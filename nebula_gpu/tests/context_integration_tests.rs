//! Integration tests for ResourceContext with the mock device
//!
//! Drives the full residency flow — static uploads, constant ring fills,
//! descriptor copies, submission cycles — against the software device, so
//! the whole suite runs without a GPU.

use std::sync::Arc;

use glam::{Mat4, Vec3};

use nebula_gpu::nebula::device::mock_device::{MockDevice, MockSlot};
use nebula_gpu::nebula::device::{
    Buffer, CpuDescriptor, DescriptorHeap, DescriptorHeapId, GraphicsDevice, ResourceState,
    TextureDesc,
};
use nebula_gpu::nebula::resource::{ContextConfig, MaterialTextures, ResourceContext};

// ============================================================================
// HELPERS
// ============================================================================

fn build_context(config: ContextConfig) -> (Arc<MockDevice>, ResourceContext) {
    let device = Arc::new(MockDevice::new());
    let queue = device.graphics_queue();
    let mut allocator = device.create_command_allocator().unwrap();
    let list = device.create_command_list(allocator.as_mut()).unwrap();
    let context =
        ResourceContext::new(device.clone(), list, queue, allocator, config).unwrap();
    (device, context)
}

fn small_context() -> (Arc<MockDevice>, ResourceContext) {
    build_context(ContextConfig {
        max_constant_buffers: 4,
        max_texture_descriptors: 8,
    })
}

fn stage_texture(context: &mut ResourceContext) -> CpuDescriptor {
    context
        .create_texture(&TextureDesc::default(), &[255u8; 4])
        .unwrap()
}

// ============================================================================
// STATIC UPLOAD PROTOCOL
// ============================================================================

#[test]
fn test_static_buffer_round_trip() {
    let (_device, mut context) = small_context();

    let vertices = [
        Vec3::new(0.0, 1.0, 2.0),
        Vec3::new(3.0, 4.0, 5.0),
        Vec3::new(6.0, 7.0, 8.0),
    ];
    let bytes: &[u8] = bytemuck::cast_slice(&vertices);
    assert_eq!(bytes.len(), 36);

    let buffer = context.create_static_buffer(12, 3, bytes).unwrap();

    let mut readback = vec![0u8; 36];
    buffer.read(0, &mut readback).unwrap();
    assert_eq!(&readback[..], bytes);
}

#[test]
fn test_static_buffer_is_shader_readable_on_return() {
    let (device, mut context) = small_context();

    let buffer = context
        .create_static_buffer(4, 4, &[7u8; 16])
        .unwrap();

    // No further wait by the caller: the upload submission has completed
    // and the transition out of CopyDest has been executed.
    assert_eq!(buffer.state(), ResourceState::GenericRead);
    assert_eq!(device.executions(), 1);
    assert_eq!(context.stats().submissions, 1);
    assert_eq!(context.stats().static_buffers_created, 1);
}

#[test]
fn test_static_buffer_validates_arguments() {
    let (_device, mut context) = small_context();

    assert!(context.create_static_buffer(0, 3, &[]).is_err());
    assert!(context.create_static_buffer(12, 0, &[]).is_err());
    // 35 bytes for stride 12 x count 3
    assert!(context.create_static_buffer(12, 3, &[0u8; 35]).is_err());
}

#[test]
fn test_recorder_is_reusable_after_each_upload() {
    let (device, mut context) = small_context();

    for i in 1..=3u8 {
        let buffer = context
            .create_static_buffer(1, 4, &[i; 4])
            .unwrap();
        let mut readback = [0u8; 4];
        buffer.read(0, &mut readback).unwrap();
        assert_eq!(readback, [i; 4]);
    }
    assert_eq!(device.executions(), 3);
    assert_eq!(context.fence_target(), 3);
}

// ============================================================================
// CONSTANT RING ALLOCATOR
// ============================================================================

#[test]
fn test_fill_wraps_back_to_first_descriptor_slot() {
    // Ring sized for 4 constant buffers; five 64-byte fills. The 5th fill's
    // handle equals the 1st (the descriptor cursor wrapped to slot 0) and
    // every fill reserves 256 bytes.
    let (device, mut context) = small_context();
    let shared = context.descriptor_table_heap().id();

    let handles: Vec<_> = (0..5)
        .map(|i| {
            context
                .fill_next_constant_buffer(&[i as u8; 64])
                .unwrap()
        })
        .collect();

    assert_eq!(handles[0].index, 0);
    assert_eq!(handles[1].index, 1);
    assert_eq!(handles[2].index, 2);
    assert_eq!(handles[3].index, 3);
    assert_eq!(handles[4], handles[0]);

    for index in 0..4 {
        match device.heap_slot(shared, index).unwrap() {
            MockSlot::ConstantView { size_in_bytes, .. } => {
                assert_eq!(size_in_bytes, 256);
            }
            other => panic!("slot {} holds {:?}, expected a constant view", index, other),
        }
    }
}

#[test]
fn test_fill_views_follow_the_ring_cursor() {
    let (device, mut context) = small_context();
    let shared = context.descriptor_table_heap().id();

    let offset_of = |device: &MockDevice, index: u32| match device
        .heap_slot(shared, index)
        .unwrap()
    {
        MockSlot::ConstantView { offset, .. } => offset,
        other => panic!("slot {} holds {:?}", index, other),
    };

    context.fill_next_constant_buffer(&[1u8; 64]).unwrap();
    context.fill_next_constant_buffer(&[2u8; 64]).unwrap();
    context.fill_next_constant_buffer(&[3u8; 64]).unwrap();
    assert_eq!(offset_of(&device, 0), 0);
    assert_eq!(offset_of(&device, 1), 256);
    assert_eq!(offset_of(&device, 2), 512);

    // The 4th fill would reach the ring's end: its view is back at offset 0
    context.fill_next_constant_buffer(&[4u8; 64]).unwrap();
    assert_eq!(offset_of(&device, 3), 0);

    // And the 5th (descriptor slot 0 again) sits at offset 256
    context.fill_next_constant_buffer(&[5u8; 64]).unwrap();
    assert_eq!(offset_of(&device, 0), 256);
}

#[test]
fn test_fill_copies_payload_into_the_ring() {
    let (device, mut context) = small_context();
    let shared = context.descriptor_table_heap().id();

    let payload = [0xABu8; 48];
    context.fill_next_constant_buffer(&payload).unwrap();

    let (buffer, offset) = match device.heap_slot(shared, 0).unwrap() {
        MockSlot::ConstantView { buffer, offset, .. } => (buffer, offset),
        other => panic!("expected a constant view, got {:?}", other),
    };
    let ring_bytes = device.buffer_bytes(buffer).unwrap();
    assert_eq!(&ring_bytes[offset as usize..offset as usize + 48], &payload);
}

#[test]
fn test_typed_fill_reserves_one_aligned_slot() {
    let (device, mut context) = small_context();
    let shared = context.descriptor_table_heap().id();

    let transform = Mat4::IDENTITY;
    let handle = context.fill_next_constant(&transform).unwrap();
    assert_eq!(handle.index, 0);

    match device.heap_slot(shared, 0).unwrap() {
        MockSlot::ConstantView { size_in_bytes, .. } => {
            // 64-byte matrix rounds up to one 256-byte slot
            assert_eq!(size_in_bytes, 256);
        }
        other => panic!("expected a constant view, got {:?}", other),
    }
}

#[test]
fn test_fill_never_blocks_or_submits() {
    let (device, mut context) = small_context();

    for i in 0..16u8 {
        context.fill_next_constant_buffer(&[i; 32]).unwrap();
    }
    assert_eq!(device.executions(), 0);
    assert_eq!(context.fence_target(), 0);
    assert_eq!(context.stats().constant_fills, 16);
}

#[test]
fn test_oversized_fill_rejected() {
    let (_device, mut context) = small_context();
    // Ring capacity is 4 x 256 = 1024 bytes
    assert!(context.fill_next_constant_buffer(&[0u8; 1025]).is_err());
    assert!(context.fill_next_constant_buffer(&[]).is_err());
}

// ============================================================================
// SHARED DESCRIPTOR TABLE
// ============================================================================

#[test]
fn test_material_range_is_contiguous_and_returns_first_slot() {
    let (device, mut context) = build_context(ContextConfig {
        max_constant_buffers: 16,
        max_texture_descriptors: 8,
    });
    let shared = context.descriptor_table_heap().id();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let staged = stage_texture(&mut context);
        handles.push(
            context
                .copy_descriptors_into_shared_heap(staged, 1)
                .unwrap(),
        );
    }

    // Ascending, contiguous table indices; first handle is the range start
    assert_eq!(
        handles.iter().map(|h| h.index).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );
    assert_eq!(handles[0].index, 0);
    for index in 0..4 {
        assert!(matches!(
            device.heap_slot(shared, index),
            Some(MockSlot::TextureView { .. })
        ));
    }
}

#[test]
fn test_multi_descriptor_copy_advances_cursor_by_count() {
    let (_device, mut context) = build_context(ContextConfig {
        max_constant_buffers: 16,
        max_texture_descriptors: 8,
    });

    let first = stage_texture(&mut context);
    let _second = stage_texture(&mut context);
    let _third = stage_texture(&mut context);

    // The staged views are consecutive, so one call can copy all three
    let range = context.copy_descriptors_into_shared_heap(first, 3).unwrap();
    assert_eq!(range.index, 0);

    let next = stage_texture(&mut context);
    let after = context.copy_descriptors_into_shared_heap(next, 1).unwrap();
    assert_eq!(after.index, 3);
}

#[test]
fn test_handles_from_foreign_heaps_rejected() {
    let (_device, mut context) = small_context();

    let forged = CpuDescriptor {
        heap: DescriptorHeapId::new(9999),
        index: 0,
    };
    assert!(context
        .copy_descriptors_into_shared_heap(forged, 1)
        .is_err());
}

#[test]
fn test_constant_and_texture_regions_share_one_heap() {
    let (_device, mut context) = build_context(ContextConfig {
        max_constant_buffers: 16,
        max_texture_descriptors: 8,
    });

    let constant = context.fill_next_constant_buffer(&[1u8; 16]).unwrap();
    let staged = stage_texture(&mut context);
    let texture = context.copy_descriptors_into_shared_heap(staged, 1).unwrap();

    // Both handles point into the same shader-visible heap; binding that
    // heap once exposes every view a draw needs.
    assert_eq!(constant.heap, texture.heap);
    assert_eq!(constant.heap, context.descriptor_table_heap().id());
}

// ============================================================================
// MATERIALS
// ============================================================================

#[test]
fn test_material_finalize_over_full_flow() {
    let (device, mut context) = build_context(ContextConfig {
        max_constant_buffers: 16,
        max_texture_descriptors: 8,
    });
    let shared = context.descriptor_table_heap().id();

    let mut material = MaterialTextures::new();
    for slot in 0..4u32 {
        let staged = stage_texture(&mut context);
        material.add(slot, staged).unwrap();
    }

    let first = material.finalize(&mut context).unwrap();
    assert_eq!(first.index, 0);
    for index in 0..4 {
        assert!(matches!(
            device.heap_slot(shared, index),
            Some(MockSlot::TextureView { .. })
        ));
    }
    assert_eq!(context.stats().descriptors_copied, 4);
}

// ============================================================================
// TEXTURE REGISTRY
// ============================================================================

#[test]
fn test_texture_registry_accumulates_for_process_lifetime() {
    let (_device, mut context) = small_context();

    for _ in 0..3 {
        stage_texture(&mut context);
    }
    assert_eq!(context.texture_count(), 3);
    assert_eq!(context.stats().textures_registered, 3);
}

#[test]
fn test_staging_heap_exhaustion_reported() {
    let (_device, mut context) = build_context(ContextConfig {
        max_constant_buffers: 4,
        max_texture_descriptors: 2,
    });

    stage_texture(&mut context);
    stage_texture(&mut context);
    let result = context.create_texture(&TextureDesc::default(), &[0u8; 4]);
    assert!(result.is_err());
    // The failed registration kept the registry consistent
    assert_eq!(context.texture_count(), 2);
}

// ============================================================================
// SYNCHRONIZATION
// ============================================================================

#[test]
fn test_signal_and_wait_advances_the_fence() {
    let (_device, mut context) = small_context();

    context.signal_and_wait().unwrap();
    context.signal_and_wait().unwrap();
    assert_eq!(context.fence_target(), 2);
}

#[test]
fn test_explicit_frame_boundary_cycle() {
    let (device, mut context) = small_context();

    // A frame that only pushed constants still submits at its boundary
    context.fill_next_constant_buffer(&[3u8; 64]).unwrap();
    context.close_execute_and_reset().unwrap();

    assert_eq!(device.executions(), 1);
    assert_eq!(context.stats().submissions, 1);

    // The recorder came back open: the next frame can upload again
    let buffer = context.create_static_buffer(4, 2, &[9u8; 8]).unwrap();
    let mut readback = [0u8; 8];
    buffer.read(0, &mut readback).unwrap();
    assert_eq!(readback, [9u8; 8]);
}
