//! Unit tests for material texture sets

use std::sync::Arc;

use crate::device::mock_device::MockDevice;
use crate::device::{GraphicsDevice, TextureDesc};
use crate::resource::context::{ContextConfig, ResourceContext};
use crate::resource::material::MaterialTextures;

fn test_context() -> (Arc<MockDevice>, ResourceContext) {
    let device = Arc::new(MockDevice::new());
    let queue = device.graphics_queue();
    let mut allocator = device.create_command_allocator().unwrap();
    let list = device.create_command_list(allocator.as_mut()).unwrap();
    let context = ResourceContext::new(
        device.clone(),
        list,
        queue,
        allocator,
        ContextConfig {
            max_constant_buffers: 16,
            max_texture_descriptors: 8,
        },
    )
    .unwrap();
    (device, context)
}

fn stage_texture(context: &mut ResourceContext) -> crate::device::CpuDescriptor {
    context
        .create_texture(&TextureDesc::default(), &[0u8; 4])
        .unwrap()
}

#[test]
fn test_slots_stay_sorted_regardless_of_insertion_order() {
    let (_device, mut context) = test_context();
    let mut material = MaterialTextures::new();

    let a = stage_texture(&mut context);
    let b = stage_texture(&mut context);
    let c = stage_texture(&mut context);

    material.add(2, c).unwrap();
    material.add(0, a).unwrap();
    material.add(1, b).unwrap();

    assert_eq!(material.slots().collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(material.texture_count(), 3);
}

#[test]
fn test_duplicate_slot_rejected() {
    let (_device, mut context) = test_context();
    let mut material = MaterialTextures::new();

    let a = stage_texture(&mut context);
    let b = stage_texture(&mut context);

    material.add(3, a).unwrap();
    assert!(material.add(3, b).is_err());
    assert_eq!(material.texture_count(), 1);
}

#[test]
fn test_finalize_returns_first_slot_of_contiguous_range() {
    let (_device, mut context) = test_context();
    let mut material = MaterialTextures::new();

    for slot in 0..4 {
        let descriptor = stage_texture(&mut context);
        material.add(slot, descriptor).unwrap();
    }

    let first = material.finalize(&mut context).unwrap();
    assert_eq!(first.index, 0);
    assert!(material.is_finalized());
    assert_eq!(material.first_handle(), Some(first));
}

#[test]
fn test_finalize_is_idempotent() {
    let (_device, mut context) = test_context();
    let mut material = MaterialTextures::new();

    let descriptor = stage_texture(&mut context);
    material.add(0, descriptor).unwrap();

    let first = material.finalize(&mut context).unwrap();
    let again = material.finalize(&mut context).unwrap();
    assert_eq!(first, again);
    // The second call copied nothing
    assert_eq!(context.stats().descriptors_copied, 1);
}

#[test]
fn test_add_after_finalize_rejected() {
    let (_device, mut context) = test_context();
    let mut material = MaterialTextures::new();

    let a = stage_texture(&mut context);
    material.add(0, a).unwrap();
    material.finalize(&mut context).unwrap();

    let b = stage_texture(&mut context);
    assert!(material.add(1, b).is_err());
}

#[test]
fn test_finalize_empty_material_rejected() {
    let (_device, mut context) = test_context();
    let mut material = MaterialTextures::new();
    assert!(material.finalize(&mut context).is_err());
}
