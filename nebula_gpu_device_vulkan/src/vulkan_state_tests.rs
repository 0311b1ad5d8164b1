//! Unit tests for state and format mappings (no GPU required)

use ash::vk;
use nebula_gpu::nebula::device::{ResourceState, TextureFormat};

use crate::vulkan_state::{state_access_flags, state_stage_flags, texture_format_to_vk};

#[test]
fn test_copy_dest_maps_to_transfer_writes() {
    assert_eq!(
        state_access_flags(ResourceState::CopyDest),
        vk::AccessFlags::TRANSFER_WRITE
    );
    assert_eq!(
        state_stage_flags(ResourceState::CopyDest),
        vk::PipelineStageFlags::TRANSFER
    );
}

#[test]
fn test_generic_read_covers_every_read_path() {
    let access = state_access_flags(ResourceState::GenericRead);
    assert!(access.contains(vk::AccessFlags::VERTEX_ATTRIBUTE_READ));
    assert!(access.contains(vk::AccessFlags::INDEX_READ));
    assert!(access.contains(vk::AccessFlags::UNIFORM_READ));
    assert!(access.contains(vk::AccessFlags::SHADER_READ));
    assert!(!access.contains(vk::AccessFlags::TRANSFER_WRITE));

    let stages = state_stage_flags(ResourceState::GenericRead);
    assert!(stages.contains(vk::PipelineStageFlags::VERTEX_INPUT));
    assert!(stages.contains(vk::PipelineStageFlags::FRAGMENT_SHADER));
}

#[test]
fn test_texture_format_mapping() {
    assert_eq!(
        texture_format_to_vk(TextureFormat::R8G8B8A8_UNORM),
        vk::Format::R8G8B8A8_UNORM
    );
    assert_eq!(
        texture_format_to_vk(TextureFormat::R8G8B8A8_SRGB),
        vk::Format::R8G8B8A8_SRGB
    );
    assert_eq!(
        texture_format_to_vk(TextureFormat::B8G8R8A8_UNORM),
        vk::Format::B8G8R8A8_UNORM
    );
    assert_eq!(
        texture_format_to_vk(TextureFormat::B8G8R8A8_SRGB),
        vk::Format::B8G8R8A8_SRGB
    );
}
