/// Mapping of backend-agnostic resource states and formats to Vulkan

use ash::vk;
use nebula_gpu::nebula::device::{ResourceState, TextureFormat};

/// Access mask a buffer in `state` is subject to
pub(crate) fn state_access_flags(state: ResourceState) -> vk::AccessFlags {
    match state {
        ResourceState::CopyDest => vk::AccessFlags::TRANSFER_WRITE,
        ResourceState::GenericRead => {
            vk::AccessFlags::VERTEX_ATTRIBUTE_READ
                | vk::AccessFlags::INDEX_READ
                | vk::AccessFlags::UNIFORM_READ
                | vk::AccessFlags::SHADER_READ
                | vk::AccessFlags::TRANSFER_READ
        }
    }
}

/// Pipeline stages that touch a buffer in `state`
pub(crate) fn state_stage_flags(state: ResourceState) -> vk::PipelineStageFlags {
    match state {
        ResourceState::CopyDest => vk::PipelineStageFlags::TRANSFER,
        ResourceState::GenericRead => {
            vk::PipelineStageFlags::VERTEX_INPUT
                | vk::PipelineStageFlags::VERTEX_SHADER
                | vk::PipelineStageFlags::FRAGMENT_SHADER
                | vk::PipelineStageFlags::TRANSFER
        }
    }
}

/// Vulkan format for a texture format
pub(crate) fn texture_format_to_vk(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        TextureFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        TextureFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        TextureFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "vulkan_state_tests.rs"]
mod tests;
