/// MaterialTextures - per-material texture slots and their shared-table range
///
/// A material references its textures by shader slot. Before first use the
/// staged views are copied into the shared descriptor table as one
/// contiguous run, in slot order, and the material keeps only the GPU
/// handle of the first slot of that run.

use crate::device::{CpuDescriptor, GpuDescriptor};
use crate::error::{Error, Result};
use crate::resource::context::ResourceContext;

/// Slot-ordered texture set of one material
#[derive(Debug, Default)]
pub struct MaterialTextures {
    /// (shader slot, staged view), kept sorted by slot
    entries: Vec<(u32, CpuDescriptor)>,
    /// First slot of the finalized shared-table range
    first_handle: Option<GpuDescriptor>,
}

impl MaterialTextures {
    /// Create an empty texture set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a staged texture view at `slot`
    ///
    /// Slots are kept in ascending order and must be unique; adding after
    /// finalization is rejected because the copied range cannot grow.
    ///
    /// # Arguments
    ///
    /// * `slot` - Shader-side texture slot
    /// * `descriptor` - Staged view from `ResourceContext::create_texture`
    pub fn add(&mut self, slot: u32, descriptor: CpuDescriptor) -> Result<()> {
        if self.first_handle.is_some() {
            return Err(Error::InvalidResource(
                "material texture set is already finalized".to_string(),
            ));
        }
        match self.entries.binary_search_by_key(&slot, |(s, _)| *s) {
            Ok(_) => Err(Error::InvalidResource(format!(
                "texture slot {} is already occupied",
                slot
            ))),
            Err(position) => {
                self.entries.insert(position, (slot, descriptor));
                Ok(())
            }
        }
    }

    /// Copy the set into the shared table and return the range's first handle
    ///
    /// Issues one single-descriptor copy per texture, consecutively and in
    /// slot order, so the resulting table range is contiguous. Idempotent:
    /// once finalized the stored handle is returned unchanged.
    ///
    /// # Arguments
    ///
    /// * `context` - The context owning the staged views and the shared table
    pub fn finalize(&mut self, context: &mut ResourceContext) -> Result<GpuDescriptor> {
        if let Some(handle) = self.first_handle {
            return Ok(handle);
        }
        if self.entries.is_empty() {
            return Err(Error::InvalidResource(
                "material has no textures to finalize".to_string(),
            ));
        }

        let mut first = None;
        for (_, descriptor) in &self.entries {
            let handle = context.copy_descriptors_into_shared_heap(*descriptor, 1)?;
            if first.is_none() {
                first = Some(handle);
            }
        }

        self.first_handle = first;
        // `first` is set: entries was checked non-empty above
        self.first_handle.ok_or_else(|| {
            Error::InvalidResource("material finalization produced no handle".to_string())
        })
    }

    /// First slot of the finalized range, if finalized
    pub fn first_handle(&self) -> Option<GpuDescriptor> {
        self.first_handle
    }

    /// Whether the set has been copied into the shared table
    pub fn is_finalized(&self) -> bool {
        self.first_handle.is_some()
    }

    /// Number of textures in the set
    pub fn texture_count(&self) -> usize {
        self.entries.len()
    }

    /// Occupied shader slots, ascending
    pub fn slots(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|(slot, _)| *slot)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
