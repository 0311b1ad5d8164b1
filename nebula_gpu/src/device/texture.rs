/// Texture trait - GPU image resource

use crate::device::{TextureId, TextureInfo};

/// Texture resource trait
///
/// Implemented by backend-specific texture types. Textures are created
/// fully uploaded (the backend performs its own staging copy) and are
/// immutable afterwards.
pub trait Texture: Send + Sync {
    /// Unique identity of this texture within its device
    fn id(&self) -> TextureId;

    /// Texture dimensions and format
    fn info(&self) -> &TextureInfo;
}
