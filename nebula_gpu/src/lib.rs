/*!
# NebulaGPU

Core traits and types for the NebulaGPU resource residency layer.

This crate is the part of a renderer that touches raw device memory, fences
and descriptor tables directly: it uploads application data (vertex/index
buffers, textures, per-draw constants) to the GPU, tracks when the GPU has
finished with submitted work, and hands out GPU-addressable descriptor
handles for shader binding. Everything above it (scene graph, camera math,
window loop, GUI) is plumbing built on top.

The device is abstracted with trait-based dynamic polymorphism (similar to
C++ virtual inheritance); backend implementations (Vulkan, Direct3D 12,
etc.) live in separate crates. A software `MockDevice` ships here so the
resource layer is fully testable without a GPU.

## Architecture

- **GraphicsDevice**: factory trait for fences, buffers, textures and
  descriptor heaps
- **ResourceContext**: the residency core — fence sync, synchronous
  submission cycle, static upload protocol, constant upload ring, shared
  descriptor table
- **MaterialTextures**: per-material texture slots finalized into one
  contiguous descriptor range
*/

// Internal modules
pub mod error;
pub mod log;
pub mod device;
pub mod resource;

// Main nebula namespace module
pub mod nebula {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{
            set_logger, reset_logger, DefaultLogger, LogEntry, LogSeverity, Logger,
        };
    }

    // Device sub-module with the backend abstraction
    pub mod device {
        pub use crate::device::*;
    }

    // Resource sub-module with the residency core
    pub mod resource {
        pub use crate::resource::*;
    }
}

// Re-export math library at crate root
pub use glam;
