/// Device module - backend abstraction traits and shared types

// Module declarations
pub mod types;
pub mod buffer;
pub mod texture;
pub mod command_list;
pub mod sync;
pub mod descriptor_heap;
pub mod graphics_device;

// Mock device for tests and headless use (no GPU required)
pub mod mock_device;

// Re-export everything from types.rs
pub use types::*;

// Re-export from trait modules
pub use buffer::*;
pub use texture::*;
pub use command_list::*;
pub use sync::*;
pub use descriptor_heap::*;
pub use graphics_device::*;
