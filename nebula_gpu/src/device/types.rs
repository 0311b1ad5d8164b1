//! Common types shared between device backends

use bitflags::bitflags;

// ============================================================================
// Resource identity
// ============================================================================

/// Unique identity of a buffer within its device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(u64);

impl BufferId {
    /// Create an id from a raw value (backend use)
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Unique identity of a texture within its device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(u64);

impl TextureId {
    /// Create an id from a raw value (backend use)
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Unique identity of a descriptor heap within its device
///
/// Part of every descriptor handle so a handle minted by one heap can never
/// be spent against another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorHeapId(u32);

impl DescriptorHeapId {
    /// Create an id from a raw value (backend use)
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

// ============================================================================
// Descriptor handles
// ============================================================================

/// Handle to a descriptor slot in a CPU-only (non-shader-visible) heap
///
/// CPU descriptors exist so views can be created and staged before being
/// copied into a shader-visible heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuDescriptor {
    /// Heap the slot belongs to
    pub heap: DescriptorHeapId,
    /// Slot index within the heap
    pub index: u32,
}

/// Handle to a descriptor slot in a shader-visible heap
///
/// This is what shader stages bind; two handles are equal exactly when they
/// name the same slot of the same heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuDescriptor {
    /// Heap the slot belongs to
    pub heap: DescriptorHeapId,
    /// Slot index within the heap
    pub index: u32,
}

// ============================================================================
// Buffers
// ============================================================================

bitflags! {
    /// Buffer usage flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BufferUsage: u32 {
        /// Vertex buffer
        const VERTEX = 1 << 0;
        /// Index buffer
        const INDEX = 1 << 1;
        /// Constant/uniform buffer
        const CONSTANT = 1 << 2;
        /// Source of copy commands
        const COPY_SRC = 1 << 3;
        /// Destination of copy commands
        const COPY_DST = 1 << 4;
    }
}

/// Memory heap a buffer lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapKind {
    /// Device-local memory, not CPU-mappable
    Default,
    /// Host-visible upload memory, persistently mappable
    Upload,
}

/// Logical state of a buffer resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// Destination of copy commands
    CopyDest,
    /// Readable by any shader stage and by copy sources
    GenericRead,
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    /// Heap the buffer is placed in
    pub heap: HeapKind,
    /// Buffer usage
    pub usage: BufferUsage,
    /// State the buffer is created in
    pub initial_state: ResourceState,
}

// ============================================================================
// Textures
// ============================================================================

/// Texture format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
}

impl TextureFormat {
    /// Size in bytes of one pixel in this format
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::R8G8B8A8_SRGB
            | TextureFormat::R8G8B8A8_UNORM
            | TextureFormat::B8G8R8A8_SRGB
            | TextureFormat::B8G8R8A8_UNORM => 4,
        }
    }
}

/// Descriptor for creating a texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Number of mip levels
    pub mip_levels: u32,
}

impl Default for TextureDesc {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            format: TextureFormat::R8G8B8A8_UNORM,
            mip_levels: 1,
        }
    }
}

/// Information about a created texture
#[derive(Debug, Clone)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub mip_levels: u32,
}

// ============================================================================
// Descriptor heaps
// ============================================================================

/// Descriptor for creating a descriptor heap
#[derive(Debug, Clone)]
pub struct DescriptorHeapDesc {
    /// Number of descriptor slots; fixed for the heap's lifetime
    pub capacity: u32,
    /// Shader-visible heaps can be bound for GPU access; non-shader-visible
    /// heaps exist only as CPU-side staging for descriptor copies
    pub shader_visible: bool,
}

// ============================================================================
// Device configuration
// ============================================================================

/// Device configuration
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "NebulaGPU Application".to_string(),
            app_version: (1, 0, 0),
        }
    }
}
