/// Mock device - software implementation of the device traits (no GPU required)
///
/// The mock device keeps every resource in host memory and executes recorded
/// copy/transition commands when a command list is submitted, so upload
/// round-trips, resource states and descriptor bookkeeping are observable
/// from tests. It is also the reference for how the trait contracts are
/// meant to behave.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use crate::device::{
    Buffer, BufferDesc, BufferId, CommandAllocator, CommandList, CommandQueue, CpuDescriptor,
    DescriptorHeap, DescriptorHeapDesc, DescriptorHeapId, Fence, GpuDescriptor, GraphicsDevice,
    HeapKind, ResourceState, Texture, TextureDesc, TextureId, TextureInfo,
};
use crate::error::{Error, Result};

// ============================================================================
// Central state
// ============================================================================

/// Contents of one descriptor slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockSlot {
    /// Nothing written yet
    Empty,
    /// Constant-buffer view over a span of a buffer
    ConstantView {
        buffer: BufferId,
        offset: u64,
        size_in_bytes: u64,
    },
    /// Shader-resource view of a texture
    TextureView { texture: TextureId },
}

struct BufferRecord {
    data: Vec<u8>,
    heap: HeapKind,
    state: ResourceState,
}

struct TextureRecord {
    info: TextureInfo,
    #[allow(dead_code)]
    pixels: Vec<u8>,
}

struct HeapRecord {
    slots: Vec<MockSlot>,
}

#[derive(Default)]
struct MockStateInner {
    buffers: FxHashMap<u64, BufferRecord>,
    textures: FxHashMap<u64, TextureRecord>,
    heaps: FxHashMap<u32, HeapRecord>,
    next_resource_id: u64,
    next_heap_id: u32,
    executions: u64,
}

type MockState = Arc<Mutex<MockStateInner>>;

// ============================================================================
// Mock buffer
// ============================================================================

pub struct MockBuffer {
    state: MockState,
    id: BufferId,
    size: u64,
    heap: HeapKind,
}

impl Buffer for MockBuffer {
    fn id(&self) -> BufferId {
        self.id
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn heap(&self) -> HeapKind {
        self.heap
    }

    fn state(&self) -> ResourceState {
        let inner = self.state.lock().unwrap();
        inner.buffers[&self.id.raw()].state
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        if self.heap != HeapKind::Upload {
            return Err(Error::InvalidResource(
                "buffer is not CPU-accessible".to_string(),
            ));
        }
        if offset + data.len() as u64 > self.size {
            return Err(Error::InvalidResource(format!(
                "write of {} bytes at offset {} exceeds buffer size {}",
                data.len(),
                offset,
                self.size
            )));
        }
        let mut inner = self.state.lock().unwrap();
        let record = inner.buffers.get_mut(&self.id.raw()).unwrap();
        record.data[offset as usize..offset as usize + data.len()].copy_from_slice(data);
        Ok(())
    }

    // Readback works for every heap here; that is the harness capability
    // real backends only offer for mappable memory.
    fn read(&self, offset: u64, out: &mut [u8]) -> Result<()> {
        if offset + out.len() as u64 > self.size {
            return Err(Error::InvalidResource(format!(
                "read of {} bytes at offset {} exceeds buffer size {}",
                out.len(),
                offset,
                self.size
            )));
        }
        let inner = self.state.lock().unwrap();
        let record = &inner.buffers[&self.id.raw()];
        out.copy_from_slice(&record.data[offset as usize..offset as usize + out.len()]);
        Ok(())
    }
}

// ============================================================================
// Mock texture
// ============================================================================

pub struct MockTexture {
    id: TextureId,
    info: TextureInfo,
}

impl Texture for MockTexture {
    fn id(&self) -> TextureId {
        self.id
    }

    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

// ============================================================================
// Mock fence
// ============================================================================

pub struct MockFence {
    completed: AtomicU64,
}

impl Fence for MockFence {
    fn completed_value(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    // The mock queue completes signals immediately, so a wait that is not
    // yet satisfied can never become satisfied: report it as a bug in the
    // caller's submission ordering instead of hanging the test.
    fn wait(&self, value: u64) -> Result<()> {
        if self.completed_value() < value {
            return Err(Error::BackendError(format!(
                "waiting for fence value {} which was never signaled",
                value
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Mock command allocator / command list
// ============================================================================

#[derive(Default)]
pub struct MockCommandAllocator;

impl CommandAllocator for MockCommandAllocator {
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum RecordedOp {
    CopyBuffer { src: BufferId, dst: BufferId },
    Transition {
        buffer: BufferId,
        from: ResourceState,
        to: ResourceState,
    },
}

pub struct MockCommandList {
    ops: Vec<RecordedOp>,
    recording: bool,
}

impl CommandList for MockCommandList {
    fn is_recording(&self) -> bool {
        self.recording
    }

    fn close(&mut self) -> Result<()> {
        if !self.recording {
            return Err(Error::BackendError(
                "command list already closed".to_string(),
            ));
        }
        self.recording = false;
        Ok(())
    }

    fn reset(&mut self, _allocator: &mut dyn CommandAllocator) -> Result<()> {
        self.ops.clear();
        self.recording = true;
        Ok(())
    }

    fn copy_buffer(&mut self, src: &dyn Buffer, dst: &dyn Buffer) -> Result<()> {
        if !self.recording {
            return Err(Error::BackendError("command list not recording".to_string()));
        }
        if src.size() != dst.size() {
            return Err(Error::InvalidResource(format!(
                "full-buffer copy requires equal sizes (src {} bytes, dst {} bytes)",
                src.size(),
                dst.size()
            )));
        }
        self.ops.push(RecordedOp::CopyBuffer {
            src: src.id(),
            dst: dst.id(),
        });
        Ok(())
    }

    fn transition_buffer(
        &mut self,
        buffer: &dyn Buffer,
        from: ResourceState,
        to: ResourceState,
    ) -> Result<()> {
        if !self.recording {
            return Err(Error::BackendError("command list not recording".to_string()));
        }
        self.ops.push(RecordedOp::Transition {
            buffer: buffer.id(),
            from,
            to,
        });
        Ok(())
    }
}

// ============================================================================
// Mock queue
// ============================================================================

pub struct MockQueue {
    state: MockState,
}

impl CommandQueue for MockQueue {
    fn execute(&self, list: &mut dyn CommandList) -> Result<()> {
        if list.is_recording() {
            return Err(Error::InvalidResource(
                "command list must be closed before execution".to_string(),
            ));
        }

        // Lists handed to this queue were created by this device
        let list = unsafe { &mut *(list as *mut dyn CommandList as *mut MockCommandList) };

        let mut inner = self.state.lock().unwrap();
        for op in &list.ops {
            match *op {
                RecordedOp::CopyBuffer { src, dst } => {
                    let bytes = inner
                        .buffers
                        .get(&src.raw())
                        .ok_or_else(|| {
                            Error::InvalidResource("copy source buffer was destroyed".to_string())
                        })?
                        .data
                        .clone();
                    let record = inner.buffers.get_mut(&dst.raw()).ok_or_else(|| {
                        Error::InvalidResource("copy destination buffer was destroyed".to_string())
                    })?;
                    if record.state != ResourceState::CopyDest {
                        return Err(Error::BackendError(format!(
                            "copy destination is in state {:?}, expected CopyDest",
                            record.state
                        )));
                    }
                    record.data = bytes;
                }
                RecordedOp::Transition { buffer, from, to } => {
                    let record = inner.buffers.get_mut(&buffer.raw()).ok_or_else(|| {
                        Error::InvalidResource("transitioned buffer was destroyed".to_string())
                    })?;
                    if record.state != from {
                        return Err(Error::BackendError(format!(
                            "transition expected state {:?} but buffer is in {:?}",
                            from, record.state
                        )));
                    }
                    record.state = to;
                }
            }
        }
        inner.executions += 1;
        Ok(())
    }

    fn signal(&self, fence: &dyn Fence, value: u64) -> Result<()> {
        // Fences handed to this queue were created by this device
        let fence = unsafe { &*(fence as *const dyn Fence as *const MockFence) };
        // The mock GPU is always caught up: completion is immediate
        fence.completed.fetch_max(value, Ordering::AcqRel);
        Ok(())
    }
}

// ============================================================================
// Mock descriptor heap
// ============================================================================

pub struct MockDescriptorHeap {
    state: MockState,
    id: DescriptorHeapId,
    capacity: u32,
    shader_visible: bool,
}

impl MockDescriptorHeap {
    fn check_index(&self, index: u32) -> Result<()> {
        if index >= self.capacity {
            return Err(Error::InvalidResource(format!(
                "descriptor index {} out of range (capacity {})",
                index, self.capacity
            )));
        }
        Ok(())
    }
}

impl DescriptorHeap for MockDescriptorHeap {
    fn id(&self) -> DescriptorHeapId {
        self.id
    }

    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn shader_visible(&self) -> bool {
        self.shader_visible
    }

    fn cpu_descriptor(&self, index: u32) -> Result<CpuDescriptor> {
        self.check_index(index)?;
        Ok(CpuDescriptor {
            heap: self.id,
            index,
        })
    }

    fn gpu_descriptor(&self, index: u32) -> Result<GpuDescriptor> {
        if !self.shader_visible {
            return Err(Error::InvalidResource(
                "heap is not shader-visible".to_string(),
            ));
        }
        self.check_index(index)?;
        Ok(GpuDescriptor {
            heap: self.id,
            index,
        })
    }

    fn create_constant_view(
        &self,
        index: u32,
        buffer: &dyn Buffer,
        offset: u64,
        size_in_bytes: u64,
    ) -> Result<()> {
        self.check_index(index)?;
        if size_in_bytes == 0 || size_in_bytes % 256 != 0 {
            return Err(Error::InvalidResource(format!(
                "constant view size {} is not a non-zero multiple of 256",
                size_in_bytes
            )));
        }
        if offset + size_in_bytes > buffer.size() {
            return Err(Error::InvalidResource(format!(
                "constant view [{}, {}) exceeds buffer size {}",
                offset,
                offset + size_in_bytes,
                buffer.size()
            )));
        }
        let mut inner = self.state.lock().unwrap();
        if !inner.buffers.contains_key(&buffer.id().raw()) {
            return Err(Error::InvalidResource(
                "constant view over a destroyed buffer".to_string(),
            ));
        }
        let record = inner.heaps.get_mut(&self.id.raw()).unwrap();
        record.slots[index as usize] = MockSlot::ConstantView {
            buffer: buffer.id(),
            offset,
            size_in_bytes,
        };
        Ok(())
    }

    fn create_texture_view(&self, index: u32, texture: &dyn Texture) -> Result<()> {
        self.check_index(index)?;
        let mut inner = self.state.lock().unwrap();
        if !inner.textures.contains_key(&texture.id().raw()) {
            return Err(Error::InvalidResource(
                "texture view over a destroyed texture".to_string(),
            ));
        }
        let record = inner.heaps.get_mut(&self.id.raw()).unwrap();
        record.slots[index as usize] = MockSlot::TextureView {
            texture: texture.id(),
        };
        Ok(())
    }
}

// ============================================================================
// Mock device
// ============================================================================

/// Software device: every trait implemented against host memory
pub struct MockDevice {
    state: MockState,
    queue: Arc<MockQueue>,
}

impl MockDevice {
    /// Create a new mock device
    pub fn new() -> Self {
        let state: MockState = Arc::new(Mutex::new(MockStateInner::default()));
        let queue = Arc::new(MockQueue {
            state: state.clone(),
        });
        Self { state, queue }
    }

    /// Number of command-list executions submitted so far
    pub fn executions(&self) -> u64 {
        self.state.lock().unwrap().executions
    }

    /// Contents of a descriptor slot, for test assertions
    pub fn heap_slot(&self, heap: DescriptorHeapId, index: u32) -> Option<MockSlot> {
        let inner = self.state.lock().unwrap();
        inner
            .heaps
            .get(&heap.raw())
            .and_then(|record| record.slots.get(index as usize))
            .cloned()
    }

    /// Full contents of a buffer, for test assertions
    pub fn buffer_bytes(&self, buffer: BufferId) -> Option<Vec<u8>> {
        let inner = self.state.lock().unwrap();
        inner.buffers.get(&buffer.raw()).map(|r| r.data.clone())
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockDevice {
    fn create_fence(&self, initial_value: u64) -> Result<Arc<dyn Fence>> {
        Ok(Arc::new(MockFence {
            completed: AtomicU64::new(initial_value),
        }))
    }

    fn create_command_allocator(&self) -> Result<Box<dyn CommandAllocator>> {
        Ok(Box::new(MockCommandAllocator))
    }

    fn create_command_list(
        &self,
        _allocator: &mut dyn CommandAllocator,
    ) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(MockCommandList {
            ops: Vec::new(),
            recording: true,
        }))
    }

    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn Buffer>> {
        if desc.size == 0 {
            return Err(Error::InvalidResource(
                "buffer size must be non-zero".to_string(),
            ));
        }
        let mut inner = self.state.lock().unwrap();
        inner.next_resource_id += 1;
        let id = BufferId::new(inner.next_resource_id);
        inner.buffers.insert(
            id.raw(),
            BufferRecord {
                data: vec![0u8; desc.size as usize],
                heap: desc.heap,
                state: desc.initial_state,
            },
        );
        Ok(Arc::new(MockBuffer {
            state: self.state.clone(),
            id,
            size: desc.size,
            heap: desc.heap,
        }))
    }

    fn create_texture(&self, desc: &TextureDesc, pixels: &[u8]) -> Result<Arc<dyn Texture>> {
        let expected = desc.width as usize
            * desc.height as usize
            * desc.format.bytes_per_pixel() as usize;
        if pixels.len() != expected {
            return Err(Error::InvalidResource(format!(
                "texture data is {} bytes, expected {} for {}x{} {:?}",
                pixels.len(),
                expected,
                desc.width,
                desc.height,
                desc.format
            )));
        }
        let mut inner = self.state.lock().unwrap();
        inner.next_resource_id += 1;
        let id = TextureId::new(inner.next_resource_id);
        let info = TextureInfo {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            mip_levels: desc.mip_levels,
        };
        inner.textures.insert(
            id.raw(),
            TextureRecord {
                info: info.clone(),
                pixels: pixels.to_vec(),
            },
        );
        Ok(Arc::new(MockTexture { id, info }))
    }

    fn create_descriptor_heap(&self, desc: &DescriptorHeapDesc) -> Result<Arc<dyn DescriptorHeap>> {
        if desc.capacity == 0 {
            return Err(Error::InvalidResource(
                "descriptor heap capacity must be non-zero".to_string(),
            ));
        }
        let mut inner = self.state.lock().unwrap();
        inner.next_heap_id += 1;
        let id = DescriptorHeapId::new(inner.next_heap_id);
        inner.heaps.insert(
            id.raw(),
            HeapRecord {
                slots: vec![MockSlot::Empty; desc.capacity as usize],
            },
        );
        Ok(Arc::new(MockDescriptorHeap {
            state: self.state.clone(),
            id,
            capacity: desc.capacity,
            shader_visible: desc.shader_visible,
        }))
    }

    fn copy_descriptors(
        &self,
        dst: &dyn DescriptorHeap,
        dst_index: u32,
        src: &dyn DescriptorHeap,
        src_index: u32,
        count: u32,
    ) -> Result<()> {
        if count == 0 {
            return Err(Error::InvalidResource(
                "descriptor copy count must be non-zero".to_string(),
            ));
        }
        if src_index + count > src.capacity() || dst_index + count > dst.capacity() {
            return Err(Error::InvalidResource(format!(
                "descriptor copy of {} slots out of range (src {}..{}, dst {}..{})",
                count,
                src_index,
                src.capacity(),
                dst_index,
                dst.capacity()
            )));
        }
        let mut inner = self.state.lock().unwrap();
        let copied: Vec<MockSlot> = {
            let src_record = &inner.heaps[&src.id().raw()];
            src_record.slots[src_index as usize..(src_index + count) as usize].to_vec()
        };
        if copied.iter().any(|slot| *slot == MockSlot::Empty) {
            return Err(Error::InvalidResource(
                "copying uninitialized descriptors".to_string(),
            ));
        }
        let dst_record = inner.heaps.get_mut(&dst.id().raw()).unwrap();
        dst_record.slots[dst_index as usize..(dst_index + count) as usize]
            .clone_from_slice(&copied);
        Ok(())
    }

    fn graphics_queue(&self) -> Arc<dyn CommandQueue> {
        self.queue.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;
