//! Stream abstraction (§5, §6): this crate's stand-in for the spec's opaque
//! device-queue handle. A `Stream` owns one `wgpu::CommandEncoder` recording
//! commands for a single build call plus the `wgpu::Queue` they eventually
//! submit on.

use crate::error::{BuildError, BuildResult};

pub struct Stream<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    encoder: wgpu::CommandEncoder,
}

impl<'a> Stream<'a> {
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue, label: &str) -> Self {
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(label),
        });
        Self {
            device,
            queue,
            encoder,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        self.device
    }

    pub fn encoder_mut(&mut self) -> &mut wgpu::CommandEncoder {
        &mut self.encoder
    }

    /// Submit everything recorded so far and start a fresh encoder, keeping
    /// the same logical stream alive across the submission (§5: "all writes
    /// issued on a stream are visible to subsequent work on the same
    /// stream").
    pub fn flush(&mut self) {
        let encoder = std::mem::replace(
            &mut self.encoder,
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None }),
        );
        self.queue.submit(Some(encoder.finish()));
    }

    /// Flush, then block until the device has caught up (§5's "synchronizes
    /// at the BFS loop boundary" / "first state download after fill/finish").
    pub fn sync(&mut self) {
        self.flush();
        self.device.poll(wgpu::Maintain::Wait);
    }

    /// Copy the first `n` elements of `buffer` into a freshly-allocated
    /// `MAP_READ` staging buffer and read them back as `Vec<T>`, blocking
    /// until the map completes. Storage buffers aren't directly mappable,
    /// so every host readback this crate performs (centroid bounds,
    /// `numValidPrims`, the BFS allocation counter, the sorted key/primID
    /// arrays, the finished temp-node array) goes through this
    /// staging-buffer round trip — the same `bounds_staging` pattern the
    /// quadtree builder in this crate's reference pack uses for its own
    /// bounds readback.
    pub fn read_n<T: bytemuck::Pod>(&mut self, buffer: &wgpu::Buffer, n: usize) -> BuildResult<Vec<T>> {
        let size = (n * std::mem::size_of::<T>()) as u64;
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lbvh readback staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.encoder
            .copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.sync();

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        self.device.poll(wgpu::Maintain::Wait);
        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(BuildError::BufferMap(e.to_string())),
            Err(_) => return Err(BuildError::BufferMap("map_async channel closed".into())),
        }
        let data = slice.get_mapped_range();
        let values: Vec<T> = bytemuck::cast_slice(&data[..size as usize]).to_vec();
        drop(data);
        staging.unmap();
        Ok(values)
    }

    /// Single-value convenience wrapper over [`Self::read_n`].
    pub fn read_buffer<T: bytemuck::Pod>(&mut self, buffer: &wgpu::Buffer) -> BuildResult<T> {
        Ok(self.read_n::<T>(buffer, 1)?.remove(0))
    }
}
