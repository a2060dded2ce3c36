//! Orchestrating driver (§6 "Core entry point").
//!
//! Two build paths live here:
//!
//! - [`build_reference`] is a plain host-side implementation of the whole
//!   pipeline (quantize → compact → sort → BFS expand → final nodes →
//!   refit) operating on in-memory slices. It is what this crate's
//!   property and end-to-end scenario tests (§8) exercise, since a test
//!   environment can't assume a GPU adapter is present.
//! - [`Builder`] is the actual `build(bvh_out, boxes_in, N, config, stream,
//!   memoryResource)` entry point §6 describes, dispatching the compute
//!   pipelines in `shaders.rs` against a real `wgpu::Device`. Its kernels
//!   implement the identical algorithm `build_reference` runs on the host;
//!   it just can't be exercised without a device, so it is not covered by
//!   `#[cfg(test)]` here the way the reference path is.

use std::borrow::Cow;

use rayon::prelude::*;

use crate::aabb::{Aabb3, AabbGpu};
use crate::bfs;
use crate::bvh::Bvh;
use crate::config::BuildConfig;
use crate::error::{BuildError, BuildResult};
use crate::memory::MemoryResource;
use crate::morton::encode_3d;
use crate::node::BvhNode;
use crate::quantizer::QuantizerParams;
use crate::refit::refit;
use crate::sort::{sort_pairs, KeyedPrimitive};
use crate::stream::Stream;

/// A primitive's AABB is a candidate for compaction (treated as empty) if
/// it's non-finite or its lower corner exceeds its upper corner (§7
/// "Non-finite input").
fn primitive_is_valid(b: &Aabb3) -> bool {
    b.is_finite() && !b.is_empty()
}

/// Host-side reference implementation of the full build pipeline (§2's
/// "Data flow"). See the module doc comment for why this exists alongside
/// [`Builder`].
pub fn build_reference(boxes: &[Aabb3], config: BuildConfig) -> Bvh {
    // Mirrors `hlbvh.rs`'s use of `rayon` to fan the per-primitive Fill
    // pass (here, the centroid-bounds reduction) out across threads rather
    // than a plain sequential loop.
    let centroid_bounds = boxes
        .par_iter()
        .filter(|b| primitive_is_valid(b))
        .fold(Aabb3::empty, |mut acc, b| {
            acc.include_point(b.center());
            acc
        })
        .reduce(Aabb3::empty, |mut a, b| {
            a.include_aabb(&b);
            a
        });

    if centroid_bounds.is_empty() {
        // §7 degenerate input: every primitive empty.
        let nodes = vec![BvhNode::pack(0, 0)];
        let aabbs = vec![Aabb3::empty()];
        return Bvh {
            nodes,
            aabbs,
            prim_ids: Vec::new(),
            num_nodes: 1,
            num_prims: 0,
        };
    }

    let quantizer = QuantizerParams::from_centroid_bounds(&centroid_bounds);

    let mut pairs: Vec<KeyedPrimitive> = boxes
        .par_iter()
        .enumerate()
        .filter(|(_, b)| primitive_is_valid(b))
        .map(|(i, b)| {
            let (qx, qy, qz) = quantizer.quantize(b.center());
            KeyedPrimitive::new(encode_3d(qx, qy, qz), i as u32)
        })
        .collect();

    sort_pairs(&mut pairs);

    let v = pairs.len() as u32;
    let keys: Vec<u64> = pairs.iter().map(|p| p.key).collect();
    let prim_ids: Vec<u32> = pairs.iter().map(|p| p.prim_id).collect();

    let leaf_threshold = config.resolved_leaf_threshold();
    let temp_nodes = bfs::expand(&keys, v, leaf_threshold);
    let nodes: Vec<BvhNode> = temp_nodes.into_iter().map(BvhNode::from).collect();

    let mut aabbs = vec![Aabb3::empty(); nodes.len()];
    refit(&nodes, &mut aabbs, &prim_ids, boxes);

    Bvh {
        num_nodes: nodes.len() as u32,
        num_prims: v,
        nodes,
        aabbs,
        prim_ids,
    }
}

/// Uniform payload matching `shaders.rs::BFS_EXPAND_SHADER`'s `LevelRange`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Zeroable, bytemuck::Pod)]
struct LevelRange {
    begin: u32,
    end: u32,
    leaf_threshold: u32,
    _pad: u32,
}

/// GPU-dispatching builder (§6). Owns the compiled pipelines and the pinned
/// state-readback buffer across calls, per §5's "pinned memory reused
/// across calls to avoid re-registration".
pub struct Builder<M: MemoryResource> {
    memory: M,
    clear_fill_pipeline: wgpu::ComputePipeline,
    producer_pipeline: wgpu::ComputePipeline,
    bfs_pipeline: wgpu::ComputePipeline,
    final_node_pipeline: wgpu::ComputePipeline,
}

const WORKGROUP_SIZE: u32 = 256;

fn dispatch_count(n: u32) -> u32 {
    (n + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE
}

fn make_pipeline(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    entry_point: &str,
) -> wgpu::ComputePipeline {
    let full_source = format!(
        "{}\n{}\n{}",
        crate::shaders::COMMON_STRUCTS,
        crate::shaders::BUILD_STATE_COMMON,
        source
    );
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(full_source)),
    });
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: None,
        module: &module,
        entry_point,
    })
}

impl<M: MemoryResource> Builder<M> {
    pub fn new(device: &wgpu::Device, memory: M) -> Self {
        // The producer and BFS kernels additionally need the Morton helpers;
        // folded in here rather than into `make_pipeline` so the clear/fill
        // and final-node passes don't pay for unused WGSL functions.
        let morton_and_common = format!(
            "{}\n{}\n{}",
            crate::shaders::COMMON_STRUCTS,
            crate::shaders::BUILD_STATE_COMMON,
            crate::shaders::MORTON_COMMON
        );

        let clear_fill_pipeline =
            make_pipeline(device, "lbvh clear+fill", crate::shaders::CLEAR_FILL_SHADER, "clear_fill");

        let producer_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lbvh producer"),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(format!(
                "{morton_and_common}\n{}",
                crate::shaders::PRODUCER_SHADER
            ))),
        });
        let producer_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("lbvh producer"),
            layout: None,
            module: &producer_module,
            entry_point: "produce",
        });

        let bfs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lbvh bfs expand"),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(format!(
                "{morton_and_common}\n{}",
                crate::shaders::BFS_EXPAND_SHADER
            ))),
        });
        let bfs_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("lbvh bfs expand"),
            layout: None,
            module: &bfs_module,
            entry_point: "bfs_expand",
        });

        let final_node_pipeline = make_pipeline(
            device,
            "lbvh final nodes",
            crate::shaders::FINAL_NODE_SHADER,
            "write_final",
        );

        Self {
            memory,
            clear_fill_pipeline,
            producer_pipeline,
            bfs_pipeline,
            final_node_pipeline,
        }
    }

    /// §6's `build(bvh_out, boxes_in, N, config, stream, memoryResource)`,
    /// with `bvh_out` as the return value and `stream`/`memoryResource`
    /// folded into `self`/the `stream` parameter the way an idiomatic Rust
    /// port of that C-shaped signature would.
    pub fn build(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        boxes: &[AabbGpu],
        config: BuildConfig,
    ) -> BuildResult<Bvh> {
        let n = boxes.len() as u32;
        if n == 0 {
            return Ok(Bvh {
                nodes: vec![BvhNode::pack(0, 0)],
                aabbs: vec![Aabb3::empty()],
                prim_ids: Vec::new(),
                num_nodes: 1,
                num_prims: 0,
            });
        }

        let mut stream = Stream::new(device, queue, "lbvh build");

        let boxes_buf = self.upload(device, queue, bytemuck::cast_slice(boxes), "boxes")?;
        let state_buf = self.alloc(device, &stream, 32, "build state")?;
        queue.write_buffer(
            &state_buf.buffer,
            0,
            bytemuck::bytes_of(&crate::build_state::BuildStateGpu::cleared(n)),
        );

        self.dispatch_clear_fill(device, &mut stream, &boxes_buf.buffer, &state_buf.buffer, n);

        let state_after_fill: crate::build_state::BuildStateGpu =
            stream.read_buffer(&state_buf.buffer)?;
        let centroid_bounds = state_after_fill.finish();
        if centroid_bounds.is_empty() {
            self.memory.free(boxes_buf, &stream);
            self.memory.free(state_buf, &stream);
            return Ok(Bvh {
                nodes: vec![BvhNode::pack(0, 0)],
                aabbs: vec![Aabb3::empty()],
                prim_ids: Vec::new(),
                num_nodes: 1,
                num_prims: 0,
            });
        }
        let quantizer = QuantizerParams::from_centroid_bounds(&centroid_bounds);

        let prim_ids_buf = self.alloc(device, &stream, (n as u64) * 4, "prim ids")?;
        let keys_buf = self.alloc(device, &stream, (n as u64) * 8, "keys")?;

        self.dispatch_producer(
            device,
            queue,
            &mut stream,
            &boxes_buf.buffer,
            &state_buf.buffer,
            &quantizer,
            &prim_ids_buf.buffer,
            &keys_buf.buffer,
            n,
        );

        let state_after_producer: crate::build_state::BuildStateGpu =
            stream.read_buffer(&state_buf.buffer)?;
        let v = state_after_producer.valid_count.max(0) as u32;

        // The sort interface (§4.4) operates over a V-length slice of the
        // device key/primID arrays; this reference-driver reads them back,
        // sorts on the host with the same `rdst` adapter `sort.rs` uses for
        // the CPU path, and writes the sorted arrays back, rather than
        // running `rdst` as a third shader (it is a CPU crate).
        let mut keys_host: Vec<u64> = stream.read_n(&keys_buf.buffer, n as usize)?;
        let mut prim_ids_host: Vec<u32> = stream.read_n(&prim_ids_buf.buffer, n as usize)?;
        keys_host.truncate(v as usize);
        prim_ids_host.truncate(v as usize);
        let mut pairs: Vec<KeyedPrimitive> = keys_host
            .into_iter()
            .zip(prim_ids_host)
            .map(|(k, p)| KeyedPrimitive::new(k, p))
            .collect();
        sort_pairs(&mut pairs);
        let sorted_keys: Vec<u64> = pairs.iter().map(|p| p.key).collect();
        let sorted_prim_ids: Vec<u32> = pairs.iter().map(|p| p.prim_id).collect();
        queue.write_buffer(&keys_buf.buffer, 0, bytemuck::cast_slice(&sorted_keys));
        queue.write_buffer(&prim_ids_buf.buffer, 0, bytemuck::cast_slice(&sorted_prim_ids));

        let leaf_threshold = config.resolved_leaf_threshold();
        let capacity = (2 * v.max(1)) as u64;
        let temp_nodes_buf = self.alloc(
            device,
            &stream,
            capacity * std::mem::size_of::<crate::temp_node::TempNode>() as u64,
            "temp nodes",
        )?;
        queue.write_buffer(
            &temp_nodes_buf.buffer,
            0,
            bytemuck::bytes_of(&crate::temp_node::TempNode::open(0, v)),
        );
        queue.write_buffer(
            &state_buf.buffer,
            std::mem::size_of::<[i32; 6]>() as u64 + std::mem::size_of::<i32>() as u64,
            bytemuck::bytes_of(&1u32),
        );

        let mut processed: u32 = 0;
        loop {
            let state: crate::build_state::BuildStateGpu = stream.read_buffer(&state_buf.buffer)?;
            let alloc_count = state.alloc_count;
            if processed >= alloc_count {
                break;
            }
            self.dispatch_bfs_level(
                device,
                queue,
                &mut stream,
                &keys_buf.buffer,
                &temp_nodes_buf.buffer,
                &state_buf.buffer,
                processed,
                alloc_count,
                leaf_threshold,
            );
            processed = alloc_count;
        }

        let final_state: crate::build_state::BuildStateGpu = stream.read_buffer(&state_buf.buffer)?;
        let m = final_state.alloc_count.max(1);

        let final_nodes_buf = self.alloc(device, &stream, (m as u64) * 4, "final nodes")?;
        self.dispatch_final_nodes(device, &mut stream, &temp_nodes_buf.buffer, &final_nodes_buf.buffer, m);

        let temp_nodes_host: Vec<crate::temp_node::TempNode> =
            stream.read_n(&temp_nodes_buf.buffer, m as usize)?;
        let nodes: Vec<BvhNode> = temp_nodes_host.into_iter().map(BvhNode::from).collect();

        let boxes_host: Vec<Aabb3> = boxes.iter().map(|&b| b.into()).collect();
        let mut aabbs = vec![Aabb3::empty(); nodes.len()];
        refit(&nodes, &mut aabbs, &sorted_prim_ids, &boxes_host);

        self.memory.free(boxes_buf, &stream);
        self.memory.free(state_buf, &stream);
        self.memory.free(prim_ids_buf, &stream);
        self.memory.free(keys_buf, &stream);
        self.memory.free(temp_nodes_buf, &stream);
        self.memory.free(final_nodes_buf, &stream);

        Ok(Bvh {
            num_nodes: nodes.len() as u32,
            num_prims: v,
            nodes,
            aabbs,
            prim_ids: sorted_prim_ids,
        })
    }

    fn upload(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
        label: &str,
    ) -> BuildResult<crate::memory::DeviceAlloc> {
        let stream = Stream::new(device, queue, label);
        let alloc = self.memory.allocate(device, data.len() as u64, label, &stream)?;
        queue.write_buffer(&alloc.buffer, 0, data);
        Ok(alloc)
    }

    fn alloc(
        &self,
        device: &wgpu::Device,
        stream: &Stream,
        nbytes: u64,
        label: &str,
    ) -> BuildResult<crate::memory::DeviceAlloc> {
        if nbytes == 0 {
            return Err(BuildError::Allocation { requested_bytes: 0 });
        }
        self.memory.allocate(device, nbytes, label, stream)
    }

    fn dispatch_clear_fill(
        &self,
        device: &wgpu::Device,
        stream: &mut Stream,
        boxes: &wgpu::Buffer,
        state: &wgpu::Buffer,
        n: u32,
    ) {
        let layout = self.clear_fill_pipeline.get_bind_group_layout(0);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lbvh clear+fill bind group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: boxes.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: state.as_entire_binding(),
                },
            ],
        });
        let mut pass = stream
            .encoder_mut()
            .begin_compute_pass(&wgpu::ComputePassDescriptor { label: None, timestamp_writes: None });
        pass.set_pipeline(&self.clear_fill_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(dispatch_count(n), 1, 1);
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch_producer(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        stream: &mut Stream,
        boxes: &wgpu::Buffer,
        state: &wgpu::Buffer,
        quantizer: &QuantizerParams,
        prim_ids: &wgpu::Buffer,
        keys: &wgpu::Buffer,
        n: u32,
    ) {
        // 2 x vec3<f32> padded to 16 bytes each, matching COMMON_STRUCTS's
        // `QuantizerParams` WGSL layout (bias, pad, scale, pad) — wider than
        // the host-side `QuantizerParams`, which has no padding since it
        // never crosses the host/device boundary as raw bytes elsewhere.
        let quantizer_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quantizer params"),
            size: 32,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bytes: [f32; 8] = [
            quantizer.bias.0,
            quantizer.bias.1,
            quantizer.bias.2,
            0.0,
            quantizer.scale.0,
            quantizer.scale.1,
            quantizer.scale.2,
            0.0,
        ];
        queue.write_buffer(&quantizer_buf, 0, bytemuck::cast_slice(&bytes));

        let layout = self.producer_pipeline.get_bind_group_layout(0);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lbvh producer bind group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: boxes.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: state.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: quantizer_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: prim_ids.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: keys.as_entire_binding(),
                },
            ],
        });
        let mut pass = stream
            .encoder_mut()
            .begin_compute_pass(&wgpu::ComputePassDescriptor { label: None, timestamp_writes: None });
        pass.set_pipeline(&self.producer_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(dispatch_count(n), 1, 1);
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch_bfs_level(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        stream: &mut Stream,
        keys: &wgpu::Buffer,
        nodes: &wgpu::Buffer,
        state: &wgpu::Buffer,
        begin: u32,
        end: u32,
        leaf_threshold: u32,
    ) {
        let level_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bfs level range"),
            size: std::mem::size_of::<LevelRange>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let level = LevelRange {
            begin,
            end,
            leaf_threshold,
            _pad: 0,
        };
        queue.write_buffer(&level_buf, 0, bytemuck::bytes_of(&level));

        let layout = self.bfs_pipeline.get_bind_group_layout(0);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lbvh bfs bind group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: keys.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: nodes.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: state.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: level_buf.as_entire_binding(),
                },
            ],
        });
        let mut pass = stream
            .encoder_mut()
            .begin_compute_pass(&wgpu::ComputePassDescriptor { label: None, timestamp_writes: None });
        pass.set_pipeline(&self.bfs_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(dispatch_count(end - begin), 1, 1);
    }

    fn dispatch_final_nodes(
        &self,
        device: &wgpu::Device,
        stream: &mut Stream,
        temp_nodes: &wgpu::Buffer,
        final_nodes: &wgpu::Buffer,
        m: u32,
    ) {
        let layout = self.final_node_pipeline.get_bind_group_layout(0);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lbvh final node bind group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: temp_nodes.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: final_nodes.as_entire_binding(),
                },
            ],
        });
        let mut pass = stream
            .encoder_mut()
            .begin_compute_pass(&wgpu::ComputePassDescriptor { label: None, timestamp_writes: None });
        pass.set_pipeline(&self.final_node_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(dispatch_count(m), 1, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vec3f32;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64;

    fn aabb(lx: f32, ly: f32, lz: f32, ux: f32, uy: f32, uz: f32) -> Aabb3 {
        Aabb3::new(Vec3f32(lx, ly, lz), Vec3f32(ux, uy, uz))
    }

    /// Scenario 1: Singleton.
    #[test]
    fn singleton() {
        let boxes = vec![aabb(0.0, 0.0, 0.0, 1.0, 1.0, 1.0)];
        let bvh = build_reference(&boxes, BuildConfig::default());
        assert_eq!(bvh.num_prims, 1);
        assert_eq!(bvh.num_nodes, 1);
        assert_eq!(bvh.nodes[0].offset(), 0);
        assert_eq!(bvh.nodes[0].count(), 1);
        assert_eq!(bvh.prim_ids[0], 0);
    }

    /// Scenario 2: Two well-separated points.
    #[test]
    fn two_well_separated_points() {
        let boxes = vec![
            aabb(0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            aabb(1.0, 1.0, 1.0, 1.0, 1.0, 1.0),
        ];
        let bvh = build_reference(&boxes, BuildConfig::new(1, 1));
        assert_eq!(bvh.num_nodes, 3);
        assert!(bvh.nodes[0].is_internal());
        assert_eq!(bvh.nodes[0].children(), (1, 2));
        assert!(bvh.nodes[1].is_leaf());
        assert!(bvh.nodes[2].is_leaf());
    }

    /// Scenario 3: Empty filtered out.
    #[test]
    fn empty_filtered_out() {
        let boxes = vec![
            aabb(0.0, 0.0, 0.0, 1.0, 1.0, 1.0),
            aabb(1.0, 1.0, 1.0, 0.0, 0.0, 0.0), // degenerate: empty
            aabb(2.0, 2.0, 2.0, 3.0, 3.0, 3.0),
        ];
        let bvh = build_reference(&boxes, BuildConfig::default());
        assert_eq!(bvh.num_prims, 2);
        assert!(!bvh.prim_ids.contains(&1));
        assert!(bvh.prim_ids.contains(&0));
        assert!(bvh.prim_ids.contains(&2));
    }

    /// Scenario 4: All identical centers.
    #[test]
    fn all_identical_centers() {
        let boxes: Vec<Aabb3> = (0..8)
            .map(|_| aabb(-0.5, -0.5, -0.5, 0.5, 0.5, 0.5))
            .collect();
        let bvh = build_reference(&boxes, BuildConfig::new(2, 8));
        assert_eq!(bvh.num_nodes, 1);
        assert_eq!(bvh.nodes[0].count(), 8);
    }

    /// Scenario 5: Regular grid.
    #[test]
    fn regular_grid() {
        let mut boxes = Vec::new();
        for x in 0..4 {
            for y in 0..4 {
                for z in 0..4 {
                    let (x, y, z) = (x as f32, y as f32, z as f32);
                    boxes.push(aabb(x, y, z, x + 1.0, y + 1.0, z + 1.0));
                }
            }
        }
        let bvh = build_reference(&boxes, BuildConfig::new(1, 1));
        assert_eq!(bvh.num_prims, 64);
        assert!(bvh.num_nodes as usize <= 127);
        for n in &bvh.nodes {
            if n.is_leaf() {
                assert!(n.count() <= 1);
            }
        }
    }

    /// Scenario 6: Degenerate axis.
    #[test]
    fn degenerate_axis() {
        let mut rng = Pcg64::seed_from_u64(7);
        let boxes: Vec<Aabb3> = (0..16)
            .map(|_| {
                let x: f32 = rng.gen_range(-10.0..10.0);
                let y: f32 = rng.gen_range(-10.0..10.0);
                aabb(x, y, 0.0, x, y, 0.0)
            })
            .collect();
        let bvh = build_reference(&boxes, BuildConfig::default());
        assert_eq!(bvh.num_prims, 16);
        assert_eq!(bvh.num_nodes as usize, bvh.nodes.len());
    }

    #[test]
    fn completeness_and_no_duplication() {
        let mut rng = Pcg64::seed_from_u64(99);
        let boxes: Vec<Aabb3> = (0..200)
            .map(|_| {
                let x: f32 = rng.gen_range(-100.0..100.0);
                let y: f32 = rng.gen_range(-100.0..100.0);
                let z: f32 = rng.gen_range(-100.0..100.0);
                aabb(x, y, z, x + 1.0, y + 1.0, z + 1.0)
            })
            .collect();
        let bvh = build_reference(&boxes, BuildConfig::new(4, 16));
        assert_eq!(bvh.prim_ids.len(), 200);
        let mut seen = vec![false; 200];
        for &id in &bvh.prim_ids {
            assert!(!seen[id as usize], "primitive {id} appeared twice");
            seen[id as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn key_monotonicity_within_and_across_leaves() {
        let mut rng = Pcg64::seed_from_u64(123);
        let boxes: Vec<Aabb3> = (0..150)
            .map(|_| {
                let x: f32 = rng.gen_range(0.0..50.0);
                let y: f32 = rng.gen_range(0.0..50.0);
                let z: f32 = rng.gen_range(0.0..50.0);
                aabb(x, y, z, x, y, z)
            })
            .collect();
        let bvh = build_reference(&boxes, BuildConfig::new(3, 16));

        let centroid_bounds = {
            let mut b = Aabb3::empty();
            for prim in &boxes {
                b.include_point(prim.center());
            }
            b
        };
        let quantizer = QuantizerParams::from_centroid_bounds(&centroid_bounds);
        let key_of = |id: u32| {
            let (qx, qy, qz) = quantizer.quantize(boxes[id as usize].center());
            encode_3d(qx, qy, qz)
        };

        let leaves: Vec<&BvhNode> = bvh.nodes.iter().filter(|n| n.is_leaf()).collect();
        for leaf in &leaves {
            let keys: Vec<u64> = (0..leaf.count())
                .map(|i| key_of(bvh.prim_ids[(leaf.offset() + i) as usize]))
                .collect();
            for w in keys.windows(2) {
                assert!(w[0] <= w[1]);
            }
        }
    }
}
