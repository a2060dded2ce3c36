//! WGSL compute shaders for GPU-side LBVH construction.
//!
//! Multi-pass approach mirroring `builder.rs`'s dispatch order:
//! 1. CLEAR_FILL_FINISH_SHADER: reset the build-state accumulator and grow
//!    the centroid-bounds box over all primitives (§4.2 Clear + Fill).
//! 2. PRODUCER_SHADER: compact out empty primitives and emit (key, primID)
//!    pairs (§4.3).
//! 3. BFS_EXPAND_SHADER: one dispatch per tree level, growing the temporary
//!    node buffer (§4.5).
//! 4. FINAL_NODE_SHADER: pack the temporary nodes into the compact output
//!    layout (§4.6).
//!
//! 64-bit Morton keys have no native WGSL scalar, so every shader here
//! represents a key as `vec2<u32>` (`hi`, `lo`) and works through
//! `MORTON_COMMON`'s hand-written compare/xor/clz helpers rather than a
//! native integer type — the host-side `u64` in `morton.rs` and `bfs.rs` is
//! the same value, just represented natively since Rust has `u64`.

/// Shared WGSL struct declarations, pulled in via string concatenation at
/// pipeline-creation time in `builder.rs` rather than `#include` (WGSL has
/// no preprocessor).
#[allow(dead_code)]
pub const COMMON_STRUCTS: &str = r#"
struct Aabb {
    lower: vec3<f32>,
    _pad0: f32,
    upper: vec3<f32>,
    _pad1: f32,
}

struct BuildState {
    lower_atomic: array<atomic<i32>, 3>,
    upper_atomic: array<atomic<i32>, 3>,
    valid_count: atomic<i32>,
    alloc_count: atomic<u32>,
}

struct QuantizerParams {
    bias: vec3<f32>,
    _pad0: f32,
    scale: vec3<f32>,
    _pad1: f32,
}

struct TempNode {
    a: u32,
    b: u32,
    tag: u32,
    _pad: u32,
}
"#;

/// Order-preserving float<->int bit trick for atomic min/max on the
/// centroid-bounds box, the WGSL twin of `build_state::float_to_sortable_int`
/// / `sortable_int_to_float`.
#[allow(dead_code)]
pub const BUILD_STATE_COMMON: &str = r#"
fn float_to_sortable_int(f: f32) -> i32 {
    let bits = bitcast<i32>(f);
    return select(bits ^ 0x7FFFFFFF, bits, bits >= 0);
}

fn sortable_int_to_float(i: i32) -> f32 {
    let bits = select(i ^ 0x7FFFFFFF, i, i >= 0);
    return bitcast<f32>(bits);
}

// WGSL has no isFinite builtin; abs(x) > f32::MAX catches +/-infinity, and
// NaN fails every comparison (so a NaN-tainted component also reads as
// not-finite here, same as `Aabb::is_finite`'s IEEE .is_finite() check).
fn vec3_is_finite(v: vec3<f32>) -> bool {
    let bound = vec3<f32>(3.40282347e38, 3.40282347e38, 3.40282347e38);
    return all(abs(v) <= bound);
}

// Mirrors `builder::primitive_is_valid` (`b.is_finite() && !b.is_empty()`):
// every component finite, and not degenerate (lower <= upper per axis, which
// also excludes NaN since NaN comparisons are always false).
fn aabb_is_valid(b: Aabb) -> bool {
    return vec3_is_finite(b.lower) && vec3_is_finite(b.upper) && all(b.lower <= b.upper);
}
"#;

/// 64-bit Morton key helpers over `vec2<u32>` (`x.x` = hi 32 bits, `x.y` =
/// lo 32 bits), plus the 21-bit-per-axis splitBy3/compactBy3 spread used to
/// build a key from quantized coordinates.
#[allow(dead_code)]
pub const MORTON_COMMON: &str = r#"
fn key_lt(a: vec2<u32>, b: vec2<u32>) -> bool {
    return a.x < b.x || (a.x == b.x && a.y < b.y);
}

fn key_ge(a: vec2<u32>, b: vec2<u32>) -> bool {
    return !key_lt(a, b);
}

fn key_eq(a: vec2<u32>, b: vec2<u32>) -> bool {
    return a.x == b.x && a.y == b.y;
}

fn key_xor(a: vec2<u32>, b: vec2<u32>) -> vec2<u32> {
    return vec2<u32>(a.x ^ b.x, a.y ^ b.y);
}

// Leading zero count over the 64-bit value packed as (hi, lo).
fn key_clz(k: vec2<u32>) -> u32 {
    if (k.x != 0u) {
        return countLeadingZeros(k.x);
    }
    return 32u + countLeadingZeros(k.y);
}

// Spread the low 21 bits of x so consecutive source bits land 3 apart.
// Operates 32 bits at a time since vec2<u32> is the widest integer WGSL has;
// this is the same five-stage magic-number ladder as the host-side
// `morton::spread_bits_3`, with the first stage (<<32) special-cased as a
// word swap since `u64_shl` only handles shifts below 32.
fn spread_bits_3_lo(x: u32) -> vec2<u32> {
    var v = u64_from_u32(x & 0x1fffffu);
    v = u64_or(v, vec2<u32>(v.y, 0u));
    v = u64_and(v, vec2<u32>(0x001f0000u, 0x0000ffffu));
    v = u64_or(v, u64_shl(v, 16u));
    v = u64_and(v, vec2<u32>(0x001f0000u, 0xff0000ffu));
    v = u64_or(v, u64_shl(v, 8u));
    v = u64_and(v, vec2<u32>(0x100f00f0u, 0x0f00f00fu));
    v = u64_or(v, u64_shl(v, 4u));
    v = u64_and(v, vec2<u32>(0x10c30c30u, 0xc30c30c3u));
    v = u64_or(v, u64_shl(v, 2u));
    v = u64_and(v, vec2<u32>(0x12492492u, 0x49249249u));
    return v;
}

fn u64_from_u32(lo: u32) -> vec2<u32> {
    return vec2<u32>(0u, lo);
}

fn u64_or(a: vec2<u32>, b: vec2<u32>) -> vec2<u32> {
    return vec2<u32>(a.x | b.x, a.y | b.y);
}

fn u64_and(a: vec2<u32>, b: vec2<u32>) -> vec2<u32> {
    return vec2<u32>(a.x & b.x, a.y & b.y);
}

// Shift a (hi, lo) pair left by `n` bits, 0 <= n <= 31.
fn u64_shl(v: vec2<u32>, n: u32) -> vec2<u32> {
    if (n == 0u) {
        return v;
    }
    let hi = (v.x << n) | (v.y >> (32u - n));
    let lo = v.y << n;
    return vec2<u32>(hi, lo);
}

fn encode_morton_3(qx: u32, qy: u32, qz: u32) -> vec2<u32> {
    let sx = spread_bits_3_lo(qx);
    let sy = u64_shl(spread_bits_3_lo(qy), 1u);
    let sz = u64_shl(spread_bits_3_lo(qz), 2u);
    return u64_or(u64_or(sx, sy), sz);
}
"#;

/// Clear + Fill (§4.2). One invocation per primitive; block-local reduction
/// into `var<workgroup>` arrays before the single atomic grow per workgroup,
/// matching the "one global update per thread block" requirement.
pub const CLEAR_FILL_SHADER: &str = r#"
@group(0) @binding(0) var<storage, read> boxes: array<Aabb>;
@group(0) @binding(1) var<storage, read_write> state: BuildState;

var<workgroup> local_lower: array<array<i32, 3>, 256>;
var<workgroup> local_upper: array<array<i32, 3>, 256>;

@compute @workgroup_size(256)
fn clear_fill(@builtin(global_invocation_id) gid: vec3<u32>, @builtin(local_invocation_id) lid: vec3<u32>) {
    let i = gid.x;
    let tid = lid.x;
    var center = vec3<f32>(0.0, 0.0, 0.0);
    var valid = false;
    if (i < arrayLength(&boxes)) {
        let b = boxes[i];
        valid = aabb_is_valid(b);
        center = (b.lower + b.upper) * 0.5;
    }

    for (var axis = 0u; axis < 3u; axis = axis + 1u) {
        local_lower[tid][axis] = select(0x7fffffff, float_to_sortable_int(center[axis]), valid);
        local_upper[tid][axis] = select(-0x7fffffff, float_to_sortable_int(center[axis]), valid);
    }

    workgroupBarrier();
    if (tid == 0u) {
        for (var axis = 0u; axis < 3u; axis = axis + 1u) {
            var lo = local_lower[0][axis];
            var hi = local_upper[0][axis];
            for (var t = 1u; t < 256u; t = t + 1u) {
                lo = min(lo, local_lower[t][axis]);
                hi = max(hi, local_upper[t][axis]);
            }
            atomicMin(&state.lower_atomic[axis], lo);
            atomicMax(&state.upper_atomic[axis], hi);
        }
    }
}
"#;

/// Key/index producer (§4.3): tail-stealing compaction of empty primitives,
/// followed by Morton key emission for every surviving slot.
pub const PRODUCER_SHADER: &str = r#"
@group(0) @binding(0) var<storage, read> boxes: array<Aabb>;
@group(0) @binding(1) var<storage, read_write> state: BuildState;
@group(0) @binding(2) var<uniform> quantizer: QuantizerParams;
@group(0) @binding(3) var<storage, read_write> prim_ids: array<u32>;
@group(0) @binding(4) var<storage, read_write> keys: array<vec2<u32>>;

fn quantize_axis(p: f32, bias: f32, scale: f32) -> u32 {
    let q = floor((p - bias) * scale);
    return u32(clamp(q, 0.0, 2097151.0));
}

@compute @workgroup_size(256)
fn produce(@builtin(global_invocation_id) gid: vec3<u32>) {
    let tid = gid.x;
    let n = arrayLength(&boxes);
    if (tid >= n) {
        return;
    }

    var prim_id = tid;
    loop {
        let b = boxes[prim_id];
        if (aabb_is_valid(b)) {
            break;
        }
        let new_valid = u32(atomicSub(&state.valid_count, 1)) - 1u;
        prim_id = new_valid;
        if (tid >= prim_id) {
            return;
        }
    }

    let b = boxes[prim_id];
    let center = (b.lower + b.upper) * 0.5;
    let qx = quantize_axis(center.x, quantizer.bias.x, quantizer.scale.x);
    let qy = quantize_axis(center.y, quantizer.bias.y, quantizer.scale.y);
    let qz = quantize_axis(center.z, quantizer.bias.z, quantizer.scale.z);

    prim_ids[tid] = prim_id;
    keys[tid] = encode_morton_3(qx, qy, qz);
}
"#;

/// BFS tree expansion (§4.5), one dispatch per level. `begin`/`end` (the
/// processed/allocated range for this level) are uploaded as a small
/// uniform each iteration by `builder.rs`.
pub const BFS_EXPAND_SHADER: &str = r#"
struct LevelRange {
    begin: u32,
    end: u32,
    leaf_threshold: u32,
    _pad: u32,
}

@group(0) @binding(0) var<storage, read> keys: array<vec2<u32>>;
@group(0) @binding(1) var<storage, read_write> nodes: array<TempNode>;
@group(0) @binding(2) var<storage, read_write> state: BuildState;
@group(0) @binding(3) var<uniform> level: LevelRange;

fn find_split(lo: u32, hi: u32) -> i32 {
    let first = keys[lo];
    let last = keys[hi - 1u];
    if (key_eq(first, last)) {
        return -1;
    }
    let delta = key_clz(key_xor(first, last));
    let shift = 63u - delta;
    var search_key: vec2<u32>;
    if (shift >= 32u) {
        search_key = vec2<u32>(last.x & (0xffffffffu << (shift - 32u)), 0u);
    } else {
        search_key = vec2<u32>(last.x, last.y & (0xffffffffu << shift));
    }

    var left = lo + 1u;
    var right = hi;
    while (left < right) {
        let mid = left + (right - left) / 2u;
        if (key_ge(keys[mid], search_key)) {
            right = mid;
        } else {
            left = mid + 1u;
        }
    }
    return i32(left);
}

@compute @workgroup_size(256)
fn bfs_expand(@builtin(global_invocation_id) gid: vec3<u32>) {
    let n = level.begin + gid.x;
    if (n >= level.end) {
        return;
    }

    let node = nodes[n];
    let lo = node.a;
    let hi = node.b;
    let size = hi - lo;

    if (size <= level.leaf_threshold) {
        nodes[n] = TempNode(lo, size, 1u, 0u);
        return;
    }

    let split = find_split(lo, hi);
    if (split < 0) {
        nodes[n] = TempNode(lo, size, 1u, 0u);
        return;
    }

    let child_base = atomicAdd(&state.alloc_count, 2u);
    nodes[child_base] = TempNode(lo, u32(split), 0u, 0u);
    nodes[child_base + 1u] = TempNode(u32(split), hi, 0u, 0u);
    nodes[n] = TempNode(child_base, 0u, 1u, 0u);
}
"#;

/// Final node writer (§4.6): pack every finished TempNode into the compact
/// `offset`/`count` layout `node::BvhNode` mirrors on the host side.
pub const FINAL_NODE_SHADER: &str = r#"
@group(0) @binding(0) var<storage, read> temp_nodes: array<TempNode>;
@group(0) @binding(1) var<storage, read_write> final_nodes: array<u32>;

const COUNT_BITS: u32 = 8u;
const COUNT_MASK: u32 = 255u;

@compute @workgroup_size(256)
fn write_final(@builtin(global_invocation_id) gid: vec3<u32>) {
    let i = gid.x;
    // Bound against `final_nodes`, not `temp_nodes`: the caller allocates
    // `temp_nodes` with slack capacity (2*V upper bound) but `final_nodes`
    // with exactly M elements, and dispatches ceil(M/256) workgroups, so
    // `arrayLength(&temp_nodes)` would let tail threads past M write out of
    // bounds of `final_nodes`.
    if (i >= arrayLength(&final_nodes)) {
        return;
    }
    let t = temp_nodes[i];
    final_nodes[i] = (t.a << COUNT_BITS) | (t.b & COUNT_MASK);
}
"#;

/// The WGSL text above can't run outside a GPU device, so this module keeps a
/// Rust-side mirror of `MORTON_COMMON`'s `vec2<u32>` ladder — same stages,
/// same word-boundary handling — and checks it against `morton::spread_bits_3`
/// / `morton::encode_3d` on every change. Proves the GPU and host key paths
/// agree (§8 "Determinism modulo sort") without needing the producer shader
/// to actually run.
#[cfg(test)]
mod tests {
    use crate::morton::{encode_3d, spread_bits_3};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64;

    fn u64_shl_pair(v: (u32, u32), n: u32) -> (u32, u32) {
        if n == 0 {
            return v;
        }
        let hi = (v.0 << n) | (v.1 >> (32 - n));
        let lo = v.1 << n;
        (hi, lo)
    }

    // Mirrors `spread_bits_3_lo` line for line, including the shift-by-32
    // word swap `u64_shl` can't express directly.
    fn spread_bits_3_lo_mirror(x: u32) -> (u32, u32) {
        let mut v: (u32, u32) = (0, x & 0x1f_ffff);
        v = (v.0 | v.1, v.1);
        v = (v.0 & 0x001f_0000, v.1 & 0x0000_ffff);

        let s = u64_shl_pair(v, 16);
        v = (v.0 | s.0, v.1 | s.1);
        v = (v.0 & 0x001f_0000, v.1 & 0xff00_00ff);

        let s = u64_shl_pair(v, 8);
        v = (v.0 | s.0, v.1 | s.1);
        v = (v.0 & 0x100f_00f0, v.1 & 0x0f00_f00f);

        let s = u64_shl_pair(v, 4);
        v = (v.0 | s.0, v.1 | s.1);
        v = (v.0 & 0x10c3_0c30, v.1 & 0xc30c_30c3);

        let s = u64_shl_pair(v, 2);
        v = (v.0 | s.0, v.1 | s.1);
        v = (v.0 & 0x1249_2492, v.1 & 0x4924_9249);

        v
    }

    fn encode_morton_3_mirror(qx: u32, qy: u32, qz: u32) -> (u32, u32) {
        let sx = spread_bits_3_lo_mirror(qx);
        let sy = u64_shl_pair(spread_bits_3_lo_mirror(qy), 1);
        let sz = u64_shl_pair(spread_bits_3_lo_mirror(qz), 2);
        (sx.0 | sy.0 | sz.0, sx.1 | sy.1 | sz.1)
    }

    #[test]
    fn gpu_spread_ladder_matches_host_spread_bits_3() {
        let mut rng = Pcg64::seed_from_u64(42);
        for _ in 0..20_000 {
            let x: u32 = rng.gen_range(0..(1u32 << 21));
            let (hi, lo) = spread_bits_3_lo_mirror(x);
            let want = spread_bits_3(x);
            assert_eq!(hi, (want >> 32) as u32);
            assert_eq!(lo, want as u32);
        }
    }

    #[test]
    fn gpu_encode_morton_3_matches_host_encode_3d() {
        let mut rng = Pcg64::seed_from_u64(43);
        for _ in 0..20_000 {
            let qx: u32 = rng.gen_range(0..(1u32 << 21));
            let qy: u32 = rng.gen_range(0..(1u32 << 21));
            let qz: u32 = rng.gen_range(0..(1u32 << 21));
            let (hi, lo) = encode_morton_3_mirror(qx, qy, qz);
            let want = encode_3d(qx, qy, qz);
            assert_eq!(hi, (want >> 32) as u32);
            assert_eq!(lo, want as u32);
        }
    }
}
