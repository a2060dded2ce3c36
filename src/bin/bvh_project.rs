//! Benchmark binary for the BVH builder.
//!
//! Mirrors the raytracer's `bvh_project` benchmark: build repeatedly over a
//! handful of synthetic scenes at different scales and leaf thresholds, and
//! report average wall-clock time. Synthetic scenes stand in for the
//! teapot/bunny/dragon OBJ meshes the original benchmark loaded, since this
//! crate builds over AABB arrays directly rather than triangle meshes.

use std::ops::{AddAssign, DivAssign};
use std::time::{Duration, Instant};

use lbvh_gpu::aabb::Aabb;
use lbvh_gpu::builder::build_reference;
use lbvh_gpu::vector::Vec3f32;
use lbvh_gpu::BuildConfig;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

fn main() {
    env_logger::init();

    let runs = 20;
    println!("Benchmarking with {runs} samples.\n");

    let small = random_points(1_000, 1);
    let medium = random_points(100_000, 2);
    let large = random_points(1_000_000, 3);

    println!("Performance scaling with primitive count (1/2):");
    run_bvh(&small, 1, runs).display("BVH: 1,000 points, leaf=1");
    run_bvh(&medium, 1, runs).display("BVH: 100,000 points, leaf=1");
    run_bvh(&large, 1, runs).display("BVH: 1,000,000 points, leaf=1");
    println!("----------------------------------");

    println!("\nPerformance scaling with leaf threshold (2/2):");
    run_bvh(&medium, 1, runs).display("BVH: 100,000 points, leaf=1");
    run_bvh(&medium, 2, runs).display("BVH: 100,000 points, leaf=2");
    run_bvh(&medium, 4, runs).display("BVH: 100,000 points, leaf=4");
    run_bvh(&medium, 8, runs).display("BVH: 100,000 points, leaf=8");
    run_bvh(&medium, 16, runs).display("BVH: 100,000 points, leaf=16");
    println!("----------------------------------");

    println!("\nAll done.");
}

fn random_points(n: usize, seed: u64) -> Vec<Aabb> {
    let mut rng = Pcg64::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let x: f32 = rng.gen_range(-1000.0..1000.0);
            let y: f32 = rng.gen_range(-1000.0..1000.0);
            let z: f32 = rng.gen_range(-1000.0..1000.0);
            Aabb::new(Vec3f32(x, y, z), Vec3f32(x, y, z))
        })
        .collect()
}

fn run_bvh(boxes: &[Aabb], leaf_threshold: u32, runs: u32) -> BvhConstructionTime {
    let mut total = BvhConstructionTime::default();
    let config = BuildConfig::new(leaf_threshold, leaf_threshold.max(1));
    for _ in 0..runs {
        let timer = Instant::now();
        let bvh = build_reference(boxes, config);
        let elapsed = timer.elapsed();
        total += BvhConstructionTime {
            build: elapsed,
            num_nodes: bvh.num_nodes,
        };
    }
    total /= runs;
    total
}

/// Wrapper type for benchmarking a build, in the style of the raytracer's
/// `BspConstructionTime`/`BvhConstructionTime` timing aggregates.
#[derive(Debug, Copy, Clone, Default)]
pub struct BvhConstructionTime {
    pub build: Duration,
    pub num_nodes: u32,
}

impl BvhConstructionTime {
    pub fn display(&self, text: &str) -> Self {
        println!("{text}");
        println!("  build:      {:?}", self.build);
        println!("  num_nodes:  {}", self.num_nodes);
        *self
    }
}

impl AddAssign<BvhConstructionTime> for BvhConstructionTime {
    fn add_assign(&mut self, rhs: Self) {
        self.build += rhs.build;
        self.num_nodes += rhs.num_nodes;
    }
}

impl DivAssign<u32> for BvhConstructionTime {
    fn div_assign(&mut self, rhs: u32) {
        self.build /= rhs;
        self.num_nodes /= rhs;
    }
}
