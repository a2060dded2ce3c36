//! Device/queue bootstrap. Adapted from the raytracer's `gpu_handles` module
//! — trimmed to what a headless compute crate needs (no surface, no
//! `force_fallback_adapter` toggle for a window backend).

use wgpu::{Adapter, AdapterInfo, Device, Instance, Queue};

use crate::error::{BuildError, BuildResult};

/// Owns the instance/adapter/device/queue a `Builder` dispatches kernels
/// against.
pub struct GpuHandles {
    pub queue: Queue,
    pub adapter: Adapter,
    pub instance: Instance,
    pub device: Device,
}

impl GpuHandles {
    pub fn new() -> BuildResult<Self> {
        let instance = get_instance();

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .ok_or_else(|| BuildError::Device("no suitable GPU adapter found".into()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("lbvh-gpu device"),
                features: wgpu::Features::empty(),
                limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
            },
            None,
        ))
        .map_err(|e| BuildError::Device(e.to_string()))?;

        Ok(Self {
            queue,
            adapter,
            instance,
            device,
        })
    }
}

pub fn get_instance() -> wgpu::Instance {
    wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        dx12_shader_compiler: Default::default(),
    })
}

/// Checks whether the system has a findable adapter (GPU). Returns false if
/// no adapter is found, logging at the level `bvh_project`/`gpu_handles`
/// used to with `eprintln!`/`println!` in the host crate.
pub fn self_test() -> bool {
    log::info!("performing self test to check system for compatibility");
    let instance = get_instance();
    let adapter_option: Option<Adapter> =
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()));

    match adapter_option {
        Some(adapter) => {
            let info: AdapterInfo = adapter.get_info();
            log::info!("found GPU: {info:?}");
            true
        }
        None => {
            log::warn!("failed to find a usable GPU; this crate cannot build a BVH without one");
            false
        }
    }
}
