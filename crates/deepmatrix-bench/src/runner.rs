use std::time::Instant;

use deepmatrix_core::MatrixError;
use deepmatrix_render::{FrameUniforms, Renderer};
use deepmatrix_sim::{LiveParams, Simulation};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::scenes::{SceneConfig, FRAME_MS, VIEWPORT};

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Timing data for a single benchmark run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimingSeries {
    pub mean_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

/// Result of a single scene benchmark.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BenchmarkResult {
    pub scene_name: String,
    pub point_count: u32,
    pub connection_count: u32,
    pub frame_count: u32,
    pub gpu: bool,
    pub timings: TimingSeries,
}

/// Offscreen device the `--gpu` mode renders through.
struct OffscreenGpu {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target: wgpu::TextureView,
    size: (u32, u32),
}

impl OffscreenGpu {
    /// Initialize wgpu natively. Blocks on async adapter request.
    fn new() -> Result<Self, MatrixError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| MatrixError::AdapterNotFound("no suitable GPU adapter found".into()))?;

        log::info!("Benchmark adapter: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("bench-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .map_err(|e| MatrixError::DeviceRequestFailed(format!("{e}")))?;

        let size = (VIEWPORT.0 as u32, VIEWPORT.1 as u32);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("bench-target"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let target = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            device,
            queue,
            target,
            size,
        })
    }

    fn render(&self, renderer: &mut Renderer, sim: &mut Simulation) {
        let colors_dirty = sim.take_color_dirty();
        let frame = FrameUniforms::from_simulation(sim, self.size, 1.0);
        let line_colors = colors_dirty.then(|| sim.scene().line_colors.as_slice());
        renderer.prepare(&self.queue, &frame, sim.point_sizes(), line_colors);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("bench-encoder"),
            });
        renderer.render(&mut encoder, &self.target);
        self.queue.submit(std::iter::once(encoder.finish()));
        self.device.poll(wgpu::Maintain::Wait);
    }
}

/// Runs scenes headlessly, optionally rendering every frame offscreen.
pub struct BenchmarkRunner {
    frame_count: u32,
    seed: u64,
    gpu: Option<OffscreenGpu>,
}

impl BenchmarkRunner {
    /// Simulation-only runner.
    pub fn new(frame_count: u32, seed: u64) -> Self {
        Self {
            frame_count,
            seed,
            gpu: None,
        }
    }

    /// Runner that also draws each frame through the real renderer.
    pub fn with_gpu(frame_count: u32, seed: u64) -> Result<Self, MatrixError> {
        Ok(Self {
            gpu: Some(OffscreenGpu::new()?),
            ..Self::new(frame_count, seed)
        })
    }

    /// Run a single benchmark scene and return timing results.
    pub fn run_scene(&self, scene: &SceneConfig) -> Result<BenchmarkResult, MatrixError> {
        log::info!("Running scene '{}' ({} frames)...", scene.name, self.frame_count);

        let config = scene.config()?;
        let live = LiveParams::new(
            config.behavior.connection_rgb()?,
            config.behavior.scale_multiplier,
        );
        let mut sim = Simulation::with_rng(
            config,
            live,
            VIEWPORT.0,
            VIEWPORT.1,
            StdRng::seed_from_u64(self.seed),
        )?;
        let mut renderer = self
            .gpu
            .as_ref()
            .map(|gpu| Renderer::new(&gpu.device, TARGET_FORMAT, sim.scene()));

        let mut frame_times = Vec::with_capacity(self.frame_count as usize);
        for frame in 0..self.frame_count {
            scene.drive(&mut sim, frame);

            let frame_start = Instant::now();
            sim.step(frame as f64 * FRAME_MS);
            if let (Some(gpu), Some(renderer)) = (&self.gpu, renderer.as_mut()) {
                gpu.render(renderer, &mut sim);
            }
            frame_times.push(frame_start.elapsed().as_secs_f64() * 1000.0);
        }

        if let Some(renderer) = renderer.as_mut() {
            renderer.dispose();
        }

        let timings = compute_timings(&frame_times);
        log::info!(
            "  Done: mean={:.3}ms, p95={:.3}ms, p99={:.3}ms",
            timings.mean_ms,
            timings.p95_ms,
            timings.p99_ms
        );

        let scene_data = sim.scene();
        Ok(BenchmarkResult {
            scene_name: scene.name.to_string(),
            point_count: scene_data.points().count() as u32,
            connection_count: scene_data.connections.len() as u32,
            frame_count: self.frame_count,
            gpu: self.gpu.is_some(),
            timings,
        })
    }
}

/// Compute timing statistics from a list of frame times in milliseconds.
pub fn compute_timings(times: &[f64]) -> TimingSeries {
    if times.is_empty() {
        return TimingSeries {
            mean_ms: 0.0,
            median_ms: 0.0,
            p95_ms: 0.0,
            p99_ms: 0.0,
            min_ms: 0.0,
            max_ms: 0.0,
        };
    }

    let mut sorted = times.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let p95_idx = ((n as f64) * 0.95).ceil() as usize;
    let p99_idx = ((n as f64) * 0.99).ceil() as usize;

    TimingSeries {
        mean_ms: mean,
        median_ms: median,
        p95_ms: sorted[p95_idx.min(n - 1)],
        p99_ms: sorted[p99_idx.min(n - 1)],
        min_ms: sorted[0],
        max_ms: sorted[n - 1],
    }
}
