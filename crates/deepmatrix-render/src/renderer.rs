use deepmatrix_core::constants::{POINT_SIZE_MAX, POINT_SIZE_MIN};
use deepmatrix_sim::LatticeScene;
use wgpu::util::DeviceExt;

use crate::geometry::{padded_bytes, point_instances, PointInstance};
use crate::uniforms::FrameUniforms;

const QUAD_VERTICES: u32 = 6;

/// Geometry buffers tied to one scene build. Replaced wholesale on rebuild.
struct SceneBuffers {
    line_positions: wgpu::Buffer,
    line_colors: wgpu::Buffer,
    line_vertex_count: u32,
    points: wgpu::Buffer,
    point_count: u32,
    cluster_sizes: wgpu::Buffer,
    cluster_count: usize,
    points_bind_group: wgpu::BindGroup,
}

impl SceneBuffers {
    fn destroy(&self) {
        self.line_positions.destroy();
        self.line_colors.destroy();
        self.points.destroy();
        self.cluster_sizes.destroy();
    }
}

/// Owns every GPU resource of the lattice: three pipelines (glow, lines, points),
/// the frame uniform buffer and the per-scene geometry buffers.
pub struct Renderer {
    glow_pipeline: wgpu::RenderPipeline,
    lines_pipeline: wgpu::RenderPipeline,
    points_pipeline: wgpu::RenderPipeline,
    points_bgl: wgpu::BindGroupLayout,
    frame_bind_group: wgpu::BindGroup,
    frame_buffer: wgpu::Buffer,
    scene: SceneBuffers,
    glow_visible: bool,
    disposed: bool,
}

impl Renderer {
    /// Build all pipelines and upload the scene's geometry.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        scene: &LatticeScene,
    ) -> Self {
        let constants_preamble = format!(
            "const POINT_SIZE_MIN: f32 = {POINT_SIZE_MIN:?};\nconst POINT_SIZE_MAX: f32 = {POINT_SIZE_MAX:?};\n",
        );
        let frame_wgsl = include_str!("../../../shaders/lattice/frame.wgsl");
        let glow_wgsl = include_str!("../../../shaders/lattice/glow.wgsl");
        let lines_wgsl = include_str!("../../../shaders/lattice/lines.wgsl");
        let points_wgsl = include_str!("../../../shaders/lattice/points.wgsl");

        let module = |label: &str, body: &str| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(
                    format!("{constants_preamble}\n{frame_wgsl}\n{body}").into(),
                ),
            })
        };
        let glow_module = module("glow-shader", glow_wgsl);
        let lines_module = module("lines-shader", lines_wgsl);
        let points_module = module("points-shader", points_wgsl);

        // -- Uniforms --
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame-uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_entry = wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let frame_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame-bgl"),
            entries: &[frame_entry],
        });
        let points_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("points-bgl"),
            entries: &[
                frame_entry,
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bg"),
            layout: &frame_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        // -- Pipelines --
        let frame_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("frame-pipeline-layout"),
            bind_group_layouts: &[&frame_bgl],
            push_constant_ranges: &[],
        });
        let points_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("points-pipeline-layout"),
            bind_group_layouts: &[&points_bgl],
            push_constant_ranges: &[],
        });

        let color_target = [Some(wgpu::ColorTargetState {
            format: surface_format,
            blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let glow_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("glow-pipeline"),
            layout: Some(&frame_layout),
            vertex: wgpu::VertexState {
                module: &glow_module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &glow_module,
                entry_point: Some("fs_main"),
                targets: &color_target,
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        });

        let lines_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lines-pipeline"),
            layout: Some(&frame_layout),
            vertex: wgpu::VertexState {
                module: &lines_module,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        }],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 4]>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x4,
                            offset: 0,
                            shader_location: 1,
                        }],
                    },
                ],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &lines_module,
                entry_point: Some("fs_main"),
                targets: &color_target,
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        });

        let points_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("points-pipeline"),
            layout: Some(&points_layout),
            vertex: wgpu::VertexState {
                module: &points_module,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<PointInstance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        },
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Uint32,
                            offset: 12,
                            shader_location: 1,
                        },
                    ],
                }],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &points_module,
                entry_point: Some("fs_main"),
                targets: &color_target,
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        });

        let scene_buffers = Self::create_scene_buffers(device, &points_bgl, &frame_buffer, scene);

        Self {
            glow_pipeline,
            lines_pipeline,
            points_pipeline,
            points_bgl,
            frame_bind_group,
            frame_buffer,
            scene: scene_buffers,
            glow_visible: false,
            disposed: false,
        }
    }

    /// Replace geometry after a structural rebuild of the scene.
    pub fn upload_scene(&mut self, device: &wgpu::Device, scene: &LatticeScene) {
        self.scene.destroy();
        self.scene =
            Self::create_scene_buffers(device, &self.points_bgl, &self.frame_buffer, scene);
    }

    /// Per-frame uploads. `line_colors` is `Some` only when the activation engine
    /// marked the color buffer dirty.
    pub fn prepare(
        &mut self,
        queue: &wgpu::Queue,
        frame: &FrameUniforms,
        cluster_sizes: &[f32],
        line_colors: Option<&[[f32; 4]]>,
    ) {
        if self.disposed {
            return;
        }
        self.glow_visible = frame.glow_visible();
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(frame));

        let sizes = &cluster_sizes[..cluster_sizes.len().min(self.scene.cluster_count)];
        if !sizes.is_empty() {
            queue.write_buffer(&self.scene.cluster_sizes, 0, bytemuck::cast_slice(sizes));
        }

        if let Some(colors) = line_colors {
            let count = colors.len().min(self.scene.line_vertex_count as usize);
            if count > 0 {
                queue.write_buffer(
                    &self.scene.line_colors,
                    0,
                    bytemuck::cast_slice(&colors[..count]),
                );
            }
        }
    }

    /// Encode the lattice pass: clear to transparent, then glow, lines, points.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView) {
        if self.disposed {
            return;
        }
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lattice-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if self.glow_visible {
            pass.set_pipeline(&self.glow_pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.draw(0..QUAD_VERTICES, 0..1);
        }

        if self.scene.line_vertex_count > 0 {
            pass.set_pipeline(&self.lines_pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_vertex_buffer(0, self.scene.line_positions.slice(..));
            pass.set_vertex_buffer(1, self.scene.line_colors.slice(..));
            pass.draw(0..self.scene.line_vertex_count, 0..1);
        }

        if self.scene.point_count > 0 {
            pass.set_pipeline(&self.points_pipeline);
            pass.set_bind_group(0, &self.scene.points_bind_group, &[]);
            pass.set_vertex_buffer(0, self.scene.points.slice(..));
            pass.draw(0..QUAD_VERTICES, 0..self.scene.point_count);
        }
    }

    pub fn line_vertex_count(&self) -> u32 {
        self.scene.line_vertex_count
    }

    pub fn point_count(&self) -> u32 {
        self.scene.point_count
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Release every GPU buffer. Safe to call more than once; later calls are no-ops.
    pub fn dispose(&mut self) {
        if std::mem::replace(&mut self.disposed, true) {
            return;
        }
        self.scene.destroy();
        self.frame_buffer.destroy();
        log::debug!("Renderer buffers released");
    }

    fn create_scene_buffers(
        device: &wgpu::Device,
        points_bgl: &wgpu::BindGroupLayout,
        frame_buffer: &wgpu::Buffer,
        scene: &LatticeScene,
    ) -> SceneBuffers {
        let line_positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("line-positions"),
            contents: &padded_bytes(&scene.line_positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let line_colors = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("line-colors"),
            contents: &padded_bytes(&scene.line_colors),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let instances = point_instances(scene);
        let points = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("point-instances"),
            contents: &padded_bytes(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let cluster_count = scene.cluster_count();
        let cluster_sizes = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cluster-sizes"),
            contents: &padded_bytes(&vec![POINT_SIZE_MIN; cluster_count]),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        let points_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("points-bg"),
            layout: points_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: cluster_sizes.as_entire_binding(),
                },
            ],
        });

        log::debug!(
            "Scene buffers: {} line vertices, {} points, {} clusters",
            scene.line_positions.len(),
            instances.len(),
            cluster_count
        );

        SceneBuffers {
            line_positions,
            line_colors,
            line_vertex_count: scene.line_positions.len() as u32,
            points,
            point_count: instances.len() as u32,
            cluster_sizes,
            cluster_count,
            points_bind_group,
        }
    }
}
