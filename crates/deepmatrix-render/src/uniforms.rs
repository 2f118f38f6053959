use deepmatrix_sim::Simulation;
use glam::Mat4;

/// GPU-uploadable per-frame uniforms. Must match Frame in shaders/lattice/frame.wgsl.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// rgb + opacity
    pub point_color: [f32; 4],
    /// rgb + overlay opacity (0 hides the overlay)
    pub glow_color: [f32; 4],
    /// World-space center + radius of the glow billboard.
    pub glow_sphere: [f32; 4],
    /// Surface width and height in device pixels, device pixel ratio, line brightness.
    pub viewport: [f32; 4],
}

impl FrameUniforms {
    /// Snapshot the simulation's current camera, group transform and visuals.
    /// `surface_size` is in device pixels.
    pub fn from_simulation(sim: &Simulation, surface_size: (u32, u32), pixel_ratio: f32) -> Self {
        let visuals = sim.visuals();
        let group = sim.group();
        let scene = sim.scene();

        let model: Mat4 = group.model();
        let center = model.transform_point3(scene.bounding_center());
        let radius = scene.bounding_radius() * group.scale * visuals.overlay.scale;
        let overlay_opacity = if visuals.overlay.visible {
            visuals.overlay.opacity
        } else {
            0.0
        };

        Self {
            view_proj: sim.camera().view_proj().to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            point_color: visuals.point_color.with_alpha(visuals.point_opacity),
            glow_color: visuals.glow_color.with_alpha(overlay_opacity),
            glow_sphere: [center.x, center.y, center.z, radius],
            viewport: [
                surface_size.0.max(1) as f32,
                surface_size.1.max(1) as f32,
                pixel_ratio.max(f32::MIN_POSITIVE),
                visuals.line_brightness,
            ],
        }
    }

    pub fn glow_visible(&self) -> bool {
        self.glow_color[3] > 0.0
    }
}
