//! The per-frame simulation: owns the scene, camera, motion state and all
//! animated values, and advances them in a fixed order every tick.

use deepmatrix_core::config::effective_scale;
use deepmatrix_core::constants::{COLOR_EASE_RATE, LINE_REST_GRAY, LINE_REST_OPACITY};
use deepmatrix_core::math::frame_factor;
use deepmatrix_core::{MatrixError, Rgb, VisualizationConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activation::ActivationEngine;
use crate::camera::{clip_contains, LatticeCamera, LatticeGroup, ViewportBounds};
use crate::cells::LiveParams;
use crate::glow::FrameVisuals;
use crate::interaction::{
    InteractionContext, InteractionController, InteractionResponse, PointerSample,
};
use crate::motion::MotionState;
use crate::pulse::PulseField;
use crate::scene::LatticeScene;

/// Below this per-channel gap the displayed color counts as settled.
const COLOR_SETTLED_EPSILON: f32 = 1e-4;

/// Rest color of an unlit connection line.
pub fn rest_color() -> Rgb {
    Rgb::gray(LINE_REST_GRAY)
}

pub struct Simulation {
    config: VisualizationConfig,
    scene: LatticeScene,
    camera: LatticeCamera,
    group: LatticeGroup,
    motion: MotionState,
    interaction: InteractionController,
    activation: ActivationEngine,
    pulses: PulseField,
    live: LiveParams,
    display_color: Rgb,
    last_frame_ms: Option<f64>,
    visuals: FrameVisuals,
    frame_count: u64,
    rng: StdRng,
}

impl Simulation {
    /// Build the scene for `config` on a `width` x `height` CSS-pixel surface.
    pub fn new(
        config: VisualizationConfig,
        live: LiveParams,
        width: f32,
        height: f32,
    ) -> Result<Self, MatrixError> {
        Self::with_rng(config, live, width, height, StdRng::from_os_rng())
    }

    pub fn with_rng(
        config: VisualizationConfig,
        live: LiveParams,
        width: f32,
        height: f32,
        mut rng: StdRng,
    ) -> Result<Self, MatrixError> {
        config.validate()?;
        let display_color = config.behavior.connection_rgb()?;

        let scene = LatticeScene::build(
            &config.lattice,
            rest_color().with_alpha(LINE_REST_OPACITY),
            &mut rng,
        );
        let pulses = PulseField::new(scene.cluster_count(), &mut rng);
        let camera = LatticeCamera::new(
            config.lattice.camera_distance(config.behavior.camera_zoom),
            width,
            height,
        );

        let group = LatticeGroup {
            scale: effective_scale(live.scale_multiplier()),
            ..Default::default()
        };
        let motion = MotionState::new(&config.behavior);
        let visuals =
            FrameVisuals::compute(&motion, config.behavior.max_rotation_velocity, display_color);

        log::info!(
            "Simulation ready: {} connections, {} clusters, camera at {:.1}",
            scene.connections.len(),
            scene.cluster_count(),
            camera.distance
        );

        Ok(Self {
            config,
            scene,
            camera,
            group,
            motion,
            interaction: InteractionController::default(),
            activation: ActivationEngine::default(),
            pulses,
            live,
            display_color,
            last_frame_ms: None,
            visuals,
            frame_count: 0,
            rng,
        })
    }

    /// Advance one animation frame. `now_ms` is the frame timestamp.
    pub fn step(&mut self, now_ms: f64) -> &FrameVisuals {
        let factor = match self.last_frame_ms {
            Some(last) => frame_factor(now_ms - last),
            None => 1.0,
        };
        self.last_frame_ms = Some(now_ms);
        self.frame_count += 1;

        let behavior = &self.config.behavior;

        // External cells are read fresh every tick
        self.group.scale = effective_scale(self.live.scale_multiplier());
        let target_color = self.live.target_color();
        let color_moving = (target_color.0 - self.display_color.0).abs().max_element()
            > COLOR_SETTLED_EPSILON;
        if color_moving {
            self.display_color = Rgb(self
                .display_color
                .0
                .lerp(target_color.0, (COLOR_EASE_RATE * factor).clamp(0.0, 1.0)));
        }

        self.motion.advance_reveal(factor);
        self.visuals =
            FrameVisuals::compute(&self.motion, behavior.max_rotation_velocity, self.display_color);

        self.motion.drift_autonomous(behavior, factor, &mut self.rng);
        let bounds = self.camera.bounds();
        self.motion
            .integrate_translation(&mut self.group, &bounds, factor);
        self.motion
            .integrate_rotation(&mut self.group, behavior, factor);

        self.pulses.step(factor, &mut self.rng);

        let clip_from_local = self.camera.view_proj() * self.group.model();
        self.activation.consider(
            &mut self.scene.connections,
            behavior.activation_chance,
            &mut self.rng,
        );
        if color_moving {
            self.activation.repaint(
                &self.scene.connections,
                &mut self.scene.line_colors,
                rest_color(),
                self.display_color,
            );
        }
        self.activation.advance(
            &mut self.scene.connections,
            &mut self.scene.line_colors,
            behavior.fade_speed,
            factor,
            rest_color(),
            self.display_color,
            |c| clip_contains(&clip_from_local, c.center),
        );

        &self.visuals
    }

    pub fn resize(&mut self, width: f32, height: f32) -> ViewportBounds {
        let bounds = self.camera.resize(width, height);
        log::debug!(
            "Resized to {width}x{height}, bounds {:.1}x{:.1}",
            bounds.half_width,
            bounds.half_height
        );
        bounds
    }

    pub fn pointer_down(&mut self, pointer_id: i32, sample: PointerSample) -> InteractionResponse {
        self.interaction
            .pointer_down(&mut self.motion, pointer_id, sample)
    }

    pub fn pointer_move(&mut self, pointer_id: i32, sample: PointerSample) -> InteractionResponse {
        let ctx = InteractionContext {
            config: &self.config.behavior,
            camera: &self.camera,
            group: &self.group,
            bounding_radius: self.scene.bounding_radius(),
        };
        self.interaction
            .pointer_move(&mut self.motion, &ctx, pointer_id, sample)
    }

    pub fn pointer_up(&mut self, pointer_id: i32) -> InteractionResponse {
        self.interaction.pointer_up(&mut self.motion, pointer_id)
    }

    pub fn pointer_cancel(&mut self, pointer_id: i32) -> InteractionResponse {
        self.interaction.pointer_cancel(&mut self.motion, pointer_id)
    }

    pub fn pointer_leave(&mut self) -> InteractionResponse {
        self.interaction.pointer_leave()
    }

    pub fn scroll(&mut self, scroll_y: f64) -> InteractionResponse {
        self.interaction.scroll(&mut self.motion, scroll_y)
    }

    /// Apply a new configuration. Returns true when the scene was rebuilt,
    /// in which case GPU geometry must be recreated.
    pub fn reconfigure(&mut self, config: VisualizationConfig) -> Result<bool, MatrixError> {
        config.validate()?;
        let color = config.behavior.connection_rgb()?;
        self.live.set_target_color(color);
        self.live
            .set_scale_multiplier(config.behavior.scale_multiplier);

        let rebuild = self.config.lattice.requires_rebuild(&config.lattice);
        let zoom_changed = self.config.behavior.camera_zoom != config.behavior.camera_zoom;

        if rebuild {
            self.scene = LatticeScene::build(
                &config.lattice,
                rest_color().with_alpha(LINE_REST_OPACITY),
                &mut self.rng,
            );
            self.pulses = PulseField::new(self.scene.cluster_count(), &mut self.rng);
            self.activation = ActivationEngine::default();
            log::info!(
                "Lattice rebuilt: {} connections",
                self.scene.connections.len()
            );
        }
        if rebuild || zoom_changed {
            self.camera
                .set_distance(config.lattice.camera_distance(config.behavior.camera_zoom));
        }

        self.config = config;
        Ok(rebuild)
    }

    pub fn config(&self) -> &VisualizationConfig {
        &self.config
    }

    pub fn scene(&self) -> &LatticeScene {
        &self.scene
    }

    pub fn camera(&self) -> &LatticeCamera {
        &self.camera
    }

    pub fn group(&self) -> &LatticeGroup {
        &self.group
    }

    pub fn motion(&self) -> &MotionState {
        &self.motion
    }

    pub fn visuals(&self) -> &FrameVisuals {
        &self.visuals
    }

    pub fn live(&self) -> &LiveParams {
        &self.live
    }

    /// Current point size per cluster, CSS pixels.
    pub fn point_sizes(&self) -> &[f32] {
        self.pulses.sizes()
    }

    pub fn display_color(&self) -> Rgb {
        self.display_color
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// True once per batch of line color changes; the renderer re-uploads only then.
    pub fn take_color_dirty(&mut self) -> bool {
        self.activation.take_dirty()
    }

    #[cfg(test)]
    pub(crate) fn motion_mut(&mut self) -> &mut MotionState {
        &mut self.motion
    }

    #[cfg(test)]
    pub(crate) fn group_mut(&mut self) -> &mut LatticeGroup {
        &mut self.group
    }

    #[cfg(test)]
    pub(crate) fn scene_mut(&mut self) -> &mut LatticeScene {
        &mut self.scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepmatrix_core::LatticeConfig;

    fn sim(config: VisualizationConfig) -> Simulation {
        let live = LiveParams::new(
            config.behavior.connection_rgb().expect("valid color"),
            config.behavior.scale_multiplier,
        );
        Simulation::with_rng(config, live, 800.0, 600.0, StdRng::seed_from_u64(99))
            .expect("simulation builds")
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = VisualizationConfig::default();
        config.lattice.token_count = 0;
        let live = LiveParams::new(Rgb::WHITE, 1.0);
        let result = Simulation::with_rng(config, live, 10.0, 10.0, StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(MatrixError::InvalidConfig(_))));
    }

    #[test]
    fn test_oversized_lattice_rejected_before_build() {
        let mut config = VisualizationConfig::default();
        config.lattice.stack_count = 100_000;
        config.lattice.layer_count = 100_000;
        config.lattice.token_count = 100_000;
        config.lattice.max_connections_per_token = 100_000;
        let live = LiveParams::new(Rgb::WHITE, 1.0);
        let result =
            Simulation::with_rng(config.clone(), live, 10.0, 10.0, StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(MatrixError::InvalidConfig(_))));

        let mut s = sim(VisualizationConfig::default());
        assert!(s.reconfigure(config).is_err());
        assert_eq!(s.config().lattice, LatticeConfig::default());
    }

    #[test]
    fn test_first_frame_uses_unit_factor() {
        let mut s = sim(VisualizationConfig::default());
        let before = s.group().rotation.y;
        s.step(12_345.0);
        let after = s.group().rotation.y;
        assert!((after - before - 0.001).abs() < 1e-4);
        assert_eq!(s.frame_count(), 1);
    }

    #[test]
    fn test_long_pause_is_clamped() {
        let mut s = sim(VisualizationConfig::default());
        s.step(0.0);
        let before = s.group().rotation.y;
        s.step(60_000.0);
        let delta = s.group().rotation.y - before;
        assert!(delta < 0.0015 * 3.0 + 1e-4, "delta {delta}");
    }

    #[test]
    fn test_scale_multiplier_read_each_frame() {
        let mut s = sim(VisualizationConfig::default());
        s.live().set_scale_multiplier(100.0);
        s.step(0.0);
        assert_eq!(s.group().scale, 21.0);
        s.live().set_scale_multiplier(0.0);
        s.step(16.0);
        assert_eq!(s.group().scale, 0.1);
    }

    #[test]
    fn test_color_eases_toward_target() {
        let mut s = sim(VisualizationConfig::default());
        s.live().set_target_color(Rgb::new(1.0, 0.0, 0.0));
        s.step(0.0);
        let c = s.display_color();
        assert!(c.0.x > 0.0 && c.0.x < 1.0);
        for i in 1..500 {
            s.step(i as f64 * 16.0);
        }
        assert!((s.display_color().0.x - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_cosmetic_reconfigure_keeps_scene() {
        let mut s = sim(VisualizationConfig::default());
        let count = s.scene().connections.len();
        let mut next = s.config().clone();
        next.behavior.connection_color = "#ff0000".into();
        next.behavior.camera_zoom = 3.0;
        let rebuilt = s.reconfigure(next).expect("valid");
        assert!(!rebuilt);
        assert_eq!(s.scene().connections.len(), count);
        assert_eq!(s.live().target_color(), Rgb::new(1.0, 0.0, 0.0));
        let expected = LatticeConfig::default().camera_distance(3.0);
        assert_eq!(s.camera().distance, expected);
    }

    #[test]
    fn test_structural_reconfigure_rebuilds() {
        let mut s = sim(VisualizationConfig::default());
        let mut next = s.config().clone();
        next.lattice.layer_count = 2;
        next.lattice.token_count = 4;
        next.lattice.max_connections_per_token = 1;
        assert!(s.reconfigure(next).expect("valid"));
        assert_eq!(s.scene().connections.len(), 8);
        assert_eq!(s.point_sizes().len(), 2);
    }

    #[test]
    fn test_bad_reconfigure_leaves_state() {
        let mut s = sim(VisualizationConfig::default());
        let mut next = s.config().clone();
        next.behavior.connection_color = "nope".into();
        assert!(s.reconfigure(next).is_err());
        assert_eq!(s.config().behavior.connection_color, "#0000ff");
    }
}
