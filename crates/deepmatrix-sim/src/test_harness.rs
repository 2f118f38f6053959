//! End-to-end scenarios that drive a whole `Simulation` through input and frames.

use deepmatrix_core::constants::{ACTIVATION_PEAK, LINE_REST_OPACITY};
use deepmatrix_core::types::ConnectionKind;
use deepmatrix_core::{presets, LatticeConfig, Rgb, VisualizationConfig};
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::activation::ActivationEngine;
use crate::cells::LiveParams;
use crate::interaction::{PointerCapture, PointerSample};
use crate::simulation::{rest_color, Simulation};

const FRAME_MS: f64 = 1000.0 / 60.0;

fn build(config: VisualizationConfig, seed: u64) -> Simulation {
    let live = LiveParams::new(
        config.behavior.connection_rgb().expect("valid color"),
        config.behavior.scale_multiplier,
    );
    Simulation::with_rng(config, live, 1024.0, 768.0, StdRng::seed_from_u64(seed))
        .expect("simulation builds")
}

fn run_frames(sim: &mut Simulation, start_frame: u32, frames: u32) {
    for i in start_frame..start_frame + frames {
        sim.step(i as f64 * FRAME_MS);
    }
}

#[test]
fn test_two_layer_four_token_scene() {
    let config = VisualizationConfig {
        lattice: LatticeConfig {
            stack_count: 1,
            layer_count: 2,
            token_count: 4,
            max_connections_per_token: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    let sim = build(config, 1);
    let scene = sim.scene();
    assert_eq!(scene.count_of(ConnectionKind::IntraLayer), 4);
    assert_eq!(scene.count_of(ConnectionKind::InterLayer), 4);
    assert_eq!(scene.connections.len(), 8);
    assert!(scene
        .connections
        .iter()
        .all(|c| c.activation == 0.0 && c.target == 0.0));
    assert_eq!(scene.line_colors.len(), 16);
}

#[test]
fn test_drag_then_coast_to_rest() {
    let mut config = VisualizationConfig::default();
    config.behavior.interaction_sensitivity = 0.42;
    config.behavior.activation_chance = 0.0;
    let mut sim = build(config, 2);

    let down = sim.pointer_down(3, PointerSample::new(500.0, 400.0, 0.0));
    assert_eq!(down.capture, Some(PointerCapture::Capture(3)));
    assert!(down.reveal_triggered);

    sim.pointer_move(3, PointerSample::new(600.0, 400.0, 16.0));
    let max = sim.config().behavior.max_rotation_velocity;
    let v = sim.motion().user_rotation_velocity;
    assert!((v.length() - max).abs() < 1e-6);
    assert!(v.y > 0.0);

    sim.pointer_up(3);
    run_frames(&mut sim, 0, 600);
    assert_eq!(sim.motion().user_rotation_velocity, Vec3::ZERO);
    assert_eq!(sim.motion().reveal_progress, 1.0);
}

#[test]
fn test_velocity_bounded_for_any_drag_sequence() {
    let mut sim = build(VisualizationConfig::default(), 3);
    let max = sim.config().behavior.max_rotation_velocity;
    sim.pointer_down(1, PointerSample::new(0.0, 0.0, 0.0));
    let mut rng = StdRng::seed_from_u64(30);
    let mut pos = Vec2::ZERO;
    for i in 0..300 {
        pos += Vec2::new(rng.random_range(-400.0..400.0), rng.random_range(-400.0..400.0));
        sim.pointer_move(1, PointerSample::new(pos.x, pos.y, i as f64 * 8.0));
        assert!(sim.motion().user_rotation_velocity.length() <= max + 1e-6);
        sim.step(i as f64 * FRAME_MS);
        assert!(sim.motion().user_rotation_velocity.length() <= max + 1e-6);
    }
}

#[test]
fn test_hover_sweep_stays_in_bounds() {
    let mut sim = build(VisualizationConfig::default(), 4);
    let mut frame = 0;
    for sweep in 0..20 {
        for step in 0..30 {
            let offset = step as f32 * 20.0;
            let x = if sweep % 2 == 0 { 200.0 + offset } else { 800.0 - offset };
            sim.pointer_move(1, PointerSample::new(x, 384.0, frame as f64 * FRAME_MS));
            sim.step(frame as f64 * FRAME_MS);
            frame += 1;

            let limit = sim.camera().bounds().hard_limit();
            let p = sim.group().position;
            assert!(p.x.abs() <= limit.x + 1e-4 && p.y.abs() <= limit.y + 1e-4);
        }
    }
}

#[test]
fn test_pushed_lattice_is_clamped_and_returns() {
    let mut sim = build(VisualizationConfig::default(), 5);
    let limit = sim.camera().bounds().hard_limit();
    sim.group_mut().position = Vec2::new(limit.x * 3.0, -limit.y * 3.0);
    sim.motion_mut().translation_velocity = Vec2::new(50.0, -50.0);
    sim.step(0.0);
    let p = sim.group().position;
    assert!(p.x.abs() <= limit.x + 1e-4);
    assert!(p.y.abs() <= limit.y + 1e-4);
    assert!(sim.motion().translation_velocity.x <= 0.0);

    run_frames(&mut sim, 1, 3_000);
    let soft = sim.camera().bounds().soft_limit();
    assert!(sim.group().position.x.abs() < soft.x);
}

#[test]
fn test_scroll_reveals_once_and_glow_follows() {
    let mut sim = build(VisualizationConfig::default(), 6);
    assert!(!sim.scroll(5.0).reveal_triggered);
    run_frames(&mut sim, 0, 10);
    assert_eq!(sim.motion().reveal_progress, 0.0);
    assert_eq!(sim.visuals().glow, 0.0);

    assert!(sim.scroll(80.0).reveal_triggered);
    assert!(!sim.scroll(120.0).reveal_triggered);

    let mut last = 0.0;
    for i in 10..70 {
        sim.step(i as f64 * FRAME_MS);
        let r = sim.motion().reveal_progress;
        assert!(r >= last);
        last = r;
    }
    assert_eq!(last, 1.0);
    assert_eq!(sim.visuals().line_brightness, 1.0);
}

#[test]
fn test_activation_pulses_and_settles() {
    let mut config = VisualizationConfig::default();
    config.behavior.activation_chance = 1.0;
    config.behavior.fade_speed = 0.3;
    // Small enough that every connection stays in view and keeps fading.
    config.behavior.scale_multiplier = 0.4;
    let mut sim = build(config, 7);

    sim.step(0.0);
    assert!(sim.take_color_dirty());
    let lit = sim
        .scene()
        .connections
        .iter()
        .filter(|c| c.target == 1.0 || c.activation > 0.0)
        .count();
    assert!(lit > 0);

    let mut next = sim.config().clone();
    next.behavior.activation_chance = 0.0;
    assert!(!sim.reconfigure(next).expect("valid"));

    let mut saw_peak = false;
    for i in 1..400 {
        sim.step(i as f64 * FRAME_MS);
        saw_peak |= sim
            .scene()
            .connections
            .iter()
            .any(|c| c.activation > ACTIVATION_PEAK);
    }
    assert!(saw_peak);
    let scene = sim.scene();
    assert!(scene.connections.iter().all(|c| c.activation == 0.0 && c.target == 0.0));
    let rest = rest_color().with_alpha(LINE_REST_OPACITY);
    assert!(scene.line_colors.iter().all(|c| *c == rest));
    sim.take_color_dirty();
    sim.step(400.0 * FRAME_MS);
    assert!(!sim.take_color_dirty());
}

#[test]
fn test_live_color_change_repaints_lit_lines() {
    let mut config = VisualizationConfig::default();
    config.behavior.activation_chance = 1.0;
    config.behavior.fade_speed = 0.02;
    let mut sim = build(config, 8);
    run_frames(&mut sim, 0, 5);

    sim.live().set_target_color(Rgb::new(1.0, 0.0, 0.0));
    run_frames(&mut sim, 5, 120);
    let scene = sim.scene();
    let lit = scene
        .connections
        .iter()
        .find(|c| c.activation > 0.2)
        .expect("some connection is lit");
    let rgba = scene.line_colors[lit.buffer_index];
    assert!(rgba[0] > rgba[2], "lit line should now lean red: {rgba:?}");
}

#[test]
fn test_builtin_presets_simulate() {
    for name in ["desktop", "mobile", "dormant"] {
        let config = presets::builtin(name).expect("builtin preset");
        let mut sim = build(config, 9);
        sim.scroll(100.0);
        run_frames(&mut sim, 0, 120);
        assert_eq!(sim.point_sizes().len(), sim.scene().cluster_count());
        assert!(sim.group().rotation.x.abs() <= std::f32::consts::FRAC_PI_2);
    }
}

#[test]
fn test_full_chance_lights_window_even_when_zoomed_past_view() {
    let mut config = VisualizationConfig::default();
    config.behavior.activation_chance = 1.0;
    config.behavior.scale_multiplier = 25.0;
    let mut sim = build(config, 10);
    sim.step(0.0);
    assert_eq!(sim.group().scale, 21.0);

    let n = sim.scene().connections.len();
    let window = ActivationEngine::window(n);
    let unlit = sim.scene().connections[..window]
        .iter()
        .filter(|c| c.target != 1.0)
        .count();
    assert_eq!(unlit, 0, "n={n} window={window}");
}
