//! Per-frame motion integration for the lattice group: autonomous drift,
//! user-driven velocity, damping and the two-tier translation bounds.

use deepmatrix_core::config::BehaviorConfig;
use deepmatrix_core::constants::{
    AUTONOMOUS_LERP_RATE, AUTONOMOUS_RETARGET_CHANCE, BOUNCE_RESTITUTION, CENTERING_PULL,
    IDLE_SPEED_FRACTION, PITCH_LIMIT, REVEAL_STEP, ROTATION_SNAP_EPSILON_SQ, SPRING_STIFFNESS,
    TRANSLATION_DAMPING, TRANSLATION_SNAP_EPSILON_SQ,
};
use deepmatrix_core::math::decay;
use glam::{Vec2, Vec3};
use rand::Rng;

use crate::camera::{LatticeGroup, ViewportBounds};

/// Velocities and progress scalars owned by the frame loop.
#[derive(Debug, Clone)]
pub struct MotionState {
    /// User-driven angular velocity, radians per nominal frame.
    pub user_rotation_velocity: Vec3,
    /// View-plane velocity, world units per nominal frame.
    pub translation_velocity: Vec2,
    pub autonomous_rotation: Vec3,
    pub autonomous_target: Vec3,
    /// 0 until revealed, then rises monotonically to exactly 1.
    pub reveal_progress: f32,
    pub reveal_triggered: bool,
    pub dragging: bool,
}

impl MotionState {
    pub fn new(config: &BehaviorConfig) -> Self {
        let base = Vec3::from(config.autonomous_rotation_speed);
        Self {
            user_rotation_velocity: Vec3::ZERO,
            translation_velocity: Vec2::ZERO,
            autonomous_rotation: base,
            autonomous_target: base,
            reveal_progress: 0.0,
            reveal_triggered: false,
            dragging: false,
        }
    }

    /// Add to the user rotation velocity, keeping its magnitude within `max`.
    pub fn add_rotation_impulse(&mut self, delta: Vec3, max: f32) {
        self.user_rotation_velocity = (self.user_rotation_velocity + delta).clamp_length_max(max);
    }

    /// Add to the translation velocity, keeping its magnitude within `max`.
    pub fn add_translation_impulse(&mut self, delta: Vec2, max: f32) {
        self.translation_velocity = (self.translation_velocity + delta).clamp_length_max(max);
    }

    /// Drag release sheds a fixed fraction of the rotation velocity.
    pub fn release(&mut self, release_factor: f32) {
        self.dragging = false;
        self.user_rotation_velocity *= 1.0 - release_factor;
    }

    pub fn trigger_reveal(&mut self) {
        self.reveal_triggered = true;
    }

    pub fn advance_reveal(&mut self, factor: f32) {
        if !self.reveal_triggered {
            return;
        }
        self.reveal_progress = (self.reveal_progress + REVEAL_STEP * factor.max(0.0)).min(1.0);
    }

    /// Occasionally pick a new autonomous target around the base speeds, then
    /// ease the live vector toward it.
    pub fn drift_autonomous<R: Rng + ?Sized>(
        &mut self,
        config: &BehaviorConfig,
        factor: f32,
        rng: &mut R,
    ) {
        if rng.random::<f32>() < AUTONOMOUS_RETARGET_CHANCE {
            let base = Vec3::from(config.autonomous_rotation_speed);
            let j = config.autonomous_rotation_jitter.max(0.0);
            let jitter = Vec3::new(
                rng.random_range(-j..=j),
                rng.random_range(-j..=j),
                rng.random_range(-j..=j),
            );
            self.autonomous_target = base + jitter;
        }
        let t = (AUTONOMOUS_LERP_RATE * factor).clamp(0.0, 1.0);
        self.autonomous_rotation = self.autonomous_rotation.lerp(self.autonomous_target, t);
    }

    /// Advance translation, then keep the group inside the viewport bounds.
    pub fn integrate_translation(
        &mut self,
        group: &mut LatticeGroup,
        bounds: &ViewportBounds,
        factor: f32,
    ) {
        group.position += self.translation_velocity * factor;
        self.translation_velocity *= decay(TRANSLATION_DAMPING, factor);

        let idle = self.is_idle(bounds);
        let soft = bounds.soft_limit();
        let hard = bounds.hard_limit();

        for axis in 0..2 {
            let mut p = group.position[axis];
            let mut v = self.translation_velocity[axis];

            let overshoot = p.abs() - soft[axis];
            if overshoot > 0.0 {
                v -= p.signum() * overshoot * SPRING_STIFFNESS * factor;
            }
            if idle {
                v -= p * CENTERING_PULL * factor;
            }
            if p.abs() > hard[axis] {
                let side = p.signum();
                p = side * hard[axis];
                if v * side > 0.0 {
                    v = -v * BOUNCE_RESTITUTION;
                }
            }

            group.position[axis] = p;
            self.translation_velocity[axis] = v;
        }

        if self.translation_velocity.length_squared() < TRANSLATION_SNAP_EPSILON_SQ {
            self.translation_velocity = Vec2::ZERO;
        }
    }

    fn is_idle(&self, bounds: &ViewportBounds) -> bool {
        !self.dragging
            && self.user_rotation_velocity.length_squared() < ROTATION_SNAP_EPSILON_SQ * 100.0
            && self.translation_velocity.length() < IDLE_SPEED_FRACTION * bounds.min_half_extent()
    }

    /// Advance rotation by user plus autonomous velocity, then decay user velocity.
    pub fn integrate_rotation(
        &mut self,
        group: &mut LatticeGroup,
        config: &BehaviorConfig,
        factor: f32,
    ) {
        group.rotation += (self.user_rotation_velocity + self.autonomous_rotation) * factor;
        group.rotation.x = group.rotation.x.clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let retention = if self.dragging {
            config.drag_damping
        } else {
            config.inertia_decay
        };
        self.user_rotation_velocity *= decay(retention, factor);
        if self.user_rotation_velocity.length_squared() < ROTATION_SNAP_EPSILON_SQ {
            self.user_rotation_velocity = Vec3::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bounds() -> ViewportBounds {
        ViewportBounds {
            half_width: 100.0,
            half_height: 50.0,
        }
    }

    #[test]
    fn test_rotation_impulse_clamped() {
        let mut m = MotionState::new(&BehaviorConfig::default());
        for _ in 0..50 {
            m.add_rotation_impulse(Vec3::new(0.3, -0.2, 0.0), 0.08);
            assert!(m.user_rotation_velocity.length() <= 0.08 + 1e-6);
        }
    }

    #[test]
    fn test_release_sheds_six_percent() {
        let mut m = MotionState::new(&BehaviorConfig::default());
        m.dragging = true;
        m.user_rotation_velocity = Vec3::new(0.0, 0.05, 0.0);
        m.release(0.06);
        assert!(!m.dragging);
        assert!((m.user_rotation_velocity.y - 0.047).abs() < 1e-6);
    }

    #[test]
    fn test_reveal_monotonic_and_exact() {
        let mut m = MotionState::new(&BehaviorConfig::default());
        m.advance_reveal(1.0);
        assert_eq!(m.reveal_progress, 0.0, "no progress before trigger");

        m.trigger_reveal();
        let mut last = 0.0;
        for _ in 0..60 {
            m.advance_reveal(1.0);
            assert!(m.reveal_progress >= last);
            last = m.reveal_progress;
        }
        assert_eq!(m.reveal_progress, 1.0);
    }

    #[test]
    fn test_hard_limit_clamps_and_bounces() {
        let mut m = MotionState::new(&BehaviorConfig::default());
        let mut g = LatticeGroup::default();
        let b = bounds();
        m.translation_velocity = Vec2::new(500.0, 0.0);
        m.integrate_translation(&mut g, &b, 1.0);
        assert!((g.position.x - b.hard_limit().x).abs() < 1e-4);
        assert!(m.translation_velocity.x < 0.0, "velocity must reverse");
        // 500 * 0.9 damping, spring adds a bit more inward push, then 0.72 restitution
        assert!(m.translation_velocity.x.abs() <= 500.0 * 0.9 * 0.72 + 1.0);
    }

    #[test]
    fn test_position_always_within_hard_limit() {
        let mut m = MotionState::new(&BehaviorConfig::default());
        let mut g = LatticeGroup::default();
        let b = bounds();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..2_000 {
            let kick = Vec2::new(rng.random_range(-80.0..80.0), rng.random_range(-80.0..80.0));
            m.add_translation_impulse(kick, 200.0);
            let factor = rng.random_range(0.0..3.0);
            m.integrate_translation(&mut g, &b, factor);
            let hard = b.hard_limit();
            assert!(g.position.x.abs() <= hard.x + 1e-4);
            assert!(g.position.y.abs() <= hard.y + 1e-4);
        }
    }

    #[test]
    fn test_spring_pulls_back_from_soft_zone() {
        let mut m = MotionState::new(&BehaviorConfig::default());
        let b = bounds();
        let mut g = LatticeGroup {
            position: Vec2::new(b.soft_limit().x + 20.0, 0.0),
            ..Default::default()
        };
        m.integrate_translation(&mut g, &b, 1.0);
        assert!(m.translation_velocity.x < 0.0);
    }

    #[test]
    fn test_idle_lattice_recenters() {
        let mut m = MotionState::new(&BehaviorConfig::default());
        let b = bounds();
        let mut g = LatticeGroup {
            position: Vec2::new(20.0, -10.0),
            ..Default::default()
        };
        for _ in 0..3_000 {
            m.integrate_translation(&mut g, &b, 1.0);
        }
        assert!(g.position.length() < 1.0, "ended at {:?}", g.position);
    }

    #[test]
    fn test_translation_velocity_decays_to_zero() {
        let mut m = MotionState::new(&BehaviorConfig::default());
        let mut g = LatticeGroup::default();
        m.translation_velocity = Vec2::new(0.5, 0.5);
        for _ in 0..500 {
            m.integrate_translation(&mut g, &bounds(), 1.0);
        }
        assert_eq!(m.translation_velocity, Vec2::ZERO);
    }

    #[test]
    fn test_pitch_clamped() {
        let cfg = BehaviorConfig::default();
        let mut m = MotionState::new(&cfg);
        let mut g = LatticeGroup::default();
        m.dragging = true;
        for _ in 0..200 {
            m.add_rotation_impulse(Vec3::new(0.08, 0.0, 0.0), cfg.max_rotation_velocity);
            m.integrate_rotation(&mut g, &cfg, 1.0);
            assert!(g.rotation.x.abs() <= PITCH_LIMIT);
        }
        assert_eq!(g.rotation.x, PITCH_LIMIT);
    }

    #[test]
    fn test_yaw_unbounded() {
        let cfg = BehaviorConfig::default();
        let mut m = MotionState::new(&cfg);
        let mut g = LatticeGroup::default();
        m.dragging = true;
        for _ in 0..500 {
            m.add_rotation_impulse(Vec3::new(0.0, 0.08, 0.0), cfg.max_rotation_velocity);
            m.integrate_rotation(&mut g, &cfg, 1.0);
        }
        assert!(g.rotation.y > std::f32::consts::TAU);
    }

    #[test]
    fn test_inertia_snaps_to_zero() {
        let cfg = BehaviorConfig::default();
        let mut m = MotionState::new(&cfg);
        let mut g = LatticeGroup::default();
        m.user_rotation_velocity = Vec3::new(0.05, 0.05, 0.0);
        for _ in 0..1_000 {
            m.integrate_rotation(&mut g, &cfg, 1.0);
        }
        assert_eq!(m.user_rotation_velocity, Vec3::ZERO);
    }

    #[test]
    fn test_drag_damping_stronger_than_inertia() {
        let cfg = BehaviorConfig::default();
        let mut dragging = MotionState::new(&cfg);
        let mut coasting = MotionState::new(&cfg);
        dragging.dragging = true;
        dragging.user_rotation_velocity = Vec3::Y * 0.05;
        coasting.user_rotation_velocity = Vec3::Y * 0.05;
        let mut g = LatticeGroup::default();
        dragging.integrate_rotation(&mut g, &cfg, 1.0);
        coasting.integrate_rotation(&mut g, &cfg, 1.0);
        assert!(dragging.user_rotation_velocity.y < coasting.user_rotation_velocity.y);
    }

    #[test]
    fn test_autonomous_stays_near_base() {
        let cfg = BehaviorConfig::default();
        let mut m = MotionState::new(&cfg);
        let mut rng = StdRng::seed_from_u64(3);
        let base = Vec3::from(cfg.autonomous_rotation_speed);
        for _ in 0..5_000 {
            m.drift_autonomous(&cfg, 1.0, &mut rng);
            let dev = (m.autonomous_rotation - base).abs().max_element();
            assert!(dev <= cfg.autonomous_rotation_jitter + 1e-6);
        }
    }
}
