use deepmatrix_core::constants::{
    AUTONOMOUS_GLOW_WEIGHT, DORMANT_BRIGHTNESS, GLOW_MAX_OPACITY, GLOW_SCALE_MAX, GLOW_SCALE_MIN,
    GLOW_VISIBLE_THRESHOLD,
};
use deepmatrix_core::math::smoothstep;
use deepmatrix_core::Rgb;

use crate::motion::MotionState;

/// Glow billboard drawn behind the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlowOverlay {
    pub visible: bool,
    pub opacity: f32,
    /// Radius multiplier relative to the lattice bounding radius.
    pub scale: f32,
}

/// Everything the renderer needs from one simulation step besides geometry.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameVisuals {
    /// Motion-driven intensity, gated by reveal progress. 0..1.
    pub glow: f32,
    /// Displayed connection color (eased toward the page's target color).
    pub glow_color: Rgb,
    pub point_color: Rgb,
    pub point_opacity: f32,
    /// Multiplier on line colors; dims the lattice until revealed.
    pub line_brightness: f32,
    pub overlay: GlowOverlay,
}

/// Normalized motion energy: user rotation plus weighted autonomous rotation.
pub fn glow_intensity(motion: &MotionState, max_rotation_velocity: f32) -> f32 {
    let energy = motion.user_rotation_velocity.length()
        + AUTONOMOUS_GLOW_WEIGHT * motion.autonomous_rotation.length();
    let normalized = if max_rotation_velocity > 0.0 {
        (energy / max_rotation_velocity).clamp(0.0, 1.0)
    } else {
        0.0
    };
    smoothstep(0.0, 1.0, normalized) * motion.reveal_progress.clamp(0.0, 1.0)
}

impl FrameVisuals {
    pub fn compute(motion: &MotionState, max_rotation_velocity: f32, glow_color: Rgb) -> Self {
        let glow = glow_intensity(motion, max_rotation_velocity);
        let reveal = motion.reveal_progress.clamp(0.0, 1.0);

        let brightness = 1.0 - (1.0 - DORMANT_BRIGHTNESS) * (1.0 - reveal);
        let point_color = Rgb::gray(brightness).lerp(glow_color, glow * 0.5);

        Self {
            glow,
            glow_color,
            point_color,
            point_opacity: 0.55 + 0.45 * reveal,
            line_brightness: brightness,
            overlay: GlowOverlay {
                visible: glow > GLOW_VISIBLE_THRESHOLD,
                opacity: glow * GLOW_MAX_OPACITY,
                scale: GLOW_SCALE_MIN + (GLOW_SCALE_MAX - GLOW_SCALE_MIN) * glow,
            },
        }
    }
}
