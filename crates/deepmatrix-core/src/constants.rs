//! Single source of truth for the lattice tuning constants.
//! Values shared with WGSL are injected into the shader preamble by the
//! renderer at pipeline creation.

// -- Frame timing --

/// Duration of one nominal frame at 60 fps, in milliseconds.
pub const NOMINAL_FRAME_MS: f64 = 1000.0 / 60.0;

/// Upper bound on the frame factor so a backgrounded tab does not produce a jump.
pub const MAX_FRAME_FACTOR: f32 = 3.0;

// -- Camera --

/// Vertical field of view in degrees.
pub const CAMERA_FOV_DEG: f32 = 40.0;

pub const CAMERA_NEAR: f32 = 0.1;

/// Minimum far plane distance. The far plane grows with the camera distance.
pub const CAMERA_MIN_FAR: f32 = 2000.0;

// -- Lattice group scale --

pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 21.0;

/// Applied to the external scale multiplier before clamping.
pub const BASE_SCALE_FACTOR: f32 = 0.85;

// -- Translation bounds --

/// Fraction of the viewport bound where the spring zone begins.
pub const SOFT_LIMIT_FRACTION: f32 = 0.6;

/// Fraction of the viewport bound kept free at the edge.
pub const HARD_LIMIT_MARGIN: f32 = 0.05;

/// Velocity retained (and reversed) on hard-limit contact.
pub const BOUNCE_RESTITUTION: f32 = 0.72;

/// Spring force per world unit of overshoot past the soft limit.
pub const SPRING_STIFFNESS: f32 = 0.015;

/// Pull toward the center applied when the lattice is idle.
pub const CENTERING_PULL: f32 = 0.004;

/// Translation speed (fraction of the smaller half extent) below which the lattice counts as idle.
pub const IDLE_SPEED_FRACTION: f32 = 0.002;

/// Per-frame translation velocity retention at 60 fps.
pub const TRANSLATION_DAMPING: f32 = 0.9;

// -- Rotation --

/// Rotation about X is kept within ±PITCH_LIMIT so the lattice never flips.
pub const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2;

/// Fraction of rotation velocity shed when a drag is released.
pub const RELEASE_FACTOR: f32 = 0.06;

/// Squared rotation speed under which user velocity snaps to zero.
pub const ROTATION_SNAP_EPSILON_SQ: f32 = 1.0e-9;

/// Squared translation speed under which translation velocity snaps to zero.
pub const TRANSLATION_SNAP_EPSILON_SQ: f32 = 1.0e-8;

// -- Autonomous rotation --

/// Per-frame probability of picking a new autonomous rotation target.
pub const AUTONOMOUS_RETARGET_CHANCE: f32 = 0.01;

/// Per-frame lerp rate of the live autonomous vector toward its target.
pub const AUTONOMOUS_LERP_RATE: f32 = 0.02;

/// Weight of the autonomous rotation in the glow intensity.
pub const AUTONOMOUS_GLOW_WEIGHT: f32 = 0.5;

// -- Reveal and color --

/// Reveal progress gained per nominal frame once triggered (50 frames to full).
pub const REVEAL_STEP: f32 = 0.02;

/// Per-frame blend rate of the displayed color toward the target color.
pub const COLOR_EASE_RATE: f32 = 0.06;

/// Gray level of a connection at rest.
pub const LINE_REST_GRAY: f32 = 0.6;

/// Opacity of a connection at rest. Fully active lines reach 1.0.
pub const LINE_REST_OPACITY: f32 = 0.2;

/// Brightness of the rest color before the lattice is revealed.
pub const DORMANT_BRIGHTNESS: f32 = 0.35;

// -- Hover interaction --

/// Rotation (radians) per pixel of hover motion at low speed.
pub const HOVER_BASE_ANGLE: f32 = 0.000_06;

/// Additional angle factor per px/ms of pointer speed.
pub const HOVER_SPEED_GAIN: f32 = 0.000_08;

/// Cap on the hover angle factor.
pub const HOVER_MAX_ANGLE: f32 = 0.000_4;

/// Fraction of the pointer's world-space motion converted to translation velocity.
pub const HOVER_TRANSLATION_GAIN: f32 = 0.04;

/// Additional translation gain per px/ms of pointer speed.
pub const HOVER_TRANSLATION_SPEED_GAIN: f32 = 0.02;

/// Cap on the translation gain.
pub const HOVER_MAX_TRANSLATION_GAIN: f32 = 0.12;

/// Floor on the elapsed time between hover samples, in milliseconds.
pub const HOVER_MIN_DT_MS: f64 = 4.0;

/// Scroll distance (CSS pixels) that counts as a meaningful interaction.
pub const SCROLL_REVEAL_THRESHOLD_PX: f64 = 12.0;

// -- Connection activation --

/// Activation below which a connection may be newly activated.
pub const ACTIVATION_THRESHOLD: f32 = 0.01;

/// Activation above which an active connection starts fading out.
pub const ACTIVATION_PEAK: f32 = 0.99;

/// Gap to the target under which a connection is considered settled.
pub const ACTIVATION_EPSILON: f32 = 1.0e-3;

/// The consideration window covers 1/N of the connections per frame.
pub const CONSIDERATION_DIVISOR: usize = 10;

// -- Lattice size limits --

/// Most tokens a lattice may hold across all stacks and layers.
pub const MAX_TOTAL_TOKENS: usize = 65_536;

/// Upper bound on sampled connections (intra- plus inter-layer).
pub const MAX_CONNECTIONS: usize = 1 << 19;

// -- Point clusters --

/// Rendered point size range, in CSS pixels.
pub const POINT_SIZE_MIN: f32 = 1.0;
pub const POINT_SIZE_MAX: f32 = 3.2;

/// Range of the per-cluster easing rate toward its target size.
pub const PULSE_SPEED_MIN: f32 = 0.01;
pub const PULSE_SPEED_MAX: f32 = 0.05;

/// Range of the per-cluster countdown between target re-rolls, in nominal frames.
pub const PULSE_COUNTDOWN_MIN: f32 = 45.0;
pub const PULSE_COUNTDOWN_MAX: f32 = 180.0;

// -- Glow overlay --

/// Glow intensity under which the overlay is hidden.
pub const GLOW_VISIBLE_THRESHOLD: f32 = 0.02;

/// Overlay opacity at full glow.
pub const GLOW_MAX_OPACITY: f32 = 0.35;

/// Overlay radius multiplier range (relative to the lattice bounding radius).
pub const GLOW_SCALE_MIN: f32 = 1.0;
pub const GLOW_SCALE_MAX: f32 = 1.35;
