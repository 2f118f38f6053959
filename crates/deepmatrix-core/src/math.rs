use crate::constants::{MAX_FRAME_FACTOR, NOMINAL_FRAME_MS};

/// Hermite smoothstep between `edge0` and `edge1`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Convert a wall-clock frame delta into a multiple of the nominal 60 fps step.
/// Clamped to [0, MAX_FRAME_FACTOR]; a non-finite or negative delta yields 0.
pub fn frame_factor(elapsed_ms: f64) -> f32 {
    if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
        return 0.0;
    }
    ((elapsed_ms / NOMINAL_FRAME_MS) as f32).min(MAX_FRAME_FACTOR)
}

/// Frame-rate independent exponential decay: `retention` is the per-nominal-frame
/// factor, `factor` the number of nominal frames elapsed.
pub fn decay(retention: f32, factor: f32) -> f32 {
    retention.clamp(0.0, 1.0).powf(factor.max(0.0))
}

/// Ease `current` toward `target` by `rate` of the gap, scaled by the frame factor.
/// The effective rate never overshoots.
pub fn ease(current: f32, target: f32, rate: f32, factor: f32) -> f32 {
    let t = (rate * factor).clamp(0.0, 1.0);
    current + (target - current) * t
}
