use deepmatrix_core::constants::{
    ACTIVATION_EPSILON, ACTIVATION_PEAK, ACTIVATION_THRESHOLD, CONSIDERATION_DIVISOR,
    LINE_REST_OPACITY,
};
use deepmatrix_core::math::ease;
use deepmatrix_core::Rgb;
use rand::Rng;

use crate::scene::Connection;

/// Line vertex color for a connection at the given activation.
pub fn line_color(rest: Rgb, glow: Rgb, activation: f32) -> [f32; 4] {
    let a = activation.clamp(0.0, 1.0);
    rest.lerp(glow, a)
        .with_alpha(LINE_REST_OPACITY + (1.0 - LINE_REST_OPACITY) * a)
}

/// Drives connection activations: a rotating window of candidates may light up
/// each frame, and every lit connection eases up to its peak and back to rest.
#[derive(Debug, Clone, Default)]
pub struct ActivationEngine {
    cursor: usize,
    dirty: bool,
}

impl ActivationEngine {
    /// Size of the candidate window for `connection_count` connections.
    pub fn window(connection_count: usize) -> usize {
        (connection_count / CONSIDERATION_DIVISOR).max(1)
    }

    /// Roll for new activations over the next window of connections.
    /// Connections that are already lit are skipped.
    pub fn consider<R>(&mut self, connections: &mut [Connection], chance: f32, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let n = connections.len();
        if n == 0 {
            return;
        }
        let window = Self::window(n).min(n);
        for _ in 0..window {
            let i = self.cursor % n;
            self.cursor = (i + 1) % n;
            let c = &mut connections[i];
            if c.activation < ACTIVATION_THRESHOLD
                && c.target == 0.0
                && rng.random::<f32>() < chance
            {
                c.target = 1.0;
            }
        }
    }

    /// Ease activations toward their targets and rewrite the vertex colors
    /// of every connection that changed. Connections rejected by `is_visible`
    /// hold their state until they come back into view.
    #[allow(clippy::too_many_arguments)]
    pub fn advance<F>(
        &mut self,
        connections: &mut [Connection],
        colors: &mut [[f32; 4]],
        fade_speed: f32,
        factor: f32,
        rest: Rgb,
        glow: Rgb,
        mut is_visible: F,
    ) where
        F: FnMut(&Connection) -> bool,
    {
        for c in connections.iter_mut() {
            if (c.target - c.activation).abs() <= ACTIVATION_EPSILON || !is_visible(c) {
                continue;
            }
            c.activation = ease(c.activation, c.target, fade_speed, factor);
            if c.target == 1.0 && c.activation > ACTIVATION_PEAK {
                c.target = 0.0;
            } else if c.target == 0.0 && c.activation <= ACTIVATION_EPSILON {
                c.activation = 0.0;
            }

            let rgba = line_color(rest, glow, c.activation);
            colors[c.buffer_index] = rgba;
            colors[c.buffer_index + 1] = rgba;
            self.dirty = true;
        }
    }

    /// Repaint every line with the current glow color (used when the color eases).
    pub fn repaint(
        &mut self,
        connections: &[Connection],
        colors: &mut [[f32; 4]],
        rest: Rgb,
        glow: Rgb,
    ) {
        for c in connections.iter().filter(|c| c.activation > 0.0) {
            let rgba = line_color(rest, glow, c.activation);
            colors[c.buffer_index] = rgba;
            colors[c.buffer_index + 1] = rgba;
            self.dirty = true;
        }
    }

    /// True once if any color changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::LatticeScene;
    use deepmatrix_core::constants::LINE_REST_GRAY;
    use deepmatrix_core::LatticeConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rest() -> Rgb {
        Rgb::gray(LINE_REST_GRAY)
    }

    fn scene(rng: &mut StdRng) -> LatticeScene {
        let config = LatticeConfig {
            layer_count: 3,
            token_count: 9,
            ..Default::default()
        };
        LatticeScene::build(&config, rest().with_alpha(LINE_REST_OPACITY), rng)
    }

    #[test]
    fn test_window_size() {
        assert_eq!(ActivationEngine::window(0), 1);
        assert_eq!(ActivationEngine::window(9), 1);
        assert_eq!(ActivationEngine::window(250), 25);
    }

    #[test]
    fn test_chance_one_lights_whole_window() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = scene(&mut rng);
        let mut engine = ActivationEngine::default();
        let n = s.connections.len();
        let window = ActivationEngine::window(n);
        engine.consider(&mut s.connections, 1.0, &mut rng);
        let lit = s.connections.iter().filter(|c| c.target == 1.0).count();
        assert_eq!(lit, window);
    }

    #[test]
    fn test_chance_zero_never_lights() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut s = scene(&mut rng);
        let mut engine = ActivationEngine::default();
        for _ in 0..100 {
            engine.consider(&mut s.connections, 0.0, &mut rng);
        }
        assert!(s.connections.iter().all(|c| c.target == 0.0));
    }

    #[test]
    fn test_offscreen_connections_hold_fade() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut s = scene(&mut rng);
        let mut engine = ActivationEngine::default();
        for _ in 0..20 {
            engine.consider(&mut s.connections, 1.0, &mut rng);
        }
        let lit = s.connections.iter().filter(|c| c.target == 1.0).count();
        assert!(lit > 0);

        let before: Vec<f32> = s.connections.iter().map(|c| c.activation).collect();
        for _ in 0..50 {
            engine.advance(&mut s.connections, &mut s.line_colors, 0.1, 1.0, rest(), Rgb::WHITE, |_| false);
        }
        let after: Vec<f32> = s.connections.iter().map(|c| c.activation).collect();
        assert_eq!(before, after);
        assert!(!engine.take_dirty());

        engine.advance(&mut s.connections, &mut s.line_colors, 0.1, 1.0, rest(), Rgb::WHITE, |_| true);
        assert!(s.connections.iter().any(|c| c.activation > 0.0));
        assert!(engine.take_dirty());
    }

    #[test]
    fn test_cycle_up_then_down_to_rest() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut s = scene(&mut rng);
        let mut engine = ActivationEngine::default();
        s.connections[0].target = 1.0;
        let glow = Rgb::new(0.0, 0.0, 1.0);

        let mut peak = 0.0f32;
        let mut flipped = false;
        for _ in 0..2_000 {
            engine.advance(&mut s.connections, &mut s.line_colors, 0.1, 1.0, rest(), glow, |_| true);
            let c = &s.connections[0];
            assert!((0.0..=1.0).contains(&c.activation));
            peak = peak.max(c.activation);
            flipped |= c.target == 0.0;
        }
        assert!(flipped);
        assert!(peak > ACTIVATION_PEAK);
        assert_eq!(s.connections[0].activation, 0.0);
        let idx = s.connections[0].buffer_index;
        assert_eq!(s.line_colors[idx], rest().with_alpha(LINE_REST_OPACITY));
        assert_eq!(s.line_colors[idx], s.line_colors[idx + 1]);
    }

    #[test]
    fn test_advance_marks_dirty_only_on_change() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut s = scene(&mut rng);
        let mut engine = ActivationEngine::default();
        engine.advance(&mut s.connections, &mut s.line_colors, 0.05, 1.0, rest(), Rgb::WHITE, |_| true);
        assert!(!engine.take_dirty());

        s.connections[1].target = 1.0;
        engine.advance(&mut s.connections, &mut s.line_colors, 0.05, 1.0, rest(), Rgb::WHITE, |_| true);
        assert!(engine.take_dirty());
        assert!(!engine.take_dirty());
    }

    #[test]
    fn test_line_color_endpoints() {
        let glow = Rgb::new(0.0, 0.0, 1.0);
        assert_eq!(line_color(rest(), glow, 0.0), [0.6, 0.6, 0.6, 0.2]);
        let full = line_color(rest(), glow, 1.0);
        assert_eq!(full, [0.0, 0.0, 1.0, 1.0]);
    }
}
