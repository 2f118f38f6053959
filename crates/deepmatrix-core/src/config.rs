use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::constants::{BASE_SCALE_FACTOR, MAX_CONNECTIONS, MAX_SCALE, MAX_TOTAL_TOKENS, MIN_SCALE};
use crate::error::MatrixError;

/// Structural parameters. Any change requires tearing down and rebuilding the scene,
/// since the connection topology depends on every one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LatticeConfig {
    /// Number of stacks along Y.
    pub stack_count: u32,
    /// Layers per stack along Z.
    pub layer_count: u32,
    /// Tokens per layer.
    pub token_count: u32,
    pub horizontal_spacing: f32,
    pub vertical_spacing: f32,
    pub stack_spacing: f32,
    pub layer_spacing: f32,
    pub max_connections_per_token: u32,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            stack_count: 1,
            layer_count: 4,
            token_count: 16,
            horizontal_spacing: 20.0,
            vertical_spacing: 6.0,
            stack_spacing: 20.0,
            layer_spacing: 10.0,
            max_connections_per_token: 4,
        }
    }
}

impl LatticeConfig {
    /// True when switching from `self` to `other` needs a full scene rebuild.
    pub fn requires_rebuild(&self, other: &LatticeConfig) -> bool {
        self != other
    }

    /// Camera distance along +Z for the given zoom factor.
    pub fn camera_distance(&self, camera_zoom: f32) -> f32 {
        let by_stacks = self.stack_count as f32 * self.stack_spacing;
        let by_layers = self.layer_count as f32 * self.layer_spacing * camera_zoom;
        by_stacks.max(by_layers)
    }

    /// Total token count across all stacks and layers.
    pub fn total_tokens(&self) -> usize {
        self.checked_total_tokens().unwrap_or(usize::MAX)
    }

    fn checked_total_tokens(&self) -> Option<usize> {
        (self.stack_count as usize)
            .checked_mul(self.layer_count as usize)?
            .checked_mul(self.token_count as usize)
    }

    /// Most connections the sampler can produce: every token links up to
    /// `max_connections_per_token` times within its layer and again to the next.
    pub fn max_connections(&self) -> Option<usize> {
        self.checked_total_tokens()?
            .checked_mul(self.max_connections_per_token as usize)?
            .checked_mul(2)
    }

    pub fn validate(&self) -> Result<(), MatrixError> {
        let counts = [
            ("stackCount", self.stack_count),
            ("layerCount", self.layer_count),
            ("tokenCount", self.token_count),
            ("maxConnectionsPerToken", self.max_connections_per_token),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(MatrixError::InvalidConfig(format!("{name} must be positive")));
            }
        }

        match self.checked_total_tokens() {
            Some(total) if total <= MAX_TOTAL_TOKENS => {}
            _ => {
                return Err(MatrixError::InvalidConfig(format!(
                    "lattice exceeds {MAX_TOTAL_TOKENS} tokens"
                )))
            }
        }
        match self.max_connections() {
            Some(total) if total <= MAX_CONNECTIONS => {}
            _ => {
                return Err(MatrixError::InvalidConfig(format!(
                    "maxConnectionsPerToken allows more than {MAX_CONNECTIONS} connections"
                )))
            }
        }

        let spacings = [
            ("horizontalSpacing", self.horizontal_spacing),
            ("verticalSpacing", self.vertical_spacing),
            ("stackSpacing", self.stack_spacing),
            ("layerSpacing", self.layer_spacing),
        ];
        for (name, value) in spacings {
            if !value.is_finite() || value <= 0.0 {
                return Err(MatrixError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Cosmetic and behavioral parameters. Changing these never rebuilds the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BehaviorConfig {
    /// Glow color of active connections (any CSS color accepted by [`Rgb::parse`]).
    pub connection_color: String,
    pub camera_zoom: f32,
    /// Probability per frame that a considered, inactive connection activates.
    pub activation_chance: f32,
    /// Fraction of the gap to the target covered per frame.
    pub fade_speed: f32,
    /// Rotation velocity per pixel of drag.
    pub interaction_sensitivity: f32,
    /// Per-frame velocity retention while dragging.
    pub drag_damping: f32,
    /// Per-frame velocity retention after release.
    pub inertia_decay: f32,
    pub max_rotation_velocity: f32,
    /// Base autonomous rotation per axis (radians per frame).
    pub autonomous_rotation_speed: [f32; 3],
    /// Maximum random deviation of the autonomous target from the base speed.
    pub autonomous_rotation_jitter: f32,
    /// Maximum translation speed as a fraction of the smaller viewport half extent.
    pub max_translation_speed: f32,
    pub scale_multiplier: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            connection_color: "#0000ff".to_string(),
            camera_zoom: 1.5,
            activation_chance: 0.002,
            fade_speed: 0.05,
            interaction_sensitivity: 0.0025,
            drag_damping: 0.85,
            inertia_decay: 0.95,
            max_rotation_velocity: 0.08,
            autonomous_rotation_speed: [0.0, 0.001, 0.0],
            autonomous_rotation_jitter: 0.0006,
            max_translation_speed: 0.02,
            scale_multiplier: 1.0,
        }
    }
}

impl BehaviorConfig {
    pub fn connection_rgb(&self) -> Result<Rgb, MatrixError> {
        Rgb::parse(&self.connection_color)
    }

    pub fn validate(&self) -> Result<(), MatrixError> {
        self.connection_rgb()?;

        let in_range = |name: &str, value: f32, lo: f32, hi: f32| {
            if value.is_finite() && (lo..=hi).contains(&value) {
                Ok(())
            } else {
                Err(MatrixError::InvalidConfig(format!(
                    "{name} must be within [{lo}, {hi}], got {value}"
                )))
            }
        };

        in_range("activationChance", self.activation_chance, 0.0, 1.0)?;
        in_range("fadeSpeed", self.fade_speed, f32::MIN_POSITIVE, 1.0)?;
        in_range("dragDamping", self.drag_damping, 0.0, 1.0)?;
        in_range("inertiaDecay", self.inertia_decay, 0.0, 1.0)?;
        in_range("cameraZoom", self.camera_zoom, f32::MIN_POSITIVE, f32::MAX)?;
        in_range("maxRotationVelocity", self.max_rotation_velocity, f32::MIN_POSITIVE, f32::MAX)?;
        in_range("interactionSensitivity", self.interaction_sensitivity, 0.0, f32::MAX)?;
        in_range("autonomousRotationJitter", self.autonomous_rotation_jitter, 0.0, f32::MAX)?;
        in_range("maxTranslationSpeed", self.max_translation_speed, 0.0, 1.0)?;
        for speed in self.autonomous_rotation_speed {
            if !speed.is_finite() {
                return Err(MatrixError::InvalidConfig(
                    "autonomousRotationSpeed must be finite".into(),
                ));
            }
        }
        if !self.scale_multiplier.is_finite() {
            return Err(MatrixError::InvalidConfig("scaleMultiplier must be finite".into()));
        }
        Ok(())
    }
}

/// Full set of props the embedding page passes, flat as in the page markup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    #[serde(flatten)]
    pub lattice: LatticeConfig,
    #[serde(flatten)]
    pub behavior: BehaviorConfig,
}

impl VisualizationConfig {
    pub fn validate(&self) -> Result<(), MatrixError> {
        self.lattice.validate()?;
        self.behavior.validate()
    }
}

/// Lattice group scale for an external multiplier: base factor applied, then clamped.
pub fn effective_scale(multiplier: f32) -> f32 {
    let multiplier = if multiplier.is_finite() { multiplier } else { 1.0 };
    (BASE_SCALE_FACTOR * multiplier).clamp(MIN_SCALE, MAX_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        VisualizationConfig::default()
            .validate()
            .expect("defaults must validate");
    }

    #[test]
    fn test_camera_distance_takes_larger_extent() {
        let cfg = LatticeConfig {
            stack_count: 1,
            layer_count: 8,
            layer_spacing: 21.33,
            stack_spacing: 21.33,
            ..Default::default()
        };
        let d = cfg.camera_distance(6.0);
        assert!((d - 8.0 * 21.33 * 6.0).abs() < 1e-3);

        let tall = LatticeConfig {
            stack_count: 50,
            layer_count: 1,
            ..Default::default()
        };
        assert_eq!(tall.camera_distance(1.0), 50.0 * 20.0);
    }

    #[test]
    fn test_zero_counts_rejected() {
        let cfg = LatticeConfig {
            token_count: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(MatrixError::InvalidConfig(_))));
    }

    #[test]
    fn test_oversized_lattice_rejected() {
        let huge = LatticeConfig {
            stack_count: 100_000,
            layer_count: 100_000,
            token_count: 100_000,
            max_connections_per_token: 100_000,
            ..Default::default()
        };
        assert!(matches!(huge.validate(), Err(MatrixError::InvalidConfig(_))));

        let overflow = LatticeConfig {
            stack_count: u32::MAX,
            layer_count: u32::MAX,
            token_count: u32::MAX,
            ..Default::default()
        };
        assert!(matches!(overflow.validate(), Err(MatrixError::InvalidConfig(_))));

        // Few tokens, but far too many links per token.
        let dense_links = LatticeConfig {
            max_connections_per_token: u32::MAX,
            ..Default::default()
        };
        assert!(matches!(dense_links.validate(), Err(MatrixError::InvalidConfig(_))));
    }

    #[test]
    fn test_size_limits_are_inclusive() {
        let at_limit = LatticeConfig {
            stack_count: 1,
            layer_count: 1,
            token_count: MAX_TOTAL_TOKENS as u32,
            max_connections_per_token: 1,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());
        let over = LatticeConfig {
            token_count: MAX_TOTAL_TOKENS as u32 + 1,
            ..at_limit
        };
        assert!(over.validate().is_err());
    }

    #[test]
    fn test_bad_spacing_rejected() {
        let cfg = LatticeConfig {
            layer_spacing: f32::NAN,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_behavior_ranges() {
        let mut b = BehaviorConfig {
            activation_chance: 1.5,
            ..Default::default()
        };
        assert!(b.validate().is_err());
        b.activation_chance = 1.0;
        assert!(b.validate().is_ok());
        b.fade_speed = 0.0;
        assert!(b.validate().is_err());
        b.fade_speed = 1.0;
        b.connection_color = "not-a-color".into();
        assert!(matches!(b.validate(), Err(MatrixError::InvalidColor(_))));
    }

    #[test]
    fn test_structural_change_detection() {
        let a = LatticeConfig::default();
        let mut b = a.clone();
        assert!(!a.requires_rebuild(&b));
        b.max_connections_per_token += 1;
        assert!(a.requires_rebuild(&b));
    }

    #[test]
    fn test_effective_scale_clamped() {
        assert!((effective_scale(1.0) - BASE_SCALE_FACTOR).abs() < 1e-6);
        assert_eq!(effective_scale(0.0), MIN_SCALE);
        assert_eq!(effective_scale(1_000.0), MAX_SCALE);
        assert!((effective_scale(f32::NAN) - BASE_SCALE_FACTOR).abs() < 1e-6);
    }

    #[test]
    fn test_page_props_deserialize() {
        let json = r##"{
            "stackCount": 1,
            "layerCount": 6,
            "tokenCount": 36,
            "horizontalSpacing": 12,
            "maxConnectionsPerToken": 6,
            "cameraZoom": 7,
            "activationChance": 0.012,
            "fadeSpeed": 0.42,
            "connectionColor": "#3b82f6",
            "scaleMultiplier": 1
        }"##;
        let cfg: VisualizationConfig = serde_json::from_str(json).expect("valid props");
        assert_eq!(cfg.lattice.layer_count, 6);
        assert_eq!(cfg.lattice.token_count, 36);
        assert_eq!(cfg.lattice.vertical_spacing, 6.0); // default kept
        assert_eq!(cfg.behavior.camera_zoom, 7.0);
        assert_eq!(cfg.behavior.connection_color, "#3b82f6");
        cfg.validate().expect("page props validate");
    }
}
