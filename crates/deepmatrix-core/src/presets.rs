use serde::Deserialize;

use crate::config::{BehaviorConfig, LatticeConfig, VisualizationConfig};
use crate::error::MatrixError;

/// Presets shipped with the crate.
pub const BUILTIN_PRESETS: &str = include_str!("../presets/lattice.ron");

/// A named lattice configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub lattice: LatticeConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
}

impl Preset {
    pub fn config(&self) -> VisualizationConfig {
        VisualizationConfig {
            lattice: self.lattice.clone(),
            behavior: self.behavior.clone(),
        }
    }
}

/// Parse a RON list of presets. Every preset is validated.
pub fn load_presets_from_str(ron_str: &str) -> Result<Vec<Preset>, MatrixError> {
    let options = ron::Options::default();
    let presets: Vec<Preset> = options
        .from_str(ron_str)
        .map_err(|e| MatrixError::PresetParseError(e.to_string()))?;
    for preset in &presets {
        preset.config().validate().map_err(|e| {
            MatrixError::PresetParseError(format!("preset '{}': {e}", preset.name))
        })?;
    }
    Ok(presets)
}

/// Look up a built-in preset by name.
pub fn builtin(name: &str) -> Result<VisualizationConfig, MatrixError> {
    load_presets_from_str(BUILTIN_PRESETS)?
        .into_iter()
        .find(|p| p.name == name)
        .map(|p| p.config())
        .ok_or_else(|| MatrixError::UnknownPreset(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_presets_load() {
        let presets = load_presets_from_str(BUILTIN_PRESETS).expect("builtin presets parse");
        let names: Vec<&str> = presets.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"desktop"));
        assert!(names.contains(&"mobile"));
    }

    #[test]
    fn test_desktop_preset_values() {
        let cfg = builtin("desktop").expect("desktop exists");
        assert_eq!(cfg.lattice.layer_count, 8);
        assert_eq!(cfg.lattice.token_count, 64);
        assert_eq!(cfg.lattice.max_connections_per_token, 8);
        assert_eq!(cfg.behavior.fade_speed, 0.5);
        // Unspecified behavior fields keep their defaults
        assert_eq!(
            cfg.behavior.max_rotation_velocity,
            BehaviorConfig::default().max_rotation_velocity
        );
    }

    #[test]
    fn test_unknown_preset() {
        assert!(matches!(
            builtin("tablet"),
            Err(MatrixError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_malformed_ron_rejected() {
        assert!(load_presets_from_str("[ (name: ").is_err());
    }

    #[test]
    fn test_invalid_preset_rejected() {
        let ron = r#"[(name: "broken", lattice: (tokenCount: 0))]"#;
        assert!(matches!(
            load_presets_from_str(ron),
            Err(MatrixError::PresetParseError(_))
        ));
    }
}
