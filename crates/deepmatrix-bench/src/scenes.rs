use deepmatrix_core::{presets, LatticeConfig, MatrixError, VisualizationConfig};
use deepmatrix_sim::{PointerSample, Simulation};

/// Canvas size the benchmark simulates at, in CSS pixels.
pub const VIEWPORT: (f32, f32) = (1280.0, 720.0);

/// Nominal frame interval fed to the simulation clock.
pub const FRAME_MS: f64 = 1000.0 / 60.0;

/// Synthetic input replayed while a scene runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputScript {
    /// No input after the initial reveal.
    Idle,
    /// A pointer held down and circling the center.
    Drag,
    /// A pointer sweeping across the lattice without a button.
    Hover,
}

/// Configuration for a single benchmark scene.
pub struct SceneConfig {
    pub name: &'static str,
    pub preset: &'static str,
    /// Replaces the preset's lattice when set.
    pub lattice: Option<LatticeConfig>,
    /// Replaces the preset's activation chance when set.
    pub activation_chance: Option<f32>,
    pub input: InputScript,
}

impl SceneConfig {
    pub fn config(&self) -> Result<VisualizationConfig, MatrixError> {
        let mut config = presets::builtin(self.preset)?;
        if let Some(lattice) = &self.lattice {
            config.lattice = lattice.clone();
        }
        if let Some(chance) = self.activation_chance {
            config.behavior.activation_chance = chance;
        }
        config.validate()?;
        Ok(config)
    }

    /// Feed this scene's input for `frame` into `sim`.
    pub fn drive(&self, sim: &mut Simulation, frame: u32) {
        let now = frame as f64 * FRAME_MS;
        if frame == 0 {
            sim.scroll(100.0);
        }
        match self.input {
            InputScript::Idle => {}
            InputScript::Drag => {
                let (x, y) = orbit(frame);
                if frame == 0 {
                    sim.pointer_down(1, PointerSample::new(x, y, now));
                } else {
                    sim.pointer_move(1, PointerSample::new(x, y, now));
                }
            }
            InputScript::Hover => {
                let (x, y) = sweep(frame);
                sim.pointer_move(1, PointerSample::new(x, y, now));
            }
        }
    }
}

fn orbit(frame: u32) -> (f32, f32) {
    let angle = frame as f32 * 0.05;
    let radius = VIEWPORT.1 * 0.25;
    (
        VIEWPORT.0 * 0.5 + radius * angle.cos(),
        VIEWPORT.1 * 0.5 + radius * angle.sin(),
    )
}

/// Back and forth across the middle band, one pass per 120 frames.
fn sweep(frame: u32) -> (f32, f32) {
    let phase = (frame % 240) as f32 / 120.0;
    let t = if phase <= 1.0 { phase } else { 2.0 - phase };
    (VIEWPORT.0 * (0.2 + 0.6 * t), VIEWPORT.1 * 0.5)
}

/// Return the standard suite: both page presets, driven and idle, plus a dense lattice.
pub fn standard_scenes() -> Vec<SceneConfig> {
    vec![
        SceneConfig {
            name: "desktop-idle",
            preset: "desktop",
            lattice: None,
            activation_chance: None,
            input: InputScript::Idle,
        },
        SceneConfig {
            name: "desktop-drag",
            preset: "desktop",
            lattice: None,
            activation_chance: None,
            input: InputScript::Drag,
        },
        SceneConfig {
            name: "desktop-hover",
            preset: "desktop",
            lattice: None,
            activation_chance: None,
            input: InputScript::Hover,
        },
        SceneConfig {
            name: "mobile-idle",
            preset: "mobile",
            lattice: None,
            activation_chance: None,
            input: InputScript::Idle,
        },
        SceneConfig {
            name: "activation-storm",
            preset: "desktop",
            lattice: None,
            activation_chance: Some(1.0),
            input: InputScript::Idle,
        },
        SceneConfig {
            name: "dense",
            preset: "desktop",
            lattice: Some(LatticeConfig {
                stack_count: 3,
                layer_count: 12,
                token_count: 144,
                horizontal_spacing: 12.0,
                vertical_spacing: 12.0,
                stack_spacing: 160.0,
                layer_spacing: 14.0,
                max_connections_per_token: 8,
            }),
            activation_chance: None,
            input: InputScript::Hover,
        },
    ]
}
