pub mod color;
pub mod config;
pub mod constants;
pub mod error;
pub mod math;
pub mod presets;
pub mod types;

pub use color::Rgb;
pub use config::{BehaviorConfig, LatticeConfig, VisualizationConfig};
pub use error::MatrixError;
