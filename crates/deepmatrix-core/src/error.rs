use thiserror::Error;

/// Errors that can occur while configuring, mounting or running the lattice.
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("WebGPU adapter not found: {0}")]
    AdapterNotFound(String),

    #[error("Failed to request GPU device: {0}")]
    DeviceRequestFailed(String),

    #[error("Surface configuration failed: {0}")]
    SurfaceConfigFailed(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid color '{0}'")]
    InvalidColor(String),

    #[error("Failed to parse presets RON: {0}")]
    PresetParseError(String),

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    #[error("DOM operation failed: {0}")]
    Dom(String),
}

impl MatrixError {
    /// True when the failure means the browser cannot provide a 3D context at all.
    /// The embedding page shows the static fallback instead of an error.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            MatrixError::AdapterNotFound(_) | MatrixError::SurfaceConfigFailed(_)
        )
    }
}
