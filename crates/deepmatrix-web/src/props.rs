use deepmatrix_core::{presets, MatrixError, VisualizationConfig};

/// Parse the page's props JSON. Missing fields take their defaults; `None` or
/// blank input yields the default configuration.
pub fn parse_props(json: Option<&str>) -> Result<VisualizationConfig, MatrixError> {
    let config = match json.map(str::trim) {
        None | Some("") => VisualizationConfig::default(),
        Some(text) => serde_json::from_str(text)
            .map_err(|e| MatrixError::InvalidConfig(format!("props: {e}")))?,
    };
    config.validate()?;
    Ok(config)
}

/// Built-in preset as props JSON, for pages that want to start from one.
pub fn preset_json(name: &str) -> Result<String, MatrixError> {
    let config = presets::builtin(name)?;
    serde_json::to_string(&config).map_err(|e| MatrixError::InvalidConfig(e.to_string()))
}
