use crate::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CoinFilterConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    debug!("Config file content length: {} bytes", content.len());

    let substituted = substitution::substitute_env_vars(&content)?;
    if substitution::has_unresolved_env_vars(&substituted) {
        warn!(?path, "Configuration still contains unresolved environment placeholders");
    }
    debug!("Environment variable substitution completed");

    // An empty document deserializes to unit, not to an empty mapping
    if substituted.trim().is_empty() {
        info!("Configuration file is empty, using defaults");
        return Ok(CoinFilterConfig::default());
    }

    let config: CoinFilterConfig = serde_yaml::from_str(&substituted)
        .with_context(|| "Failed to parse YAML configuration")?;

    info!("Configuration loaded successfully");
    Ok(config)
}

/// Load the file at `path`, or fall back to defaults when no path is given.
pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<CoinFilterConfig> {
    match path {
        Some(path) => load_config(path),
        None => {
            info!("No configuration file given, using defaults");
            Ok(generate_default_config())
        }
    }
}

#[instrument]
pub fn generate_default_config() -> CoinFilterConfig {
    CoinFilterConfig::default()
}

#[instrument]
pub fn save_config<P: AsRef<Path> + std::fmt::Debug>(
    config: &CoinFilterConfig,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    info!("Saving configuration to: {:?}", path);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config)
        .with_context(|| "Failed to serialize configuration to YAML")?;

    fs::write(path, yaml).with_context(|| format!("Failed to write config file: {:?}", path))?;

    info!("Configuration saved successfully");
    Ok(())
}
