//! Configuration management

use crate::error::{Result, VidgrabError};
use crate::types::Config;
use crate::utils::paths::{ensure_dir, get_config_dir, get_config_path};
use std::path::Path;
use tokio::fs;
use tokio::process::Command;
use tracing::debug;

/// Load configuration from the default location
pub async fn load_config() -> Result<Config> {
    load_config_from(Path::new(&get_config_path())).await
}

/// Load configuration from `path`, falling back to defaults.
///
/// Fields missing from the file keep their default values.
pub async fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path).await?;
    let mut config: Config = serde_json::from_str(&content)
        .map_err(|e| VidgrabError::InvalidConfig(format!("{}: {}", path.display(), e)))?;

    let defaults = Config::default();
    if config.output_dir.trim().is_empty() {
        config.output_dir = defaults.output_dir;
    }
    if config.output_template.trim().is_empty() {
        config.output_template = defaults.output_template;
    }
    if config.yt_dlp_path.trim().is_empty() {
        config.yt_dlp_path = defaults.yt_dlp_path;
    }
    if config.ffmpeg_location.as_deref().is_some_and(|l| l.trim().is_empty()) {
        config.ffmpeg_location = None;
    }

    Ok(config)
}

/// Save configuration to file
pub async fn save_config(config: &Config) -> Result<()> {
    ensure_dir(get_config_dir()).await?;
    save_config_to(config, Path::new(&get_config_path())).await
}

async fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content).await?;
    Ok(())
}

/// Open config file in editor
pub async fn edit_config(editor: &str) -> Result<()> {
    let config_path = get_config_path();

    // Ensure config file exists
    if !Path::new(&config_path).exists() {
        save_config(&Config::default()).await?;
    }

    Command::new(editor)
        .arg(&config_path)
        .status()
        .await?;

    Ok(())
}
