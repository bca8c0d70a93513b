//! Path utilities for vidgrab
//!
//! Respects XDG Base Directory Specification

use crate::error::Result;
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;

const APP_NAME: &str = "vidgrab";

/// Get config directory path
/// Respects XDG_CONFIG_HOME, defaults to ~/.config/vidgrab
pub fn get_config_dir() -> String {
    let base = env::var("XDG_CONFIG_HOME")
        .unwrap_or_else(|_| {
            dirs::config_dir()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_else(|| format!("{}/.config", env::var("HOME").unwrap_or_default()))
        });

    format!("{}/{}", base, APP_NAME)
}

/// Get config file path
pub fn get_config_path() -> String {
    format!("{}/config.json", get_config_dir())
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Ensure a directory exists
pub async fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    fs::create_dir_all(path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("downloads"), PathBuf::from("downloads"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/Videos"), home.join("Videos"));
        }
    }

    #[tokio::test]
    async fn test_ensure_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b/c");
        ensure_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        // second call is a no-op
        ensure_dir(&nested).await.unwrap();
    }
}
