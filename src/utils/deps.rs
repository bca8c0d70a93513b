//! Discovery of the external tools vidgrab drives

use tokio::process::Command;
use tracing::debug;

/// Check if a command is available in PATH
pub async fn is_command_available(cmd: &str) -> bool {
    let found = Command::new("which")
        .arg(cmd)
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false);
    debug!(cmd, found, "dependency check");
    found
}

/// ffmpeg on PATH; an explicit location is judged by the caller
pub async fn ffmpeg_available() -> bool {
    is_command_available("ffmpeg").await
}
