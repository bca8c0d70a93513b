//! yt-dlp integration
//!
//! Translates a [`DownloadPlan`] into one yt-dlp invocation and reads back
//! the info JSON it prints when done.

use crate::error::{Result, VidgrabError};
use crate::types::{DownloadPlan, PostProcessingStep, VideoInfo};
use crate::utils::deps::is_command_available;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Prefix of the line carrying the file path after all post-processing
const FILEPATH_MARKER: &str = "vidgrab-filepath:";

/// Something that can download a URL according to a plan
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Run the whole plan in one call and return what the tool reported
    async fn fetch(&self, url: &str, plan: &DownloadPlan) -> Result<VideoInfo>;
}

/// yt-dlp command-line backend
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: String,
}

impl YtDlp {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl MediaDownloader for YtDlp {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch(&self, url: &str, plan: &DownloadPlan) -> Result<VideoInfo> {
        if !is_command_available(&self.binary).await {
            return Err(VidgrabError::MissingDependency(self.binary.clone()));
        }

        let args = build_args(url, plan);
        debug!(binary = %self.binary, ?args, "running yt-dlp");

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                VidgrabError::DownloadFailed(format!("Failed to start {}: {}", self.binary, e))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            debug!("yt-dlp stderr: {}", stderr);
            return Err(VidgrabError::DownloadFailed(failure_message(
                &stderr,
                output.status.code(),
            )));
        }
        if !stderr.trim().is_empty() {
            warn!("yt-dlp: {}", stderr.trim());
        }

        parse_info(&output.stdout)
    }
}

/// Full yt-dlp argument list for `url`, steps in plan order
pub fn build_args(url: &str, plan: &DownloadPlan) -> Vec<String> {
    let mut args: Vec<String> = vec!["-f".into(), plan.format_selector.clone()];

    if let Some(ref container) = plan.merge_container {
        args.extend(["--merge-output-format".into(), container.clone()]);
    }
    if let Some(ref location) = plan.ffmpeg_location {
        args.extend(["--ffmpeg-location".into(), location.clone()]);
    }

    // --use-postprocessor keeps our order; the built-in flags would not
    for step in &plan.post_processing_steps {
        match step {
            PostProcessingStep::WriteSubtitles { languages } => {
                args.extend([
                    "--write-subs".into(),
                    "--sub-langs".into(),
                    languages.join(","),
                ]);
            }
            PostProcessingStep::AdjustSpeed { args: ffmpeg_args, .. } => {
                args.extend(["--use-postprocessor".into(), postprocessor_spec(step)]);
                args.extend([
                    "--postprocessor-args".into(),
                    format!("VideoConvertor:{}", ffmpeg_args.join(" ")),
                ]);
            }
            PostProcessingStep::EmbedThumbnail => {
                args.push("--write-thumbnail".into());
                args.extend(["--use-postprocessor".into(), postprocessor_spec(step)]);
            }
            PostProcessingStep::ExtractAudio { .. } | PostProcessingStep::EmbedMetadata => {
                args.extend(["--use-postprocessor".into(), postprocessor_spec(step)]);
            }
        }
    }

    args.extend([
        "-o".into(),
        plan.output_path_template.clone(),
        "--no-playlist".into(),
        "--print".into(),
        format!("after_move:{}%(filepath)s", FILEPATH_MARKER),
        // Print the info JSON once processing is done
        "-J".into(),
        "--no-simulate".into(),
        url.into(),
    ]);
    args
}

/// `NAME` or `NAME:key=value;key=value`
fn postprocessor_spec(step: &PostProcessingStep) -> String {
    let params = step.parameters();
    if params.is_empty() {
        return step.kind().to_string();
    }
    let joined = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(";");
    format!("{}:{}", step.kind(), joined)
}

/// Prefer yt-dlp's own ERROR line over the bare exit code
fn failure_message(stderr: &str, code: Option<i32>) -> String {
    let lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    if let Some(line) = lines.iter().rev().find(|l| l.starts_with("ERROR:")) {
        return line.trim_start_matches("ERROR:").trim().to_string();
    }
    if let Some(line) = lines.last() {
        return line.to_string();
    }
    format!("yt-dlp exited with code: {:?}", code)
}

/// Parse the info JSON yt-dlp wrote to stdout
fn parse_info(stdout: &[u8]) -> Result<VideoInfo> {
    let text = String::from_utf8_lossy(stdout);
    let json = text
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with('{'))
        .ok_or_else(|| VidgrabError::DownloadFailed("yt-dlp printed no video info".into()))?;

    let mut info: VideoInfo = serde_json::from_str(json).map_err(|e| {
        VidgrabError::DownloadFailed(format!("Failed to parse yt-dlp output: {}", e))
    })?;

    info.final_filepath = text
        .lines()
        .rev()
        .find_map(|l| l.trim().strip_prefix(FILEPATH_MARKER))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);
    Ok(info)
}
