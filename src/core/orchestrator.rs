//! Orchestrator - runs a plan and reconciles what lands on disk

use crate::core::ytdlp::MediaDownloader;
use crate::error::{Result, VidgrabError};
use crate::types::{DownloadPlan, DownloadRequest, DownloadResult, VideoInfo};
use crate::utils::paths::ensure_dir;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

pub struct Orchestrator<D> {
    downloader: D,
}

impl<D: MediaDownloader> Orchestrator<D> {
    pub fn new(downloader: D) -> Self {
        Self { downloader }
    }

    /// Hand the whole plan to the downloader and verify the result.
    ///
    /// No retries: a failure from the tool is returned as `DownloadFailed`,
    /// a reported success without the file on disk as `FileMissing`.
    pub async fn execute(
        &self,
        plan: &DownloadPlan,
        request: &DownloadRequest,
    ) -> Result<DownloadResult> {
        ensure_dir(&request.output_dir).await?;

        info!(url = %request.url, backend = self.downloader.name(), "starting download");
        let info = self.downloader.fetch(&request.url, plan).await?;

        let reported = info.reported_filename().ok_or_else(|| {
            VidgrabError::DownloadFailed("downloader did not report an output file".into())
        })?;
        let final_path = final_file_path(
            Path::new(reported),
            plan.expected_extension_override.as_deref(),
        );
        debug!(reported, final_path = %final_path.display(), "reconciled output path");

        if !fs::try_exists(&final_path).await.unwrap_or(false) {
            return Err(VidgrabError::FileMissing(final_path));
        }

        Ok(summarize(info, final_path, request.speed))
    }
}

/// Swap in the post-conversion extension when a step changed it
pub fn final_file_path(reported: &Path, extension_override: Option<&str>) -> PathBuf {
    match extension_override {
        Some(ext) => reported.with_extension(ext),
        None => reported.to_path_buf(),
    }
}

fn summarize(info: VideoInfo, final_file_path: PathBuf, speed: f64) -> DownloadResult {
    DownloadResult {
        final_file_path,
        title: info.title.unwrap_or_default(),
        duration_seconds: info
            .duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| d as u64)
            .unwrap_or(0),
        uploader: info.uploader.unwrap_or_default(),
        speed,
    }
}
