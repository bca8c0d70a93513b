//! Result, warning and error rendering

use crate::error::VidgrabError;
use crate::types::{DownloadResult, FormatChoice};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Label/value rows for the success summary
pub fn summary_rows(result: &DownloadResult) -> Vec<(&'static str, String)> {
    let or_na = |s: &str| if s.is_empty() { "N/A".to_string() } else { s.to_string() };

    let mut rows = vec![
        ("File", result.final_file_path.display().to_string()),
        ("Title", or_na(&result.title)),
        ("Duration", result.duration_label()),
    ];
    if result.speed != 1.0 {
        rows.push(("Speed", format!("{}x", result.speed)));
    }
    rows.push(("Uploader", or_na(&result.uploader)));
    rows
}

pub fn print_result(result: &DownloadResult) {
    println!("{}", "✓ Download completed!".green().bold());
    for (label, value) in summary_rows(result) {
        println!("  {} {}", format!("{}:", label).dimmed(), value);
    }
}

pub fn print_error(err: &VidgrabError) {
    eprintln!("{} {}", "Error:".red(), err);
}

pub fn print_ffmpeg_warning() {
    eprintln!(
        "{} {}",
        "⚠ ffmpeg not found!".yellow().bold(),
        "Audio conversion, merging and speed changes will not work. Install ffmpeg or pass --ffmpeg-location."
            .yellow()
    );
}

/// Formats usable with the detected toolset, one per line
pub fn print_formats(transcoder: bool) {
    for choice in FormatChoice::available(transcoder) {
        println!("{} {}", format!("{:<12}", choice.token()).cyan(), choice.menu_label(transcoder));
    }
    if !transcoder {
        println!("{}", "Limited formats available without ffmpeg.".dimmed());
    }
}

/// Steady spinner shown while yt-dlp runs
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
