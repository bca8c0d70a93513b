//! Type definitions for vidgrab
//!
//! Source of truth for all data structures.

use crate::error::{Result, VidgrabError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

/// yt-dlp output template used when the user gives none
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Directory downloads land in when neither config nor flags name one
pub const DEFAULT_OUTPUT_DIR: &str = "downloads";

// ============================================
// Format Types
// ============================================

/// What the user wants to end up with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FormatChoice {
    /// Best video + best audio, merged to mp4
    #[default]
    BestQuality,
    /// Prefer mp4 streams, merged to mp4
    VideoMp4,
    /// One pre-muxed stream, no merge
    BestSingleFile,
    AudioMp3,
    AudioM4a,
    /// Video stream without audio
    VideoOnly,
    /// User-supplied yt-dlp selector
    Custom,
}

impl FormatChoice {
    pub const ALL: [FormatChoice; 7] = [
        FormatChoice::BestQuality,
        FormatChoice::VideoMp4,
        FormatChoice::AudioMp3,
        FormatChoice::AudioM4a,
        FormatChoice::VideoOnly,
        FormatChoice::BestSingleFile,
        FormatChoice::Custom,
    ];

    /// Short name accepted on the command line
    pub fn token(self) -> &'static str {
        match self {
            Self::BestQuality => "best",
            Self::VideoMp4 => "mp4",
            Self::BestSingleFile => "single",
            Self::AudioMp3 => "mp3",
            Self::AudioM4a => "m4a",
            Self::VideoOnly => "video-only",
            Self::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::BestQuality => "Best Quality (Video + Audio)",
            Self::VideoMp4 => "Video (MP4)",
            Self::BestSingleFile => "Best Single File",
            Self::AudioMp3 => "Audio Only (MP3)",
            Self::AudioM4a => "Audio Only (M4A)",
            Self::VideoOnly => "Video Only (No Audio)",
            Self::Custom => "Custom Format",
        }
    }

    /// Label shown in menus, hinting at what still works without ffmpeg
    pub fn menu_label(self, transcoder: bool) -> &'static str {
        match (self, transcoder) {
            (Self::BestSingleFile, false) => "Best Single File (No ffmpeg required)",
            (Self::VideoMp4, false) => "Video (MP4 - No Audio Merge)",
            _ => self.label(),
        }
    }

    pub fn is_audio_only(self) -> bool {
        matches!(self, Self::AudioMp3 | Self::AudioM4a)
    }

    /// Choices that cannot be satisfied without merging or encoding
    pub fn requires_transcoder(self) -> bool {
        matches!(self, Self::BestQuality | Self::AudioMp3 | Self::AudioM4a)
    }

    pub fn audio_codec(self) -> Option<AudioCodec> {
        match self {
            Self::AudioMp3 => Some(AudioCodec::Mp3),
            Self::AudioM4a => Some(AudioCodec::M4a),
            _ => None,
        }
    }

    /// Choices offered to the user for the detected toolset
    pub fn available(transcoder: bool) -> Vec<FormatChoice> {
        if transcoder {
            return Self::ALL.to_vec();
        }
        vec![
            Self::BestSingleFile,
            Self::VideoMp4,
            Self::VideoOnly,
            Self::Custom,
        ]
    }
}

impl fmt::Display for FormatChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FormatChoice {
    type Err = VidgrabError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| {
                c.token().eq_ignore_ascii_case(wanted)
                    || c.label().eq_ignore_ascii_case(wanted)
                    || c.menu_label(false).eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| VidgrabError::invalid("format", format!("unknown format '{}'", wanted)))
    }
}

/// Target codec for audio extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    Mp3,
    M4a,
}

impl AudioCodec {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::M4a => "m4a",
        }
    }

    /// Encoder quality tier (kbps); m4a is left to the encoder
    pub fn quality(self) -> Option<&'static str> {
        match self {
            Self::Mp3 => Some("192"),
            Self::M4a => None,
        }
    }
}

// ============================================
// Resolution
// ============================================

static HEIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d{3,4})\s*p?\b").expect("Invalid regex"));

/// Maximum video height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Resolution {
    #[default]
    #[serde(rename = "best")]
    BestAvailable,
    #[serde(rename = "2160p")]
    P2160,
    #[serde(rename = "1440p")]
    P1440,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
}

impl Resolution {
    pub const ALL: [Resolution; 7] = [
        Resolution::BestAvailable,
        Resolution::P2160,
        Resolution::P1440,
        Resolution::P1080,
        Resolution::P720,
        Resolution::P480,
        Resolution::P360,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::BestAvailable => "Best Available",
            Self::P2160 => "2160p (4K)",
            Self::P1440 => "1440p",
            Self::P1080 => "1080p",
            Self::P720 => "720p",
            Self::P480 => "480p",
            Self::P360 => "360p",
        }
    }

    /// Height cap in pixels, `None` for best available
    pub fn height(self) -> Option<u32> {
        match self {
            Self::BestAvailable => None,
            Self::P2160 => Some(2160),
            Self::P1440 => Some(1440),
            Self::P1080 => Some(1080),
            Self::P720 => Some(720),
            Self::P480 => Some(480),
            Self::P360 => Some(360),
        }
    }

    pub fn from_height(height: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.height() == Some(height))
    }

    /// Parse a menu label such as "2160p (4K)", "720p", "720" or "best"
    pub fn from_label(label: &str) -> Result<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("best")
            || label.eq_ignore_ascii_case(Self::BestAvailable.label())
        {
            return Ok(Self::BestAvailable);
        }

        let height: u32 = HEIGHT_RE
            .captures(label)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .ok_or_else(|| {
                VidgrabError::invalid(
                    "resolution",
                    format!("cannot read a height from '{}'", label),
                )
            })?;

        Self::from_height(height).ok_or_else(|| {
            VidgrabError::invalid("resolution", format!("unsupported height {}p", height))
        })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Resolution {
    type Err = VidgrabError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_label(s)
    }
}

// ============================================
// Request / Plan Types
// ============================================

/// Everything the user asked for, as primitive values
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub format_choice: FormatChoice,
    /// Ignored for audio-only choices
    pub resolution: Resolution,
    /// Required when `format_choice` is `Custom`
    pub custom_format: Option<String>,
    /// yt-dlp output template, relative to `output_dir`
    pub output_template: String,
    pub output_dir: PathBuf,
    /// Playback speed factor, 1.0 = unchanged
    pub speed: f64,
    pub download_subtitles: bool,
    /// Required when `download_subtitles` is set
    pub subtitle_language: Option<String>,
    pub embed_thumbnail: bool,
    pub embed_metadata: bool,
    /// ffmpeg found on PATH
    pub ffmpeg_available: bool,
    /// Explicit ffmpeg binary or directory
    pub ffmpeg_location: Option<String>,
}

impl DownloadRequest {
    /// Request with the stock defaults, assuming ffmpeg is on PATH
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format_choice: FormatChoice::default(),
            resolution: Resolution::default(),
            custom_format: None,
            output_template: DEFAULT_OUTPUT_TEMPLATE.into(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            speed: 1.0,
            download_subtitles: false,
            subtitle_language: None,
            embed_thumbnail: false,
            embed_metadata: true,
            ffmpeg_available: true,
            ffmpeg_location: None,
        }
    }

    /// Whether merging and encoding are possible at all
    pub fn has_transcoder(&self) -> bool {
        self.ffmpeg_available
            || self
                .ffmpeg_location
                .as_deref()
                .is_some_and(|loc| !loc.trim().is_empty())
    }
}

/// One post-download processing step, in execution order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostProcessingStep {
    /// Re-encode with tempo/time-scale filters
    AdjustSpeed { container: String, args: Vec<String> },
    ExtractAudio {
        codec: AudioCodec,
        quality: Option<String>,
    },
    WriteSubtitles { languages: Vec<String> },
    EmbedThumbnail,
    EmbedMetadata,
}

impl PostProcessingStep {
    /// yt-dlp post-processor name
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AdjustSpeed { .. } => "FFmpegVideoConvertor",
            Self::ExtractAudio { .. } => "FFmpegExtractAudio",
            Self::WriteSubtitles { .. } => "Subtitles",
            Self::EmbedThumbnail => "EmbedThumbnail",
            Self::EmbedMetadata => "FFmpegMetadata",
        }
    }

    /// Constructor arguments for the post-processor
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::AdjustSpeed { container, .. } => vec![("preferedformat", container.clone())],
            Self::ExtractAudio { codec, quality } => {
                let mut params = vec![("preferredcodec", codec.extension().to_string())];
                if let Some(q) = quality {
                    params.push(("preferredquality", q.clone()));
                }
                params
            }
            Self::WriteSubtitles { languages } => vec![("languages", languages.join(","))],
            Self::EmbedThumbnail | Self::EmbedMetadata => Vec::new(),
        }
    }

    /// Extension of the file this step leaves behind, if it changes it
    pub fn output_extension(&self) -> Option<&str> {
        match self {
            Self::AdjustSpeed { container, .. } => Some(container.as_str()),
            Self::ExtractAudio { codec, .. } => Some(codec.extension()),
            _ => None,
        }
    }
}

/// Which streams the speed filters apply to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTarget {
    Audio,
    Video,
    Both,
}

impl FilterTarget {
    pub fn for_choice(choice: FormatChoice) -> Self {
        if choice.is_audio_only() {
            Self::Audio
        } else if choice == FormatChoice::VideoOnly {
            Self::Video
        } else {
            Self::Both
        }
    }
}

/// Filters that change playback speed by one factor
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedFilterChain {
    /// `atempo` stages, each within [0.5, 2.0]
    pub audio_stages: Vec<f64>,
    /// `setpts` multiplier, the reciprocal of the speed
    pub video_pts_factor: f64,
}

/// Output of the configuration builder, handed to the downloader in one call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadPlan {
    pub format_selector: String,
    pub merge_container: Option<String>,
    pub post_processing_steps: Vec<PostProcessingStep>,
    pub output_path_template: String,
    /// Final extension when a step changes it after the download
    pub expected_extension_override: Option<String>,
    pub ffmpeg_location: Option<String>,
    pub speed: f64,
}

// ============================================
// Result Types
// ============================================

/// Fields we read from yt-dlp's info JSON
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default, rename = "_filename")]
    pub legacy_filename: Option<String>,
    /// Path printed after post-processing, read from a separate stdout line
    #[serde(skip)]
    pub final_filepath: Option<String>,
}

impl VideoInfo {
    /// Name yt-dlp prepared for the download, before any conversion.
    ///
    /// Falls back to the post-processing path when the info JSON carries
    /// no filename keys.
    pub fn reported_filename(&self) -> Option<&str> {
        [
            self.filename.as_deref(),
            self.legacy_filename.as_deref(),
            self.final_filepath.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|f| !f.is_empty())
    }
}

/// What the user gets back after a successful download
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadResult {
    pub final_file_path: PathBuf,
    pub title: String,
    pub duration_seconds: u64,
    pub uploader: String,
    pub speed: f64,
}

impl DownloadResult {
    /// Duration as "3m 25s"
    pub fn duration_label(&self) -> String {
        format!("{}m {}s", self.duration_seconds / 60, self.duration_seconds % 60)
    }
}

// ============================================
// Config Types
// ============================================

/// User configuration, every field optional in the file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Download directory path
    pub output_dir: String,
    /// yt-dlp output template
    pub output_template: String,
    pub format: FormatChoice,
    pub resolution: Resolution,
    pub embed_metadata: bool,
    pub embed_thumbnail: bool,
    /// Language used when subtitles are requested without one
    pub subtitle_language: String,
    /// ffmpeg binary or directory, when not on PATH
    pub ffmpeg_location: Option<String>,
    /// yt-dlp executable (default: "yt-dlp")
    pub yt_dlp_path: String,
    /// Editor command (default: "nvim")
    pub editor: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.into(),
            output_template: DEFAULT_OUTPUT_TEMPLATE.into(),
            format: FormatChoice::default(),
            resolution: Resolution::default(),
            embed_metadata: true,
            embed_thumbnail: false,
            subtitle_language: "en".into(),
            ffmpeg_location: None,
            yt_dlp_path: "yt-dlp".into(),
            editor: "nvim".into(),
        }
    }
}

// ============================================
// Selector Types
// ============================================

/// Item displayed in selector menu
#[derive(Debug, Clone)]
pub struct MenuItem<T> {
    /// Display text
    pub label: String,
    /// Underlying value
    pub value: T,
}
