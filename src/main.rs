//! vidgrab - download videos with yt-dlp
//!
//! Pick a format, an optional resolution cap and playback speed; vidgrab
//! builds the yt-dlp/ffmpeg pipeline and runs it.

use clap::Parser;
use std::process::ExitCode;

use vidgrab::core::orchestrator::Orchestrator;
use vidgrab::core::{builder, ytdlp};
use vidgrab::storage::config;
use vidgrab::types::{Config, DownloadRequest, FormatChoice, Resolution};
use vidgrab::ui::{output, prompt};
use vidgrab::utils::{deps, logging, paths};

const AFTER_HELP: &str = "\
Speed control:
  Speeds from 0.25x to 4x. Audio pitch is preserved with ffmpeg's atempo
  filter, video timestamps are rescaled with setpts. Needs ffmpeg.

Without ffmpeg only 'single', 'mp4', 'video-only' and 'custom' work.";

/// Download videos with yt-dlp: format presets, resolution caps and speed changes.
#[derive(Parser, Debug)]
#[command(name = "vidgrab")]
#[command(version, about, long_about = None, after_help = AFTER_HELP)]
struct Cli {
    /// Video URL (prompted for when omitted)
    url: Option<String>,

    /// Format: best, mp4, single, mp3, m4a, video-only, custom
    #[arg(short, long)]
    format: Option<FormatChoice>,

    /// Max resolution: best, 2160p, 1440p, 1080p, 720p, 480p, 360p
    #[arg(short, long)]
    resolution: Option<Resolution>,

    /// yt-dlp format code, used with --format custom
    #[arg(long)]
    custom_format: Option<String>,

    /// yt-dlp output template
    #[arg(short = 'o', long)]
    output_template: Option<String>,

    /// Directory to download into
    #[arg(short = 'd', long)]
    output_dir: Option<String>,

    /// Playback speed factor (0.25 - 4.0)
    #[arg(short, long)]
    speed: Option<f64>,

    /// Download subtitles
    #[arg(long)]
    subs: bool,

    /// Subtitle language (implies --subs)
    #[arg(long)]
    sub_lang: Option<String>,

    /// Embed the thumbnail into the file
    #[arg(long)]
    embed_thumbnail: bool,

    /// Do not embed metadata
    #[arg(long)]
    no_metadata: bool,

    /// ffmpeg binary or directory, when it is not on PATH
    #[arg(long)]
    ffmpeg_location: Option<String>,

    /// Ask for every option interactively
    #[arg(short, long)]
    interactive: bool,

    /// List the formats usable with the detected tools
    #[arg(long)]
    list_formats: bool,

    /// Print the download plan and yt-dlp command without running it
    #[arg(long)]
    dry_run: bool,

    /// Edit the configuration file
    #[arg(short, long)]
    edit: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Merge flags over config defaults
fn build_request(cli: &Cli, cfg: &Config, ffmpeg_on_path: bool) -> DownloadRequest {
    let mut request = DownloadRequest::new(cli.url.clone().unwrap_or_default());

    request.format_choice = cli.format.unwrap_or(cfg.format);
    request.resolution = cli.resolution.unwrap_or(cfg.resolution);
    request.custom_format = cli.custom_format.clone();
    request.output_template = cli
        .output_template
        .clone()
        .unwrap_or_else(|| cfg.output_template.clone());
    request.output_dir = paths::expand_home(cli.output_dir.as_deref().unwrap_or(&cfg.output_dir));
    request.speed = cli.speed.unwrap_or(1.0);

    request.download_subtitles = cli.subs || cli.sub_lang.is_some();
    if request.download_subtitles {
        request.subtitle_language = Some(
            cli.sub_lang
                .clone()
                .unwrap_or_else(|| cfg.subtitle_language.clone()),
        );
    }
    request.embed_thumbnail = cli.embed_thumbnail || cfg.embed_thumbnail;
    request.embed_metadata = cfg.embed_metadata && !cli.no_metadata;

    request.ffmpeg_available = ffmpeg_on_path;
    request.ffmpeg_location = cli
        .ffmpeg_location
        .clone()
        .or_else(|| cfg.ffmpeg_location.clone());

    if !request.has_transcoder() {
        drop_transcoder_defaults(&mut request, cli);
    }
    request
}

/// Without ffmpeg, only keep what the user asked for on the command line.
///
/// Config defaults that need ffmpeg are dropped; explicit flags stay and are
/// rejected by the builder with the field they belong to.
fn drop_transcoder_defaults(request: &mut DownloadRequest, cli: &Cli) {
    if cli.format.is_none() && request.format_choice.requires_transcoder() {
        request.format_choice = FormatChoice::BestSingleFile;
    }
    request.resolution = cli.resolution.unwrap_or(Resolution::BestAvailable);
    request.embed_thumbnail = cli.embed_thumbnail;
    // there is no flag to opt in to metadata
    request.embed_metadata = false;
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let cfg = config::load_config().await?;

    // Handle --edit flag
    if cli.edit {
        config::edit_config(&cfg.editor).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut request = build_request(&cli, &cfg, deps::ffmpeg_available().await);
    let transcoder = request.has_transcoder();
    if !transcoder {
        output::print_ffmpeg_warning();
    }

    if cli.list_formats {
        output::print_formats(transcoder);
        return Ok(ExitCode::SUCCESS);
    }

    let ask = cli.interactive || cli.url.is_none();
    if ask && !prompt::fill_request(&mut request, cli.url.is_none())? {
        return Ok(ExitCode::SUCCESS);
    }

    let plan = match builder::build(&request) {
        Ok(plan) => plan,
        Err(e) => {
            output::print_error(&e);
            return Ok(ExitCode::FAILURE);
        }
    };

    if cli.dry_run {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        println!("{} {}", cfg.yt_dlp_path, ytdlp::build_args(&request.url, &plan).join(" "));
        return Ok(ExitCode::SUCCESS);
    }

    let orchestrator = Orchestrator::new(ytdlp::YtDlp::new(cfg.yt_dlp_path.clone()));
    let spinner = output::spinner("Downloading...");
    let outcome = orchestrator.execute(&plan, &request).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(result) => {
            output::print_result(&result);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            output::print_error(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("vidgrab").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_override_config() {
        let cfg = Config {
            format: FormatChoice::AudioM4a,
            subtitle_language: "de".into(),
            ..Config::default()
        };
        let cli = parse(&[
            "https://x.test/v", "-f", "mp3", "-r", "720p", "-s", "2", "--subs", "--no-metadata",
        ]);
        let req = build_request(&cli, &cfg, true);

        assert_eq!(req.url, "https://x.test/v");
        assert_eq!(req.format_choice, FormatChoice::AudioMp3);
        assert_eq!(req.resolution, Resolution::P720);
        assert_eq!(req.speed, 2.0);
        assert_eq!(req.subtitle_language.as_deref(), Some("de"));
        assert!(!req.embed_metadata);
    }

    #[test]
    fn test_config_defaults_apply() {
        let cfg = Config {
            ffmpeg_location: Some("/opt/ffmpeg".into()),
            ..Config::default()
        };
        let req = build_request(&parse(&["https://x.test/v"]), &cfg, false);

        assert_eq!(req.format_choice, FormatChoice::BestQuality);
        assert!(req.embed_metadata);
        assert!(!req.download_subtitles);
        assert!(req.has_transcoder());
        assert_eq!(req.output_dir, std::path::PathBuf::from("downloads"));
    }

    #[test]
    fn test_sub_lang_implies_subs() {
        let req = build_request(&parse(&["u", "--sub-lang", "fr"]), &Config::default(), true);
        assert!(req.download_subtitles);
        assert_eq!(req.subtitle_language.as_deref(), Some("fr"));
    }

    #[test]
    fn test_single_file_works_without_ffmpeg() {
        let cfg = Config {
            resolution: Resolution::P720,
            embed_thumbnail: true,
            ..Config::default()
        };
        let req = build_request(&parse(&["https://x.test/v", "-f", "single"]), &cfg, false);

        assert_eq!(req.format_choice, FormatChoice::BestSingleFile);
        assert_eq!(req.resolution, Resolution::BestAvailable);
        assert!(!req.embed_thumbnail);
        assert!(!req.embed_metadata);
        assert!(builder::build(&req).is_ok());

        // the stock default format falls back too
        let req = build_request(&parse(&["https://x.test/v"]), &cfg, false);
        assert_eq!(req.format_choice, FormatChoice::BestSingleFile);
        assert!(builder::build(&req).is_ok());
    }

    #[test]
    fn test_explicit_flags_still_checked_without_ffmpeg() {
        let field = |args: &[&str]| match builder::build(&build_request(
            &parse(args),
            &Config::default(),
            false,
        )) {
            Err(vidgrab::error::VidgrabError::InvalidRequest { field, .. }) => field,
            other => panic!("expected InvalidRequest, got {:?}", other),
        };

        assert_eq!(field(&["u", "-f", "single", "--embed-thumbnail"]), "embed thumbnail");
        assert_eq!(field(&["u", "-f", "single", "-r", "720p"]), "resolution");
        assert_eq!(field(&["u", "-f", "single", "-s", "2"]), "speed");
        assert_eq!(field(&["u", "-f", "best"]), "format");
    }

    #[test]
    fn test_bad_format_rejected_by_parser() {
        assert!(Cli::try_parse_from(["vidgrab", "u", "-f", "flac"]).is_err());
    }
}
