//! Configuration builder
//!
//! Turns a [`DownloadRequest`] into a [`DownloadPlan`] without touching the
//! network or the filesystem. The base format policy picks a selector, then
//! resolution and speed are applied as separate rewrite passes, and the
//! optional subtitle/thumbnail/metadata steps are appended last.

use crate::core::speed;
use crate::error::{Result, VidgrabError};
use crate::types::{
    DEFAULT_OUTPUT_TEMPLATE, DownloadPlan, DownloadRequest, FilterTarget, FormatChoice,
    PostProcessingStep, SpeedFilterChain,
};
use tracing::debug;

const MP4: &str = "mp4";

/// Build the full downloader configuration for one request
pub fn build(request: &DownloadRequest) -> Result<DownloadPlan> {
    validate(request)?;

    let mut plan = select_format(request);
    apply_resolution(&mut plan, request);
    apply_speed(&mut plan, request)?;
    apply_extras(&mut plan, request);
    plan.expected_extension_override = final_extension(&plan.post_processing_steps);

    debug!(
        selector = %plan.format_selector,
        steps = plan.post_processing_steps.len(),
        "built download plan"
    );
    Ok(plan)
}

/// Re-check everything the UI was supposed to enforce
fn validate(request: &DownloadRequest) -> Result<()> {
    if request.url.trim().is_empty() {
        return Err(VidgrabError::invalid("url", "must not be empty"));
    }

    speed::validate_speed(request.speed)?;

    if request.format_choice == FormatChoice::Custom && request.custom_format.is_none() {
        return Err(VidgrabError::invalid(
            "custom format",
            "required when the format is Custom Format",
        ));
    }

    if request.download_subtitles
        && request
            .subtitle_language
            .as_deref()
            .is_none_or(|lang| lang.trim().is_empty())
    {
        return Err(VidgrabError::invalid(
            "subtitle language",
            "required when subtitles are requested",
        ));
    }

    if !request.has_transcoder() {
        validate_without_transcoder(request)?;
    }
    Ok(())
}

/// Nothing may need merging or encoding when ffmpeg is absent
fn validate_without_transcoder(request: &DownloadRequest) -> Result<()> {
    let needs_ffmpeg = |field: &'static str, what: &str| {
        VidgrabError::invalid(
            field,
            format!("{} needs ffmpeg; install it or pass --ffmpeg-location", what),
        )
    };

    if request.format_choice.requires_transcoder() {
        return Err(needs_ffmpeg("format", request.format_choice.label()));
    }
    if has_height_limit(request) {
        return Err(needs_ffmpeg("resolution", "limiting the resolution"));
    }
    if request.speed != 1.0 {
        return Err(needs_ffmpeg("speed", "changing playback speed"));
    }
    if request.embed_thumbnail {
        return Err(needs_ffmpeg("embed thumbnail", "embedding the thumbnail"));
    }
    if request.embed_metadata {
        return Err(needs_ffmpeg("embed metadata", "embedding metadata"));
    }
    Ok(())
}

fn has_height_limit(request: &DownloadRequest) -> bool {
    !request.format_choice.is_audio_only() && request.resolution.height().is_some()
}

/// Base selector and container for the chosen format
fn select_format(request: &DownloadRequest) -> DownloadPlan {
    let transcoder = request.has_transcoder();
    let mut steps = Vec::new();

    let (selector, merge_container) = match request.format_choice {
        FormatChoice::BestQuality => ("bestvideo+bestaudio/best".to_string(), Some(MP4)),
        FormatChoice::VideoMp4 => (
            "best[ext=mp4]/bestvideo[ext=mp4]+bestaudio[ext=m4a]/best".to_string(),
            transcoder.then_some(MP4),
        ),
        FormatChoice::BestSingleFile => ("best".to_string(), None),
        FormatChoice::AudioMp3 | FormatChoice::AudioM4a => {
            // audio_codec() is Some for both audio variants
            if let Some(codec) = request.format_choice.audio_codec() {
                steps.push(PostProcessingStep::ExtractAudio {
                    codec,
                    quality: codec.quality().map(str::to_string),
                });
            }
            ("bestaudio/best".to_string(), None)
        }
        FormatChoice::VideoOnly => ("bestvideo".to_string(), None),
        FormatChoice::Custom => {
            let custom = request.custom_format.as_deref().unwrap_or_default().trim();
            let selector = if custom.is_empty() { "best" } else { custom };
            (selector.to_string(), None)
        }
    };

    DownloadPlan {
        format_selector: selector,
        merge_container: merge_container.map(str::to_string),
        post_processing_steps: steps,
        output_path_template: output_path_template(request),
        expected_extension_override: None,
        ffmpeg_location: request
            .ffmpeg_location
            .as_deref()
            .map(str::trim)
            .filter(|loc| !loc.is_empty())
            .map(str::to_string),
        speed: request.speed,
    }
}

fn output_path_template(request: &DownloadRequest) -> String {
    let template = request.output_template.trim();
    let template = if template.is_empty() {
        DEFAULT_OUTPUT_TEMPLATE
    } else {
        template
    };
    request.output_dir.join(template).to_string_lossy().into_owned()
}

/// Cap the height on both the merged and the single-file branch.
///
/// This replaces whatever selector the format policy produced, including
/// any container preference it carried.
fn apply_resolution(plan: &mut DownloadPlan, request: &DownloadRequest) {
    if request.format_choice.is_audio_only() {
        return;
    }
    let Some(height) = request.resolution.height() else {
        return;
    };

    plan.format_selector = format!(
        "bestvideo[height<={h}]+bestaudio/best[height<={h}]",
        h = height
    );
}

/// Prepend the speed re-encode so it runs before anything is embedded
fn apply_speed(plan: &mut DownloadPlan, request: &DownloadRequest) -> Result<()> {
    if request.speed == 1.0 || !request.has_transcoder() {
        return Ok(());
    }

    let chain = SpeedFilterChain::new(request.speed)?;
    let target = FilterTarget::for_choice(request.format_choice);
    debug!(stages = ?chain.audio_stages, pts = chain.video_pts_factor, ?target, "speed filters");

    plan.post_processing_steps.insert(
        0,
        PostProcessingStep::AdjustSpeed {
            container: MP4.into(),
            args: chain.ffmpeg_args(target),
        },
    );
    plan.merge_container = Some(MP4.into());
    Ok(())
}

/// Extension left by the last step that changes it.
///
/// Extraction runs after the speed re-encode, so audio choices end up with
/// mp3/m4a while video choices keep the mp4 container.
fn final_extension(steps: &[PostProcessingStep]) -> Option<String> {
    steps
        .iter()
        .rev()
        .find_map(PostProcessingStep::output_extension)
        .map(str::to_string)
}

/// Subtitles, thumbnail, metadata, in that order
fn apply_extras(plan: &mut DownloadPlan, request: &DownloadRequest) {
    if request.download_subtitles {
        if let Some(lang) = request.subtitle_language.as_deref() {
            plan.post_processing_steps.push(PostProcessingStep::WriteSubtitles {
                languages: vec![lang.trim().to_string()],
            });
        }
    }
    if request.embed_thumbnail {
        plan.post_processing_steps.push(PostProcessingStep::EmbedThumbnail);
    }
    if request.embed_metadata {
        plan.post_processing_steps.push(PostProcessingStep::EmbedMetadata);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::types::{AudioCodec, Resolution};
    use std::path::PathBuf;

    fn request(choice: FormatChoice) -> DownloadRequest {
        let mut req = DownloadRequest::new("https://www.youtube.com/watch?v=abc123");
        req.format_choice = choice;
        req.embed_metadata = false;
        req
    }

    fn no_ffmpeg(choice: FormatChoice) -> DownloadRequest {
        let mut req = request(choice);
        req.ffmpeg_available = false;
        req.ffmpeg_location = None;
        req
    }

    fn assert_invalid(req: &DownloadRequest, field: &str) {
        match build(req) {
            Err(VidgrabError::InvalidRequest { field: f, .. }) => assert_eq!(f, field),
            other => panic!("expected invalid {field}, got {other:?}"),
        }
    }

    #[test]
    fn test_base_selectors() {
        let cases = [
            (FormatChoice::BestQuality, "bestvideo+bestaudio/best", Some("mp4")),
            (
                FormatChoice::VideoMp4,
                "best[ext=mp4]/bestvideo[ext=mp4]+bestaudio[ext=m4a]/best",
                Some("mp4"),
            ),
            (FormatChoice::BestSingleFile, "best", None),
            (FormatChoice::AudioMp3, "bestaudio/best", None),
            (FormatChoice::AudioM4a, "bestaudio/best", None),
            (FormatChoice::VideoOnly, "bestvideo", None),
        ];

        for (choice, selector, container) in cases {
            let plan = build(&request(choice)).unwrap();
            assert_eq!(plan.format_selector, selector, "{choice:?}");
            assert_eq!(plan.merge_container.as_deref(), container, "{choice:?}");
        }
    }

    #[test]
    fn test_custom_format_verbatim_or_best() {
        let mut req = request(FormatChoice::Custom);
        req.custom_format = Some("bv*[vcodec^=avc]+ba".into());
        assert_eq!(build(&req).unwrap().format_selector, "bv*[vcodec^=avc]+ba");

        req.custom_format = Some("   ".into());
        assert_eq!(build(&req).unwrap().format_selector, "best");

        req.custom_format = None;
        assert_invalid(&req, "custom format");
    }

    #[test]
    fn test_resolution_overrides_best_quality() {
        let mut req = request(FormatChoice::BestQuality);
        req.resolution = Resolution::P1080;
        let plan = build(&req).unwrap();
        assert_eq!(
            plan.format_selector,
            "bestvideo[height<=1080]+bestaudio/best[height<=1080]"
        );
    }

    #[test]
    fn test_resolution_ignored_for_audio() {
        let mut req = request(FormatChoice::AudioMp3);
        req.resolution = Resolution::P720;
        assert_eq!(build(&req).unwrap().format_selector, "bestaudio/best");
    }

    #[test]
    fn test_mp3_extraction_sets_extension() {
        let plan = build(&request(FormatChoice::AudioMp3)).unwrap();
        assert_eq!(
            plan.post_processing_steps,
            vec![PostProcessingStep::ExtractAudio {
                codec: AudioCodec::Mp3,
                quality: Some("192".into()),
            }]
        );
        assert_eq!(plan.post_processing_steps[0].output_extension(), Some("mp3"));
        assert_eq!(plan.expected_extension_override.as_deref(), Some("mp3"));

        let m4a = build(&request(FormatChoice::AudioM4a)).unwrap();
        assert_eq!(m4a.expected_extension_override.as_deref(), Some("m4a"));
    }

    #[test]
    fn test_speed_step_comes_first() {
        let mut req = request(FormatChoice::AudioMp3);
        req.speed = 2.0;
        req.embed_thumbnail = true;
        req.embed_metadata = true;
        let plan = build(&req).unwrap();

        let kinds: Vec<&str> = plan.post_processing_steps.iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec!["FFmpegVideoConvertor", "FFmpegExtractAudio", "EmbedThumbnail", "FFmpegMetadata"]
        );
        assert_eq!(
            plan.post_processing_steps[0],
            PostProcessingStep::AdjustSpeed {
                container: "mp4".into(),
                args: vec!["-af".into(), "atempo=2.0".into()],
            }
        );
        assert_eq!(plan.merge_container.as_deref(), Some("mp4"));
        // extraction still decides the final extension
        assert_eq!(plan.expected_extension_override.as_deref(), Some("mp3"));
    }

    #[test]
    fn test_speed_filters_by_choice() {
        let mut video_only = request(FormatChoice::VideoOnly);
        video_only.speed = 0.5;
        let plan = build(&video_only).unwrap();
        assert_eq!(
            plan.post_processing_steps[0],
            PostProcessingStep::AdjustSpeed {
                container: "mp4".into(),
                args: vec!["-vf".into(), "setpts=2.0*PTS".into()],
            }
        );
        assert_eq!(plan.expected_extension_override.as_deref(), Some("mp4"));

        let mut both = request(FormatChoice::BestSingleFile);
        both.speed = 4.0;
        let plan = build(&both).unwrap();
        assert_eq!(
            plan.post_processing_steps[0],
            PostProcessingStep::AdjustSpeed {
                container: "mp4".into(),
                args: vec![
                    "-vf".into(),
                    "setpts=0.25*PTS".into(),
                    "-af".into(),
                    "atempo=2.0,atempo=2.0".into(),
                ],
            }
        );
    }

    #[test]
    fn test_normal_speed_adds_no_step() {
        let plan = build(&request(FormatChoice::BestQuality)).unwrap();
        assert!(plan.post_processing_steps.is_empty());
        assert_eq!(plan.expected_extension_override, None);
    }

    #[test]
    fn test_speed_out_of_range() {
        let mut req = request(FormatChoice::BestQuality);
        req.speed = 5.0;
        assert_invalid(&req, "speed");
        req.speed = 0.1;
        assert_invalid(&req, "speed");
    }

    #[test]
    fn test_extras_order() {
        let mut req = request(FormatChoice::BestQuality);
        req.download_subtitles = true;
        req.subtitle_language = Some("es".into());
        req.embed_thumbnail = true;
        req.embed_metadata = true;
        let plan = build(&req).unwrap();
        assert_eq!(
            plan.post_processing_steps,
            vec![
                PostProcessingStep::WriteSubtitles { languages: vec!["es".into()] },
                PostProcessingStep::EmbedThumbnail,
                PostProcessingStep::EmbedMetadata,
            ]
        );
    }

    #[test]
    fn test_subtitles_need_language() {
        let mut req = request(FormatChoice::BestQuality);
        req.download_subtitles = true;
        req.subtitle_language = Some(String::new());
        assert_invalid(&req, "subtitle language");
        req.subtitle_language = None;
        assert_invalid(&req, "subtitle language");
    }

    #[test]
    fn test_empty_url_rejected() {
        let mut req = request(FormatChoice::BestQuality);
        req.url = "  ".into();
        assert_invalid(&req, "url");
    }

    #[test]
    fn test_merge_choice_without_ffmpeg_fails() {
        let err = build(&no_ffmpeg(FormatChoice::BestQuality)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_invalid(&no_ffmpeg(FormatChoice::AudioMp3), "format");
    }

    #[test]
    fn test_reduced_set_without_ffmpeg() {
        let plan = build(&no_ffmpeg(FormatChoice::BestSingleFile)).unwrap();
        assert_eq!(plan.format_selector, "best");
        assert!(plan.post_processing_steps.is_empty());

        let mp4 = build(&no_ffmpeg(FormatChoice::VideoMp4)).unwrap();
        assert_eq!(mp4.merge_container, None);

        let mut sped_up = no_ffmpeg(FormatChoice::BestSingleFile);
        sped_up.speed = 2.0;
        assert_invalid(&sped_up, "speed");

        let mut capped = no_ffmpeg(FormatChoice::VideoOnly);
        capped.resolution = Resolution::P720;
        assert_invalid(&capped, "resolution");

        let mut tagged = no_ffmpeg(FormatChoice::BestSingleFile);
        tagged.embed_metadata = true;
        assert_invalid(&tagged, "embed metadata");

        let mut framed = no_ffmpeg(FormatChoice::BestSingleFile);
        framed.embed_thumbnail = true;
        assert_invalid(&framed, "embed thumbnail");
    }

    #[test]
    fn test_extension_follows_last_converting_step() {
        assert_eq!(final_extension(&[]), None);
        assert_eq!(
            final_extension(&[
                PostProcessingStep::AdjustSpeed { container: "mp4".into(), args: Vec::new() },
                PostProcessingStep::ExtractAudio { codec: AudioCodec::M4a, quality: None },
                PostProcessingStep::EmbedMetadata,
            ]),
            Some("m4a".to_string())
        );
        assert_eq!(
            final_extension(&[
                PostProcessingStep::AdjustSpeed { container: "mp4".into(), args: Vec::new() },
                PostProcessingStep::EmbedThumbnail,
            ]),
            Some("mp4".to_string())
        );
    }

    #[test]
    fn test_ffmpeg_location_counts_as_available() {
        let mut req = no_ffmpeg(FormatChoice::BestQuality);
        req.ffmpeg_location = Some("/opt/ffmpeg/bin".into());
        let plan = build(&req).unwrap();
        assert_eq!(plan.ffmpeg_location.as_deref(), Some("/opt/ffmpeg/bin"));
    }

    #[test]
    fn test_output_template_rooted_in_output_dir() {
        let mut req = request(FormatChoice::BestQuality);
        req.output_dir = PathBuf::from("/tmp/videos");
        assert_eq!(
            build(&req).unwrap().output_path_template,
            "/tmp/videos/%(title)s.%(ext)s"
        );

        req.output_template = "%(uploader)s - %(title)s.%(ext)s".into();
        assert_eq!(
            build(&req).unwrap().output_path_template,
            "/tmp/videos/%(uploader)s - %(title)s.%(ext)s"
        );

        req.output_template = String::new();
        assert_eq!(
            build(&req).unwrap().output_path_template,
            "/tmp/videos/%(title)s.%(ext)s"
        );
    }
}
