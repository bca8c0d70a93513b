//! Playback-speed filter synthesis
//!
//! ffmpeg's `atempo` only accepts factors in [0.5, 2.0] per instance, so
//! larger changes are built by chaining stages. Video uses a single
//! `setpts` filter scaled by the reciprocal factor.

use crate::error::{Result, VidgrabError};
use crate::types::{FilterTarget, SpeedFilterChain};

pub const MIN_SPEED: f64 = 0.25;
pub const MAX_SPEED: f64 = 4.0;

const MIN_TEMPO_STAGE: f64 = 0.5;
const MAX_TEMPO_STAGE: f64 = 2.0;

/// Reject speeds the UI should never have sent
pub fn validate_speed(speed: f64) -> Result<()> {
    if !speed.is_finite() || !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
        return Err(VidgrabError::invalid(
            "speed",
            format!("{} is outside {}..={}", speed, MIN_SPEED, MAX_SPEED),
        ));
    }
    Ok(())
}

/// Split `speed` into atempo stages whose product is `speed`
pub fn tempo_stages(speed: f64) -> Vec<f64> {
    let mut stages = Vec::new();
    let mut remaining = speed;

    while remaining > MAX_TEMPO_STAGE {
        stages.push(MAX_TEMPO_STAGE);
        remaining /= MAX_TEMPO_STAGE;
    }
    while remaining < MIN_TEMPO_STAGE {
        stages.push(MIN_TEMPO_STAGE);
        remaining /= MIN_TEMPO_STAGE;
    }

    if remaining != 1.0 {
        stages.push(remaining);
    }
    stages
}

impl SpeedFilterChain {
    pub fn new(speed: f64) -> Result<Self> {
        validate_speed(speed)?;
        Ok(Self {
            audio_stages: tempo_stages(speed),
            video_pts_factor: 1.0 / speed,
        })
    }

    /// Comma-joined atempo chain, e.g. `atempo=2.0,atempo=1.5`
    pub fn audio_filter(&self) -> String {
        self.audio_stages
            .iter()
            .map(|stage| format!("atempo={}", format_factor(*stage)))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// e.g. `setpts=0.5*PTS`
    pub fn video_filter(&self) -> String {
        format!("setpts={}*PTS", format_factor(self.video_pts_factor))
    }

    /// ffmpeg arguments for the streams `target` names
    pub fn ffmpeg_args(&self, target: FilterTarget) -> Vec<String> {
        match target {
            FilterTarget::Audio => vec!["-af".into(), self.audio_filter()],
            FilterTarget::Video => vec!["-vf".into(), self.video_filter()],
            FilterTarget::Both => vec![
                "-vf".into(),
                self.video_filter(),
                "-af".into(),
                self.audio_filter(),
            ],
        }
    }
}

/// Always keep a decimal point so ffmpeg sees "2.0", not "2"
fn format_factor(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') || text.contains('e') {
        text
    } else {
        format!("{}.0", text)
    }
}
