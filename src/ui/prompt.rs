//! Interactive download form (dialoguer)

use crate::core::speed::{MAX_SPEED, MIN_SPEED};
use crate::error::Result;
use crate::types::{DownloadRequest, FormatChoice, MenuItem, Resolution};
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};

/// Pick one item; `None` when the user backs out with Esc/q
fn select<T: Clone>(items: &[MenuItem<T>], prompt: &str, default: usize) -> Result<Option<T>> {
    if items.is_empty() {
        return Ok(None);
    }

    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(&labels)
        .default(default.min(items.len() - 1))
        .interact_opt()?;

    Ok(selection.and_then(|i| items.get(i)).map(|item| item.value.clone()))
}

fn confirm(prompt: &str, default: bool) -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

/// Format menu for the detected toolset, current choice preselected
pub fn format_menu(
    transcoder: bool,
    current: FormatChoice,
) -> (Vec<MenuItem<FormatChoice>>, usize) {
    let choices = FormatChoice::available(transcoder);
    let default = choices.iter().position(|c| *c == current).unwrap_or(0);
    let items = choices
        .into_iter()
        .map(|c| MenuItem {
            label: c.menu_label(transcoder).to_string(),
            value: c,
        })
        .collect();
    (items, default)
}

fn resolution_menu() -> Vec<MenuItem<Resolution>> {
    Resolution::ALL
        .into_iter()
        .map(|r| MenuItem {
            label: r.label().to_string(),
            value: r,
        })
        .collect()
}

/// Ask for everything the flags did not settle.
///
/// Returns `false` if the user cancelled a menu. Options that need ffmpeg
/// are only offered when a transcoder is available.
pub fn fill_request(request: &mut DownloadRequest, ask_url: bool) -> Result<bool> {
    let theme = ColorfulTheme::default();

    if ask_url {
        request.url = Input::<String>::with_theme(&theme)
            .with_prompt("Video URL")
            .validate_with(|url: &String| -> std::result::Result<(), &str> {
                if url.trim().is_empty() {
                    Err("a URL is required")
                } else {
                    Ok(())
                }
            })
            .interact_text()?
            .trim()
            .to_string();
    }

    let transcoder = request.has_transcoder();
    let (formats, default) = format_menu(transcoder, request.format_choice);
    let Some(choice) = select(&formats, "Format", default)? else {
        return Ok(false);
    };
    request.format_choice = choice;

    if choice == FormatChoice::Custom {
        let code: String = Input::with_theme(&theme)
            .with_prompt("Format code (e.g. bestvideo+bestaudio)")
            .with_initial_text(request.custom_format.clone().unwrap_or_default())
            .allow_empty(true)
            .interact_text()?;
        request.custom_format = Some(code);
    }

    // capping the height merges streams, which needs ffmpeg
    if !transcoder {
        request.resolution = Resolution::BestAvailable;
    } else if !choice.is_audio_only() {
        let menu = resolution_menu();
        let current = menu.iter().position(|m| m.value == request.resolution).unwrap_or(0);
        let Some(resolution) = select(&menu, "Max Resolution", current)? else {
            return Ok(false);
        };
        request.resolution = resolution;
    }

    request.output_template = Input::with_theme(&theme)
        .with_prompt("Filename template")
        .default(request.output_template.clone())
        .interact_text()?;

    if transcoder && confirm("Adjust playback speed?", request.speed != 1.0)? {
        request.speed = Input::<f64>::with_theme(&theme)
            .with_prompt(format!("Speed factor ({}-{})", MIN_SPEED, MAX_SPEED))
            .default(if request.speed == 1.0 { 1.5 } else { request.speed })
            .validate_with(|v: &f64| -> std::result::Result<(), String> {
                if (MIN_SPEED..=MAX_SPEED).contains(v) {
                    Ok(())
                } else {
                    Err(format!("must be between {} and {}", MIN_SPEED, MAX_SPEED))
                }
            })
            .interact_text()?;
    } else {
        request.speed = 1.0;
    }

    request.download_subtitles = confirm("Download subtitles?", request.download_subtitles)?;
    if request.download_subtitles {
        let lang: String = Input::with_theme(&theme)
            .with_prompt("Subtitle language")
            .default(request.subtitle_language.clone().unwrap_or_else(|| "en".into()))
            .interact_text()?;
        request.subtitle_language = Some(lang);
    }

    if transcoder {
        request.embed_thumbnail = confirm("Embed thumbnail?", request.embed_thumbnail)?;
        request.embed_metadata = confirm("Embed metadata?", request.embed_metadata)?;
    } else {
        request.embed_thumbnail = false;
        request.embed_metadata = false;
    }

    Ok(true)
}
