//! vidgrab library
//!
//! Turns a handful of download preferences into a yt-dlp/ffmpeg pipeline
//! and runs it.

pub mod core;
pub mod error;
pub mod storage;
pub mod types;
pub mod ui;
pub mod utils;
