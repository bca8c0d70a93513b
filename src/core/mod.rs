//! Core modules: plan building, speed filters, yt-dlp, orchestration

pub mod builder;
pub mod orchestrator;
pub mod speed;
pub mod ytdlp;
