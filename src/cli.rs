use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{parse_resolution, FrameSettings, NetworkPreview};
use crate::graphics::viewport::MAX_SCREENS;

/// Split-screen frame compositor demo
#[derive(Parser, Debug)]
#[command(name = "framecomp")]
#[command(version = "0.8.0")]
#[command(about = "Renders a procedural scene through the split-screen frame compositor", long_about = None)]
pub struct Cli {
    /// Number of frames to render
    #[arg(short = 'n', long, default_value_t = 60)]
    pub frames: u32,

    /// Number of player screens (1-4)
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub players: u8,

    /// Publish frames to a network frame server instead of composing locally
    #[arg(long)]
    pub networked: bool,

    /// Resolution override (e.g., 960x540)
    #[arg(short, long, value_name = "WIDTHxHEIGHT")]
    pub res: Option<String>,

    /// Window scale override (1-4)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub multiplier: Option<u8>,

    /// Network preview drawn over the back buffer (off, all, or a viewport index)
    #[arg(long, value_name = "MODE")]
    pub preview: Option<String>,

    /// Base name for a screen dump written after the last frame
    #[arg(long, value_name = "BASENAME")]
    pub dump: Option<String>,

    /// Base name for a whole-scene dump written after the last frame
    #[arg(long, value_name = "BASENAME")]
    pub world_dump: Option<String>,

    /// Settings file; read if present, written back on exit
    #[arg(short, long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Number of log lines kept for the console
    #[arg(long, default_value_t = 15)]
    pub log_lines: usize,

    /// Log verbosity (0 nothing - 6 everything)
    #[arg(short, long, default_value_t = 4)]
    pub verbosity: i32,
}

impl Cli {
    pub fn player_count(&self) -> usize {
        (self.players as usize).clamp(1, MAX_SCREENS)
    }

    /// Apply command line overrides on top of loaded settings
    pub fn merge_into_settings(&self, mut settings: FrameSettings) -> Result<FrameSettings> {
        if let Some(res) = &self.res {
            let (width, height) = parse_resolution(res).context("Invalid --res")?;
            settings.resolution_x = width;
            settings.resolution_y = height;
        }
        if let Some(multiplier) = self.multiplier {
            settings.resolution_multiplier = multiplier;
        }
        if let Some(preview) = &self.preview {
            settings.network_preview = NetworkPreview::parse(preview).context("Invalid --preview")?;
        }
        Ok(settings)
    }
}
