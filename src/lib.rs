// Frame compositor library
// Split-screen composition, text overlays and network frame handoff

pub mod cli;
pub mod config;
pub mod demo;
pub mod graphics;
pub mod logging;
pub mod server;
pub mod time;

pub use cli::Cli;
pub use config::FrameSettings;
pub use graphics::{FrameError, FrameManager};
pub use logging::LogLevel;
pub use server::{ClientFrame, FrameServer};
