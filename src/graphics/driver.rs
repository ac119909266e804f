//!
//! Display driver interface and the headless driver.
//!
//! The compositor never talks to a window system directly. Mode setting,
//! palette loading, presenting finished frames and modal notices all go
//! through the `DisplayDriver` trait. `HeadlessDriver` keeps everything in
//! memory and is used by the demo binary and the tests.
//!

use std::path::Path;

use crate::graphics::palette::{Palette, Rgb};
use crate::graphics::surface::{Surface, SurfaceError};

/// Error types for driver operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    /// The requested mode cannot be set.
    #[error("Unable to set video mode {width}x{height} at multiplier {multiplier}: {reason}")]
    ModeFailed {
        width: u32,
        height: u32,
        multiplier: u8,
        reason: String,
    },
    /// No graphics mode is active.
    #[error("Graphics driver has no active mode")]
    NoMode,
    /// Palette file could not be read.
    #[error("Failed to load palette from {path}: {reason}")]
    PaletteLoad { path: String, reason: String },
    /// Presented frame does not fit the active mode.
    #[error("Presented frame is {width}x{height}, mode expects {expected_width}x{expected_height}")]
    FrameSize {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// A graphics mode: logical resolution plus integer window scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    pub multiplier: u8,
}

impl DisplayMode {
    #[must_use]
    pub const fn new(width: u32, height: u32, multiplier: u8) -> Self {
        Self {
            width,
            height,
            multiplier,
        }
    }

    /// Size of the window on the desktop.
    #[must_use]
    pub fn window_size(&self) -> (u32, u32) {
        (
            self.width * self.multiplier as u32,
            self.height * self.multiplier as u32,
        )
    }
}

/// Trait for display drivers.
///
/// Implementations own the visible output surface. Everything else the
/// compositor draws into is owned by the compositor itself.
pub trait DisplayDriver {
    /// Enter a graphics mode.
    ///
    /// # Returns
    ///
    /// `Err` if the mode cannot be set; the previous mode is then gone and
    /// the caller must set another one.
    fn set_mode(&mut self, mode: DisplayMode) -> DriverResult<()>;

    /// Leave graphics mode entirely.
    fn set_text_mode(&mut self);

    /// Currently active mode, if any.
    #[must_use]
    fn current_mode(&self) -> Option<DisplayMode>;

    /// Largest window size the desktop can show.
    #[must_use]
    fn display_bounds(&self) -> (u32, u32);

    /// Show a finished 32-bit frame. The frame must already be scaled to the
    /// window size of the active mode.
    fn present(&mut self, frame: &Surface) -> DriverResult<()>;

    /// The active palette.
    #[must_use]
    fn palette(&self) -> &Palette;

    /// Replace the active palette.
    fn set_palette(&mut self, palette: Palette);

    /// Load and activate a palette file.
    ///
    /// # Arguments
    ///
    /// * `path` - Image whose first 256 pixels, row by row, are the palette
    fn load_palette(&mut self, path: &Path) -> DriverResult<Palette>;

    /// Blocking, attention-grabbing notice to the user.
    fn show_message(&mut self, message: &str);

    /// The visible output surface, if a frame has been presented.
    #[must_use]
    fn screen(&self) -> Option<&Surface>;
}

/// Read a palette swatch image: the first 256 pixels in row order become the
/// palette entries, missing entries are black.
pub fn load_palette_swatch(path: &Path) -> DriverResult<Palette> {
    let img = image::open(path).map_err(|e| DriverError::PaletteLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let rgb = img.to_rgb8();
    let colors: Vec<Rgb> = rgb
        .pixels()
        .take(256)
        .map(|p| Rgb::new(p[0], p[1], p[2]))
        .collect();
    Ok(Palette::from_slice(&colors))
}

/// In-memory driver with a configurable desktop size.
#[derive(Debug)]
pub struct HeadlessDriver {
    bounds: (u32, u32),
    mode: Option<DisplayMode>,
    palette: Palette,
    screen: Option<Surface>,
    rejected_multipliers: Vec<u8>,
    reject_all: bool,
    messages: Vec<String>,
    frames_presented: u64,
}

impl HeadlessDriver {
    /// Create a driver for a desktop of the given size.
    #[must_use]
    pub fn new(bounds_width: u32, bounds_height: u32) -> Self {
        Self {
            bounds: (bounds_width, bounds_height),
            mode: None,
            palette: Palette::grayscale(),
            screen: None,
            rejected_multipliers: Vec::new(),
            reject_all: false,
            messages: Vec::new(),
            frames_presented: 0,
        }
    }

    /// Make every mode with this multiplier fail to set.
    pub fn reject_multiplier(&mut self, multiplier: u8) {
        self.rejected_multipliers.push(multiplier);
    }

    /// Make every mode fail to set.
    pub fn reject_all_modes(&mut self, reject: bool) {
        self.reject_all = reject;
    }

    /// Modal notices shown so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    #[must_use]
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl Default for HeadlessDriver {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl DisplayDriver for HeadlessDriver {
    fn set_mode(&mut self, mode: DisplayMode) -> DriverResult<()> {
        let (w, h) = mode.window_size();
        let reason = if self.reject_all || self.rejected_multipliers.contains(&mode.multiplier) {
            Some("mode rejected by display".to_string())
        } else if mode.width == 0 || mode.height == 0 || mode.multiplier == 0 {
            Some("empty mode".to_string())
        } else if w > self.bounds.0 || h > self.bounds.1 {
            Some(format!(
                "window {}x{} exceeds display {}x{}",
                w, h, self.bounds.0, self.bounds.1
            ))
        } else {
            None
        };

        if let Some(reason) = reason {
            self.mode = None;
            return Err(DriverError::ModeFailed {
                width: mode.width,
                height: mode.height,
                multiplier: mode.multiplier,
                reason,
            });
        }

        log::info!(
            "Headless display mode set to {}x{} x{}",
            mode.width,
            mode.height,
            mode.multiplier
        );
        self.mode = Some(mode);
        self.screen = Some(Surface::new_rgb32(w, h)?);
        Ok(())
    }

    fn set_text_mode(&mut self) {
        log::debug!("Headless display left graphics mode");
        self.mode = None;
        self.screen = None;
    }

    fn current_mode(&self) -> Option<DisplayMode> {
        self.mode
    }

    fn display_bounds(&self) -> (u32, u32) {
        self.bounds
    }

    fn present(&mut self, frame: &Surface) -> DriverResult<()> {
        let mode = self.mode.ok_or(DriverError::NoMode)?;
        let (expected_width, expected_height) = mode.window_size();
        if frame.dimensions() != (expected_width, expected_height) {
            return Err(DriverError::FrameSize {
                width: frame.width(),
                height: frame.height(),
                expected_width,
                expected_height,
            });
        }
        match self.screen.as_mut() {
            Some(screen) => screen.copy_from(frame)?,
            None => self.screen = Some(frame.clone()),
        }
        self.frames_presented += 1;
        Ok(())
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }

    fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    fn load_palette(&mut self, path: &Path) -> DriverResult<Palette> {
        let palette = load_palette_swatch(path)?;
        self.palette = palette.clone();
        Ok(palette)
    }

    fn show_message(&mut self, message: &str) {
        log::warn!("{}", message);
        self.messages.push(message.to_string());
    }

    fn screen(&self) -> Option<&Surface> {
        self.screen.as_ref()
    }
}
