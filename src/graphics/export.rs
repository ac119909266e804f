//! Numbered bitmap dumps
//!
//! Dumps are written as `<base><NNN>.bmp`, taking the first number from 000
//! that does not exist yet.

use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};

use crate::graphics::palette::{Palette, Rgb};
use crate::graphics::surface::{PixelFormat, Surface};

/// Highest number of candidate filenames tried per dump
pub const MAX_FILE_TRIES: u32 = 1000;

/// What a dump captures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveBitmapMode {
    /// A caller-supplied surface
    SingleBitmap,
    /// Whatever the display currently shows
    ScreenDump,
    /// The whole scene, rendered fresh
    WorldDump,
}

/// Errors from bitmap export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No file name given for bitmap dump")]
    EmptyBaseName,

    #[error("No free file name for {base} after {tries} tries")]
    NoFreeName { base: String, tries: u32 },

    #[error("Nothing to save for {0:?}")]
    NothingToSave(SaveBitmapMode),

    #[error("Unable to save bitmap to {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// First `<base><NNN>.bmp` that does not exist
pub fn next_dump_path(base: &str) -> Result<PathBuf, ExportError> {
    if base.is_empty() {
        return Err(ExportError::EmptyBaseName);
    }
    (0..MAX_FILE_TRIES)
        .map(|n| PathBuf::from(format!("{}{:03}.bmp", base, n)))
        .find(|p| !p.exists())
        .ok_or_else(|| ExportError::NoFreeName {
            base: base.to_string(),
            tries: MAX_FILE_TRIES,
        })
}

/// Encodes surfaces to files
pub trait BitmapWriter {
    fn write(&self, path: &Path, surface: &Surface, palette: &Palette) -> Result<(), ExportError>;
}

/// Writes 24-bit BMP files
#[derive(Debug, Clone, Copy, Default)]
pub struct BmpWriter;

/// Expand a surface into an RGB image; indexed pixels go through `palette`
pub fn surface_to_image(surface: &Surface, palette: &Palette) -> RgbImage {
    let mut img = RgbImage::new(surface.width(), surface.height());
    for (x, y, px) in img.enumerate_pixels_mut() {
        let raw = surface.get_pixel(x as i32, y as i32).unwrap_or(0);
        let color = match surface.format() {
            PixelFormat::Indexed8 => palette.color(raw as u8),
            PixelFormat::Rgb32 => Rgb::unpack(raw),
        };
        *px = image::Rgb([color.r, color.g, color.b]);
    }
    img
}

impl BitmapWriter for BmpWriter {
    fn write(&self, path: &Path, surface: &Surface, palette: &Palette) -> Result<(), ExportError> {
        surface_to_image(surface, palette)
            .save_with_format(path, ImageFormat::Bmp)
            .map_err(|source| ExportError::Encode {
                path: path.to_path_buf(),
                source,
            })
    }
}
