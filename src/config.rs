use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

use crate::graphics::resolution::Resolution;
use crate::graphics::viewport::MAX_SCREENS;

/// Errors in a settings document
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

fn invalid(key: &str, value: &str, reason: impl Into<String>) -> SettingsError {
    SettingsError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Network frame preview drawn over the local back buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkPreview {
    #[default]
    Off,
    /// All four published viewports, one per quadrant
    AllViewports,
    /// One published viewport stretched over the whole back buffer
    Viewport(usize),
}

impl NetworkPreview {
    pub fn parse(s: &str) -> Result<Self, SettingsError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" | "" => Ok(Self::Off),
            "all" => Ok(Self::AllViewports),
            other => match other.parse::<usize>() {
                Ok(i) if i < MAX_SCREENS => Ok(Self::Viewport(i)),
                _ => Err(invalid(
                    "NetworkPreview",
                    s,
                    "expected Off, All or a viewport index 0-3",
                )),
            },
        }
    }
}

impl fmt::Display for NetworkPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "Off"),
            Self::AllViewports => write!(f, "All"),
            Self::Viewport(i) => write!(f, "{}", i),
        }
    }
}

/// Physical unit conversions derived from pixels-per-meter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitScale {
    pub pixels_per_meter: f32,
    pub meters_per_pixel: f32,
    pub pixels_per_liter: f32,
    pub liters_per_pixel: f32,
}

impl UnitScale {
    /// A liter is 10x10x10 cm; a pixel is `100 / ppm` cm on each side.
    pub fn from_ppm(pixels_per_meter: f32) -> Self {
        let cm_per_pixel = 100.0 / pixels_per_meter;
        let liter_volume = 10.0 * 10.0 * 10.0;
        let pixels_per_liter = liter_volume / (cm_per_pixel * cm_per_pixel * cm_per_pixel);
        Self {
            pixels_per_meter,
            meters_per_pixel: 1.0 / pixels_per_meter,
            pixels_per_liter,
            liters_per_pixel: 1.0 / pixels_per_liter,
        }
    }
}

/// Persisted frame compositor settings
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSettings {
    pub resolution_x: u32,
    pub resolution_y: u32,
    pub resolution_multiplier: u8,
    /// Forced split axes used whenever a single-axis split is requested
    pub h_split_override: bool,
    pub v_split_override: bool,
    pub palette_file: String,
    pub pixels_per_meter: f32,
    pub network_preview: NetworkPreview,
}

impl Default for FrameSettings {
    fn default() -> Self {
        let res = Resolution::default_mode();
        Self {
            resolution_x: res.width,
            resolution_y: res.height,
            resolution_multiplier: res.multiplier,
            h_split_override: false,
            v_split_override: false,
            palette_file: String::from("palette.png"),
            pixels_per_meter: 20.0,
            network_preview: NetworkPreview::Off,
        }
    }
}

impl FrameSettings {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.resolution_x, self.resolution_y, self.resolution_multiplier)
    }

    pub fn units(&self) -> UnitScale {
        UnitScale::from_ppm(self.pixels_per_meter)
    }

    /// Apply one named property. Returns `Ok(false)` for unknown keys.
    pub fn read_property(&mut self, key: &str, value: &str) -> Result<bool, SettingsError> {
        match key {
            "ResolutionX" => self.resolution_x = parse_positive(key, value)?,
            "ResolutionY" => self.resolution_y = parse_positive(key, value)?,
            "ResolutionMultiplier" => {
                let m: u8 = value
                    .parse()
                    .map_err(|e: std::num::ParseIntError| invalid(key, value, e.to_string()))?;
                if !(1..=4).contains(&m) {
                    return Err(invalid(key, value, "multiplier must be 1-4"));
                }
                self.resolution_multiplier = m;
            }
            "HSplitScreen" => self.h_split_override = parse_bool(key, value)?,
            "VSplitScreen" => self.v_split_override = parse_bool(key, value)?,
            "PaletteFile" => self.palette_file = value.to_string(),
            "PixelsPerMeter" => {
                let ppm: f32 = value
                    .parse()
                    .map_err(|e: std::num::ParseFloatError| invalid(key, value, e.to_string()))?;
                if !(ppm > 0.0 && ppm.is_finite()) {
                    return Err(invalid(key, value, "must be a positive number"));
                }
                self.pixels_per_meter = ppm;
            }
            "NetworkPreview" => self.network_preview = NetworkPreview::parse(value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Parse a `key = value` document. Unknown keys are logged and skipped.
    pub fn from_properties(data: &str) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        let mut result = Ok(());
        parse_properties(data, &mut |key, value| {
            if result.is_err() {
                return;
            }
            match settings.read_property(key, value) {
                Ok(true) => {}
                Ok(false) => log::warn!("Unknown frame setting '{}' ignored", key),
                Err(e) => result = Err(e),
            }
        });
        result.map(|_| settings)
    }

    pub fn to_properties(&self) -> String {
        format!(
            "# Frame compositor settings\n\
             ResolutionX = {}\n\
             ResolutionY = {}\n\
             ResolutionMultiplier = {}\n\
             HSplitScreen = {}\n\
             VSplitScreen = {}\n\
             PaletteFile = {}\n\
             PixelsPerMeter = {}\n\
             NetworkPreview = {}\n",
            self.resolution_x,
            self.resolution_y,
            self.resolution_multiplier,
            self.h_split_override as u8,
            self.v_split_override as u8,
            self.palette_file,
            self.pixels_per_meter,
            self.network_preview,
        )
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Self::from_properties(&data).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_properties())
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u32, SettingsError> {
    match value.parse::<u32>() {
        Ok(0) => Err(invalid(key, value, "must be positive")),
        Ok(v) => Ok(v),
        Err(e) => Err(invalid(key, value, e.to_string())),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(invalid(key, value, "expected 0/1 or true/false")),
    }
}

/// Parse `key = value` lines, invoking `handler` for each pair.
///
/// `#` starts a comment anywhere on a line. Keys and values are trimmed;
/// lines without `=` are skipped with a warning.
pub fn parse_properties(data: &str, handler: &mut dyn FnMut(&str, &str)) {
    for (number, raw) in data.lines().enumerate() {
        let line = match raw.find('#') {
            Some(i) => &raw[..i],
            None => raw,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => handler(key.trim(), value.trim()),
            None => log::warn!("Line {}: key without value", number + 1),
        }
    }
}

/// Parse a `WIDTHxHEIGHT` string
pub fn parse_resolution(s: &str) -> Result<(u32, u32)> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        anyhow::bail!("Resolution must be in WIDTHxHEIGHT format");
    }

    let width: u32 = parts[0].parse().context("Invalid width value")?;
    let height: u32 = parts[1].parse().context("Invalid height value")?;

    if width == 0 || height == 0 {
        anyhow::bail!("Resolution values must be positive");
    }

    Ok((width, height))
}
