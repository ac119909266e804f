//! Resolution validation
//!
//! Requested resolutions are never rejected outright at startup. They are
//! corrected to something the display can show and the correction is
//! reported so the caller can tell the user.

use std::fmt;

/// Smallest resolution the validity check accepts
pub const MIN_RESOLUTION: (u32, u32) = (800, 600);
/// Fallback resolution
pub const DEFAULT_RESOLUTION: (u32, u32) = (960, 540);
/// Largest window scale
pub const MAX_MULTIPLIER: u8 = 4;
/// Dimension pair the display path cannot handle, and its substitute
const DENIED_RESOLUTION: (u32, u32) = (1366, 768);
const DENIED_SUBSTITUTE: (u32, u32) = (1360, 768);

/// Logical resolution plus window scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    pub multiplier: u8,
}

impl Resolution {
    pub const fn new(width: u32, height: u32, multiplier: u8) -> Self {
        Self {
            width,
            height,
            multiplier,
        }
    }

    pub const fn default_mode() -> Self {
        Self::new(DEFAULT_RESOLUTION.0, DEFAULT_RESOLUTION.1, 1)
    }

    pub fn scaled(&self) -> (u32, u32) {
        (
            self.width * self.multiplier as u32,
            self.height * self.multiplier as u32,
        )
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::default_mode()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} x{}", self.width, self.height, self.multiplier)
    }
}

/// Why a requested resolution was changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionCorrection {
    /// Scaled window larger than the display; shrunk to fit
    TooLarge,
    /// The denied pair was requested; substitute used
    Unsupported,
    /// Width not a multiple of 4; rounded down
    WidthNotDivisible,
    /// Aspect ratio outside [1, 4]; reverted to defaults
    AbnormalAspect,
}

impl ResolutionCorrection {
    /// Notice shown to the user
    pub fn message(&self) -> &'static str {
        match self {
            Self::TooLarge => "Resolution too high to fit display, overriding to fit!",
            Self::Unsupported => {
                "Unfortunately, 1366x768 resolution is not supported. 1360x768 will be used instead!"
            }
            Self::WidthNotDivisible => {
                "Resolution width that is not divisible by 4 is not supported!\nOverriding to closest valid width!"
            }
            Self::AbnormalAspect => "Abnormal aspect ratio detected! Reverting to defaults!",
        }
    }
}

/// Correct a requested resolution for a display of `display` pixels
///
/// At most one correction is applied, checked in this order: too large,
/// denied pair, width divisibility, aspect ratio.
pub fn validate_resolution(
    requested: Resolution,
    display: (u32, u32),
) -> (Resolution, Option<ResolutionCorrection>) {
    let mut res = requested;
    res.multiplier = res.multiplier.clamp(1, MAX_MULTIPLIER);
    let mult = res.multiplier as u32;
    let (scaled_w, scaled_h) = res.scaled();

    if scaled_w > display.0 || scaled_h > display.1 {
        res.width = display.0 / mult;
        res.height = display.1 / mult;
        return (res, Some(ResolutionCorrection::TooLarge));
    }
    if (scaled_w, scaled_h) == DENIED_RESOLUTION {
        res.width = DENIED_SUBSTITUTE.0 / mult;
        res.height = DENIED_SUBSTITUTE.1 / mult;
        return (res, Some(ResolutionCorrection::Unsupported));
    }
    if scaled_w % 4 > 0 {
        res.width = res.width / 4 * 4;
        return (res, Some(ResolutionCorrection::WidthNotDivisible));
    }

    let aspect = res.width as f32 / res.height.max(1) as f32;
    if !(1.0..=4.0).contains(&aspect) {
        return (Resolution::default_mode(), Some(ResolutionCorrection::AbnormalAspect));
    }
    (res, None)
}

/// Whether a resolution may be offered to the user at a given multiplier
pub fn is_valid_resolution(width: u32, height: u32, multiplier: u8, display: (u32, u32)) -> bool {
    let mult = multiplier.max(1) as u32;
    if width < MIN_RESOLUTION.0 || height < MIN_RESOLUTION.1 {
        return false;
    }
    if width * mult > display.0 || height * mult > display.1 {
        return false;
    }
    (width, height) != DENIED_RESOLUTION
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISPLAY: (u32, u32) = (1920, 1080);

    #[test]
    fn test_valid_request_untouched() {
        let req = Resolution::new(960, 540, 2);
        assert_eq!(validate_resolution(req, DISPLAY), (req, None));
    }

    #[test]
    fn test_too_large_shrinks_to_display() {
        let (res, fix) = validate_resolution(Resolution::new(1280, 720, 2), DISPLAY);
        assert_eq!(fix, Some(ResolutionCorrection::TooLarge));
        assert_eq!(res, Resolution::new(960, 540, 2));
    }

    #[test]
    fn test_denied_pair_substituted() {
        let (res, fix) = validate_resolution(Resolution::new(1366, 768, 1), DISPLAY);
        assert_eq!(fix, Some(ResolutionCorrection::Unsupported));
        assert_eq!(res, Resolution::new(1360, 768, 1));

        let (res, fix) = validate_resolution(Resolution::new(683, 384, 2), DISPLAY);
        assert_eq!(fix, Some(ResolutionCorrection::Unsupported));
        assert_eq!(res, Resolution::new(680, 384, 2));
    }

    #[test]
    fn test_width_rounded_down_to_multiple_of_four() {
        let (res, fix) = validate_resolution(Resolution::new(961, 540, 1), DISPLAY);
        assert_eq!(fix, Some(ResolutionCorrection::WidthNotDivisible));
        assert_eq!(res.width, 960);
        assert_eq!(res.height, 540);
    }

    #[test]
    fn test_abnormal_aspect_reverts_to_defaults() {
        let (res, fix) = validate_resolution(Resolution::new(1600, 160, 1), DISPLAY);
        assert_eq!(fix, Some(ResolutionCorrection::AbnormalAspect));
        assert_eq!(res, Resolution::new(960, 540, 1));

        let (res, _) = validate_resolution(Resolution::new(600, 800, 1), DISPLAY);
        assert_eq!(res, Resolution::default_mode());
    }

    #[test]
    fn test_zero_multiplier_clamped() {
        let (res, fix) = validate_resolution(Resolution::new(960, 540, 0), DISPLAY);
        assert_eq!(fix, None);
        assert_eq!(res.multiplier, 1);
    }

    #[test]
    fn test_is_valid_resolution() {
        assert!(is_valid_resolution(800, 600, 1, DISPLAY));
        assert!(!is_valid_resolution(799, 600, 1, DISPLAY));
        assert!(!is_valid_resolution(1366, 768, 1, DISPLAY));
        assert!(!is_valid_resolution(1366, 768, 1, (4000, 4000)));
        assert!(!is_valid_resolution(1366, 768, 2, (4000, 4000)));
        assert!(!is_valid_resolution(1024, 768, 2, DISPLAY));
        assert!(is_valid_resolution(1920, 1080, 1, DISPLAY));
    }
}
