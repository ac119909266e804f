//! Per-screen transient messages and full-screen flashes
//!
//! Key concepts:
//! - Suppression: a new message is accepted only once the previous one's
//!   duration has elapsed
//! - Blink: blinking text is never hidden, it gains ">>> <<<" markers in
//!   its off phase instead
//! - Flash: solid paint on alternate frames while the 50ms flicker timer is
//!   in its on phase or the flash is about to end

use crate::graphics::font::{TextAlign, TextRenderer};
use crate::graphics::surface::Surface;
use crate::graphics::viewport::MAX_SCREENS;
use crate::time::{SharedClock, Timer};

/// Flicker half-period of a flash
pub const FLASH_FLICKER_MS: i64 = 50;
/// Remaining time under which a flash paints regardless of flicker phase
pub const FLASH_SOLID_TAIL_MS: i64 = 10;
/// Text row used when not centred
pub const TEXT_TOP_Y: i32 = 12;
/// Centred text sits this far above the screen's middle
pub const TEXT_CENTRE_RAISE: i32 = 52;

const OBSERVER_TEXT: &str = "- Observer View -";

/// One screen's message
#[derive(Debug)]
pub struct ScreenText {
    message: String,
    blink_interval_ms: i64,
    /// Negative means "until replaced or cleared"
    duration_ms: i64,
    timer: Timer,
    centered: bool,
}

impl ScreenText {
    fn new(clock: SharedClock) -> Self {
        Self {
            message: String::new(),
            blink_interval_ms: 0,
            duration_ms: -1,
            timer: Timer::new(clock),
            centered: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_centered(&self) -> bool {
        self.centered
    }

    pub fn blink_interval_ms(&self) -> i64 {
        self.blink_interval_ms
    }

    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    /// Whether a new message may replace this one
    pub fn is_expired(&self) -> bool {
        self.timer.is_past_real_ms(self.duration_ms)
    }

    /// Whether there is anything to draw right now
    pub fn is_visible(&self) -> bool {
        !self.message.is_empty() && (self.duration_ms < 0 || !self.is_expired())
    }
}

/// One screen's flash
#[derive(Debug)]
pub struct ScreenFlash {
    color: Option<u32>,
    timer: Timer,
    flashed_last_frame: bool,
}

impl ScreenFlash {
    fn new(clock: SharedClock) -> Self {
        Self {
            color: None,
            timer: Timer::new(clock),
            flashed_last_frame: false,
        }
    }

    pub fn color(&self) -> Option<u32> {
        self.color
    }

    pub fn is_active(&self) -> bool {
        self.color.is_some()
    }

    fn reset(&mut self) {
        self.color = None;
        self.flashed_last_frame = false;
    }
}

/// Where a screen's text goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPlacement {
    /// Whether a human player looks through this screen
    pub human: bool,
    /// Size of the surface the screen is drawn into
    pub frame_width: u32,
    pub frame_height: u32,
    /// Width of a local player screen
    pub player_screen_width: u32,
    /// Back buffer width
    pub res_x: u32,
    /// Horizontal HUD occlusion of the screen
    pub occlusion_x: i32,
}

impl TextPlacement {
    fn message_x(&self) -> i32 {
        let occlusion = if self.player_screen_width <= self.res_x / 2 {
            0
        } else {
            self.occlusion_x
        };
        (self.frame_width as i32 + occlusion) / 2
    }
}

/// Messages and flashes for every screen
#[derive(Debug)]
pub struct TextOverlay {
    texts: [ScreenText; MAX_SCREENS],
    flashes: [ScreenFlash; MAX_SCREENS],
    blink_timer: Timer,
}

impl TextOverlay {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            texts: std::array::from_fn(|_| ScreenText::new(clock.clone())),
            flashes: std::array::from_fn(|_| ScreenFlash::new(clock.clone())),
            blink_timer: Timer::new(clock),
        }
    }

    pub fn screen_text(&self, screen: usize) -> Option<&ScreenText> {
        self.texts.get(screen)
    }

    pub fn screen_flash(&self, screen: usize) -> Option<&ScreenFlash> {
        self.flashes.get(screen)
    }

    /// Show a message on a screen unless its current one is still running.
    /// Returns whether the message was accepted.
    pub fn set_screen_text(
        &mut self,
        screen: usize,
        message: &str,
        blink_interval_ms: i64,
        duration_ms: i64,
        centered: bool,
    ) -> bool {
        let Some(text) = self.texts.get_mut(screen) else {
            return false;
        };
        if !text.is_expired() {
            return false;
        }
        text.message = message.to_string();
        text.duration_ms = duration_ms;
        text.timer.reset();
        text.blink_interval_ms = blink_interval_ms;
        text.centered = centered;
        true
    }

    /// Drop a screen's message; the next one is accepted immediately
    pub fn clear_screen_text(&mut self, screen: usize) {
        if let Some(text) = self.texts.get_mut(screen) {
            text.message.clear();
            text.duration_ms = -1;
            text.timer.reset();
            text.blink_interval_ms = 0;
        }
    }

    /// Start flashing a screen with `color` for `period_ms`
    pub fn flash_screen(&mut self, screen: usize, color: u32, period_ms: i64) {
        if let Some(flash) = self.flashes.get_mut(screen) {
            flash.color = Some(color);
            flash.timer.set_real_time_limit_ms(period_ms);
            flash.timer.reset();
        }
    }

    /// Stop every flash
    pub fn reset_flashes(&mut self) {
        for flash in &mut self.flashes {
            flash.reset();
        }
    }

    /// Draw a screen's message, or the observer banner for non-human screens
    pub fn draw_screen_text(
        &self,
        screen: usize,
        target: &mut Surface,
        placement: &TextPlacement,
        font: &dyn TextRenderer,
    ) {
        let Some(text) = self.texts.get(screen) else {
            return;
        };

        if !placement.human {
            font.draw_aligned(
                target,
                placement.player_screen_width as i32 / 2,
                0,
                OBSERVER_TEXT,
                TextAlign::Centre,
            );
            return;
        }
        if !text.is_visible() {
            return;
        }

        let y = if text.centered {
            placement.frame_height as i32 / 2 - TEXT_CENTRE_RAISE
        } else {
            TEXT_TOP_Y
        };
        let x = placement.message_x();

        if text.blink_interval_ms > 0 && self.blink_timer.alternate_real(text.blink_interval_ms) {
            let marked = format!(">>> {} <<<", text.message);
            font.draw_aligned(target, x, y, &marked, TextAlign::Centre);
        } else {
            font.draw_aligned(target, x, y, &text.message, TextAlign::Centre);
        }
    }

    /// Advance and paint a screen's flash
    ///
    /// Returns true if the flash color was painted this frame.
    pub fn draw_screen_flash(&mut self, screen: usize, target: &mut Surface) -> bool {
        let Some(flash) = self.flashes.get_mut(screen) else {
            return false;
        };
        let Some(color) = flash.color else {
            return false;
        };

        let mut painted = false;
        let left = flash.timer.left_till_real_time_limit_ms();
        if left < FLASH_SOLID_TAIL_MS || flash.timer.alternate_real(FLASH_FLICKER_MS) {
            if flash.flashed_last_frame {
                flash.flashed_last_frame = false;
            } else {
                target.fill_rect(0, 0, target.width() as i32, target.height() as i32, color);
                flash.flashed_last_frame = true;
                painted = true;
            }
        }
        if flash.timer.is_past_real_time_limit() {
            flash.color = None;
        }
        painted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::font::MiniFont;
    use crate::time::ManualClock;

    fn placement() -> TextPlacement {
        TextPlacement {
            human: true,
            frame_width: 200,
            frame_height: 200,
            player_screen_width: 200,
            res_x: 200,
            occlusion_x: 0,
        }
    }

    fn rows_with_ink(s: &Surface) -> Vec<i32> {
        (0..s.height() as i32)
            .filter(|&y| (0..s.width() as i32).any(|x| s.get_pixel(x, y) != Some(0)))
            .collect()
    }

    fn ink_span(s: &Surface) -> Option<(i32, i32)> {
        let xs: Vec<i32> = (0..s.width() as i32)
            .filter(|&x| (0..s.height() as i32).any(|y| s.get_pixel(x, y) != Some(0)))
            .collect();
        Some((*xs.first()?, *xs.last()?))
    }

    #[test]
    fn test_message_suppressed_until_expired() {
        let clock = ManualClock::new();
        let mut overlay = TextOverlay::new(clock.shared());
        clock.advance(1);
        assert!(overlay.set_screen_text(0, "first", 0, 1000, false));
        clock.advance(500);
        assert!(!overlay.set_screen_text(0, "second", 0, 1000, false));
        assert_eq!(overlay.screen_text(0).unwrap().message(), "first");
        clock.advance(501);
        assert!(overlay.set_screen_text(0, "second", 0, 1000, false));
        assert_eq!(overlay.screen_text(0).unwrap().message(), "second");
    }

    #[test]
    fn test_clear_allows_immediate_replacement() {
        let clock = ManualClock::new();
        let mut overlay = TextOverlay::new(clock.shared());
        clock.advance(1);
        overlay.set_screen_text(1, "busy", 0, 10_000, false);
        overlay.clear_screen_text(1);
        assert_eq!(overlay.screen_text(1).unwrap().message(), "");
        assert!(overlay.set_screen_text(1, "next", 0, 10_000, false));
    }

    #[test]
    fn test_out_of_range_screen_ignored() {
        let clock = ManualClock::new();
        let mut overlay = TextOverlay::new(clock.shared());
        assert!(!overlay.set_screen_text(4, "nope", 0, 0, false));
        overlay.clear_screen_text(9);
        overlay.flash_screen(7, 3, 100);
    }

    #[test]
    fn test_expired_text_not_drawn_but_persistent_is() {
        let clock = ManualClock::new();
        let mut overlay = TextOverlay::new(clock.shared());
        let font = MiniFont::small(1);
        clock.advance(1);
        overlay.set_screen_text(0, "HI", 0, 100, false);
        clock.advance(200);

        let mut s = Surface::new_indexed(200, 200).unwrap();
        overlay.draw_screen_text(0, &mut s, &placement(), &font);
        assert!(rows_with_ink(&s).is_empty());

        overlay.set_screen_text(0, "HI", 0, -1, false);
        clock.advance(100_000);
        overlay.draw_screen_text(0, &mut s, &placement(), &font);
        assert_eq!(rows_with_ink(&s).first(), Some(&TEXT_TOP_Y));
    }

    #[test]
    fn test_centered_text_row() {
        let clock = ManualClock::new();
        let mut overlay = TextOverlay::new(clock.shared());
        clock.advance(1);
        overlay.set_screen_text(0, "HI", 0, -1, true);
        let mut s = Surface::new_indexed(200, 200).unwrap();
        overlay.draw_screen_text(0, &mut s, &placement(), &MiniFont::small(1));
        assert_eq!(rows_with_ink(&s).first(), Some(&(100 - TEXT_CENTRE_RAISE)));
    }

    #[test]
    fn test_blink_adds_markers_instead_of_hiding() {
        let clock = ManualClock::new();
        let mut overlay = TextOverlay::new(clock.shared());
        let font = MiniFont::small(1);
        clock.advance(1);
        overlay.set_screen_text(0, "I", 100, -1, false);

        // On phase: plain text
        let mut plain = Surface::new_indexed(200, 40).unwrap();
        overlay.draw_screen_text(0, &mut plain, &placement(), &font);
        let (l, r) = ink_span(&plain).unwrap();
        assert_eq!(r - l + 1, font.calculate_width("I"));

        // Off phase: still drawn, now wrapped in markers
        clock.advance(150);
        let mut marked = Surface::new_indexed(200, 40).unwrap();
        overlay.draw_screen_text(0, &mut marked, &placement(), &font);
        let (l, r) = ink_span(&marked).unwrap();
        assert_eq!(r - l + 1, font.calculate_width(">>> I <<<"));
    }

    #[test]
    fn test_observer_banner() {
        let clock = ManualClock::new();
        let overlay = TextOverlay::new(clock.shared());
        let mut s = Surface::new_indexed(200, 40).unwrap();
        let mut p = placement();
        p.human = false;
        overlay.draw_screen_text(2, &mut s, &p, &MiniFont::small(1));
        assert_eq!(rows_with_ink(&s).first(), Some(&0));
    }

    #[test]
    fn test_occlusion_ignored_on_narrow_screens() {
        let p = TextPlacement {
            human: true,
            frame_width: 100,
            frame_height: 100,
            player_screen_width: 100,
            res_x: 200,
            occlusion_x: 40,
        };
        assert_eq!(p.message_x(), 50);
        let wide = TextPlacement {
            player_screen_width: 200,
            frame_width: 200,
            ..p
        };
        assert_eq!(wide.message_x(), 120);
    }

    #[test]
    fn test_flash_alternates_and_expires() {
        let clock = ManualClock::new();
        let mut overlay = TextOverlay::new(clock.shared());
        let mut s = Surface::new_indexed(4, 4).unwrap();
        overlay.flash_screen(0, 9, 200);

        // Flicker timer in off phase, plenty of time left: no paint
        assert!(!overlay.draw_screen_flash(0, &mut s));

        // On phase: paint, then skip the next frame
        clock.advance(60);
        assert!(overlay.draw_screen_flash(0, &mut s));
        assert_eq!(s.get_pixel(3, 3), Some(9));
        assert!(!overlay.draw_screen_flash(0, &mut s));
        assert!(overlay.draw_screen_flash(0, &mut s));

        // Past the limit: deactivates
        clock.advance(200);
        overlay.draw_screen_flash(0, &mut s);
        assert!(!overlay.screen_flash(0).unwrap().is_active());
        assert!(!overlay.draw_screen_flash(0, &mut s));
    }

    #[test]
    fn test_flash_solid_near_end() {
        let clock = ManualClock::new();
        let mut overlay = TextOverlay::new(clock.shared());
        let mut s = Surface::new_indexed(4, 4).unwrap();
        overlay.flash_screen(1, 3, 105);
        // Flicker is in its off phase at 100ms, but only 5ms remain
        clock.advance(100);
        assert!(overlay.draw_screen_flash(1, &mut s));
    }

    #[test]
    fn test_reset_flashes() {
        let clock = ManualClock::new();
        let mut overlay = TextOverlay::new(clock.shared());
        overlay.flash_screen(0, 1, 1000);
        overlay.flash_screen(3, 1, 1000);
        overlay.reset_flashes();
        assert!((0..MAX_SCREENS).all(|i| !overlay.screen_flash(i).unwrap().is_active()));
    }
}
