//! Split-screen layout
//!
//! Two independent split flags divide the back buffer into 1, 2 or 4 player
//! screens. Screen indices map to fixed quadrants:
//!
//! | index | no split | horizontal only | vertical only | both        |
//! |-------|----------|-----------------|---------------|-------------|
//! | 0     | whole    | top             | left          | top-left    |
//! | 1     |          | bottom          | right         | top-right   |
//! | 2     |          |                 |               | bottom-left |
//! | 3     |          |                 |               | bottom-right|

use crate::graphics::geometry::Point;
use crate::graphics::surface::Surface;

/// Maximum number of player screens
pub const MAX_SCREENS: usize = 4;

/// Which axes the output is split along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SplitLayout {
    /// Split into a top and bottom half
    pub h_split: bool,
    /// Split into a left and right half
    pub v_split: bool,
}

impl SplitLayout {
    pub const fn new(h_split: bool, v_split: bool) -> Self {
        Self { h_split, v_split }
    }

    /// Smallest layout that fits `players` screens
    pub fn for_players(players: usize) -> Self {
        match players {
            0 | 1 => Self::new(false, false),
            2 => Self::new(true, false),
            _ => Self::new(true, true),
        }
    }

    pub fn screen_count(&self) -> usize {
        (if self.h_split { 2 } else { 1 }) * (if self.v_split { 2 } else { 1 })
    }

    pub fn is_split(&self) -> bool {
        self.h_split || self.v_split
    }

    /// Size of one player screen for a given back buffer resolution
    pub fn viewport_size(&self, res_x: u32, res_y: u32) -> (u32, u32) {
        (
            res_x / if self.v_split { 2 } else { 1 },
            res_y / if self.h_split { 2 } else { 1 },
        )
    }

    /// Top-left of a player screen within the back buffer
    pub fn screen_offset(&self, screen: usize, res_x: u32, res_y: u32) -> Point {
        let half_x = (res_x / 2) as i32;
        let half_y = (res_y / 2) as i32;
        match screen {
            1 if self.v_split => Point::new(half_x, 0),
            1 => Point::new(0, half_y),
            2 => Point::new(0, half_y),
            3 => Point::new(half_x, half_y),
            _ => Point::new(0, 0),
        }
    }

    /// Draw the 2px seams between split screens
    pub fn draw_separators(&self, back_buffer: &mut Surface, color: u32) {
        let w = back_buffer.width() as i32;
        let h = back_buffer.height() as i32;
        if self.h_split {
            back_buffer.hline(0, h / 2 - 1, w - 1, color);
            back_buffer.hline(0, h / 2, w - 1, color);
        }
        if self.v_split {
            back_buffer.vline(w / 2 - 1, 0, h - 1, color);
            back_buffer.vline(w / 2, 0, h - 1, color);
        }
    }
}

/// Apply the single-axis split override to a split request
///
/// The override wins only when exactly one axis is requested; a request for
/// both axes or for none passes through untouched.
pub fn resolve_split_request(
    requested: SplitLayout,
    h_override: bool,
    v_override: bool,
) -> SplitLayout {
    let single_axis = requested.h_split != requested.v_split;
    if single_axis && (h_override || v_override) {
        SplitLayout::new(h_override, v_override)
    } else {
        requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_count() {
        assert_eq!(SplitLayout::new(false, false).screen_count(), 1);
        assert_eq!(SplitLayout::new(true, false).screen_count(), 2);
        assert_eq!(SplitLayout::new(false, true).screen_count(), 2);
        assert_eq!(SplitLayout::new(true, true).screen_count(), 4);
    }

    #[test]
    fn test_for_players() {
        assert_eq!(SplitLayout::for_players(1).screen_count(), 1);
        assert_eq!(SplitLayout::for_players(2), SplitLayout::new(true, false));
        assert_eq!(SplitLayout::for_players(3).screen_count(), 4);
    }

    #[test]
    fn test_viewport_size() {
        assert_eq!(SplitLayout::new(true, false).viewport_size(960, 540), (960, 270));
        assert_eq!(SplitLayout::new(false, true).viewport_size(960, 540), (480, 540));
        assert_eq!(SplitLayout::new(true, true).viewport_size(961, 541), (480, 270));
    }

    #[test]
    fn test_override_only_for_single_axis() {
        let h = SplitLayout::new(true, false);
        assert_eq!(resolve_split_request(h, false, true), SplitLayout::new(false, true));
        assert_eq!(resolve_split_request(h, false, false), h);

        let both = SplitLayout::new(true, true);
        assert_eq!(resolve_split_request(both, false, true), both);

        let none = SplitLayout::new(false, false);
        assert_eq!(resolve_split_request(none, true, false), none);
    }

    #[test]
    fn test_separators() {
        let mut s = Surface::new_indexed(8, 6).unwrap();
        SplitLayout::new(true, true).draw_separators(&mut s, 5);
        assert_eq!(s.get_pixel(0, 2), Some(5));
        assert_eq!(s.get_pixel(7, 3), Some(5));
        assert_eq!(s.get_pixel(3, 0), Some(5));
        assert_eq!(s.get_pixel(4, 5), Some(5));
        assert_eq!(s.get_pixel(0, 0), Some(0));
        assert_eq!(s.get_pixel(7, 5), Some(0));
    }
}
