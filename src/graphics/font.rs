//!
//! Bitmap text for screen messages.
//!
//! `TextRenderer` is what the overlay engine draws through. `MiniFont` is a
//! built-in 3x5 pixel font scaled by an integer factor; the large and small
//! fonts of the frame manager are two scales of it unless replaced.
//!

use crate::graphics::surface::Surface;

/// Horizontal anchor for aligned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Centre,
    Right,
}

/// Something that can put text on a surface.
pub trait TextRenderer: Send {
    /// Draw `text` with its anchor at (x, y). Lines are split on '\n' and
    /// each line is aligned on its own.
    fn draw_aligned(&self, target: &mut Surface, x: i32, y: i32, text: &str, align: TextAlign);

    /// Width in pixels of the widest line.
    fn calculate_width(&self, text: &str) -> i32;

    /// Height in pixels of all lines.
    fn calculate_height(&self, text: &str) -> i32;
}

/// Glyph cell width in font pixels.
const GLYPH_WIDTH: i32 = 3;
/// Glyph cell height in font pixels.
const GLYPH_HEIGHT: i32 = 5;
/// Horizontal gap between glyphs.
const GLYPH_SPACING: i32 = 1;
/// Vertical gap between lines.
const LINE_SPACING: i32 = 2;

/// 3x5 glyph rows, most significant of the three bits is the left column.
fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b110, 0b001, 0b010, 0b100, 0b111],
        '3' => [0b110, 0b001, 0b010, 0b001, 0b110],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b110, 0b001, 0b110],
        '6' => [0b011, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b110],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '<' => [0b001, 0b010, 0b100, 0b010, 0b001],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        _ => [0b111, 0b001, 0b010, 0b000, 0b010],
    }
}

/// Built-in scalable 3x5 font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiniFont {
    scale: i32,
    color: u32,
}

impl MiniFont {
    /// # Panics
    /// Panics if `scale` is zero.
    pub fn new(scale: u32, color: u32) -> Self {
        assert!(scale > 0, "font scale must be positive");
        Self {
            scale: scale as i32,
            color,
        }
    }

    /// Font used for screen messages.
    pub fn large(color: u32) -> Self {
        Self::new(2, color)
    }

    /// Font used for secondary info.
    pub fn small(color: u32) -> Self {
        Self::new(1, color)
    }

    pub fn color(&self) -> u32 {
        self.color
    }

    pub fn set_color(&mut self, color: u32) {
        self.color = color;
    }

    pub fn line_height(&self) -> i32 {
        (GLYPH_HEIGHT + LINE_SPACING) * self.scale
    }

    fn line_width(&self, line: &str) -> i32 {
        let count = line.chars().count() as i32;
        if count == 0 {
            return 0;
        }
        (count * (GLYPH_WIDTH + GLYPH_SPACING) - GLYPH_SPACING) * self.scale
    }

    fn draw_glyph(&self, target: &mut Surface, x: i32, y: i32, c: char) {
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let px = x + col * self.scale;
                let py = y + row as i32 * self.scale;
                target.fill_rect(px, py, px + self.scale - 1, py + self.scale - 1, self.color);
            }
        }
    }
}

impl TextRenderer for MiniFont {
    fn draw_aligned(&self, target: &mut Surface, x: i32, y: i32, text: &str, align: TextAlign) {
        for (i, line) in text.split('\n').enumerate() {
            let width = self.line_width(line);
            let mut cx = match align {
                TextAlign::Left => x,
                TextAlign::Centre => x - width / 2,
                TextAlign::Right => x - width,
            };
            let cy = y + i as i32 * self.line_height();
            for c in line.chars() {
                self.draw_glyph(target, cx, cy, c);
                cx += (GLYPH_WIDTH + GLYPH_SPACING) * self.scale;
            }
        }
    }

    fn calculate_width(&self, text: &str) -> i32 {
        text.split('\n').map(|l| self.line_width(l)).max().unwrap_or(0)
    }

    fn calculate_height(&self, text: &str) -> i32 {
        let lines = text.split('\n').count() as i32;
        lines * self.line_height() - LINE_SPACING * self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let font = MiniFont::small(1);
        assert_eq!(font.calculate_width(""), 0);
        assert_eq!(font.calculate_width("A"), 3);
        assert_eq!(font.calculate_width("AB"), 7);
        assert_eq!(font.calculate_height("AB"), 5);
        assert_eq!(font.calculate_height("A\nB"), 12);
        assert_eq!(font.calculate_width("A\nABC"), 11);

        let large = MiniFont::large(1);
        assert_eq!(large.calculate_width("AB"), 14);
        assert_eq!(large.calculate_height("AB"), 10);
    }

    #[test]
    fn test_draw_left_aligned_glyph() {
        let font = MiniFont::small(7);
        let mut s = Surface::new_indexed(8, 8).unwrap();
        font.draw_aligned(&mut s, 1, 1, "-", TextAlign::Left);
        assert_eq!(s.get_pixel(1, 3), Some(7));
        assert_eq!(s.get_pixel(3, 3), Some(7));
        assert_eq!(s.get_pixel(1, 2), Some(0));
    }

    #[test]
    fn test_draw_centred() {
        let font = MiniFont::small(4);
        let mut s = Surface::new_indexed(9, 5).unwrap();
        font.draw_aligned(&mut s, 4, 0, "I", TextAlign::Centre);
        // "I" is 3 wide, centred on x=4 it spans 3..=5
        assert_eq!(s.get_pixel(3, 0), Some(4));
        assert_eq!(s.get_pixel(5, 0), Some(4));
        assert_eq!(s.get_pixel(2, 0), Some(0));
        assert_eq!(s.get_pixel(4, 2), Some(4));
    }

    #[test]
    fn test_draw_clips_silently() {
        let font = MiniFont::large(9);
        let mut s = Surface::new_indexed(4, 4).unwrap();
        font.draw_aligned(&mut s, -10, -10, "HELLO\nWORLD", TextAlign::Right);
        font.draw_aligned(&mut s, 100, 100, "X", TextAlign::Left);
    }
}
