//! 256-entry color palette for indexed surfaces
//!
//! Index 0 doubles as the transparent mask color for 8-bit surfaces, so
//! best-fit searches never return it.

/// Mask (transparent) color for indexed surfaces
pub const MASK_COLOR_8: u32 = 0;

/// Mask (transparent) color for 32-bit surfaces (magenta, 0x00RRGGBB)
pub const MASK_COLOR_32: u32 = 0x00FF_00FF;

/// 24-bit color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack into the 0x00RRGGBB layout used by 32-bit surfaces
    pub const fn pack(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub const fn unpack(color: u32) -> Self {
        Self {
            r: ((color >> 16) & 0xFF) as u8,
            g: ((color >> 8) & 0xFF) as u8,
            b: (color & 0xFF) as u8,
        }
    }
}

/// Indexed color table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [Rgb; 256],
}

impl Palette {
    pub fn new(colors: [Rgb; 256]) -> Self {
        Self { colors }
    }

    /// Build from an arbitrary list; missing entries are black, extras ignored
    pub fn from_slice(colors: &[Rgb]) -> Self {
        let mut table = [Rgb::default(); 256];
        for (slot, color) in table.iter_mut().zip(colors) {
            *slot = *color;
        }
        Self { colors: table }
    }

    /// Grayscale ramp with index 0 set to the magenta mask color
    pub fn grayscale() -> Self {
        let mut colors = [Rgb::default(); 256];
        for (i, c) in colors.iter_mut().enumerate() {
            *c = Rgb::new(i as u8, i as u8, i as u8);
        }
        colors[0] = Rgb::unpack(MASK_COLOR_32);
        Self { colors }
    }

    pub fn color(&self, index: u8) -> Rgb {
        self.colors[index as usize]
    }

    pub fn set_color(&mut self, index: u8, color: Rgb) {
        self.colors[index as usize] = color;
    }

    pub fn colors(&self) -> &[Rgb; 256] {
        &self.colors
    }

    /// Convert an index to a packed 32-bit color
    pub fn to_rgb32(&self, index: u8) -> u32 {
        if index as u32 == MASK_COLOR_8 {
            return MASK_COLOR_32;
        }
        self.colors[index as usize].pack()
    }

    /// Closest palette index to the given color, never the mask index
    pub fn bestfit(&self, r: u8, g: u8, b: u8) -> u8 {
        let mut best = 1usize;
        let mut best_dist = u32::MAX;

        for (i, c) in self.colors.iter().enumerate().skip(1) {
            let dr = c.r as i32 - r as i32;
            let dg = c.g as i32 - g as i32;
            let db = c.b as i32 - b as i32;
            let dist = (dr * dr + dg * dg + db * db) as u32;
            if dist < best_dist {
                best_dist = dist;
                best = i;
                if dist == 0 {
                    break;
                }
            }
        }
        best as u8
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::grayscale()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        let c = Rgb::new(0x12, 0x34, 0x56);
        assert_eq!(c.pack(), 0x0012_3456);
        assert_eq!(Rgb::unpack(0x0012_3456), c);
    }

    #[test]
    fn test_bestfit_skips_mask_index() {
        let mut palette = Palette::grayscale();
        palette.set_color(0, Rgb::new(0, 0, 0));
        // Index 0 is an exact match for black but must never be chosen.
        assert_eq!(palette.bestfit(0, 0, 0), 1);
    }

    #[test]
    fn test_bestfit_almost_black() {
        let palette = Palette::grayscale();
        assert_eq!(palette.bestfit(5, 5, 5), 5);
        assert_eq!(palette.bestfit(200, 200, 200), 200);
    }

    #[test]
    fn test_to_rgb32_mask() {
        let palette = Palette::grayscale();
        assert_eq!(palette.to_rgb32(0), MASK_COLOR_32);
        assert_eq!(palette.to_rgb32(10), 0x000A_0A0A);
    }

    #[test]
    fn test_from_slice_pads_with_black() {
        let palette = Palette::from_slice(&[Rgb::new(1, 2, 3)]);
        assert_eq!(palette.color(0), Rgb::new(1, 2, 3));
        assert_eq!(palette.color(255), Rgb::default());
    }
}
