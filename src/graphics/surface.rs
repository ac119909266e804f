//! Owned pixel surfaces and their blit primitives
//!
//! A `Surface` is the unit of ownership for every buffer the compositor
//! touches: the 8-bit back buffer, the 32-bit post-process buffer, the
//! split-screen composition buffer and the network frame buffers. Memory is
//! released when the surface is dropped.
//!
//! Key concepts:
//! - PixelFormat: indexed 8-bit or direct 32-bit (0x00RRGGBB)
//! - Clipping: every primitive clips silently against the surface bounds
//! - Masking: masked operations skip the format's mask color

use crate::graphics::palette::{Palette, Rgb, MASK_COLOR_32, MASK_COLOR_8};

/// Pixel layout of a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit palette index
    Indexed8,
    /// 32-bit direct color, 0x00RRGGBB
    Rgb32,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Indexed8 => 1,
            PixelFormat::Rgb32 => 4,
        }
    }

    pub fn bits_per_pixel(&self) -> u32 {
        self.bytes_per_pixel() as u32 * 8
    }

    /// Transparent color for masked operations
    pub fn mask_color(&self) -> u32 {
        match self {
            PixelFormat::Indexed8 => MASK_COLOR_8,
            PixelFormat::Rgb32 => MASK_COLOR_32,
        }
    }
}

/// Errors related to surface operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("Invalid surface dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Format mismatch: expected {expected:?}, got {actual:?}")]
    FormatMismatch {
        expected: PixelFormat,
        actual: PixelFormat,
    },

    #[error("Size mismatch: {src_width}x{src_height} into {dst_width}x{dst_height}")]
    SizeMismatch {
        src_width: u32,
        src_height: u32,
        dst_width: u32,
        dst_height: u32,
    },
}

/// Source/destination rectangle pair after clipping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlitRect {
    sx: i32,
    sy: i32,
    dx: i32,
    dy: i32,
    w: i32,
    h: i32,
}

impl BlitRect {
    /// Clip a copy of `w`x`h` pixels against both surfaces.
    fn clip(
        src: (u32, u32),
        dst: (u32, u32),
        mut sx: i32,
        mut sy: i32,
        mut dx: i32,
        mut dy: i32,
        mut w: i32,
        mut h: i32,
    ) -> Option<Self> {
        if sx < 0 {
            w += sx;
            dx -= sx;
            sx = 0;
        }
        if sy < 0 {
            h += sy;
            dy -= sy;
            sy = 0;
        }
        if dx < 0 {
            w += dx;
            sx -= dx;
            dx = 0;
        }
        if dy < 0 {
            h += dy;
            sy -= dy;
            dy = 0;
        }
        w = w.min(src.0 as i32 - sx).min(dst.0 as i32 - dx);
        h = h.min(src.1 as i32 - sy).min(dst.1 as i32 - dy);

        if w <= 0 || h <= 0 {
            return None;
        }
        Some(Self { sx, sy, dx, dy, w, h })
    }
}

/// Owned 2D pixel buffer
#[derive(Clone, PartialEq, Eq)]
pub struct Surface {
    format: PixelFormat,
    width: u32,
    height: u32,
    /// Row-major pixel data, little-endian for 32-bit
    data: Vec<u8>,
}

impl Surface {
    /// Create a zero-filled surface
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::InvalidDimensions { width, height });
        }
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Ok(Self {
            format,
            width,
            height,
            data: vec![0; len],
        })
    }

    pub fn new_indexed(width: u32, height: u32) -> Result<Self, SurfaceError> {
        Self::new(width, height, PixelFormat::Indexed8)
    }

    pub fn new_rgb32(width: u32, height: u32) -> Result<Self, SurfaceError> {
        Self::new(width, height, PixelFormat::Rgb32)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    fn offset(&self, x: i32, y: i32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.format.bytes_per_pixel()
    }

    fn read(&self, offset: usize) -> u32 {
        match self.format {
            PixelFormat::Indexed8 => self.data[offset] as u32,
            PixelFormat::Rgb32 => u32::from_le_bytes([
                self.data[offset],
                self.data[offset + 1],
                self.data[offset + 2],
                self.data[offset + 3],
            ]),
        }
    }

    fn write(&mut self, offset: usize, color: u32) {
        match self.format {
            PixelFormat::Indexed8 => self.data[offset] = color as u8,
            PixelFormat::Rgb32 => {
                self.data[offset..offset + 4].copy_from_slice(&color.to_le_bytes())
            }
        }
    }

    /// Read a pixel, `None` when outside the surface
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<u32> {
        if !self.contains(x, y) {
            return None;
        }
        Some(self.read(self.offset(x, y)))
    }

    /// Write a pixel; writes outside the surface are dropped
    pub fn put_pixel(&mut self, x: i32, y: i32, color: u32) {
        if self.contains(x, y) {
            let offset = self.offset(x, y);
            self.write(offset, color);
        }
    }

    /// Fill the whole surface
    pub fn clear(&mut self, color: u32) {
        match self.format {
            PixelFormat::Indexed8 => self.data.fill(color as u8),
            PixelFormat::Rgb32 => {
                let bytes = color.to_le_bytes();
                for px in self.data.chunks_exact_mut(4) {
                    px.copy_from_slice(&bytes);
                }
            }
        }
    }

    /// Fill a rectangle given two inclusive corners
    pub fn fill_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: u32) {
        let x_start = x1.min(x2).max(0);
        let x_end = x1.max(x2).min(self.width as i32 - 1);
        let y_start = y1.min(y2).max(0);
        let y_end = y1.max(y2).min(self.height as i32 - 1);

        if x_start > x_end || y_start > y_end {
            return;
        }
        for y in y_start..=y_end {
            for x in x_start..=x_end {
                let offset = self.offset(x, y);
                self.write(offset, color);
            }
        }
    }

    /// Horizontal line between two inclusive x coordinates
    pub fn hline(&mut self, x1: i32, y: i32, x2: i32, color: u32) {
        self.fill_rect(x1, y, x2, y, color);
    }

    /// Vertical line between two inclusive y coordinates
    pub fn vline(&mut self, x: i32, y1: i32, y2: i32, color: u32) {
        self.fill_rect(x, y1, x, y2, color);
    }

    fn check_format(&self, src: &Surface) -> Result<(), SurfaceError> {
        if self.format != src.format {
            return Err(SurfaceError::FormatMismatch {
                expected: self.format,
                actual: src.format,
            });
        }
        Ok(())
    }

    /// Opaque copy of a `w`x`h` region of `src` onto this surface
    pub fn blit(
        &mut self,
        src: &Surface,
        sx: i32,
        sy: i32,
        dx: i32,
        dy: i32,
        w: i32,
        h: i32,
    ) -> Result<(), SurfaceError> {
        self.check_format(src)?;
        let Some(r) = BlitRect::clip(src.dimensions(), self.dimensions(), sx, sy, dx, dy, w, h)
        else {
            return Ok(());
        };

        let bpp = self.format.bytes_per_pixel();
        let row_bytes = r.w as usize * bpp;
        for row in 0..r.h {
            let s = src.offset(r.sx, r.sy + row);
            let d = self.offset(r.dx, r.dy + row);
            self.data[d..d + row_bytes].copy_from_slice(&src.data[s..s + row_bytes]);
        }
        Ok(())
    }

    /// Like `blit`, but pixels equal to the mask color are left untouched
    pub fn masked_blit(
        &mut self,
        src: &Surface,
        sx: i32,
        sy: i32,
        dx: i32,
        dy: i32,
        w: i32,
        h: i32,
    ) -> Result<(), SurfaceError> {
        self.check_format(src)?;
        let Some(r) = BlitRect::clip(src.dimensions(), self.dimensions(), sx, sy, dx, dy, w, h)
        else {
            return Ok(());
        };

        let mask = src.format.mask_color();
        for row in 0..r.h {
            for col in 0..r.w {
                let color = src.read(src.offset(r.sx + col, r.sy + row));
                if color != mask {
                    let d = self.offset(r.dx + col, r.dy + row);
                    self.write(d, color);
                }
            }
        }
        Ok(())
    }

    /// Masked copy of the whole of `src` with its top-left at (x, y)
    pub fn draw_sprite(&mut self, src: &Surface, x: i32, y: i32) -> Result<(), SurfaceError> {
        self.masked_blit(src, 0, 0, x, y, src.width as i32, src.height as i32)
    }

    /// Masked copy of an indexed sprite onto a 32-bit surface through `palette`
    pub fn draw_indexed_sprite(
        &mut self,
        src: &Surface,
        palette: &Palette,
        x: i32,
        y: i32,
    ) -> Result<(), SurfaceError> {
        if src.format != PixelFormat::Indexed8 || self.format != PixelFormat::Rgb32 {
            return Err(SurfaceError::FormatMismatch {
                expected: PixelFormat::Indexed8,
                actual: src.format,
            });
        }
        let Some(r) = BlitRect::clip(
            src.dimensions(),
            self.dimensions(),
            0,
            0,
            x,
            y,
            src.width as i32,
            src.height as i32,
        ) else {
            return Ok(());
        };

        for row in 0..r.h {
            for col in 0..r.w {
                let index = src.read(src.offset(r.sx + col, r.sy + row));
                if index != MASK_COLOR_8 {
                    let d = self.offset(r.dx + col, r.dy + row);
                    self.write(d, palette.to_rgb32(index as u8));
                }
            }
        }
        Ok(())
    }

    /// Nearest-neighbour scaled copy of a source rectangle into a destination rectangle
    pub fn stretch_blit(
        &mut self,
        src: &Surface,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        dx: i32,
        dy: i32,
        dw: i32,
        dh: i32,
    ) -> Result<(), SurfaceError> {
        self.check_format(src)?;
        if sw <= 0 || sh <= 0 || dw <= 0 || dh <= 0 {
            return Ok(());
        }

        for row in 0..dh {
            let ty = dy + row;
            let fy = sy + (row as i64 * sh as i64 / dh as i64) as i32;
            for col in 0..dw {
                let tx = dx + col;
                let fx = sx + (col as i64 * sw as i64 / dw as i64) as i32;
                if let Some(color) = src.get_pixel(fx, fy) {
                    self.put_pixel(tx, ty, color);
                }
            }
        }
        Ok(())
    }

    /// Copy every pixel of an identically sized surface
    pub fn copy_from(&mut self, src: &Surface) -> Result<(), SurfaceError> {
        self.check_format(src)?;
        if self.dimensions() != src.dimensions() {
            return Err(SurfaceError::SizeMismatch {
                src_width: src.width,
                src_height: src.height,
                dst_width: self.width,
                dst_height: self.height,
            });
        }
        self.data.copy_from_slice(&src.data);
        Ok(())
    }

    /// Screen-blend a 32-bit sprite onto this 32-bit surface
    ///
    /// `strength` scales the blend between the untouched destination (0) and
    /// the full screen blend (255). Mask pixels are skipped.
    pub fn draw_trans_sprite(
        &mut self,
        src: &Surface,
        x: i32,
        y: i32,
        strength: u8,
    ) -> Result<(), SurfaceError> {
        self.check_format(src)?;
        if self.format != PixelFormat::Rgb32 {
            return Err(SurfaceError::FormatMismatch {
                expected: PixelFormat::Rgb32,
                actual: self.format,
            });
        }
        let Some(r) = BlitRect::clip(
            src.dimensions(),
            self.dimensions(),
            0,
            0,
            x,
            y,
            src.width as i32,
            src.height as i32,
        ) else {
            return Ok(());
        };

        for row in 0..r.h {
            for col in 0..r.w {
                let color = src.read(src.offset(r.sx + col, r.sy + row));
                if color == MASK_COLOR_32 {
                    continue;
                }
                let d = self.offset(r.dx + col, r.dy + row);
                let blended = screen_blend(Rgb::unpack(color), Rgb::unpack(self.read(d)), strength);
                self.write(d, blended.pack());
            }
        }
        Ok(())
    }

    /// Draw `src` rotated by `angle` radians (clockwise on screen) about its
    /// centre, with that centre placed at the centre of this surface.
    pub fn rotate_sprite_from(&mut self, src: &Surface, angle: f32) -> Result<(), SurfaceError> {
        self.check_format(src)?;
        let (sin, cos) = angle.sin_cos();
        let src_cx = src.width as f32 / 2.0;
        let src_cy = src.height as f32 / 2.0;
        let dst_cx = self.width as f32 / 2.0;
        let dst_cy = self.height as f32 / 2.0;
        let mask = src.format.mask_color();

        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let rx = x as f32 + 0.5 - dst_cx;
                let ry = y as f32 + 0.5 - dst_cy;
                // Inverse rotation maps the destination pixel back into the sprite.
                let fx = (rx * cos + ry * sin + src_cx).floor() as i32;
                let fy = (-rx * sin + ry * cos + src_cy).floor() as i32;
                if let Some(color) = src.get_pixel(fx, fy) {
                    if color != mask {
                        let d = self.offset(x, y);
                        self.write(d, color);
                    }
                }
            }
        }
        Ok(())
    }

    /// Expand an indexed surface into a new 32-bit surface
    pub fn to_rgb32(&self, palette: &Palette) -> Surface {
        match self.format {
            PixelFormat::Rgb32 => self.clone(),
            PixelFormat::Indexed8 => {
                let mut data = Vec::with_capacity(self.data.len() * 4);
                for &index in &self.data {
                    data.extend_from_slice(&palette.to_rgb32(index).to_le_bytes());
                }
                Surface {
                    format: PixelFormat::Rgb32,
                    width: self.width,
                    height: self.height,
                    data,
                }
            }
        }
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

fn screen_blend(src: Rgb, dst: Rgb, strength: u8) -> Rgb {
    let channel = |a: u8, b: u8| -> u8 {
        let screen = 255 - ((255 - a as u32) * (255 - b as u32)) / 255;
        let b = b as i32;
        (b + (screen as i32 - b) * strength as i32 / 255) as u8
    };
    Rgb::new(
        channel(src.r, dst.r),
        channel(src.g, dst.g),
        channel(src.b, dst.b),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_invalid_dimensions() {
        assert_eq!(
            Surface::new_indexed(0, 10).unwrap_err(),
            SurfaceError::InvalidDimensions {
                width: 0,
                height: 10
            }
        );
        assert!(Surface::new_rgb32(10, 0).is_err());
    }

    #[test]
    fn test_put_get_pixel_clipped() {
        let mut s = Surface::new_indexed(4, 4).unwrap();
        s.put_pixel(1, 2, 7);
        s.put_pixel(-1, 0, 9);
        s.put_pixel(4, 0, 9);
        assert_eq!(s.get_pixel(1, 2), Some(7));
        assert_eq!(s.get_pixel(4, 0), None);
        assert_eq!(s.data().iter().filter(|&&b| b == 9).count(), 0);
    }

    #[test]
    fn test_rgb32_roundtrip_and_clear() {
        let mut s = Surface::new_rgb32(3, 2).unwrap();
        s.clear(0x0011_2233);
        assert_eq!(s.get_pixel(2, 1), Some(0x0011_2233));
        s.put_pixel(0, 0, 0x00AB_CDEF);
        assert_eq!(s.get_pixel(0, 0), Some(0x00AB_CDEF));
    }

    #[test]
    fn test_fill_rect_swapped_and_clipped() {
        let mut s = Surface::new_indexed(5, 5).unwrap();
        s.fill_rect(3, 3, -2, 1, 4);
        for y in 0..5 {
            for x in 0..5 {
                let expected = if x <= 3 && (1..=3).contains(&y) { 4 } else { 0 };
                assert_eq!(s.get_pixel(x, y), Some(expected), "({x},{y})");
            }
        }
    }

    #[test]
    fn test_fill_rect_entirely_outside() {
        let mut s = Surface::new_indexed(5, 5).unwrap();
        s.fill_rect(10, 10, 20, 20, 3);
        assert!(s.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_blit_to_offset_clips_destination() {
        let mut src = Surface::new_indexed(4, 4).unwrap();
        src.clear(6);
        let mut dst = Surface::new_indexed(6, 6).unwrap();
        dst.blit(&src, 0, 0, 4, 4, 4, 4).unwrap();
        assert_eq!(dst.get_pixel(3, 3), Some(0));
        assert_eq!(dst.get_pixel(4, 4), Some(6));
        assert_eq!(dst.get_pixel(5, 5), Some(6));
    }

    #[test]
    fn test_blit_negative_destination_shifts_source() {
        let mut src = Surface::new_indexed(3, 1).unwrap();
        src.put_pixel(0, 0, 1);
        src.put_pixel(1, 0, 2);
        src.put_pixel(2, 0, 3);
        let mut dst = Surface::new_indexed(3, 1).unwrap();
        dst.blit(&src, 0, 0, -1, 0, 3, 1).unwrap();
        assert_eq!(dst.get_pixel(0, 0), Some(2));
        assert_eq!(dst.get_pixel(1, 0), Some(3));
        assert_eq!(dst.get_pixel(2, 0), Some(0));
    }

    #[test]
    fn test_blit_format_mismatch() {
        let src = Surface::new_rgb32(2, 2).unwrap();
        let mut dst = Surface::new_indexed(2, 2).unwrap();
        assert!(matches!(
            dst.blit(&src, 0, 0, 0, 0, 2, 2),
            Err(SurfaceError::FormatMismatch { .. })
        ));
    }

    #[test]
    fn test_masked_blit_skips_mask() {
        let mut src = Surface::new_indexed(2, 1).unwrap();
        src.put_pixel(1, 0, 5);
        let mut dst = Surface::new_indexed(2, 1).unwrap();
        dst.clear(9);
        dst.masked_blit(&src, 0, 0, 0, 0, 2, 1).unwrap();
        assert_eq!(dst.get_pixel(0, 0), Some(9));
        assert_eq!(dst.get_pixel(1, 0), Some(5));
    }

    #[test]
    fn test_stretch_blit_doubles() {
        let mut src = Surface::new_indexed(2, 1).unwrap();
        src.put_pixel(0, 0, 1);
        src.put_pixel(1, 0, 2);
        let mut dst = Surface::new_indexed(4, 2).unwrap();
        dst.stretch_blit(&src, 0, 0, 2, 1, 0, 0, 4, 2).unwrap();
        assert_eq!(dst.get_pixel(0, 1), Some(1));
        assert_eq!(dst.get_pixel(1, 0), Some(1));
        assert_eq!(dst.get_pixel(2, 0), Some(2));
        assert_eq!(dst.get_pixel(3, 1), Some(2));
    }

    #[test]
    fn test_copy_from_size_mismatch() {
        let src = Surface::new_indexed(2, 2).unwrap();
        let mut dst = Surface::new_indexed(3, 2).unwrap();
        assert!(matches!(
            dst.copy_from(&src),
            Err(SurfaceError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_draw_indexed_sprite_converts() {
        let palette = Palette::grayscale();
        let mut src = Surface::new_indexed(2, 1).unwrap();
        src.put_pixel(0, 0, 40);
        let mut dst = Surface::new_rgb32(2, 1).unwrap();
        dst.clear(0x0000_00FF);
        dst.draw_indexed_sprite(&src, &palette, 0, 0).unwrap();
        assert_eq!(dst.get_pixel(0, 0), Some(0x0028_2828));
        assert_eq!(dst.get_pixel(1, 0), Some(0x0000_00FF));
    }

    #[test]
    fn test_trans_sprite_strength() {
        let mut src = Surface::new_rgb32(1, 1).unwrap();
        src.clear(0x00FF_FFFF);
        let mut dst = Surface::new_rgb32(1, 1).unwrap();
        dst.draw_trans_sprite(&src, 0, 0, 0).unwrap();
        assert_eq!(dst.get_pixel(0, 0), Some(0));
        dst.draw_trans_sprite(&src, 0, 0, 255).unwrap();
        assert_eq!(dst.get_pixel(0, 0), Some(0x00FF_FFFF));
    }

    #[test]
    fn test_rotate_sprite_zero_angle_is_identity() {
        let mut src = Surface::new_indexed(4, 4).unwrap();
        src.put_pixel(1, 2, 3);
        let mut dst = Surface::new_indexed(4, 4).unwrap();
        dst.rotate_sprite_from(&src, 0.0).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn test_rotate_sprite_half_turn() {
        let mut src = Surface::new_indexed(4, 4).unwrap();
        src.put_pixel(0, 0, 3);
        let mut dst = Surface::new_indexed(4, 4).unwrap();
        dst.rotate_sprite_from(&src, std::f32::consts::PI).unwrap();
        assert_eq!(dst.get_pixel(3, 3), Some(3));
    }

    #[test]
    fn test_to_rgb32() {
        let mut s = Surface::new_indexed(1, 1).unwrap();
        s.put_pixel(0, 0, 16);
        let wide = s.to_rgb32(&Palette::grayscale());
        assert_eq!(wide.format(), PixelFormat::Rgb32);
        assert_eq!(wide.get_pixel(0, 0), Some(0x0010_1010));
    }
}
