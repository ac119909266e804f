//! Whole-scene rendering for diagnostic export

use std::borrow::Cow;

use crate::graphics::geometry::Vector;
use crate::graphics::palette::{Palette, Rgb, MASK_COLOR_32};
use crate::graphics::scene::{PostProcess, Scene};
use crate::graphics::surface::{PixelFormat, Surface, SurfaceError};

/// Sky color at the top and bottom of the gradient
const SKY_TOP: Rgb = Rgb::new(64, 64, 96);
const SKY_BOTTOM: Rgb = Rgb::new(128, 192, 255);

/// Gradient color for row `row` of `height`
pub fn sky_color(row: u32, height: u32) -> Rgb {
    let t = row as f32 / height.max(1) as f32;
    let lerp = |a: u8, b: u8| (a as f32 + t * (b as f32 - a as f32)) as u8;
    Rgb::new(
        lerp(SKY_TOP.r, SKY_BOTTOM.r),
        lerp(SKY_TOP.g, SKY_BOTTOM.g),
        lerp(SKY_TOP.b, SKY_BOTTOM.b),
    )
}

/// Renders the entire scene into a reusable 32-bit buffer
#[derive(Debug, Default)]
pub struct WorldDumpRenderer {
    buffer: Option<Surface>,
}

impl WorldDumpRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last rendered dump, if any
    pub fn buffer(&self) -> Option<&Surface> {
        self.buffer.as_ref()
    }

    fn buffer_for(&mut self, width: u32, height: u32) -> Result<&mut Surface, SurfaceError> {
        if self
            .buffer
            .as_ref()
            .is_some_and(|b| b.dimensions() != (width, height))
        {
            self.buffer = None;
        }
        let buffer = match self.buffer.take() {
            Some(buffer) => buffer,
            None => Surface::new_rgb32(width, height)?,
        };
        Ok(self.buffer.insert(buffer))
    }

    /// Sky gradient, terrain and object layers, then every post effect in the
    /// scene blended at its own strength
    pub fn render(
        &mut self,
        scene: &dyn Scene,
        post: &mut dyn PostProcess,
        palette: &Palette,
    ) -> Result<&Surface, SurfaceError> {
        let width = scene.width().max(1) as u32;
        let height = scene.height().max(1) as u32;
        let buffer = self.buffer_for(width, height)?;

        for row in 0..height {
            buffer.hline(0, row as i32, width as i32 - 1, sky_color(row, height).pack());
        }

        for layer in scene.dump_layers() {
            match layer.format() {
                PixelFormat::Indexed8 => buffer.draw_indexed_sprite(layer, palette, 0, 0)?,
                PixelFormat::Rgb32 => buffer.draw_sprite(layer, 0, 0)?,
            }
        }

        let effects = post.post_screen_effects_wrapped(Vector::zero(), width as i32, height as i32, None);
        for effect in effects {
            let bitmap: Cow<'_, Surface> = match effect.bitmap.format() {
                PixelFormat::Rgb32 => Cow::Borrowed(effect.bitmap.as_ref()),
                PixelFormat::Indexed8 => Cow::Owned(effect.bitmap.to_rgb32(palette)),
            };
            let pos = effect.pos.floor();

            if effect.angle == 0.0 {
                let x = pos.x - (bitmap.width() / 2) as i32;
                let y = pos.y - (bitmap.height() / 2) as i32;
                buffer.draw_trans_sprite(&bitmap, x, y, effect.strength)?;
            } else {
                let temp = post.temp_effect_surface(&bitmap);
                temp.clear(MASK_COLOR_32);
                temp.rotate_sprite_from(&bitmap, effect.angle)?;
                let x = pos.x - (temp.width() / 2) as i32;
                let y = pos.y - (temp.height() / 2) as i32;
                buffer.draw_trans_sprite(temp, x, y, effect.strength)?;
            }
        }

        log::debug!("World dump rendered at {}x{}", width, height);
        Ok(buffer)
    }
}
