//! Surfaces owned by the frame manager
//!
//! Key concepts:
//! - back buffer (8-bit): every local viewport ends up here
//! - post-process buffer (32-bit): what gets presented
//! - player screen: composition surface for one split viewport, only
//!   present while split
//! - network pipeline: per-viewport, per-slot staging and final surfaces

use crate::graphics::network::{NetworkFramePipeline, PipelineError};
use crate::graphics::palette::Palette;
use crate::graphics::surface::{PixelFormat, Surface, SurfaceError};
use crate::graphics::viewport::{SplitLayout, MAX_SCREENS};
use crate::graphics::world_dump::WorldDumpRenderer;

/// Every surface the compositor draws into
#[derive(Debug)]
pub struct FrameBufferSet {
    pub(crate) back_buffer8: Surface,
    pub(crate) back_buffer32: Surface,
    pub(crate) player_screen: Option<Surface>,
    pub(crate) player_screen_size: (u32, u32),
    /// Window-sized copy of the 32-bit buffer when scaling
    pub(crate) present_buffer: Option<Surface>,
    pub(crate) screen_dump: Option<Surface>,
    pub(crate) world_dump: WorldDumpRenderer,
    pub(crate) network: NetworkFramePipeline,
}

impl FrameBufferSet {
    /// Allocate buffers for a `res_x` x `res_y` back buffer
    ///
    /// Network buffers start at full resolution for every viewport.
    pub fn new(res_x: u32, res_y: u32, black: u32) -> Result<Self, PipelineError> {
        let mut back_buffer8 = Surface::new_indexed(res_x, res_y)?;
        back_buffer8.clear(black);
        let back_buffer32 = Surface::new_rgb32(res_x, res_y)?;

        let mut network = NetworkFramePipeline::new();
        for viewport in 0..MAX_SCREENS {
            network.resize_viewport(viewport, res_x, res_y)?;
        }

        Ok(Self {
            back_buffer8,
            back_buffer32,
            player_screen: None,
            player_screen_size: (res_x, res_y),
            present_buffer: None,
            screen_dump: None,
            world_dump: WorldDumpRenderer::new(),
            network,
        })
    }

    pub fn back_buffer8(&self) -> &Surface {
        &self.back_buffer8
    }

    pub fn back_buffer8_mut(&mut self) -> &mut Surface {
        &mut self.back_buffer8
    }

    pub fn back_buffer32(&self) -> &Surface {
        &self.back_buffer32
    }

    pub fn back_buffer32_mut(&mut self) -> &mut Surface {
        &mut self.back_buffer32
    }

    pub fn player_screen(&self) -> Option<&Surface> {
        self.player_screen.as_ref()
    }

    pub fn player_screen_size(&self) -> (u32, u32) {
        self.player_screen_size
    }

    pub fn network(&self) -> &NetworkFramePipeline {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut NetworkFramePipeline {
        &mut self.network
    }

    pub fn world_dump(&self) -> &WorldDumpRenderer {
        &self.world_dump
    }

    /// Recreate the split composition surface for a layout
    pub fn reset_player_screen(&mut self, layout: SplitLayout, black: u32) -> Result<(), SurfaceError> {
        if layout.is_split() {
            let (w, h) = layout.viewport_size(self.back_buffer8.width(), self.back_buffer8.height());
            let mut screen = Surface::new_indexed(w, h)?;
            screen.clear(black);
            self.player_screen_size = (w, h);
            self.player_screen = Some(screen);
        } else {
            self.player_screen = None;
            self.player_screen_size = self.back_buffer8.dimensions();
        }
        Ok(())
    }

    pub fn set_player_screen_size(&mut self, width: u32, height: u32) {
        self.player_screen_size = (width, height);
    }
}

/// Expand an 8-bit surface into a same-sized 32-bit one through a palette
pub fn expand_indexed(src: &Surface, palette: &Palette, dst: &mut Surface) -> Result<(), SurfaceError> {
    if src.format() != PixelFormat::Indexed8 || dst.format() != PixelFormat::Rgb32 {
        return Err(SurfaceError::FormatMismatch {
            expected: PixelFormat::Indexed8,
            actual: src.format(),
        });
    }
    if src.dimensions() != dst.dimensions() {
        return Err(SurfaceError::SizeMismatch {
            src_width: src.width(),
            src_height: src.height(),
            dst_width: dst.width(),
            dst_height: dst.height(),
        });
    }
    for (px, &index) in dst.data_mut().chunks_exact_mut(4).zip(src.data()) {
        px.copy_from_slice(&palette.color(index).pack().to_le_bytes());
    }
    Ok(())
}
