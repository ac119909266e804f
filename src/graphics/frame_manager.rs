//! Frame compositor context
//!
//! `FrameManager` owns every surface the compositor draws into, the active
//! resolution and split layout, and the per-screen overlays. One call to
//! [`FrameManager::draw`] renders every player screen, either composing them
//! into the local back buffer or publishing them to network consumers.
//!
//! Key concepts:
//! - Local path: screens are drawn into the player screen surface (or the
//!   back buffer directly when not split), then blitted at their quadrant
//! - Networked path: screens are drawn into the network staging surfaces
//!   with the scene and GUI kept apart, then published in one step
//! - Mode switches: only between frames, with rollback to the last good
//!   multiplier

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam::channel::Receiver;

use crate::config::{FrameSettings, NetworkPreview};
use crate::graphics::buffers::{expand_indexed, FrameBufferSet};
use crate::graphics::driver::{DisplayDriver, DisplayMode, DriverError};
use crate::graphics::export::{next_dump_path, BitmapWriter, ExportError, SaveBitmapMode};
use crate::graphics::font::{MiniFont, TextRenderer};
use crate::graphics::geometry::{GlowBox, Point, Vector};
use crate::graphics::network::{NetworkFrameExchange, PipelineError};
use crate::graphics::overlay::{TextOverlay, TextPlacement};
use crate::graphics::palette::{Palette, MASK_COLOR_8};
use crate::graphics::resolution::{is_valid_resolution, validate_resolution, Resolution, MAX_MULTIPLIER};
use crate::graphics::scene::{DrawContext, PostEffect, ViewTargets};
use crate::graphics::surface::{Surface, SurfaceError};
use crate::graphics::viewport::{resolve_split_request, SplitLayout, MAX_SCREENS};
use crate::time::SharedClock;

/// Errors from the frame compositor
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Unable to set any graphics mode: {0}")]
    NoGraphicsMode(#[source] DriverError),

    #[error("Resolution multiplier {0} is not usable")]
    InvalidMultiplier(u8),

    #[error("Resolution multiplier {multiplier} would make the window exceed the display")]
    ExceedsDisplay { multiplier: u8 },

    #[error("Failed to switch resolution multiplier, reverted to previous setting: {0}")]
    ModeSwitchReverted(#[source] DriverError),

    #[error("Unable to restore previous resolution multiplier: {0}")]
    ModeSwitchFailed(#[source] DriverError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// The compositor context
pub struct FrameManager {
    settings: FrameSettings,
    settings_path: Option<PathBuf>,
    resolution: Resolution,
    layout: SplitLayout,
    buffers: FrameBufferSet,
    palette: Palette,
    overlay: TextOverlay,
    large_font: Box<dyn TextRenderer>,
    small_font: Box<dyn TextRenderer>,
    black_color: u32,
    almost_black_color: u32,
    networked: bool,
    draw_network_back_buffer: bool,
}

impl std::fmt::Debug for FrameManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameManager")
            .field("resolution", &self.resolution)
            .field("layout", &self.layout)
            .field("networked", &self.networked)
            .field("draw_network_back_buffer", &self.draw_network_back_buffer)
            .finish_non_exhaustive()
    }
}

impl FrameManager {
    /// Set up the display and allocate every buffer
    ///
    /// The requested resolution is corrected if needed, with a notice to the
    /// user. If the mode still cannot be set, the default 960x540 mode is
    /// tried before giving up in text mode.
    pub fn create(
        driver: &mut dyn DisplayDriver,
        settings: FrameSettings,
        clock: SharedClock,
    ) -> Result<Self, FrameError> {
        let (mut resolution, correction) = validate_resolution(settings.resolution(), driver.display_bounds());
        if let Some(correction) = correction {
            log::warn!("{} Using {}", correction.message(), resolution);
            driver.show_message(correction.message());
        }

        if let Err(e) = driver.set_mode(mode_of(resolution)) {
            let fallback = Resolution::default_mode();
            driver.show_message(&format!(
                "Unable to set specified graphics mode because: {}!\n\nNow trying to default back to {}x{}...",
                e, fallback.width, fallback.height
            ));
            if let Err(e) = driver.set_mode(mode_of(fallback)) {
                driver.set_text_mode();
                driver.show_message(&format!("Unable to set any graphics mode because {}!", e));
                return Err(FrameError::NoGraphicsMode(e));
            }
            resolution = fallback;
        }
        log::info!("Display mode set to {}", resolution);

        let palette = match driver.load_palette(Path::new(&settings.palette_file)) {
            Ok(palette) => palette,
            Err(e) => {
                log::warn!("{}, keeping the current palette", e);
                driver.palette().clone()
            }
        };

        let black_color = palette.bestfit(0, 0, 0) as u32;
        let almost_black_color = palette.bestfit(5, 5, 5) as u32;
        let white = palette.bestfit(255, 255, 255) as u32;
        let buffers = FrameBufferSet::new(resolution.width, resolution.height, black_color)?;

        let mut settings = settings;
        settings.resolution_x = resolution.width;
        settings.resolution_y = resolution.height;
        settings.resolution_multiplier = resolution.multiplier;

        Ok(Self {
            settings,
            settings_path: None,
            resolution,
            layout: SplitLayout::default(),
            buffers,
            palette,
            overlay: TextOverlay::new(clock),
            large_font: Box::new(MiniFont::large(white)),
            small_font: Box::new(MiniFont::small(white)),
            black_color,
            almost_black_color,
            networked: false,
            draw_network_back_buffer: false,
        })
    }

    /// Persist settings to this file whenever they change
    pub fn set_settings_path(&mut self, path: impl Into<PathBuf>) {
        self.settings_path = Some(path.into());
    }

    pub fn settings(&self) -> &FrameSettings {
        &self.settings
    }

    /// Settings as they will apply on the next `create`. Resolution changes
    /// made here do not affect the running display.
    pub fn settings_mut(&mut self) -> &mut FrameSettings {
        &mut self.settings
    }

    fn save_settings(&self) {
        if let Some(path) = &self.settings_path {
            if let Err(e) = self.settings.save(path) {
                log::error!("{:#}", e);
            }
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn res_x(&self) -> u32 {
        self.resolution.width
    }

    pub fn res_y(&self) -> u32 {
        self.resolution.height
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn black_color(&self) -> u32 {
        self.black_color
    }

    pub fn almost_black_color(&self) -> u32 {
        self.almost_black_color
    }

    pub fn buffers(&self) -> &FrameBufferSet {
        &self.buffers
    }

    pub fn back_buffer8(&self) -> &Surface {
        self.buffers.back_buffer8()
    }

    pub fn back_buffer8_mut(&mut self) -> &mut Surface {
        self.buffers.back_buffer8_mut()
    }

    pub fn back_buffer32(&self) -> &Surface {
        self.buffers.back_buffer32()
    }

    pub fn clear_back_buffer8(&mut self) {
        let black = self.black_color;
        self.buffers.back_buffer8_mut().clear(black);
    }

    pub fn clear_back_buffer32(&mut self) {
        self.buffers.back_buffer32_mut().clear(0);
    }

    /// Whether a resolution may be offered at the current multiplier
    pub fn is_valid_resolution(&self, width: u32, height: u32, driver: &dyn DisplayDriver) -> bool {
        is_valid_resolution(width, height, self.resolution.multiplier, driver.display_bounds())
    }

    pub fn split_layout(&self) -> SplitLayout {
        self.layout
    }

    pub fn screen_count(&self) -> usize {
        self.layout.screen_count()
    }

    /// Change the split layout
    ///
    /// Single-axis requests yield to the configured overrides. Active flashes
    /// are dropped since they were sized for the old screens.
    pub fn reset_split_screens(&mut self, h_split: bool, v_split: bool) -> Result<(), FrameError> {
        self.layout = resolve_split_request(
            SplitLayout::new(h_split, v_split),
            self.settings.h_split_override,
            self.settings.v_split_override,
        );
        self.buffers.reset_player_screen(self.layout, self.black_color)?;
        self.overlay.reset_flashes();
        log::debug!(
            "Split screens reset to {} screen(s) of {:?}",
            self.layout.screen_count(),
            self.buffers.player_screen_size()
        );
        Ok(())
    }

    pub fn player_screen_width(&self) -> u32 {
        self.buffers.player_screen_size().0
    }

    pub fn player_screen_height(&self) -> u32 {
        self.buffers.player_screen_size().1
    }

    /// Width of the frame a player sees
    ///
    /// In multiplayer mode this is the named viewport's network frame width,
    /// or with no viewport named the smallest width over all network frames.
    pub fn player_frame_buffer_width(&self, which: Option<usize>) -> u32 {
        self.player_frame_buffer_size(which).0
    }

    pub fn player_frame_buffer_height(&self, which: Option<usize>) -> u32 {
        self.player_frame_buffer_size(which).1
    }

    fn player_frame_buffer_size(&self, which: Option<usize>) -> (u32, u32) {
        if !self.networked {
            return self.buffers.player_screen_size();
        }
        let exchange = self.buffers.network().exchange();
        match which.filter(|&i| i < MAX_SCREENS) {
            Some(i) => exchange
                .frame_size(i)
                .unwrap_or_else(|| self.buffers.player_screen_size()),
            None => exchange.min_frame_size((self.resolution.width, self.resolution.height)),
        }
    }

    /// Resize one player's network buffers
    pub fn create_new_network_player_back_buffer(
        &mut self,
        player: usize,
        width: u32,
        height: u32,
    ) -> Result<(), FrameError> {
        self.buffers.network_mut().resize_viewport(player, width, height)?;
        self.buffers.set_player_screen_size(width, height);
        Ok(())
    }

    pub fn is_in_multiplayer_mode(&self) -> bool {
        self.networked
    }

    pub fn set_multiplayer_mode(&mut self, networked: bool) {
        if networked != self.networked {
            log::info!("Multiplayer mode {}", if networked { "on" } else { "off" });
        }
        self.networked = networked;
    }

    pub fn draw_network_back_buffer(&self) -> bool {
        self.draw_network_back_buffer
    }

    /// Show the published viewport 0 frame instead of local rendering
    pub fn set_draw_network_back_buffer(&mut self, enabled: bool) {
        self.draw_network_back_buffer = enabled;
    }

    pub fn network_preview(&self) -> NetworkPreview {
        self.settings.network_preview
    }

    pub fn set_network_preview(&mut self, preview: NetworkPreview) {
        self.settings.network_preview = preview;
    }

    /// Shared handle network consumers read published frames through
    pub fn network_exchange(&self) -> Arc<NetworkFrameExchange> {
        self.buffers.network().exchange()
    }

    /// Receive the frame number of every future publish
    pub fn subscribe_network_frames(&mut self) -> Receiver<u64> {
        self.buffers.network_mut().subscribe()
    }

    pub fn overlay(&self) -> &TextOverlay {
        &self.overlay
    }

    /// Show a message on a screen unless its current one is still running
    pub fn set_screen_text(
        &mut self,
        message: &str,
        screen: usize,
        blink_interval_ms: i64,
        duration_ms: i64,
        centered: bool,
    ) -> bool {
        self.overlay
            .set_screen_text(screen, message, blink_interval_ms, duration_ms, centered)
    }

    pub fn clear_screen_text(&mut self, screen: usize) {
        self.overlay.clear_screen_text(screen);
    }

    pub fn flash_screen(&mut self, screen: usize, color: u32, period_ms: i64) {
        self.overlay.flash_screen(screen, color, period_ms);
    }

    /// Replace the fonts used for screen text and text metrics
    pub fn set_fonts(&mut self, large: Box<dyn TextRenderer>, small: Box<dyn TextRenderer>) {
        self.large_font = large;
        self.small_font = small;
    }

    fn font(&self, small: bool) -> &dyn TextRenderer {
        if small {
            self.small_font.as_ref()
        } else {
            self.large_font.as_ref()
        }
    }

    pub fn calculate_text_width(&self, text: &str, small: bool) -> i32 {
        self.font(small).calculate_width(text)
    }

    pub fn calculate_text_height(&self, text: &str, small: bool) -> i32 {
        self.font(small).calculate_height(text)
    }

    /// Switch the window scale, rolling back on failure
    pub fn switch_resolution_multiplier(
        &mut self,
        driver: &mut dyn DisplayDriver,
        multiplier: u8,
    ) -> Result<(), FrameError> {
        if multiplier == 0 || multiplier > MAX_MULTIPLIER || multiplier == self.resolution.multiplier {
            return Err(FrameError::InvalidMultiplier(multiplier));
        }

        let (bounds_x, bounds_y) = driver.display_bounds();
        let m = multiplier as u32;
        if self.resolution.width > bounds_x / m || self.resolution.height > bounds_y / m {
            driver.show_message(
                "Requested resolution multiplier will result in game window exceeding display bounds!\nNo change will be made!",
            );
            return Err(FrameError::ExceedsDisplay { multiplier });
        }

        let previous = self.resolution;
        let requested = Resolution::new(previous.width, previous.height, multiplier);
        let palette = driver.palette().clone();

        driver.set_text_mode();
        if let Err(e) = driver.set_mode(mode_of(requested)) {
            if let Err(restore) = driver.set_mode(mode_of(previous)) {
                driver.set_text_mode();
                driver.show_message(&format!(
                    "Unable to set back to previous windowed mode multiplier because: {}!",
                    restore
                ));
                return Err(FrameError::ModeSwitchFailed(restore));
            }
            log::error!("Failed to switch to new windowed mode multiplier, reverted back to previous setting!");
            driver.set_palette(palette);
            return Err(FrameError::ModeSwitchReverted(e));
        }

        log::info!("Switched to different windowed mode multiplier.");
        self.resolution = requested;
        self.settings.resolution_multiplier = multiplier;
        self.buffers.present_buffer = None;
        self.save_settings();

        driver.set_palette(palette);
        self.flip_frame_buffers(driver)
    }

    /// Present the 32-bit buffer, scaled up by the multiplier
    pub fn flip_frame_buffers(&mut self, driver: &mut dyn DisplayDriver) -> Result<(), FrameError> {
        let m = self.resolution.multiplier.max(1) as u32;
        let buffers = &mut self.buffers;
        if m == 1 {
            driver.present(&buffers.back_buffer32)?;
            return Ok(());
        }

        let (w, h) = buffers.back_buffer32.dimensions();
        if buffers
            .present_buffer
            .as_ref()
            .is_some_and(|p| p.dimensions() != (w * m, h * m))
        {
            buffers.present_buffer = None;
        }
        let scaled = match buffers.present_buffer.take() {
            Some(scaled) => scaled,
            None => Surface::new_rgb32(w * m, h * m)?,
        };
        let scaled = buffers.present_buffer.insert(scaled);
        scaled.stretch_blit(
            &buffers.back_buffer32,
            0,
            0,
            w as i32,
            h as i32,
            0,
            0,
            (w * m) as i32,
            (h * m) as i32,
        )?;
        driver.present(scaled)?;
        Ok(())
    }

    /// Render every player screen and prepare the 32-bit frame
    ///
    /// # Panics
    ///
    /// If the layout is split but no player screen surface exists.
    pub fn draw(&mut self, ctx: &mut DrawContext<'_>) -> Result<(), FrameError> {
        let screen_count = self.layout.screen_count();
        if screen_count > 1 && self.buffers.player_screen.is_none() {
            panic!("Split-screen surface not ready when needed");
        }

        ctx.post.clear_screen_post_effects();

        if self.networked {
            self.buffers.network_mut().begin_frame()?;
        }
        for screen in 0..screen_count {
            if let Err(e) = self.draw_screen(ctx, screen, screen_count) {
                if self.networked {
                    self.buffers.network_mut().abort_frame();
                }
                return Err(e);
            }
        }

        ctx.scene.clear_seen_pixels();

        if self.networked {
            self.buffers.network_mut().prepare_frame_for_network()?;
            self.draw_network_preview()?;
        } else {
            self.layout
                .draw_separators(&mut self.buffers.back_buffer8, self.almost_black_color);
            if self.draw_network_back_buffer {
                self.draw_network_frame_onto_back_buffer()?;
            }
        }

        let buffers = &mut self.buffers;
        if ctx.activity.is_some() {
            ctx.post
                .post_process(&buffers.back_buffer8, &self.palette, &mut buffers.back_buffer32);
        } else {
            expand_indexed(&buffers.back_buffer8, &self.palette, &mut buffers.back_buffer32)?;
        }
        Ok(())
    }

    fn draw_screen(&mut self, ctx: &mut DrawContext<'_>, screen: usize, screen_count: usize) -> Result<(), FrameError> {
        let networked = self.networked;
        let (res_x, res_y) = (self.resolution.width, self.resolution.height);
        let player_screen_width = self.buffers.player_screen_size().0;

        ctx.scene.update(screen);
        let mut target_pos = ctx.scene.offset(screen);

        let FrameBufferSet {
            back_buffer8,
            player_screen,
            network,
            ..
        } = &mut self.buffers;

        if networked {
            let (w, h) = network
                .viewport_size(screen)
                .ok_or(PipelineError::NotAllocated(screen))?;
            center_on_scene(ctx, &mut target_pos, w, h);
            network.record_view(screen, target_pos, &ctx.scene.back_layer_offsets())?;
        }

        let mut targets = if networked {
            network.staging_targets(screen)?
        } else if screen_count == 1 {
            ViewTargets::combined(back_buffer8)
        } else {
            match player_screen.as_mut() {
                Some(surface) => ViewTargets::combined(surface),
                None => panic!("Split-screen surface not ready when needed"),
            }
        };
        let (draw_w, draw_h) = targets.scene_size();

        if networked {
            targets.scene.clear(MASK_COLOR_8);
            targets.gui_mut().clear(MASK_COLOR_8);
            ctx.scene.draw(&mut targets, target_pos, true, true);
        } else {
            center_on_scene(ctx, &mut target_pos, draw_w, draw_h);
            ctx.scene.draw(&mut targets, target_pos, false, false);
        }

        let mut effects: Vec<PostEffect> = Vec::new();
        let mut glow_boxes: Vec<GlowBox> = Vec::new();
        if let Some(activity) = ctx.activity {
            let team = activity.team_of_screen(screen);
            effects = ctx
                .post
                .post_screen_effects_wrapped(target_pos, draw_w as i32, draw_h as i32, team);
            glow_boxes = ctx
                .post
                .glow_areas_wrapped(target_pos, draw_w as i32, draw_h as i32);
            if networked {
                ctx.post.set_network_post_effects(screen, effects.clone());
            }
        }

        let placement = TextPlacement {
            human: ctx.is_human_screen(screen),
            frame_width: draw_w,
            frame_height: draw_h,
            player_screen_width,
            res_x,
            occlusion_x: ctx.scene.screen_occlusion(screen).floor_x(),
        };
        self.overlay
            .draw_screen_text(screen, targets.gui_mut(), &placement, self.large_font.as_ref());

        let screen_offset = if screen_count > 1 {
            self.layout.screen_offset(screen, res_x, res_y)
        } else {
            Point::new(0, 0)
        };

        self.overlay.draw_screen_flash(screen, targets.gui_mut());
        drop(targets);

        if !networked {
            if screen_count > 1 {
                if let Some(surface) = player_screen.as_ref() {
                    back_buffer8.blit(
                        surface,
                        0,
                        0,
                        screen_offset.x,
                        screen_offset.y,
                        draw_w as i32,
                        draw_h as i32,
                    )?;
                }
            }
            ctx.post.adjust_effects_pos_to_player_screen(
                screen,
                (draw_w, draw_h),
                Vector::from_int(screen_offset.x, screen_offset.y),
                effects,
                glow_boxes,
            );
        }
        Ok(())
    }

    /// Replace the back buffer with the published viewport 0 frame
    fn draw_network_frame_onto_back_buffer(&mut self) -> Result<(), FrameError> {
        let exchange = self.buffers.network().exchange();
        let back = &mut self.buffers.back_buffer8;
        let (w, h) = (back.width() as i32, back.height() as i32);
        exchange
            .with_ready_frame(0, |frame| -> Result<(), SurfaceError> {
                back.blit(&frame.scene, 0, 0, 0, 0, w, h)?;
                back.masked_blit(&frame.gui, 0, 0, 0, 0, w, h)
            })
            .transpose()?;
        Ok(())
    }

    /// Stretch published frames onto the back buffer for inspection
    fn draw_network_preview(&mut self) -> Result<(), FrameError> {
        let preview = self.settings.network_preview;
        if preview == NetworkPreview::Off {
            return Ok(());
        }

        let exchange = self.buffers.network().exchange();
        let back = &mut self.buffers.back_buffer8;
        let (res_x, res_y) = back.dimensions();
        let quadrants = SplitLayout::new(true, true);

        let views: Vec<(usize, Point, (u32, u32))> = match preview {
            NetworkPreview::Off => Vec::new(),
            NetworkPreview::AllViewports => (0..MAX_SCREENS)
                .map(|i| (i, quadrants.screen_offset(i, res_x, res_y), (res_x / 2, res_y / 2)))
                .collect(),
            NetworkPreview::Viewport(i) => vec![(i, Point::new(0, 0), (res_x, res_y))],
        };

        for (viewport, at, (dw, dh)) in views {
            exchange
                .with_ready_frame(viewport, |frame| -> Result<(), SurfaceError> {
                    let mut composite = frame.scene.clone();
                    let (w, h) = (composite.width() as i32, composite.height() as i32);
                    composite.masked_blit(&frame.gui, 0, 0, 0, 0, w, h)?;
                    back.stretch_blit(&composite, 0, 0, w, h, at.x, at.y, dw as i32, dh as i32)
                })
                .transpose()?;
        }
        Ok(())
    }

    /// Write a numbered bitmap dump
    ///
    /// Returns the written path, or `None` for a world dump requested while
    /// no activity is running.
    pub fn save_bitmap(
        &mut self,
        mode: SaveBitmapMode,
        base: &str,
        bitmap: Option<&Surface>,
        driver: &dyn DisplayDriver,
        world: Option<&mut DrawContext<'_>>,
        writer: &dyn BitmapWriter,
    ) -> Result<Option<PathBuf>, FrameError> {
        let result = self.save_bitmap_inner(mode, base, bitmap, driver, world, writer);
        match &result {
            Ok(Some(path)) => log::info!("SYSTEM: Bitmap was dumped to: {}", path.display()),
            Ok(None) => log::debug!("World dump skipped, no activity running"),
            Err(e) => log::error!("Unable to save bitmap: {}", e),
        }
        result
    }

    fn save_bitmap_inner(
        &mut self,
        mode: SaveBitmapMode,
        base: &str,
        bitmap: Option<&Surface>,
        driver: &dyn DisplayDriver,
        world: Option<&mut DrawContext<'_>>,
        writer: &dyn BitmapWriter,
    ) -> Result<Option<PathBuf>, FrameError> {
        if base.is_empty() {
            return Err(ExportError::EmptyBaseName.into());
        }

        let surface: &Surface = match mode {
            SaveBitmapMode::SingleBitmap => bitmap.ok_or(ExportError::NothingToSave(mode))?,
            SaveBitmapMode::ScreenDump => {
                let screen = driver.screen().ok_or(ExportError::NothingToSave(mode))?;
                let dump = match self.buffers.screen_dump.take() {
                    Some(mut dump) if dump.dimensions() == screen.dimensions() => {
                        dump.copy_from(screen)?;
                        dump
                    }
                    _ => screen.clone(),
                };
                self.buffers.screen_dump.insert(dump)
            }
            SaveBitmapMode::WorldDump => {
                let Some(ctx) = world.filter(|ctx| ctx.activity.is_some()) else {
                    return Ok(None);
                };
                self.buffers
                    .world_dump
                    .render(&*ctx.scene, &mut *ctx.post, &self.palette)?
            }
        };

        let path = next_dump_path(base)?;
        writer.write(&path, surface, &self.palette)?;
        Ok(Some(path))
    }
}

fn mode_of(resolution: Resolution) -> DisplayMode {
    DisplayMode::new(resolution.width, resolution.height, resolution.multiplier)
}

/// Shift the view so a scene smaller than the target along a non-wrapping
/// axis sits in the middle
fn center_on_scene(ctx: &DrawContext<'_>, target_pos: &mut Vector, width: u32, height: u32) {
    let scene_w = ctx.scene.width();
    let scene_h = ctx.scene.height();
    if !ctx.scene.wraps_x() && width as i32 > scene_w {
        target_pos.x += ((width as i32 - scene_w) / 2) as f32;
    }
    if !ctx.scene.wraps_y() && height as i32 > scene_h {
        target_pos.y += ((height as i32 - scene_h) / 2) as f32;
    }
}
