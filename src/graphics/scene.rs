//! Collaborator interfaces the compositor draws through
//!
//! The compositor never owns the world it displays. Scene rendering,
//! post-process effects and the running activity are reached through the
//! traits below, mirroring how the display driver is reached through
//! `DisplayDriver`.

use std::sync::Arc;

use crate::graphics::geometry::{GlowBox, Vector};
use crate::graphics::palette::Palette;
use crate::graphics::surface::Surface;

/// Toroidal wrapping rules of the scene a line or effect lives in
pub trait SceneWrap {
    /// Wrap an integer pixel position onto the scene in place.
    /// Returns true if the position changed.
    fn wrap_position(&self, x: &mut i32, y: &mut i32) -> bool;

    /// Displacement from `from` to `to`, taking the short way around
    /// wrapping axes when `check_wrap` is set.
    fn shortest_distance(&self, from: Vector, to: Vector, check_wrap: bool) -> Vector;
}

/// A plane with no wrapping at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWrap;

impl SceneWrap for NoWrap {
    fn wrap_position(&self, _x: &mut i32, _y: &mut i32) -> bool {
        false
    }

    fn shortest_distance(&self, from: Vector, to: Vector, _check_wrap: bool) -> Vector {
        to - from
    }
}

/// Surfaces a viewport is rendered into
///
/// In the local path the GUI layer is drawn straight onto the scene surface,
/// so `gui` is `None`. The networked path keeps the two separate.
pub struct ViewTargets<'a> {
    pub scene: &'a mut Surface,
    pub gui: Option<&'a mut Surface>,
}

impl<'a> ViewTargets<'a> {
    pub fn combined(scene: &'a mut Surface) -> Self {
        Self { scene, gui: None }
    }

    pub fn split(scene: &'a mut Surface, gui: &'a mut Surface) -> Self {
        Self {
            scene,
            gui: Some(gui),
        }
    }

    /// Surface GUI elements (text, flashes) belong on
    pub fn gui_mut(&mut self) -> &mut Surface {
        match self.gui.as_deref_mut() {
            Some(gui) => gui,
            None => self.scene,
        }
    }

    pub fn scene_size(&self) -> (u32, u32) {
        self.scene.dimensions()
    }
}

/// The world being displayed
pub trait Scene: SceneWrap {
    fn width(&self) -> i32;
    fn height(&self) -> i32;
    fn wraps_x(&self) -> bool;
    fn wraps_y(&self) -> bool;

    /// Line the scene view up with a player screen
    fn update(&mut self, screen: usize);

    /// Top-left scene position shown by a player screen
    fn offset(&self, screen: usize) -> Vector;

    /// How far GUI elements of a screen are pushed aside by HUD occlusion
    fn screen_occlusion(&self, screen: usize) -> Vector;

    /// Scroll offsets of the background layers, back to front
    fn back_layer_offsets(&self) -> Vec<Vector>;

    /// Render the view at `target_pos`. In networked mode `clear` asks the
    /// scene to leave undrawn pixels transparent.
    fn draw(&mut self, targets: &mut ViewTargets<'_>, target_pos: Vector, networked: bool, clear: bool);

    /// Forget pixels revealed from unseen layers this frame
    fn clear_seen_pixels(&mut self);

    /// Full-scene color layers for a world dump: background terrain,
    /// foreground terrain, then objects.
    fn dump_layers(&self) -> Vec<&Surface>;
}

/// A glow or screen effect placed in the scene
#[derive(Debug, Clone)]
pub struct PostEffect {
    /// Centre of the effect in scene (or screen) coordinates
    pub pos: Vector,
    pub bitmap: Arc<Surface>,
    pub strength: u8,
    /// Rotation in radians
    pub angle: f32,
}

impl PostEffect {
    pub fn new(pos: Vector, bitmap: Arc<Surface>, strength: u8, angle: f32) -> Self {
        Self {
            pos,
            bitmap,
            strength,
            angle,
        }
    }
}

/// Post-processing and glow effect collaborator
pub trait PostProcess {
    fn clear_screen_post_effects(&mut self);

    /// Effects overlapping the given scene box. `team` of `None` matches
    /// every team.
    fn post_screen_effects_wrapped(
        &self,
        pos: Vector,
        width: i32,
        height: i32,
        team: Option<i32>,
    ) -> Vec<PostEffect>;

    fn glow_areas_wrapped(&self, pos: Vector, width: i32, height: i32) -> Vec<GlowBox>;

    /// Hand a screen's effects to the network consumer
    fn set_network_post_effects(&mut self, screen: usize, effects: Vec<PostEffect>);

    /// Move scene-relative effects into back buffer coordinates for a screen
    fn adjust_effects_pos_to_player_screen(
        &mut self,
        screen: usize,
        screen_size: (u32, u32),
        screen_offset: Vector,
        effects: Vec<PostEffect>,
        glow_boxes: Vec<GlowBox>,
    );

    /// Apply every queued effect, producing the 32-bit frame from the
    /// 8-bit back buffer.
    fn post_process(&mut self, back_buffer8: &Surface, palette: &Palette, back_buffer32: &mut Surface);

    /// Scratch surface at least as large as `effect`, for rotation
    fn temp_effect_surface(&mut self, effect: &Surface) -> &mut Surface;
}

/// The running game mode
pub trait Activity {
    /// Number of screens driven by human players
    fn human_count(&self) -> usize;

    /// Team viewed through a screen, `None` for no team
    fn team_of_screen(&self, screen: usize) -> Option<i32>;
}

/// Everything a frame draw reaches out to
pub struct DrawContext<'a> {
    pub scene: &'a mut dyn Scene,
    pub post: &'a mut dyn PostProcess,
    pub activity: Option<&'a dyn Activity>,
}

impl<'a> DrawContext<'a> {
    pub fn new(
        scene: &'a mut dyn Scene,
        post: &'a mut dyn PostProcess,
        activity: Option<&'a dyn Activity>,
    ) -> Self {
        Self {
            scene,
            post,
            activity,
        }
    }

    /// Whether a screen belongs to a human player. Without an activity every
    /// screen counts as human.
    pub fn is_human_screen(&self, screen: usize) -> bool {
        self.activity
            .map_or(true, |activity| screen < activity.human_count())
    }
}
