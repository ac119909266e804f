//! Procedural scene, post-processing and activity for the demo binary
//!
//! Everything here is deliberately small: a horizontally wrapping strip of
//! hills, a few drifting boxes and one glow per box. It exercises every path
//! of the compositor without any game behind it.

use std::sync::Arc;

use crate::graphics::buffers::expand_indexed;
use crate::graphics::geometry::{GlowBox, Vector};
use crate::graphics::palette::{Palette, Rgb, MASK_COLOR_32, MASK_COLOR_8};
use crate::graphics::scene::{Activity, PostEffect, PostProcess, Scene, SceneWrap, ViewTargets};
use crate::graphics::surface::Surface;
use crate::graphics::viewport::MAX_SCREENS;

/// Palette index of the demo sky
pub const SKY_INDEX: u32 = 40;
const GROUND_INDEX: u32 = 120;
const ACTOR_INDEX: u32 = 230;
const GLOW_SIZE: u32 = 16;

/// A drifting box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Actor {
    pub pos: Vector,
    pub vel: Vector,
    pub team: Option<i32>,
}

/// Wrapping strip of terrain with a few actors
#[derive(Debug)]
pub struct DemoScene {
    width: i32,
    height: i32,
    terrain: Surface,
    objects: Surface,
    actors: Vec<Actor>,
    views: [Vector; MAX_SCREENS],
    current_screen: usize,
    seen_pixel_clears: u64,
}

impl DemoScene {
    pub fn new(width: u32, height: u32) -> Result<Self, crate::graphics::SurfaceError> {
        let mut terrain = Surface::new_indexed(width, height)?;
        let w = width as i32;
        let h = height as i32;
        for x in 0..w {
            let phase = x as f32 / w as f32 * std::f32::consts::TAU;
            let ground = h * 2 / 3 + ((phase * 3.0).sin() * h as f32 / 10.0) as i32;
            terrain.vline(x, ground, h - 1, GROUND_INDEX);
        }

        let actors = (0..4)
            .map(|i| Actor {
                pos: Vector::new((i * w / 4) as f32, (h / 3) as f32),
                vel: Vector::new(1.0 + i as f32, 0.5),
                team: Some(i % 2),
            })
            .collect();

        let mut scene = Self {
            width: w,
            height: h,
            terrain,
            objects: Surface::new_indexed(width, height)?,
            actors,
            views: [Vector::zero(); MAX_SCREENS],
            current_screen: 0,
            seen_pixel_clears: 0,
        };
        scene.redraw_objects();
        Ok(scene)
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Point a screen at a scene position
    pub fn set_view(&mut self, screen: usize, pos: Vector) {
        if let Some(view) = self.views.get_mut(screen) {
            *view = pos;
        }
    }

    pub fn current_screen(&self) -> usize {
        self.current_screen
    }

    pub fn seen_pixel_clears(&self) -> u64 {
        self.seen_pixel_clears
    }

    /// Move every actor one step and let each screen follow its actor
    pub fn tick(&mut self) {
        let top = (self.height / 2) as f32;
        for actor in &mut self.actors {
            actor.pos += actor.vel;
            actor.pos.x = actor.pos.x.rem_euclid(self.width.max(1) as f32);
            if actor.pos.y < 0.0 || actor.pos.y > top {
                actor.vel.y = -actor.vel.y;
                actor.pos.y = actor.pos.y.clamp(0.0, top);
            }
        }
        for (view, actor) in self.views.iter_mut().zip(&self.actors) {
            *view = actor.pos - Vector::new(64.0, 64.0);
        }
        self.redraw_objects();
    }

    fn redraw_objects(&mut self) {
        self.objects.clear(MASK_COLOR_8);
        for actor in &self.actors {
            let p = actor.pos.floor();
            self.objects.fill_rect(p.x - 3, p.y - 3, p.x + 3, p.y + 3, ACTOR_INDEX);
        }
    }

    /// Stamp a layer across the target, repeating it horizontally
    fn stamp(layer: &Surface, target: &mut Surface, origin: Vector, width: i32) {
        let mut x = -origin.floor_x().rem_euclid(width.max(1));
        let y = -origin.floor_y();
        while x < target.width() as i32 {
            if let Err(e) = target.draw_sprite(layer, x, y) {
                log::error!("Demo layer not drawn: {}", e);
                return;
            }
            x += width.max(1);
        }
    }
}

fn wrap_x(width: i32, x: &mut i32) -> bool {
    let wrapped = x.rem_euclid(width.max(1));
    let changed = wrapped != *x;
    *x = wrapped;
    changed
}

impl SceneWrap for DemoScene {
    fn wrap_position(&self, x: &mut i32, _y: &mut i32) -> bool {
        wrap_x(self.width, x)
    }

    fn shortest_distance(&self, from: Vector, to: Vector, check_wrap: bool) -> Vector {
        let mut d = to - from;
        if check_wrap {
            let w = self.width as f32;
            if d.x > w / 2.0 {
                d.x -= w;
            } else if d.x < -w / 2.0 {
                d.x += w;
            }
        }
        d
    }
}

impl Scene for DemoScene {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn wraps_x(&self) -> bool {
        true
    }

    fn wraps_y(&self) -> bool {
        false
    }

    fn update(&mut self, screen: usize) {
        self.current_screen = screen;
    }

    fn offset(&self, screen: usize) -> Vector {
        self.views.get(screen).copied().unwrap_or_default()
    }

    fn screen_occlusion(&self, _screen: usize) -> Vector {
        Vector::zero()
    }

    fn back_layer_offsets(&self) -> Vec<Vector> {
        let view = self.offset(self.current_screen);
        vec![Vector::new(view.x * 0.5, view.y * 0.5)]
    }

    fn draw(&mut self, targets: &mut ViewTargets<'_>, target_pos: Vector, _networked: bool, clear: bool) {
        if !clear {
            targets.scene.clear(SKY_INDEX);
        }
        Self::stamp(&self.terrain, targets.scene, target_pos, self.width);
        Self::stamp(&self.objects, targets.scene, target_pos, self.width);

        let marker = ACTOR_INDEX - 1 - self.current_screen as u32;
        targets.gui_mut().fill_rect(2, 2, 5, 5, marker);
    }

    fn clear_seen_pixels(&mut self) {
        self.seen_pixel_clears += 1;
    }

    fn dump_layers(&self) -> Vec<&Surface> {
        vec![&self.terrain, &self.objects]
    }
}

/// Warm round glow in 32-bit color
pub fn glow_bitmap(size: u32) -> Result<Surface, crate::graphics::SurfaceError> {
    let mut glow = Surface::new_rgb32(size, size)?;
    glow.clear(MASK_COLOR_32);
    let r = size as f32 / 2.0;
    for y in 0..size as i32 {
        for x in 0..size as i32 {
            let d = Vector::new(x as f32 + 0.5 - r, y as f32 + 0.5 - r).magnitude();
            if d < r {
                let k = 1.0 - d / r;
                glow.put_pixel(x, y, Rgb::new((255.0 * k) as u8, (160.0 * k) as u8, (64.0 * k) as u8).pack());
            }
        }
    }
    Ok(glow)
}

/// Glows around every actor, applied to the 32-bit frame
#[derive(Debug)]
pub struct DemoPostProcess {
    scene_width: i32,
    glow: Arc<Surface>,
    sources: Vec<(Vector, Option<i32>)>,
    screen_effects: Vec<PostEffect>,
    glow_boxes: Vec<GlowBox>,
    network_effects: [Vec<PostEffect>; MAX_SCREENS],
    temp: Option<Surface>,
    frames_processed: u64,
}

impl DemoPostProcess {
    pub fn new(scene_width: i32) -> Result<Self, crate::graphics::SurfaceError> {
        Ok(Self {
            scene_width,
            glow: Arc::new(glow_bitmap(GLOW_SIZE)?),
            sources: Vec::new(),
            screen_effects: Vec::new(),
            glow_boxes: Vec::new(),
            network_effects: Default::default(),
            temp: None,
            frames_processed: 0,
        })
    }

    /// Put one glow on every actor
    pub fn track(&mut self, actors: &[Actor]) {
        self.sources = actors.iter().map(|a| (a.pos, a.team)).collect();
    }

    pub fn screen_effects(&self) -> &[PostEffect] {
        &self.screen_effects
    }

    pub fn glow_boxes(&self) -> &[GlowBox] {
        &self.glow_boxes
    }

    pub fn network_effects(&self, screen: usize) -> &[PostEffect] {
        self.network_effects.get(screen).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Offset of `pos` inside the box at `origin`, wrapping horizontally
    fn relative(&self, pos: Vector, origin: Vector, width: i32, height: i32) -> Option<Vector> {
        let mut dx = pos.x - origin.x;
        if self.scene_width > 0 {
            dx = dx.rem_euclid(self.scene_width as f32);
        }
        let dy = pos.y - origin.y;
        let half = GLOW_SIZE as f32 / 2.0;
        let inside = dx > -half && dx < width as f32 + half && dy > -half && dy < height as f32 + half;
        inside.then(|| Vector::new(dx, dy))
    }
}

impl PostProcess for DemoPostProcess {
    fn clear_screen_post_effects(&mut self) {
        self.screen_effects.clear();
        self.glow_boxes.clear();
    }

    fn post_screen_effects_wrapped(&self, pos: Vector, width: i32, height: i32, team: Option<i32>) -> Vec<PostEffect> {
        self.sources
            .iter()
            .filter(|(_, source_team)| team.is_none() || source_team.is_none() || *source_team == team)
            .filter_map(|&(source, _)| self.relative(source, pos, width, height))
            .map(|at| PostEffect::new(at, Arc::clone(&self.glow), 192, 0.0))
            .collect()
    }

    fn glow_areas_wrapped(&self, pos: Vector, width: i32, height: i32) -> Vec<GlowBox> {
        let half = GLOW_SIZE as f32 / 2.0;
        self.sources
            .iter()
            .filter_map(|&(source, _)| self.relative(source, pos, width, height))
            .map(|at| GlowBox::new(at - Vector::new(half, half), GLOW_SIZE as f32, GLOW_SIZE as f32))
            .collect()
    }

    fn set_network_post_effects(&mut self, screen: usize, effects: Vec<PostEffect>) {
        if let Some(slot) = self.network_effects.get_mut(screen) {
            *slot = effects;
        }
    }

    fn adjust_effects_pos_to_player_screen(
        &mut self,
        _screen: usize,
        _screen_size: (u32, u32),
        screen_offset: Vector,
        effects: Vec<PostEffect>,
        glow_boxes: Vec<GlowBox>,
    ) {
        self.screen_effects.extend(effects.into_iter().map(|mut e| {
            e.pos += screen_offset;
            e
        }));
        self.glow_boxes
            .extend(glow_boxes.into_iter().map(|b| b.translated(screen_offset)));
    }

    fn post_process(&mut self, back_buffer8: &Surface, palette: &Palette, back_buffer32: &mut Surface) {
        if let Err(e) = expand_indexed(back_buffer8, palette, back_buffer32) {
            log::error!("Post-process skipped: {}", e);
            return;
        }
        for effect in &self.screen_effects {
            let p = effect.pos.floor();
            let x = p.x - (effect.bitmap.width() / 2) as i32;
            let y = p.y - (effect.bitmap.height() / 2) as i32;
            if let Err(e) = back_buffer32.draw_trans_sprite(&effect.bitmap, x, y, effect.strength) {
                log::warn!("Glow not drawn: {}", e);
            }
        }
        self.frames_processed += 1;
    }

    fn temp_effect_surface(&mut self, effect: &Surface) -> &mut Surface {
        let side = effect.width().max(effect.height()) * 3 / 2 + 1;
        let temp = match self.temp.take() {
            Some(temp) if temp.width() >= side => temp,
            _ => match Surface::new_rgb32(side, side) {
                Ok(temp) => temp,
                Err(e) => panic!("scratch effect surface of {}x{} not allocated: {}", side, side, e),
            },
        };
        self.temp.insert(temp)
    }
}

/// A fixed number of human screens with alternating teams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoActivity {
    pub humans: usize,
}

impl Activity for DemoActivity {
    fn human_count(&self) -> usize {
        self.humans
    }

    fn team_of_screen(&self, screen: usize) -> Option<i32> {
        (screen < self.humans).then_some((screen % 2) as i32)
    }
}
