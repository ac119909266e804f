//! Bresenham line rasterizer with scene wrap and dash patterns
//!
//! Key concepts:
//! - Dominant axis: the axis with the larger delta, stepped every iteration
//! - Skip counter: pixels are plotted only once the counter passes `skip`,
//!   so connected segments can carry a dash pattern across their joints
//! - Marker: either a two-tone pixel or a masked dot image stamped per plot

use crate::graphics::geometry::{Point, Vector};
use crate::graphics::scene::SceneWrap;
use crate::graphics::surface::Surface;

/// What gets stamped at each plotted position
#[derive(Debug, Clone, Copy)]
pub enum LineMarker<'a> {
    /// Single pixels alternating between `alt_color` and `color`, starting
    /// with `alt_color`. An `alt_color` of 0 means "same as `color`".
    Pixel { color: u32, alt_color: u32 },
    /// A dot image centred on each position, drawn masked
    Dot(&'a Surface),
}

/// Line drawing parameters
#[derive(Debug, Clone, Copy)]
pub struct LineStyle<'a> {
    pub marker: LineMarker<'a>,
    /// Candidate pixels skipped between plots
    pub skip: u16,
    /// Initial skip counter, usually the residual of the previous segment
    pub skip_start: u16,
    /// Take the short way around a wrapping scene
    pub shortest_wrap: bool,
}

impl<'a> LineStyle<'a> {
    pub fn solid(color: u32) -> Self {
        Self::two_tone(color, 0)
    }

    pub fn two_tone(color: u32, alt_color: u32) -> Self {
        Self {
            marker: LineMarker::Pixel { color, alt_color },
            skip: 0,
            skip_start: 0,
            shortest_wrap: false,
        }
    }

    pub fn dotted(dot: &'a Surface) -> Self {
        Self {
            marker: LineMarker::Dot(dot),
            skip: 0,
            skip_start: 0,
            shortest_wrap: false,
        }
    }

    pub fn with_skip(mut self, skip: u16, skip_start: u16) -> Self {
        self.skip = skip;
        self.skip_start = skip_start;
        self
    }

    pub fn with_shortest_wrap(mut self, shortest_wrap: bool) -> Self {
        self.shortest_wrap = shortest_wrap;
        self
    }
}

/// Bresenham candidate positions from a start pixel along a delta,
/// excluding the start pixel itself
#[derive(Debug, Clone)]
pub struct LineSteps {
    pos: [i32; 2],
    increment: [i32; 2],
    delta2: [i32; 2],
    dom: usize,
    sub: usize,
    error: i32,
    remaining: i32,
}

impl LineSteps {
    pub fn new(start: Point, delta: Point) -> Self {
        let increment = [
            if delta.x < 0 { -1 } else { 1 },
            if delta.y < 0 { -1 } else { 1 },
        ];
        let abs = [delta.x.abs(), delta.y.abs()];
        let delta2 = [abs[0] << 1, abs[1] << 1];
        let (dom, sub) = if abs[0] > abs[1] { (0, 1) } else { (1, 0) };

        Self {
            pos: [start.x, start.y],
            increment,
            delta2,
            dom,
            sub,
            error: delta2[sub] - abs[dom],
            remaining: abs[dom],
        }
    }
}

impl Iterator for LineSteps {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.remaining <= 0 {
            return None;
        }
        self.remaining -= 1;

        self.pos[self.dom] += self.increment[self.dom];
        if self.error >= 0 {
            self.pos[self.sub] += self.increment[self.sub];
            self.error -= self.delta2[self.dom];
        }
        self.error += self.delta2[self.sub];

        Some(Point::new(self.pos[0], self.pos[1]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.max(0) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for LineSteps {}

/// Integer start pixel and delta of a line, honouring shortest wrap
fn line_delta(wrap: &dyn SceneWrap, start: Vector, end: Vector, shortest_wrap: bool) -> (Point, Point) {
    let origin = start.floor();
    let delta = if shortest_wrap {
        wrap.shortest_distance(start, end, false).floor()
    } else {
        Point::new(end.floor_x() - origin.x, end.floor_y() - origin.y)
    };
    (origin, delta)
}

/// Draw a line segment onto `surface`
///
/// Returns the skip counter after the last candidate pixel, which can be fed
/// back as `skip_start` of the next connected segment. A zero-length line
/// draws nothing and returns 0.
pub fn draw_line(
    surface: &mut Surface,
    wrap: &dyn SceneWrap,
    start: Vector,
    end: Vector,
    style: &LineStyle<'_>,
) -> u16 {
    let (origin, delta) = line_delta(wrap, start, end, style.shortest_wrap);
    if delta.x == 0 && delta.y == 0 {
        return 0;
    }

    let skip = style.skip as u32;
    let mut skipped = style.skip_start as u32;
    let mut draw_alt = false;

    for candidate in LineSteps::new(origin, delta) {
        skipped += 1;
        if skipped <= skip {
            continue;
        }

        let (mut x, mut y) = (candidate.x, candidate.y);
        wrap.wrap_position(&mut x, &mut y);

        match style.marker {
            LineMarker::Pixel { color, alt_color } => {
                let alt_color = if alt_color == 0 { color } else { alt_color };
                surface.put_pixel(x, y, if draw_alt { color } else { alt_color });
            }
            LineMarker::Dot(dot) => {
                let dx = x - (dot.width() / 2) as i32;
                let dy = y - (dot.height() / 2) as i32;
                if let Err(e) = surface.draw_sprite(dot, dx, dy) {
                    panic!("dot image cannot be drawn onto line surface: {e}");
                }
            }
        }
        draw_alt = !draw_alt;
        skipped = 0;
    }

    skipped as u16
}
