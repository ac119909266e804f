//! Geometry primitives shared by the compositor
//!
//! Key concepts:
//! - Vector: floating point scene/screen position (scene coordinates are
//!   sub-pixel, surfaces are addressed by floored integers)
//! - Point: integer pixel coordinate
//! - GlowBox: axis-aligned scene rectangle used for glow areas

use std::ops::{Add, AddAssign, Sub};

/// 2D position or displacement in scene space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
}

impl Vector {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Build from integer pixel coordinates
    pub fn from_int(x: i32, y: i32) -> Self {
        Self {
            x: x as f32,
            y: y as f32,
        }
    }

    pub fn floor_x(&self) -> i32 {
        self.x.floor() as i32
    }

    pub fn floor_y(&self) -> i32 {
        self.y.floor() as i32
    }

    pub fn floor(&self) -> Point {
        Point::new(self.floor_x(), self.floor_y())
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Integer pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

impl From<Point> for Vector {
    fn from(p: Point) -> Self {
        Vector::from_int(p.x, p.y)
    }
}

/// Axis-aligned box in scene space, corner plus size
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlowBox {
    pub corner: Vector,
    pub width: f32,
    pub height: f32,
}

impl GlowBox {
    pub fn new(corner: Vector, width: f32, height: f32) -> Self {
        Self {
            corner,
            width,
            height,
        }
    }

    pub fn translated(&self, by: Vector) -> Self {
        Self::new(self.corner + by, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_floor_negative() {
        let v = Vector::new(-0.5, 2.9);
        assert_eq!(v.floor_x(), -1);
        assert_eq!(v.floor_y(), 2);
        assert_eq!(v.floor(), Point::new(-1, 2));
    }

    #[test]
    fn test_vector_arithmetic() {
        let mut v = Vector::new(1.0, 2.0) + Vector::new(3.0, 4.0);
        assert_eq!(v, Vector::new(4.0, 6.0));
        v += Vector::new(-4.0, -6.0);
        assert_eq!(v, Vector::zero());
        assert_eq!(Vector::new(3.0, 4.0).magnitude(), 5.0);
        assert_eq!(Vector::new(3.0, 4.0) - Vector::new(1.0, 1.0), Vector::new(2.0, 3.0));
    }

    #[test]
    fn test_glow_box_translate() {
        let b = GlowBox::new(Vector::new(1.0, 1.0), 4.0, 2.0);
        let moved = b.translated(Vector::new(10.0, 0.0));
        assert_eq!(moved.corner, Vector::new(11.0, 1.0));
        assert_eq!(moved.width, 4.0);
    }
}
