//! Cube-coordinate hex geometry.
//!
//! Tile centers are cubes with `q + r + s == 0`. Tile corners live on the same
//! lattice one unit step away from a center, so their components sum to +1 or
//! -1. In screen space `q` points to 2 o'clock, `r` to 6 and `s` to 10.

use serde::{Deserialize, Serialize};

pub const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Radius of a settlement marker, also its click target.
pub const VERTEX_RADIUS: f64 = 12.0;

/// Width of a road quad, also its click target.
pub const LINE_WIDTH: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pixel {
    pub x: f64,
    pub y: f64,
}

impl Pixel {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Pixel) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// z-component of `(p0 - p1) x (p2 - p1)`.
pub fn cross(p0: Pixel, p1: Pixel, p2: Pixel) -> f64 {
    (p0.x - p1.x) * (p2.y - p1.y) - (p0.y - p1.y) * (p2.x - p1.x)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cube {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

impl Cube {
    pub const fn new_raw(q: i32, r: i32, s: i32) -> Self {
        Self { q, r, s }
    }

    /// A tile center.
    pub const fn tile(q: i32, r: i32) -> Self {
        Self::new_raw(q, r, -q - r)
    }

    pub const fn add(self, dq: i32, dr: i32, ds: i32) -> Self {
        Self::new_raw(self.q + dq, self.r + dr, self.s + ds)
    }

    /// Corners of the tile centered here, clockwise from the +q corner.
    pub const fn corners(self) -> [Cube; 6] {
        [
            self.add(1, 0, 0),
            self.add(0, 0, -1),
            self.add(0, 1, 0),
            self.add(-1, 0, 0),
            self.add(0, 0, 1),
            self.add(0, -1, 0),
        ]
    }
}

/// Maps cubes to screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub origin: Pixel,
    /// Center-to-corner distance of a tile.
    pub size: f64,
}

impl Layout {
    pub fn to_pixel(&self, c: Cube) -> Pixel {
        let dx = f64::from(c.q - c.s) * SQRT_3 / 2.0;
        let dy = f64::from(c.r) - f64::from(c.q + c.s) / 2.0;
        Pixel::new(self.origin.x + self.size * dx, self.origin.y + self.size * dy)
    }

    /// Approximate tile hit test: inside the tile's inscribed circle.
    pub fn tile_contains(&self, center: Cube, p: Pixel) -> bool {
        p.distance(self.to_pixel(center)) < self.size * SQRT_3 / 2.0
    }

    pub fn vertex_contains(&self, corner: Cube, p: Pixel) -> bool {
        p.distance(self.to_pixel(corner)) < VERTEX_RADIUS
    }

    pub fn segment(&self, a: Cube, b: Cube) -> Segment {
        Segment {
            start: self.to_pixel(a),
            end: self.to_pixel(b),
            width: LINE_WIDTH,
        }
    }
}

/// A road between two corners, drawn as a rectangle of `width`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Pixel,
    pub end: Pixel,
    pub width: f64,
}

impl Segment {
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Rectangle corners `[A, B, C, D]`: A/B flank the start, C/D the end.
    pub fn corners(&self) -> [Pixel; 4] {
        let len = self.length();
        let (ux, uy) = if len > 0.0 {
            ((self.end.x - self.start.x) / len, (self.end.y - self.start.y) / len)
        } else {
            (0.0, 0.0)
        };
        let ox = -uy * self.width / 2.0;
        let oy = ux * self.width / 2.0;
        [
            Pixel::new(self.start.x + ox, self.start.y + oy),
            Pixel::new(self.start.x - ox, self.start.y - oy),
            Pixel::new(self.end.x + ox, self.end.y + oy),
            Pixel::new(self.end.x - ox, self.end.y - oy),
        ]
    }

    pub fn contains(&self, p: Pixel) -> bool {
        let [a, b, c, d] = self.corners();
        cross(a, b, p) <= 0.0 && cross(b, d, p) <= 0.0 && cross(d, c, p) <= 0.0 && cross(c, a, p) <= 0.0
    }
}
