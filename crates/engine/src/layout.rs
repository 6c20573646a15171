use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GameError;
use crate::hex::{Cube, Layout, Pixel, VERTEX_RADIUS};

/// Tile size used for small boards.
pub const BIG_HEXAGON: f64 = 55.0;
/// Tile size once the board grows past three rings.
pub const SMALL_HEXAGON: f64 = 40.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// The classic island: concentric rings around a center tile.
    #[default]
    Hexagon,
    /// A rhombus of `(2N - 1)^2` tiles.
    Diamond,
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutKind::Hexagon => f.write_str("hexagon"),
            LayoutKind::Diamond => f.write_str("diamond"),
        }
    }
}

impl FromStr for LayoutKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hexagon" => Ok(LayoutKind::Hexagon),
            "diamond" => Ok(LayoutKind::Diamond),
            other => Err(GameError::InvalidSettings(format!("unknown layout: {other}"))),
        }
    }
}

pub fn tile_size(rings: u32) -> f64 {
    if rings > 3 {
        SMALL_HEXAGON
    } else {
        BIG_HEXAGON
    }
}

pub fn tile_count(kind: LayoutKind, rings: u32) -> usize {
    let n = rings as usize;
    if n == 0 {
        return 0;
    }
    match kind {
        LayoutKind::Hexagon => 1 + 3 * (n - 1) * n,
        LayoutKind::Diamond => (2 * n - 1) * (2 * n - 1),
    }
}

/// Tile centers for a board with `rings` rings, in row-major (q, r) order.
pub fn tile_centers(kind: LayoutKind, rings: u32) -> Vec<Cube> {
    let n = i32::try_from(rings).unwrap_or(i32::MAX / 4);
    let mut out = Vec::with_capacity(tile_count(kind, rings));
    for q in (-n + 1)..n {
        for r in (-n + 1)..n {
            if kind == LayoutKind::Hexagon && (q + r).abs() >= n {
                continue;
            }
            out.push(Cube::tile(q, r));
        }
    }
    out
}

/// Geometry centered on a canvas of the given size.
pub fn centered(rings: u32, width: f64, height: f64) -> Layout {
    Layout {
        origin: Pixel::new(width / 2.0, height / 2.0),
        size: tile_size(rings),
    }
}

/// Whether every corner of the board, marker included, lands on a canvas of
/// the given size. Anything past the edge could never be clicked.
pub fn fits(kind: LayoutKind, rings: u32, width: f64, height: f64) -> bool {
    let geometry = centered(rings, width, height);
    tile_centers(kind, rings)
        .into_iter()
        .flat_map(Cube::corners)
        .map(|c| geometry.to_pixel(c))
        .all(|p| {
            p.x >= VERTEX_RADIUS
                && p.x <= width - VERTEX_RADIUS
                && p.y >= VERTEX_RADIUS
                && p.y <= height - VERTEX_RADIUS
        })
}
