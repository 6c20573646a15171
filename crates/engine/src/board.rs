//! Tiles, settlement slots and road slots of one generated board.

use hexboard_protocol::{HexagonView, LineView, VertexView};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::hex::{Cube, Layout, Pixel, LINE_WIDTH, VERTEX_RADIUS};
use crate::layout::{self, LayoutKind};
use crate::resource::{self, Resource};

/// Fill of an unowned slot.
pub const TRANSPARENT: &str = "rgba(255, 255, 255, 0)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub center: Cube,
    pub resource: Resource,
    pub number: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corner {
    pub at: Cube,
    pub owner: Option<String>,
}

/// A road slot between two adjacent corners, stored with `a < b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub a: Cube,
    pub b: Cube,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Vertex(usize),
    Edge(usize),
    Tile(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub kind: LayoutKind,
    pub rings: u32,
    pub geometry: Layout,
    tiles: Vec<Tile>,
    corners: Vec<Corner>,
    edges: Vec<Edge>,
}

impl Board {
    pub fn generate<R: Rng>(kind: LayoutKind, rings: u32, width: f64, height: f64, rng: &mut R) -> Self {
        let centers = layout::tile_centers(kind, rings);
        let allocation = resource::allocate(centers.len(), rng);
        let tiles: Vec<Tile> = centers
            .into_iter()
            .zip(allocation)
            .map(|(center, (resource, number))| Tile {
                center,
                resource,
                number,
            })
            .collect();

        let mut corner_set = BTreeSet::new();
        let mut edge_set = BTreeSet::new();
        for tile in &tiles {
            let corners = tile.center.corners();
            for (i, c) in corners.iter().enumerate() {
                corner_set.insert(*c);
                let next = corners[(i + 1) % corners.len()];
                edge_set.insert(if *c < next { (*c, next) } else { (next, *c) });
            }
        }

        Self {
            kind,
            rings,
            geometry: layout::centered(rings, width, height),
            tiles,
            corners: corner_set
                .into_iter()
                .map(|at| Corner { at, owner: None })
                .collect(),
            edges: edge_set
                .into_iter()
                .map(|(a, b)| Edge { a, b, owner: None })
                .collect(),
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn corners(&self) -> &[Corner] {
        &self.corners
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn corner_owner(&self, at: Cube) -> Option<&str> {
        self.corners
            .binary_search_by(|c| c.at.cmp(&at))
            .ok()
            .and_then(|i| self.corners[i].owner.as_deref())
    }

    /// What sits under `p`. Settlement slots win over roads, roads over tiles.
    pub fn hit(&self, p: Pixel) -> Option<Hit> {
        let g = &self.geometry;
        if let Some(i) = self.corners.iter().position(|c| g.vertex_contains(c.at, p)) {
            return Some(Hit::Vertex(i));
        }
        if let Some(i) = self.edges.iter().position(|e| g.segment(e.a, e.b).contains(p)) {
            return Some(Hit::Edge(i));
        }
        self.tiles
            .iter()
            .position(|t| g.tile_contains(t.center, p))
            .map(Hit::Tile)
    }

    /// Apply a canvas click for `color`. Slots toggle ownership; tiles cycle
    /// their resource. Returns what was hit, if anything.
    pub fn click(&mut self, p: Pixel, color: &str) -> Option<Hit> {
        let hit = self.hit(p)?;
        match hit {
            Hit::Vertex(i) => toggle(&mut self.corners[i].owner, color),
            Hit::Edge(i) => toggle(&mut self.edges[i].owner, color),
            Hit::Tile(i) => {
                let tile = &mut self.tiles[i];
                tile.resource = tile.resource.next();
            }
        }
        Some(hit)
    }

    /// One resource per owned corner of every productive tile numbered `sum`.
    pub fn production(&self, sum: u8) -> Vec<(String, Resource)> {
        let mut out = Vec::new();
        for tile in self.tiles.iter().filter(|t| t.number == sum && t.resource.is_tradable()) {
            for corner in tile.center.corners() {
                if let Some(owner) = self.corner_owner(corner) {
                    out.push((owner.to_string(), tile.resource));
                }
            }
        }
        out
    }

    pub fn hexagon_views(&self) -> Vec<HexagonView> {
        let g = &self.geometry;
        self.tiles
            .iter()
            .map(|t| {
                let center = g.to_pixel(t.center);
                HexagonView {
                    vertices: t
                        .center
                        .corners()
                        .iter()
                        .map(|c| {
                            let p = g.to_pixel(*c);
                            (p.x, p.y)
                        })
                        .collect(),
                    center: (center.x, center.y),
                    number: t.number,
                    color: t.resource.color().to_string(),
                }
            })
            .collect()
    }

    pub fn vertex_views(&self) -> Vec<VertexView> {
        self.corners
            .iter()
            .map(|c| {
                let p = self.geometry.to_pixel(c.at);
                VertexView {
                    x: p.x,
                    y: p.y,
                    radius: VERTEX_RADIUS,
                    color: fill(&c.owner),
                }
            })
            .collect()
    }

    pub fn line_views(&self) -> Vec<LineView> {
        self.edges
            .iter()
            .map(|e| {
                let [a, b, c, d] = self.geometry.segment(e.a, e.b).corners();
                LineView {
                    x1: a.x,
                    y1: a.y,
                    x2: b.x,
                    y2: b.y,
                    x3: d.x,
                    y3: d.y,
                    x4: c.x,
                    y4: c.y,
                    width: LINE_WIDTH,
                    color: fill(&e.owner),
                }
            })
            .collect()
    }
}

fn toggle(owner: &mut Option<String>, color: &str) {
    if owner.as_deref() == Some(color) {
        *owner = None;
    } else {
        *owner = Some(color.to_string());
    }
}

fn fill(owner: &Option<String>) -> String {
    owner.clone().unwrap_or_else(|| TRANSPARENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn board() -> Board {
        Board::generate(
            LayoutKind::Hexagon,
            3,
            900.0,
            700.0,
            &mut StdRng::seed_from_u64(3),
        )
    }

    #[test]
    fn standard_board_slot_counts() {
        let b = board();
        assert_eq!(b.tiles().len(), 19);
        assert_eq!(b.corners().len(), 54);
        assert_eq!(b.edges().len(), 72);
        assert!(b.edges().iter().all(|e| e.a < e.b));
    }

    #[test]
    fn views_match_slots() {
        let b = board();
        assert_eq!(b.hexagon_views().len(), 19);
        assert!(b.hexagon_views().iter().all(|h| h.vertices.len() == 6));
        assert_eq!(b.vertex_views().len(), 54);
        assert_eq!(b.line_views().len(), 72);
        assert!(b.vertex_views().iter().all(|v| v.color == TRANSPARENT));
    }

    #[test]
    fn clicking_a_corner_toggles_ownership() {
        let mut b = board();
        let at = b.corners()[0].at;
        let p = b.geometry.to_pixel(at);

        assert_eq!(b.click(p, "cyan"), Some(Hit::Vertex(0)));
        assert_eq!(b.corner_owner(at), Some("cyan"));

        // Another color takes it over, the same color clears it.
        b.click(p, "blue");
        assert_eq!(b.corner_owner(at), Some("blue"));
        b.click(p, "blue");
        assert_eq!(b.corner_owner(at), None);
    }

    #[test]
    fn clicking_a_road_midpoint_toggles_the_edge() {
        let mut b = board();
        let e = b.edges()[5].clone();
        let (pa, pb) = (b.geometry.to_pixel(e.a), b.geometry.to_pixel(e.b));
        let mid = Pixel::new((pa.x + pb.x) / 2.0, (pa.y + pb.y) / 2.0);

        assert_eq!(b.click(mid, "magenta"), Some(Hit::Edge(5)));
        assert_eq!(b.edges()[5].owner.as_deref(), Some("magenta"));
        assert_eq!(b.line_views()[5].color, "magenta");
    }

    #[test]
    fn clicking_a_tile_center_cycles_its_resource() {
        let mut b = board();
        let before = b.tiles()[4].resource;
        let p = b.geometry.to_pixel(b.tiles()[4].center);
        assert_eq!(b.click(p, "cyan"), Some(Hit::Tile(4)));
        assert_eq!(b.tiles()[4].resource, before.next());
    }

    #[test]
    fn clicking_empty_space_is_a_miss() {
        let mut b = board();
        let before = b.clone();
        assert_eq!(b.click(Pixel::new(2.0, 2.0), "cyan"), None);
        assert_eq!(b, before);
    }

    #[test]
    fn owned_corners_produce_for_matching_numbers() {
        let mut b = board();
        let tile = b
            .tiles()
            .iter()
            .find(|t| t.resource.is_tradable())
            .cloned()
            .unwrap();
        let corners = tile.center.corners();
        for c in &corners[..2] {
            let p = b.geometry.to_pixel(*c);
            b.click(p, "purple");
        }

        let produced = b.production(tile.number);
        let from_tile = produced
            .iter()
            .filter(|(owner, r)| owner == "purple" && *r == tile.resource)
            .count();
        assert!(from_tile >= 2);
        assert!(b.production(7).is_empty());
    }
}
