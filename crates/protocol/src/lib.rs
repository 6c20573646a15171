use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod scene;

/// Push event name carried by every snapshot sent over the live feed.
pub const STATE_UPDATE: &str = "state_update";

/// Drawing surface the board geometry is laid out for.
pub const CANVAS_WIDTH: f64 = 900.0;
pub const CANVAS_HEIGHT: f64 = 700.0;

/// Complete view of the table. Clients replace their copy wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub hexagons: Vec<HexagonView>,
    pub vertices: Vec<VertexView>,
    pub lines: Vec<LineView>,
    pub players: BTreeMap<String, PlayerView>,
    pub dice: [u8; 2],
    #[serde(default)]
    pub rev: i64,
}

impl StateSnapshot {
    pub fn empty() -> Self {
        Self {
            hexagons: Vec::new(),
            vertices: Vec::new(),
            lines: Vec::new(),
            players: BTreeMap::new(),
            dice: [0, 0],
            rev: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HexagonView {
    /// Polygon corners, clockwise starting at the +q corner.
    pub vertices: Vec<(f64, f64)>,
    pub center: (f64, f64),
    pub number: u8,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexView {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: String,
}

/// A road drawn as a filled quad. Corners are listed in path order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineView {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub x3: f64,
    pub y3: f64,
    pub x4: f64,
    pub y4: f64,
    pub width: f64,
    pub color: String,
}

impl LineView {
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.x1, self.y1),
            (self.x2, self.y2),
            (self.x3, self.y3),
            (self.x4, self.y4),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub resources: BTreeMap<String, u32>,
    pub num_cards: u32,
    #[serde(default)]
    pub dev_cards: u32,
}

/// One user interaction. `x`/`y` are canvas-relative and only present when
/// the canvas itself was clicked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    pub color: String,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

/// Private note for the player whose action produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub card: String,
    pub wisdom: String,
}

/// Reply to an action: the new snapshot plus anything only the actor sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(flatten)]
    pub state: StateSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Push {
    pub event: String,
    pub payload: StateSnapshot,
}

impl Push {
    pub fn state_update(payload: StateSnapshot) -> Self {
        Self {
            event: STATE_UPDATE.to_string(),
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevCardsView {
    pub color: String,
    pub cards: Vec<String>,
}

/// Radius of the number token drawn on a tile. Rarer rolls get smaller
/// tokens; the scale is symmetric around 7.
pub fn token_radius(number: u8) -> f64 {
    let key = number.min(14u8.saturating_sub(number));
    match key {
        2 => 13.0,
        3 => 18.0,
        4 => 20.0,
        5 => 22.0,
        6 => 30.0,
        _ => 0.0,
    }
}
