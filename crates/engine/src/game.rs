//! The authoritative table: board, players, dice and the dev deck, plus the
//! actions clients may send against it.

use hexboard_protocol::{ActionRequest, Notice, StateSnapshot, CANVAS_HEIGHT, CANVAS_WIDTH};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

use crate::board::{Board, Hit};
use crate::deck::{self, Deck, DevCard, DEFAULT_WISDOM};
use crate::error::GameError;
use crate::hex::Pixel;
use crate::layout::{self, LayoutKind};
use crate::player::Player;
use crate::resource::{Resource, DESERT_NUMBER};

/// Largest board we agree to lay out.
pub const MAX_RINGS: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Player colors, in seating order. They double as CSS colors.
    pub players: Vec<String>,
    pub layout: LayoutKind,
    pub rings: u32,
    pub wisdom: Vec<String>,
    /// Fixed seed for reproducible boards and rolls.
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            players: ["cyan", "magenta", "purple", "blue"]
                .into_iter()
                .map(String::from)
                .collect(),
            layout: LayoutKind::Hexagon,
            rings: 3,
            wisdom: DEFAULT_WISDOM.into_iter().map(String::from).collect(),
            seed: None,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), GameError> {
        if self.rings == 0 || self.rings > MAX_RINGS {
            return Err(GameError::InvalidSettings(format!(
                "rings must be between 1 and {MAX_RINGS}, got {}",
                self.rings
            )));
        }
        // Either layout can be dealt mid-game, so both have to fit.
        for kind in [LayoutKind::Hexagon, LayoutKind::Diamond] {
            if !layout::fits(kind, self.rings, CANVAS_WIDTH, CANVAS_HEIGHT) {
                return Err(GameError::InvalidSettings(format!(
                    "a {kind} board of {} rings does not fit the canvas",
                    self.rings
                )));
            }
        }
        if self.players.is_empty() {
            return Err(GameError::InvalidSettings("at least one player is required".into()));
        }
        let mut seen = BTreeSet::new();
        for color in &self.players {
            if color.trim().is_empty() {
                return Err(GameError::InvalidSettings("player color is blank".into()));
            }
            if !seen.insert(color.as_str()) {
                return Err(GameError::InvalidSettings(format!("duplicate player color: {color}")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Click { x: f64, y: f64 },
    Roll,
    NewBoard(LayoutKind),
    Reset,
    DrawCard,
    UndoCard,
    Add(Resource),
    Remove(Resource),
}

impl Action {
    pub fn from_request(req: &ActionRequest) -> Result<Self, GameError> {
        let name = req.action.trim();
        let action = match name {
            "click" => match (req.x, req.y) {
                (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Action::Click { x, y },
                _ => return Err(GameError::MissingCoordinates(name.to_string())),
            },
            "roll" => Action::Roll,
            "new_board" => Action::NewBoard(LayoutKind::Hexagon),
            "new_diamond" => Action::NewBoard(LayoutKind::Diamond),
            "reset" => Action::Reset,
            "draw_card" => Action::DrawCard,
            "undo_card" => Action::UndoCard,
            other => {
                if let Some(r) = other.strip_prefix("add_") {
                    Action::Add(tradable(r)?)
                } else if let Some(r) = other.strip_prefix("remove_") {
                    Action::Remove(tradable(r)?)
                } else {
                    return Err(GameError::UnknownAction(other.to_string()));
                }
            }
        };
        Ok(action)
    }

    /// Journal event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Click { .. } => "click",
            Action::Roll => "roll",
            Action::NewBoard(_) => "new_board",
            Action::Reset => "reset",
            Action::DrawCard => "draw_card",
            Action::UndoCard => "undo_card",
            Action::Add(_) => "add_resource",
            Action::Remove(_) => "remove_resource",
        }
    }
}

fn tradable(name: &str) -> Result<Resource, GameError> {
    let r: Resource = name.parse()?;
    if !r.is_tradable() {
        return Err(GameError::UnknownResource(name.to_string()));
    }
    Ok(r)
}

/// Outcome of one applied action.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    /// False when the action touched nothing (a click on empty canvas).
    pub changed: bool,
    /// Journal payload describing what happened.
    pub detail: serde_json::Value,
    /// Shown only to the acting player.
    pub notice: Option<Notice>,
}

impl Applied {
    fn changed(detail: serde_json::Value) -> Self {
        Self {
            changed: true,
            detail,
            notice: None,
        }
    }
}

fn fresh_rng() -> StdRng {
    StdRng::from_os_rng()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    settings: Settings,
    board: Board,
    players: BTreeMap<String, Player>,
    dice: [u8; 2],
    deck: Deck,
    #[serde(skip, default = "fresh_rng")]
    rng: StdRng,
}

impl Game {
    pub fn new(settings: Settings) -> Result<Self, GameError> {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => fresh_rng(),
        };
        Self::with_rng(settings, rng)
    }

    pub fn with_rng(settings: Settings, mut rng: StdRng) -> Result<Self, GameError> {
        settings.validate()?;
        let board = generate_board(settings.layout, settings.rings, &mut rng);
        let deck = Deck::shuffled(&mut rng);
        let players = seat(&settings.players);
        Ok(Self {
            settings,
            board,
            players,
            dice: [0, 0],
            deck,
            rng,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn dice(&self) -> [u8; 2] {
        self.dice
    }

    pub fn player(&self, color: &str) -> Result<&Player, GameError> {
        self.players
            .get(color)
            .ok_or_else(|| GameError::UnknownPlayer(color.to_string()))
    }

    fn player_mut(&mut self, color: &str) -> Result<&mut Player, GameError> {
        self.players
            .get_mut(color)
            .ok_or_else(|| GameError::UnknownPlayer(color.to_string()))
    }

    pub fn deck_remaining(&self) -> usize {
        self.deck.remaining()
    }

    pub fn dev_cards(&self, color: &str) -> Result<&[DevCard], GameError> {
        Ok(&self.player(color)?.dev_cards)
    }

    pub fn apply(&mut self, color: &str, action: Action) -> Result<Applied, GameError> {
        self.player(color)?;
        tracing::debug!(color, action = action.kind(), "applying action");

        match action {
            Action::Click { x, y } => {
                let hit = self.board.click(Pixel::new(x, y), color);
                Ok(Applied {
                    changed: hit.is_some(),
                    detail: json!({ "x": x, "y": y, "hit": hit.map(describe_hit) }),
                    notice: None,
                })
            }
            Action::Roll => {
                let d1 = self.rng.random_range(1..=6u8);
                let d2 = self.rng.random_range(1..=6u8);
                self.dice = [d1, d2];
                let produced = self.produce(d1 + d2);
                Ok(Applied::changed(json!({ "dice": [d1, d2], "produced": produced })))
            }
            Action::NewBoard(kind) => {
                self.board = generate_board(kind, self.settings.rings, &mut self.rng);
                Ok(Applied::changed(json!({ "layout": kind, "rings": self.settings.rings })))
            }
            Action::Reset => {
                self.board = generate_board(self.settings.layout, self.settings.rings, &mut self.rng);
                self.players = seat(&self.settings.players);
                self.deck = Deck::shuffled(&mut self.rng);
                self.dice = [0, 0];
                Ok(Applied::changed(json!({ "layout": self.settings.layout })))
            }
            Action::DrawCard => {
                let card = self.deck.draw(color)?;
                self.player_mut(color)?.dev_cards.push(card);
                let wisdom = deck::pick_wisdom(&self.settings.wisdom, &mut self.rng).to_string();
                Ok(Applied {
                    changed: true,
                    detail: json!({ "remaining": self.deck.remaining() }),
                    notice: Some(Notice {
                        card: card.to_string(),
                        wisdom,
                    }),
                })
            }
            Action::UndoCard => {
                let draw = self.deck.undo()?;
                if let Some(holder) = self.players.get_mut(&draw.color) {
                    if let Some(pos) = holder.dev_cards.iter().rposition(|c| *c == draw.card) {
                        holder.dev_cards.remove(pos);
                    }
                }
                Ok(Applied::changed(json!({ "returned_by": draw.color })))
            }
            Action::Add(resource) => {
                self.player_mut(color)?.add(resource, 1)?;
                Ok(Applied::changed(json!({ "resource": resource })))
            }
            Action::Remove(resource) => {
                self.player_mut(color)?.remove(resource, 1)?;
                Ok(Applied::changed(json!({ "resource": resource })))
            }
        }
    }

    /// Hand out production for a dice sum. Returns how many cards moved.
    fn produce(&mut self, sum: u8) -> usize {
        if sum == DESERT_NUMBER {
            return 0;
        }
        let mut moved = 0;
        for (owner, resource) in self.board.production(sum) {
            match self.players.get_mut(&owner) {
                Some(p) => {
                    if p.add(resource, 1).is_ok() {
                        moved += 1;
                    }
                }
                None => tracing::warn!(%owner, "production for a color that is not seated"),
            }
        }
        moved
    }

    pub fn snapshot(&self, rev: i64) -> StateSnapshot {
        StateSnapshot {
            hexagons: self.board.hexagon_views(),
            vertices: self.board.vertex_views(),
            lines: self.board.line_views(),
            players: self
                .players
                .iter()
                .map(|(color, p)| (color.clone(), p.view()))
                .collect(),
            dice: self.dice,
            rev,
        }
    }
}

fn generate_board<R: Rng>(kind: LayoutKind, rings: u32, rng: &mut R) -> Board {
    Board::generate(kind, rings, CANVAS_WIDTH, CANVAS_HEIGHT, rng)
}

fn seat(colors: &[String]) -> BTreeMap<String, Player> {
    colors.iter().map(|c| (c.clone(), Player::new(c.clone()))).collect()
}

fn describe_hit(hit: Hit) -> serde_json::Value {
    match hit {
        Hit::Vertex(i) => json!({ "vertex": i }),
        Hit::Edge(i) => json!({ "line": i }),
        Hit::Tile(i) => json!({ "hexagon": i }),
    }
}
