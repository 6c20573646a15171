//! Development card deck with an undo stack of past draws.

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DevCard {
    Knight,
    #[serde(rename = "Victory Point")]
    VictoryPoint,
    Monopoly,
    #[serde(rename = "Year of Plenty")]
    YearOfPlenty,
    #[serde(rename = "Road Building")]
    RoadBuilding,
}

impl DevCard {
    pub const fn name(self) -> &'static str {
        match self {
            DevCard::Knight => "Knight",
            DevCard::VictoryPoint => "Victory Point",
            DevCard::Monopoly => "Monopoly",
            DevCard::YearOfPlenty => "Year of Plenty",
            DevCard::RoadBuilding => "Road Building",
        }
    }
}

impl fmt::Display for DevCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const COMPOSITION: [(DevCard, usize); 5] = [
    (DevCard::Knight, 14),
    (DevCard::VictoryPoint, 5),
    (DevCard::Monopoly, 2),
    (DevCard::YearOfPlenty, 2),
    (DevCard::RoadBuilding, 2),
];

pub const DEFAULT_WISDOM: [&str; 3] = [
    "Never underestimate the power of sheep!",
    "Bricks are dumb.",
    "This game is actually just luck.",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub card: DevCard,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<DevCard>,
    drawn: Vec<Draw>,
}

impl Deck {
    pub fn shuffled<R: Rng>(rng: &mut R) -> Self {
        let mut cards: Vec<DevCard> = COMPOSITION
            .iter()
            .flat_map(|(card, n)| std::iter::repeat(*card).take(*n))
            .collect();
        cards.shuffle(rng);
        Self {
            cards,
            drawn: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn draw(&mut self, color: &str) -> Result<DevCard, GameError> {
        let card = self.cards.pop().ok_or(GameError::DeckEmpty)?;
        self.drawn.push(Draw {
            card,
            color: color.to_string(),
        });
        Ok(card)
    }

    /// Put the most recent draw back on top of the deck.
    pub fn undo(&mut self) -> Result<Draw, GameError> {
        let last = self.drawn.pop().ok_or(GameError::NothingToUndo)?;
        self.cards.push(last.card);
        Ok(last)
    }
}

pub fn pick_wisdom<'a, R: Rng>(lines: &'a [String], rng: &mut R) -> &'a str {
    lines.choose(rng).map(String::as_str).unwrap_or(DEFAULT_WISDOM[0])
}
