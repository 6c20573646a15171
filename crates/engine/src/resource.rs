use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Desert,
    Ore,
    Sheep,
    Wood,
    Brick,
    Wheat,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::Desert,
        Resource::Ore,
        Resource::Sheep,
        Resource::Wood,
        Resource::Brick,
        Resource::Wheat,
    ];

    /// Everything a player can hold.
    pub const TRADABLE: [Resource; 5] = [
        Resource::Ore,
        Resource::Sheep,
        Resource::Wood,
        Resource::Brick,
        Resource::Wheat,
    ];

    pub const fn color(self) -> &'static str {
        match self {
            Resource::Desert => "#F4A460",
            Resource::Ore => "#7D7D7D",
            Resource::Sheep => "#9ACD32",
            Resource::Wood => "#228B22",
            Resource::Brick => "#B22222",
            Resource::Wheat => "#FFD700",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Resource::Desert => "desert",
            Resource::Ore => "ore",
            Resource::Sheep => "sheep",
            Resource::Wood => "wood",
            Resource::Brick => "brick",
            Resource::Wheat => "wheat",
        }
    }

    /// Cycles through all six kinds, desert included.
    pub fn next(self) -> Resource {
        let idx = Self::ALL.iter().position(|r| *r == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn is_tradable(self) -> bool {
        self != Resource::Desert
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| GameError::UnknownResource(s.to_string()))
    }
}

const RESOURCE_PRIORITY: [Resource; 5] = [
    Resource::Sheep,
    Resource::Wood,
    Resource::Wheat,
    Resource::Brick,
    Resource::Ore,
];

const NUMBER_PRIORITY: [u8; 10] = [6, 8, 5, 9, 4, 10, 3, 11, 2, 12];

/// Number the desert carries; rolling it produces nothing.
pub const DESERT_NUMBER: u8 = 7;

/// Resource and number for each of `n` tiles, in random order.
///
/// There is exactly one desert, and it always carries the 7. The remaining
/// tiles cycle through the resource and number priority lists, so small boards
/// get the common kinds and the likely rolls first. Resources and numbers are
/// shuffled independently of each other.
pub fn allocate<R: Rng>(n: usize, rng: &mut R) -> Vec<(Resource, u8)> {
    if n == 0 {
        return Vec::new();
    }
    let mut resources: Vec<Resource> = (0..n - 1)
        .map(|i| RESOURCE_PRIORITY[i % RESOURCE_PRIORITY.len()])
        .collect();
    let mut numbers: Vec<u8> = (0..n - 1)
        .map(|i| NUMBER_PRIORITY[i % NUMBER_PRIORITY.len()])
        .collect();
    resources.shuffle(rng);
    numbers.shuffle(rng);

    let mut tiles: Vec<(Resource, u8)> = resources.into_iter().zip(numbers).collect();
    let desert_at = rng.random_range(0..n);
    tiles.insert(desert_at, (Resource::Desert, DESERT_NUMBER));
    tiles
}
