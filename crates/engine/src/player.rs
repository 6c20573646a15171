use hexboard_protocol::PlayerView;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::deck::DevCard;
use crate::error::GameError;
use crate::resource::Resource;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub color: String,
    resources: BTreeMap<Resource, u32>,
    pub dev_cards: Vec<DevCard>,
}

impl Player {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            resources: Resource::TRADABLE.iter().map(|r| (*r, 0)).collect(),
            dev_cards: Vec::new(),
        }
    }

    pub fn count(&self, resource: Resource) -> u32 {
        self.resources.get(&resource).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.resources.values().sum()
    }

    pub fn add(&mut self, resource: Resource, n: u32) -> Result<(), GameError> {
        if !resource.is_tradable() {
            return Err(GameError::UnknownResource(resource.to_string()));
        }
        *self.resources.entry(resource).or_insert(0) += n;
        Ok(())
    }

    pub fn remove(&mut self, resource: Resource, n: u32) -> Result<(), GameError> {
        let held = self.count(resource);
        if !resource.is_tradable() || held < n {
            return Err(GameError::InsufficientResource {
                color: self.color.clone(),
                resource: resource.to_string(),
            });
        }
        self.resources.insert(resource, held - n);
        Ok(())
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            resources: Resource::TRADABLE
                .iter()
                .map(|r| (r.name().to_string(), self.count(*r)))
                .collect(),
            num_cards: self.total(),
            dev_cards: u32::try_from(self.dev_cards.len()).unwrap_or(u32::MAX),
        }
    }
}
