//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Simulation tick counter
pub type Tick = u64;

/// Unique identifier for units, assigned in roster order at mission build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Unique identifier for interactables (doors, terminals, hazards)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InteractableId(pub u32);

impl InteractableId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Side a unit fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Friendly,
    Hostile,
    Neutral,
}

impl Faction {
    /// Returns true if the two factions fight each other
    pub fn is_enemy_of(&self, other: &Faction) -> bool {
        matches!(
            (self, other),
            (Faction::Friendly, Faction::Hostile) | (Faction::Hostile, Faction::Friendly)
        )
    }
}
