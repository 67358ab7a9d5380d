//! Player-perspective fog of war
//!
//! Only living friendly units contribute. Hostile perception goes through the
//! same line-of-sight primitive in the AI module and never touches this field.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::battle::coords::TilePos;
use crate::battle::grid_map::GridMap;
use crate::battle::units::Unit;
use crate::core::types::Faction;

/// Fog state of a single tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FogState {
    #[default]
    Unknown, // Never seen
    Revealed, // Seen before, terrain remembered, occupants not
    Visible,  // Currently in line of sight
}

/// Tiles one viewer can see from `from` within `radius`
///
/// Circular range test, then a Bresenham line per candidate tile.
pub fn visible_tiles(map: &GridMap, from: TilePos, radius: f32) -> Vec<TilePos> {
    if !map.in_bounds(from) || radius < 0.0 {
        return Vec::new();
    }
    let reach = radius.floor() as i32;
    let radius_sq = (radius * radius) as f64;
    let mut results = Vec::new();

    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let pos = TilePos::new(from.x + dx, from.y + dy);
            if !map.in_bounds(pos) {
                continue;
            }
            if ((dx * dx + dy * dy) as f64) > radius_sq {
                continue;
            }
            if map.has_line_of_sight(from, pos) {
                results.push(pos);
            }
        }
    }
    results
}

/// Per-tile fog memory for the player's squad
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityField {
    width: u32,
    height: u32,
    states: Vec<FogState>,
}

impl VisibilityField {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            states: vec![FogState::Unknown; (width * height) as usize],
        }
    }

    /// Sized to match a map
    pub fn for_map(map: &GridMap) -> Self {
        Self::new(map.width(), map.height())
    }

    fn index(&self, pos: TilePos) -> Option<usize> {
        (pos.x >= 0 && pos.y >= 0 && pos.x < self.width as i32 && pos.y < self.height as i32)
            .then(|| pos.y as usize * self.width as usize + pos.x as usize)
    }

    /// Fog state of a tile; out of bounds is always Unknown
    pub fn state(&self, pos: TilePos) -> FogState {
        self.index(pos)
            .map(|i| self.states[i])
            .unwrap_or(FogState::Unknown)
    }

    pub fn is_tile_visible(&self, pos: TilePos) -> bool {
        self.state(pos) == FogState::Visible
    }

    pub fn visible_count(&self) -> usize {
        self.states.iter().filter(|s| **s == FogState::Visible).count()
    }

    /// Union of every living friendly unit's sight
    pub fn calculate_visible(map: &GridMap, units: &[Unit]) -> AHashSet<TilePos> {
        let mut visible = AHashSet::new();
        for unit in units {
            if unit.faction != Faction::Friendly || !unit.is_alive() {
                continue;
            }
            visible.extend(visible_tiles(map, unit.position, unit.vision_radius));
        }
        visible
    }

    /// Update: demote old Visible to Revealed, then mark the new Visible set
    pub fn update(&mut self, new_visible: &AHashSet<TilePos>) {
        for state in self.states.iter_mut() {
            if *state == FogState::Visible {
                *state = FogState::Revealed;
            }
        }
        for pos in new_visible {
            if let Some(i) = self.index(*pos) {
                self.states[i] = FogState::Visible;
            }
        }
    }

    /// Recompute from the current unit positions
    pub fn recompute(&mut self, map: &GridMap, units: &[Unit]) {
        let visible = Self::calculate_visible(map, units);
        self.update(&visible);
    }
}
