//! AI's read-only view of the mission for one unit
//!
//! Hostile perception is per unit: line of sight within the unit's own vision
//! radius. It never consults the player's fog of war.

use crate::battle::coords::TilePos;
use crate::battle::grid_map::GridMap;
use crate::battle::interaction::InteractionRegistry;
use crate::battle::units::Unit;
use crate::core::config::SimConfig;
use crate::core::types::UnitId;

/// Enemies one unit can currently perceive, nearest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Perception {
    /// In line of sight and vision radius
    pub perceived: Vec<(UnitId, TilePos)>,
    /// The perceived enemies also inside weapon range
    pub targets: Vec<(UnitId, TilePos)>,
}

impl Perception {
    pub fn nearest_perceived(&self) -> Option<(UnitId, TilePos)> {
        self.perceived.first().copied()
    }

    pub fn nearest_target(&self) -> Option<(UnitId, TilePos)> {
        self.targets.first().copied()
    }

    pub fn has_targets(&self) -> bool {
        !self.targets.is_empty()
    }

    pub fn is_target(&self, id: UnitId) -> bool {
        self.targets.iter().any(|(t, _)| *t == id)
    }
}

/// Gather the enemies `unit` can see
pub fn perceive(unit: &Unit, units: &[Unit], map: &GridMap) -> Perception {
    let mut perceived: Vec<(i64, UnitId, TilePos)> = units
        .iter()
        .filter(|other| other.is_alive() && unit.faction.is_enemy_of(&other.faction))
        .filter(|other| unit.position.distance(&other.position) <= unit.vision_radius)
        .filter(|other| map.has_line_of_sight(unit.position, other.position))
        .map(|other| (unit.position.distance_sq(&other.position), other.id, other.position))
        .collect();
    perceived.sort_by_key(|(d, id, _)| (*d, *id));

    let targets = perceived
        .iter()
        .filter(|(_, _, pos)| unit.weapon.in_range(unit.position.distance(pos)))
        .map(|(_, id, pos)| (*id, *pos))
        .collect();

    Perception {
        perceived: perceived.into_iter().map(|(_, id, pos)| (id, pos)).collect(),
        targets,
    }
}

/// AI's decision-making context
pub struct DecisionContext<'a> {
    pub unit: &'a Unit,
    pub units: &'a [Unit],
    pub map: &'a GridMap,
    pub registry: &'a InteractionRegistry,
    pub config: &'a SimConfig,
    pub perception: &'a Perception,
}

impl<'a> DecisionContext<'a> {
    pub fn new(
        unit: &'a Unit,
        units: &'a [Unit],
        map: &'a GridMap,
        registry: &'a InteractionRegistry,
        config: &'a SimConfig,
        perception: &'a Perception,
    ) -> Self {
        Self {
            unit,
            units,
            map,
            registry,
            config,
            perception,
        }
    }

    pub fn get_unit(&self, id: UnitId) -> Option<&'a Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Occupiable and not held by another living unit
    pub fn is_free(&self, pos: TilePos) -> bool {
        self.map.is_occupiable(pos)
            && !self
                .units
                .iter()
                .any(|u| u.is_alive() && u.id != self.unit.id && u.position == pos)
    }

    /// Living enemies of this unit within `radius` of `center`
    pub fn enemies_near(&self, center: TilePos, radius: f32) -> usize {
        self.units
            .iter()
            .filter(|u| u.is_alive() && self.unit.faction.is_enemy_of(&u.faction))
            .filter(|u| u.position.distance(&center) <= radius)
            .count()
    }

    /// Living allies (self excluded) within `radius` of `center`
    pub fn allies_near(&self, center: TilePos, radius: f32) -> usize {
        self.units
            .iter()
            .filter(|u| u.is_alive() && u.id != self.unit.id && u.faction == self.unit.faction)
            .filter(|u| u.position.distance(&center) <= radius)
            .count()
    }

    /// Tiles within Chebyshev `radius` of this unit, row-major
    pub fn tiles_around(&self, radius: i32) -> Vec<TilePos> {
        let origin = self.unit.position;
        let mut tiles = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let pos = TilePos::new(origin.x + dx, origin.y + dy);
                if self.map.in_bounds(pos) {
                    tiles.push(pos);
                }
            }
        }
        tiles
    }
}
