//! Mission definitions and assembly
//!
//! A mission file names the map template, the crew and hostile rosters,
//! objectives, and an optional command script. `build` validates everything
//! against the weapon catalog and the parsed map before any tick runs.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::battle::ai::{AiProfile, AiRole};
use crate::battle::commands::ScriptedCommand;
use crate::battle::coords::TilePos;
use crate::battle::execution::Simulation;
use crate::battle::interaction::{InteractableKind, InteractionRegistry};
use crate::battle::template::parse_template;
use crate::battle::units::Unit;
use crate::battle::weapons::WeaponCatalog;
use crate::core::config::SimConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{Faction, InteractableId, UnitId};

fn default_health() -> u32 {
    100
}

fn default_move_speed() -> f32 {
    4.0
}

fn default_vision() -> f32 {
    8.0
}

fn default_link_faction() -> Faction {
    Faction::Friendly
}

/// One crew member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewSpec {
    pub name: String,
    pub position: TilePos,
    pub weapon: String,
    #[serde(default = "default_health")]
    pub max_health: u32,
    #[serde(default)]
    pub aim_bonus: f32,
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
    #[serde(default = "default_vision")]
    pub vision_radius: f32,
    /// Overrides the weapon's base accuracy
    #[serde(default)]
    pub accuracy: Option<f32>,
    /// Rounds loaded at mission start, capped at the magazine size
    #[serde(default)]
    pub magazine: Option<u32>,
    /// Spare rounds; two magazines when omitted
    #[serde(default)]
    pub reserve: Option<u32>,
}

/// One hostile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostileSpec {
    #[serde(default)]
    pub name: Option<String>,
    /// Falls back to the next unused `E` marker on the map
    #[serde(default)]
    pub position: Option<TilePos>,
    pub role: AiRole,
    pub weapon: String,
    #[serde(default)]
    pub patrol: Vec<TilePos>,
    #[serde(default = "default_health")]
    pub max_health: u32,
    #[serde(default)]
    pub aim_bonus: f32,
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
    #[serde(default = "default_vision")]
    pub vision_radius: f32,
    #[serde(default)]
    pub accuracy: Option<f32>,
    #[serde(default)]
    pub magazine: Option<u32>,
    #[serde(default)]
    pub reserve: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectiveSpec {
    HackTerminal { at: TilePos },
    Eliminate,
}

/// Doors a terminal releases when hacked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalLink {
    pub terminal: TilePos,
    #[serde(default)]
    pub doors: Vec<TilePos>,
    #[serde(default = "default_link_faction")]
    pub faction: Faction,
}

/// A mission as written in a data file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionSpec {
    pub name: String,
    #[serde(default)]
    pub seed: u64,
    pub map: Vec<String>,
    pub crew: Vec<CrewSpec>,
    #[serde(default)]
    pub hostiles: Vec<HostileSpec>,
    #[serde(default)]
    pub objectives: Vec<ObjectiveSpec>,
    /// Crew spawn tiles when empty
    #[serde(default)]
    pub extraction: Vec<TilePos>,
    #[serde(default)]
    pub terminal_links: Vec<TerminalLink>,
    #[serde(default)]
    pub script: Vec<ScriptedCommand>,
}

/// An objective resolved against the built map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    HackTerminal { terminal: InteractableId, at: TilePos },
    Eliminate,
}

impl Objective {
    pub fn describe(&self) -> String {
        match self {
            Objective::HackTerminal { at, .. } => format!("Hack the terminal at ({}, {})", at.x, at.y),
            Objective::Eliminate => "Eliminate all hostiles".to_string(),
        }
    }
}

/// Per-unit numbers shared by crew and hostile entries
struct Loadout<'a> {
    weapon: &'a str,
    max_health: u32,
    aim_bonus: f32,
    move_speed: f32,
    vision_radius: f32,
    accuracy: Option<f32>,
    magazine: Option<u32>,
    reserve: Option<u32>,
}

impl<'a> From<&'a CrewSpec> for Loadout<'a> {
    fn from(spec: &'a CrewSpec) -> Self {
        Self {
            weapon: &spec.weapon,
            max_health: spec.max_health,
            aim_bonus: spec.aim_bonus,
            move_speed: spec.move_speed,
            vision_radius: spec.vision_radius,
            accuracy: spec.accuracy,
            magazine: spec.magazine,
            reserve: spec.reserve,
        }
    }
}

impl<'a> From<&'a HostileSpec> for Loadout<'a> {
    fn from(spec: &'a HostileSpec) -> Self {
        Self {
            weapon: &spec.weapon,
            max_health: spec.max_health,
            aim_bonus: spec.aim_bonus,
            move_speed: spec.move_speed,
            vision_radius: spec.vision_radius,
            accuracy: spec.accuracy,
            magazine: spec.magazine,
            reserve: spec.reserve,
        }
    }
}

fn equip(
    id: UnitId,
    name: String,
    faction: Faction,
    position: TilePos,
    loadout: Loadout,
    weapons: &WeaponCatalog,
) -> Result<Unit> {
    let mut weapon = weapons.resolve(loadout.weapon)?;
    if let Some(accuracy) = loadout.accuracy {
        weapon.accuracy = accuracy.clamp(0.0, 1.0);
    }
    let magazine_size = weapon.magazine_size;

    let mut unit = Unit::new(id, name, faction, position, loadout.max_health, weapon);
    unit.aim_bonus = loadout.aim_bonus;
    unit.move_speed = loadout.move_speed;
    unit.vision_radius = loadout.vision_radius;
    unit.ammo.loaded = loadout.magazine.unwrap_or(magazine_size).min(magazine_size);
    unit.ammo.reserve = loadout.reserve.unwrap_or(magazine_size * 2);
    Ok(unit)
}

impl MissionSpec {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Load a mission file; `.json` files are read as JSON, anything else as TOML
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_toml_str(&contents),
        }
    }

    /// Validate the mission and assemble a ready-to-run simulation
    pub fn build(&self, weapons: &WeaponCatalog, config: SimConfig) -> Result<Simulation> {
        config.validate()?;
        let layout = parse_template(self.map.as_slice(), config.combat.wall_cover_tier)?;
        let map = layout.map;
        let mut registry = InteractionRegistry::from_spawns(&layout.interactables, &config.interaction);

        let mut units: Vec<Unit> = Vec::with_capacity(self.crew.len() + self.hostiles.len());
        let mut taken: Vec<TilePos> = Vec::new();
        let mut check_spawn = |name: &str, pos: TilePos| -> Result<()> {
            if !map.is_occupiable(pos) || taken.contains(&pos) {
                return Err(SimError::BlockedSpawn {
                    name: name.to_string(),
                    pos,
                });
            }
            taken.push(pos);
            Ok(())
        };

        for spec in &self.crew {
            check_spawn(&spec.name, spec.position)?;
            let id = UnitId(units.len() as u32);
            units.push(equip(
                id,
                spec.name.clone(),
                Faction::Friendly,
                spec.position,
                spec.into(),
                weapons,
            )?);
        }

        let mut markers = layout.hostile_spawns.iter().copied();
        for (index, spec) in self.hostiles.iter().enumerate() {
            let name = spec
                .name
                .clone()
                .unwrap_or_else(|| format!("{:?} {}", spec.role, index + 1));
            let position = match spec.position {
                Some(pos) => pos,
                None => markers
                    .next()
                    .ok_or_else(|| SimError::MissingSpawnMarker(name.clone()))?,
            };
            check_spawn(&name, position)?;

            let id = UnitId(units.len() as u32);
            let mut unit = equip(id, name, Faction::Hostile, position, spec.into(), weapons)?;
            unit.ai = Some(
                AiProfile::new(spec.role)
                    .with_post(position)
                    .with_patrol(spec.patrol.clone()),
            );
            units.push(unit);
        }

        for link in &self.terminal_links {
            let terminal = registry
                .at(link.terminal)
                .filter(|i| matches!(i.kind, InteractableKind::Terminal { .. }))
                .map(|i| i.id)
                .ok_or(SimError::InvalidTerminalLink(link.terminal))?;
            let doors = link
                .doors
                .iter()
                .map(|pos| {
                    registry
                        .at(*pos)
                        .filter(|i| matches!(i.kind, InteractableKind::Door { .. }))
                        .map(|i| i.id)
                        .ok_or(SimError::InvalidTerminalLink(*pos))
                })
                .collect::<Result<Vec<_>>>()?;
            debug!(terminal = terminal.0, doors = doors.len(), "Linked terminal");
            registry.configure_terminal(terminal, link.faction, doors);
        }

        let objectives = self
            .objectives
            .iter()
            .map(|objective| match objective {
                ObjectiveSpec::HackTerminal { at } => registry
                    .at(*at)
                    .filter(|i| matches!(i.kind, InteractableKind::Terminal { .. }))
                    .map(|i| Objective::HackTerminal {
                        terminal: i.id,
                        at: *at,
                    })
                    .ok_or_else(|| SimError::UnknownObjectiveTarget {
                        name: self.name.clone(),
                        pos: *at,
                    }),
                ObjectiveSpec::Eliminate => Ok(Objective::Eliminate),
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            mission = %self.name,
            crew = self.crew.len(),
            hostiles = self.hostiles.len(),
            interactables = registry.len(),
            "Mission assembled"
        );

        Ok(Simulation::new(self.name.clone(), map, units, registry, config, self.seed)
            .with_objectives(objectives)
            .with_extraction(self.extraction.clone()))
    }
}
