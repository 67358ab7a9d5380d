//! Battle system - a single tactical mission on a square grid
//!
//! Cover is directional, vision is scarce, and interactions take time.
//!
//! Key pieces:
//! - The grid carries per-direction cover derived from walls and obstacles
//! - The squad shares one fog-of-war field; hostiles perceive individually
//! - Hacking, unlocking, and disarming are channels any interruption resets
//! - One seeded RNG drives every roll, so a seed and a script replay exactly

pub mod ai;
pub mod commands;
pub mod constants;
pub mod coords;
pub mod events;
pub mod execution;
pub mod grid_map;
pub mod interaction;
pub mod mission;
pub mod movement;
pub mod outcome;
pub mod pathfinding;
pub mod ranged;
pub mod template;
pub mod units;
pub mod visibility;
pub mod weapons;

// Re-exports for convenient access
pub use ai::{AiController, AiProfile, AiRole, AlarmState, Awareness};
pub use commands::{CommandRejection, PlayerCommand, ScriptedCommand};
pub use constants::*;
pub use coords::{CompassDirection, TilePos};
pub use events::{MissionEvent, MissionEventLog, MissionEventType};
pub use execution::Simulation;
pub use grid_map::{CoverTier, GridMap, Tile, TileKind};
pub use interaction::{
    ActionKind, DoorState, HazardState, Interactable, InteractableKind, InteractableState,
    InteractionEffect, InteractionRegistry, InteractionRejection, TerminalState,
};
pub use mission::{CrewSpec, HostileSpec, MissionSpec, Objective, ObjectiveSpec, TerminalLink};
pub use movement::{advance_movement, MovementOutcome};
pub use outcome::{CrewReport, HostileReport, MissionOutcome, MissionResult, ObjectiveReport};
pub use pathfinding::{find_path, find_path_avoiding, path_cost};
pub use ranged::{check_attack, execute_attack, hit_chance, AttackRejection, AttackResult};
pub use template::{parse_template, MapLayout};
pub use units::{Ammo, ChannelKind, ChannelState, ChanneledAction, DamageReport, Unit, UnitStatus};
pub use visibility::{FogState, VisibilityField};
pub use weapons::{WeaponCatalog, WeaponDef};
