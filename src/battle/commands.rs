//! Orders issued to units between ticks
//!
//! The AI controller emits the same command shape as the player, so every
//! order goes through one validation path in the simulation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::battle::coords::TilePos;
use crate::battle::interaction::{ActionKind, InteractionRejection};
use crate::core::types::{InteractableId, Tick, UnitId};

/// Why a command was refused. Refusals are logged, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandRejection {
    #[error("mission has already ended")]
    MissionOver,
    #[error("no unit with id {0:?}")]
    UnknownUnit(UnitId),
    #[error("unit {0:?} is down")]
    UnitDown(UnitId),
    #[error("tile {0:?} cannot be occupied")]
    NotOccupiable(TilePos),
    #[error("{0:?} is not a valid attack target")]
    InvalidTarget(UnitId),
    #[error("interaction refused: {0:?}")]
    Interaction(InteractionRejection),
    #[error("nothing to reload")]
    CannotReload,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerCommand {
    Move {
        unit: UnitId,
        to: TilePos,
    },
    Attack {
        unit: UnitId,
        target: UnitId,
    },
    Interact {
        unit: UnitId,
        interactable: InteractableId,
        action: ActionKind,
    },
    Reload {
        unit: UnitId,
    },
    Hold {
        unit: UnitId,
    },
    /// Request extraction; the mission ends once every living crew member is
    /// at an extraction point
    Retreat,
}

impl PlayerCommand {
    /// The unit this command addresses, None for squad-wide commands
    pub fn unit(&self) -> Option<UnitId> {
        match self {
            PlayerCommand::Move { unit, .. }
            | PlayerCommand::Attack { unit, .. }
            | PlayerCommand::Interact { unit, .. }
            | PlayerCommand::Reload { unit }
            | PlayerCommand::Hold { unit } => Some(*unit),
            PlayerCommand::Retreat => None,
        }
    }
}

/// A command to apply just before the given tick is processed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptedCommand {
    pub tick: Tick,
    pub command: PlayerCommand,
}
