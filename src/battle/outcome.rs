//! Mission outcome record handed back to the management layer
//!
//! Pure data. Nothing here mutates campaign state.

use serde::{Deserialize, Serialize};

use crate::battle::ai::{AiRole, AlarmState};
use crate::battle::units::{Ammo, Unit, UnitStatus};
use crate::core::config::MissionConfig;
use crate::core::types::{Faction, Tick, UnitId};

/// Terminal mission state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionResult {
    Victory,
    Defeat,
    Retreat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewReport {
    pub id: UnitId,
    pub name: String,
    pub status: UnitStatus,
    pub health: u32,
    pub rounds_fired: u32,
    pub ammo_remaining: Ammo,
    pub hits: u32,
    pub kills: u32,
    pub experience: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostileReport {
    pub id: UnitId,
    pub name: String,
    pub role: Option<AiRole>,
    pub status: UnitStatus,
    pub kills: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveReport {
    pub description: String,
    pub complete: bool,
}

/// Everything the management layer needs after a mission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionOutcome {
    pub mission: String,
    /// None when the run stopped before reaching a terminal state
    pub result: Option<MissionResult>,
    pub ticks: Tick,
    pub crew: Vec<CrewReport>,
    pub hostiles: Vec<HostileReport>,
    pub objectives: Vec<ObjectiveReport>,
    pub alarm: AlarmState,
}

impl MissionOutcome {
    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    pub fn crew_alive(&self) -> usize {
        self.crew
            .iter()
            .filter(|c| c.status != UnitStatus::Dead)
            .count()
    }

    pub fn objectives_complete(&self) -> usize {
        self.objectives.iter().filter(|o| o.complete).count()
    }
}

/// Experience for one crew member
///
/// Kills and hits always count; objective and survival awards only go to
/// those who walk out alive.
pub fn experience_for(unit: &Unit, objectives_complete: usize, config: &MissionConfig) -> u32 {
    let combat = unit.kills * config.xp_per_kill + unit.hits * config.xp_per_hit;
    if unit.is_alive() {
        combat + objectives_complete as u32 * config.xp_per_objective + config.xp_survival
    } else {
        combat
    }
}

/// Assemble the outcome from final unit state
pub fn build_outcome(
    mission: &str,
    result: Option<MissionResult>,
    ticks: Tick,
    units: &[Unit],
    objectives: Vec<ObjectiveReport>,
    alarm: AlarmState,
    config: &MissionConfig,
) -> MissionOutcome {
    let complete = objectives.iter().filter(|o| o.complete).count();

    let crew = units
        .iter()
        .filter(|u| u.faction == Faction::Friendly)
        .map(|u| CrewReport {
            id: u.id,
            name: u.name.clone(),
            status: u.status(),
            health: u.health,
            rounds_fired: u.rounds_fired,
            ammo_remaining: u.ammo,
            hits: u.hits,
            kills: u.kills,
            experience: experience_for(u, complete, config),
        })
        .collect();

    let hostiles = units
        .iter()
        .filter(|u| u.faction == Faction::Hostile)
        .map(|u| HostileReport {
            id: u.id,
            name: u.name.clone(),
            role: u.ai.as_ref().map(|ai| ai.role),
            status: u.status(),
            kills: u.kills,
        })
        .collect();

    MissionOutcome {
        mission: mission.to_string(),
        result,
        ticks,
        crew,
        hostiles,
        objectives,
        alarm,
    }
}
