//! Hostile AI: perception, detection, and role-based behaviour
//!
//! Architecture: data + dispatch
//! - AiProfile holds per-unit role and memory (awareness, last known threat)
//! - DecisionContext provides a read-only view of the mission for one unit
//! - behaviors::decide turns the context into at most one command per tick
//!
//! Commands come back in the same shape the player uses and are applied by the
//! simulation, so the AI never mutates units or the map directly.

pub mod behaviors;
pub mod decision_context;

pub use decision_context::{perceive, DecisionContext, Perception};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::battle::commands::PlayerCommand;
use crate::battle::coords::TilePos;
use crate::battle::grid_map::GridMap;
use crate::battle::interaction::InteractionRegistry;
use crate::battle::units::Unit;
use crate::core::config::SimConfig;
use crate::core::types::{Tick, UnitId};

/// Static behaviour assigned at mission build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiRole {
    Guard,
    Flanker,
    Support,
}

/// Per-unit detection flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Awareness {
    #[default]
    Unaware,
    Alert,
}

/// Mission-wide alarm, raised once and never lowered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlarmState {
    #[default]
    Quiet,
    Alerted,
}

/// AI state carried on a hostile unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiProfile {
    pub role: AiRole,
    pub awareness: Awareness,
    /// Where an enemy was last perceived
    pub last_known: Option<TilePos>,
    pub patrol: Vec<TilePos>,
    pub patrol_index: usize,
    /// Spawn position, returned to when there is nothing else to do
    pub post: Option<TilePos>,
}

impl AiProfile {
    pub fn new(role: AiRole) -> Self {
        Self {
            role,
            awareness: Awareness::Unaware,
            last_known: None,
            patrol: Vec::new(),
            patrol_index: 0,
            post: None,
        }
    }

    pub fn with_patrol(mut self, patrol: Vec<TilePos>) -> Self {
        self.patrol = patrol;
        self
    }

    pub fn with_post(mut self, post: TilePos) -> Self {
        self.post = Some(post);
        self
    }

    /// Current patrol waypoint
    pub fn patrol_target(&self) -> Option<TilePos> {
        if self.patrol.is_empty() {
            None
        } else {
            self.patrol.get(self.patrol_index % self.patrol.len()).copied()
        }
    }

    fn advance_patrol(&mut self) {
        if !self.patrol.is_empty() {
            self.patrol_index = (self.patrol_index + 1) % self.patrol.len();
        }
    }

    /// Forget a goal that turned out to be unreachable
    pub fn abandon(&mut self, destination: TilePos) {
        if self.last_known == Some(destination) {
            self.last_known = None;
        }
        if self.patrol_target() == Some(destination) {
            self.advance_patrol();
        }
    }

    pub fn is_alert(&self) -> bool {
        self.awareness == Awareness::Alert
    }
}

/// Something the AI pass wants reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiNotice {
    Alerted { unit: UnitId },
    AlarmRaised { by: UnitId },
}

/// Result of one AI pass
#[derive(Debug, Clone, Default)]
pub struct AiPass {
    pub commands: Vec<PlayerCommand>,
    pub notices: Vec<AiNotice>,
}

/// Drives every AI-controlled unit and owns the mission alarm
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiController {
    alarm: AlarmState,
    alarm_raised_at: Option<Tick>,
}

impl AiController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alarm(&self) -> AlarmState {
        self.alarm
    }

    pub fn alarm_raised_at(&self) -> Option<Tick> {
        self.alarm_raised_at
    }

    /// One decision pass over every living AI unit, in roster order
    ///
    /// Perception updates the unit's own memory; the decision itself only
    /// reads the mission and returns commands.
    pub fn run_pass<R: Rng + ?Sized>(
        &mut self,
        units: &mut [Unit],
        map: &GridMap,
        registry: &InteractionRegistry,
        config: &SimConfig,
        tick: Tick,
        rng: &mut R,
    ) -> AiPass {
        let mut pass = AiPass::default();

        for index in 0..units.len() {
            if !units[index].is_alive() || units[index].ai.is_none() {
                continue;
            }

            let perception = perceive(&units[index], units, map);
            self.update_memory(&mut units[index], &perception, tick, &mut pass);

            let unit = &units[index];
            let ctx = DecisionContext::new(unit, units, map, registry, config, &perception);
            if let Some(command) = behaviors::decide(&ctx, rng) {
                debug!(unit = unit.id.0, ?command, "AI command");
                pass.commands.push(command);
            }
        }

        pass
    }

    fn update_memory(
        &mut self,
        unit: &mut Unit,
        perception: &Perception,
        tick: Tick,
        pass: &mut AiPass,
    ) {
        let id = unit.id;
        let position = unit.position;
        let Some(profile) = unit.ai.as_mut() else {
            return;
        };

        if let Some(nearest) = perception.nearest_perceived() {
            profile.last_known = Some(nearest.1);
            if profile.awareness == Awareness::Unaware {
                profile.awareness = Awareness::Alert;
                debug!(unit = id.0, "AI unit alerted");
                pass.notices.push(AiNotice::Alerted { unit: id });
            }
            if self.alarm == AlarmState::Quiet {
                self.alarm = AlarmState::Alerted;
                self.alarm_raised_at = Some(tick);
                info!(unit = id.0, tick, "Alarm raised");
                pass.notices.push(AiNotice::AlarmRaised { by: id });
            }
            return;
        }

        if profile.last_known == Some(position) {
            profile.last_known = None;
        }
        if profile.patrol_target() == Some(position) {
            profile.advance_patrol();
        }
    }
}
