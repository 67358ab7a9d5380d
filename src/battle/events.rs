//! Typed notifications produced while a tick is processed
//!
//! The simulation appends to the log during `process_tick` and the caller
//! drains it afterwards, so the tick boundary stays a clean checkpoint.

use serde::{Deserialize, Serialize};

use crate::battle::coords::TilePos;
use crate::battle::interaction::InteractableState;
use crate::battle::outcome::MissionResult;
use crate::battle::units::ChannelKind;
use crate::core::types::{InteractableId, Tick, UnitId};

/// Log entry for mission events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionEvent {
    pub tick: Tick,
    pub event_type: MissionEventType,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MissionEventType {
    AttackResolved {
        attacker: UnitId,
        target: UnitId,
        hit: bool,
        damage: u32,
    },
    UnitDamaged {
        unit: UnitId,
        amount: u32,
    },
    UnitKilled {
        unit: UnitId,
        by: Option<UnitId>,
    },
    ReloadStarted {
        unit: UnitId,
    },
    ReloadCompleted {
        unit: UnitId,
    },
    UnitArrived {
        unit: UnitId,
        at: TilePos,
    },
    DestinationUnreachable {
        unit: UnitId,
        destination: TilePos,
    },
    ChannelStarted {
        unit: UnitId,
        interactable: InteractableId,
        kind: ChannelKind,
    },
    ChannelInterrupted {
        unit: UnitId,
        interactable: InteractableId,
    },
    ChannelCompleted {
        unit: UnitId,
        interactable: InteractableId,
        kind: ChannelKind,
    },
    InteractableChanged {
        interactable: InteractableId,
        state: InteractableState,
    },
    HazardTriggered {
        interactable: InteractableId,
        by: UnitId,
    },
    UnitAlerted {
        unit: UnitId,
    },
    AlarmRaised {
        by: UnitId,
    },
    ObjectiveCompleted {
        index: usize,
    },
    RetreatOrdered,
    MissionEnded {
        result: MissionResult,
    },
}

/// Events accumulated since the last drain
#[derive(Debug, Clone, Default)]
pub struct MissionEventLog {
    events: Vec<MissionEvent>,
}

impl MissionEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event_type: MissionEventType, description: String, tick: Tick) {
        self.events.push(MissionEvent {
            tick,
            event_type,
            description,
        });
    }

    /// Take every pending event, oldest first
    pub fn drain(&mut self) -> Vec<MissionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MissionEvent> {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_log() {
        let mut log = MissionEventLog::new();
        log.push(MissionEventType::RetreatOrdered, "Retreat ordered".into(), 3);
        log.push(
            MissionEventType::UnitAlerted { unit: UnitId(2) },
            "Guard alerted".into(),
            4,
        );
        assert_eq!(log.len(), 2);

        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].tick, 3);
        assert!(log.is_empty());
    }
}
