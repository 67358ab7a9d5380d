//! Interactable objects and the registry that drives their state machines
//!
//! Door:     Closed <-> Open (instant), Locked --unlock channel--> Open
//! Terminal: Idle --hack--> InProgress --channel complete--> Complete
//! Hazard:   Armed --trigger (instant, area damage)--> Triggered
//!           Armed --disable channel--> Disabled
//!
//! Every entry point can be called speculatively: failures come back as an
//! `InteractionRejection` and leave all state untouched.

use serde::{Deserialize, Serialize};

use crate::battle::coords::TilePos;
use crate::battle::grid_map::GridMap;
use crate::battle::template::{InteractableSpawn, InteractableSpawnKind};
use crate::battle::units::{ChannelKind, ChanneledAction, Unit};
use crate::core::config::InteractionConfig;
use crate::core::types::{Faction, InteractableId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorState {
    Closed,
    Open,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalState {
    Idle,
    InProgress,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardState {
    Armed,
    Triggered,
    Disabled,
}

/// Kind discriminator with kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InteractableKind {
    Door {
        state: DoorState,
    },
    Terminal {
        state: TerminalState,
        /// Faction allowed to hack this terminal
        unlocks_for: Faction,
        /// Doors released from Locked when the hack completes
        linked_doors: Vec<InteractableId>,
    },
    Hazard {
        state: HazardState,
        radius: f32,
        damage: u32,
    },
}

/// Snapshot of an interactable's state, used in notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractableState {
    Door(DoorState),
    Terminal(TerminalState),
    Hazard(HazardState),
}

/// Actions a unit may take on an interactable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Open,
    Close,
    Unlock,
    Hack,
    Trigger,
    Disable,
}

impl ActionKind {
    /// The channel this action runs as, None for instantaneous actions
    pub fn channel(&self) -> Option<ChannelKind> {
        match self {
            ActionKind::Unlock => Some(ChannelKind::Unlock),
            ActionKind::Hack => Some(ChannelKind::Hack),
            ActionKind::Disable => Some(ChannelKind::Disable),
            ActionKind::Open | ActionKind::Close | ActionKind::Trigger => None,
        }
    }
}

/// Why an interaction was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionRejection {
    UnknownInteractable,
    UnitDown,
    NotAdjacent,
    ActionUnavailable,
    Busy,
    DoorwayOccupied,
}

/// Side effect the orchestrator must apply or report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InteractionEffect {
    StateChanged {
        id: InteractableId,
        state: InteractableState,
    },
    ChannelStarted {
        id: InteractableId,
        kind: ChannelKind,
        duration: u32,
    },
    AreaDamage {
        id: InteractableId,
        center: TilePos,
        radius: f32,
        amount: u32,
    },
}

/// A door, terminal, or hazard placed on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interactable {
    pub id: InteractableId,
    pub position: TilePos,
    pub kind: InteractableKind,
}

impl Interactable {
    pub fn state(&self) -> InteractableState {
        match &self.kind {
            InteractableKind::Door { state } => InteractableState::Door(*state),
            InteractableKind::Terminal { state, .. } => InteractableState::Terminal(*state),
            InteractableKind::Hazard { state, .. } => InteractableState::Hazard(*state),
        }
    }

    fn changed(&self) -> InteractionEffect {
        InteractionEffect::StateChanged {
            id: self.id,
            state: self.state(),
        }
    }

    /// Actions the current state admits for this unit, ignoring distance
    pub fn admitted_actions(&self, unit: &Unit) -> Vec<ActionKind> {
        match &self.kind {
            InteractableKind::Door { state } => match state {
                DoorState::Closed => vec![ActionKind::Open],
                DoorState::Open => vec![ActionKind::Close],
                DoorState::Locked => vec![ActionKind::Unlock],
            },
            InteractableKind::Terminal {
                state, unlocks_for, ..
            } => match state {
                TerminalState::Idle if *unlocks_for == unit.faction => vec![ActionKind::Hack],
                _ => Vec::new(),
            },
            InteractableKind::Hazard { state, .. } => match state {
                HazardState::Armed => vec![ActionKind::Trigger, ActionKind::Disable],
                HazardState::Triggered | HazardState::Disabled => Vec::new(),
            },
        }
    }
}

/// Owns every interactable for the mission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionRegistry {
    interactables: Vec<Interactable>,
}

impl InteractionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create interactables from template placements; terminals default to the
    /// friendly faction and hazards take their radius and damage from config.
    pub fn from_spawns(spawns: &[InteractableSpawn], config: &InteractionConfig) -> Self {
        let mut registry = Self::new();
        for spawn in spawns {
            let kind = match spawn.kind {
                InteractableSpawnKind::Door { locked } => InteractableKind::Door {
                    state: if locked {
                        DoorState::Locked
                    } else {
                        DoorState::Closed
                    },
                },
                InteractableSpawnKind::Terminal => InteractableKind::Terminal {
                    state: TerminalState::Idle,
                    unlocks_for: Faction::Friendly,
                    linked_doors: Vec::new(),
                },
                InteractableSpawnKind::Hazard => InteractableKind::Hazard {
                    state: HazardState::Armed,
                    radius: config.hazard_radius,
                    damage: config.hazard_damage,
                },
            };
            registry.add(spawn.position, kind);
        }
        registry
    }

    /// Register an interactable and return its id
    pub fn add(&mut self, position: TilePos, kind: InteractableKind) -> InteractableId {
        let id = InteractableId(self.interactables.len() as u32);
        self.interactables.push(Interactable { id, position, kind });
        id
    }

    /// Push door states into the map's door overlay
    pub fn sync_doors(&self, map: &mut GridMap) {
        for interactable in &self.interactables {
            if let InteractableKind::Door { state } = interactable.kind {
                map.set_door_open(interactable.position, state == DoorState::Open);
            }
        }
    }

    pub fn get(&self, id: InteractableId) -> Option<&Interactable> {
        self.interactables.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: InteractableId) -> Option<&mut Interactable> {
        self.interactables.get_mut(id.0 as usize)
    }

    pub fn at(&self, pos: TilePos) -> Option<&Interactable> {
        self.interactables.iter().find(|i| i.position == pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interactable> {
        self.interactables.iter()
    }

    pub fn len(&self) -> usize {
        self.interactables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactables.is_empty()
    }

    /// Adjacent (Chebyshev <= 1) and the current state admits some action
    pub fn can_interact(&self, unit: &Unit, id: InteractableId) -> bool {
        !self.available_actions(unit, id).is_empty()
    }

    /// Actions this unit could begin right now
    pub fn available_actions(&self, unit: &Unit, id: InteractableId) -> Vec<ActionKind> {
        let Some(interactable) = self.get(id) else {
            return Vec::new();
        };
        if !unit.is_alive() || unit.position.chebyshev(&interactable.position) > 1 {
            return Vec::new();
        }
        interactable.admitted_actions(unit)
    }

    /// Start an action. Instant actions resolve immediately; channeled actions
    /// put the unit into its channel and resolve in `complete_channel`.
    ///
    /// `occupied` lists tiles currently held by living units, so a door is
    /// never shut on someone standing in it.
    pub fn begin(
        &mut self,
        unit: &mut Unit,
        id: InteractableId,
        action: ActionKind,
        map: &mut GridMap,
        config: &InteractionConfig,
        occupied: &[TilePos],
    ) -> Result<Vec<InteractionEffect>, InteractionRejection> {
        let interactable = self
            .get(id)
            .ok_or(InteractionRejection::UnknownInteractable)?;
        if !unit.is_alive() {
            return Err(InteractionRejection::UnitDown);
        }
        if unit.position.chebyshev(&interactable.position) > 1 {
            return Err(InteractionRejection::NotAdjacent);
        }
        if !interactable.admitted_actions(unit).contains(&action) {
            return Err(InteractionRejection::ActionUnavailable);
        }
        if action.channel().is_some() && unit.channel.is_some() {
            return Err(InteractionRejection::Busy);
        }
        if action == ActionKind::Close && occupied.contains(&interactable.position) {
            return Err(InteractionRejection::DoorwayOccupied);
        }

        if let Some(kind) = action.channel() {
            let duration = match kind {
                ChannelKind::Unlock => config.unlock_ticks,
                ChannelKind::Hack => config.hack_ticks,
                ChannelKind::Disable => config.disable_ticks,
            };
            if !unit.issue_channel(kind, id, duration) {
                return Err(InteractionRejection::Busy);
            }
            let mut effects = vec![InteractionEffect::ChannelStarted { id, kind, duration }];
            if let Some(target) = self.get_mut(id) {
                if let InteractableKind::Terminal { state, .. } = &mut target.kind {
                    *state = TerminalState::InProgress;
                    effects.push(target.changed());
                }
            }
            return Ok(effects);
        }

        // Instant actions
        let Some(target) = self.get_mut(id) else {
            return Err(InteractionRejection::UnknownInteractable);
        };
        let position = target.position;
        let effects = match (&mut target.kind, action) {
            (InteractableKind::Door { state }, ActionKind::Open) => {
                *state = DoorState::Open;
                map.set_door_open(position, true);
                vec![target.changed()]
            }
            (InteractableKind::Door { state }, ActionKind::Close) => {
                *state = DoorState::Closed;
                map.set_door_open(position, false);
                vec![target.changed()]
            }
            (InteractableKind::Hazard { state, radius, damage }, ActionKind::Trigger) => {
                *state = HazardState::Triggered;
                let (radius, amount) = (*radius, *damage);
                vec![
                    target.changed(),
                    InteractionEffect::AreaDamage {
                        id,
                        center: position,
                        radius,
                        amount,
                    },
                ]
            }
            _ => return Err(InteractionRejection::ActionUnavailable),
        };
        Ok(effects)
    }

    /// Apply a finished channel to its target
    ///
    /// A target that moved on in the meantime (another unit unlocked the door,
    /// the hazard went off) absorbs the completion without effect.
    pub fn complete_channel(
        &mut self,
        channel: &ChanneledAction,
        map: &mut GridMap,
    ) -> Vec<InteractionEffect> {
        let mut effects = Vec::new();
        let mut released_doors = Vec::new();

        let Some(target) = self.get_mut(channel.target) else {
            return effects;
        };
        let position = target.position;
        match (&mut target.kind, channel.kind) {
            (InteractableKind::Door { state }, ChannelKind::Unlock) if *state == DoorState::Locked => {
                *state = DoorState::Open;
                map.set_door_open(position, true);
                effects.push(target.changed());
            }
            (
                InteractableKind::Terminal {
                    state,
                    linked_doors,
                    ..
                },
                ChannelKind::Hack,
            ) if *state != TerminalState::Complete => {
                *state = TerminalState::Complete;
                released_doors = linked_doors.clone();
                effects.push(target.changed());
            }
            (InteractableKind::Hazard { state, .. }, ChannelKind::Disable)
                if *state == HazardState::Armed =>
            {
                *state = HazardState::Disabled;
                effects.push(target.changed());
            }
            _ => {}
        }

        for door_id in released_doors {
            if let Some(door) = self.get_mut(door_id) {
                if let InteractableKind::Door { state } = &mut door.kind {
                    if *state == DoorState::Locked {
                        *state = DoorState::Closed;
                        effects.push(door.changed());
                    }
                }
            }
        }
        effects
    }

    /// Reconcile state with the units: a terminal left InProgress without a
    /// living unit channeling a hack on it falls back to Idle.
    pub fn tick(&mut self, units: &[Unit]) -> Vec<InteractionEffect> {
        let mut effects = Vec::new();
        for interactable in self.interactables.iter_mut() {
            let id = interactable.id;
            if let InteractableKind::Terminal { state, .. } = &mut interactable.kind {
                if *state != TerminalState::InProgress {
                    continue;
                }
                let still_hacking = units.iter().any(|u| {
                    u.is_alive()
                        && u.channel
                            .map(|c| c.target == id && c.kind == ChannelKind::Hack)
                            .unwrap_or(false)
                });
                if !still_hacking {
                    *state = TerminalState::Idle;
                    effects.push(interactable.changed());
                }
            }
        }
        effects
    }

    /// Has the terminal at this id been hacked?
    pub fn is_terminal_complete(&self, id: InteractableId) -> bool {
        matches!(
            self.get(id).map(|i| &i.kind),
            Some(InteractableKind::Terminal {
                state: TerminalState::Complete,
                ..
            })
        )
    }

    /// Link a terminal to doors it releases, and set who may hack it
    pub fn configure_terminal(
        &mut self,
        id: InteractableId,
        faction: Faction,
        doors: Vec<InteractableId>,
    ) -> bool {
        match self.get_mut(id).map(|i| &mut i.kind) {
            Some(InteractableKind::Terminal {
                unlocks_for,
                linked_doors,
                ..
            }) => {
                *unlocks_for = faction;
                linked_doors.extend(doors);
                true
            }
            _ => false,
        }
    }
}
