//! Mission execution loop
//!
//! Each tick: AI -> attacks -> movement -> unit timers -> visibility -> termination
//!
//! The simulation exclusively owns the map, units, fog, and interactables.
//! Everything else reads them through borrows that end with the call.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace, warn};

use crate::battle::ai::{AiController, AiNotice, AlarmState};
use crate::battle::commands::{CommandRejection, PlayerCommand, ScriptedCommand};
use crate::battle::coords::TilePos;
use crate::battle::events::{MissionEvent, MissionEventLog, MissionEventType};
use crate::battle::grid_map::GridMap;
use crate::battle::interaction::{InteractionEffect, InteractionRegistry};
use crate::battle::mission::Objective;
use crate::battle::movement::{advance_movement, MovementOutcome};
use crate::battle::outcome::{build_outcome, MissionOutcome, MissionResult, ObjectiveReport};
use crate::battle::ranged::execute_attack;
use crate::battle::units::{ChanneledAction, DamageReport, Unit};
use crate::battle::visibility::VisibilityField;
use crate::core::config::SimConfig;
use crate::core::types::{Faction, Tick, UnitId};

/// Borrow two distinct units mutably
fn pair_mut(units: &mut [Unit], a: usize, b: usize) -> (&mut Unit, &mut Unit) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = units.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = units.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

/// Complete mission state
pub struct Simulation {
    name: String,
    tick: Tick,
    config: SimConfig,
    map: GridMap,
    /// Roster order doubles as movement priority
    units: Vec<Unit>,
    visibility: VisibilityField,
    registry: InteractionRegistry,
    ai: AiController,
    rng: ChaCha8Rng,
    objectives: Vec<Objective>,
    objectives_done: Vec<bool>,
    extraction: Vec<TilePos>,
    retreat_requested: bool,
    paused: bool,
    result: Option<MissionResult>,
    events: MissionEventLog,
}

impl Simulation {
    /// Assemble a mission. Extraction defaults to the crew's starting tiles.
    pub fn new(
        name: impl Into<String>,
        mut map: GridMap,
        units: Vec<Unit>,
        registry: InteractionRegistry,
        config: SimConfig,
        seed: u64,
    ) -> Self {
        registry.sync_doors(&mut map);
        let mut visibility = VisibilityField::for_map(&map);
        visibility.recompute(&map, &units);
        let extraction = units
            .iter()
            .filter(|u| u.faction == Faction::Friendly)
            .map(|u| u.position)
            .collect();

        Self {
            name: name.into(),
            tick: 0,
            config,
            map,
            units,
            visibility,
            registry,
            ai: AiController::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            objectives: Vec::new(),
            objectives_done: Vec::new(),
            extraction,
            retreat_requested: false,
            paused: false,
            result: None,
            events: MissionEventLog::new(),
        }
    }

    pub fn with_objectives(mut self, objectives: Vec<Objective>) -> Self {
        self.objectives_done = vec![false; objectives.len()];
        self.objectives = objectives;
        self
    }

    pub fn with_extraction(mut self, extraction: Vec<TilePos>) -> Self {
        if !extraction.is_empty() {
            self.extraction = extraction;
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ticks processed so far
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn visibility(&self) -> &VisibilityField {
        &self.visibility
    }

    pub fn registry(&self) -> &InteractionRegistry {
        &self.registry
    }

    pub fn alarm(&self) -> AlarmState {
        self.ai.alarm()
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    pub fn extraction_points(&self) -> &[TilePos] {
        &self.extraction
    }

    pub fn result(&self) -> Option<MissionResult> {
        self.result
    }

    /// Is the mission over?
    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Take the notifications produced since the last drain
    pub fn drain_events(&mut self) -> Vec<MissionEvent> {
        self.events.drain()
    }

    /// Hostiles standing on currently Visible tiles; Revealed tiles show no occupants
    pub fn visible_hostiles(&self) -> Vec<&Unit> {
        self.units
            .iter()
            .filter(|u| u.faction == Faction::Hostile && u.is_alive())
            .filter(|u| self.visibility.is_tile_visible(u.position))
            .collect()
    }

    fn index_of(&self, id: UnitId) -> Option<usize> {
        self.units.iter().position(|u| u.id == id)
    }

    fn log_event(&mut self, event_type: MissionEventType, description: String) {
        self.events.push(event_type, description, self.tick);
    }

    /// Apply a command between ticks. Refusals are logged and return false.
    pub fn apply_command(&mut self, command: PlayerCommand) -> bool {
        match self.dispatch(command) {
            Ok(()) => true,
            Err(reason) => {
                warn!(?command, %reason, "Command refused");
                false
            }
        }
    }

    fn dispatch(&mut self, command: PlayerCommand) -> Result<(), CommandRejection> {
        if self.is_finished() {
            return Err(CommandRejection::MissionOver);
        }

        let index = match command.unit() {
            Some(id) => {
                let index = self
                    .index_of(id)
                    .ok_or(CommandRejection::UnknownUnit(id))?;
                if !self.units[index].is_alive() {
                    return Err(CommandRejection::UnitDown(id));
                }
                Some(index)
            }
            None => None,
        };

        match (command, index) {
            (PlayerCommand::Move { to, .. }, Some(i)) => {
                if !self.map.is_occupiable(to) {
                    return Err(CommandRejection::NotOccupiable(to));
                }
                let cancelled = self.units[i].issue_move(to);
                self.note_interrupt(i, cancelled);
                debug!(unit = self.units[i].id.0, ?to, "Move ordered");
            }
            (PlayerCommand::Attack { target, .. }, Some(i)) => {
                let valid = self
                    .unit(target)
                    .map(|t| t.is_alive() && t.faction != self.units[i].faction)
                    .unwrap_or(false);
                if !valid {
                    return Err(CommandRejection::InvalidTarget(target));
                }
                let cancelled = self.units[i].issue_attack(target);
                self.note_interrupt(i, cancelled);
                debug!(unit = self.units[i].id.0, target = target.0, "Attack ordered");
            }
            (
                PlayerCommand::Interact {
                    interactable,
                    action,
                    ..
                },
                Some(i),
            ) => {
                let occupied: Vec<TilePos> = self
                    .units
                    .iter()
                    .filter(|u| u.is_alive())
                    .map(|u| u.position)
                    .collect();
                let effects = self
                    .registry
                    .begin(
                        &mut self.units[i],
                        interactable,
                        action,
                        &mut self.map,
                        &self.config.interaction,
                        &occupied,
                    )
                    .map_err(CommandRejection::Interaction)?;
                debug!(unit = self.units[i].id.0, interactable = interactable.0, ?action, "Interaction started");
                self.apply_effects(Some(i), effects);
            }
            (PlayerCommand::Reload { .. }, Some(i)) => {
                if !self.units[i].start_reload() {
                    return Err(CommandRejection::CannotReload);
                }
                let unit = self.units[i].id;
                let name = self.units[i].name.clone();
                self.log_event(
                    MissionEventType::ReloadStarted { unit },
                    format!("{} is reloading", name),
                );
            }
            (PlayerCommand::Hold { .. }, Some(i)) => {
                self.units[i].hold();
            }
            (PlayerCommand::Retreat, _) => {
                if !self.retreat_requested {
                    self.retreat_requested = true;
                    info!(tick = self.tick, "Retreat ordered");
                    self.log_event(MissionEventType::RetreatOrdered, "Squad ordered to extract".into());
                }
            }
            // Every unit-addressed command resolved an index above
            (_, None) => {}
        }
        Ok(())
    }

    fn note_interrupt(&mut self, index: usize, cancelled: Option<ChanneledAction>) {
        if let Some(channel) = cancelled {
            let unit = self.units[index].id;
            let name = self.units[index].name.clone();
            debug!(unit = unit.0, kind = ?channel.kind, "Channel interrupted");
            self.log_event(
                MissionEventType::ChannelInterrupted {
                    unit,
                    interactable: channel.target,
                },
                format!("{} abandoned {:?}", name, channel.kind),
            );
        }
    }

    fn note_damage(&mut self, index: usize, report: DamageReport, by: Option<UnitId>) {
        self.note_interrupt(index, report.cancelled);
        if report.killed {
            let unit = self.units[index].id;
            let name = self.units[index].name.clone();
            info!(unit = unit.0, tick = self.tick, "{} killed", name);
            self.log_event(MissionEventType::UnitKilled { unit, by }, format!("{} is down", name));
        }
    }

    fn apply_effects(&mut self, actor: Option<usize>, effects: Vec<InteractionEffect>) {
        for effect in effects {
            match effect {
                InteractionEffect::StateChanged { id, state } => {
                    debug!(interactable = id.0, ?state, "Interactable changed");
                    self.log_event(
                        MissionEventType::InteractableChanged {
                            interactable: id,
                            state,
                        },
                        format!("Interactable {} is now {:?}", id.0, state),
                    );
                }
                InteractionEffect::ChannelStarted { id, kind, .. } => {
                    if let Some(i) = actor {
                        let unit = self.units[i].id;
                        let name = self.units[i].name.clone();
                        self.log_event(
                            MissionEventType::ChannelStarted {
                                unit,
                                interactable: id,
                                kind,
                            },
                            format!("{} started {:?}", name, kind),
                        );
                    }
                }
                InteractionEffect::AreaDamage {
                    id,
                    center,
                    radius,
                    amount,
                } => {
                    if let Some(i) = actor {
                        let by = self.units[i].id;
                        self.log_event(
                            MissionEventType::HazardTriggered {
                                interactable: id,
                                by,
                            },
                            format!("{} set off hazard {}", self.units[i].name, id.0),
                        );
                    }
                    self.apply_area_damage(actor, center, radius, amount);
                }
            }
        }
    }

    /// Damage every living unit within `radius` of `center`, any faction
    fn apply_area_damage(&mut self, actor: Option<usize>, center: TilePos, radius: f32, amount: u32) {
        let by = actor.map(|i| self.units[i].id);
        for j in 0..self.units.len() {
            if !self.units[j].is_alive() || self.units[j].position.distance(&center) > radius {
                continue;
            }
            let report = self.units[j].take_damage(amount);
            let unit = self.units[j].id;
            self.log_event(
                MissionEventType::UnitDamaged {
                    unit,
                    amount: report.dealt,
                },
                format!("{} caught in the blast for {}", self.units[j].name, report.dealt),
            );
            if report.killed {
                if let Some(a) = actor {
                    if self.units[a].faction.is_enemy_of(&self.units[j].faction) {
                        self.units[a].kills += 1;
                    }
                }
            }
            self.note_damage(j, report, by);
        }
    }

    /// Advance the mission by one tick; false when paused or already over
    pub fn process_tick(&mut self) -> bool {
        if self.paused || self.is_finished() {
            return false;
        }

        // ===== PHASE 1: AI =====
        self.phase_ai();

        // ===== PHASE 2: ATTACKS =====
        self.phase_attacks();

        // ===== PHASE 3: MOVEMENT =====
        self.phase_movement();

        // ===== PHASE 4: UNIT STATE =====
        self.phase_unit_state();

        // ===== PHASE 5: VISIBILITY =====
        self.visibility.recompute(&self.map, &self.units);

        // ===== PHASE 6: TERMINATION =====
        self.phase_termination();

        self.tick += 1;
        true
    }

    fn phase_ai(&mut self) {
        let pass = self.ai.run_pass(
            &mut self.units,
            &self.map,
            &self.registry,
            &self.config,
            self.tick,
            &mut self.rng,
        );

        for notice in pass.notices {
            match notice {
                AiNotice::Alerted { unit } => {
                    let name = self.unit(unit).map(|u| u.name.clone()).unwrap_or_default();
                    self.log_event(
                        MissionEventType::UnitAlerted { unit },
                        format!("{} spotted the squad", name),
                    );
                }
                AiNotice::AlarmRaised { by } => {
                    self.log_event(MissionEventType::AlarmRaised { by }, "Alarm raised".into());
                }
            }
        }

        for command in pass.commands {
            if let Err(reason) = self.dispatch(command) {
                debug!(?command, %reason, "AI command refused");
            }
        }
    }

    fn phase_attacks(&mut self) {
        for i in 0..self.units.len() {
            let Some(target_id) = self.units[i].attack_target else {
                continue;
            };
            if !self.units[i].is_alive() {
                continue;
            }
            let target = match self.index_of(target_id) {
                Some(j) if j != i && self.units[j].is_alive() => j,
                _ => {
                    self.units[i].attack_target = None;
                    continue;
                }
            };

            let attempt = {
                let (attacker, defender) = pair_mut(&mut self.units, i, target);
                execute_attack(attacker, defender, &self.map, &self.config.combat, &mut self.rng)
            };

            match attempt {
                Ok((result, damage)) => {
                    let attacker = self.units[i].id;
                    let description = format!(
                        "{} fired at {} ({:.0}%, {:?} cover): {}",
                        self.units[i].name,
                        self.units[target].name,
                        result.hit_chance * 100.0,
                        result.cover,
                        if result.hit { "hit" } else { "miss" }
                    );
                    debug!(attacker = attacker.0, target = target_id.0, hit = result.hit, "Attack resolved");
                    self.log_event(
                        MissionEventType::AttackResolved {
                            attacker,
                            target: target_id,
                            hit: result.hit,
                            damage: damage.dealt,
                        },
                        description,
                    );
                    // Firing is only allowed outside a reload, so this shot emptied the magazine
                    if self.units[i].is_reloading() {
                        let name = self.units[i].name.clone();
                        self.log_event(
                            MissionEventType::ReloadStarted { unit: attacker },
                            format!("{} is reloading", name),
                        );
                    }
                    self.note_damage(target, damage, Some(attacker));
                }
                Err(reason) => {
                    trace!(attacker = self.units[i].id.0, target = target_id.0, ?reason, "Attack skipped");
                }
            }
        }
    }

    fn phase_movement(&mut self) {
        for outcome in advance_movement(&mut self.units, &self.map) {
            match outcome {
                MovementOutcome::Stepped { unit, from, to } => {
                    trace!(unit = unit.0, ?from, ?to, "Stepped");
                }
                MovementOutcome::Waiting { unit, blocked_at } => {
                    trace!(unit = unit.0, ?blocked_at, "Waiting for tile");
                }
                MovementOutcome::Arrived { unit, at } => {
                    self.log_event(
                        MissionEventType::UnitArrived { unit, at },
                        format!("Unit {} reached ({}, {})", unit.0, at.x, at.y),
                    );
                }
                MovementOutcome::Unreachable { unit, destination } => {
                    if let Some(i) = self.index_of(unit) {
                        if let Some(profile) = self.units[i].ai.as_mut() {
                            profile.abandon(destination);
                        }
                    }
                    debug!(unit = unit.0, ?destination, "Destination unreachable");
                    self.log_event(
                        MissionEventType::DestinationUnreachable { unit, destination },
                        format!(
                            "Unit {} cannot reach ({}, {})",
                            unit.0, destination.x, destination.y
                        ),
                    );
                }
            }
        }
    }

    fn phase_unit_state(&mut self) {
        let dt = self.config.timing.seconds_per_tick();
        for i in 0..self.units.len() {
            let report = self.units[i].tick(dt);
            let unit = self.units[i].id;

            if report.reload_completed {
                let name = self.units[i].name.clone();
                self.log_event(
                    MissionEventType::ReloadCompleted { unit },
                    format!("{} reloaded", name),
                );
            }

            if let Some(channel) = report.channel_completed {
                let name = self.units[i].name.clone();
                debug!(unit = unit.0, kind = ?channel.kind, "Channel complete");
                self.log_event(
                    MissionEventType::ChannelCompleted {
                        unit,
                        interactable: channel.target,
                        kind: channel.kind,
                    },
                    format!("{} finished {:?}", name, channel.kind),
                );
                let effects = self.registry.complete_channel(&channel, &mut self.map);
                self.apply_effects(Some(i), effects);
            }
        }

        let effects = self.registry.tick(&self.units);
        self.apply_effects(None, effects);
    }

    fn hostiles_eliminated(&self) -> bool {
        let mut hostiles = self.units.iter().filter(|u| u.faction == Faction::Hostile).peekable();
        hostiles.peek().is_some() && hostiles.all(|u| !u.is_alive())
    }

    fn update_objectives(&mut self) {
        let eliminated = self.hostiles_eliminated();
        for index in 0..self.objectives.len() {
            if self.objectives_done[index] {
                continue;
            }
            let complete = match self.objectives[index] {
                Objective::HackTerminal { terminal, .. } => {
                    self.registry.is_terminal_complete(terminal)
                }
                Objective::Eliminate => eliminated,
            };
            if complete {
                self.objectives_done[index] = true;
                let description = self.objectives[index].describe();
                info!(tick = self.tick, "Objective complete: {}", description);
                self.log_event(
                    MissionEventType::ObjectiveCompleted { index },
                    format!("Objective complete: {}", description),
                );
            }
        }
    }

    /// Every living crew member is within reach of some extraction point
    fn squad_at_extraction(&self) -> bool {
        let radius = self.config.mission.extraction_radius;
        self.units
            .iter()
            .filter(|u| u.faction == Faction::Friendly && u.is_alive())
            .all(|u| self.extraction.iter().any(|p| u.position.distance(p) <= radius))
    }

    fn phase_termination(&mut self) {
        self.update_objectives();

        let crew_alive = self
            .units
            .iter()
            .any(|u| u.faction == Faction::Friendly && u.is_alive());
        let objectives_met =
            !self.objectives.is_empty() && self.objectives_done.iter().all(|done| *done);

        let result = if !crew_alive {
            Some(MissionResult::Defeat)
        } else if self.hostiles_eliminated() || objectives_met {
            Some(MissionResult::Victory)
        } else if self.retreat_requested && self.squad_at_extraction() {
            Some(MissionResult::Retreat)
        } else {
            None
        };

        if let Some(result) = result {
            self.result = Some(result);
            info!(tick = self.tick, ?result, mission = %self.name, "Mission ended");
            self.log_event(
                MissionEventType::MissionEnded { result },
                format!("Mission ended: {:?}", result),
            );
        }
    }

    /// Run scripted commands and ticks until the mission ends, the
    /// simulation is paused, or `max_ticks` have been processed
    pub fn run(&mut self, script: &[ScriptedCommand], max_ticks: Tick) -> MissionOutcome {
        self.run_with(script, max_ticks, |_| {})
    }

    /// Like `run`, calling `on_tick` after every processed tick
    pub fn run_with<F>(
        &mut self,
        script: &[ScriptedCommand],
        max_ticks: Tick,
        mut on_tick: F,
    ) -> MissionOutcome
    where
        F: FnMut(&mut Simulation),
    {
        let mut script: Vec<&ScriptedCommand> = script.iter().collect();
        script.sort_by_key(|s| s.tick);
        let mut next = 0;

        while !self.is_finished() && self.tick < max_ticks {
            while next < script.len() && script[next].tick <= self.tick {
                self.apply_command(script[next].command);
                next += 1;
            }
            if !self.process_tick() {
                break;
            }
            on_tick(self);
        }
        self.outcome()
    }

    /// Snapshot the outcome record
    pub fn outcome(&self) -> MissionOutcome {
        let objectives = self
            .objectives
            .iter()
            .zip(&self.objectives_done)
            .map(|(objective, done)| ObjectiveReport {
                description: objective.describe(),
                complete: *done,
            })
            .collect();
        build_outcome(
            &self.name,
            self.result,
            self.tick,
            &self.units,
            objectives,
            self.ai.alarm(),
            &self.config.mission,
        )
    }
}
