//! Per-unit mutable state: health, ammunition, orders, and channeled actions
//!
//! Channel state machine:
//!
//! ```text
//! Idle --issue_channel--> Channeling --tick to zero--> Idle (complete)
//!                              |
//!                              +--move / attack / damage--> Idle (cancelled, progress lost)
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::battle::ai::AiProfile;
use crate::battle::coords::TilePos;
use crate::battle::weapons::WeaponDef;
use crate::core::types::{Faction, InteractableId, UnitId};

/// Multi-tick interactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Unlock,
    Hack,
    Disable,
}

/// An in-flight channeled action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChanneledAction {
    pub kind: ChannelKind,
    pub target: InteractableId,
    pub total_ticks: u32,
    pub remaining_ticks: u32,
}

impl ChanneledAction {
    /// Ticks already spent
    pub fn progress(&self) -> u32 {
        self.total_ticks - self.remaining_ticks
    }
}

/// Coarse channel state for queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelState {
    Idle,
    Channeling,
}

/// Magazine and reserve counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ammo {
    pub loaded: u32,
    pub reserve: u32,
}

/// Health bucket reported to the management layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitStatus {
    Alive,
    Injured,
    Dead,
}

/// Result of applying damage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageReport {
    pub dealt: u32,
    pub killed: bool,
    pub cancelled: Option<ChanneledAction>,
}

/// What happened to a unit during its per-tick update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitTickReport {
    pub channel_completed: Option<ChanneledAction>,
    pub reload_completed: bool,
}

/// A combatant on the mission grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub faction: Faction,

    // Position and movement
    pub position: TilePos,
    pub move_speed: f32, // tiles per simulated second
    pub destination: Option<TilePos>,
    pub path: VecDeque<TilePos>,
    pub move_progress: f32,

    // Condition
    pub max_health: u32,
    pub health: u32,
    pub vision_radius: f32,

    // Weapon
    pub weapon: WeaponDef,
    pub aim_bonus: f32,
    pub ammo: Ammo,
    pub cooldown_remaining: u32,
    pub reload_remaining: Option<u32>,

    // Orders
    pub attack_target: Option<UnitId>,
    pub channel: Option<ChanneledAction>,

    /// Present on AI-controlled units
    pub ai: Option<AiProfile>,

    // Mission statistics
    pub rounds_fired: u32,
    pub hits: u32,
    pub kills: u32,
}

impl Unit {
    pub fn new(
        id: UnitId,
        name: impl Into<String>,
        faction: Faction,
        position: TilePos,
        max_health: u32,
        weapon: WeaponDef,
    ) -> Self {
        let ammo = Ammo {
            loaded: weapon.magazine_size,
            reserve: 0,
        };
        Self {
            id,
            name: name.into(),
            faction,
            position,
            move_speed: 4.0,
            destination: None,
            path: VecDeque::new(),
            move_progress: 0.0,
            max_health,
            health: max_health,
            vision_radius: 8.0,
            weapon,
            aim_bonus: 0.0,
            ammo,
            cooldown_remaining: 0,
            reload_remaining: None,
            attack_target: None,
            channel: None,
            ai: None,
            rounds_fired: 0,
            hits: 0,
            kills: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn channel_state(&self) -> ChannelState {
        if self.channel.is_some() {
            ChannelState::Channeling
        } else {
            ChannelState::Idle
        }
    }

    /// Ticks spent on the current channel, zero when idle
    pub fn channel_progress(&self) -> u32 {
        self.channel.map(|c| c.progress()).unwrap_or(0)
    }

    pub fn is_moving(&self) -> bool {
        self.destination.is_some()
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_remaining.is_some()
    }

    pub fn status(&self) -> UnitStatus {
        if !self.is_alive() {
            UnitStatus::Dead
        } else if self.health < self.max_health {
            UnitStatus::Injured
        } else {
            UnitStatus::Alive
        }
    }

    fn cancel_channel(&mut self) -> Option<ChanneledAction> {
        self.channel.take()
    }

    /// Order movement. Interrupts any channel and drops the attack order.
    pub fn issue_move(&mut self, destination: TilePos) -> Option<ChanneledAction> {
        let cancelled = self.cancel_channel();
        if !self.is_alive() {
            return cancelled;
        }
        self.attack_target = None;
        if self.destination != Some(destination) {
            self.destination = Some(destination);
            self.path.clear();
        }
        cancelled
    }

    /// Order an attack. Interrupts any channel and stops movement.
    pub fn issue_attack(&mut self, target: UnitId) -> Option<ChanneledAction> {
        let cancelled = self.cancel_channel();
        if !self.is_alive() {
            return cancelled;
        }
        self.stop_moving();
        self.attack_target = Some(target);
        cancelled
    }

    /// Start a channeled action. Fails while already channeling or when dead.
    pub fn issue_channel(&mut self, kind: ChannelKind, target: InteractableId, duration: u32) -> bool {
        if !self.is_alive() || self.channel.is_some() || duration == 0 {
            return false;
        }
        self.stop_moving();
        self.attack_target = None;
        self.channel = Some(ChanneledAction {
            kind,
            target,
            total_ticks: duration,
            remaining_ticks: duration,
        });
        true
    }

    /// Clear movement and attack orders; channels keep running
    pub fn hold(&mut self) {
        self.stop_moving();
        self.attack_target = None;
    }

    fn stop_moving(&mut self) {
        self.destination = None;
        self.path.clear();
        self.move_progress = 0.0;
    }

    /// Apply damage. Any damage interrupts a channel; health never drops below zero.
    pub fn take_damage(&mut self, amount: u32) -> DamageReport {
        if !self.is_alive() {
            return DamageReport {
                dealt: 0,
                killed: false,
                cancelled: None,
            };
        }
        let cancelled = if amount > 0 { self.cancel_channel() } else { None };
        let dealt = amount.min(self.health);
        self.health -= dealt;
        let killed = self.health == 0;
        if killed {
            self.stop_moving();
            self.attack_target = None;
            self.reload_remaining = None;
        }
        DamageReport {
            dealt,
            killed,
            cancelled,
        }
    }

    /// Can the weapon be discharged right now?
    pub fn can_fire(&self) -> bool {
        self.is_alive()
            && self.ammo.loaded > 0
            && self.cooldown_remaining == 0
            && self.reload_remaining.is_none()
    }

    /// Spend one round and start the cooldown; an empty magazine starts a reload
    pub fn consume_round(&mut self) {
        self.ammo.loaded = self.ammo.loaded.saturating_sub(1);
        self.cooldown_remaining = self.weapon.cooldown_ticks;
        self.rounds_fired += 1;
        if self.ammo.loaded == 0 {
            self.start_reload();
        }
    }

    /// Begin refilling the magazine from reserve
    pub fn start_reload(&mut self) -> bool {
        if !self.is_alive()
            || self.reload_remaining.is_some()
            || self.ammo.reserve == 0
            || self.ammo.loaded >= self.weapon.magazine_size
        {
            return false;
        }
        if self.weapon.reload_ticks == 0 {
            self.finish_reload();
        } else {
            self.reload_remaining = Some(self.weapon.reload_ticks);
        }
        true
    }

    fn finish_reload(&mut self) {
        let needed = self.weapon.magazine_size.saturating_sub(self.ammo.loaded);
        let moved = needed.min(self.ammo.reserve);
        self.ammo.loaded += moved;
        self.ammo.reserve -= moved;
        self.reload_remaining = None;
    }

    /// Advance timers by one tick of `dt` simulated seconds
    pub fn tick(&mut self, dt: f32) -> UnitTickReport {
        let mut report = UnitTickReport::default();
        if !self.is_alive() {
            return report;
        }

        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(1);

        if let Some(remaining) = self.reload_remaining {
            if remaining <= 1 {
                self.finish_reload();
                report.reload_completed = true;
            } else {
                self.reload_remaining = Some(remaining - 1);
            }
        }

        if let Some(channel) = self.channel.as_mut() {
            channel.remaining_ticks = channel.remaining_ticks.saturating_sub(1);
            if channel.remaining_ticks == 0 {
                report.channel_completed = self.channel.take();
            }
        }

        if self.destination.is_some() {
            self.move_progress = (self.move_progress + self.move_speed * dt).min(1.0);
        }

        report
    }

    /// Has enough movement built up to enter the next tile?
    pub fn ready_to_step(&self) -> bool {
        self.destination.is_some() && self.move_progress >= 1.0
    }

    /// Commit a step onto the next path tile
    pub fn step_to(&mut self, next: TilePos) {
        self.position = next;
        self.move_progress -= 1.0;
        if self.path.front() == Some(&next) {
            self.path.pop_front();
        }
        if self.destination == Some(next) || self.path.is_empty() {
            self.stop_moving();
        }
    }

    /// Abandon the current destination
    pub fn clear_destination(&mut self) {
        self.stop_moving();
    }
}
