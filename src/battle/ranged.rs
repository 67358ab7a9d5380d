//! Ranged combat resolution
//!
//! Stateless apart from the RNG stream passed in. Hit chance:
//!
//! ```text
//! base   = clamp(accuracy * (1 - range_fraction * range_penalty) + aim_bonus, floor, ceiling)
//! chance = base * (1 - cover_reduction(tier))
//! ```
//!
//! Walls that fully occlude the target are not a modifier: they fail the line
//! of sight check and make the attack illegal.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::coords::TilePos;
use crate::battle::grid_map::{CoverTier, GridMap};
use crate::battle::units::{DamageReport, Unit};
use crate::battle::weapons::WeaponDef;
use crate::core::config::CombatConfig;

/// Why an attack could not be attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackRejection {
    AttackerDown,
    TargetDown,
    NotAnEnemy,
    NoLineOfSight,
    OutOfRange,
    OutOfAmmo,
    Reloading,
    OnCooldown,
}

/// Result of a resolved attack
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackResult {
    pub hit: bool,
    /// Damage the hit carries (zero on a miss)
    pub damage: u32,
    pub target_was_in_cover: bool,
    pub cover: CoverTier,
    pub hit_chance: f32,
}

/// Hit chance from an arbitrary firing position
///
/// Used for prospective positions (AI flanking) as well as live attacks.
pub fn hit_chance_from(
    attacker_pos: TilePos,
    aim_bonus: f32,
    target_pos: TilePos,
    weapon: &WeaponDef,
    map: &GridMap,
    config: &CombatConfig,
) -> f32 {
    let distance = attacker_pos.distance(&target_pos);
    let range_fraction = if weapon.range > 0.0 {
        distance / weapon.range
    } else {
        1.0
    };

    let base = weapon.accuracy * (1.0 - range_fraction * config.range_penalty_factor) + aim_bonus;
    let base = base.clamp(config.min_hit_chance, config.max_hit_chance);

    let tier = map.cover_against(target_pos, attacker_pos);
    base * (1.0 - config.cover_reduction(tier))
}

/// Hit chance for `attacker` shooting `target` with `weapon`
pub fn hit_chance(
    attacker: &Unit,
    target: &Unit,
    weapon: &WeaponDef,
    map: &GridMap,
    config: &CombatConfig,
) -> f32 {
    hit_chance_from(
        attacker.position,
        attacker.aim_bonus,
        target.position,
        weapon,
        map,
        config,
    )
}

/// Check the legality gate: line of sight, range, loaded ammunition, no cooldown
pub fn check_attack(attacker: &Unit, target: &Unit, map: &GridMap) -> Result<(), AttackRejection> {
    if !attacker.is_alive() {
        return Err(AttackRejection::AttackerDown);
    }
    if !target.is_alive() {
        return Err(AttackRejection::TargetDown);
    }
    if attacker.id == target.id || attacker.faction == target.faction {
        return Err(AttackRejection::NotAnEnemy);
    }
    if attacker.is_reloading() {
        return Err(AttackRejection::Reloading);
    }
    if attacker.ammo.loaded == 0 {
        return Err(AttackRejection::OutOfAmmo);
    }
    if attacker.cooldown_remaining > 0 {
        return Err(AttackRejection::OnCooldown);
    }
    if !attacker.weapon.in_range(attacker.position.distance(&target.position)) {
        return Err(AttackRejection::OutOfRange);
    }
    if !map.has_line_of_sight(attacker.position, target.position) {
        return Err(AttackRejection::NoLineOfSight);
    }
    Ok(())
}

/// Roll an attack. Does NOT mutate units - caller applies results.
pub fn resolve_attack<R: Rng + ?Sized>(
    attacker: &Unit,
    target: &Unit,
    weapon: &WeaponDef,
    map: &GridMap,
    config: &CombatConfig,
    rng: &mut R,
) -> AttackResult {
    let chance = hit_chance(attacker, target, weapon, map, config);
    let cover = map.cover_against(target.position, attacker.position);
    let roll: f32 = rng.gen();
    let hit = roll < chance;

    AttackResult {
        hit,
        damage: if hit { weapon.damage } else { 0 },
        target_was_in_cover: cover.is_cover(),
        cover,
        hit_chance: chance,
    }
}

/// Validate, roll, and apply an attack: spend a round, start the cooldown,
/// and damage the target on a hit.
pub fn execute_attack<R: Rng + ?Sized>(
    attacker: &mut Unit,
    target: &mut Unit,
    map: &GridMap,
    config: &CombatConfig,
    rng: &mut R,
) -> Result<(AttackResult, DamageReport), AttackRejection> {
    check_attack(attacker, target, map)?;

    let weapon = attacker.weapon.clone();
    let result = resolve_attack(attacker, target, &weapon, map, config, rng);
    attacker.consume_round();

    let damage = target.take_damage(result.damage);
    if result.hit {
        attacker.hits += 1;
    }
    if damage.killed {
        attacker.kills += 1;
    }
    Ok((result, damage))
}
