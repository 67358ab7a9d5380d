//! Role behaviours
//!
//! Each role is a small heuristic; none plans more than one step ahead.
//! Commands are only emitted when they change the unit's current orders.

use rand::Rng;

use crate::battle::ai::decision_context::DecisionContext;
use crate::battle::ai::AiRole;
use crate::battle::commands::PlayerCommand;
use crate::battle::coords::TilePos;
use crate::battle::grid_map::CoverTier;
use crate::battle::interaction::{ActionKind, HazardState, InteractableKind};
use crate::battle::pathfinding::find_path;
use crate::core::types::{InteractableId, UnitId};

/// Pick this tick's command for the context's unit
pub fn decide<R: Rng + ?Sized>(ctx: &DecisionContext, rng: &mut R) -> Option<PlayerCommand> {
    let role = ctx.unit.ai.as_ref()?.role;

    if ctx.perception.perceived.is_empty() {
        return fallback(ctx);
    }

    match role {
        AiRole::Guard => guard(ctx),
        AiRole::Flanker => flank(ctx, rng),
        AiRole::Support => support(ctx),
    }
}

fn move_to(ctx: &DecisionContext, to: TilePos) -> Option<PlayerCommand> {
    if ctx.unit.position == to || ctx.unit.destination == Some(to) {
        return None;
    }
    Some(PlayerCommand::Move {
        unit: ctx.unit.id,
        to,
    })
}

fn attack(ctx: &DecisionContext, target: UnitId) -> Option<PlayerCommand> {
    if ctx.unit.attack_target == Some(target) {
        return None;
    }
    Some(PlayerCommand::Attack {
        unit: ctx.unit.id,
        target,
    })
}

/// Keep shooting the current target while it stays valid, else the nearest
fn attack_best_target(ctx: &DecisionContext) -> Option<PlayerCommand> {
    if let Some(current) = ctx.unit.attack_target {
        if ctx.perception.is_target(current) {
            return None;
        }
    }
    let (target, _) = ctx.perception.nearest_target()?;
    attack(ctx, target)
}

/// Nothing perceived: chase the last sighting, walk the patrol, or return to post
fn fallback(ctx: &DecisionContext) -> Option<PlayerCommand> {
    let profile = ctx.unit.ai.as_ref()?;
    let goal = profile
        .last_known
        .or_else(|| profile.patrol_target())
        .or(profile.post);

    match goal {
        Some(goal) if goal != ctx.unit.position => move_to(ctx, goal),
        _ if ctx.unit.is_moving() || ctx.unit.attack_target.is_some() => {
            Some(PlayerCommand::Hold { unit: ctx.unit.id })
        }
        _ => None,
    }
}

/// Hold and shoot; with nothing in range, shift to the best nearby cover that
/// still sees the threat
fn guard(ctx: &DecisionContext) -> Option<PlayerCommand> {
    if ctx.perception.has_targets() {
        return attack_best_target(ctx);
    }
    let (_, threat) = ctx.perception.nearest_perceived()?;
    match find_cover(ctx, threat) {
        Some(tile) => move_to(ctx, tile),
        None => ctx
            .unit
            .is_moving()
            .then_some(PlayerCommand::Hold { unit: ctx.unit.id }),
    }
}

/// Best cover tile within the search radius that keeps sight of `threat`
///
/// Only returns a tile strictly better than the current one; among equals the
/// nearest wins, then row-major order.
pub fn find_cover(ctx: &DecisionContext, threat: TilePos) -> Option<TilePos> {
    let here = ctx.map.cover_against(ctx.unit.position, threat);
    let origin = ctx.unit.position;

    ctx.tiles_around(ctx.config.ai.cover_search_radius)
        .into_iter()
        .filter(|pos| *pos != origin && ctx.is_free(*pos))
        .filter(|pos| ctx.map.has_line_of_sight(*pos, threat))
        .map(|pos| (ctx.map.cover_against(pos, threat), pos))
        .filter(|(tier, _)| *tier > here)
        .min_by_key(|(tier, pos)| {
            (
                std::cmp::Reverse(*tier),
                origin.distance_sq(pos),
                (pos.y, pos.x),
            )
        })
        .map(|(_, pos)| pos)
}

/// Work around the target's cover; shoot once the angle is clean
fn flank<R: Rng + ?Sized>(ctx: &DecisionContext, rng: &mut R) -> Option<PlayerCommand> {
    let (target_id, target_pos) = ctx
        .perception
        .nearest_target()
        .or_else(|| ctx.perception.nearest_perceived())?;

    let exposed = ctx.map.cover_against(target_pos, ctx.unit.position) == CoverTier::None;
    if exposed && ctx.perception.is_target(target_id) {
        return attack(ctx, target_id);
    }

    if let Some(tile) = find_flank_position(ctx, target_pos, rng) {
        return move_to(ctx, tile);
    }

    if ctx.perception.is_target(target_id) {
        attack(ctx, target_id)
    } else {
        close_in(ctx, target_pos)
    }
}

/// Nearest reachable tile from which the target has no cover and can be shot
///
/// Equally near candidates are chosen between with the mission RNG.
pub fn find_flank_position<R: Rng + ?Sized>(
    ctx: &DecisionContext,
    target: TilePos,
    rng: &mut R,
) -> Option<TilePos> {
    let origin = ctx.unit.position;
    let mut candidates: Vec<(i64, TilePos)> = ctx
        .tiles_around(ctx.config.ai.flank_search_radius)
        .into_iter()
        .filter(|pos| *pos != origin && ctx.is_free(*pos))
        .filter(|pos| ctx.unit.weapon.in_range(pos.distance(&target)))
        .filter(|pos| ctx.map.cover_against(target, *pos) == CoverTier::None)
        .filter(|pos| ctx.map.has_line_of_sight(*pos, target))
        .map(|pos| (origin.distance_sq(&pos), pos))
        .collect();
    candidates.sort();

    while !candidates.is_empty() {
        let nearest = candidates[0].0;
        let tied = candidates.iter().take_while(|(d, _)| *d == nearest).count();
        let pick = rng.gen_range(0..tied);
        let (_, pos) = candidates.remove(pick);
        if find_path(ctx.map, origin, pos).is_some() {
            return Some(pos);
        }
    }
    None
}

/// Set off a hazard that catches a cluster of enemies, otherwise fight like a guard
fn support(ctx: &DecisionContext) -> Option<PlayerCommand> {
    if let Some((hazard, from)) = best_hazard(ctx) {
        if ctx.unit.position == from {
            return Some(PlayerCommand::Interact {
                unit: ctx.unit.id,
                interactable: hazard,
                action: ActionKind::Trigger,
            });
        }
        return move_to(ctx, from);
    }

    if ctx.perception.has_targets() {
        return attack_best_target(ctx);
    }
    let (_, threat) = ctx.perception.nearest_perceived()?;
    close_in(ctx, threat)
}

/// Armed hazard catching the most enemies, provided it catches enough of them
/// and more enemies than allies, paired with the tile to trigger it from
fn best_hazard(ctx: &DecisionContext) -> Option<(InteractableId, TilePos)> {
    ctx.registry
        .iter()
        .filter_map(|interactable| match interactable.kind {
            InteractableKind::Hazard {
                state: HazardState::Armed,
                radius,
                ..
            } => {
                let at = interactable.position;
                let enemies = ctx.enemies_near(at, radius);
                let allies = ctx.allies_near(at, radius);
                if enemies < ctx.config.ai.support_cluster_min || enemies <= allies {
                    return None;
                }
                let from = trigger_tile(ctx, at, radius)?;
                Some((enemies, interactable.id, from))
            }
            _ => None,
        })
        .min_by_key(|(enemies, id, from)| {
            (
                std::cmp::Reverse(*enemies),
                ctx.unit.position.distance_sq(from),
                *id,
            )
        })
        .map(|(_, id, from)| (id, from))
}

/// Tile next to a hazard and outside its blast, preferring where the unit
/// already stands
fn trigger_tile(ctx: &DecisionContext, at: TilePos, radius: f32) -> Option<TilePos> {
    let here = ctx.unit.position;
    if here.chebyshev(&at) <= 1 && here.distance(&at) > radius {
        return Some(here);
    }
    at.neighbors()
        .iter()
        .map(|(_, pos)| *pos)
        .filter(|pos| pos.distance(&at) > radius && ctx.is_free(*pos))
        .min_by_key(|pos| (here.distance_sq(pos), (pos.y, pos.x)))
}

/// Step up beside `enemy` rather than onto its tile
fn close_in(ctx: &DecisionContext, enemy: TilePos) -> Option<PlayerCommand> {
    let here = ctx.unit.position;
    if here.chebyshev(&enemy) <= 1 {
        return None;
    }
    let tile = enemy
        .neighbors()
        .iter()
        .map(|(_, pos)| *pos)
        .filter(|pos| ctx.is_free(*pos))
        .min_by_key(|pos| (here.distance_sq(pos), (pos.y, pos.x)))?;
    move_to(ctx, tile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ai::{perceive, AiProfile};
    use crate::battle::grid_map::GridMap;
    use crate::battle::interaction::InteractionRegistry;
    use crate::battle::units::Unit;
    use crate::battle::weapons::WeaponDef;
    use crate::core::config::SimConfig;
    use crate::core::types::Faction;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rifle() -> WeaponDef {
        WeaponDef {
            id: "rifle".into(),
            name: "Rifle".into(),
            range: 6.0,
            damage: 20,
            accuracy: 0.7,
            cooldown_ticks: 4,
            magazine_size: 6,
            reload_ticks: 20,
        }
    }

    fn crew(id: u32, pos: TilePos) -> Unit {
        Unit::new(UnitId(id), "crew", Faction::Friendly, pos, 100, rifle())
    }

    fn hostile(id: u32, pos: TilePos, role: AiRole) -> Unit {
        let mut unit = Unit::new(UnitId(id), "hostile", Faction::Hostile, pos, 100, rifle());
        unit.ai = Some(AiProfile::new(role));
        unit
    }

    fn decide_for(
        units: &[Unit],
        index: usize,
        map: &GridMap,
        registry: &InteractionRegistry,
    ) -> Option<PlayerCommand> {
        let config = SimConfig::default();
        let perception = perceive(&units[index], units, map);
        let ctx = DecisionContext::new(&units[index], units, map, registry, &config, &perception);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        decide(&ctx, &mut rng)
    }

    #[test]
    fn test_guard_attacks_target_in_range() {
        let map = GridMap::new(10, 5);
        let units = vec![
            crew(0, TilePos::new(1, 2)),
            hostile(1, TilePos::new(5, 2), AiRole::Guard),
        ];
        assert_eq!(
            decide_for(&units, 1, &map, &InteractionRegistry::new()),
            Some(PlayerCommand::Attack {
                unit: UnitId(1),
                target: UnitId(0)
            })
        );
    }

    #[test]
    fn test_guard_seeks_cover_when_out_of_range() {
        let mut map = GridMap::new(14, 5);
        // Low wall east of (10,1) shelters it from the west
        map.set_obstacle(TilePos::new(9, 1), CoverTier::Half);
        map.derive_cover(CoverTier::Half);
        let units = vec![
            crew(0, TilePos::new(2, 2)),
            hostile(1, TilePos::new(10, 2), AiRole::Guard),
        ];
        assert_eq!(
            decide_for(&units, 1, &map, &InteractionRegistry::new()),
            Some(PlayerCommand::Move {
                unit: UnitId(1),
                to: TilePos::new(10, 1)
            })
        );
    }

    #[test]
    fn test_flanker_moves_off_covered_angle() {
        let mut map = GridMap::new(12, 9);
        // Target tucked east of a crate, flanker due west
        map.set_obstacle(TilePos::new(4, 4), CoverTier::Half);
        map.derive_cover(CoverTier::Half);
        let units = vec![
            crew(0, TilePos::new(5, 4)),
            hostile(1, TilePos::new(1, 4), AiRole::Flanker),
        ];
        let command = decide_for(&units, 1, &map, &InteractionRegistry::new());
        let Some(PlayerCommand::Move { to, .. }) = command else {
            panic!("flanker should reposition, got {:?}", command);
        };
        assert_eq!(map.cover_against(TilePos::new(5, 4), to), CoverTier::None);
        assert!(map.has_line_of_sight(to, TilePos::new(5, 4)));
    }

    #[test]
    fn test_flanker_shoots_exposed_target() {
        let map = GridMap::new(12, 9);
        let units = vec![
            crew(0, TilePos::new(5, 4)),
            hostile(1, TilePos::new(1, 4), AiRole::Flanker),
        ];
        assert!(matches!(
            decide_for(&units, 1, &map, &InteractionRegistry::new()),
            Some(PlayerCommand::Attack { .. })
        ));
    }

    #[test]
    fn test_support_triggers_hazard_on_cluster() {
        let map = GridMap::new(10, 6);
        let mut registry = InteractionRegistry::new();
        let hazard = registry.add(
            TilePos::new(4, 2),
            InteractableKind::Hazard {
                state: HazardState::Armed,
                radius: 1.25,
                damage: 30,
            },
        );
        let units = vec![
            crew(0, TilePos::new(4, 3)),
            crew(1, TilePos::new(5, 2)),
            hostile(2, TilePos::new(3, 1), AiRole::Support),
        ];
        assert_eq!(
            decide_for(&units, 2, &map, &registry),
            Some(PlayerCommand::Interact {
                unit: UnitId(2),
                interactable: hazard,
                action: ActionKind::Trigger
            })
        );
    }

    fn armed_hazard(registry: &mut InteractionRegistry, at: TilePos, radius: f32) {
        registry.add(
            at,
            InteractableKind::Hazard {
                state: HazardState::Armed,
                radius,
                damage: 30,
            },
        );
    }

    #[test]
    fn test_support_steps_out_of_blast_before_triggering() {
        let map = GridMap::new(10, 6);
        let mut registry = InteractionRegistry::new();
        armed_hazard(&mut registry, TilePos::new(4, 2), 1.25);
        // Orthogonally adjacent, so inside the blast
        let units = vec![
            crew(0, TilePos::new(4, 3)),
            crew(1, TilePos::new(5, 2)),
            hostile(2, TilePos::new(3, 2), AiRole::Support),
        ];
        assert_eq!(
            decide_for(&units, 2, &map, &registry),
            Some(PlayerCommand::Move {
                unit: UnitId(2),
                to: TilePos::new(3, 1)
            })
        );
    }

    #[test]
    fn test_support_never_triggers_hazard_it_cannot_escape() {
        let map = GridMap::new(10, 6);
        let mut registry = InteractionRegistry::new();
        // Every adjacent tile lies inside this blast
        armed_hazard(&mut registry, TilePos::new(4, 2), 1.5);
        let units = vec![
            crew(0, TilePos::new(4, 3)),
            crew(1, TilePos::new(5, 2)),
            hostile(2, TilePos::new(3, 1), AiRole::Support),
        ];
        assert!(matches!(
            decide_for(&units, 2, &map, &registry),
            Some(PlayerCommand::Attack { .. })
        ));
    }

    #[test]
    fn test_support_closes_in_beside_distant_threat() {
        let map = GridMap::new(12, 5);
        let units = vec![
            crew(0, TilePos::new(1, 2)),
            hostile(1, TilePos::new(9, 2), AiRole::Support),
        ];
        assert_eq!(
            decide_for(&units, 1, &map, &InteractionRegistry::new()),
            Some(PlayerCommand::Move {
                unit: UnitId(1),
                to: TilePos::new(2, 2)
            })
        );
    }

    #[test]
    fn test_flanker_without_angle_closes_in_beside_target() {
        let map = GridMap::new(12, 5);
        let mut runner = hostile(1, TilePos::new(9, 2), AiRole::Flanker);
        runner.weapon.range = 1.0;
        let units = vec![crew(0, TilePos::new(1, 2)), runner];
        assert_eq!(
            decide_for(&units, 1, &map, &InteractionRegistry::new()),
            Some(PlayerCommand::Move {
                unit: UnitId(1),
                to: TilePos::new(2, 2)
            })
        );
    }

    #[test]
    fn test_support_ignores_hazard_with_single_enemy() {
        let map = GridMap::new(10, 6);
        let mut registry = InteractionRegistry::new();
        registry.add(
            TilePos::new(4, 2),
            InteractableKind::Hazard {
                state: HazardState::Armed,
                radius: 1.5,
                damage: 30,
            },
        );
        let units = vec![
            crew(0, TilePos::new(4, 3)),
            hostile(1, TilePos::new(3, 1), AiRole::Support),
        ];
        assert!(matches!(
            decide_for(&units, 1, &map, &registry),
            Some(PlayerCommand::Attack { .. })
        ));
    }

    #[test]
    fn test_unaware_unit_returns_to_post() {
        let map = GridMap::new(10, 5);
        let mut guard = hostile(0, TilePos::new(2, 2), AiRole::Guard);
        guard.ai = Some(AiProfile::new(AiRole::Guard).with_post(TilePos::new(6, 2)));
        let units = vec![guard];
        assert_eq!(
            decide_for(&units, 0, &map, &InteractionRegistry::new()),
            Some(PlayerCommand::Move {
                unit: UnitId(0),
                to: TilePos::new(6, 2)
            })
        );
    }
}
