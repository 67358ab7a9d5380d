//! Grid movement and collision resolution
//!
//! Units walk their planned path one tile per accumulated unit of
//! `move_progress`. Conflicts are settled in roster order: a tile occupied at
//! the start of the phase, or already claimed by an earlier unit this tick,
//! cannot be entered.

use ahash::AHashSet;

use crate::battle::coords::TilePos;
use crate::battle::grid_map::GridMap;
use crate::battle::pathfinding::{can_step, find_path, find_path_avoiding};
use crate::battle::units::Unit;
use crate::core::types::UnitId;

/// What happened to one unit during the movement phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementOutcome {
    Stepped {
        unit: UnitId,
        from: TilePos,
        to: TilePos,
    },
    Arrived {
        unit: UnitId,
        at: TilePos,
    },
    Waiting {
        unit: UnitId,
        blocked_at: TilePos,
    },
    Unreachable {
        unit: UnitId,
        destination: TilePos,
    },
}

/// Plan a path for the unit's destination; false when none exists
fn plan_path(unit: &mut Unit, map: &GridMap, avoid: Option<&AHashSet<TilePos>>) -> bool {
    let Some(destination) = unit.destination else {
        return false;
    };
    let path = match avoid {
        Some(avoid) => find_path_avoiding(map, unit.position, destination, avoid),
        None => find_path(map, unit.position, destination),
    };
    match path {
        Some(path) => {
            unit.path = path.into_iter().skip(1).collect();
            true
        }
        None => false,
    }
}

/// Advance every moving unit by at most one tile
pub fn advance_movement(units: &mut [Unit], map: &GridMap) -> Vec<MovementOutcome> {
    let mut outcomes = Vec::new();
    let occupied: AHashSet<TilePos> = units
        .iter()
        .filter(|u| u.is_alive())
        .map(|u| u.position)
        .collect();
    let mut claimed: AHashSet<TilePos> = AHashSet::new();

    for unit in units.iter_mut() {
        if !unit.is_alive() {
            continue;
        }
        let Some(destination) = unit.destination else {
            continue;
        };

        if unit.position == destination {
            unit.clear_destination();
            outcomes.push(MovementOutcome::Arrived {
                unit: unit.id,
                at: destination,
            });
            continue;
        }

        if unit.path.is_empty() && !plan_path(unit, map, None) {
            unit.clear_destination();
            outcomes.push(MovementOutcome::Unreachable {
                unit: unit.id,
                destination,
            });
            continue;
        }

        if !unit.ready_to_step() {
            continue;
        }

        // Terrain may have changed since planning (a door swung shut)
        let path_valid = unit
            .path
            .front()
            .map(|next| can_step(map, unit.position, *next))
            .unwrap_or(false);
        if !path_valid && !plan_path(unit, map, None) {
            unit.clear_destination();
            outcomes.push(MovementOutcome::Unreachable {
                unit: unit.id,
                destination,
            });
            continue;
        }

        let Some(mut next) = unit.path.front().copied() else {
            continue;
        };
        let taken = |pos: &TilePos| occupied.contains(pos) || claimed.contains(pos);

        if taken(&next) {
            // Try to route around the blocker before waiting a tick
            let mut busy: AHashSet<TilePos> = occupied.union(&claimed).copied().collect();
            busy.remove(&unit.position);
            let saved = unit.path.clone();
            if plan_path(unit, map, Some(&busy)) {
                next = unit.path.front().copied().unwrap_or(next);
            }
            if taken(&next) {
                unit.path = saved;
                outcomes.push(MovementOutcome::Waiting {
                    unit: unit.id,
                    blocked_at: next,
                });
                continue;
            }
        }

        let from = unit.position;
        claimed.insert(next);
        unit.step_to(next);
        outcomes.push(MovementOutcome::Stepped {
            unit: unit.id,
            from,
            to: next,
        });
        if unit.position == destination {
            outcomes.push(MovementOutcome::Arrived {
                unit: unit.id,
                at: destination,
            });
        }
    }

    debug_assert!(
        {
            let mut seen = AHashSet::new();
            units
                .iter()
                .filter(|u| u.is_alive())
                .all(|u| seen.insert(u.position))
        },
        "two living units share a tile"
    );

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::grid_map::TileKind;
    use crate::battle::weapons::WeaponDef;
    use crate::core::types::Faction;

    fn runner(id: u32, pos: TilePos) -> Unit {
        let weapon = WeaponDef {
            id: "pistol".into(),
            name: "Pistol".into(),
            range: 5.0,
            damage: 10,
            accuracy: 0.6,
            cooldown_ticks: 5,
            magazine_size: 8,
            reload_ticks: 20,
        };
        let mut unit = Unit::new(UnitId(id), "runner", Faction::Friendly, pos, 50, weapon);
        unit.move_speed = 20.0; // one tile per tick at the default rate
        unit
    }

    fn tick_all(units: &mut [Unit]) {
        for unit in units.iter_mut() {
            unit.tick(0.05);
        }
    }

    #[test]
    fn test_unit_walks_to_destination() {
        let map = GridMap::new(8, 3);
        let mut units = vec![runner(0, TilePos::new(0, 1))];
        units[0].issue_move(TilePos::new(4, 1));

        let mut arrived = false;
        for _ in 0..10 {
            let outcomes = advance_movement(&mut units, &map);
            arrived |= outcomes
                .iter()
                .any(|o| matches!(o, MovementOutcome::Arrived { .. }));
            tick_all(&mut units);
        }
        assert!(arrived);
        assert_eq!(units[0].position, TilePos::new(4, 1));
        assert!(!units[0].is_moving());
    }

    #[test]
    fn test_unreachable_destination_is_dropped() {
        let mut map = GridMap::new(5, 5);
        map.set_kind(TilePos::new(4, 4), TileKind::Blocked);
        let mut units = vec![runner(0, TilePos::new(0, 0))];
        units[0].issue_move(TilePos::new(4, 4));

        let outcomes = advance_movement(&mut units, &map);
        assert!(matches!(outcomes[0], MovementOutcome::Unreachable { .. }));
        assert!(!units[0].is_moving());
    }

    #[test]
    fn test_earlier_unit_wins_contested_tile() {
        let map = GridMap::new(3, 1);
        let mut units = vec![runner(0, TilePos::new(0, 0)), runner(1, TilePos::new(2, 0))];
        units[0].issue_move(TilePos::new(1, 0));
        units[1].issue_move(TilePos::new(1, 0));
        advance_movement(&mut units, &map);
        tick_all(&mut units);

        let outcomes = advance_movement(&mut units, &map);
        assert_eq!(units[0].position, TilePos::new(1, 0));
        assert_eq!(units[1].position, TilePos::new(2, 0));
        assert!(outcomes
            .iter()
            .any(|o| matches!(o, MovementOutcome::Waiting { unit, .. } if *unit == UnitId(1))));
    }

    #[test]
    fn test_vacated_tile_is_not_entered_same_tick() {
        let map = GridMap::new(4, 1);
        let mut units = vec![runner(0, TilePos::new(0, 0)), runner(1, TilePos::new(1, 0))];
        units[0].issue_move(TilePos::new(1, 0));
        units[1].issue_move(TilePos::new(3, 0));
        advance_movement(&mut units, &map);
        tick_all(&mut units);

        advance_movement(&mut units, &map);
        // Unit 1 stepped off, but unit 0 had to wait for the next tick
        assert_eq!(units[1].position, TilePos::new(2, 0));
        assert_eq!(units[0].position, TilePos::new(0, 0));

        tick_all(&mut units);
        advance_movement(&mut units, &map);
        assert_eq!(units[0].position, TilePos::new(1, 0));
    }

    #[test]
    fn test_routes_around_standing_unit() {
        let map = GridMap::new(5, 3);
        let mut units = vec![runner(0, TilePos::new(0, 1)), runner(1, TilePos::new(1, 1))];
        units[0].issue_move(TilePos::new(4, 1));
        advance_movement(&mut units, &map);
        tick_all(&mut units);

        advance_movement(&mut units, &map);
        assert_ne!(units[0].position, TilePos::new(0, 1));
        assert_ne!(units[0].position, units[1].position);
    }

    #[test]
    fn test_closed_door_forces_replan() {
        let mut map = GridMap::new(5, 3);
        let mut units = vec![runner(0, TilePos::new(0, 1))];
        units[0].issue_move(TilePos::new(4, 1));
        advance_movement(&mut units, &map);
        let planned: Vec<TilePos> = units[0].path.iter().copied().collect();
        assert_eq!(planned[0], TilePos::new(1, 1));

        map.set_door_open(TilePos::new(1, 1), false);
        tick_all(&mut units);
        advance_movement(&mut units, &map);
        assert_ne!(units[0].position, TilePos::new(1, 1));
        assert_ne!(units[0].position, TilePos::new(0, 1));
    }
}
