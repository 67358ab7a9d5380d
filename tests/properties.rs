//! Property tests for cover, fog of war, and channel interrupts

use proptest::prelude::*;

use squad_tactics::battle::*;
use squad_tactics::core::config::CombatConfig;
use squad_tactics::core::{Faction, InteractableId, UnitId};

const SIZE: i32 = 8;

fn weapon() -> WeaponDef {
    WeaponDef {
        id: "rifle".into(),
        name: "Rifle".into(),
        range: 12.0,
        damage: 20,
        accuracy: 0.7,
        cooldown_ticks: 4,
        magazine_size: 5,
        reload_ticks: 20,
    }
}

fn soldier(id: u32, faction: Faction, pos: TilePos) -> Unit {
    Unit::new(UnitId(id), format!("unit-{}", id), faction, pos, 100, weapon())
}

fn tile() -> impl Strategy<Value = TilePos> {
    (0..SIZE, 0..SIZE).prop_map(|(x, y)| TilePos::new(x, y))
}

fn tier() -> impl Strategy<Value = CoverTier> {
    prop_oneof![
        Just(CoverTier::None),
        Just(CoverTier::Low),
        Just(CoverTier::Half),
        Just(CoverTier::High),
    ]
}

/// Random walls, roughly one tile in five
fn walled_map() -> impl Strategy<Value = GridMap> {
    prop::collection::vec(prop::bool::weighted(0.2), (SIZE * SIZE) as usize).prop_map(|walls| {
        let mut map = GridMap::new(SIZE as u32, SIZE as u32);
        for (i, wall) in walls.into_iter().enumerate() {
            if wall {
                let pos = TilePos::new(i as i32 % SIZE, i as i32 / SIZE);
                map.set_kind(pos, TileKind::Blocked);
            }
        }
        map.derive_cover(CoverTier::Half);
        map
    })
}

fn map_with_obstacle(at: TilePos, tier: CoverTier) -> GridMap {
    let mut map = GridMap::new(SIZE as u32, SIZE as u32);
    if tier.is_cover() {
        map.set_obstacle(at, tier);
    }
    map.derive_cover(CoverTier::Half);
    map
}

proptest! {
    #[test]
    fn test_higher_cover_never_raises_hit_chance(
        attacker in tile(),
        low in tier(),
        high in tier(),
    ) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let target = TilePos::new(4, 4);
        let obstacle = TilePos::new(3, 4);
        prop_assume!(attacker != target && attacker != obstacle);

        let config = CombatConfig::default();
        let shooter = soldier(0, Faction::Friendly, attacker);
        let victim = soldier(1, Faction::Hostile, target);

        let weaker = hit_chance(&shooter, &victim, &weapon(), &map_with_obstacle(obstacle, low), &config);
        let stronger = hit_chance(&shooter, &victim, &weapon(), &map_with_obstacle(obstacle, high), &config);
        prop_assert!(stronger <= weaker + 1e-6);

        // Strictly lower whenever the obstacle actually faces the shot
        let faces_shot = map_with_obstacle(obstacle, CoverTier::High)
            .cover_against(target, attacker) == CoverTier::High;
        if faces_shot && low < high {
            prop_assert!(stronger < weaker);
        }
    }

    #[test]
    fn test_flanking_never_reduces_odds(
        map in walled_map(),
        attacker in tile(),
        target in tile(),
    ) {
        prop_assume!(attacker != target);
        let config = CombatConfig::default();
        let shooter = soldier(0, Faction::Friendly, attacker);
        let victim = soldier(1, Faction::Hostile, target);
        let open = GridMap::new(SIZE as u32, SIZE as u32);

        // Same distance, no cover: the flanked shot is at least as good
        let covered = hit_chance(&shooter, &victim, &weapon(), &map, &config);
        let flanked = hit_chance(&shooter, &victim, &weapon(), &open, &config);
        prop_assert!(flanked + 1e-6 >= covered);
        if map.cover_against(target, attacker) == CoverTier::None {
            prop_assert!((flanked - covered).abs() < 1e-6);
        }
    }

    #[test]
    fn test_fog_never_returns_to_unknown(
        map in walled_map(),
        route in prop::collection::vec(tile(), 1..12),
    ) {
        let mut field = VisibilityField::for_map(&map);
        let mut seen = vec![false; (SIZE * SIZE) as usize];

        for pos in route {
            let mut scout = soldier(0, Faction::Friendly, pos);
            scout.vision_radius = 3.0;
            field.recompute(&map, &[scout]);

            for p in map.positions() {
                let i = (p.y * SIZE + p.x) as usize;
                let state = field.state(p);
                if seen[i] {
                    prop_assert_ne!(state, FogState::Unknown);
                }
                if state != FogState::Unknown {
                    seen[i] = true;
                }
            }
        }
    }

    #[test]
    fn test_vision_union_grows_with_squad(
        map in walled_map(),
        positions in prop::collection::vec(tile(), 1..5),
        extra in tile(),
    ) {
        let squad: Vec<Unit> = positions
            .iter()
            .enumerate()
            .map(|(i, pos)| soldier(i as u32, Faction::Friendly, *pos))
            .collect();
        let mut larger = squad.clone();
        larger.push(soldier(99, Faction::Friendly, extra));

        let before = VisibilityField::calculate_visible(&map, &squad);
        let after = VisibilityField::calculate_visible(&map, &larger);
        prop_assert!(before.is_subset(&after));
    }

    #[test]
    fn test_interrupt_resets_channel(
        duration in 2u32..40,
        elapsed_frac in 0.0f32..1.0,
        interrupt in 0u8..3,
    ) {
        let elapsed = ((duration - 1) as f32 * elapsed_frac) as u32;
        let mut operator = soldier(0, Faction::Friendly, TilePos::new(1, 1));
        prop_assert!(operator.issue_channel(ChannelKind::Hack, InteractableId(0), duration));
        for _ in 0..elapsed {
            let report = operator.tick(0.05);
            prop_assert!(report.channel_completed.is_none());
        }
        prop_assert_eq!(operator.channel_progress(), elapsed);

        let cancelled = match interrupt {
            0 => operator.issue_move(TilePos::new(3, 3)),
            1 => operator.issue_attack(UnitId(7)),
            _ => operator.take_damage(1).cancelled,
        };
        prop_assert!(cancelled.is_some());
        prop_assert_eq!(operator.channel_state(), ChannelState::Idle);
        prop_assert_eq!(operator.channel_progress(), 0);
    }
}
