//! Combat and interaction scenarios on small hand-built maps

use squad_tactics::battle::*;
use squad_tactics::core::{Faction, SimConfig, UnitId};

fn carbine() -> WeaponDef {
    WeaponDef {
        id: "carbine".into(),
        name: "Carbine".into(),
        range: 8.0,
        damage: 25,
        accuracy: 0.70,
        cooldown_ticks: 10,
        magazine_size: 6,
        reload_ticks: 30,
    }
}

fn unit(id: u32, faction: Faction, pos: TilePos) -> Unit {
    Unit::new(UnitId(id), format!("unit-{}", id), faction, pos, 100, carbine())
}

fn simulation(rows: &[&str], units: Vec<Unit>, config: SimConfig) -> Simulation {
    let layout = parse_template(rows, config.combat.wall_cover_tier).unwrap();
    let registry = InteractionRegistry::from_spawns(&layout.interactables, &config.interaction);
    Simulation::new("scenario", layout.map, units, registry, config, 1)
}

#[test]
fn test_scenario_a_open_room() {
    let map = GridMap::new(5, 5);
    let attacker = unit(0, Faction::Friendly, TilePos::new(0, 2));
    let target = unit(1, Faction::Hostile, TilePos::new(4, 2));

    let chance = hit_chance(&attacker, &target, &carbine(), &map, &SimConfig::default().combat);
    assert!((chance - 0.595).abs() < 1e-5, "got {}", chance);
}

#[test]
fn test_scenario_b_wall_beside_target() {
    // Wall directly west of the target, between it and the shooter
    let mut map = GridMap::new(5, 5);
    map.set_kind(TilePos::new(3, 2), TileKind::Blocked);
    map.derive_cover(CoverTier::Half);

    let attacker = unit(0, Faction::Friendly, TilePos::new(0, 2));
    let target = unit(1, Faction::Hostile, TilePos::new(4, 2));
    let config = SimConfig::default().combat;

    assert_eq!(map.cover_against(target.position, attacker.position), CoverTier::Half);
    let chance = hit_chance(&attacker, &target, &carbine(), &map, &config);
    assert!((chance - 0.4165).abs() < 1e-5, "got {}", chance);
}

#[test]
fn test_scenario_c_wall_does_not_face_the_shot() {
    let mut map = GridMap::new(5, 5);
    map.set_kind(TilePos::new(3, 2), TileKind::Blocked);
    map.derive_cover(CoverTier::Half);
    let open = GridMap::new(5, 5);

    let attacker = unit(0, Faction::Friendly, TilePos::new(4, 4));
    let target = unit(1, Faction::Hostile, TilePos::new(4, 2));
    let config = SimConfig::default().combat;

    assert_eq!(map.cover_against(target.position, attacker.position), CoverTier::None);
    let covered = hit_chance(&attacker, &target, &carbine(), &map, &config);
    let uncovered = hit_chance(&attacker, &target, &carbine(), &open, &config);
    assert!((covered - uncovered).abs() < 1e-6);
    assert!((uncovered - 0.70 * (1.0 - (2.0 / 8.0) * 0.30)).abs() < 1e-5);

    // Only a shot arriving from the wall's side is covered
    let northwest = unit(2, Faction::Friendly, TilePos::new(2, 0));
    assert_eq!(map.cover_against(target.position, northwest.position), CoverTier::None);
    let west_low = unit(3, Faction::Friendly, TilePos::new(1, 2));
    assert_eq!(map.cover_against(target.position, west_low.position), CoverTier::Half);
}

#[test]
fn test_scenario_d_move_interrupts_unlock() {
    let mut config = SimConfig::default();
    config.interaction.unlock_ticks = 10;
    let mut sim = simulation(
        &["..L..", "....."],
        vec![unit(0, Faction::Friendly, TilePos::new(1, 0))],
        config,
    );
    let door = sim.registry().at(TilePos::new(2, 0)).unwrap().id;

    assert!(sim.apply_command(PlayerCommand::Interact {
        unit: UnitId(0),
        interactable: door,
        action: ActionKind::Unlock,
    }));
    for _ in 0..6 {
        sim.process_tick();
    }
    assert_eq!(sim.unit(UnitId(0)).unwrap().channel_progress(), 6);

    assert!(sim.apply_command(PlayerCommand::Move {
        unit: UnitId(0),
        to: TilePos::new(0, 1),
    }));
    let operator = sim.unit(UnitId(0)).unwrap();
    assert_eq!(operator.channel_state(), ChannelState::Idle);
    assert_eq!(operator.channel_progress(), 0);

    for _ in 0..10 {
        sim.process_tick();
    }
    assert_eq!(
        sim.registry().get(door).unwrap().state(),
        InteractableState::Door(DoorState::Locked)
    );

    let events = sim.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e.event_type, MissionEventType::ChannelInterrupted { .. })));
    assert!(!events
        .iter()
        .any(|e| matches!(e.event_type, MissionEventType::ChannelCompleted { .. })));
}

#[test]
fn test_scenario_d_uninterrupted_unlock_opens_door() {
    let mut config = SimConfig::default();
    config.interaction.unlock_ticks = 10;
    let mut sim = simulation(
        &["..L..", "....."],
        vec![unit(0, Faction::Friendly, TilePos::new(1, 0))],
        config,
    );
    let door = sim.registry().at(TilePos::new(2, 0)).unwrap().id;
    sim.apply_command(PlayerCommand::Interact {
        unit: UnitId(0),
        interactable: door,
        action: ActionKind::Unlock,
    });
    for _ in 0..10 {
        sim.process_tick();
    }
    assert_eq!(
        sim.registry().get(door).unwrap().state(),
        InteractableState::Door(DoorState::Open)
    );
    assert!(sim.map().is_occupiable(TilePos::new(2, 0)));
}

#[test]
fn test_scenario_e_hazard_ignores_faction() {
    let mut sim = simulation(
        &[".....", "..X..", "....."],
        vec![
            unit(0, Faction::Friendly, TilePos::new(1, 1)),
            unit(1, Faction::Hostile, TilePos::new(3, 1)),
            unit(2, Faction::Friendly, TilePos::new(0, 0)),
        ],
        SimConfig::default(),
    );
    let hazard = sim.registry().at(TilePos::new(2, 1)).unwrap().id;
    let damage = sim.config().interaction.hazard_damage;

    assert!(sim.apply_command(PlayerCommand::Interact {
        unit: UnitId(0),
        interactable: hazard,
        action: ActionKind::Trigger,
    }));

    assert_eq!(sim.unit(UnitId(0)).unwrap().health, 100 - damage);
    assert_eq!(sim.unit(UnitId(1)).unwrap().health, 100 - damage);
    // (0,0) is sqrt(5) from the hazard, outside the default radius
    assert_eq!(sim.unit(UnitId(2)).unwrap().health, 100);
    assert_eq!(
        sim.registry().get(hazard).unwrap().state(),
        InteractableState::Hazard(HazardState::Triggered)
    );

    let events = sim.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e.event_type, MissionEventType::HazardTriggered { by, .. } if by == UnitId(0))));
    let damaged = events
        .iter()
        .filter(|e| matches!(e.event_type, MissionEventType::UnitDamaged { .. }))
        .count();
    assert_eq!(damaged, 2);

    // A spent hazard cannot be triggered again
    assert!(!sim.apply_command(PlayerCommand::Interact {
        unit: UnitId(0),
        interactable: hazard,
        action: ActionKind::Trigger,
    }));
}

#[test]
fn test_hazard_kill_credits_triggerer() {
    let mut config = SimConfig::default();
    config.interaction.hazard_damage = 200;
    let mut sim = simulation(
        &[".....", "..X..", "....."],
        vec![
            unit(0, Faction::Friendly, TilePos::new(0, 0)),
            unit(1, Faction::Friendly, TilePos::new(2, 2)),
            unit(2, Faction::Hostile, TilePos::new(3, 1)),
        ],
        config,
    );
    let hazard = sim.registry().at(TilePos::new(2, 1)).unwrap().id;

    // Unit 1 stands right below the hazard and dies with the hostile
    sim.apply_command(PlayerCommand::Interact {
        unit: UnitId(1),
        interactable: hazard,
        action: ActionKind::Trigger,
    });
    assert!(!sim.unit(UnitId(1)).unwrap().is_alive());
    assert!(!sim.unit(UnitId(2)).unwrap().is_alive());
    assert_eq!(sim.unit(UnitId(1)).unwrap().kills, 1);

    sim.process_tick();
    assert_eq!(sim.result(), Some(MissionResult::Victory));
}

#[test]
fn test_visible_hostiles_hides_revealed_tiles() {
    let mut crew = unit(0, Faction::Friendly, TilePos::new(5, 0));
    crew.vision_radius = 2.0;
    let hostile = unit(1, Faction::Hostile, TilePos::new(6, 0));

    let mut sim = simulation(&["..........", ".........."], vec![crew, hostile], SimConfig::default());
    assert_eq!(sim.visible_hostiles().len(), 1);

    sim.apply_command(PlayerCommand::Move {
        unit: UnitId(0),
        to: TilePos::new(0, 1),
    });
    for _ in 0..40 {
        sim.process_tick();
    }
    assert_eq!(sim.unit(UnitId(0)).unwrap().position, TilePos::new(0, 1));
    assert_eq!(sim.visibility().state(TilePos::new(6, 0)), FogState::Revealed);
    assert!(sim.visible_hostiles().is_empty());
}
