//! Full mission runs from the data directory

use squad_tactics::battle::*;
use squad_tactics::core::{SimConfig, UnitId};

fn load(path: &str) -> (MissionSpec, Simulation) {
    let spec = MissionSpec::load(path).expect("mission should parse");
    let weapons = WeaponCatalog::load("data/weapons.toml").expect("weapons should parse");
    let config = SimConfig::load("data/sim_config.toml").expect("config should parse");
    let sim = spec.build(&weapons, config).expect("mission should build");
    (spec, sim)
}

#[test]
fn test_relay_station_hack_wins() {
    let (spec, mut sim) = load("data/missions/relay_station.toml");
    assert_eq!(sim.units().len(), 6);
    assert_eq!(sim.registry().len(), 4);

    let outcome = sim.run(&spec.script, 2000);
    assert_eq!(outcome.result, Some(MissionResult::Victory));
    assert_eq!(outcome.objectives_complete(), 1);
    assert_eq!(outcome.crew_alive(), 3);

    // The hack released the linked hatch
    let hatch = sim.registry().at(TilePos::new(4, 5)).unwrap();
    assert_eq!(hatch.state(), InteractableState::Door(DoorState::Closed));

    // Survivors collect the objective and survival awards
    let config = SimConfig::default().mission;
    for crew in &outcome.crew {
        assert!(crew.experience >= config.xp_per_objective + config.xp_survival);
    }
}

#[test]
fn test_warehouse_raid_terminates_or_times_out() {
    let (spec, mut sim) = load("data/missions/warehouse_raid.toml");
    let outcome = sim.run(&spec.script, 3000);
    assert!(outcome.ticks <= 3000);
    if let Some(result) = outcome.result {
        assert_eq!(outcome.ticks, sim.tick());
        assert_eq!(sim.result(), Some(result));
    }
    assert_eq!(outcome.hostiles.len(), 3);
}

#[test]
fn test_same_seed_replays_identically() {
    let run = || {
        let (spec, mut sim) = load("data/missions/warehouse_raid.toml");
        let mut log = Vec::new();
        let outcome = sim.run_with(&spec.script, 1500, |sim| log.extend(sim.drain_events()));
        let positions: Vec<TilePos> = sim.units().iter().map(|u| u.position).collect();
        assert_eq!(outcome, sim.outcome());
        (log, positions, outcome)
    };

    let (events_a, positions_a, outcome_a) = run();
    let (events_b, positions_b, outcome_b) = run();
    assert_eq!(events_a, events_b);
    assert_eq!(positions_a, positions_b);
    assert_eq!(outcome_a, outcome_b);
}

#[test]
fn test_different_seed_still_valid() {
    let (mut spec, _) = load("data/missions/warehouse_raid.toml");
    spec.seed = 9001;
    let weapons = WeaponCatalog::load("data/weapons.toml").unwrap();
    let mut sim = spec.build(&weapons, SimConfig::default()).unwrap();
    let outcome = sim.run(&spec.script, 1000);

    // Whatever happened, every unit occupies its own tile
    let mut tiles: Vec<TilePos> = sim
        .units()
        .iter()
        .filter(|u| u.is_alive())
        .map(|u| u.position)
        .collect();
    let living = tiles.len();
    tiles.sort_by_key(|p| (p.y, p.x));
    tiles.dedup();
    assert_eq!(tiles.len(), living);
    assert_eq!(outcome.crew.len(), 3);
}

#[test]
fn test_pause_holds_mission_clock() {
    let (spec, mut sim) = load("data/missions/relay_station.toml");
    for scripted in spec.script.iter().filter(|s| s.tick == 0) {
        sim.apply_command(scripted.command);
    }
    sim.process_tick();
    let before: Vec<TilePos> = sim.units().iter().map(|u| u.position).collect();
    let progress = sim.unit(UnitId(0)).unwrap().move_progress;

    sim.pause();
    for _ in 0..50 {
        assert!(!sim.process_tick());
    }
    assert_eq!(sim.tick(), 1);
    let after: Vec<TilePos> = sim.units().iter().map(|u| u.position).collect();
    assert_eq!(before, after);
    assert_eq!(sim.unit(UnitId(0)).unwrap().move_progress, progress);

    // A paused run returns immediately
    let outcome = sim.run(&[], 100);
    assert_eq!(outcome.ticks, 1);
    assert!(!outcome.is_finished());

    sim.resume();
    assert!(sim.process_tick());
    assert_eq!(sim.tick(), 2);
}
