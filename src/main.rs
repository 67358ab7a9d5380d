//! Squad Tactics - headless mission runner
//!
//! Loads a mission file, plays its command script against the AI, and prints
//! the outcome record as JSON or a text summary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use squad_tactics::battle::{MissionOutcome, MissionSpec, WeaponCatalog};
use squad_tactics::core::{Result, SimConfig};

/// Headless Mission Runner - replay a scripted mission and report the outcome
#[derive(Parser, Debug)]
#[command(name = "squad-tactics")]
#[command(about = "Run a scripted squad mission and print its outcome")]
struct Args {
    /// Mission file (TOML, or JSON with a .json extension)
    mission: PathBuf,

    /// Weapon catalog
    #[arg(long, default_value = "data/weapons.toml")]
    weapons: PathBuf,

    /// Simulation tunables; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the mission's random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum ticks before the run is cut off
    #[arg(long, default_value_t = 6000)]
    max_ticks: u64,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print every mission event as it happens
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn run(args: &Args) -> Result<MissionOutcome> {
    let mut spec = MissionSpec::load(&args.mission)?;
    if let Some(seed) = args.seed {
        spec.seed = seed;
    }
    let weapons = WeaponCatalog::load(&args.weapons)?;
    let config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    let mut sim = spec.build(&weapons, config)?;
    tracing::info!(mission = %spec.name, seed = spec.seed, "Starting mission");

    if !args.verbose {
        return Ok(sim.run(&spec.script, args.max_ticks));
    }

    Ok(sim.run_with(&spec.script, args.max_ticks, |sim| {
        for event in sim.drain_events() {
            println!("[{:>5}] {}", event.tick, event.description);
        }
    }))
}

fn print_text(outcome: &MissionOutcome) {
    println!("=== {} ===", outcome.mission);
    match outcome.result {
        Some(result) => println!("Result: {:?} after {} ticks", result, outcome.ticks),
        None => println!("Unresolved after {} ticks", outcome.ticks),
    }
    println!("Alarm: {:?}", outcome.alarm);
    println!();
    println!("Crew:");
    for crew in &outcome.crew {
        println!(
            "  {:<12} {:?} hp={} shots={} hits={} kills={} xp={}",
            crew.name, crew.status, crew.health, crew.rounds_fired, crew.hits, crew.kills, crew.experience
        );
    }
    println!("Hostiles:");
    for hostile in &outcome.hostiles {
        println!("  {:<12} {:?} kills={}", hostile.name, hostile.status, hostile.kills);
    }
    if !outcome.objectives.is_empty() {
        println!("Objectives:");
        for objective in &outcome.objectives {
            let mark = if objective.complete { "x" } else { " " };
            println!("  [{}] {}", mark, objective.description);
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("squad_tactics=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let outcome = match run(&args) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.format == "text" {
        print_text(&outcome);
    } else {
        match serde_json::to_string_pretty(&outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
