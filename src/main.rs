//! Warbar - run an autonomous NPC-vs-NPC conflict
//!
//! Two AI factions fight a scheduled war over a handful of theaters,
//! with one covert sabotage attempt before the first turn. State is
//! kept as JSON under the data directory, so repeated runs accumulate.

use chrono::{Duration, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use warbar_engine::combat::StatKind;
use warbar_engine::conflict::{AutoTick, ConflictBuilder, ConflictMode};
use warbar_engine::core::error::Result;
use warbar_engine::core::random::{RandomSource, SeededRandom};
use warbar_engine::core::types::Side;
use warbar_engine::core::EngineConfig;
use warbar_engine::intrigue::{Circumstances, OperationBuilder, OperationKind, Scale};
use warbar_engine::npc::{Archetype, NpcConfig, Personality, TechLevel};
use warbar_engine::store::JsonFileStore;
use warbar_engine::Engine;

/// Warbar - autonomous conflict runner
#[derive(Parser, Debug)]
#[command(name = "warbar")]
#[command(about = "Run a seeded NPC-vs-NPC conflict and print the result")]
struct Args {
    /// Random seed for reproducible runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Maximum scheduled turns before the defender is declared the winner
    #[arg(long, default_value_t = 30)]
    turns: u32,

    /// Directory holding conflicts.json and operations.json
    #[arg(long, default_value = "data/run")]
    data_dir: PathBuf,

    /// Engine configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Attacker doctrine
    #[arg(long, default_value = "nato")]
    attacker: String,

    /// Defender doctrine
    #[arg(long, default_value = "defensive_bloc")]
    defender: String,

    /// Theaters to open at the start
    #[arg(long, default_value_t = 3)]
    theaters: u32,

    /// Print every AI decision
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "warbar_engine=debug,warbar=debug"
    } else {
        "warbar_engine=info,warbar=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let interval = config.conflict.auto_resolve_interval_hours;

    let attacker_doctrine: Archetype = args.attacker.parse()?;
    let defender_doctrine: Archetype = args.defender.parse()?;

    let store = JsonFileStore::open(&args.data_dir)?;
    let mut engine = Engine::new(store, config);
    let migrated = engine.migrate_store()?;
    if migrated > 0 {
        tracing::info!("Upgraded {} stored conflicts", migrated);
    }

    let mut rng = SeededRandom::from_seed(args.seed);
    let start = Utc::now();

    let conflict = engine.create_conflict(
        ConflictBuilder::with_defaults("Aurora Compact", "Kestrel League", &engine.config().conflict)
            .mode(ConflictMode::PushPullAuto)
            .npc(
                Side::Attacker,
                NpcConfig::new(attacker_doctrine, TechLevel::Advanced, Personality::Adaptive),
            )
            .npc(
                Side::Defender,
                NpcConfig::new(defender_doctrine, TechLevel::Modern, Personality::Defensive),
            )
            .auto_resolve(interval, args.turns),
        start,
    )?;
    let id = conflict.id;
    for index in 0..args.theaters {
        let name = format!("Front {}", index + 1);
        engine.update_conflict(id, |c| c.add_theater(&name, 40, start))?;
    }

    println!("\n=== WARBAR ===");
    println!("Conflict {}: {}", id, conflict.name);
    println!(
        "{} ({}) vs {} ({}), seed {}",
        conflict.attacker, attacker_doctrine, conflict.defender, defender_doctrine, args.seed
    );

    let operation = engine.plan_operation(
        OperationBuilder::new(OperationKind::Sabotage, conflict.defender.as_str(), conflict.attacker.as_str())
            .operator("Kestrel Directorate")
            .scale(Scale::Medium)
            .circumstances(Circumstances {
                target_category: Some(StatKind::Military),
                ..Circumstances::default()
            }),
        start,
    )?;
    let roll = rng.roll_d20();
    let report = engine.resolve_operation(operation.id, roll, &mut rng, start)?;
    println!(
        "Opening sabotage: rolled {} -> {} ({})",
        roll, report.resolution.outcome, report.operation.status
    );
    for effect in &report.effects {
        println!("  {}", effect);
    }
    println!();

    for step in 0..=args.turns {
        let now = start + Duration::minutes((interval * 60.0 * f64::from(step)) as i64);
        for (ticked, tick) in engine.run_due_npc_turns(&mut rng, now)? {
            if ticked != id {
                continue;
            }
            match tick {
                AutoTick::Resolved(turn) => println!(
                    "Turn {:>2}: {:<9} margin {:>2} damage {:>2} momentum {:+}",
                    turn.turn, turn.winner, turn.margin, turn.damage, turn.tactical_momentum
                ),
                AutoTick::TurnLimit => println!("Turn limit reached, the defender held"),
                AutoTick::Skipped(_) => {}
            }
        }
        if engine.conflict(id)?.concluded {
            break;
        }
    }

    let conflict = engine.conflict(id)?;
    println!("\nWarbar {} / ±{}", conflict.warbar, conflict.max_value);
    for theater in &conflict.board.theaters {
        let owner = theater
            .captured_by
            .map(|side| conflict.faction(side).to_string())
            .unwrap_or_else(|| "contested".to_string());
        println!(
            "  {:<10} {:>4} / ±{} ({})",
            theater.name, theater.current_value, theater.max_value, owner
        );
    }
    println!(
        "Strategic momentum: {} {} / {} {}",
        conflict.attacker, conflict.strategic_momentum.attacker, conflict.defender, conflict.strategic_momentum.defender
    );
    match conflict.victor {
        Some(victor) => println!("Outcome: {}", victor),
        None => println!("Outcome: still open after {} turns", conflict.turn),
    }
    Ok(())
}
