//! Mech Combat Engine - Development Tools

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use mech_core::rules::StandardRules;
use mech_core::to_hit::Weapon;
use mech_core::unit::MovementMode;
use mech_tools::probe::{self, FallProbe, HeatProbe, ToHitProbe};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mech-tools")]
#[command(about = "Development tools for the mech combat engine")]
struct Cli {
    /// Rules file to use instead of the built-in tables
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate rules files
    ValidateRules {
        /// Rules file or directory of `.ron` files
        #[arg(default_value = "assets/rules")]
        path: String,
    },
    /// Roll falling damage for a generated mech
    SimulateFall {
        /// Mech tonnage
        #[arg(long, default_value_t = 50)]
        tonnage: u32,
        /// Levels fallen
        #[arg(long, default_value_t = 0)]
        levels: u32,
        /// The mech was jumping
        #[arg(long)]
        jumping: bool,
        /// Piloting skill
        #[arg(long, default_value_t = 5)]
        piloting: i32,
        /// Dice seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Check shutdown at a heat level
    HeatCheck {
        /// Current heat
        heat: i32,
        /// Pilot is unconscious
        #[arg(long)]
        unconscious: bool,
        /// Dice seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Break down a medium laser shot
    ToHit {
        /// Distance in hexes
        distance: i32,
        /// Attacker gunnery
        #[arg(long, default_value_t = 4)]
        gunnery: i32,
        /// Attacker movement
        #[arg(long, value_enum, default_value_t = Movement::Stationary)]
        movement: Movement,
        /// Hexes the target moved
        #[arg(long, default_value_t = 0)]
        target_moved: u32,
        /// Attacker heat
        #[arg(long, default_value_t = 0)]
        heat: i32,
        /// Light woods hexes in front of the target
        #[arg(long, default_value_t = 0)]
        woods: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Movement {
    Stationary,
    Walked,
    Ran,
    Jumped,
}

impl From<Movement> for MovementMode {
    fn from(movement: Movement) -> Self {
        match movement {
            Movement::Stationary => Self::Stationary,
            Movement::Walked => Self::Walked,
            Movement::Ran => Self::Ran,
            Movement::Jumped => Self::Jumped,
        }
    }
}

fn medium_laser() -> Weapon {
    Weapon {
        name: "Medium Laser".to_string(),
        min_range: 0,
        short_range: 3,
        medium_range: 6,
        long_range: 9,
        damage: 5,
        heat: 3,
    }
}

fn print<T: Serialize + std::fmt::Debug>(value: &T, json: bool) -> mech_tools::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{value:#?}");
    }
    Ok(())
}

fn load_rules(path: Option<&Path>) -> mech_tools::Result<StandardRules> {
    match path {
        Some(path) => Ok(StandardRules::load(path)?),
        None => Ok(StandardRules::default()),
    }
}

fn run(cli: Cli) -> mech_tools::Result<bool> {
    match cli.command {
        Commands::ValidateRules { path } => {
            tracing::info!("Validating rules files in: {path}");
            let reports = mech_tools::validate::validate_path(Path::new(&path))?;
            for report in &reports {
                match &report.error {
                    None => println!("ok    {}", report.path.display()),
                    Some(e) => println!("FAIL  {}: {e}", report.path.display()),
                }
            }
            Ok(!reports.is_empty() && reports.iter().all(|r| r.is_ok()))
        }
        Commands::SimulateFall {
            tonnage,
            levels,
            jumping,
            piloting,
            seed,
        } => {
            let rules = load_rules(cli.rules.as_deref())?;
            let data = probe::simulate_fall(
                &rules,
                &FallProbe {
                    tonnage,
                    levels,
                    jumping,
                    piloting,
                    seed,
                },
            )?;
            print(&data, cli.json)?;
            Ok(true)
        }
        Commands::HeatCheck { heat, unconscious, seed } => {
            let rules = load_rules(cli.rules.as_deref())?;
            let report = probe::heat_check(
                &rules,
                &HeatProbe {
                    heat,
                    unconscious,
                    turn: 1,
                    seed,
                },
            )?;
            print(&report, cli.json)?;
            Ok(true)
        }
        Commands::ToHit {
            distance,
            gunnery,
            movement,
            target_moved,
            heat,
            woods,
        } => {
            let rules = load_rules(cli.rules.as_deref())?;
            let breakdown = probe::to_hit(
                &rules,
                &ToHitProbe {
                    distance,
                    gunnery,
                    attacker_movement: movement.into(),
                    target_moved,
                    heat,
                    light_woods: woods,
                    weapon: medium_laser(),
                },
            )?;
            print(&breakdown, cli.json)?;
            Ok(true)
        }
    }
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => tracing::info!("Done"),
        Ok(false) => {
            tracing::error!("Validation failed");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    }
}
