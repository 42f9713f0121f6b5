#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs and visualizes Skirmish battles.

mod scenario;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use skirmish_core::{Event, UnitId, WELCOME_BANNER};
use skirmish_rendering::{Color, GridLayout, Presentation, RenderingBackend, Scene, UnitMarker};
use skirmish_rendering_macroquad::MacroquadBackend;
use skirmish_system_commands::{
    Console, DefeatCheck, Either, QuitPrompt, ScriptedCommands, TerminalCommands, Termination,
    TurnLimit,
};
use skirmish_world::{query, Battle, Unit};
use tracing_subscriber::EnvFilter;

use crate::scenario::{Scenario, UnitConfig};

/// Filter applied when neither `--log` nor `RUST_LOG` is set.
const DEFAULT_LOG_FILTER: &str = "skirmish=info";

/// Skirmish - turn-based tactical combat on a grid
#[derive(Parser, Debug)]
#[command(name = "skirmish", version, about, long_about = None)]
struct Args {
    /// Log filter directives, overriding RUST_LOG
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play turns in the terminal until the loop is told to stop
    Run {
        /// Scenario file (default: built-in demo)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Condition checked after every turn
        #[arg(long, value_enum, default_value_t = Until::Defeat)]
        until: Until,

        /// Turns played before giving up on a decisive result
        #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..))]
        max_turns: u32,

        /// Read every unit's commands from standard input
        #[arg(short, long)]
        interactive: bool,
    },

    /// Open a window showing the battle; Space plays the next turn
    View {
        /// Scenario file (default: built-in demo)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Synchronise frames with the display refresh rate
        #[arg(long)]
        vsync: bool,

        /// Milliseconds between turns while Space is held
        #[arg(long, default_value_t = 250, value_parser = clap::value_parser!(u64).range(1..))]
        repeat_ms: u64,
    },

    /// Print the built-in scenario as TOML
    Scenario,
}

/// Termination condition for the turn loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Until {
    /// Stop once any team is wiped out
    Defeat,
    /// Ask "Quit?" after every turn
    Quit,
}

/// Entry point for the Skirmish command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    match args.command {
        Commands::Run {
            scenario,
            until,
            max_turns,
            interactive,
        } => {
            let scenario = Scenario::load_or_default(scenario.as_deref())?;
            run(&scenario, until, max_turns, interactive)
        }
        Commands::View {
            scenario,
            vsync,
            repeat_ms,
        } => {
            let scenario = Scenario::load_or_default(scenario.as_deref())?;
            view(&scenario, vsync, Duration::from_millis(repeat_ms))
        }
        Commands::Scenario => {
            print!("{}", Scenario::default().to_toml()?);
            Ok(())
        }
    }
}

fn init_tracing(directives: Option<&str>) -> Result<()> {
    let filter = match directives {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter {directives:?}"))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn scripted(config: &UnitConfig) -> ScriptedCommands {
    ScriptedCommands::new(config.commands.iter().cloned())
}

fn run(scenario: &Scenario, until: Until, max_turns: u32, interactive: bool) -> Result<()> {
    println!("{WELCOME_BANNER}");

    let console = (interactive || until == Until::Quit).then(Console::stdio);
    let mut battle = match &console {
        Some(console) if interactive => {
            scenario.build(|_| TerminalCommands::new(console.clone()))?
        }
        _ => scenario.build(scripted)?,
    };

    let mut termination: Box<dyn Termination> = match console {
        Some(console) if until == Until::Quit => Box::new(QuitPrompt::new(console)),
        _ => Box::new(Either(DefeatCheck, TurnLimit::new(max_turns))),
    };

    report_events(&mut battle);
    battle
        .run(|battle| {
            report_events(battle);
            termination.should_stop(battle)
        })
        .context("battle loop failed")?;

    print_standings(&battle);
    Ok(())
}

fn view(scenario: &Scenario, vsync: bool, repeat: Duration) -> Result<()> {
    let mut battle = scenario.build(scripted)?;
    let layout = GridLayout::standard(scenario.grid.width, scenario.grid.height)
        .context("failed to lay out the visualizer")?;
    let scene = Scene::new(layout, unit_markers(&battle));
    let presentation = Presentation::new("Skirmish", Color::WHITE, scene);
    report_events(&mut battle);

    MacroquadBackend::new()
        .with_vsync(vsync)
        .with_auto_advance(repeat)
        .run(presentation, move |_, input, scene| {
            if !input.advance_turn {
                return;
            }
            if let Err(error) = battle.run(|_| true) {
                tracing::error!(%error, "turn failed");
                return;
            }
            report_events(&mut battle);
            scene.set_units(unit_markers(&battle));
        })
}

fn unit_markers(battle: &Battle) -> Vec<UnitMarker> {
    query::unit_view(battle)
        .iter()
        .filter_map(|unit| {
            unit.location.map(|node| UnitMarker {
                node,
                alive: unit.alive,
            })
        })
        .collect()
}

fn unit_name(battle: &Battle, id: UnitId) -> &str {
    battle.unit(id).map_or("?", Unit::name)
}

/// Logs and clears the events recorded since the last report.
fn report_events(battle: &mut Battle) {
    for event in battle.drain_events() {
        match event {
            Event::UnitJoined { unit, node } => {
                tracing::debug!(unit = unit_name(battle, unit), %node, "joined");
            }
            Event::UnitActivated { unit, ct } => {
                tracing::info!(unit = unit_name(battle, unit), ct, "activated");
            }
            Event::TurnStarted { unit } => {
                tracing::trace!(unit = unit_name(battle, unit), "turn started");
            }
            Event::TurnEnded { unit } => {
                tracing::trace!(unit = unit_name(battle, unit), "turn ended");
            }
            Event::UnitMoved { unit, from, to } => {
                tracing::info!(unit = unit_name(battle, unit), %from, %to, "moved");
            }
            Event::CommandIgnored { unit, token } => {
                tracing::debug!(unit = unit_name(battle, unit), %token, "ignored command");
            }
            Event::UnitDamaged {
                unit,
                amount,
                remaining,
            } => {
                tracing::info!(unit = unit_name(battle, unit), amount, remaining, "damaged");
            }
            Event::UnitDied { unit } => {
                tracing::info!(unit = unit_name(battle, unit), "died");
            }
        }
    }
}

fn print_standings(battle: &Battle) {
    for unit in query::unit_view(battle).iter() {
        let location = unit
            .location
            .map_or_else(|| "unplaced".to_owned(), |node| node.to_string());
        let status = if unit.alive { "" } else { " (dead)" };
        println!(
            "{}: {location} hp {}/{}{status}",
            unit.name, unit.current_hp, unit.max_hp
        );
    }
}
