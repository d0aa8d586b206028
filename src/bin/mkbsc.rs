//! Command-line entry point: parse a game file, run it through the fixpoint driver or one of its
//! component stages, and print or export the result.

use clap::{Parser, Subcommand, ValueEnum};
use mkbsc::dot::{self, DotOptions, LabelStyle as DotLabelStyle};
use mkbsc::game::Game;
use mkbsc::kbsc::kbsc;
use mkbsc::projection::project;
use mkbsc::serialize;
use mkbsc::{iterate_until_isomorphic, Result, Status};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mkbsc", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Iterate KBSC on a game file until it stabilises, printing the per-iteration log and the
    /// final game.
    Run {
        file: PathBuf,
        /// Stop after this many iterations even if no fixpoint was reached.
        #[arg(long)]
        limit: Option<usize>,
        /// Write the final game's dot export to this path instead of the text format.
        #[arg(long)]
        dot: Option<PathBuf>,
    },
    /// Project a game onto a single player's action component and print the result.
    Project {
        file: PathBuf,
        #[arg(long)]
        player: usize,
    },
    /// Run one round of single- or multi-player KBSC and print the result.
    Step { file: PathBuf },
    /// Export a game file as Graphviz dot.
    Dot {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = LabelStyle::Nice)]
        label: LabelStyle,
        #[arg(long)]
        hide_observations: bool,
    },
    /// Print a diagnostic summary of a game: state/transition counts and each player's
    /// partitioning profile.
    Inspect { file: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum LabelStyle {
    Verbose,
    Nice,
    Isocheck,
}

impl From<LabelStyle> for DotLabelStyle {
    fn from(style: LabelStyle) -> Self {
        match style {
            LabelStyle::Verbose => DotLabelStyle::Verbose,
            LabelStyle::Nice => DotLabelStyle::Nice,
            LabelStyle::Isocheck => DotLabelStyle::Isocheck,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run { file, limit, dot: dot_path } => {
            let game = serialize::from_file(&file)?;
            let result = iterate_until_isomorphic(game, limit)?;
            for record in &result.log {
                println!(
                    "iteration {}: {} states, {:?}",
                    record.iteration, record.num_states, record.status
                );
            }
            if !matches!(result.status, Status::StableWithObservations) {
                eprintln!("warning: iteration stopped without reaching a full fixpoint");
            }
            if let Some(path) = dot_path {
                let rendered = dot::to_dot(&result.game, &DotOptions::default())?;
                std::fs::write(&path, rendered).map_err(|e| {
                    mkbsc::MkbscError::ParseError(format!("failed writing {}: {e}", path.display()))
                })?;
            } else {
                print!("{}", serialize::to_string(&result.game)?);
            }
            Ok(())
        }
        Command::Project { file, player } => {
            let game = serialize::from_file(&file)?;
            let projected = project(&game, player)?;
            print!("{}", serialize::to_string(&projected)?);
            Ok(())
        }
        Command::Step { file } => {
            let game = serialize::from_file(&file)?;
            let next = kbsc(&game)?;
            print!("{}", serialize::to_string(&next)?);
            Ok(())
        }
        Command::Dot { file, label, hide_observations } => {
            let game = serialize::from_file(&file)?;
            let options = DotOptions {
                label_style: label.into(),
                show_observations: !hide_observations,
            };
            print!("{}", dot::to_dot(&game, &options)?);
            Ok(())
        }
        Command::Inspect { file } => {
            let game = serialize::from_file(&file)?;
            print_inspection(&game)?;
            Ok(())
        }
    }
}

fn print_inspection(game: &Game) -> Result<()> {
    println!("states: {}", game.num_states());
    println!("players: {}", game.num_players());
    println!("transitions: {}", game.transitions().len());
    println!("initial state: {}", game.initial());
    for player in 0..game.num_players() {
        let partitioning = game.partitioning(player)?;
        let sizes: Vec<usize> = partitioning.observations().iter().map(|o| o.len()).collect();
        println!(
            "player {player}: {} observations, sizes {:?}",
            partitioning.observations().len(),
            sizes
        );
    }
    print!("{}", game.partitioning_profile()?);
    Ok(())
}
