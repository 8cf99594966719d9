use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use pipeflow_core::*;

mod config;
mod host;
mod render;
mod storage;

use config::SettingsArgs;
use host::SessionEnd;

#[derive(Parser, Debug)]
#[command(name = "pipeflow", version, about = "Connect the source to the sink before the water runs out")]
struct Cli {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a map file, every map of a directory, or a generated map
    Play(PlayArgs),
    /// Decode and validate map files
    Check {
        #[arg(required = true)]
        maps: Vec<PathBuf>,
    },
    /// Write a generated map
    Generate {
        #[command(flatten)]
        settings: SettingsArgs,

        /// Output file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show a decoded map
    Inspect {
        map: PathBuf,

        /// Print the session snapshot as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        settings: SettingsArgs,
    },
}

#[derive(Args, Debug)]
struct PlayArgs {
    /// Map file to play
    map: Option<PathBuf>,

    /// Directory of `.map` files played in order
    #[arg(long, conflicts_with = "map")]
    levels: Option<PathBuf>,

    #[command(flatten)]
    settings: SettingsArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    match cli.command {
        Command::Play(args) => play(args),
        Command::Check { maps } => check(&maps),
        Command::Generate { settings, output } => generate(&settings, output.as_deref()),
        Command::Inspect {
            map,
            json,
            settings,
        } => inspect(&map, json, &settings),
    }
}

fn play(args: PlayArgs) -> anyhow::Result<()> {
    let settings = args.settings.load()?;
    let seed = args.settings.seed();
    log::debug!("seed: {}", seed);

    let inputs = host::spawn_stdin_reader();
    let mut stdout = io::stdout().lock();

    match (&args.map, &args.levels) {
        (Some(path), _) => {
            let level = storage::load_level(path)?;
            host::run_session(&level, &settings, seed, &inputs, &mut stdout)?;
        }
        (None, Some(dir)) => {
            let mut catalog = storage::scan_levels(dir)?;
            let mut next = catalog.select_first().map(str::to_owned);
            while let Some(name) = next {
                writeln!(stdout, "== {name} ==")?;
                let level = storage::load_level(&dir.join(&name))?;
                match host::run_session(&level, &settings, seed, &inputs, &mut stdout)? {
                    SessionEnd::Won => next = catalog.next_level().map(str::to_owned),
                    SessionEnd::Lost | SessionEnd::Quit => return Ok(()),
                }
            }
            writeln!(stdout, "== generated ==")?;
            let level = RandomLevelGenerator::new(seed).generate(&settings);
            host::run_session(&level, &settings, seed, &inputs, &mut stdout)?;
        }
        (None, None) => {
            let level = RandomLevelGenerator::new(seed).generate(&settings);
            host::run_session(&level, &settings, seed, &inputs, &mut stdout)?;
        }
    }

    Ok(())
}

fn check(maps: &[PathBuf]) -> anyhow::Result<()> {
    let mut failed = 0;
    for path in maps {
        match storage::load_level(path) {
            Ok(level) => {
                let (rows, cols) = level.size();
                println!("{}: ok, {rows}x{cols}, {}s delay", path.display(), level.delay);
            }
            Err(err) => {
                failed += 1;
                println!("{}: {:#}", path.display(), err);
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} maps are invalid", maps.len());
    }
    Ok(())
}

fn generate(args: &SettingsArgs, output: Option<&Path>) -> anyhow::Result<()> {
    let settings = args.load()?;
    let level = RandomLevelGenerator::new(args.seed()).generate(&settings);

    match output {
        Some(path) => storage::save_level(path, &level),
        None => {
            print!("{}", encode_level(&level));
            Ok(())
        }
    }
}

fn inspect(path: &Path, json: bool, args: &SettingsArgs) -> anyhow::Result<()> {
    let settings = args.load()?;
    let level = storage::load_level(path)?;
    let game = Game::from_level(&level, &settings, args.seed())
        .with_context(|| format!("cannot start a session on {}", path.display()))?;

    if json {
        let snapshot = serde_json::to_string_pretty(&game.snapshot()).context("encoding snapshot")?;
        println!("{snapshot}");
    } else {
        let (rows, cols) = level.size();
        println!("{rows}x{cols}, {}s delay", level.delay);
        print!("{}", render::Board::plain(&game));
    }
    Ok(())
}
