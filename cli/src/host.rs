use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use pipeflow_core::*;
use thiserror::Error;
use web_time::Instant;

use crate::render::{self, Board};
use crate::storage;

/// How long to block on input while the clock is not running.
const IDLE_WAIT: Duration = Duration::from_millis(500);

const HELP: &str = "commands: p ROW COL | r ROW COL PIPE (one swap) | s (skip) | u (undo) | pause | resume | save FILE | q";

pub enum Input {
    Line(String),
    Closed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    Place(Coord2),
    Replace(Coord2, PipeShape),
    Skip,
    Undo,
    Pause,
    Resume,
    Save(PathBuf),
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command {0:?}")]
    Unknown(String),
    #[error("expected `p ROW COL`")]
    BadPlace,
    #[error("expected `r ROW COL PIPE` with PIPE one of ═ ║ ╝ ╚ ╗ ╔ or h v tl tr bl br")]
    BadReplace,
    #[error("expected `save FILE`")]
    BadSave,
}

impl FromStr for PlayerCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Err(CommandError::Empty);
        };

        let mut coord = || words.next().and_then(|word| word.parse::<Coord>().ok());
        let command = match word {
            "p" | "place" => {
                let (Some(row), Some(col)) = (coord(), coord()) else {
                    return Err(CommandError::BadPlace);
                };
                Self::Place((row, col))
            }
            "r" | "replace" => {
                let (Some(row), Some(col)) = (coord(), coord()) else {
                    return Err(CommandError::BadReplace);
                };
                let shape = words
                    .next()
                    .and_then(parse_shape)
                    .ok_or(CommandError::BadReplace)?;
                Self::Replace((row, col), shape)
            }
            "s" | "skip" => Self::Skip,
            "u" | "undo" => Self::Undo,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "save" => {
                let path = words.next().ok_or(CommandError::BadSave)?;
                Self::Save(PathBuf::from(path))
            }
            "h" | "help" | "?" => Self::Help,
            "q" | "quit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        if words.next().is_some() {
            return Err(CommandError::Unknown(line.trim().to_string()));
        }
        Ok(command)
    }
}

/// A pipe by its map symbol or a short name.
fn parse_shape(word: &str) -> Option<PipeShape> {
    use PipeShape::*;
    let shape = match word {
        "h" => Horizontal,
        "v" => Vertical,
        "tl" => TopLeft,
        "tr" => TopRight,
        "bl" => BottomLeft,
        "br" => BottomRight,
        other => {
            let mut chars = other.chars();
            let symbol = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            return pipe_from_symbol(symbol);
        }
    };
    Some(shape)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    Won,
    Lost,
    Quit,
}

/// Forwards stdin lines to the returned channel from a background thread.
pub fn spawn_stdin_reader() -> Receiver<Input> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(Input::Line(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Input::Closed);
    });
    rx
}

/// Plays one level to its end. Input and clock ticks are handled on this
/// thread only, one at a time.
pub fn run_session(
    level: &Level,
    settings: &GameSettings,
    seed: u64,
    inputs: &Receiver<Input>,
    out: &mut impl Write,
) -> anyhow::Result<SessionEnd> {
    let mut game = Game::from_level(level, settings, seed).context("cannot start the level")?;
    let color = io::stdout().is_terminal();
    game.on_change(|stats| log::trace!("{:?}", stats));

    draw(&game, color, out)?;
    writeln!(out, "{HELP}")?;
    game.start_countdown()?;

    let mut last = Instant::now();
    loop {
        let wait = game.until_next_tick().unwrap_or(IDLE_WAIT);
        let mut redraw = false;

        match inputs.recv_timeout(wait) {
            Ok(Input::Line(line)) => match line.parse::<PlayerCommand>() {
                Ok(PlayerCommand::Quit) => return Ok(SessionEnd::Quit),
                Ok(command) => redraw = apply(&mut game, command, out)?,
                Err(CommandError::Empty) => {}
                Err(err) => writeln!(out, "{err}. {HELP}")?,
            },
            Ok(Input::Closed) | Err(RecvTimeoutError::Disconnected) => {
                log::info!("Input closed, leaving the level");
                return Ok(SessionEnd::Quit);
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        let now = Instant::now();
        let events = game.pump(now.duration_since(last));
        last = now;
        redraw |= !events.is_empty();

        if redraw {
            draw(&game, color, out)?;
        }
        match game.state() {
            SessionState::Playing => {}
            SessionState::Won => {
                writeln!(out, "{}", render::outcome_line(SessionState::Won))?;
                return Ok(SessionEnd::Won);
            }
            SessionState::Lost => {
                writeln!(out, "{}", render::outcome_line(SessionState::Lost))?;
                return Ok(SessionEnd::Lost);
            }
        }
    }
}

/// Runs a player command, returning whether the board changed.
fn apply(game: &mut Game, command: PlayerCommand, out: &mut impl Write) -> anyhow::Result<bool> {
    let changed = match command {
        PlayerCommand::Place(coords) => match game.place_pipe(coords) {
            Ok(outcome) if outcome.has_update() => true,
            Ok(_) => {
                writeln!(out, "cannot place a pipe at {} {}", coords.0, coords.1)?;
                false
            }
            Err(err) => {
                writeln!(out, "{err}")?;
                false
            }
        },
        PlayerCommand::Replace(coords, shape) => match game.replace_pipe(coords, Pipe::new(shape)) {
            Ok(outcome) if outcome.has_update() => true,
            Ok(_) if !game.swap_available() => {
                writeln!(out, "the swap was already used")?;
                false
            }
            Ok(_) => {
                writeln!(out, "cannot swap the pipe at {} {}", coords.0, coords.1)?;
                false
            }
            Err(err) => {
                writeln!(out, "{err}")?;
                false
            }
        },
        PlayerCommand::Skip => {
            game.skip_pipe()?;
            true
        }
        PlayerCommand::Undo => match game.undo_step()? {
            UndoOutcome::Undone => true,
            UndoOutcome::Locked => {
                writeln!(out, "water already reached that pipe")?;
                false
            }
            UndoOutcome::NothingToUndo => {
                writeln!(out, "nothing to undo")?;
                false
            }
        },
        PlayerCommand::Pause => {
            game.stop_countdown();
            true
        }
        PlayerCommand::Resume => {
            game.resume()?;
            true
        }
        PlayerCommand::Save(path) => {
            match storage::save_level(&path, &game.to_level()) {
                Ok(()) => writeln!(out, "saved to {}", path.display())?,
                Err(err) => {
                    log::warn!("{err:#}");
                    writeln!(out, "{err:#}")?;
                }
            }
            false
        }
        PlayerCommand::Help => {
            writeln!(out, "{HELP}")?;
            false
        }
        PlayerCommand::Quit => false,
    };
    Ok(changed)
}

fn draw(game: &Game, color: bool, out: &mut impl Write) -> io::Result<()> {
    let board = if color {
        Board::colored(game)
    } else {
        Board::plain(game)
    };
    write!(out, "{board}")?;
    writeln!(out, "{}", render::status_line(game))?;
    out.flush()
}
