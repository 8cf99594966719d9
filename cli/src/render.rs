use std::fmt;
use std::time::Duration;

use pipeflow_core::{Game, SessionState, TimerPhase, cell_symbol, pipe_symbol};

const FILLED: &str = "\x1b[1;36m";
const RESET: &str = "\x1b[0m";

/// Text view of the grid, one cell symbol per column.
pub struct Board<'a> {
    game: &'a Game,
    color: bool,
}

impl<'a> Board<'a> {
    pub fn plain(game: &'a Game) -> Self {
        Self { game, color: false }
    }

    pub fn colored(game: &'a Game) -> Self {
        Self { game, color: true }
    }
}

impl fmt::Display for Board<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rows, cols) = self.game.size();

        write!(f, "   ")?;
        for col in 0..cols {
            write!(f, " {}", col % 10)?;
        }
        writeln!(f)?;

        for row in 0..rows {
            write!(f, "{row:>3}")?;
            for col in 0..cols {
                let Some(cell) = self.game.grid().cell_at((row, col)) else {
                    continue;
                };
                let symbol = cell_symbol(cell);
                if self.color && cell.pipe().is_some_and(|pipe| pipe.is_filled()) {
                    write!(f, " {FILLED}{symbol}{RESET}")?;
                } else {
                    write!(f, " {symbol}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Queue, clock and counters on one line.
pub fn status_line(game: &Game) -> String {
    let stats = game.stats();
    let queue: String = game
        .queue_snapshot()
        .into_iter()
        .map(|pipe| pipe_symbol(pipe.shape()))
        .collect();
    let elapsed = game.timer().tick_period() * u32::try_from(stats.ticks).unwrap_or(u32::MAX);

    let water = match (game.timer().phase(), stats.distance) {
        (TimerPhase::Idle, _) => "waiting".to_string(),
        (_, None) => format!("flows in {}", stats.remaining_delay),
        (_, Some(distance)) => format!("flow {distance}"),
    };
    let paused = if game.timer().phase() == TimerPhase::Stopped && !game.is_finished() {
        " (paused)"
    } else {
        ""
    };

    format!(
        "next [{queue}]  time {}  moves {}  undos {}  {water}{paused}",
        format_clock(elapsed),
        stats.steps,
        stats.undos,
    )
}

pub fn outcome_line(state: SessionState) -> &'static str {
    match state {
        SessionState::Playing => "",
        SessionState::Won => "The water made it to the sink. You win!",
        SessionState::Lost => "The water spilled. You lose.",
    }
}

/// `mm:ss`, minutes keep growing past an hour.
pub fn format_clock(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
