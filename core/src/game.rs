use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::time::Duration;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Playing,
    Won,
    Lost,
}

impl SessionState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Playing
    }
}

/// Something the host may want to react to while pumping the clock.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Tick { ticks: u64 },
    Flow { distance: Distance },
    Won,
    Lost,
}

pub type GameEvents = SmallVec<[GameEvent; 3]>;

/// Value snapshot handed to observers and renderers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    pub steps: u32,
    pub undos: u32,
    pub ticks: u64,
    pub distance: Option<Distance>,
    pub remaining_delay: u32,
    pub state: SessionState,
}

/// Everything a renderer or an inspector needs, detached from the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub stats: GameStats,
    pub phase: TimerPhase,
    pub cells: Array2<Cell>,
    pub queue: Vec<Pipe>,
    pub path: Vec<Coord2>,
}

type Observer = Box<dyn FnMut(&GameStats)>;

/// One play session: grid, lookahead queue, undo history and flow timer,
/// driven through a single command surface.
pub struct Game {
    grid: Grid,
    queue: PipeQueue,
    history: PlacementHistory,
    timer: FlowTimer,
    delay: u32,
    steps: u32,
    swap_used: bool,
    state: SessionState,
    observers: Vec<Observer>,
    last_notified: Option<GameStats>,
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("grid", &self.grid)
            .field("queue", &self.queue)
            .field("history", &self.history)
            .field("timer", &self.timer)
            .field("delay", &self.delay)
            .field("steps", &self.steps)
            .field("swap_used", &self.swap_used)
            .field("state", &self.state)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Game {
    /// Starts a session on a validated copy of `level`. The queue begins with
    /// the level's pipes and `seed` drives the ones generated after them.
    pub fn from_level(
        level: &Level,
        settings: &GameSettings,
        seed: u64,
    ) -> core::result::Result<Self, MapError> {
        let grid = Grid::from_level(level)?;
        let queue = PipeQueue::with_pipes(settings.queue_length, seed, level.pipes.iter().copied());
        log::debug!(
            "New session on a {:?} grid, {}s delay",
            grid.size(),
            level.delay
        );
        Ok(Self {
            grid,
            queue,
            history: PlacementHistory::new(),
            timer: settings.flow_timer(level.delay),
            delay: level.delay,
            steps: 0,
            swap_used: false,
            state: SessionState::Playing,
            observers: Vec::new(),
            last_notified: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn size(&self) -> Coord2 {
        self.grid.size()
    }

    pub fn delay(&self) -> u32 {
        self.delay
    }

    pub fn cell_at(&self, coords: Coord2) -> Result<Cell> {
        let coords = self.grid.validate_coords(coords)?;
        self.grid.cell_at(coords).ok_or(GameError::InvalidCoords)
    }

    pub fn pipe_at(&self, coords: Coord2) -> Result<Option<Pipe>> {
        let coords = self.grid.validate_coords(coords)?;
        Ok(self.grid.pipe_at(coords))
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn queue_snapshot(&self) -> Vec<Pipe> {
        self.queue.to_vec()
    }

    pub fn next_pipe(&self) -> Pipe {
        self.queue.peek()
    }

    pub fn flow_distance(&self) -> Option<Distance> {
        self.timer.distance()
    }

    pub fn timer(&self) -> &FlowTimer {
        &self.timer
    }

    pub fn step_count(&self) -> u32 {
        self.steps
    }

    pub fn undo_count(&self) -> u32 {
        self.history.undo_count()
    }

    pub fn stats(&self) -> GameStats {
        GameStats {
            steps: self.steps,
            undos: self.history.undo_count(),
            ticks: self.timer.ticks(),
            distance: self.timer.distance(),
            remaining_delay: self.timer.remaining_delay(),
            state: self.state,
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            stats: self.stats(),
            phase: self.timer.phase(),
            cells: self.grid.cells().clone(),
            queue: self.queue.to_vec(),
            path: self.grid.trace_path().pipes,
        }
    }

    /// The session as a level again: cells without water, the current queue
    /// and the level delay.
    pub fn to_level(&self) -> Level {
        Level {
            delay: self.delay,
            cells: self.grid.cells().mapv(Cell::drained),
            pipes: self.queue.to_vec(),
        }
    }

    /// Registers a callback run after any change of steps, undos, ticks, flow
    /// distance or session state.
    pub fn on_change(&mut self, observer: impl FnMut(&GameStats) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Puts the head of the queue at `coords`.
    pub fn place_pipe(&mut self, coords: Coord2) -> Result<PlaceOutcome> {
        let coords = self.grid.validate_coords(coords)?;
        self.check_playing()?;

        let pipe = self.queue.peek();
        if !self.grid.try_place_pipe(coords, pipe) {
            return Ok(PlaceOutcome::Rejected);
        }

        self.queue.consume();
        self.history.push(coords, pipe);
        self.steps += 1;

        let outcome = self.check_placement_win();
        self.notify();
        Ok(outcome)
    }

    /// Discards the head of the queue.
    pub fn skip_pipe(&mut self) -> Result<()> {
        self.check_playing()?;

        let skipped = self.queue.consume();
        self.steps += 1;
        log::debug!("Skipped {:?}", skipped.shape());
        self.notify();
        Ok(())
    }

    /// Reverts the newest placement unless water already reached it.
    pub fn undo_step(&mut self) -> Result<UndoOutcome> {
        self.check_playing()?;

        let grid = &self.grid;
        let outcome = match self.history.pop_unless(|placement| grid.is_filled(placement.coords)) {
            HistoryPop::Empty => UndoOutcome::NothingToUndo,
            HistoryPop::Locked(placement) => {
                log::debug!("Pipe at {:?} is filled, undo rejected", placement.coords);
                UndoOutcome::Locked
            }
            HistoryPop::Popped(Placement { coords, pipe }) => {
                self.queue.undo(pipe);
                self.grid.undo(coords);
                self.steps += 1;
                UndoOutcome::Undone
            }
        };

        if outcome.has_update() {
            self.notify();
        }
        Ok(outcome)
    }

    /// Swaps the pipe at `coords` for `pipe` without touching the queue, the
    /// history or the step counter. Only unfilled pipes can be swapped, and
    /// only once per session.
    pub fn replace_pipe(&mut self, coords: Coord2, pipe: Pipe) -> Result<PlaceOutcome> {
        let coords = self.grid.validate_coords(coords)?;
        self.check_playing()?;
        if self.swap_used {
            log::debug!("Swap at {:?} refused, already used", coords);
            return Ok(PlaceOutcome::Rejected);
        }

        match self.grid.cell_at(coords) {
            Some(Cell::Fillable(Some(current))) if !current.is_filled() => {
                self.grid.remove(coords);
                self.grid.try_place_pipe(coords, Pipe::new(pipe.shape()));
                self.swap_used = true;
                log::debug!("Replaced {:?} with {:?} at {:?}", current.shape(), pipe.shape(), coords);
            }
            _ => return Ok(PlaceOutcome::Rejected),
        }

        let outcome = self.check_placement_win();
        self.notify();
        Ok(outcome)
    }

    /// Whether `replace_pipe` can still succeed this session.
    pub fn swap_available(&self) -> bool {
        !self.swap_used
    }

    pub fn start_countdown(&mut self) -> Result<()> {
        self.check_playing()?;
        self.timer.start();
        Ok(())
    }

    pub fn stop_countdown(&mut self) {
        self.timer.stop();
    }

    pub fn resume(&mut self) -> Result<()> {
        self.check_playing()?;
        self.timer.resume();
        Ok(())
    }

    /// Time until the next tick is due, `None` while the clock is not running.
    pub fn until_next_tick(&self) -> Option<Duration> {
        self.timer.until_next_tick()
    }

    /// Feeds wall time to the clock and handles every tick that became due, one
    /// after the other. Stops early once the session finished.
    pub fn pump(&mut self, elapsed: Duration) -> Vec<GameEvent> {
        self.timer.advance(elapsed);

        let mut events = Vec::new();
        while let Some(fired) = self.next_tick() {
            events.extend(fired);
        }
        events
    }

    /// Handles the next due tick, if any. Hosts that want to react between
    /// ticks (pausing, for instance) call this after `advance_clock`.
    pub fn next_tick(&mut self) -> Option<GameEvents> {
        if self.state.is_finished() {
            return None;
        }
        let fired = self.timer.poll()?;
        Some(self.handle_timer(fired))
    }

    pub fn advance_clock(&mut self, elapsed: Duration) {
        self.timer.advance(elapsed);
    }

    /// Runs one tick immediately, ignoring the accumulated time.
    pub fn tick(&mut self) -> GameEvents {
        if self.state.is_finished() {
            return GameEvents::new();
        }
        let fired = self.timer.tick();
        self.handle_timer(fired)
    }

    /// Brings the grid's water up to the timer's distance.
    pub fn update_state(&mut self) {
        match self.timer.distance() {
            Some(0) => {
                self.grid.fill_begin_tile();
                self.grid.fill_tiles(0);
            }
            Some(distance) => self.grid.fill_tiles(distance),
            None => {}
        }
    }

    pub fn has_won(&self) -> bool {
        self.grid.check_path()
    }

    pub fn has_lost(&self) -> bool {
        match self.timer.distance() {
            Some(distance) if distance > 0 => self.grid.has_lost(),
            _ => false,
        }
    }

    pub fn fill_all_pipes(&mut self) {
        self.grid.fill_all();
    }

    fn check_playing(&self) -> Result<()> {
        if self.state.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }

    fn check_placement_win(&mut self) -> PlaceOutcome {
        if self.has_won() {
            self.finish(SessionState::Won);
            PlaceOutcome::Won
        } else {
            PlaceOutcome::Placed
        }
    }

    fn finish(&mut self, state: SessionState) {
        if state == SessionState::Won {
            self.fill_all_pipes();
        }
        self.timer.stop();
        self.state = state;
        log::debug!(
            "Session finished: {:?} after {} steps and {} ticks",
            state,
            self.steps,
            self.timer.ticks()
        );
    }

    fn handle_timer(&mut self, fired: TimerEvents) -> GameEvents {
        let mut events = GameEvents::new();

        for event in fired {
            match event {
                TimerEvent::Tick { ticks } => events.push(GameEvent::Tick { ticks }),
                TimerEvent::Flow { distance } => {
                    self.update_state();
                    events.push(GameEvent::Flow { distance });

                    if self.has_won() {
                        self.finish(SessionState::Won);
                        events.push(GameEvent::Won);
                    } else if self.has_lost() {
                        self.finish(SessionState::Lost);
                        events.push(GameEvent::Lost);
                    }
                }
            }
        }

        self.notify();
        events
    }

    fn notify(&mut self) {
        let stats = self.stats();
        if self.last_notified == Some(stats) {
            return;
        }
        self.last_notified = Some(stats);
        for observer in &mut self.observers {
            observer(&stats);
        }
    }
}
