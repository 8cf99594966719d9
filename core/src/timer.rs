use core::time::Duration;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);
pub const DEFAULT_FLOW_INTERVAL: u32 = 1;

/// Valid transitions:
/// - Idle -> Countdown
/// - Countdown -> Flowing
/// - Countdown -> Stopped
/// - Flowing -> Stopped
/// - Stopped -> Countdown, when the delay has not run out yet
/// - Stopped -> Flowing
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerPhase {
    Idle,
    Countdown,
    Flowing,
    Stopped,
}

impl TimerPhase {
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Countdown | Self::Flowing)
    }
}

impl Default for TimerPhase {
    fn default() -> Self {
        Self::Idle
    }
}

/// What a single tick produced. Every tick yields `Tick`; ticks that move the
/// water also yield `Flow`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerEvent {
    Tick { ticks: u64 },
    Flow { distance: Distance },
}

pub type TimerEvents = SmallVec<[TimerEvent; 2]>;

/// Countdown-then-flow scheduler. It has no clock of its own: the host feeds it
/// elapsed time and drains due ticks one at a time, so a tick can never start
/// while the previous one is still being handled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowTimer {
    phase: TimerPhase,
    /// Countdown length in ticks.
    delay: u32,
    remaining_delay: u32,
    /// Ticks per flow step.
    flow_interval: u32,
    since_flow: u32,
    distance: Option<Distance>,
    ticks: u64,
    tick_period: Duration,
    pending: Duration,
}

impl FlowTimer {
    pub fn new(delay: u32, flow_interval: u32, tick_period: Duration) -> Self {
        Self {
            phase: TimerPhase::Idle,
            delay,
            remaining_delay: delay,
            flow_interval: flow_interval.max(1),
            since_flow: 0,
            distance: None,
            ticks: 0,
            tick_period: tick_period.max(Duration::from_millis(1)),
            pending: Duration::ZERO,
        }
    }

    pub fn with_delay(delay: u32) -> Self {
        Self::new(delay, DEFAULT_FLOW_INTERVAL, DEFAULT_TICK_PERIOD)
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    /// `None` until the countdown is over, then the number of flow steps taken.
    pub fn distance(&self) -> Option<Distance> {
        self.distance
    }

    pub fn delay(&self) -> u32 {
        self.delay
    }

    pub fn remaining_delay(&self) -> u32 {
        self.remaining_delay
    }

    pub fn flow_interval(&self) -> u32 {
        self.flow_interval
    }

    /// Ticks released since `start`.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Time left until the next tick is due, `None` while not running.
    pub fn until_next_tick(&self) -> Option<Duration> {
        self.is_running()
            .then(|| self.tick_period.saturating_sub(self.pending))
    }

    pub fn start(&mut self) {
        if self.phase != TimerPhase::Idle {
            return;
        }
        self.phase = TimerPhase::Countdown;
        log::debug!("Countdown started, {} ticks of delay", self.remaining_delay);
    }

    /// Halts ticking, keeping the distance and the consumed delay. Any partial
    /// tick accumulated so far is dropped.
    pub fn stop(&mut self) {
        if !self.phase.is_running() {
            return;
        }
        self.phase = TimerPhase::Stopped;
        self.pending = Duration::ZERO;
        log::debug!("Timer stopped at distance {:?}", self.distance);
    }

    pub fn resume(&mut self) {
        if self.phase != TimerPhase::Stopped {
            if self.phase == TimerPhase::Idle {
                log::warn!("Resume requested before the timer was started");
            }
            return;
        }
        self.phase = if self.distance.is_some() {
            TimerPhase::Flowing
        } else {
            TimerPhase::Countdown
        };
        log::debug!("Timer resumed into {:?}", self.phase);
    }

    /// Accumulates wall time. Ignored unless running.
    pub fn advance(&mut self, elapsed: Duration) {
        if self.is_running() {
            self.pending = self.pending.saturating_add(elapsed);
        }
    }

    /// Releases the next due tick, if any.
    pub fn poll(&mut self) -> Option<TimerEvents> {
        if !self.is_running() || self.pending < self.tick_period {
            return None;
        }
        self.pending -= self.tick_period;
        Some(self.tick())
    }

    /// Runs one tick right away, regardless of accumulated time.
    pub fn tick(&mut self) -> TimerEvents {
        let mut events = TimerEvents::new();

        match self.phase {
            TimerPhase::Idle | TimerPhase::Stopped => return events,
            TimerPhase::Countdown => {
                self.remaining_delay = self.remaining_delay.saturating_sub(1);
                self.ticks += 1;
                events.push(TimerEvent::Tick { ticks: self.ticks });

                if self.remaining_delay == 0 {
                    self.phase = TimerPhase::Flowing;
                    self.distance = Some(0);
                    self.since_flow = 0;
                    log::debug!("Countdown over, water starts flowing");
                    events.push(TimerEvent::Flow { distance: 0 });
                }
            }
            TimerPhase::Flowing => {
                self.ticks += 1;
                events.push(TimerEvent::Tick { ticks: self.ticks });

                self.since_flow += 1;
                if self.since_flow >= self.flow_interval {
                    self.since_flow = 0;
                    let distance = self.distance.map_or(0, |distance| distance + 1);
                    self.distance = Some(distance);
                    log::trace!("Water advanced to distance {}", distance);
                    events.push(TimerEvent::Flow { distance });
                }
            }
        }

        events
    }
}
