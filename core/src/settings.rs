use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::*;

/// Tunables shared by every session a host starts. Missing fields in a loaded
/// config fall back to their defaults.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Playable rows of a generated map, walls excluded.
    pub rows: Coord,
    /// Playable columns of a generated map, walls excluded.
    pub cols: Coord,
    pub delay_secs: u32,
    pub flow_interval_ticks: u32,
    pub queue_length: usize,
    pub tick_period_ms: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            rows: 8,
            cols: 8,
            delay_secs: 10,
            flow_interval_ticks: DEFAULT_FLOW_INTERVAL,
            queue_length: DEFAULT_QUEUE_LENGTH,
            tick_period_ms: 1000,
        }
    }
}

impl GameSettings {
    /// Largest playable side that still fits `Coord` once walls are added.
    pub const MAX_SIDE: Coord = Coord::MAX - 2;

    pub fn validate(&self) -> core::result::Result<(), SettingsError> {
        if !(2..=Self::MAX_SIDE).contains(&self.rows) {
            return Err(SettingsError::Rows);
        }
        if !(2..=Self::MAX_SIDE).contains(&self.cols) {
            return Err(SettingsError::Cols);
        }
        if self.delay_secs < 1 {
            return Err(SettingsError::Delay);
        }
        if self.flow_interval_ticks < 1 {
            return Err(SettingsError::FlowInterval);
        }
        if self.queue_length < 1 {
            return Err(SettingsError::QueueLength);
        }
        if self.tick_period_ms < 1 {
            return Err(SettingsError::TickPeriod);
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// A timer for a level with `delay` seconds of countdown. The delay is
    /// converted to ticks of `tick_period`, rounding up.
    pub fn flow_timer(&self, delay: u32) -> FlowTimer {
        let period = self.tick_period_ms.max(1);
        let delay_ms = u64::from(delay) * 1000;
        let delay_ticks = delay_ms.div_ceil(period).try_into().unwrap_or(u32::MAX);
        FlowTimer::new(delay_ticks, self.flow_interval_ticks, self.tick_period())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = GameSettings::default();
        assert_eq!(settings.validate(), Ok(()));
        assert_eq!(settings.tick_period(), Duration::from_secs(1));
    }

    #[test]
    fn each_field_is_checked() {
        let base = GameSettings::default();
        let cases = [
            (GameSettings { rows: 1, ..base }, SettingsError::Rows),
            (GameSettings { cols: 0, ..base }, SettingsError::Cols),
            (GameSettings { cols: 254, ..base }, SettingsError::Cols),
            (GameSettings { delay_secs: 0, ..base }, SettingsError::Delay),
            (
                GameSettings {
                    flow_interval_ticks: 0,
                    ..base
                },
                SettingsError::FlowInterval,
            ),
            (
                GameSettings {
                    queue_length: 0,
                    ..base
                },
                SettingsError::QueueLength,
            ),
            (
                GameSettings {
                    tick_period_ms: 0,
                    ..base
                },
                SettingsError::TickPeriod,
            ),
        ];

        for (settings, expected) in cases {
            assert_eq!(settings.validate(), Err(expected));
        }
    }

    #[test]
    fn timer_delay_follows_tick_period() {
        let settings = GameSettings::default();
        assert_eq!(settings.flow_timer(10).delay(), 10);

        let fast = GameSettings {
            tick_period_ms: 250,
            ..settings
        };
        assert_eq!(fast.flow_timer(3).delay(), 12);

        let slow = GameSettings {
            tick_period_ms: 3000,
            ..settings
        };
        assert_eq!(slow.flow_timer(4).delay(), 2);
    }
}
