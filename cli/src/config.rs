use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use pipeflow_core::{Coord, GameSettings};

/// Settings file plus the flags that override it.
#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// TOML file with game settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Playable rows of generated maps
    #[arg(long)]
    rows: Option<Coord>,

    /// Playable columns of generated maps
    #[arg(long)]
    cols: Option<Coord>,

    /// Seconds before the water starts flowing on generated maps
    #[arg(long)]
    delay: Option<u32>,
}

impl SettingsArgs {
    pub fn load(&self) -> anyhow::Result<GameSettings> {
        let base = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading settings from {}", path.display()))?;
                parse_settings(&text).with_context(|| format!("parsing {}", path.display()))?
            }
            None => GameSettings::default(),
        };

        let settings = self.apply(base);
        settings.validate().context("invalid settings")?;
        log::debug!("{:?}", settings);
        Ok(settings)
    }

    /// The forced seed, or a fresh random one.
    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    fn apply(&self, mut settings: GameSettings) -> GameSettings {
        if let Some(rows) = self.rows {
            settings.rows = rows;
        }
        if let Some(cols) = self.cols {
            settings.cols = cols;
        }
        if let Some(delay) = self.delay {
            settings.delay_secs = delay;
        }
        settings
    }
}

pub fn parse_settings(text: &str) -> anyhow::Result<GameSettings> {
    Ok(toml::from_str(text)?)
}
