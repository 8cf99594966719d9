use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::*;

pub trait LevelGenerator {
    fn generate(self, settings: &GameSettings) -> Level;
}

/// Walled box with the source on a random side and the sink on the opposite
/// one, both opening into the playable area.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RandomLevelGenerator {
    seed: u64,
}

impl RandomLevelGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl LevelGenerator for RandomLevelGenerator {
    fn generate(self, settings: &GameSettings) -> Level {
        let rows = settings.rows.clamp(2, GameSettings::MAX_SIDE) + 2;
        let cols = settings.cols.clamp(2, GameSettings::MAX_SIDE) + 2;
        if (rows - 2, cols - 2) != (settings.rows, settings.cols) {
            log::warn!(
                "Requested {}x{} playable area, generating {}x{}",
                settings.rows,
                settings.cols,
                rows - 2,
                cols - 2
            );
        }
        let size = (rows, cols);
        let mut level = Level::blank(rows, cols, settings.delay_secs.max(1));

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let side = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
        let source = border_cell(side, random_inner_index(&mut rng, side, size), size);
        let sink_side = side.opposite();
        let sink = border_cell(sink_side, random_inner_index(&mut rng, sink_side, size), size);

        level.cells[source.to_nd_index()] = Cell::Termination(Termination::source(side.opposite()));
        level.cells[sink.to_nd_index()] = Cell::Termination(Termination::sink(sink_side.opposite()));

        log::debug!(
            "Generated {}x{} level, source at {:?}, sink at {:?}",
            rows,
            cols,
            source,
            sink
        );
        level
    }
}

/// Position along `side`, never a corner.
fn random_inner_index(rng: &mut SmallRng, side: Direction, (rows, cols): Coord2) -> Coord {
    let len = match side {
        Direction::Up | Direction::Down => cols,
        Direction::Left | Direction::Right => rows,
    };
    rng.random_range(1..len - 1)
}

fn border_cell(side: Direction, index: Coord, (rows, cols): Coord2) -> Coord2 {
    match side {
        Direction::Up => (0, index),
        Direction::Down => (rows - 1, index),
        Direction::Left => (index, 0),
        Direction::Right => (index, cols - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_levels_are_valid() {
        let settings = GameSettings::default();
        for seed in 0..64 {
            let level = RandomLevelGenerator::new(seed).generate(&settings);
            let terminals = level.validate().unwrap();
            let size = (10, 10);

            assert_eq!(level.size(), (10, 10));
            assert_eq!(level.delay, settings.delay_secs);
            assert!(is_border(terminals.source.0, size));
            assert!(is_border(terminals.sink.0, size));
            assert_eq!(terminals.source.1, terminals.sink.1.opposite());
        }
    }

    #[test]
    fn terminations_avoid_corners() {
        let settings = GameSettings {
            rows: 2,
            cols: 3,
            ..GameSettings::default()
        };
        for seed in 0..64 {
            let level = RandomLevelGenerator::new(seed).generate(&settings);
            let terminals = level.validate().unwrap();
            for (row, col) in [terminals.source.0, terminals.sink.0] {
                let corner = (row == 0 || row == 3) && (col == 0 || col == 4);
                assert!(!corner, "termination in corner {:?}", (row, col));
            }
        }
    }

    #[test]
    fn same_seed_same_level() {
        let settings = GameSettings::default();
        assert_eq!(
            RandomLevelGenerator::new(9).generate(&settings),
            RandomLevelGenerator::new(9).generate(&settings)
        );
    }
}
