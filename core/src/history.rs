use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::*;

/// A pipe the player put on the grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub coords: Coord2,
    pub pipe: Pipe,
}

/// Result of asking the history for the newest placement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HistoryPop {
    /// Nothing has been placed, or everything was undone already.
    Empty,
    /// Water has reached the newest placement; it stays.
    Locked(Placement),
    /// Removed from the history, the caller reverts it.
    Popped(Placement),
}

/// Undo stack of placements, newest last.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementHistory {
    placements: Vec<Placement>,
    undo_count: u32,
}

impl PlacementHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, coords: Coord2, pipe: Pipe) {
        self.placements.push(Placement { coords, pipe });
    }

    /// Pops the newest placement unless `is_locked` says water holds it in place.
    /// Only a successful pop counts as an undo.
    pub fn pop_unless(&mut self, is_locked: impl FnOnce(&Placement) -> bool) -> HistoryPop {
        let Some(&top) = self.placements.last() else {
            return HistoryPop::Empty;
        };

        if is_locked(&top) {
            return HistoryPop::Locked(top);
        }

        self.placements.pop();
        self.undo_count += 1;
        HistoryPop::Popped(top)
    }

    pub fn undo_count(&self) -> u32 {
        self.undo_count
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn last(&self) -> Option<&Placement> {
        self.placements.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIPE: Pipe = Pipe::new(PipeShape::Vertical);

    #[test]
    fn pop_on_empty_history() {
        let mut history = PlacementHistory::new();

        assert_eq!(history.pop_unless(|_| false), HistoryPop::Empty);
        assert_eq!(history.undo_count(), 0);
    }

    #[test]
    fn pops_newest_first_and_counts_undos() {
        let mut history = PlacementHistory::new();
        history.push((1, 1), PIPE);
        history.push((2, 1), PIPE);

        let first = history.pop_unless(|_| false);
        let second = history.pop_unless(|_| false);

        assert_eq!(first, HistoryPop::Popped(Placement { coords: (2, 1), pipe: PIPE }));
        assert_eq!(second, HistoryPop::Popped(Placement { coords: (1, 1), pipe: PIPE }));
        assert_eq!(history.undo_count(), 2);
        assert!(history.is_empty());
    }

    #[test]
    fn locked_placement_stays() {
        let mut history = PlacementHistory::new();
        history.push((1, 1), PIPE);

        let outcome = history.pop_unless(|placement| placement.coords == (1, 1));

        assert!(matches!(outcome, HistoryPop::Locked(_)));
        assert_eq!(history.len(), 1);
        assert_eq!(history.undo_count(), 0);
    }

    #[test]
    fn push_does_not_touch_undo_count() {
        let mut history = PlacementHistory::new();
        history.push((1, 1), PIPE);
        history.pop_unless(|_| false);
        history.push((1, 2), PIPE);

        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.last().map(|p| p.coords), Some((1, 2)));
    }
}
