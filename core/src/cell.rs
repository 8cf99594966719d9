use serde::{Deserialize, Serialize};

use crate::{Direction, Pipe};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationKind {
    Source,
    Sink,
}

/// A fixed end of the path. `facing` is the side the termination opens
/// towards, so the playable neighbor is always one step in that direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Termination {
    pub kind: TerminationKind,
    pub facing: Direction,
    /// Set once water has reached this termination.
    pub pipe: Option<Pipe>,
}

impl Termination {
    pub const fn new(kind: TerminationKind, facing: Direction) -> Self {
        Self {
            kind,
            facing,
            pipe: None,
        }
    }

    pub const fn source(facing: Direction) -> Self {
        Self::new(TerminationKind::Source, facing)
    }

    pub const fn sink(facing: Direction) -> Self {
        Self::new(TerminationKind::Sink, facing)
    }

    pub fn is_filled(&self) -> bool {
        self.pipe.is_some_and(Pipe::is_filled)
    }

    pub(crate) fn fill(&mut self) {
        self.pipe = Some(Pipe::filled_straight(self.facing));
    }
}

/// Contents of a single grid position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    Wall,
    Fillable(Option<Pipe>),
    Termination(Termination),
}

impl Cell {
    pub const EMPTY: Cell = Cell::Fillable(None);

    pub const fn is_wall(&self) -> bool {
        matches!(self, Self::Wall)
    }

    pub const fn is_empty_fillable(&self) -> bool {
        matches!(self, Self::Fillable(None))
    }

    pub fn pipe(&self) -> Option<Pipe> {
        match *self {
            Self::Wall => None,
            Self::Fillable(pipe) => pipe,
            Self::Termination(term) => term.pipe,
        }
    }

    pub fn termination(&self) -> Option<Termination> {
        match *self {
            Self::Termination(term) => Some(term),
            _ => None,
        }
    }

    pub fn is_termination_of(&self, kind: TerminationKind) -> bool {
        matches!(self, Self::Termination(term) if term.kind == kind)
    }

    /// Same cell with all water drained, used when taking a save snapshot.
    pub fn drained(self) -> Self {
        match self {
            Self::Wall => Self::Wall,
            Self::Fillable(None) => Self::Fillable(None),
            Self::Fillable(Some(pipe)) => Self::Fillable(Some(Pipe::new(pipe.shape()))),
            Self::Termination(term) => Self::Termination(Termination::new(term.kind, term.facing)),
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}
