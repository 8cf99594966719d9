#![no_std]

extern crate alloc;

pub use catalog::*;
pub use cell::*;
pub use codec::*;
pub use error::*;
pub use game::*;
pub use generator::*;
pub use grid::*;
pub use history::*;
pub use level::*;
pub use pipe::*;
pub use queue::*;
pub use settings::*;
pub use timer::*;
pub use types::*;

mod catalog;
mod cell;
mod codec;
mod error;
mod game;
mod generator;
mod grid;
mod history;
mod level;
mod pipe;
mod queue;
mod settings;
mod timer;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlaceOutcome {
    Rejected,
    Placed,
    Won,
}

impl PlaceOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::Rejected => false,
            Self::Placed => true,
            Self::Won => true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UndoOutcome {
    NothingToUndo,
    /// Water already reached the newest placement.
    Locked,
    Undone,
}

impl UndoOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::Undone)
    }
}
