use alloc::vec::Vec;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Smallest accepted grid side, walls included.
pub const MIN_SIDE: usize = 2;

/// Everything needed to start a session: what a loader hands in and what a
/// serializer receives back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Seconds before water starts flowing.
    pub delay: u32,
    pub cells: Array2<Cell>,
    /// Initial lookahead queue, head first. May be shorter than the queue length.
    pub pipes: Vec<Pipe>,
}

/// Where the source and sink sit and which side they open towards.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminals {
    pub source: (Coord2, Direction),
    pub sink: (Coord2, Direction),
}

impl Level {
    /// Builds a level from row-major cells, validating it.
    pub fn new(
        rows: usize,
        cols: usize,
        delay: u32,
        cells: Vec<Cell>,
        pipes: Vec<Pipe>,
    ) -> core::result::Result<Self, MapError> {
        let cells = Array2::from_shape_vec((rows, cols), cells).map_err(|_| MapError::ShapeMismatch)?;
        let level = Self {
            delay,
            cells,
            pipes,
        };
        level.validate()?;
        Ok(level)
    }

    /// A `rows x cols` level with a wall border, an empty interior and no
    /// terminations yet.
    pub fn blank(rows: Coord, cols: Coord, delay: u32) -> Self {
        let size = (rows, cols);
        let mut cells = Array2::from_elem(size.to_nd_index(), Cell::EMPTY);
        for coords in iter_coords(size).filter(|&coords| is_border(coords, size)) {
            cells[coords.to_nd_index()] = Cell::Wall;
        }
        Self {
            delay,
            cells,
            pipes: Vec::new(),
        }
    }

    pub fn size(&self) -> (usize, usize) {
        self.cells.dim()
    }

    pub fn cell_at(&self, coords: Coord2) -> Option<Cell> {
        self.cells.get(coords.to_nd_index()).copied()
    }

    pub fn validate(&self) -> core::result::Result<Terminals, MapError> {
        let terminals = locate_terminals(&self.cells)?;

        let (rows, cols) = self.size();
        if rows < MIN_SIDE || cols < MIN_SIDE {
            return Err(MapError::DimensionsTooSmall);
        }
        if self.delay < 1 {
            return Err(MapError::NonPositiveDelay);
        }

        if is_blocked(&self.cells, terminals.source) {
            return Err(MapError::SourceBlocked);
        }
        if is_blocked(&self.cells, terminals.sink) {
            return Err(MapError::SinkBlocked);
        }

        Ok(terminals)
    }

    /// Editing primitive that keeps at most one termination of each kind: a
    /// previous one of the same kind turns back into a wall on the border, or
    /// an empty cell inside.
    pub fn set_cell(&mut self, coords: Coord2, cell: Cell) -> Result<()> {
        let size = self.coord_bounds()?;
        if coords.0 >= size.0 || coords.1 >= size.1 {
            return Err(GameError::InvalidCoords);
        }

        if let Some(term) = cell.termination() {
            for other in iter_coords(size) {
                if other != coords && self.cells[other.to_nd_index()].is_termination_of(term.kind) {
                    log::debug!("Replacing previous {:?} at {:?}", term.kind, other);
                    self.cells[other.to_nd_index()] = if is_border(other, size) {
                        Cell::Wall
                    } else {
                        Cell::EMPTY
                    };
                }
            }
        }

        self.cells[coords.to_nd_index()] = cell;
        Ok(())
    }

    /// Rotates the source clockwise. Returns the new facing, `None` when there
    /// is no source.
    pub fn rotate_source(&mut self) -> Option<Direction> {
        self.cells.iter_mut().find_map(|cell| match cell {
            Cell::Termination(term) if term.kind == TerminationKind::Source => {
                term.facing = term.facing.rotate_cw();
                Some(term.facing)
            }
            _ => None,
        })
    }

    fn coord_bounds(&self) -> Result<Coord2> {
        let (rows, cols) = self.size();
        Ok((
            rows.try_into().map_err(|_| GameError::InvalidCoords)?,
            cols.try_into().map_err(|_| GameError::InvalidCoords)?,
        ))
    }
}

/// Finds the single source and sink, checking the grid fits in `Coord`.
fn locate_terminals(cells: &Array2<Cell>) -> core::result::Result<Terminals, MapError> {
    let (rows, cols) = cells.dim();
    if rows > usize::from(Coord::MAX) || cols > usize::from(Coord::MAX) {
        return Err(MapError::DimensionsTooLarge);
    }

    let mut source = None;
    let mut sink = None;
    for ((row, col), cell) in cells.indexed_iter() {
        let Cell::Termination(term) = cell else {
            continue;
        };
        // bounded by the size check above
        let coords = (row as Coord, col as Coord);
        let slot = match term.kind {
            TerminationKind::Source => &mut source,
            TerminationKind::Sink => &mut sink,
        };
        if slot.replace((coords, term.facing)).is_some() {
            return Err(match term.kind {
                TerminationKind::Source => MapError::DuplicateSource,
                TerminationKind::Sink => MapError::DuplicateSink,
            });
        }
    }

    Ok(Terminals {
        source: source.ok_or(MapError::MissingSource)?,
        sink: sink.ok_or(MapError::MissingSink)?,
    })
}

/// A termination is blocked when its open side faces a wall or the edge.
fn is_blocked(cells: &Array2<Cell>, (coords, facing): (Coord2, Direction)) -> bool {
    let (rows, cols) = cells.dim();
    let bounds = (rows as Coord, cols as Coord);
    match facing.step(coords, bounds) {
        Some(next) => cells[next.to_nd_index()].is_wall(),
        None => true,
    }
}
