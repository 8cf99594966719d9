use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// The pipes water would pass through, in flow order, starting right after the
/// source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlowPath {
    pub pipes: Vec<Coord2>,
    /// Whether the last pipe (or the source itself) feeds into the sink.
    pub reaches_sink: bool,
}

impl FlowPath {
    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }
}

/// Playing field. Owns every cell; dimensions never change after construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    cells: Array2<Cell>,
    terminals: Terminals,
    /// Last distance handed to `fill_tiles`.
    flow: Option<Distance>,
}

impl Grid {
    pub fn from_level(level: &Level) -> core::result::Result<Self, MapError> {
        let terminals = level.validate()?;
        Ok(Self {
            cells: level.cells.clone(),
            terminals,
            flow: None,
        })
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.cells.dim();
        // checked against Coord::MAX in locate_terminals
        (dim.0 as Coord, dim.1 as Coord)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn cell_at(&self, coords: Coord2) -> Option<Cell> {
        self.cells.get(coords.to_nd_index()).copied()
    }

    pub fn pipe_at(&self, coords: Coord2) -> Option<Pipe> {
        self.cells
            .get(coords.to_nd_index())
            .and_then(Cell::pipe)
    }

    pub fn is_filled(&self, coords: Coord2) -> bool {
        self.pipe_at(coords).is_some_and(Pipe::is_filled)
    }

    /// Read-only view of the cell storage.
    pub fn cells(&self) -> &Array2<Cell> {
        &self.cells
    }

    pub fn iter_cells(&self) -> impl Iterator<Item = (Coord2, Cell)> + '_ {
        iter_coords(self.size()).map(|coords| (coords, self.cells[coords.to_nd_index()]))
    }

    pub fn source(&self) -> Coord2 {
        self.terminals.source.0
    }

    pub fn sink(&self) -> Coord2 {
        self.terminals.sink.0
    }

    pub fn flow_distance(&self) -> Option<Distance> {
        self.flow
    }

    /// Stores `pipe` in an empty fillable cell. Anything else is rejected
    /// without touching the grid.
    pub fn try_place_pipe(&mut self, coords: Coord2, pipe: Pipe) -> bool {
        match self.cells.get_mut(coords.to_nd_index()) {
            Some(cell) if cell.is_empty_fillable() => {
                *cell = Cell::Fillable(Some(pipe));
                log::debug!("Placed {:?} at {:?}", pipe.shape(), coords);
                true
            }
            _ => false,
        }
    }

    /// Clears a fillable cell regardless of its water, returning what it held.
    pub fn remove(&mut self, coords: Coord2) -> Option<Pipe> {
        match self.cells.get_mut(coords.to_nd_index()) {
            Some(Cell::Fillable(pipe)) => pipe.take(),
            _ => None,
        }
    }

    /// Reverts a placement. Callers only undo pipes water has not reached.
    pub fn undo(&mut self, coords: Coord2) {
        debug_assert!(!self.is_filled(coords), "undoing a filled pipe at {coords:?}");
        if let Some(pipe) = self.remove(coords) {
            log::debug!("Undid {:?} at {:?}", pipe.shape(), coords);
        }
    }

    /// Follows connected openings from the source. Every pipe has exactly two
    /// openings, so there is at most one way forward from each cell.
    pub fn trace_path(&self) -> FlowPath {
        let bounds = self.size();
        let (mut at, mut heading) = self.terminals.source;
        let mut visited = BTreeSet::from([at]);
        let mut path = FlowPath::default();

        while let Some(next) = heading.step(at, bounds) {
            if !visited.insert(next) {
                log::trace!("Path loops back into {:?}", next);
                break;
            }

            let entry = heading.opposite();
            match self.cells[next.to_nd_index()] {
                Cell::Fillable(Some(pipe)) => {
                    let Some(exit) = pipe.exit_from(entry) else {
                        log::trace!("Path mismatched at {:?}", next);
                        break;
                    };
                    path.pipes.push(next);
                    at = next;
                    heading = exit;
                }
                Cell::Termination(term)
                    if term.kind == TerminationKind::Sink && term.facing == entry =>
                {
                    path.reaches_sink = true;
                    break;
                }
                _ => break,
            }
        }

        log::trace!(
            "Traced {} connected pipes, reaches sink: {}",
            path.len(),
            path.reaches_sink
        );
        path
    }

    pub fn check_path(&self) -> bool {
        self.trace_path().reaches_sink
    }

    pub fn fill_begin_tile(&mut self) {
        self.fill_termination(self.source());
    }

    /// Fills the first `distance` steps beyond the source. The sink counts as
    /// the step after the last pipe of a complete path.
    pub fn fill_tiles(&mut self, distance: Distance) {
        self.flow = Some(distance);

        let path = self.trace_path();
        let steps = usize::try_from(distance).unwrap_or(usize::MAX);
        for &coords in path.pipes.iter().take(steps) {
            self.fill_pipe(coords);
        }
        if path.reaches_sink && steps > path.len() {
            self.fill_termination(self.sink());
        }
    }

    /// Whether the water front has moved past the last connected pipe.
    pub fn has_lost(&self) -> bool {
        match self.flow {
            Some(distance) if distance > 0 => {
                let path = self.trace_path();
                !path.reaches_sink && usize::try_from(distance).unwrap_or(usize::MAX) > path.len()
            }
            _ => false,
        }
    }

    /// Fills the source, every connected pipe and, when reached, the sink.
    pub fn fill_all(&mut self) {
        let path = self.trace_path();
        if !path.reaches_sink {
            log::warn!("Filling an incomplete path of {} pipes", path.len());
        }

        self.fill_begin_tile();
        for &coords in &path.pipes {
            self.fill_pipe(coords);
        }
        if path.reaches_sink {
            self.fill_termination(self.sink());
        }
    }

    fn fill_pipe(&mut self, coords: Coord2) {
        if let Cell::Fillable(Some(pipe)) = &mut self.cells[coords.to_nd_index()] {
            if !pipe.is_filled() {
                log::trace!("Water reached {:?}", coords);
                pipe.fill();
            }
        }
    }

    fn fill_termination(&mut self, coords: Coord2) {
        if let Cell::Termination(term) = &mut self.cells[coords.to_nd_index()] {
            if !term.is_filled() {
                log::trace!("Water reached {:?} {:?}", term.kind, coords);
                term.fill();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V: Pipe = Pipe::new(PipeShape::Vertical);
    const H: Pipe = Pipe::new(PipeShape::Horizontal);

    /// 4x4, walls around, source at (0, 1) facing down, sink at (3, 1) facing up.
    fn column_grid() -> Grid {
        let mut level = Level::blank(4, 4, 1);
        level.cells[[0, 1]] = Cell::Termination(Termination::source(Direction::Down));
        level.cells[[3, 1]] = Cell::Termination(Termination::sink(Direction::Up));
        Grid::from_level(&level).unwrap()
    }

    /// 5x5, source at (0, 1) facing down, sink at (4, 3) facing up.
    fn bend_grid() -> Grid {
        let mut level = Level::blank(5, 5, 1);
        level.cells[[0, 1]] = Cell::Termination(Termination::source(Direction::Down));
        level.cells[[4, 3]] = Cell::Termination(Termination::sink(Direction::Up));
        Grid::from_level(&level).unwrap()
    }

    fn filled_count(grid: &Grid) -> usize {
        grid.iter_cells()
            .filter(|(_, cell)| cell.pipe().is_some_and(Pipe::is_filled))
            .count()
    }

    #[test]
    fn placement_only_on_empty_fillable_cells() {
        let mut grid = column_grid();

        assert!(grid.try_place_pipe((1, 1), V));
        assert!(!grid.try_place_pipe((1, 1), H));
        assert!(!grid.try_place_pipe((0, 0), V));
        assert!(!grid.try_place_pipe((0, 1), V));
        assert!(!grid.try_place_pipe((3, 1), V));
        assert!(!grid.try_place_pipe((9, 9), V));
        assert_eq!(grid.pipe_at((1, 1)), Some(V));
    }

    #[test]
    fn check_path_on_straight_column() {
        let mut grid = column_grid();
        assert!(!grid.check_path());

        grid.try_place_pipe((1, 1), V);
        assert!(!grid.check_path());

        grid.try_place_pipe((2, 1), V);
        assert!(grid.check_path());
        assert_eq!(grid.trace_path().pipes, [(1, 1), (2, 1)]);
    }

    #[test]
    fn mismatched_opening_breaks_path() {
        let mut grid = column_grid();
        grid.try_place_pipe((1, 1), V);
        grid.try_place_pipe((2, 1), H);

        let path = grid.trace_path();
        assert_eq!(path.pipes, [(1, 1)]);
        assert!(!path.reaches_sink);
    }

    #[test]
    fn path_follows_bends() {
        let mut grid = bend_grid();
        grid.try_place_pipe((1, 1), V);
        grid.try_place_pipe((2, 1), Pipe::new(PipeShape::TopRight));
        grid.try_place_pipe((2, 2), H);
        grid.try_place_pipe((2, 3), Pipe::new(PipeShape::BottomLeft));
        grid.try_place_pipe((3, 3), V);

        assert!(grid.check_path());
        assert_eq!(grid.trace_path().len(), 5);
    }

    #[test]
    fn removing_any_pipe_breaks_complete_path() {
        let layout = [
            ((1, 1), V),
            ((2, 1), Pipe::new(PipeShape::TopRight)),
            ((2, 2), H),
            ((2, 3), Pipe::new(PipeShape::BottomLeft)),
            ((3, 3), V),
        ];

        for skip in 0..layout.len() {
            let mut grid = bend_grid();
            for (i, &(coords, pipe)) in layout.iter().enumerate() {
                if i != skip {
                    grid.try_place_pipe(coords, pipe);
                }
            }
            assert!(!grid.check_path(), "path held without pipe {skip}");
        }
    }

    #[test]
    fn cycle_guard_stops_traversal() {
        let mut grid = bend_grid();
        // a closed ring fed from the source
        grid.try_place_pipe((1, 1), V);
        grid.try_place_pipe((2, 1), Pipe::new(PipeShape::TopRight));
        grid.try_place_pipe((2, 2), Pipe::new(PipeShape::TopLeft));
        grid.try_place_pipe((1, 2), Pipe::new(PipeShape::BottomLeft));

        let path = grid.trace_path();
        assert!(!path.reaches_sink);
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn fill_tiles_walks_distance_steps() {
        let mut grid = column_grid();
        grid.try_place_pipe((1, 1), V);
        grid.try_place_pipe((2, 1), V);

        grid.fill_begin_tile();
        grid.fill_tiles(0);
        assert!(grid.cell_at((0, 1)).and_then(|cell| cell.termination()).unwrap().is_filled());
        assert!(!grid.is_filled((1, 1)));

        grid.fill_tiles(1);
        assert!(grid.is_filled((1, 1)));
        assert!(!grid.is_filled((2, 1)));

        grid.fill_tiles(2);
        assert!(grid.is_filled((2, 1)));
        assert!(!grid.is_filled((3, 1)));

        grid.fill_tiles(3);
        assert!(grid.is_filled((3, 1)));
        assert!(!grid.has_lost());
    }

    #[test]
    fn loss_when_flow_outruns_pipes() {
        let mut grid = column_grid();
        grid.try_place_pipe((1, 1), V);

        assert!(!grid.has_lost());
        grid.fill_tiles(1);
        assert!(!grid.has_lost());
        grid.fill_tiles(2);
        assert!(grid.has_lost());
        assert!(grid.is_filled((1, 1)));
    }

    #[test]
    fn fill_is_monotonic_until_loss() {
        let mut grid = bend_grid();
        grid.try_place_pipe((1, 1), V);
        grid.try_place_pipe((2, 1), Pipe::new(PipeShape::TopRight));
        grid.try_place_pipe((2, 2), H);

        let mut previous = 0;
        for distance in 0..=3 {
            grid.fill_tiles(distance);
            let now = filled_count(&grid);
            assert!(now >= previous);
            assert_eq!(now, distance as usize);
            previous = now;
            assert!(!grid.has_lost());
        }
        grid.fill_tiles(4);
        assert!(grid.has_lost());
    }

    #[test]
    fn remove_and_undo_clear_cells() {
        let mut grid = column_grid();
        grid.try_place_pipe((1, 1), V);
        grid.try_place_pipe((2, 1), H);

        assert_eq!(grid.remove((2, 1)), Some(H));
        assert_eq!(grid.remove((0, 0)), None);
        grid.undo((1, 1));
        assert_eq!(grid.pipe_at((1, 1)), None);
    }

    #[test]
    fn fill_all_fills_complete_path() {
        let mut grid = column_grid();
        grid.try_place_pipe((1, 1), V);
        grid.try_place_pipe((2, 1), V);
        grid.try_place_pipe((2, 2), H);

        grid.fill_all();

        assert!(grid.is_filled((0, 1)));
        assert!(grid.is_filled((1, 1)));
        assert!(grid.is_filled((2, 1)));
        assert!(grid.is_filled((3, 1)));
        assert!(!grid.is_filled((2, 2)));
    }
}
