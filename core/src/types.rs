use serde::{Deserialize, Serialize};

/// Single coordinate axis used for grid height, width, and positions.
pub type Coord = u8;

/// Two-dimensional coordinates `(row, col)`.
pub type Coord2 = (Coord, Coord);

/// How many pipes' worth of water has advanced past the source.
pub type Distance = u32;

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

/// One of the four sides of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub const fn opposite(self) -> Self {
        use Direction::*;
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    /// Next direction clockwise.
    pub const fn rotate_cw(self) -> Self {
        use Direction::*;
        match self {
            Up => Right,
            Right => Down,
            Down => Left,
            Left => Up,
        }
    }

    /// Unit `(row, col)` displacement.
    pub const fn offset(self) -> (isize, isize) {
        use Direction::*;
        match self {
            Up => (-1, 0),
            Down => (1, 0),
            Left => (0, -1),
            Right => (0, 1),
        }
    }

    /// Moves one cell towards this side, `None` when that leaves `bounds`.
    pub fn step(self, coords: Coord2, bounds: Coord2) -> Option<Coord2> {
        apply_delta(coords, self.offset(), bounds)
    }
}

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
fn apply_delta(coords: Coord2, delta: (isize, isize), bounds: Coord2) -> Option<Coord2> {
    let (row, col) = coords;
    let (d_row, d_col) = delta;
    let (max_row, max_col) = bounds;

    let next_row = row.checked_add_signed(d_row.try_into().ok()?)?;
    if next_row >= max_row {
        return None;
    }

    let next_col = col.checked_add_signed(d_col.try_into().ok()?)?;
    if next_col >= max_col {
        return None;
    }

    Some((next_row, next_col))
}

/// Whether `coords` lies on the outermost ring of a `bounds` sized grid.
pub const fn is_border(coords: Coord2, bounds: Coord2) -> bool {
    coords.0 == 0 || coords.1 == 0 || coords.0 + 1 == bounds.0 || coords.1 + 1 == bounds.1
}

/// Row-major iterator over every coordinate of a `bounds` sized grid.
pub fn iter_coords(bounds: Coord2) -> impl Iterator<Item = Coord2> {
    let (rows, cols) = bounds;
    (0..rows).flat_map(move |row| (0..cols).map(move |col| (row, col)))
}
