use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::Direction;

bitflags! {
    /// Sides of a cell that water can pass through.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct Openings: u8 {
        const UP    = 1;
        const DOWN  = 1 << 1;
        const LEFT  = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

impl Openings {
    pub const fn from_direction(dir: Direction) -> Self {
        match dir {
            Direction::Up => Self::UP,
            Direction::Down => Self::DOWN,
            Direction::Left => Self::LEFT,
            Direction::Right => Self::RIGHT,
        }
    }

    pub const fn has(self, dir: Direction) -> bool {
        self.contains(Self::from_direction(dir))
    }

    /// Iterates the open sides in `Direction::ALL` order.
    pub fn directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |&dir| self.has(dir))
    }
}

/// Every shape a player pipe can take. Each one opens exactly two sides, so a
/// connected run of pipes never branches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipeShape {
    Horizontal,
    Vertical,
    /// Opens up and left.
    TopLeft,
    /// Opens up and right.
    TopRight,
    /// Opens down and left.
    BottomLeft,
    /// Opens down and right.
    BottomRight,
}

impl PipeShape {
    pub const ALL: [PipeShape; 6] = [
        Self::Horizontal,
        Self::Vertical,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    pub const fn openings(self) -> Openings {
        use PipeShape::*;
        match self {
            Horizontal => Openings::LEFT.union(Openings::RIGHT),
            Vertical => Openings::UP.union(Openings::DOWN),
            TopLeft => Openings::UP.union(Openings::LEFT),
            TopRight => Openings::UP.union(Openings::RIGHT),
            BottomLeft => Openings::DOWN.union(Openings::LEFT),
            BottomRight => Openings::DOWN.union(Openings::RIGHT),
        }
    }

    /// Shape with exactly the given openings, if it is one of the enumerated ones.
    pub fn from_openings(openings: Openings) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|shape| shape.openings() == openings)
    }

    /// The straight shape that lets water through along `dir`.
    pub const fn straight_along(dir: Direction) -> Self {
        match dir {
            Direction::Up | Direction::Down => Self::Vertical,
            Direction::Left | Direction::Right => Self::Horizontal,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pipe {
    shape: PipeShape,
    filled: bool,
}

impl Pipe {
    pub const fn new(shape: PipeShape) -> Self {
        Self {
            shape,
            filled: false,
        }
    }

    pub const fn shape(self) -> PipeShape {
        self.shape
    }

    pub const fn is_filled(self) -> bool {
        self.filled
    }

    pub const fn openings(self) -> Openings {
        self.shape.openings()
    }

    pub const fn has_opening(self, side: Direction) -> bool {
        self.openings().has(side)
    }

    /// Side the water leaves through after entering through `entry`, `None` when
    /// `entry` is closed.
    pub fn exit_from(self, entry: Direction) -> Option<Direction> {
        if !self.has_opening(entry) {
            return None;
        }
        self.openings()
            .difference(Openings::from_direction(entry))
            .directions()
            .next()
    }

    pub(crate) fn fill(&mut self) {
        self.filled = true;
    }

    pub(crate) const fn filled_straight(dir: Direction) -> Self {
        Self {
            shape: PipeShape::straight_along(dir),
            filled: true,
        }
    }
}

impl From<PipeShape> for Pipe {
    fn from(shape: PipeShape) -> Self {
        Self::new(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shape_has_two_openings() {
        for shape in PipeShape::ALL {
            assert_eq!(shape.openings().bits().count_ones(), 2, "{shape:?}");
            assert_eq!(PipeShape::from_openings(shape.openings()), Some(shape));
        }
    }

    #[test]
    fn exit_from_follows_the_bend() {
        let pipe = Pipe::new(PipeShape::BottomRight);

        assert_eq!(pipe.exit_from(Direction::Down), Some(Direction::Right));
        assert_eq!(pipe.exit_from(Direction::Right), Some(Direction::Down));
        assert_eq!(pipe.exit_from(Direction::Up), None);
        assert_eq!(pipe.exit_from(Direction::Left), None);
    }

    #[test]
    fn straight_pipes_pass_through() {
        let vertical = Pipe::new(PipeShape::Vertical);
        assert_eq!(vertical.exit_from(Direction::Up), Some(Direction::Down));

        let horizontal = Pipe::new(PipeShape::straight_along(Direction::Left));
        assert_eq!(horizontal.shape(), PipeShape::Horizontal);
        assert_eq!(horizontal.exit_from(Direction::Right), Some(Direction::Left));
    }

    #[test]
    fn three_way_openings_are_not_a_shape() {
        let tee = Openings::UP | Openings::LEFT | Openings::RIGHT;
        assert_eq!(PipeShape::from_openings(tee), None);
        assert_eq!(PipeShape::from_openings(Openings::all()), None);
    }

    #[test]
    fn new_pipes_start_unfilled() {
        let mut pipe = Pipe::new(PipeShape::TopLeft);
        assert!(!pipe.is_filled());
        pipe.fill();
        assert!(pipe.is_filled());
    }
}
