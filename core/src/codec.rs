//! Plain text map format.
//!
//! ```text
//! <rows>
//! <cols>
//! <delay seconds>
//! <one line of cols cell symbols per row>
//! <queue pipe symbols, possibly empty>
//! ```
//!
//! Cells: `W` wall, `.` empty, a pipe symbol for a placed pipe, `^ v < >` for
//! a source and `U D L R` for a sink, each opening up, down, left or right.
//! Pipes: `═ ║ ╝ ╚ ╗ ╔`. Water is never stored.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use thiserror::Error;

use crate::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Line {line} is missing")]
    MissingLine { line: usize },
    #[error("Line {line} is not a valid number")]
    InvalidNumber { line: usize },
    #[error("Row {row} has {found} cells, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Unknown cell symbol {symbol:?} at row {row}, column {col}")]
    UnknownCell { row: usize, col: usize, symbol: char },
    #[error("Unknown pipe symbol {symbol:?} at queue position {index}")]
    UnknownPipe { index: usize, symbol: char },
    #[error(transparent)]
    Map(#[from] MapError),
}

pub const fn pipe_symbol(shape: PipeShape) -> char {
    use PipeShape::*;
    match shape {
        Horizontal => '═',
        Vertical => '║',
        TopLeft => '╝',
        TopRight => '╚',
        BottomLeft => '╗',
        BottomRight => '╔',
    }
}

pub fn pipe_from_symbol(symbol: char) -> Option<PipeShape> {
    PipeShape::ALL
        .into_iter()
        .find(|&shape| pipe_symbol(shape) == symbol)
}

pub const fn cell_symbol(cell: Cell) -> char {
    use Direction::*;
    use TerminationKind::*;
    match cell {
        Cell::Wall => 'W',
        Cell::Fillable(None) => '.',
        Cell::Fillable(Some(pipe)) => pipe_symbol(pipe.shape()),
        Cell::Termination(term) => match (term.kind, term.facing) {
            (Source, Up) => '^',
            (Source, Down) => 'v',
            (Source, Left) => '<',
            (Source, Right) => '>',
            (Sink, Up) => 'U',
            (Sink, Down) => 'D',
            (Sink, Left) => 'L',
            (Sink, Right) => 'R',
        },
    }
}

pub fn cell_from_symbol(symbol: char) -> Option<Cell> {
    use Direction::*;
    let cell = match symbol {
        'W' => Cell::Wall,
        '.' => Cell::EMPTY,
        '^' => Cell::Termination(Termination::source(Up)),
        'v' => Cell::Termination(Termination::source(Down)),
        '<' => Cell::Termination(Termination::source(Left)),
        '>' => Cell::Termination(Termination::source(Right)),
        'U' => Cell::Termination(Termination::sink(Up)),
        'D' => Cell::Termination(Termination::sink(Down)),
        'L' => Cell::Termination(Termination::sink(Left)),
        'R' => Cell::Termination(Termination::sink(Right)),
        other => Cell::Fillable(Some(Pipe::new(pipe_from_symbol(other)?))),
    };
    Some(cell)
}

pub fn encode_level(level: &Level) -> String {
    let (rows, cols) = level.size();
    let mut out = String::new();

    // writing into a String cannot fail
    let _ = writeln!(out, "{rows}");
    let _ = writeln!(out, "{cols}");
    let _ = writeln!(out, "{}", level.delay);
    for row in level.cells.rows() {
        out.extend(row.iter().map(|&cell| cell_symbol(cell)));
        out.push('\n');
    }
    out.extend(level.pipes.iter().map(|pipe| pipe_symbol(pipe.shape())));
    out.push('\n');

    out
}

/// Parses and validates a level. A missing queue line reads as an empty queue.
pub fn decode_level(text: &str) -> core::result::Result<Level, DecodeError> {
    let mut lines = text.lines().map(|line| line.trim_end_matches('\r'));
    let mut line_no = 0;
    let mut next_line = || {
        line_no += 1;
        lines
            .next()
            .map(|line| (line_no, line))
            .ok_or(DecodeError::MissingLine { line: line_no })
    };

    let rows: usize = parse_number(next_line()?)?;
    let cols: usize = parse_number(next_line()?)?;
    let delay: u32 = parse_number(next_line()?)?;
    if rows > usize::from(Coord::MAX) || cols > usize::from(Coord::MAX) {
        return Err(MapError::DimensionsTooLarge.into());
    }

    let mut cells = Vec::with_capacity(rows.saturating_mul(cols));
    for row in 0..rows {
        let (_, line) = next_line()?;
        let found = line.chars().count();
        if found != cols {
            return Err(DecodeError::RowLength {
                row,
                expected: cols,
                found,
            });
        }
        for (col, symbol) in line.chars().enumerate() {
            let cell = cell_from_symbol(symbol).ok_or(DecodeError::UnknownCell { row, col, symbol })?;
            cells.push(cell);
        }
    }

    let pipes = match next_line() {
        Ok((_, line)) => line
            .chars()
            .enumerate()
            .map(|(index, symbol)| {
                pipe_from_symbol(symbol)
                    .map(Pipe::new)
                    .ok_or(DecodeError::UnknownPipe { index, symbol })
            })
            .collect::<core::result::Result<Vec<_>, _>>()?,
        Err(_) => Vec::new(),
    };

    let level = Level::new(rows, cols, delay, cells, pipes)?;
    log::debug!(
        "Decoded {}x{} level with {} queued pipes",
        rows,
        cols,
        level.pipes.len()
    );
    Ok(level)
}

fn parse_number<T: core::str::FromStr>(
    (line, text): (usize, &str),
) -> core::result::Result<T, DecodeError> {
    text.trim()
        .parse()
        .map_err(|_| DecodeError::InvalidNumber { line })
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMN: &str = "4\n4\n5\nWvWW\nW║.W\nW.╔W\nWUWW\n═╝\n";

    #[test]
    fn decodes_cells_and_queue() {
        let level = decode_level(COLUMN).unwrap();

        assert_eq!(level.size(), (4, 4));
        assert_eq!(level.delay, 5);
        assert_eq!(
            level.cell_at((0, 1)),
            Some(Cell::Termination(Termination::source(Direction::Down)))
        );
        assert_eq!(
            level.cell_at((1, 1)),
            Some(Cell::Fillable(Some(Pipe::new(PipeShape::Vertical))))
        );
        assert_eq!(
            level.cell_at((2, 2)),
            Some(Cell::Fillable(Some(Pipe::new(PipeShape::BottomRight))))
        );
        assert_eq!(
            level.pipes,
            [
                Pipe::new(PipeShape::Horizontal),
                Pipe::new(PipeShape::TopLeft)
            ]
        );
    }

    #[test]
    fn encoding_reproduces_the_text() {
        let level = decode_level(COLUMN).unwrap();
        assert_eq!(encode_level(&level), COLUMN);
    }

    #[test]
    fn every_symbol_maps_back() {
        for shape in PipeShape::ALL {
            assert_eq!(pipe_from_symbol(pipe_symbol(shape)), Some(shape));
        }
        for kind in [TerminationKind::Source, TerminationKind::Sink] {
            for facing in Direction::ALL {
                let cell = Cell::Termination(Termination::new(kind, facing));
                assert_eq!(cell_from_symbol(cell_symbol(cell)), Some(cell));
            }
        }
    }

    #[test]
    fn missing_queue_line_is_empty_queue() {
        let level = decode_level("4\n4\n5\nWvWW\nW..W\nW..W\nWUWW").unwrap();
        assert!(level.pipes.is_empty());
    }

    #[test]
    fn structural_errors_are_reported() {
        assert_eq!(
            decode_level("4\n4\n"),
            Err(DecodeError::MissingLine { line: 3 })
        );
        assert_eq!(
            decode_level("four\n4\n5\n"),
            Err(DecodeError::InvalidNumber { line: 1 })
        );
        assert_eq!(
            decode_level("2\n3\n1\nv.\n"),
            Err(DecodeError::RowLength {
                row: 0,
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            decode_level("2\n2\n1\nvx\nUW\n"),
            Err(DecodeError::UnknownCell {
                row: 0,
                col: 1,
                symbol: 'x'
            })
        );
        assert_eq!(
            decode_level("4\n4\n5\nWvWW\nW..W\nW..W\nWUWW\n═?\n"),
            Err(DecodeError::UnknownPipe {
                index: 1,
                symbol: '?'
            })
        );
    }

    #[test]
    fn oversized_header_is_rejected_before_reading_rows() {
        assert_eq!(
            decode_level("4294967296\n4294967296\n5\nWvWW\n"),
            Err(DecodeError::Map(MapError::DimensionsTooLarge))
        );
        assert_eq!(
            decode_level("256\n4\n5\n"),
            Err(DecodeError::Map(MapError::DimensionsTooLarge))
        );
    }

    #[test]
    fn validation_errors_pass_through() {
        assert_eq!(
            decode_level("4\n4\n0\nWvWW\nW..W\nW..W\nWUWW\n\n"),
            Err(DecodeError::Map(MapError::NonPositiveDelay))
        );
        assert_eq!(
            decode_level("4\n4\n5\nWWWW\nW..W\nW..W\nWUWW\n\n"),
            Err(DecodeError::Map(MapError::MissingSource))
        );
    }
}
