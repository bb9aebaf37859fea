// THEORY:
// A `TraversalLine` is the 1-D path the sorter walks: a row, a column, or an
// anti-diagonal of constant `x - y`. Rows and columns have fixed lengths, diagonals do
// not (1 up to min(width, height)), so every line is just a generated list of
// coordinates. The sorter extracts the pixels at those coordinates into an owned
// buffer, reorders runs inside it, and writes the buffer back to the same coordinates.
//
// Lines of one direction never share a pixel, and together they cover the image
// exactly once.

use serde::{Deserialize, Serialize};

/// One `(x, y)` pixel coordinate.
pub type Coord = (u32, u32);

/// An ordered sequence of coordinates forming one scan line.
pub type TraversalLine = Vec<Coord>;

/// The scan geometry of a sort pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Left to right along each row.
    Rows,
    /// Top to bottom along each column.
    Columns,
    /// Top-left to bottom-right along each anti-diagonal `x - y = d`.
    Diagonals,
}

impl Direction {
    /// Number of lines this direction produces for a `width` x `height` image.
    pub fn line_count(self, width: u32, height: u32) -> usize {
        if width == 0 || height == 0 {
            return 0;
        }
        match self {
            Direction::Rows => height as usize,
            Direction::Columns => width as usize,
            Direction::Diagonals => (width + height - 1) as usize,
        }
    }

    /// Lazily generates every traversal line of this direction.
    pub fn lines(self, width: u32, height: u32) -> impl Iterator<Item = TraversalLine> {
        let count = self.line_count(width, height);
        (0..count).map(move |index| match self {
            Direction::Rows => row(index as u32, width),
            Direction::Columns => column(index as u32, height),
            // offsets run from -(height - 1) up to width - 1
            Direction::Diagonals => diagonal(index as i64 - (height as i64 - 1), width, height),
        })
    }
}

fn row(y: u32, width: u32) -> TraversalLine {
    (0..width).map(|x| (x, y)).collect()
}

fn column(x: u32, height: u32) -> TraversalLine {
    (0..height).map(|y| (x, y)).collect()
}

/// All `(y + offset, y)` inside the image, in increasing `y`.
fn diagonal(offset: i64, width: u32, height: u32) -> TraversalLine {
    let y_start = (-offset).max(0);
    let y_end = (height as i64).min(width as i64 - offset);
    (y_start..y_end)
        .map(|y| ((y + offset) as u32, y as u32))
        .collect()
}
