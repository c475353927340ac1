use serde::{Deserialize, Serialize};

use crate::topology::direction::Direction;

/// A `(row, column)` coordinate on a grid.
///
/// Positions are plain values: equality and hashing are structural, and the
/// `Ord` impl gives the canonical row-major order used wherever the crate
/// needs a deterministic iteration order (shape discovery seeds, test
/// fixtures).
///
/// Coordinates are signed so that translation can step off the grid; bounds
/// and wrap-around are the grid's concern, not the position's.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub row: i64,
    pub col: i64,
}

impl Position {
    pub fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }

    /// The position reached by taking `steps` steps in `direction`.
    ///
    /// `Direction::None` leaves the position unchanged; callers that require
    /// an actual connection must reject it before translating (see
    /// [`crate::topology::Grid::neighbor_toward`]).
    pub fn after(self, direction: Direction, steps: i64) -> Position {
        let (dr, dc) = direction.delta();
        Position {
            row: self.row + dr * steps,
            col: self.col + dc * steps,
        }
    }

    /// L1 distance between two positions.
    pub fn manhattan_distance(self, other: Position) -> u64 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn after_translates_by_steps() {
        let p = Position::new(2, 3);
        assert_eq!(p.after(Direction::Up, 1), Position::new(1, 3));
        assert_eq!(p.after(Direction::Right, 4), Position::new(2, 7));
        assert_eq!(p.after(Direction::None, 5), p);
    }

    #[test]
    fn translation_may_leave_the_first_quadrant() {
        let p = Position::new(0, 0);
        assert_eq!(p.after(Direction::Left, 2), Position::new(0, -2));
    }

    #[test]
    fn ordering_is_row_major() {
        let mut positions = vec![
            Position::new(1, 0),
            Position::new(0, 2),
            Position::new(0, 1),
        ];
        positions.sort();
        assert_eq!(
            positions,
            vec![
                Position::new(0, 1),
                Position::new(0, 2),
                Position::new(1, 0),
            ]
        );
    }

    #[test]
    fn manhattan_distance_is_symmetric() {
        let a = Position::new(1, 1);
        let b = Position::new(4, -1);
        assert_eq!(a.manhattan_distance(b), 5);
        assert_eq!(b.manhattan_distance(a), 5);
    }
}
