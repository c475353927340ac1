use serde::{Deserialize, Serialize};

/// An orthogonal step direction on a grid.
///
/// `None` is the "no movement" direction. It is accepted anywhere a direction
/// is merely descriptive, but any operation that requires an actual connection
/// between two cells (neighbor lookup, open borders) rejects it eagerly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// The four real directions, in canonical order.
    pub const ORTHOGONAL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::None => Direction::None,
        }
    }

    /// The `(row, column)` offset of a single step. `None` is a zero offset.
    pub fn delta(self) -> (i64, i64) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
            Direction::None => (0, 0),
        }
    }
}

/// Which cells count as neighbors during traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdjacencyMode {
    Orthogonal,
    Diagonal,
    Both,
}

impl AdjacencyMode {
    /// The step offsets this mode covers, in canonical order.
    pub fn deltas(self) -> &'static [(i64, i64)] {
        const ORTHOGONAL: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        const DIAGONAL: [(i64, i64); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
        const BOTH: [(i64, i64); 8] = [
            (-1, 0),
            (1, 0),
            (0, -1),
            (0, 1),
            (-1, -1),
            (-1, 1),
            (1, -1),
            (1, 1),
        ];
        match self {
            AdjacencyMode::Orthogonal => &ORTHOGONAL,
            AdjacencyMode::Diagonal => &DIAGONAL,
            AdjacencyMode::Both => &BOTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for dir in Direction::ORTHOGONAL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
        assert_eq!(Direction::None.opposite(), Direction::None);
    }

    #[test]
    fn deltas_match_directions() {
        assert_eq!(Direction::Up.delta(), (-1, 0));
        assert_eq!(Direction::Right.delta(), (0, 1));
        assert_eq!(Direction::None.delta(), (0, 0));
    }

    #[test]
    fn both_mode_covers_orthogonal_and_diagonal() {
        let both = AdjacencyMode::Both.deltas();
        for d in AdjacencyMode::Orthogonal.deltas() {
            assert!(both.contains(d));
        }
        for d in AdjacencyMode::Diagonal.deltas() {
            assert!(both.contains(d));
        }
        assert_eq!(both.len(), 8);
    }
}
