use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    topology::{direction::AdjacencyMode, direction::Direction, position::Position},
};

/// A rectangular, 0-indexed, row-major grid of values.
///
/// Dimensions are derived once at construction and never change; resizing
/// means building a new grid. The only mutations after construction are
/// single-cell value updates ([`Grid::set_value`]) and wall installation
/// ([`Grid::add_wall`]), both idempotent.
///
/// A grid can be *wrapping* (toroidal): out-of-range coordinates fold to the
/// opposite edge, and neighbor enumeration crosses the edges. Walls sever
/// specific adjacent pairs from the adjacency graph; a wall between two
/// edge-opposite cells of a wrapping grid blocks the wrap-around step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
    walls: HashSet<(Position, Position)>,
    wrapping: bool,
}

impl<T> Grid<T> {
    /// Builds a grid from rows of values. Every row must have the same
    /// length; ragged input fails fast with `MalformedTopology`.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let rows_number = rows.len();
        let cols = rows.first().map_or(0, Vec::len);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::malformed_topology(format!(
                    "row {} has length {}, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
        }
        Ok(Self {
            rows: rows_number,
            cols,
            cells: rows.into_iter().flatten().collect(),
            walls: HashSet::new(),
            wrapping: false,
        })
    }

    /// Marks the grid as toroidal. Consumes and returns the grid so it can be
    /// chained onto a constructor.
    pub fn wrapping(mut self) -> Self {
        self.wrapping = true;
        self
    }

    pub fn is_wrapping(&self) -> bool {
        self.wrapping
    }

    pub fn rows_number(&self) -> usize {
        self.rows
    }

    pub fn columns_number(&self) -> usize {
        self.cols
    }

    /// True if `position` lies within the raw (pre-wrap) bounds.
    pub fn contains(&self, position: Position) -> bool {
        position.row >= 0
            && position.col >= 0
            && (position.row as usize) < self.rows
            && (position.col as usize) < self.cols
    }

    /// Folds an out-of-range coordinate to the opposite edge when the grid is
    /// wrapping; the identity otherwise. Folding an empty grid is a no-op.
    pub fn normalize(&self, position: Position) -> Position {
        if !self.wrapping || self.rows == 0 || self.cols == 0 {
            return position;
        }
        Position {
            row: position.row.rem_euclid(self.rows as i64),
            col: position.col.rem_euclid(self.cols as i64),
        }
    }

    fn index(&self, position: Position) -> usize {
        position.row as usize * self.cols + position.col as usize
    }

    pub fn get(&self, position: Position) -> Option<&T> {
        let position = self.normalize(position);
        self.contains(position).then(|| &self.cells[self.index(position)])
    }

    /// Like [`Grid::get`] but an out-of-grid position is an error.
    pub fn value(&self, position: Position) -> Result<&T> {
        self.get(position).ok_or_else(|| {
            Error::malformed_topology(format!("position {position} lies outside the grid"))
        })
    }

    /// Replaces the value at `position`. The single permitted post-construction
    /// cell mutation.
    pub fn set_value(&mut self, position: Position, value: T) -> Result<()> {
        let position = self.normalize(position);
        if !self.contains(position) {
            return Err(Error::malformed_topology(format!(
                "cannot set value outside the grid at {position}"
            )));
        }
        let index = self.index(position);
        self.cells[index] = value;
        Ok(())
    }

    /// Severs the edge between two adjacent cells. Walls are symmetric
    /// (stored as one unordered pair) and idempotent to install twice.
    pub fn add_wall(&mut self, a: Position, b: Position) -> Result<()> {
        let a = self.normalize(a);
        let b = self.normalize(b);
        if !self.contains(a) || !self.contains(b) {
            return Err(Error::malformed_topology(format!(
                "wall {{{a}, {b}}} references a position outside the grid"
            )));
        }
        if !self.geometrically_adjacent(a, b) {
            return Err(Error::malformed_topology(format!(
                "wall {{{a}, {b}}} does not join two adjacent cells"
            )));
        }
        self.walls.insert(canonical_pair(a, b));
        Ok(())
    }

    pub fn has_wall(&self, a: Position, b: Position) -> bool {
        self.walls.contains(&canonical_pair(a, b))
    }

    /// Orthogonal adjacency ignoring walls, but honoring wrap-around.
    fn geometrically_adjacent(&self, a: Position, b: Position) -> bool {
        AdjacencyMode::Orthogonal.deltas().iter().any(|&(dr, dc)| {
            self.normalize(Position::new(a.row + dr, a.col + dc)) == b
        })
    }

    /// The in-grid cell one step from `position` in `direction`, or `None`
    /// if the step leaves the grid or crosses a wall. `Direction::None` is
    /// rejected: a neighbor lookup requires an actual connection.
    pub fn neighbor_toward(
        &self,
        position: Position,
        direction: Direction,
    ) -> Result<Option<Position>> {
        if direction == Direction::None {
            return Err(Error::malformed_topology(
                "Direction::None cannot name a neighbor",
            ));
        }
        let raw = position.after(direction, 1);
        Ok(self.admit_step(position, raw))
    }

    /// All in-grid neighbors of `position` under the given adjacency mode,
    /// wall-aware and wrap-aware, in the mode's canonical delta order.
    pub fn neighbors(&self, position: Position, mode: AdjacencyMode) -> Vec<Position> {
        mode.deltas()
            .iter()
            .filter_map(|&(dr, dc)| {
                let raw = Position::new(position.row + dr, position.col + dc);
                self.admit_step(position, raw)
            })
            .collect()
    }

    /// True when `a` and `b` are connected in the adjacency graph: orthogonal
    /// neighbors, both in-grid, with no wall between them.
    pub fn is_adjacent(&self, a: Position, b: Position) -> bool {
        if !self.contains(a) {
            return false;
        }
        let b = self.normalize(b);
        self.contains(b) && self.neighbors(a, AdjacencyMode::Orthogonal).contains(&b)
    }

    // The wall check precedes wrap normalization acceptance: a wall registered
    // on the folded pair blocks the wrap-around step itself.
    fn admit_step(&self, from: Position, raw_target: Position) -> Option<Position> {
        let target = self.normalize(raw_target);
        if !self.contains(target) {
            return None;
        }
        if self.has_wall(self.normalize(from), target) {
            return None;
        }
        Some(target)
    }

    /// Row-major iteration over every position of the grid.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let cols = self.cols as i64;
        (0..self.rows as i64)
            .flat_map(move |row| (0..cols).map(move |col| Position::new(row, col)))
    }

    /// Row-major iteration over `(position, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &T)> + '_ {
        self.positions().map(move |p| (p, &self.cells[self.index(p)]))
    }

    /// Builds a same-shaped grid by applying `f` to every cell, preserving
    /// walls and wrap mode.
    pub fn map<U>(&self, f: impl Fn(Position, &T) -> U) -> Grid<U> {
        Grid {
            rows: self.rows,
            cols: self.cols,
            cells: self.iter().map(|(p, v)| f(p, v)).collect(),
            walls: self.walls.clone(),
            wrapping: self.wrapping,
        }
    }

    /// Fallible [`Grid::map`]: the first cell error aborts the whole build.
    pub fn try_map<U, E>(
        &self,
        f: impl Fn(Position, &T) -> std::result::Result<U, E>,
    ) -> std::result::Result<Grid<U>, E> {
        let cells = self
            .iter()
            .map(|(p, v)| f(p, v))
            .collect::<std::result::Result<Vec<U>, E>>()?;
        Ok(Grid {
            rows: self.rows,
            cols: self.cols,
            cells,
            walls: self.walls.clone(),
            wrapping: self.wrapping,
        })
    }
}

impl<T: Clone> Grid<T> {
    /// A `rows` x `cols` grid with every cell set to `value`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            cells: vec![value; rows * cols],
            walls: HashSet::new(),
            wrapping: false,
        }
    }
}

fn canonical_pair(a: Position, b: Position) -> (Position, Position) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn grid_3x3() -> Grid<i64> {
        Grid::from_rows(vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]]).unwrap()
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let result = Grid::from_rows(vec![vec![1, 2], vec![3]]);
        assert!(result.is_err());
    }

    #[test]
    fn values_are_row_major() {
        let grid = grid_3x3();
        assert_eq!(grid.value(Position::new(1, 2)).unwrap(), &5);
        assert_eq!(grid.get(Position::new(3, 0)), None);
    }

    #[test]
    fn set_value_updates_a_single_cell() {
        let mut grid = grid_3x3();
        grid.set_value(Position::new(0, 1), 41).unwrap();
        assert_eq!(grid.value(Position::new(0, 1)).unwrap(), &41);
        assert!(grid.set_value(Position::new(9, 9), 0).is_err());
    }

    #[test]
    fn orthogonal_neighbors_respect_bounds() {
        let grid = grid_3x3();
        let mut corner = grid.neighbors(Position::new(0, 0), AdjacencyMode::Orthogonal);
        corner.sort();
        assert_eq!(corner, vec![Position::new(0, 1), Position::new(1, 0)]);

        let center = grid.neighbors(Position::new(1, 1), AdjacencyMode::Both);
        assert_eq!(center.len(), 8);
    }

    #[test]
    fn walls_sever_adjacency() {
        let mut grid = grid_3x3();
        grid.add_wall(Position::new(0, 0), Position::new(0, 1)).unwrap();
        // Installing the same wall twice is fine.
        grid.add_wall(Position::new(0, 1), Position::new(0, 0)).unwrap();

        assert!(!grid.is_adjacent(Position::new(0, 0), Position::new(0, 1)));
        assert!(grid.is_adjacent(Position::new(0, 0), Position::new(1, 0)));
        let neighbors = grid.neighbors(Position::new(0, 0), AdjacencyMode::Orthogonal);
        assert_eq!(neighbors, vec![Position::new(1, 0)]);
    }

    #[test]
    fn wall_must_join_adjacent_in_grid_cells() {
        let mut grid = grid_3x3();
        assert!(grid
            .add_wall(Position::new(0, 0), Position::new(2, 2))
            .is_err());
        assert!(grid
            .add_wall(Position::new(0, 0), Position::new(0, 3))
            .is_err());
    }

    #[test]
    fn none_direction_is_rejected_for_neighbor_lookup() {
        let grid = grid_3x3();
        assert!(grid
            .neighbor_toward(Position::new(1, 1), Direction::None)
            .is_err());
        assert_eq!(
            grid.neighbor_toward(Position::new(1, 1), Direction::Up)
                .unwrap(),
            Some(Position::new(0, 1))
        );
        assert_eq!(
            grid.neighbor_toward(Position::new(0, 1), Direction::Up)
                .unwrap(),
            None
        );
    }

    #[test]
    fn wrapping_grid_folds_out_of_range_positions() {
        let grid = Grid::filled(4, 4, 0u8).wrapping();
        assert_eq!(grid.normalize(Position::new(-1, 0)), Position::new(3, 0));
        assert_eq!(grid.normalize(Position::new(0, 4)), Position::new(0, 0));
        assert_eq!(grid.get(Position::new(-1, -1)), Some(&0));
    }

    // Wrapped-topology scenario: a wall between (0,0) and (0,3) on a 4x4
    // torus blocks the horizontal wrap step but leaves the vertical one.
    #[test]
    fn wall_blocks_wrap_around_movement() {
        let mut grid = Grid::filled(4, 4, 0u8).wrapping();
        grid.add_wall(Position::new(0, 0), Position::new(0, 3)).unwrap();

        let neighbors = grid.neighbors(Position::new(0, 0), AdjacencyMode::Orthogonal);
        assert!(!neighbors.contains(&Position::new(0, 3)));
        assert!(neighbors.contains(&Position::new(3, 0)));
        assert!(neighbors.contains(&Position::new(0, 1)));
        assert!(neighbors.contains(&Position::new(1, 0)));

        assert!(!grid.is_adjacent(Position::new(0, 0), Position::new(0, 3)));
        assert!(grid.is_adjacent(Position::new(0, 3), Position::new(0, 2)));
    }

    #[test]
    fn grids_round_trip_through_serde() {
        let mut grid = grid_3x3();
        grid.add_wall(Position::new(0, 0), Position::new(0, 1)).unwrap();
        let encoded = serde_json::to_string(&grid).unwrap();
        let decoded: Grid<i64> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, grid);
        assert!(!decoded.is_adjacent(Position::new(0, 0), Position::new(0, 1)));
    }

    #[test]
    fn map_preserves_shape_walls_and_wrap() {
        let mut grid = grid_3x3();
        grid.add_wall(Position::new(1, 1), Position::new(1, 2)).unwrap();
        let doubled = grid.map(|_, v| v * 2);
        assert_eq!(doubled.value(Position::new(2, 2)).unwrap(), &16);
        assert!(!doubled.is_adjacent(Position::new(1, 1), Position::new(1, 2)));
    }
}
