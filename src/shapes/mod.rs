//! Connected-component discovery over grid predicates, and boundary
//! computation around the discovered shapes.

use std::collections::{HashSet, VecDeque};

use im::OrdSet;

use crate::topology::{AdjacencyMode, Grid, Position};

/// A maximal connected set of grid positions sharing a predicate value.
///
/// Shapes are produced only by [`ShapeGenerator::find_shapes`]; two shapes
/// from the same decomposition never overlap, and together they cover every
/// predicate-satisfying position exactly once. Iteration order is the
/// canonical row-major position order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape(OrdSet<Position>);

impl Shape {
    pub fn contains(&self, position: Position) -> bool {
        self.0.contains(&position)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> + '_ {
        self.0.iter()
    }

    pub fn positions(&self) -> &OrdSet<Position> {
        &self.0
    }

    /// The canonical (row-major smallest) member, used for deterministic
    /// tie-breaking between shapes of equal size.
    pub fn anchor(&self) -> Option<Position> {
        self.0.get_min().copied()
    }
}

impl FromIterator<Position> for Shape {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        Shape(iter.into_iter().collect())
    }
}

/// Decomposes grids into connected shapes under a chosen adjacency mode.
#[derive(Debug, Clone, Copy)]
pub struct ShapeGenerator {
    mode: AdjacencyMode,
}

impl ShapeGenerator {
    pub fn new(mode: AdjacencyMode) -> Self {
        Self { mode }
    }

    pub fn orthogonal() -> Self {
        Self::new(AdjacencyMode::Orthogonal)
    }

    /// Lazily partitions all positions satisfying `predicate` into maximal
    /// connected components.
    ///
    /// The returned iterator is finite and non-restartable: each call to
    /// `next` scans forward (in row-major order) for an unvisited seed and
    /// floods its component, so every qualifying position is assigned to
    /// exactly one shape. Discovery order is deterministic.
    pub fn find_shapes<'g, T, P>(&self, grid: &'g Grid<T>, predicate: P) -> Shapes<'g, T, P>
    where
        P: Fn(Position, &T) -> bool,
    {
        Shapes {
            grid,
            predicate,
            mode: self.mode,
            seeds: grid.positions().collect(),
            next_seed: 0,
            visited: HashSet::new(),
        }
    }

    /// All in-grid positions orthogonally adjacent to `shape` but outside it.
    ///
    /// The boundary is computed under orthogonal adjacency regardless of the
    /// generator's discovery mode, and honors the grid's walls and wrap mode.
    pub fn boundary_of<T>(&self, grid: &Grid<T>, shape: &Shape) -> OrdSet<Position> {
        shape
            .iter()
            .flat_map(|&p| grid.neighbors(p, AdjacencyMode::Orthogonal))
            .filter(|q| !shape.contains(*q))
            .collect()
    }
}

/// Lazy shape iterator returned by [`ShapeGenerator::find_shapes`].
pub struct Shapes<'g, T, P> {
    grid: &'g Grid<T>,
    predicate: P,
    mode: AdjacencyMode,
    seeds: Vec<Position>,
    next_seed: usize,
    visited: HashSet<Position>,
}

impl<T, P> Shapes<'_, T, P>
where
    P: Fn(Position, &T) -> bool,
{
    fn qualifies(&self, position: Position) -> bool {
        self.grid
            .get(position)
            .is_some_and(|value| (self.predicate)(position, value))
    }

    fn flood(&mut self, seed: Position) -> Shape {
        let mut members = OrdSet::new();
        let mut frontier = VecDeque::from([seed]);
        self.visited.insert(seed);
        while let Some(current) = frontier.pop_front() {
            members.insert(current);
            for neighbor in self.grid.neighbors(current, self.mode) {
                if !self.visited.contains(&neighbor) && self.qualifies(neighbor) {
                    self.visited.insert(neighbor);
                    frontier.push_back(neighbor);
                }
            }
        }
        Shape(members)
    }
}

impl<T, P> Iterator for Shapes<'_, T, P>
where
    P: Fn(Position, &T) -> bool,
{
    type Item = Shape;

    fn next(&mut self) -> Option<Shape> {
        while self.next_seed < self.seeds.len() {
            let seed = self.seeds[self.next_seed];
            self.next_seed += 1;
            if !self.visited.contains(&seed) && self.qualifies(seed) {
                return Some(self.flood(seed));
            }
        }
        None
    }
}
