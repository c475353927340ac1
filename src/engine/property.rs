//! Pluggable global-property checkers and their counterexample-blocking
//! constraint generators.

use crate::{
    model::{Expr, Value, VarId},
    shapes::{Shape, ShapeGenerator},
    topology::{AdjacencyMode, Grid},
};

/// A global structural property that is too expensive (or impossible) to
/// state as one static constraint, checked against each candidate grid
/// instead.
///
/// Implementors provide the checker; the constraint generator has a default
/// that blocks the counterexample shape without prescribing its replacement:
/// either the shape does not fully form again, or at least one cell on its
/// boundary changes. That forbids exactly the "fully-formed island with a
/// fully-sealed boundary" combination and leaves every repair open to the
/// solver.
pub trait GlobalProperty {
    /// Shapes in `candidate` violating the property. Empty means satisfied.
    fn counterexamples(&self, candidate: &Grid<Value>) -> Vec<Shape>;

    /// Constraints excluding one counterexample shape.
    fn blocking_constraints(
        &self,
        candidate: &Grid<Value>,
        cells: &Grid<VarId>,
        shape: &Shape,
    ) -> Vec<Expr> {
        let generator = ShapeGenerator::orthogonal();
        let mut literals: Vec<Expr> = Vec::new();
        for &p in shape.iter() {
            if let (Some(&var), Some(&value)) = (cells.get(p), candidate.get(p)) {
                literals.push(Expr::ne(var, value));
            }
        }
        for b in generator.boundary_of(candidate, shape) {
            if let (Some(&var), Some(&value)) = (cells.get(b), candidate.get(b)) {
                literals.push(Expr::ne(var, value));
            }
        }
        vec![Expr::or(literals)]
    }
}

/// A property that every candidate satisfies. Used when a puzzle has no
/// global structural rule and the engine only needs a single solve.
pub struct AlwaysSatisfied;

impl GlobalProperty for AlwaysSatisfied {
    fn counterexamples(&self, _candidate: &Grid<Value>) -> Vec<Shape> {
        Vec::new()
    }
}

/// "All cells holding `target` form exactly one connected component."
///
/// Every component except the largest is a counterexample; a size tie breaks
/// toward the earliest component in canonical discovery order, so the
/// reported set is deterministic.
pub struct SingleShape {
    target: Value,
    mode: AdjacencyMode,
}

impl SingleShape {
    pub fn new(target: Value) -> Self {
        Self {
            target,
            mode: AdjacencyMode::Orthogonal,
        }
    }

    pub fn with_mode(mut self, mode: AdjacencyMode) -> Self {
        self.mode = mode;
        self
    }
}

impl GlobalProperty for SingleShape {
    fn counterexamples(&self, candidate: &Grid<Value>) -> Vec<Shape> {
        let mut shapes: Vec<Shape> = ShapeGenerator::new(self.mode)
            .find_shapes(candidate, |_, value| *value == self.target)
            .collect();
        if shapes.len() <= 1 {
            return Vec::new();
        }
        let survivor = shapes
            .iter()
            .enumerate()
            .max_by_key(|(index, shape)| (shape.len(), std::cmp::Reverse(*index)))
            .map(|(index, _)| index)
            .unwrap_or(0);
        shapes.remove(survivor);
        shapes
    }
}

/// "No more than `limit` consecutive cells of `target` in any row or column."
///
/// Each over-long run is a counterexample; blocking posts one clause per
/// `limit + 1` window of the run, each requiring at least one cell of the
/// window to differ from `target`.
pub struct MaxRunLength {
    target: Value,
    limit: usize,
}

impl MaxRunLength {
    pub fn new(target: Value, limit: usize) -> Self {
        Self { target, limit }
    }

    fn runs_along(
        &self,
        candidate: &Grid<Value>,
        lines: impl Iterator<Item = Vec<crate::topology::Position>>,
    ) -> Vec<Shape> {
        let mut runs = Vec::new();
        for line in lines {
            let mut current: Vec<crate::topology::Position> = Vec::new();
            for position in line.into_iter().chain(std::iter::once(
                // Sentinel off-grid position terminates the final run.
                crate::topology::Position::new(-1, -1),
            )) {
                if candidate.contains(position)
                    && candidate.get(position) == Some(&self.target)
                {
                    current.push(position);
                } else {
                    if current.len() > self.limit {
                        runs.push(current.iter().copied().collect());
                    }
                    current.clear();
                }
            }
        }
        runs
    }
}

impl GlobalProperty for MaxRunLength {
    fn counterexamples(&self, candidate: &Grid<Value>) -> Vec<Shape> {
        let rows = candidate.rows_number() as i64;
        let cols = candidate.columns_number() as i64;
        let horizontal = (0..rows).map(|r| {
            (0..cols)
                .map(|c| crate::topology::Position::new(r, c))
                .collect::<Vec<_>>()
        });
        let vertical = (0..cols).map(|c| {
            (0..rows)
                .map(|r| crate::topology::Position::new(r, c))
                .collect::<Vec<_>>()
        });
        let mut runs = self.runs_along(candidate, horizontal);
        runs.extend(self.runs_along(candidate, vertical));
        runs
    }

    fn blocking_constraints(
        &self,
        _candidate: &Grid<Value>,
        cells: &Grid<VarId>,
        shape: &Shape,
    ) -> Vec<Expr> {
        let positions: Vec<_> = shape.iter().copied().collect();
        positions
            .windows(self.limit + 1)
            .map(|window| {
                Expr::or(
                    window
                        .iter()
                        .filter_map(|&p| cells.get(p).map(|&var| Expr::ne(var, self.target))),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::topology::Position;

    fn bool_candidate(rows: Vec<Vec<bool>>) -> Grid<Value> {
        Grid::from_rows(rows).unwrap().map(|_, &b| Value::Bool(b))
    }

    // Two isolated corner cells plus a full bottom row. The row is the
    // largest component and survives; both corners are counterexamples.
    #[test]
    fn single_shape_reports_all_but_the_largest_component() {
        let candidate = bool_candidate(vec![
            vec![true, false, true],
            vec![false, false, false],
            vec![true, true, true],
        ]);
        let property = SingleShape::new(Value::Bool(true));
        let counterexamples = property.counterexamples(&candidate);
        assert_eq!(counterexamples.len(), 2);
        assert!(counterexamples[0].contains(Position::new(0, 0)));
        assert!(counterexamples[1].contains(Position::new(0, 2)));
    }

    #[test]
    fn single_component_yields_no_counterexamples() {
        let candidate = bool_candidate(vec![vec![true, true], vec![false, false]]);
        let property = SingleShape::new(Value::Bool(true));
        assert!(property.counterexamples(&candidate).is_empty());
    }

    #[test]
    fn default_blocking_covers_shape_and_boundary() {
        let candidate = bool_candidate(vec![vec![true, false, false]]);
        let cells = Grid::from_rows(vec![vec![
            crate::model::VarId(0),
            crate::model::VarId(1),
            crate::model::VarId(2),
        ]])
        .unwrap();
        let property = SingleShape::new(Value::Bool(true));
        let shape: Shape = [Position::new(0, 0)].into_iter().collect();
        let constraints = property.blocking_constraints(&candidate, &cells, &shape);
        assert_eq!(constraints.len(), 1);
        // One literal for the shape cell, one for its single boundary cell.
        match &constraints[0] {
            Expr::Or(literals) => assert_eq!(literals.len(), 2),
            other => panic!("expected a disjunction, got {other}"),
        }
    }

    #[test]
    fn max_run_length_flags_over_long_runs_in_both_axes() {
        let candidate = bool_candidate(vec![
            vec![true, true, true],
            vec![true, false, false],
            vec![true, false, false],
        ]);
        let property = MaxRunLength::new(Value::Bool(true), 2);
        let runs = property.counterexamples(&candidate);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 3);
        assert_eq!(runs[1].len(), 3);
    }

    #[test]
    fn max_run_length_accepts_runs_at_the_limit() {
        let candidate = bool_candidate(vec![vec![true, true, false, true]]);
        let property = MaxRunLength::new(Value::Bool(true), 2);
        assert!(property.counterexamples(&candidate).is_empty());
    }

    #[test]
    fn max_run_blocking_posts_one_clause_per_window() {
        let candidate = bool_candidate(vec![vec![true, true, true, true]]);
        let cells = Grid::from_rows(vec![(0..4).map(crate::model::VarId).collect()]).unwrap();
        let property = MaxRunLength::new(Value::Bool(true), 2);
        let runs = property.counterexamples(&candidate);
        assert_eq!(runs.len(), 1);
        let constraints = property.blocking_constraints(&candidate, &cells, &runs[0]);
        // A run of 4 with limit 2 has two windows of size 3.
        assert_eq!(constraints.len(), 2);
    }
}
