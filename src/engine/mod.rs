//! The counterexample-guided refinement engine: solve, check the global
//! property, block what was wrong, solve again.

pub mod property;
pub mod stats;
pub mod uniqueness;

use tracing::debug;

use crate::{
    error::{PuzzleError, Result},
    model::{ConstraintModel, Value, VarId},
    topology::Grid,
};

pub use property::{AlwaysSatisfied, GlobalProperty, MaxRunLength, SingleShape};
pub use stats::render_stats_table;
pub use uniqueness::{solve_unique, UniquenessOutcome};

/// Default cap on refinement iterations before the engine fails loudly
/// instead of spinning on a pathological model.
pub const DEFAULT_ITERATION_BUDGET: usize = 256;

/// Terminal verdict of a refinement run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefinementOutcome {
    /// A candidate satisfying both the posted constraints and the global
    /// property.
    Solved(Grid<Value>),
    /// No assignment satisfies the constraints. A proof of impossibility,
    /// never conflated with giving up on the budget.
    Unsatisfiable,
}

/// Phase of the engine's lifecycle. Purely observational: the monotonic
/// constraint store makes posting constraints sound in any phase, which is
/// exactly what the uniqueness protocol does after `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Base rule constraints are being posted.
    Modeling,
    /// The solve / check / block loop is running.
    Refining,
    /// A terminal outcome was reached.
    Done,
}

/// Counters accumulated across every run of one engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefinementStats {
    pub solver_calls: u64,
    pub iterations: u64,
    pub counterexamples: u64,
    pub constraints_added: u64,
}

/// Drives the refinement loop over any [`ConstraintModel`] backend.
///
/// The engine owns its model exclusively; constraint posting and solving are
/// strictly sequential, and nothing is shared between engines, so independent
/// puzzles may run on separate threads without coordination.
pub struct RefinementEngine<M: ConstraintModel> {
    model: M,
    budget: usize,
    state: EngineState,
    stats: RefinementStats,
    candidate_history: Vec<Grid<Value>>,
}

impl<M: ConstraintModel> RefinementEngine<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            budget: DEFAULT_ITERATION_BUDGET,
            state: EngineState::Modeling,
            stats: RefinementStats::default(),
            candidate_history: Vec::new(),
        }
    }

    /// Replaces the iteration budget. Exhausting it surfaces as
    /// [`PuzzleError::RefinementBudgetExceeded`], distinct from `Unsatisfiable`.
    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    /// Access to the underlying model, for posting base rule constraints and
    /// for the uniqueness protocol's blocking constraint. Posting is sound in
    /// any phase because the store is monotonic.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn stats(&self) -> &RefinementStats {
        &self.stats
    }

    /// Every candidate the backend has produced, in order. Useful for
    /// asserting that refinement never revisits a rejected candidate.
    pub fn candidate_history(&self) -> &[Grid<Value>] {
        &self.candidate_history
    }

    /// Runs the refinement loop to a terminal state.
    ///
    /// Each iteration solves the model, materializes the candidate grid from
    /// `cells`, and checks `property`. Counterexample shapes are converted to
    /// blocking constraints and posted; because the store is monotonic, a
    /// rejected candidate can never reappear, and with finite domains the
    /// loop terminates within the budget or fails loudly.
    pub fn run(
        &mut self,
        property: &dyn GlobalProperty,
        cells: &Grid<VarId>,
    ) -> Result<RefinementOutcome> {
        self.state = EngineState::Refining;

        for iteration in 0..self.budget {
            self.stats.solver_calls += 1;
            match self.model.solve()? {
                crate::model::SolveOutcome::Unsat => {
                    self.state = EngineState::Done;
                    debug!(iteration, "model proven unsatisfiable");
                    return Ok(RefinementOutcome::Unsatisfiable);
                }
                crate::model::SolveOutcome::Sat => {}
            }

            let candidate = cells.try_map(|_, &var| self.model.value_of(var))?;
            self.candidate_history.push(candidate.clone());

            let counterexamples = property.counterexamples(&candidate);
            if counterexamples.is_empty() {
                self.state = EngineState::Done;
                debug!(iteration, "candidate satisfies the global property");
                return Ok(RefinementOutcome::Solved(candidate));
            }

            debug!(
                iteration,
                counterexamples = counterexamples.len(),
                "blocking counterexample shapes"
            );
            self.stats.counterexamples += counterexamples.len() as u64;
            for shape in &counterexamples {
                for constraint in property.blocking_constraints(&candidate, cells, shape) {
                    self.model.add(constraint);
                    self.stats.constraints_added += 1;
                }
            }
            self.stats.iterations += 1;
        }

        Err(PuzzleError::RefinementBudgetExceeded {
            budget: self.budget,
            iterations: self.stats.iterations as usize,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        error::PuzzleError,
        model::{CmpOp, ConstraintModel, CpModel, Expr, SolveOutcome, Value},
        topology::Position,
    };

    /// Builds a rows x cols boolean cell grid on the given model.
    fn bool_cells(model: &mut CpModel, rows: usize, cols: usize) -> Grid<VarId> {
        let cells: Vec<Vec<VarId>> = (0..rows)
            .map(|_| (0..cols).map(|_| model.new_bool()).collect())
            .collect();
        Grid::from_rows(cells).unwrap()
    }

    fn shaded_count(grid: &Grid<Value>) -> usize {
        grid.iter().filter(|(_, &v)| v == Value::Bool(true)).count()
    }

    // End-to-end scenario: exactly five shaded cells on a 3x3 grid with both
    // top corners pinned shaded. Fragmented candidates (isolated corners plus
    // a full bottom row, say) must be refined into one connected shape.
    #[test]
    fn refinement_reconnects_a_fragmented_candidate() {
        let _ = tracing_subscriber::fmt::try_init();

        let mut model = CpModel::new();
        let cells = bool_cells(&mut model, 3, 3);
        let all: Vec<VarId> = cells.iter().map(|(_, &v)| v).collect();
        model.add(Expr::sum(all, CmpOp::Eq, 5));
        for p in [Position::new(0, 0), Position::new(0, 2)] {
            model.add(Expr::var(*cells.get(p).unwrap()));
        }

        let mut engine = RefinementEngine::new(model);
        let property = SingleShape::new(Value::Bool(true));
        let outcome = engine.run(&property, &cells).unwrap();

        let RefinementOutcome::Solved(solution) = outcome else {
            panic!("expected a solution");
        };
        assert_eq!(shaded_count(&solution), 5);
        assert!(property.counterexamples(&solution).is_empty());
        assert!(engine.stats().solver_calls >= 1);
        assert_eq!(engine.state(), EngineState::Done);
    }

    #[test]
    fn unsatisfiable_base_constraints_are_reported_as_such() {
        let mut model = CpModel::new();
        let cells = bool_cells(&mut model, 2, 2);
        let all: Vec<VarId> = cells.iter().map(|(_, &v)| v).collect();
        model.add(Expr::sum(all.clone(), CmpOp::Eq, 1));
        model.add(Expr::sum(all, CmpOp::Eq, 2));

        let mut engine = RefinementEngine::new(model);
        let outcome = engine.run(&AlwaysSatisfied, &cells).unwrap();
        assert_eq!(outcome, RefinementOutcome::Unsatisfiable);
    }

    #[test]
    fn budget_exhaustion_is_distinct_from_unsatisfiable() {
        let mut model = CpModel::new();
        let mut cells = bool_cells(&mut model, 1, 4);
        // Walls isolate every cell, so two shaded cells can never connect:
        // each iteration finds a counterexample and stays satisfiable well
        // past a budget of two.
        for col in 0..3 {
            cells
                .add_wall(Position::new(0, col), Position::new(0, col + 1))
                .unwrap();
        }
        let all: Vec<VarId> = cells.iter().map(|(_, &v)| v).collect();
        model.add(Expr::sum(all, CmpOp::Eq, 2));

        let mut engine = RefinementEngine::new(model).with_budget(2);
        let error = engine
            .run(&SingleShape::new(Value::Bool(true)), &cells)
            .unwrap_err();
        assert!(matches!(
            error.kind(),
            PuzzleError::RefinementBudgetExceeded { budget: 2, .. }
        ));
    }

    // Refinement monotonicity: the constraint store only grows, and no
    // candidate is ever produced twice.
    #[test]
    fn refinement_is_monotonic_and_never_repeats_a_candidate() {
        let mut model = CpModel::new();
        let cells = bool_cells(&mut model, 3, 3);
        let all: Vec<VarId> = cells.iter().map(|(_, &v)| v).collect();
        model.add(Expr::sum(all, CmpOp::Eq, 3));

        let mut engine = RefinementEngine::new(model);
        let outcome = engine
            .run(&SingleShape::new(Value::Bool(true)), &cells)
            .unwrap();
        assert!(matches!(outcome, RefinementOutcome::Solved(_)));

        let history = engine.candidate_history();
        for (i, earlier) in history.iter().enumerate() {
            for later in &history[i + 1..] {
                assert_ne!(earlier, later, "candidate repeated during refinement");
            }
        }
        assert_eq!(
            engine.model_mut().constraints_number() as u64,
            // One base constraint plus everything refinement added.
            1 + engine.stats().constraints_added
        );
    }

    #[test]
    fn solved_grid_matches_the_backend_assignment() {
        let mut model = CpModel::new();
        let cells = bool_cells(&mut model, 2, 2);
        let target = *cells.get(Position::new(1, 1)).unwrap();
        model.add(Expr::var(target));
        model.add(Expr::sum(
            cells.iter().map(|(_, &v)| v).collect::<Vec<_>>(),
            CmpOp::Eq,
            1,
        ));

        let mut engine = RefinementEngine::new(model);
        let outcome = engine
            .run(&SingleShape::new(Value::Bool(true)), &cells)
            .unwrap();
        let RefinementOutcome::Solved(solution) = outcome else {
            panic!("expected a solution");
        };
        assert_eq!(solution.value(Position::new(1, 1)).unwrap(), &Value::Bool(true));
        assert_eq!(engine.model_mut().solve().unwrap(), SolveOutcome::Sat);
    }
}
