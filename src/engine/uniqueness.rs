//! The uniqueness protocol: block an accepted solution and ask the engine
//! whether anything else satisfies the model.

use tracing::debug;

use crate::{
    engine::{GlobalProperty, RefinementEngine, RefinementOutcome},
    error::Result,
    model::{ConstraintModel, Expr, Value, VarId},
    topology::{Grid, Position},
};

/// Verdict of [`solve_unique`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniquenessOutcome {
    /// The model has no solution at all.
    Unsatisfiable,
    /// Exactly one solution exists (up to the posted constraints).
    Unique(Grid<Value>),
    /// At least two distinct solutions exist; both are returned.
    Multiple {
        solution: Grid<Value>,
        alternate: Grid<Value>,
    },
}

/// Solves the puzzle, then re-solves with the found assignment blocked to
/// decide whether it is unique.
///
/// `positive` selects the meaningfully-constrained cells the blocking
/// constraint quantifies over (typically the "shaded"/non-default cells);
/// when it selects nothing the constraint falls back to every cell. The
/// accepted solution is threaded explicitly into the second run, and the
/// monotonic constraint store guarantees the second run never revisits it.
pub fn solve_unique<M: ConstraintModel>(
    engine: &mut RefinementEngine<M>,
    property: &dyn GlobalProperty,
    cells: &Grid<VarId>,
    positive: impl Fn(Position, &Value) -> bool,
) -> Result<UniquenessOutcome> {
    let solution = match engine.run(property, cells)? {
        RefinementOutcome::Unsatisfiable => return Ok(UniquenessOutcome::Unsatisfiable),
        RefinementOutcome::Solved(solution) => solution,
    };

    let mut literals: Vec<Expr> = solution
        .iter()
        .filter(|&(position, value)| positive(position, value))
        .filter_map(|(position, &value)| {
            cells.get(position).map(|&var| Expr::eq(var, value))
        })
        .collect();
    if literals.is_empty() {
        literals = solution
            .iter()
            .filter_map(|(position, &value)| {
                cells.get(position).map(|&var| Expr::eq(var, value))
            })
            .collect();
    }
    debug!(literals = literals.len(), "blocking the accepted solution");
    engine.model_mut().add(Expr::not(Expr::and(literals)));

    match engine.run(property, cells)? {
        RefinementOutcome::Unsatisfiable => Ok(UniquenessOutcome::Unique(solution)),
        RefinementOutcome::Solved(alternate) => Ok(UniquenessOutcome::Multiple {
            solution,
            alternate,
        }),
    }
}
