//! Concrete puzzle encoders: the strategy layer that turns a puzzle's rules
//! into base constraints plus an optional global property for the refinement
//! engine.

pub mod shaded_island;

use crate::{
    engine::{GlobalProperty, RefinementEngine, RefinementOutcome, UniquenessOutcome},
    error::{Error, Result},
    model::{CmpOp, ConstraintModel, Expr, Value, VarId},
    regions::RegionsGrid,
    topology::{Grid, Position},
};

pub use shaded_island::ShadedIsland;

/// A puzzle's rule set, encoded against the model port.
///
/// Encoders form a closed set of strategies behind this one interface; the
/// engine never needs to know which puzzle it is refining.
pub trait PuzzleEncoder {
    /// Posts the base rule constraints and returns the grid of per-cell
    /// decision variables the solution is read from.
    fn encode(&self, model: &mut dyn ConstraintModel) -> Result<Grid<VarId>>;

    /// The global structural property candidates must satisfy.
    /// [`crate::engine::AlwaysSatisfied`] when the puzzle has none.
    fn property(&self) -> Box<dyn GlobalProperty>;

    /// Whether a cell value is "positive" (meaningfully constrained) for the
    /// purposes of the uniqueness blocking constraint. Defaults to every cell.
    fn is_positive(&self, _position: Position, _value: &Value) -> bool {
        true
    }
}

/// Encodes the puzzle and runs the refinement engine to a terminal outcome.
pub fn solve<M: ConstraintModel>(
    encoder: &dyn PuzzleEncoder,
    model: M,
) -> Result<RefinementOutcome> {
    let mut engine = RefinementEngine::new(model);
    let cells = encoder.encode(engine.model_mut())?;
    engine.run(encoder.property().as_ref(), &cells)
}

/// Like [`solve`], but additionally decides whether the solution is unique.
pub fn solve_checking_uniqueness<M: ConstraintModel>(
    encoder: &dyn PuzzleEncoder,
    model: M,
) -> Result<UniquenessOutcome> {
    let mut engine = RefinementEngine::new(model);
    let cells = encoder.encode(engine.model_mut())?;
    crate::engine::solve_unique(
        &mut engine,
        encoder.property().as_ref(),
        &cells,
        |position, value| encoder.is_positive(position, value),
    )
}

/// Per-region shaded-count constraints: region `i`'s cells must contain
/// exactly `clues[i - 1]` shaded (true) cells.
pub fn region_count_constraints(
    regions: &RegionsGrid,
    cells: &Grid<VarId>,
    clues: &[i64],
) -> Result<Vec<Expr>> {
    if clues.len() != regions.regions_number() {
        return Err(Error::region_model(format!(
            "{} clues given for {} regions",
            clues.len(),
            regions.regions_number()
        )));
    }
    regions
        .region_ids()
        .map(|id| {
            let members = regions.positions_of(id)?;
            let vars = members
                .iter()
                .map(|&position| cells.value(position).copied())
                .collect::<Result<Vec<VarId>>>()?;
            Ok(Expr::sum(vars, CmpOp::Eq, clues[id as usize - 1]))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        model::{CpModel, SolveOutcome},
        regions::OpenBorders,
        topology::Direction,
    };

    fn open(directions: impl IntoIterator<Item = Direction>) -> OpenBorders {
        directions.into_iter().collect()
    }

    #[test]
    fn region_counts_constrain_each_region_independently() {
        // Two single-column regions on a 2x2 grid.
        let borders = Grid::from_rows(vec![
            vec![open([Direction::Down]), open([Direction::Down])],
            vec![open([Direction::Up]), open([Direction::Up])],
        ])
        .unwrap();
        let regions = RegionsGrid::from_borders(&borders).unwrap();

        let mut model = CpModel::new();
        let cells = Grid::from_rows(vec![
            vec![model.new_bool(), model.new_bool()],
            vec![model.new_bool(), model.new_bool()],
        ])
        .unwrap();

        for constraint in region_count_constraints(&regions, &cells, &[2, 0]).unwrap() {
            model.add(constraint);
        }
        assert_eq!(model.solve().unwrap(), SolveOutcome::Sat);
        for (position, &var) in cells.iter() {
            let expected = Value::Bool(position.col == 0);
            assert_eq!(model.value_of(var).unwrap(), expected);
        }
    }

    #[test]
    fn clue_count_must_match_region_count() {
        let borders = Grid::from_rows(vec![vec![open([])]]).unwrap();
        let regions = RegionsGrid::from_borders(&borders).unwrap();
        let mut model = CpModel::new();
        let cells = Grid::from_rows(vec![vec![model.new_bool()]]).unwrap();
        assert!(region_count_constraints(&regions, &cells, &[1, 1]).is_err());
    }
}
