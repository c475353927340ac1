//! A row/column count shading puzzle: shade cells so that every row and
//! column contains exactly its clue's number of shaded cells, and the shaded
//! cells form one orthogonally connected island.

use crate::{
    engine::{GlobalProperty, SingleShape},
    error::{Error, Result},
    model::{CmpOp, ConstraintModel, Expr, Value, VarId},
    puzzles::PuzzleEncoder,
    topology::{Grid, Position},
};

#[derive(Debug, Clone)]
pub struct ShadedIsland {
    row_counts: Vec<i64>,
    col_counts: Vec<i64>,
}

impl ShadedIsland {
    /// A puzzle with one shaded-cell count per row and per column.
    pub fn new(row_counts: Vec<i64>, col_counts: Vec<i64>) -> Result<Self> {
        if row_counts.is_empty() || col_counts.is_empty() {
            return Err(Error::malformed_topology(
                "shaded-island puzzle needs at least one row and one column",
            ));
        }
        if row_counts.iter().chain(&col_counts).any(|&count| count < 0) {
            return Err(Error::malformed_topology(
                "shaded-cell counts cannot be negative",
            ));
        }
        Ok(Self {
            row_counts,
            col_counts,
        })
    }

    /// The toroidal variant, where the island may connect across the grid
    /// edges. Recognized but not encoded yet.
    pub fn wrapping(_row_counts: Vec<i64>, _col_counts: Vec<i64>) -> Result<Self> {
        Err(Error::not_supported(
            "wrap-around shaded-island puzzles have no encoder yet",
        ))
    }

    pub fn rows_number(&self) -> usize {
        self.row_counts.len()
    }

    pub fn columns_number(&self) -> usize {
        self.col_counts.len()
    }
}

impl PuzzleEncoder for ShadedIsland {
    fn encode(&self, model: &mut dyn ConstraintModel) -> Result<Grid<VarId>> {
        let rows = self.rows_number();
        let cols = self.columns_number();
        let cells = Grid::from_rows(
            (0..rows)
                .map(|_| (0..cols).map(|_| model.new_bool()).collect())
                .collect(),
        )?;

        for (row, &count) in self.row_counts.iter().enumerate() {
            let vars: Vec<VarId> = (0..cols)
                .map(|col| *cells.get(Position::new(row as i64, col as i64)).unwrap())
                .collect();
            model.add(Expr::sum(vars, CmpOp::Eq, count));
        }
        for (col, &count) in self.col_counts.iter().enumerate() {
            let vars: Vec<VarId> = (0..rows)
                .map(|row| *cells.get(Position::new(row as i64, col as i64)).unwrap())
                .collect();
            model.add(Expr::sum(vars, CmpOp::Eq, count));
        }

        Ok(cells)
    }

    fn property(&self) -> Box<dyn GlobalProperty> {
        Box::new(SingleShape::new(Value::Bool(true)))
    }

    fn is_positive(&self, _position: Position, value: &Value) -> bool {
        *value == Value::Bool(true)
    }
}
