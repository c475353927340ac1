//! The constraint model port: the capability surface a puzzle encoder
//! programs against, independent of the backend solving technology, plus the
//! crate's reference finite-domain backend.

pub mod backend;
pub mod expr;
pub mod heuristics;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use backend::CpModel;
pub use expr::{CmpOp, Expr, Term};

/// An opaque decision-variable handle.
///
/// Encoders never inspect the representation; they only thread handles back
/// through [`ConstraintModel`] operations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct VarId(pub(crate) u32);

impl std::fmt::Display for VarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// A concrete value a decision variable can take.
///
/// Adaptation note: booleans count as 0/1 wherever a linear sum mixes them
/// with integers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Value {
    Bool(bool),
    Int(i64),
}

impl Value {
    /// The numeric weight of the value in a linear sum.
    pub fn as_sum_term(self) -> i64 {
        match self {
            Value::Bool(false) => 0,
            Value::Bool(true) => 1,
            Value::Int(i) => i,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
        }
    }
}

/// The domain store of the reference backend: a persistent map from variable
/// to its remaining candidate values, cheap to clone at every search node.
pub type Domains = im::HashMap<VarId, im::OrdSet<Value>>;

/// The verdict of one `solve()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    /// A satisfying assignment was found and can be read via `value_of`.
    Sat,
    /// No assignment satisfies the posted constraints. A clean verdict, not
    /// a fault.
    Unsat,
}

/// The swappable backend boundary.
///
/// Contract highlights:
/// - The constraint store is **monotonic**: `add` only ever grows it, nothing
///   is retracted. The refinement loop and the uniqueness protocol both rely
///   on this.
/// - Variable allocation and constraint posting may be interleaved with
///   `solve()` calls; a later `solve()` sees everything posted so far without
///   rebuilding prior state.
/// - `value_of` reads the assignment of the most recent successful `solve()`.
pub trait ConstraintModel {
    /// Allocates a fresh boolean decision variable.
    fn new_bool(&mut self) -> VarId;

    /// Allocates a fresh integer decision variable ranging over `lo..=hi`.
    /// An inverted range yields an empty domain (and hence `Unsat`).
    fn new_int(&mut self, lo: i64, hi: i64) -> VarId;

    /// Posts a constraint. Never retracted.
    fn add(&mut self, constraint: Expr);

    /// Attempts to find an assignment satisfying every posted constraint.
    fn solve(&mut self) -> Result<SolveOutcome>;

    /// Reads a variable's value from the last successful `solve()`.
    fn value_of(&self, variable: VarId) -> Result<Value>;
}
