//! Insula is a library of combinatorial grid-puzzle solvers built around
//! counterexample-guided constraint refinement.
//!
//! Many grid puzzles combine local rules that a constraint solver handles
//! directly (counts, equalities, exclusions) with a global structural rule
//! that is impractical to state up front — most commonly "all marked cells
//! form exactly one connected area". Insula encodes the local rules once,
//! then loops: ask the backend for a candidate, check the global property,
//! and when it fails, post constraints that exclude the offending shapes and
//! solve again. The constraint store only ever grows, so a rejected candidate
//! can never come back, and with finite domains the loop terminates.
//!
//! # Core Concepts
//!
//! - **[`topology::Grid`]**: the wall-aware, optionally toroidal grid the
//!   puzzles live on, with [`topology::Position`] / [`topology::Direction`]
//!   coordinate arithmetic.
//! - **[`shapes::ShapeGenerator`]**: connected-component discovery and
//!   boundary computation over grid predicates.
//! - **[`regions::RegionsGrid`]**: a fixed partition of the grid computed
//!   from per-cell open-border data.
//! - **[`model::ConstraintModel`]**: the swappable backend port a puzzle
//!   encoder programs against; [`model::CpModel`] is the crate's reference
//!   finite-domain implementation.
//! - **[`engine::RefinementEngine`]**: the solve / check / block loop,
//!   generic over a [`engine::GlobalProperty`] checker.
//! - **[`engine::solve_unique`]**: decides whether an accepted solution is
//!   the only one.
//!
//! # Example: a shaded-island puzzle
//!
//! Shade cells of a 2x2 grid so row counts are `[1, 2]`, column counts are
//! `[1, 2]`, and the shaded cells form one connected island:
//!
//! ```
//! use insula::engine::RefinementOutcome;
//! use insula::model::{CpModel, Value};
//! use insula::puzzles::{self, ShadedIsland};
//! use insula::topology::Position;
//!
//! let puzzle = ShadedIsland::new(vec![1, 2], vec![1, 2]).unwrap();
//! let outcome = puzzles::solve(&puzzle, CpModel::new()).unwrap();
//!
//! let RefinementOutcome::Solved(solution) = outcome else {
//!     panic!("this instance is solvable");
//! };
//! // The bottom row is fully shaded, and the island bends into (0, 1).
//! assert_eq!(solution.value(Position::new(0, 0)).unwrap(), &Value::Bool(false));
//! assert_eq!(solution.value(Position::new(0, 1)).unwrap(), &Value::Bool(true));
//! assert_eq!(solution.value(Position::new(1, 0)).unwrap(), &Value::Bool(true));
//! assert_eq!(solution.value(Position::new(1, 1)).unwrap(), &Value::Bool(true));
//! ```
//!
pub mod engine;
pub mod error;
pub mod model;
pub mod puzzles;
pub mod regions;
pub mod shapes;
pub mod topology;
