//! Grid topology: coordinates, directions, and the wall-aware, optionally
//! toroidal [`Grid`] the rest of the crate is built on.

pub mod direction;
pub mod grid;
pub mod position;

pub use direction::{AdjacencyMode, Direction};
pub use grid::Grid;
pub use position::Position;
