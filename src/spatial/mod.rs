//! Spatial indexing for near-linear repulsion.
//!
//! This module provides a uniform hash grid that bounds neighbor search for
//! the force solver to the 27 cells around each node.

mod grid;

pub use grid::{CellKey, SpatialHashGrid};
