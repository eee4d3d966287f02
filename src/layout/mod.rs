//! Force-directed layout.
//!
//! This module holds the solver constants and the per-step force solver that
//! moves nodes in the [`GraphStore`](crate::graph::GraphStore).

pub mod force;
pub mod params;

pub use force::ForceSolver;
pub use params::SimParams;
