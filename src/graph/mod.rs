//! Graph data structures and operations.
//!
//! This module provides the node/edge store for the simulation: petgraph for
//! the edge arena, with Structure of Arrays (SoA) layout for positions and
//! velocities so the solver iterates contiguous buffers.

mod edge;
mod node;
pub mod placement;
mod store;

pub use edge::{DEFAULT_EDGE_WEIGHT, Edge, EdgeInput, MIN_EDGE_WEIGHT};
pub use node::{NodeInput, NodeState};
pub use store::{BuildReport, GraphStore};
