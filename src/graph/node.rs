//! Node input and per-node simulation state.
//!
//! Nodes arrive from the host as `{id, x?, y?, z?}` records. Inside the store
//! each node is a slot in a set of parallel arrays; the types here describe
//! what the host sends and the flags kept per slot.

use serde::{Deserialize, Serialize};

/// A node as supplied by the host in `INIT` or `UPDATE_GRAPH`.
///
/// Coordinates are optional per axis. Missing or non-finite axes are filled
/// from a random point on the seeding sphere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInput {
    /// Opaque external identifier.
    pub id: String,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
}

impl NodeInput {
    /// A node with no supplied coordinates.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: None,
            y: None,
            z: None,
        }
    }

    /// A node placed at an explicit position.
    pub fn at(id: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            id: id.into(),
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    /// Supplied coordinates with non-finite values filtered out.
    pub(crate) fn finite_coords(&self) -> [Option<f64>; 3] {
        [self.x, self.y, self.z].map(|c| c.filter(|v| v.is_finite()))
    }

    /// Whether at least one axis was supplied with a finite value.
    pub(crate) fn has_position(&self) -> bool {
        self.finite_coords().iter().any(Option::is_some)
    }
}

/// Node state flags packed into a single byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeState {
    flags: u8,
}

impl NodeState {
    const FIXED: u8 = 0b0000_0001;

    /// Create a new default node state.
    #[inline]
    pub fn new() -> Self {
        Self { flags: 0 }
    }

    /// Check if the node is fixed (excluded from integration).
    #[inline]
    pub fn is_fixed(self) -> bool {
        self.flags & Self::FIXED != 0
    }

    /// Set the fixed state.
    #[inline]
    pub fn set_fixed(&mut self, fixed: bool) {
        if fixed {
            self.flags |= Self::FIXED;
        } else {
            self.flags &= !Self::FIXED;
        }
    }
}
