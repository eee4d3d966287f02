//! Edge input and resolved edge records.
//!
//! Edges arrive keyed by external node ids. The store resolves them to slot
//! indices once per build; the solver only ever sees [`Edge`].

use serde::{Deserialize, Serialize};

/// Weight used when the host omits one or sends a non-finite value.
pub const DEFAULT_EDGE_WEIGHT: f64 = 1.0;

/// Lower bound on edge weight, keeping spring forces from vanishing or
/// flipping sign.
pub const MIN_EDGE_WEIGHT: f64 = 0.2;

/// An edge as supplied by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeInput {
    /// External id of the first endpoint.
    pub source: String,
    /// External id of the second endpoint.
    pub target: String,
    #[serde(default)]
    pub weight: Option<f64>,
}

impl EdgeInput {
    /// An edge with the default weight.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight: None,
        }
    }

    /// An edge with an explicit weight.
    pub fn weighted(source: impl Into<String>, target: impl Into<String>, weight: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight: Some(weight),
        }
    }

    /// Effective spring weight after defaulting and clamping.
    pub fn effective_weight(&self) -> f64 {
        let weight = self
            .weight
            .filter(|w| w.is_finite())
            .unwrap_or(DEFAULT_EDGE_WEIGHT);
        weight.max(MIN_EDGE_WEIGHT)
    }
}

/// A resolved edge between two node slots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub weight: f64,
}
