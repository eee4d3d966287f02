//! Control protocol between the host and the layout worker.
//!
//! Inbound messages are a closed, internally tagged enum so a JS host can post
//! plain objects such as `{ type: "PIN", id: "a", fixed: { x: 0, y: 0, z: 0 } }`.
//! Outbound traffic is a stream of [`WorkerEvent`]s.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::graph::{EdgeInput, NodeInput};
use crate::layout::SimParams;

/// Explicit coordinates for a pinned node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl FixedPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Coordinates as an array, or `None` if any axis is not finite.
    pub fn to_finite(self) -> Option<[f64; 3]> {
        let coords = [self.x, self.y, self.z];
        coords.iter().all(|c| c.is_finite()).then_some(coords)
    }
}

/// Messages the host sends to the engine. The only way to mutate engine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Full reset: new params (defaults for unset fields) and a new graph.
    Init {
        #[serde(default)]
        nodes: Vec<NodeInput>,
        #[serde(default)]
        edges: Vec<EdgeInput>,
        #[serde(default)]
        params: Option<SimParams>,
    },
    /// Replace the graph, keeping params and run state. Pins are dropped.
    UpdateGraph {
        #[serde(default)]
        nodes: Vec<NodeInput>,
        #[serde(default)]
        edges: Vec<EdgeInput>,
    },
    Start,
    Stop,
    /// Fix a node, optionally at explicit coordinates.
    Pin {
        id: String,
        #[serde(default)]
        fixed: Option<FixedPoint>,
    },
    Unpin {
        id: String,
    },
}

impl ControlMessage {
    /// Protocol name of the message, as it appears in the `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init { .. } => "INIT",
            Self::UpdateGraph { .. } => "UPDATE_GRAPH",
            Self::Start => "START",
            Self::Stop => "STOP",
            Self::Pin { .. } => "PIN",
            Self::Unpin { .. } => "UNPIN",
        }
    }
}

/// A snapshot of every node position.
///
/// The buffer is a copy; consumers may keep or mutate it freely.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Emission counter since the last `INIT`, starting at 0.
    pub seq: u64,
    /// Number of solver steps run since the last `INIT`.
    pub step: u64,
    /// `[x0, y0, z0, x1, y1, z1, ...]` in slot order.
    pub positions: Vec<f32>,
    /// Node ids; `ids[i]` owns `positions[3i..3i + 3]`.
    pub ids: Arc<[String]>,
    /// Mean `|v|²` across nodes at emission time.
    pub mean_squared_velocity: f64,
}

impl Tick {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Position of slot `i`.
    pub fn position(&self, i: usize) -> Option<[f32; 3]> {
        let start = i.checked_mul(3)?;
        let chunk = self.positions.get(start..start.checked_add(3)?)?;
        Some([chunk[0], chunk[1], chunk[2]])
    }

    /// Position of the first slot with the given id.
    pub fn position_of(&self, id: &str) -> Option<[f32; 3]> {
        let i = self.ids.iter().position(|candidate| candidate == id)?;
        self.position(i)
    }
}

/// Outbound traffic from the worker.
#[derive(Debug)]
pub enum WorkerEvent {
    Tick(Tick),
    /// A control message was rejected.
    Error(LayoutError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_init_with_partial_params() {
        let json = r#"{
            "type": "INIT",
            "nodes": [{"id": "A", "x": 0, "y": 0, "z": 0}, {"id": "B"}],
            "edges": [{"source": "A", "target": "B", "weight": 2}],
            "params": {"restLength": 5, "emissionRate": 10}
        }"#;
        let msg: ControlMessage = serde_json::from_str(json).unwrap();

        let ControlMessage::Init { nodes, edges, params } = msg else {
            panic!("expected INIT");
        };
        assert_eq!(nodes.len(), 2);
        assert_eq!(edges[0].weight, Some(2.0));
        let params = params.unwrap();
        assert_eq!(params.rest_length, 5.0);
        assert_eq!(params.emission_rate, 10.0);
        assert_eq!(params.spring_k, SimParams::default().spring_k);
    }

    #[test]
    fn test_decode_init_without_params() {
        let msg: ControlMessage = serde_json::from_str(r#"{"type":"INIT"}"#).unwrap();
        assert_eq!(
            msg,
            ControlMessage::Init {
                nodes: vec![],
                edges: vec![],
                params: None
            }
        );
    }

    #[test]
    fn test_decode_unit_and_pin_messages() {
        let start: ControlMessage = serde_json::from_str(r#"{"type":"START"}"#).unwrap();
        assert_eq!(start, ControlMessage::Start);

        let pin: ControlMessage =
            serde_json::from_str(r#"{"type":"PIN","id":"a","fixed":{"x":1,"y":2,"z":3}}"#).unwrap();
        assert_eq!(
            pin,
            ControlMessage::Pin {
                id: "a".into(),
                fixed: Some(FixedPoint::new(1.0, 2.0, 3.0))
            }
        );

        let pin: ControlMessage = serde_json::from_str(r#"{"type":"PIN","id":"a"}"#).unwrap();
        assert_eq!(pin, ControlMessage::Pin { id: "a".into(), fixed: None });
        assert_eq!(pin.name(), "PIN");

        let update: ControlMessage =
            serde_json::from_str(r#"{"type":"UPDATE_GRAPH","nodes":[],"edges":[]}"#).unwrap();
        assert_eq!(update.name(), "UPDATE_GRAPH");
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ControlMessage>(r#"{"type":"RESTART"}"#).is_err());
        assert!(serde_json::from_str::<ControlMessage>(r#"{"kind":"START"}"#).is_err());
    }

    #[test]
    fn test_fixed_point_non_finite() {
        assert_eq!(FixedPoint::new(1.0, 2.0, 3.0).to_finite(), Some([1.0, 2.0, 3.0]));
        assert_eq!(FixedPoint::new(f64::NAN, 0.0, 0.0).to_finite(), None);
    }

    #[test]
    fn test_tick_lookup() {
        let tick = Tick {
            seq: 0,
            step: 1,
            positions: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            ids: Arc::from(vec!["a".to_string(), "b".to_string()]),
            mean_squared_velocity: 0.0,
        };

        assert_eq!(tick.len(), 2);
        assert_eq!(tick.position(1), Some([4.0, 5.0, 6.0]));
        assert_eq!(tick.position_of("a"), Some([1.0, 2.0, 3.0]));
        assert_eq!(tick.position(2), None);
        assert_eq!(tick.position_of("zzz"), None);
        assert_eq!(tick.position(usize::MAX), None);
        assert_eq!(tick.position(usize::MAX / 3), None);
    }
}
