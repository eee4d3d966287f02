//! GraphStore - node and edge arrays for the force simulation.
//!
//! The store keeps the edge topology in a petgraph `Graph` whose node indices
//! match array positions, and SoA (Structure of Arrays) buffers for positions
//! and velocities so the solver can sweep them linearly. Structural changes
//! always rebuild everything; there is no incremental add/remove.

use std::collections::HashMap;
use std::sync::Arc;

use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use rand::Rng;
use tracing::debug;

use super::edge::{Edge, EdgeInput};
use super::node::{NodeInput, NodeState};
use super::placement::{SEED_RADIUS, random_on_sphere};

/// Counts of input records that did not make it into the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub nodes: usize,
    pub edges: usize,
    /// Input ids that appeared more than once (last write wins).
    pub duplicate_ids: usize,
    /// Edges whose source and target resolved to the same node.
    pub self_loops: usize,
    /// Edges with an endpoint id that is not in the node list.
    pub unresolved: usize,
}

/// Position and velocity of the previous build, keyed by external id.
struct Carried {
    index: HashMap<String, usize>,
    pos: [Vec<f64>; 3],
    vel: [Vec<f64>; 3],
}

impl Carried {
    fn lookup(&self, id: &str) -> Option<([f64; 3], [f64; 3])> {
        let &i = self.index.get(id)?;
        let pos = [self.pos[0][i], self.pos[1][i], self.pos[2][i]];
        let vel = [self.vel[0][i], self.vel[1][i], self.vel[2][i]];
        Some((pos, vel))
    }
}

/// The graph store.
///
/// This struct manages:
/// - Edge topology via petgraph
/// - Position/velocity buffers in SoA layout
/// - Degree counters and fixed (pinned) state per node
/// - ID mapping between external string ids and slot indices
pub struct GraphStore {
    /// Edge arena. Node weights are unused; edge weights are spring weights.
    topology: UnGraph<(), f64>,

    /// External ids in slot order, shared with emitted ticks.
    ids: Arc<[String]>,

    /// Map from external id to slot index
    id_to_index: HashMap<String, usize>,

    pub(crate) pos_x: Vec<f64>,
    pub(crate) pos_y: Vec<f64>,
    pub(crate) pos_z: Vec<f64>,

    pub(crate) vel_x: Vec<f64>,
    pub(crate) vel_y: Vec<f64>,
    pub(crate) vel_z: Vec<f64>,

    /// Edge count per node, counted while edges are resolved
    degree: Vec<u32>,

    /// Node states (fixed)
    pub(crate) states: Vec<NodeState>,

    /// Pin coordinates for fixed nodes that were given explicit ones
    pub(crate) fixed_at: Vec<Option<[f64; 3]>>,
}

impl GraphStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            topology: UnGraph::default(),
            ids: Arc::from(Vec::new()),
            id_to_index: HashMap::new(),
            pos_x: Vec::new(),
            pos_y: Vec::new(),
            pos_z: Vec::new(),
            vel_x: Vec::new(),
            vel_y: Vec::new(),
            vel_z: Vec::new(),
            degree: Vec::new(),
            states: Vec::new(),
            fixed_at: Vec::new(),
        }
    }

    // =========================================================================
    // Building
    // =========================================================================

    /// Replace all nodes and edges.
    ///
    /// Every node takes its supplied finite coordinates; missing axes come
    /// from a random point on the seeding sphere.
    pub fn build<R: Rng + ?Sized>(
        &mut self,
        nodes: &[NodeInput],
        edges: &[EdgeInput],
        rng: &mut R,
    ) -> BuildReport {
        self.replace(nodes, edges, rng, None)
    }

    /// Replace all nodes and edges, keeping the kinematic state of nodes whose
    /// id survives and that supply no coordinates of their own.
    ///
    /// Fixed state never survives a rebuild.
    pub fn rebuild<R: Rng + ?Sized>(
        &mut self,
        nodes: &[NodeInput],
        edges: &[EdgeInput],
        rng: &mut R,
    ) -> BuildReport {
        let carried = Carried {
            index: std::mem::take(&mut self.id_to_index),
            pos: [
                std::mem::take(&mut self.pos_x),
                std::mem::take(&mut self.pos_y),
                std::mem::take(&mut self.pos_z),
            ],
            vel: [
                std::mem::take(&mut self.vel_x),
                std::mem::take(&mut self.vel_y),
                std::mem::take(&mut self.vel_z),
            ],
        };
        self.replace(nodes, edges, rng, Some(&carried))
    }

    fn replace<R: Rng + ?Sized>(
        &mut self,
        nodes: &[NodeInput],
        edges: &[EdgeInput],
        rng: &mut R,
        carried: Option<&Carried>,
    ) -> BuildReport {
        let n = nodes.len();
        let mut report = BuildReport::default();

        self.clear();
        self.topology = UnGraph::with_capacity(n, edges.len());
        self.id_to_index.reserve(n);
        self.pos_x.reserve(n);
        self.pos_y.reserve(n);
        self.pos_z.reserve(n);
        self.vel_x.reserve(n);
        self.vel_y.reserve(n);
        self.vel_z.reserve(n);
        self.degree.resize(n, 0);
        self.states.resize(n, NodeState::new());
        self.fixed_at.resize(n, None);

        for (index, node) in nodes.iter().enumerate() {
            let (pos, vel) = match carried.and_then(|c| c.lookup(&node.id)) {
                Some(previous) if !node.has_position() => previous,
                _ => (Self::initial_position(node, rng), [0.0; 3]),
            };

            self.pos_x.push(pos[0]);
            self.pos_y.push(pos[1]);
            self.pos_z.push(pos[2]);
            self.vel_x.push(vel[0]);
            self.vel_y.push(vel[1]);
            self.vel_z.push(vel[2]);
            self.topology.add_node(());

            if self.id_to_index.insert(node.id.clone(), index).is_some() {
                report.duplicate_ids += 1;
            }
        }

        self.ids = nodes.iter().map(|node| node.id.clone()).collect();

        for edge in edges {
            let (Some(&a), Some(&b)) = (
                self.id_to_index.get(&edge.source),
                self.id_to_index.get(&edge.target),
            ) else {
                report.unresolved += 1;
                continue;
            };
            if a == b {
                report.self_loops += 1;
                continue;
            }

            self.topology
                .add_edge(NodeIndex::new(a), NodeIndex::new(b), edge.effective_weight());
            self.degree[a] += 1;
            self.degree[b] += 1;
        }

        report.nodes = n;
        report.edges = self.topology.edge_count();
        debug!(
            nodes = report.nodes,
            edges = report.edges,
            duplicate_ids = report.duplicate_ids,
            self_loops = report.self_loops,
            unresolved = report.unresolved,
            carried_over = carried.is_some(),
            "graph store rebuilt"
        );
        report
    }

    fn initial_position<R: Rng + ?Sized>(node: &NodeInput, rng: &mut R) -> [f64; 3] {
        let supplied = node.finite_coords();
        if let [Some(x), Some(y), Some(z)] = supplied {
            return [x, y, z];
        }
        let seeded = random_on_sphere(rng, SEED_RADIUS);
        [0, 1, 2].map(|axis| supplied[axis].unwrap_or(seeded[axis]))
    }

    /// Remove all nodes and edges.
    pub fn clear(&mut self) {
        self.topology.clear();
        self.ids = Arc::from(Vec::new());
        self.id_to_index.clear();
        self.pos_x.clear();
        self.pos_y.clear();
        self.pos_z.clear();
        self.vel_x.clear();
        self.vel_y.clear();
        self.vel_z.clear();
        self.degree.clear();
        self.states.clear();
        self.fixed_at.clear();
    }

    // =========================================================================
    // Fixed nodes
    // =========================================================================

    /// Fix a node in place, or at `at` when given.
    ///
    /// Returns false (and changes nothing) for unknown ids.
    pub fn pin(&mut self, id: &str, at: Option<[f64; 3]>) -> bool {
        let Some(&i) = self.id_to_index.get(id) else {
            return false;
        };

        self.states[i].set_fixed(true);
        self.fixed_at[i] = at;
        self.vel_x[i] = 0.0;
        self.vel_y[i] = 0.0;
        self.vel_z[i] = 0.0;
        if let Some([x, y, z]) = at {
            self.pos_x[i] = x;
            self.pos_y[i] = y;
            self.pos_z[i] = z;
        }
        true
    }

    /// Release a fixed node.
    ///
    /// Returns false for unknown ids.
    pub fn unpin(&mut self, id: &str) -> bool {
        let Some(&i) = self.id_to_index.get(id) else {
            return false;
        };

        self.states[i].set_fixed(false);
        self.fixed_at[i] = None;
        true
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.pos_x.len()
    }

    /// Number of resolved edges.
    pub fn edge_count(&self) -> usize {
        self.topology.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.pos_x.is_empty()
    }

    /// Slot index of an external id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.id_to_index.get(id).copied()
    }

    /// External ids in slot order.
    pub fn ids(&self) -> &Arc<[String]> {
        &self.ids
    }

    pub fn position(&self, index: usize) -> Option<[f64; 3]> {
        (index < self.pos_x.len()).then(|| [self.pos_x[index], self.pos_y[index], self.pos_z[index]])
    }

    pub fn velocity(&self, index: usize) -> Option<[f64; 3]> {
        (index < self.vel_x.len()).then(|| [self.vel_x[index], self.vel_y[index], self.vel_z[index]])
    }

    /// Position of the node with the given external id.
    pub fn position_of(&self, id: &str) -> Option<[f64; 3]> {
        self.index_of(id).and_then(|i| self.position(i))
    }

    pub fn degree(&self, index: usize) -> Option<u32> {
        self.degree.get(index).copied()
    }

    pub fn is_fixed(&self, index: usize) -> bool {
        self.states.get(index).is_some_and(|s| s.is_fixed())
    }

    pub fn fixed_position(&self, index: usize) -> Option<[f64; 3]> {
        self.fixed_at.get(index).copied().flatten()
    }

    /// Resolved edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.topology.raw_edges().iter().map(|e| Edge {
            a: e.source().index(),
            b: e.target().index(),
            weight: e.weight,
        })
    }

    /// The `k`-th resolved edge in insertion order.
    pub fn edge(&self, k: usize) -> Option<Edge> {
        self.topology.raw_edges().get(k).map(|e| Edge {
            a: e.source().index(),
            b: e.target().index(),
            weight: e.weight,
        })
    }

    /// Number of connected components, isolated nodes included.
    pub fn component_count(&self) -> usize {
        connected_components(&self.topology)
    }

    /// Mean of `|v|²` across all nodes; 0 for an empty store.
    pub fn mean_squared_velocity(&self) -> f64 {
        let n = self.vel_x.len();
        if n == 0 {
            return 0.0;
        }
        let sum: f64 = (0..n)
            .map(|i| self.vel_x[i].powi(2) + self.vel_y[i].powi(2) + self.vel_z[i].powi(2))
            .sum();
        sum / n as f64
    }

    /// Write positions as `[x0, y0, z0, x1, y1, z1, ...]` into `out`.
    pub fn write_positions(&self, out: &mut Vec<f32>) {
        out.clear();
        out.reserve(self.pos_x.len() * 3);
        for i in 0..self.pos_x.len() {
            out.push(self.pos_x[i] as f32);
            out.push(self.pos_y[i] as f32);
            out.push(self.pos_z[i] as f32);
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
