//! Step/emit state machine.
//!
//! `LayoutScheduler` owns the whole engine state: store, solver, params and
//! run state. It is driven from outside: control messages go through
//! [`LayoutScheduler::handle`], and [`LayoutScheduler::pump`] runs one step and
//! decides whether enough wall-clock time has passed to emit a tick. The
//! caller owns the clock, which lets the same state machine run on a native
//! thread or inside a browser worker.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, trace, warn};

use super::protocol::{ControlMessage, Tick};
use crate::error::LayoutError;
use crate::graph::{EdgeInput, GraphStore, NodeInput};
use crate::layout::{ForceSolver, SimParams};

/// The layout engine behind the control protocol.
pub struct LayoutScheduler {
    store: GraphStore,
    solver: ForceSolver,
    params: SimParams,
    rng: StdRng,
    initialized: bool,
    running: bool,
    steps: u64,
    ticks: u64,
    last_emit: Option<Duration>,
}

impl LayoutScheduler {
    /// A scheduler waiting for `INIT`.
    pub fn new() -> Self {
        Self {
            store: GraphStore::new(),
            solver: ForceSolver::new(),
            params: SimParams::default(),
            rng: StdRng::from_entropy(),
            initialized: false,
            running: false,
            steps: 0,
            ticks: 0,
            last_emit: None,
        }
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Apply one control message.
    ///
    /// Fails only on protocol misuse: `START` or `UPDATE_GRAPH` before `INIT`.
    pub fn handle(&mut self, message: ControlMessage) -> Result<(), LayoutError> {
        trace!(message = message.name(), "control message");
        match message {
            ControlMessage::Init {
                nodes,
                edges,
                params,
            } => {
                self.init(&nodes, &edges, params.unwrap_or_default());
                Ok(())
            }
            ControlMessage::UpdateGraph { nodes, edges } => self.update_graph(&nodes, &edges),
            ControlMessage::Start => self.start(),
            ControlMessage::Stop => {
                self.stop();
                Ok(())
            }
            ControlMessage::Pin { id, fixed } => {
                let at = fixed.and_then(|point| point.to_finite());
                if !self.store.pin(&id, at) {
                    debug!(%id, "pin ignored: unknown node");
                }
                Ok(())
            }
            ControlMessage::Unpin { id } => {
                if !self.store.unpin(&id) {
                    debug!(%id, "unpin ignored: unknown node");
                }
                Ok(())
            }
        }
    }

    fn init(&mut self, nodes: &[NodeInput], edges: &[EdgeInput], params: SimParams) {
        self.params = params.sanitized();
        self.rng = match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.store.build(nodes, edges, &mut self.rng);
        self.initialized = true;
        self.running = false;
        self.steps = 0;
        self.ticks = 0;
        self.last_emit = None;

        info!(
            nodes = self.store.node_count(),
            edges = self.store.edge_count(),
            components = self.store.component_count(),
            seeded = self.params.seed.is_some(),
            "layout initialized"
        );
    }

    fn update_graph(&mut self, nodes: &[NodeInput], edges: &[EdgeInput]) -> Result<(), LayoutError> {
        if !self.initialized {
            warn!("UPDATE_GRAPH before INIT");
            return Err(LayoutError::NotInitialized {
                operation: "UPDATE_GRAPH",
            });
        }

        self.store.rebuild(nodes, edges, &mut self.rng);
        debug!(
            nodes = self.store.node_count(),
            edges = self.store.edge_count(),
            running = self.running,
            "graph updated"
        );
        Ok(())
    }

    fn start(&mut self) -> Result<(), LayoutError> {
        if !self.initialized {
            warn!("START before INIT");
            return Err(LayoutError::NotInitialized { operation: "START" });
        }
        if !self.running {
            self.running = true;
            info!(step = self.steps, "layout started");
        }
        Ok(())
    }

    fn stop(&mut self) {
        if self.running {
            self.running = false;
            info!(step = self.steps, ticks = self.ticks, "layout stopped");
        }
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    /// Run one step if running, then emit a tick if the emission interval has
    /// elapsed since the previous one. `now` is any monotonic clock reading.
    ///
    /// The first pump after `INIT` always emits. `STOP` and `START` do not
    /// reset the interval.
    pub fn pump(&mut self, now: Duration) -> Option<Tick> {
        if !self.running {
            return None;
        }

        self.step();

        let due = match self.last_emit {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.params.emission_interval(),
        };
        if !due {
            return None;
        }

        self.last_emit = Some(now);
        Some(self.emit())
    }

    /// Run exactly one solver step, regardless of run state.
    pub fn step(&mut self) {
        self.solver.step(&mut self.store, &self.params);
        self.steps += 1;
    }

    fn emit(&mut self) -> Tick {
        let tick = self.snapshot();
        self.ticks += 1;
        trace!(seq = tick.seq, step = tick.step, nodes = tick.len(), "tick");
        tick
    }

    /// Copy of the current positions, without counting as an emission.
    pub fn snapshot(&self) -> Tick {
        let mut positions = Vec::new();
        self.store.write_positions(&mut positions);
        Tick {
            seq: self.ticks,
            step: self.steps,
            positions,
            ids: self.store.ids().clone(),
            mean_squared_velocity: self.store.mean_squared_velocity(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Solver steps since the last `INIT`.
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// Ticks emitted since the last `INIT`.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }
}

impl Default for LayoutScheduler {
    fn default() -> Self {
        Self::new()
    }
}
