//! Force3D Layout - continuous 3D force-directed graph layout.
//!
//! This crate computes and streams 3D node positions for a weighted graph,
//! updating in real time as the graph changes. It is usable as a native
//! library (the engine runs on its own thread) and as a WebAssembly module
//! driven from a browser worker via wasm-bindgen.
//!
//! # Architecture
//!
//! - `graph`: node/edge store with SoA position and velocity buffers
//! - `spatial`: uniform hash grid for near-linear repulsion
//! - `layout`: solver constants and the per-step force solver
//! - `worker`: control protocol, step/emit scheduler, native worker thread
//!
//! The host talks to the engine only through [`ControlMessage`]s and observes
//! it only through emitted [`Tick`] snapshots.

use std::time::Duration;

use js_sys::{Array, Float32Array};
use wasm_bindgen::prelude::*;

pub mod error;
pub mod graph;
pub mod layout;
pub mod spatial;
pub mod worker;

pub use error::LayoutError;
pub use graph::{EdgeInput, NodeInput};
pub use layout::SimParams;
#[cfg(not(target_arch = "wasm32"))]
pub use worker::LayoutWorker;
pub use worker::{ControlMessage, FixedPoint, LayoutScheduler, Tick, WorkerEvent};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Layout engine exposed to JavaScript.
///
/// Browsers have no threads to spare inside a worker, so the host drives the
/// loop: post control messages with `postMessage`, and call `pump` from a
/// `setTimeout(0)` loop with `performance.now()`. Each `pump` runs one step
/// and returns a tick when one is due.
#[wasm_bindgen]
pub struct ForceLayoutWasm {
    scheduler: LayoutScheduler,
}

#[wasm_bindgen]
impl ForceLayoutWasm {
    /// Create an engine waiting for `INIT`.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            scheduler: LayoutScheduler::new(),
        }
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Apply a control message such as `{ type: "START" }`.
    ///
    /// Throws on undecodable messages and on `START` / `UPDATE_GRAPH` before
    /// `INIT`.
    #[wasm_bindgen(js_name = postMessage)]
    pub fn post_message(&mut self, message: JsValue) -> Result<(), JsError> {
        let message: ControlMessage = serde_wasm_bindgen::from_value(message)
            .map_err(|err| LayoutError::Decode(err.to_string()))?;
        self.handle(message)?;
        Ok(())
    }

    /// Run one step and return a tick if one is due.
    ///
    /// `now_ms` is a monotonic clock in milliseconds, e.g. `performance.now()`.
    pub fn pump(&mut self, now_ms: f64) -> Option<TickJs> {
        let now = Duration::try_from_secs_f64(now_ms / 1000.0).unwrap_or_default();
        self.scheduler.pump(now).map(TickJs::from)
    }

    /// Current positions without waiting for the next emission.
    pub fn snapshot(&self) -> TickJs {
        TickJs::from(self.scheduler.snapshot())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    #[wasm_bindgen(js_name = isInitialized)]
    pub fn is_initialized(&self) -> bool {
        self.scheduler.is_initialized()
    }

    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> u32 {
        self.scheduler.store().node_count() as u32
    }

    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> u32 {
        self.scheduler.store().edge_count() as u32
    }

    /// Solver steps since the last `INIT`.
    #[wasm_bindgen(js_name = stepCount)]
    pub fn step_count(&self) -> f64 {
        self.scheduler.step_count() as f64
    }
}

impl ForceLayoutWasm {
    /// Apply an already-decoded control message.
    pub fn handle(&mut self, message: ControlMessage) -> Result<(), LayoutError> {
        self.scheduler.handle(message)
    }

    pub fn scheduler(&self) -> &LayoutScheduler {
        &self.scheduler
    }
}

impl Default for ForceLayoutWasm {
    fn default() -> Self {
        Self::new()
    }
}

/// A tick as seen from JavaScript.
///
/// `ids[i]` owns `positions[3i..3i + 3]`. Both getters return fresh copies.
#[wasm_bindgen]
pub struct TickJs {
    tick: Tick,
}

#[wasm_bindgen]
impl TickJs {
    #[wasm_bindgen(getter)]
    pub fn seq(&self) -> f64 {
        self.tick.seq as f64
    }

    #[wasm_bindgen(getter)]
    pub fn step(&self) -> f64 {
        self.tick.step as f64
    }

    /// Flat `[x0, y0, z0, ...]` buffer.
    #[wasm_bindgen(getter)]
    pub fn positions(&self) -> Float32Array {
        Float32Array::from(&self.tick.positions[..])
    }

    /// Node ids in buffer order.
    #[wasm_bindgen(getter)]
    pub fn ids(&self) -> Array {
        self.tick.ids.iter().map(|id| JsValue::from_str(id)).collect()
    }

    #[wasm_bindgen(getter, js_name = meanSquaredVelocity)]
    pub fn mean_squared_velocity(&self) -> f64 {
        self.tick.mean_squared_velocity
    }
}

impl TickJs {
    pub fn into_inner(self) -> Tick {
        self.tick
    }
}

impl From<Tick> for TickJs {
    fn from(tick: Tick) -> Self {
        Self { tick }
    }
}
