//! The layout worker: control protocol, scheduler and runtime.
//!
//! - `protocol`: inbound [`ControlMessage`]s and outbound [`WorkerEvent`]s
//! - `scheduler`: the step/emit state machine owning all engine state
//! - `thread`: a dedicated native thread driving the scheduler

pub mod protocol;
pub mod scheduler;
#[cfg(not(target_arch = "wasm32"))]
pub mod thread;

pub use protocol::{ControlMessage, FixedPoint, Tick, WorkerEvent};
pub use scheduler::LayoutScheduler;
#[cfg(not(target_arch = "wasm32"))]
pub use thread::LayoutWorker;
