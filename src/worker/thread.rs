//! Native worker runtime.
//!
//! A dedicated thread owns a [`LayoutScheduler`]. Control messages arrive on
//! an ordered channel and are only read between steps, so no step ever sees
//! a half-applied mutation. While stopped the thread blocks on the control
//! channel; while running it drains pending messages, pumps one step, and
//! yields. Events go out on a bounded channel with `try_send`: a slow consumer
//! loses ticks, the engine never waits.

use std::sync::mpsc::{
    self, Receiver, RecvTimeoutError, Sender, SyncSender, TryRecvError, TrySendError,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::protocol::{ControlMessage, WorkerEvent};
use super::scheduler::LayoutScheduler;
use crate::error::LayoutError;

/// Events buffered for the consumer before ticks start being dropped.
pub const EVENT_BUFFER: usize = 64;

const THREAD_NAME: &str = "force3d-layout";

/// Handle to a layout engine running on its own thread.
pub struct LayoutWorker {
    control: Option<Sender<ControlMessage>>,
    events: Receiver<WorkerEvent>,
    thread: Option<JoinHandle<()>>,
}

impl LayoutWorker {
    /// Spawn the worker thread with a fresh scheduler.
    pub fn spawn() -> Result<Self, LayoutError> {
        Self::spawn_with(LayoutScheduler::new())
    }

    /// Spawn the worker thread around an existing scheduler.
    pub fn spawn_with(scheduler: LayoutScheduler) -> Result<Self, LayoutError> {
        let (control_tx, control_rx) = mpsc::channel();
        let (events_tx, events_rx) = mpsc::sync_channel(EVENT_BUFFER);

        let thread = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(scheduler, control_rx, events_tx))?;

        Ok(Self {
            control: Some(control_tx),
            events: events_rx,
            thread: Some(thread),
        })
    }

    /// Queue a control message. Messages are applied in send order.
    pub fn send(&self, message: ControlMessage) -> Result<(), LayoutError> {
        self.control
            .as_ref()
            .ok_or(LayoutError::WorkerDisconnected)?
            .send(message)
            .map_err(|_| LayoutError::WorkerDisconnected)
    }

    /// The event stream (ticks and rejected messages).
    pub fn events(&self) -> &Receiver<WorkerEvent> {
        &self.events
    }

    /// Next buffered event, if any.
    pub fn try_next_event(&self) -> Option<WorkerEvent> {
        self.events.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event.
    pub fn next_event_timeout(&self, timeout: Duration) -> Result<Option<WorkerEvent>, LayoutError> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(LayoutError::WorkerDisconnected),
        }
    }

    /// Stop the thread and wait for it to exit.
    ///
    /// An in-flight step always completes first.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        // Disconnecting the control channel ends the worker loop.
        self.control.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("layout worker panicked");
            }
        }
    }
}

impl Drop for LayoutWorker {
    fn drop(&mut self) {
        self.close();
    }
}

fn run(
    mut scheduler: LayoutScheduler,
    control: Receiver<ControlMessage>,
    events: SyncSender<WorkerEvent>,
) {
    let clock = Instant::now();
    debug!("layout worker started");

    loop {
        let next = if scheduler.is_running() {
            match control.try_recv() {
                Ok(message) => Some(message),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            }
        } else {
            match control.recv() {
                Ok(message) => Some(message),
                Err(_) => break,
            }
        };

        if let Some(message) = next {
            let name = message.name();
            if let Err(err) = scheduler.handle(message) {
                if err.is_protocol_misuse() {
                    debug!(message = name, %err, "control message rejected");
                } else {
                    warn!(message = name, %err, "control message failed");
                }
                publish(&events, WorkerEvent::Error(err));
            }
            continue;
        }

        if let Some(tick) = scheduler.pump(clock.elapsed()) {
            publish(&events, WorkerEvent::Tick(tick));
        }
        thread::yield_now();
    }

    debug!(
        steps = scheduler.step_count(),
        ticks = scheduler.tick_count(),
        "layout worker exited"
    );
}

fn publish(events: &SyncSender<WorkerEvent>, event: WorkerEvent) {
    match events.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(WorkerEvent::Tick(tick))) => {
            debug!(seq = tick.seq, "consumer behind, tick dropped");
        }
        Err(TrySendError::Full(WorkerEvent::Error(err))) => {
            warn!(%err, "consumer behind, error dropped");
        }
        // Nobody is listening; keep simulating until told to stop.
        Err(TrySendError::Disconnected(_)) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeInput, NodeInput};
    use crate::layout::SimParams;
    use crate::worker::protocol::Tick;

    const WAIT: Duration = Duration::from_secs(5);

    fn next_tick(worker: &LayoutWorker) -> Tick {
        let deadline = Instant::now() + WAIT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match worker.next_event_timeout(remaining).unwrap() {
                Some(WorkerEvent::Tick(tick)) => return tick,
                Some(WorkerEvent::Error(err)) => panic!("unexpected error: {err}"),
                None => panic!("no tick within {WAIT:?}"),
            }
        }
    }

    fn init() -> ControlMessage {
        ControlMessage::Init {
            nodes: vec![
                NodeInput::at("A", 0.0, 0.0, 0.0),
                NodeInput::at("B", 10.0, 0.0, 0.0),
            ],
            edges: vec![EdgeInput::new("A", "B")],
            params: Some(SimParams {
                emission_rate: 200.0,
                seed: Some(1),
                ..SimParams::default()
            }),
        }
    }

    #[test]
    fn test_worker_streams_ticks() {
        let worker = LayoutWorker::spawn().unwrap();
        worker.send(init()).unwrap();
        worker.send(ControlMessage::Start).unwrap();

        let first = next_tick(&worker);
        let second = next_tick(&worker);
        assert_eq!(&*first.ids, &["A".to_string(), "B".to_string()]);
        assert_eq!(first.positions.len(), 6);
        assert!(second.step > first.step);
        worker.shutdown();
    }

    #[test]
    fn test_worker_reports_start_before_init() {
        let worker = LayoutWorker::spawn().unwrap();
        worker.send(ControlMessage::Start).unwrap();

        match worker.next_event_timeout(WAIT).unwrap() {
            Some(WorkerEvent::Error(LayoutError::NotInitialized { operation })) => {
                assert_eq!(operation, "START");
            }
            other => panic!("expected NotInitialized, got {other:?}"),
        }
    }

    #[test]
    fn test_worker_applies_pin_between_steps() {
        let worker = LayoutWorker::spawn().unwrap();
        worker.send(init()).unwrap();
        worker.send(ControlMessage::Start).unwrap();
        next_tick(&worker);

        worker
            .send(ControlMessage::Pin {
                id: "A".into(),
                fixed: Some(crate::worker::FixedPoint::new(1.0, 2.0, 3.0)),
            })
            .unwrap();

        // Every tick after the pin lands shows A at the pin; earlier ones may
        // still be in the buffer.
        let deadline = Instant::now() + WAIT;
        loop {
            let tick = next_tick(&worker);
            if tick.position_of("A") == Some([1.0, 2.0, 3.0]) {
                break;
            }
            assert!(Instant::now() < deadline, "pin never observed");
        }
    }

    #[test]
    fn test_stopped_worker_emits_nothing() {
        let worker = LayoutWorker::spawn().unwrap();
        worker.send(init()).unwrap();

        assert!(
            worker
                .next_event_timeout(Duration::from_millis(100))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_drop_joins_thread() {
        let worker = LayoutWorker::spawn().unwrap();
        worker.send(init()).unwrap();
        worker.send(ControlMessage::Start).unwrap();
        next_tick(&worker);
        drop(worker);
    }
}
