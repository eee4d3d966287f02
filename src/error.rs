//! Error types for the layout engine.
//!
//! Bad graph data is never an error: unresolved edges, self-loops and
//! duplicate ids are dropped or resolved during the build. Only protocol
//! misuse and runtime plumbing failures surface here.

use thiserror::Error;

/// Errors reported by the scheduler, the worker thread, and the bindings.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A message that needs a graph arrived before `INIT`.
    #[error("layout engine not initialized: {operation} requires a prior INIT")]
    NotInitialized {
        /// The protocol operation that was rejected.
        operation: &'static str,
    },

    /// The worker thread is gone and can no longer receive messages.
    #[error("layout worker disconnected")]
    WorkerDisconnected,

    /// The worker thread could not be started.
    #[error("failed to spawn layout worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// A control message from the host could not be decoded.
    #[error("malformed control message: {0}")]
    Decode(String),
}

impl LayoutError {
    /// Whether the error indicates a caller bug rather than a runtime failure.
    pub fn is_protocol_misuse(&self) -> bool {
        matches!(self, Self::NotInitialized { .. } | Self::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_initialized_message_names_operation() {
        let err = LayoutError::NotInitialized { operation: "START" };
        assert_eq!(
            err.to_string(),
            "layout engine not initialized: START requires a prior INIT"
        );
        assert!(err.is_protocol_misuse());
    }

    #[test]
    fn test_runtime_errors_are_not_misuse() {
        assert!(!LayoutError::WorkerDisconnected.is_protocol_misuse());
        let io = std::io::Error::other("no threads");
        assert!(!LayoutError::from(io).is_protocol_misuse());
    }
}
