//! Phases of a single connection attempt.
//!
//! ```text
//! Idle → HeaderPreparation → TransportOpening → Handshaking → Ready
//!              │                    │                │
//!              └──────────────→ Failed ←─────────────┘
//! ```

use log::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Idle,
    HeaderPreparation,
    TransportOpening,
    Handshaking,
    Ready,
    Failed,
}

impl ConnectionPhase {
    pub fn can_advance_to(self, next: ConnectionPhase) -> bool {
        use ConnectionPhase::*;

        matches!(
            (self, next),
            (Idle, HeaderPreparation)
                | (HeaderPreparation, TransportOpening)
                | (TransportOpening, Handshaking)
                | (Handshaking, Ready)
                | (HeaderPreparation | TransportOpening | Handshaking, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionPhase::Ready | ConnectionPhase::Failed)
    }
}

/// Tracks and logs the phase of one attempt.
#[derive(Debug)]
pub(crate) struct PhaseTracker {
    plugin_id: String,
    phase: ConnectionPhase,
}

impl PhaseTracker {
    pub(crate) fn new(plugin_id: &str) -> Self {
        Self {
            plugin_id: plugin_id.to_string(),
            phase: ConnectionPhase::Idle,
        }
    }

    pub(crate) fn advance(&mut self, next: ConnectionPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "invalid phase transition {:?} -> {next:?}",
            self.phase
        );
        debug!("[{}] {:?} -> {next:?}", self.plugin_id, self.phase);
        self.phase = next;
    }

    /// Move to `Failed` and hand the error back for returning.
    pub(crate) fn fail<E: std::fmt::Display>(&mut self, error: E) -> E {
        warn!(
            "[{}] Connection attempt failed during {:?}: {error}",
            self.plugin_id, self.phase
        );
        self.advance(ConnectionPhase::Failed);
        error
    }
}
