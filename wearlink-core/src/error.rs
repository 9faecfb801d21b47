//! Engine-level errors and the per-send report.

use crate::directory::SnapshotError;
use crate::host::{DiscoveryError, TransportError};
use crate::node::NodeId;
use crate::wire::EncodeError;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// One peer's failed delivery. Never aborts deliveries to other peers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("send to {peer} failed: {reason}")]
pub struct SendFailed {
    pub peer: NodeId,
    pub reason: String,
}

/// Per-peer completions of one `send`. An empty report means there were no target peers,
/// which is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReport {
    pub delivered: Vec<NodeId>,
    pub failed: Vec<SendFailed>,
}

impl SendReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    /// No peer was targeted.
    pub fn no_target_peers(&self) -> bool {
        self.attempted() == 0
    }

    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}
