//! Routing: outbound target selection and inbound classification. Pure functions; the
//! engine feeds them the directory snapshot and attachment state.

use crate::node::{Node, NodeId};
use crate::protocol::{CommandDirective, Envelope};

/// Peers that should receive `envelope`. A target id selects that peer only if it is in
/// `connected`; no target id selects every connected peer.
pub fn resolve_targets(envelope: &Envelope, connected: &[Node]) -> Vec<NodeId> {
    match envelope.target_id() {
        Some(target) => connected
            .iter()
            .filter(|n| n.id == target)
            .take(1)
            .map(|n| n.id.clone())
            .collect(),
        None => connected.iter().map(|n| n.id.clone()).collect(),
    }
}

/// What to do with an inbound envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Addressed to another node; dropped.
    RoutingMiss { target: NodeId },
    /// Command while no application is attached; handled on-device.
    LocalCommand(CommandDirective),
    /// Delivered to the event subscriber.
    Forward,
}

/// Classify an inbound envelope. `local_id: None` means this node's id is unknown, so any
/// targeted message is a miss.
pub fn classify(envelope: &Envelope, local_id: Option<&NodeId>, attached: bool) -> Inbound {
    if let Some(target) = envelope.target_id() {
        if local_id != Some(&target) {
            return Inbound::RoutingMiss { target };
        }
    }
    if envelope.is_command() && !attached {
        return Inbound::LocalCommand(envelope.directive());
    }
    Inbound::Forward
}
