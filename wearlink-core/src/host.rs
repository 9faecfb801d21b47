//! Collaborators supplied by the host platform: transport, discovery, remote launcher,
//! local command handler. All calls are async; none of them may block on a peer.

use std::sync::Arc;

use async_trait::async_trait;

use crate::node::{Node, NodeId};
use crate::protocol::CommandDirective;

/// Point-to-point delivery of opaque payloads to a named node.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `payload` to `node` on `path`. Resolves once the transport reports completion.
    async fn send_bytes(&self, node: &NodeId, path: &str, payload: Vec<u8>)
        -> Result<(), TransportError>;

    /// Install the inbound listener. At most one is installed by the engine.
    async fn add_inbound_listener(
        &self,
        listener: Arc<dyn InboundListener>,
    ) -> Result<(), TransportError>;

    async fn remove_inbound_listener(&self) -> Result<(), TransportError>;
}

/// Receives raw inbound payloads, on whatever task the transport delivers on.
#[async_trait]
pub trait InboundListener: Send + Sync {
    async fn on_message(&self, origin: NodeId, path: String, payload: Vec<u8>);
}

/// Node discovery service.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn local_node(&self) -> Result<Node, DiscoveryError>;
    async fn connected_nodes(&self) -> Result<Vec<Node>, DiscoveryError>;
}

/// Starts a viewing intent for a URI on the companion device.
#[async_trait]
pub trait RemoteLauncher: Send + Sync {
    async fn start_remote(&self, uri: &str) -> Result<(), LaunchError>;
}

/// The on-device service woken by local commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionService {
    pub package_name: String,
    pub class_name: String,
}

/// Performs the device-side action for a local command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn on_command(&self, service: &CompanionService, directive: CommandDirective);
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

#[derive(Debug, Clone, thiserror::Error)]
#[error("discovery unavailable: {0}")]
pub struct DiscoveryError(pub String);

#[derive(Debug, Clone, thiserror::Error)]
#[error("launch failed: {0}")]
pub struct LaunchError(pub String);
