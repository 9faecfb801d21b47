//! Node directory: caches the local node id, fetches connected peers on demand.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::host::{Discovery, DiscoveryError};
use crate::node::{Node, NodeId};

/// Local node plus the peers connected at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySnapshot {
    pub local: Node,
    pub peers: Vec<Node>,
}

/// Which half of a snapshot query failed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SnapshotError {
    #[error("local node query failed: {0}")]
    LocalNode(#[source] DiscoveryError),
    #[error("connected nodes query failed: {0}")]
    ConnectedNodes(#[source] DiscoveryError),
}

pub struct NodeDirectory {
    discovery: Arc<dyn Discovery>,
    local_id: Mutex<Option<NodeId>>,
}

impl NodeDirectory {
    pub fn new(discovery: Arc<dyn Discovery>) -> Self {
        Self {
            discovery,
            local_id: Mutex::new(None),
        }
    }

    /// Last resolved local id, if any.
    pub fn cached_local_id(&self) -> Option<NodeId> {
        self.local_id.lock().ok().and_then(|g| g.clone())
    }

    /// Query the local node and cache its id. On failure the cached id is left as it was.
    pub async fn resolve_local(&self) -> Result<Node, DiscoveryError> {
        let node = self.discovery.local_node().await.map_err(|e| {
            warn!(error = %e, "local node query failed");
            e
        })?;
        if let Ok(mut cached) = self.local_id.lock() {
            *cached = Some(node.id.clone());
        }
        debug!(local = %node.id, "local node resolved");
        Ok(node)
    }

    pub async fn resolve_local_id(&self) -> Result<NodeId, DiscoveryError> {
        self.resolve_local().await.map(|n| n.id)
    }

    /// Peers connected right now. Never cached; empty is a valid answer.
    pub async fn list_connected(&self) -> Result<Vec<Node>, DiscoveryError> {
        self.discovery.connected_nodes().await.map_err(|e| {
            warn!(error = %e, "connected nodes query failed");
            e
        })
    }

    /// Both queries run together; the snapshot exists only if both succeed.
    pub async fn snapshot(&self) -> Result<DirectorySnapshot, SnapshotError> {
        let (local, peers) = futures::join!(self.resolve_local(), self.list_connected());
        let local = local.map_err(SnapshotError::LocalNode)?;
        let peers = peers.map_err(SnapshotError::ConnectedNodes)?;
        Ok(DirectorySnapshot { local, peers })
    }
}
