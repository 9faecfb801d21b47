//! Static discovery: configured peers, reported connected when a TCP probe succeeds.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;
use wearlink_core::{Discovery, DiscoveryError, Node};

use crate::config::PeerConfig;

const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

pub struct StaticDiscovery {
    local: Node,
    peers: Vec<PeerConfig>,
    probe_timeout: Duration,
}

impl StaticDiscovery {
    pub fn new(local: Node, peers: Vec<PeerConfig>) -> Self {
        Self {
            local,
            peers,
            probe_timeout: PROBE_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}

async fn reachable(addr: SocketAddr, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect(addr)).await,
        Ok(Ok(_))
    )
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn local_node(&self) -> Result<Node, DiscoveryError> {
        Ok(self.local.clone())
    }

    /// Probes run concurrently; the result keeps configuration order.
    async fn connected_nodes(&self) -> Result<Vec<Node>, DiscoveryError> {
        let probes: Vec<_> = self
            .peers
            .iter()
            .map(|p| tokio::spawn(reachable(p.addr, self.probe_timeout)))
            .collect();
        let mut connected = Vec::new();
        for (peer, probe) in self.peers.iter().zip(probes) {
            let up = probe
                .await
                .map_err(|e| DiscoveryError(format!("probe task failed: {e}")))?;
            debug!(peer = %peer.id, addr = %peer.addr, up, "peer probed");
            if up {
                let name = if peer.name.is_empty() {
                    peer.id.clone()
                } else {
                    peer.name.clone()
                };
                connected.push(Node::peer(peer.id.as_str(), name, peer.nearby));
            }
        }
        Ok(connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn only_reachable_peers_are_connected() {
        let live = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let live_addr = live.local_addr().unwrap();
        let dead_addr = {
            let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap()
        };
        let disc = StaticDiscovery::new(
            Node::local("phone", "Phone"),
            vec![
                PeerConfig {
                    id: "dead".into(),
                    name: String::new(),
                    addr: dead_addr,
                    nearby: true,
                },
                PeerConfig {
                    id: "live".into(),
                    name: String::new(),
                    addr: live_addr,
                    nearby: false,
                },
            ],
        )
        .with_probe_timeout(Duration::from_millis(200));

        let nodes = disc.connected_nodes().await.unwrap();
        assert_eq!(nodes, vec![Node::peer("live", "live", false)]);
        assert_eq!(disc.local_node().await.unwrap().is_nearby, None);
    }

    #[tokio::test]
    async fn no_peers_is_empty() {
        let disc = StaticDiscovery::new(Node::local("phone", "Phone"), vec![]);
        assert!(disc.connected_nodes().await.unwrap().is_empty());
    }
}
