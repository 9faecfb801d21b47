//! TCP transport: one connection per outbound send, a listener task for inbound frames.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use wearlink_core::{InboundListener, NodeId, Transport, TransportError};

use crate::frame::{decode_frame, encode_frame, Frame, FrameDecodeError};

type ListenerSlot = Arc<RwLock<Option<Arc<dyn InboundListener>>>>;

pub struct TcpTransport {
    local_id: NodeId,
    peers: HashMap<NodeId, SocketAddr>,
    listener: ListenerSlot,
}

impl TcpTransport {
    pub fn new(local_id: NodeId, peers: HashMap<NodeId, SocketAddr>) -> Self {
        Self {
            local_id,
            peers,
            listener: Arc::new(RwLock::new(None)),
        }
    }

    /// Accept inbound connections on `port` and hand each frame to the registered listener.
    /// Frames arriving while no listener is registered are dropped.
    pub async fn serve(&self, port: u16) -> std::io::Result<()> {
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        info!(port, "transport listening");
        loop {
            let (stream, from) = listener.accept().await?;
            let slot = self.listener.clone();
            tokio::spawn(async move {
                if let Err(e) = read_frames(stream, slot).await {
                    debug!(%from, error = %e, "connection closed with error");
                }
            });
        }
    }
}

async fn read_frames(mut stream: TcpStream, slot: ListenerSlot) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            if !buf.is_empty() {
                warn!(pending = buf.len(), "connection closed mid-frame");
            }
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        loop {
            let (frame, used) = match decode_frame(&buf) {
                Ok(decoded) => decoded,
                Err(FrameDecodeError::NeedMore) => break,
                Err(e) => {
                    return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e));
                }
            };
            buf.drain(..used);
            deliver(&slot, frame).await;
        }
    }
}

async fn deliver(slot: &ListenerSlot, frame: Frame) {
    let listener = slot.read().await.clone();
    match listener {
        Some(l) => {
            l.on_message(NodeId::from(frame.origin), frame.path, frame.payload)
                .await
        }
        None => debug!(origin = %frame.origin, "no inbound listener, frame dropped"),
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send_bytes(
        &self,
        node: &NodeId,
        path: &str,
        payload: Vec<u8>,
    ) -> Result<(), TransportError> {
        let addr = self
            .peers
            .get(node)
            .ok_or_else(|| TransportError(format!("unknown node {node}")))?;
        let frame = encode_frame(&Frame {
            origin: self.local_id.to_string(),
            path: path.to_owned(),
            payload,
        })
        .map_err(|e| TransportError(e.to_string()))?;
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|e| TransportError(format!("connect {addr}: {e}")))?;
        stream
            .write_all(&frame)
            .await
            .map_err(|e| TransportError(format!("write {addr}: {e}")))?;
        stream
            .shutdown()
            .await
            .map_err(|e| TransportError(format!("shutdown {addr}: {e}")))?;
        Ok(())
    }

    async fn add_inbound_listener(
        &self,
        listener: Arc<dyn InboundListener>,
    ) -> Result<(), TransportError> {
        *self.listener.write().await = Some(listener);
        Ok(())
    }

    async fn remove_inbound_listener(&self) -> Result<(), TransportError> {
        *self.listener.write().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Forward(mpsc::UnboundedSender<(NodeId, String, Vec<u8>)>);

    #[async_trait]
    impl InboundListener for Forward {
        async fn on_message(&self, origin: NodeId, path: String, payload: Vec<u8>) {
            let _ = self.0.send((origin, path, payload));
        }
    }

    async fn free_port() -> u16 {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        l.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn send_reaches_remote_listener() {
        let port = free_port().await;
        let receiver = Arc::new(TcpTransport::new(NodeId::from("watch"), HashMap::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        receiver
            .add_inbound_listener(Arc::new(Forward(tx)))
            .await
            .unwrap();
        let serving = receiver.clone();
        tokio::spawn(async move { serving.serve(port).await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut peers = HashMap::new();
        peers.insert(
            NodeId::from("watch"),
            SocketAddr::from(([127, 0, 0, 1], port)),
        );
        let sender = TcpTransport::new(NodeId::from("phone"), peers);
        sender
            .send_bytes(&NodeId::from("watch"), "/message", b"{}".to_vec())
            .await
            .unwrap();

        let (origin, path, payload) = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(origin, NodeId::from("phone"));
        assert_eq!(path, "/message");
        assert_eq!(payload, b"{}");
    }

    async fn serve_forwarding(port: u16) -> mpsc::UnboundedReceiver<(NodeId, String, Vec<u8>)> {
        let receiver = Arc::new(TcpTransport::new(NodeId::from("watch"), HashMap::new()));
        let (tx, rx) = mpsc::unbounded_channel();
        receiver
            .add_inbound_listener(Arc::new(Forward(tx)))
            .await
            .unwrap();
        tokio::spawn(async move { receiver.serve(port).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        rx
    }

    #[tokio::test]
    async fn split_and_coalesced_frames_are_all_delivered() {
        let port = free_port().await;
        let mut rx = serve_forwarding(port).await;

        let frame = |origin: &str| {
            encode_frame(&Frame {
                origin: origin.into(),
                path: "/message".into(),
                payload: b"{}".to_vec(),
            })
            .unwrap()
        };
        let first = frame("w1");
        let mut rest = frame("w2");
        rest.extend_from_slice(&frame("w3"));

        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stream.write_all(&first[..3]).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        stream.write_all(&first[3..]).await.unwrap();
        stream.write_all(&rest).await.unwrap();
        stream.shutdown().await.unwrap();

        let mut origins = Vec::new();
        for _ in 0..3 {
            let (origin, _, _) = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
            origins.push(origin);
        }
        assert_eq!(
            origins,
            vec![NodeId::from("w1"), NodeId::from("w2"), NodeId::from("w3")]
        );
    }

    #[tokio::test]
    async fn oversized_header_closes_connection() {
        let port = free_port().await;
        let mut rx = serve_forwarding(port).await;

        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stream.write_all(&u32::MAX.to_le_bytes()).await.unwrap();
        let mut rest = [0u8; 1];
        let n = tokio::time::timeout(Duration::from_secs(2), stream.read(&mut rest))
            .await
            .unwrap()
            .unwrap_or(0);
        assert_eq!(n, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unknown_node_fails() {
        let t = TcpTransport::new(NodeId::from("phone"), HashMap::new());
        assert!(t
            .send_bytes(&NodeId::from("nobody"), "/message", vec![])
            .await
            .is_err());
    }
}
