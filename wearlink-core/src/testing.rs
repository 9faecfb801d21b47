//! In-memory collaborators for tests.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::bridge::EventSink;
use crate::host::{
    CommandHandler, CompanionService, Discovery, DiscoveryError, InboundListener, LaunchError,
    RemoteLauncher, Transport, TransportError,
};
use crate::node::{Node, NodeId};
use crate::protocol::{CommandDirective, Envelope};

struct DiscoveryState {
    local: Node,
    peers: Vec<Node>,
    fail_local: bool,
    fail_connected: bool,
}

pub struct FakeDiscovery {
    state: Mutex<DiscoveryState>,
}

impl FakeDiscovery {
    pub fn new(local_id: &str, peers: Vec<Node>) -> Self {
        Self {
            state: Mutex::new(DiscoveryState {
                local: Node::local(local_id, "This device"),
                peers,
                fail_local: false,
                fail_connected: false,
            }),
        }
    }

    pub fn set_peers(&self, peers: Vec<Node>) {
        self.state.lock().unwrap().peers = peers;
    }

    pub fn fail_local(&self, fail: bool) {
        self.state.lock().unwrap().fail_local = fail;
    }

    pub fn fail_connected(&self, fail: bool) {
        self.state.lock().unwrap().fail_connected = fail;
    }
}

#[async_trait]
impl Discovery for FakeDiscovery {
    async fn local_node(&self) -> Result<Node, DiscoveryError> {
        let s = self.state.lock().unwrap();
        if s.fail_local {
            return Err(DiscoveryError("local node unavailable".into()));
        }
        Ok(s.local.clone())
    }

    async fn connected_nodes(&self) -> Result<Vec<Node>, DiscoveryError> {
        let s = self.state.lock().unwrap();
        if s.fail_connected {
            return Err(DiscoveryError("node service unavailable".into()));
        }
        Ok(s.peers.clone())
    }
}

#[derive(Default)]
pub struct FakeTransport {
    sent: Mutex<Vec<(NodeId, String, Vec<u8>)>>,
    failing: Mutex<HashSet<NodeId>>,
    listener: Mutex<Option<Arc<dyn InboundListener>>>,
    adds: Mutex<usize>,
    removes: Mutex<usize>,
    fail_add: Mutex<bool>,
    fail_remove: Mutex<bool>,
}

impl FakeTransport {
    pub fn fail_for(&self, node: &str) {
        self.failing.lock().unwrap().insert(NodeId::from(node));
    }

    pub fn fail_add(&self, fail: bool) {
        *self.fail_add.lock().unwrap() = fail;
    }

    pub fn fail_remove(&self, fail: bool) {
        *self.fail_remove.lock().unwrap() = fail;
    }

    pub fn sent(&self) -> Vec<(NodeId, String, Vec<u8>)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.sent().into_iter().map(|(id, _, _)| id).collect();
        ids.sort();
        ids
    }

    pub fn listener_adds(&self) -> usize {
        *self.adds.lock().unwrap()
    }

    pub fn listener_removes(&self) -> usize {
        *self.removes.lock().unwrap()
    }

    pub fn has_listener(&self) -> bool {
        self.listener.lock().unwrap().is_some()
    }

    /// Deliver an inbound payload to the registered listener, if any.
    pub async fn deliver(&self, origin: &str, path: &str, payload: Vec<u8>) -> bool {
        let listener = self.listener.lock().unwrap().clone();
        match listener {
            Some(l) => {
                l.on_message(NodeId::from(origin), path.to_owned(), payload).await;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send_bytes(
        &self,
        node: &NodeId,
        path: &str,
        payload: Vec<u8>,
    ) -> Result<(), TransportError> {
        if self.failing.lock().unwrap().contains(node) {
            return Err(TransportError(format!("{node} unreachable")));
        }
        self.sent
            .lock()
            .unwrap()
            .push((node.clone(), path.to_owned(), payload));
        Ok(())
    }

    async fn add_inbound_listener(
        &self,
        listener: Arc<dyn InboundListener>,
    ) -> Result<(), TransportError> {
        if *self.fail_add.lock().unwrap() {
            return Err(TransportError("listener rejected".into()));
        }
        *self.adds.lock().unwrap() += 1;
        *self.listener.lock().unwrap() = Some(listener);
        Ok(())
    }

    async fn remove_inbound_listener(&self) -> Result<(), TransportError> {
        if *self.fail_remove.lock().unwrap() {
            return Err(TransportError("listener removal rejected".into()));
        }
        *self.removes.lock().unwrap() += 1;
        *self.listener.lock().unwrap() = None;
        Ok(())
    }
}

/// Launcher that succeeds or fails per call in script order; extra calls fail.
pub struct ScriptedLauncher {
    script: Mutex<VecDeque<bool>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedLauncher {
    pub fn new(script: &[bool]) -> Self {
        Self {
            script: Mutex::new(script.iter().copied().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteLauncher for ScriptedLauncher {
    async fn start_remote(&self, uri: &str) -> Result<(), LaunchError> {
        self.calls.lock().unwrap().push(uri.to_owned());
        match self.script.lock().unwrap().pop_front() {
            Some(true) => Ok(()),
            _ => Err(LaunchError(format!("cannot open {uri}"))),
        }
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Envelope>>,
}

impl RecordingSink {
    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn events(&self) -> Vec<Envelope> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn on_event(&self, envelope: Envelope) {
        self.events.lock().unwrap().push(envelope);
    }
}

#[derive(Default)]
pub struct RecordingCommands {
    commands: Mutex<Vec<(CompanionService, CommandDirective)>>,
}

impl RecordingCommands {
    pub fn commands(&self) -> Vec<(CompanionService, CommandDirective)> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandHandler for RecordingCommands {
    async fn on_command(&self, service: &CompanionService, directive: CommandDirective) {
        self.commands
            .lock()
            .unwrap()
            .push((service.clone(), directive));
    }
}
