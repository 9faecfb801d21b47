//! Relay engine: one long-lived service object owning the directory, event bridge,
//! listener lifecycle and launch orchestrator. Cheap to clone; clones share state.

use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::bridge::{EventBridge, EventSink, SubscribeError};
use crate::config::EngineConfig;
use crate::directory::{DirectorySnapshot, NodeDirectory, SnapshotError};
use crate::error::{RelayError, SendFailed, SendReport};
use crate::host::{
    CommandHandler, CompanionService, Discovery, DiscoveryError, InboundListener, RemoteLauncher,
    Transport,
};
use crate::launch::{LaunchOrchestrator, LaunchOutcome};
use crate::lifecycle::{Activation, ListenerLifecycle, ListenerState};
use crate::node::{Node, NodeId};
use crate::protocol::{CommandDirective, Envelope};
use crate::routing::{self, Inbound};
use crate::wire;

/// What happened to one inbound payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Arrived on a path other than the message path.
    IgnoredPath,
    /// Payload did not decode; dropped.
    Malformed,
    /// Addressed to another node; dropped.
    RoutingMiss,
    /// Handed to the command handler.
    LocalCommand(CommandDirective),
    /// Command arrived with no companion service registered; dropped.
    NoCompanionService,
    /// Delivered to the event subscriber.
    Forwarded,
    /// Would have been forwarded but nobody is subscribed; dropped.
    NoSubscriber,
}

struct Inner {
    config: EngineConfig,
    transport: Arc<dyn Transport>,
    directory: NodeDirectory,
    bridge: EventBridge,
    lifecycle: ListenerLifecycle,
    launcher: LaunchOrchestrator,
    commands: Arc<dyn CommandHandler>,
    service: Mutex<Option<CompanionService>>,
}

#[derive(Clone)]
pub struct RelayEngine {
    inner: Arc<Inner>,
}

impl RelayEngine {
    pub fn new(
        config: EngineConfig,
        transport: Arc<dyn Transport>,
        discovery: Arc<dyn Discovery>,
        launcher: Arc<dyn RemoteLauncher>,
        commands: Arc<dyn CommandHandler>,
    ) -> Self {
        let store_uri = config.store_uri();
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                directory: NodeDirectory::new(discovery),
                bridge: EventBridge::new(),
                lifecycle: ListenerLifecycle::new(),
                launcher: LaunchOrchestrator::new(launcher, store_uri),
                commands,
                service: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn listener_state(&self) -> ListenerState {
        self.inner.lifecycle.listener_state()
    }

    pub fn is_attached(&self) -> bool {
        self.inner.lifecycle.is_attached()
    }

    pub fn cached_local_id(&self) -> Option<NodeId> {
        self.inner.directory.cached_local_id()
    }

    /// Application context attached. Registers the transport listener on the first call
    /// only, then warms the local id cache (failure there is logged, not returned).
    pub async fn attach(&self) -> Result<(), RelayError> {
        if self.inner.lifecycle.activate() == Activation::Register {
            let listener = Arc::new(EngineListener {
                inner: Arc::downgrade(&self.inner),
            });
            if let Err(e) = self.inner.transport.add_inbound_listener(listener).await {
                error!(error = %e, "failed to register inbound listener");
                self.inner.lifecycle.registration_failed();
                return Err(e.into());
            }
            info!("inbound listener registered");
        } else {
            debug!("inbound listener already registered");
        }
        if let Err(e) = self.inner.directory.resolve_local_id().await {
            warn!(error = %e, "local node id not resolved on attach");
        }
        info!("attached");
        Ok(())
    }

    /// Application context detached. The listener keeps running so local commands still
    /// reach the companion service.
    pub fn detach(&self) {
        self.inner.lifecycle.deactivate();
        info!("detached");
    }

    /// Permanent teardown: drops the subscriber and removes the transport listener.
    pub async fn teardown(&self) -> Result<(), RelayError> {
        self.inner.bridge.unsubscribe();
        if self.inner.lifecycle.teardown() {
            if let Err(e) = self.inner.transport.remove_inbound_listener().await {
                error!(error = %e, "failed to remove inbound listener");
                self.inner.lifecycle.teardown_failed();
                return Err(e.into());
            }
            info!("inbound listener removed");
        }
        Ok(())
    }

    pub fn subscribe(&self, sink: Arc<dyn EventSink>) -> Result<(), SubscribeError> {
        self.inner.bridge.subscribe(sink)
    }

    /// Stop delivering events. An inbound message already being published when this is
    /// called may still reach the old sink once.
    pub fn unsubscribe(&self) {
        self.inner.bridge.unsubscribe()
    }

    /// Register the service woken by local commands.
    pub fn set_companion_service(&self, package_name: &str, class_name: &str) {
        let service = CompanionService {
            package_name: package_name.to_owned(),
            class_name: class_name.to_owned(),
        };
        debug!(package = package_name, class = class_name, "companion service set");
        match self.inner.service.lock() {
            Ok(mut g) => *g = Some(service),
            Err(poisoned) => *poisoned.into_inner() = Some(service),
        }
    }

    pub fn companion_service(&self) -> Option<CompanionService> {
        self.inner.service.lock().ok().and_then(|g| g.clone())
    }

    /// Send to the target peer, or broadcast when the envelope has no target. Deliveries
    /// run concurrently; a peer failing never affects the others.
    pub async fn send(&self, envelope: &Envelope) -> Result<SendReport, RelayError> {
        let payload = wire::encode_envelope(envelope)?;
        let connected = self.inner.directory.list_connected().await?;
        let targets = routing::resolve_targets(envelope, &connected);
        if targets.is_empty() {
            match envelope.target_id() {
                Some(target) => warn!(node = %target, "target node not connected, nothing sent"),
                None => warn!("no connected nodes available to send message"),
            }
            return Ok(SendReport::default());
        }
        let path = self.inner.config.message_path.as_str();
        let transport = &self.inner.transport;
        let sends = targets.into_iter().map(|peer| {
            let payload = payload.clone();
            async move {
                let result = transport.send_bytes(&peer, path, payload).await;
                match &result {
                    Ok(()) => debug!(peer = %peer, "message sent"),
                    Err(e) => error!(peer = %peer, error = %e, "failed to send message"),
                }
                (peer, result)
            }
        });
        let mut report = SendReport::default();
        for (peer, result) in futures::future::join_all(sends).await {
            match result {
                Ok(()) => report.delivered.push(peer),
                Err(e) => report.failed.push(SendFailed {
                    peer,
                    reason: e.0,
                }),
            }
        }
        Ok(report)
    }

    /// Peers connected right now. Refreshes the cached local id as part of the same query;
    /// fails if either half fails.
    pub async fn connected_devices(&self) -> Result<Vec<Node>, SnapshotError> {
        self.inner.directory.snapshot().await.map(|s| s.peers)
    }

    pub async fn directory_snapshot(&self) -> Result<DirectorySnapshot, SnapshotError> {
        self.inner.directory.snapshot().await
    }

    pub async fn local_node(&self) -> Result<Node, DiscoveryError> {
        self.inner.directory.resolve_local().await
    }

    pub async fn launch_companion(&self, uri: &str) -> LaunchOutcome {
        self.inner.launcher.launch(uri).await
    }

    /// Route one inbound payload: local command, dropped miss, or event for the subscriber.
    pub async fn handle_inbound(
        &self,
        origin: &NodeId,
        path: &str,
        payload: &[u8],
    ) -> InboundOutcome {
        if path != self.inner.config.message_path {
            debug!(origin = %origin, path, "ignoring message on unknown path");
            return InboundOutcome::IgnoredPath;
        }
        let envelope = match wire::decode_envelope(payload) {
            Ok(env) => env,
            Err(e) => {
                error!(origin = %origin, error = %e, "failed to parse received message");
                return InboundOutcome::Malformed;
            }
        };
        let mut local_id = self.inner.directory.cached_local_id();
        if local_id.is_none() && envelope.target_id().is_some() {
            local_id = self.inner.directory.resolve_local_id().await.ok();
        }
        let attached = self.inner.lifecycle.is_attached();
        debug!(origin = %origin, attached, "message received");
        match routing::classify(&envelope, local_id.as_ref(), attached) {
            Inbound::RoutingMiss { target } => {
                debug!(origin = %origin, node = %target, "message for another node dropped");
                InboundOutcome::RoutingMiss
            }
            Inbound::LocalCommand(directive) => self.run_local_command(directive).await,
            Inbound::Forward => {
                if self.inner.bridge.publish(envelope) {
                    InboundOutcome::Forwarded
                } else {
                    InboundOutcome::NoSubscriber
                }
            }
        }
    }

    async fn run_local_command(&self, directive: CommandDirective) -> InboundOutcome {
        let Some(service) = self.companion_service() else {
            debug!("local command with no companion service registered");
            return InboundOutcome::NoCompanionService;
        };
        info!(
            package = %service.package_name,
            class = %service.class_name,
            play = ?directive.play,
            "waking companion service"
        );
        self.inner.commands.on_command(&service, directive).await;
        InboundOutcome::LocalCommand(directive)
    }
}

/// Transport-facing listener. Holds the engine weakly so the transport does not keep it alive.
struct EngineListener {
    inner: Weak<Inner>,
}

#[async_trait]
impl InboundListener for EngineListener {
    async fn on_message(&self, origin: NodeId, path: String, payload: Vec<u8>) {
        let Some(inner) = self.inner.upgrade() else {
            debug!("engine gone, dropping inbound message");
            return;
        };
        RelayEngine { inner }
            .handle_inbound(&origin, &path, &payload)
            .await;
    }
}
