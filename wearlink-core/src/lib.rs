//! Wearlink message relay between a primary device and its companions.
//! Host-supplied transport, discovery and launcher; the engine routes, filters and
//! tracks listener lifecycle.

pub mod bridge;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod host;
pub mod launch;
pub mod lifecycle;
pub mod methods;
pub mod node;
pub mod protocol;
pub mod routing;
pub mod value;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::{EventBridge, EventSink, SubscribeError};
pub use config::EngineConfig;
pub use directory::{DirectorySnapshot, NodeDirectory, SnapshotError};
pub use engine::{InboundOutcome, RelayEngine};
pub use error::{RelayError, SendFailed, SendReport};
pub use host::{
    CommandHandler, CompanionService, Discovery, DiscoveryError, InboundListener, LaunchError,
    RemoteLauncher, Transport, TransportError,
};
pub use launch::{LaunchOrchestrator, LaunchOutcome};
pub use lifecycle::{ListenerLifecycle, ListenerState};
pub use methods::{dispatch, MethodCall, MethodResult};
pub use node::{Node, NodeId};
pub use protocol::{CommandDirective, Envelope, MESSAGE_PATH};
pub use value::{Map, Value};
pub use wire::{decode_envelope, encode_envelope, DecodeError, EncodeError, MAX_PAYLOAD_LEN};
