//! Application-facing request/response surface: calls by method name with JSON-like
//! arguments, dispatched onto the engine.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::directory::SnapshotError;
use crate::engine::RelayEngine;
use crate::error::RelayError;
use crate::launch::LaunchOutcome;
use crate::node::Node;
use crate::protocol::Envelope;
use crate::value::{Map, Value};

pub const SET_PACKAGE_NAME_CLASS_NAME: &str = "setPackageNameClassName";
pub const LAUNCH_COMPANION_APP: &str = "launchCompanionApp";
pub const SEND_MESSAGE: &str = "sendMessage";
pub const GET_CONNECTED_DEVICES: &str = "getConnectedDevices";
pub const GET_LOCAL_DEVICE: &str = "getLocalDevice";

/// Error codes reported to the application.
pub mod codes {
    pub const INVALID_ARGUMENTS: &str = "INVALID_ARGUMENTS";
    pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
    pub const PLAY_STORE_FAIL: &str = "PLAY_STORE_FAIL";
    pub const GET_LOCAL_NODE_FAILED: &str = "GET_LOCAL_NODE_FAILED";
    pub const GET_CONNECTED_FAILED: &str = "GET_CONNECTED_FAILED";
    pub const MESSAGE_TOO_LARGE: &str = "MESSAGE_TOO_LARGE";
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: &str, arguments: impl Into<Value>) -> Self {
        Self {
            method: method.to_owned(),
            arguments: arguments.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MethodResult {
    Success(Value),
    Error { code: String, message: String },
    NotImplemented,
}

impl MethodResult {
    fn error(code: &str, message: impl Into<String>) -> Self {
        MethodResult::Error {
            code: code.to_owned(),
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MethodResult::Success(_))
    }
}

/// Run one call against `engine`.
pub async fn dispatch(engine: &RelayEngine, call: MethodCall) -> MethodResult {
    debug!(method = %call.method, "method call");
    match call.method.as_str() {
        SET_PACKAGE_NAME_CLASS_NAME => set_package_name_class_name(engine, &call.arguments),
        LAUNCH_COMPANION_APP => match call.arguments.as_str() {
            Some(uri) => launch_companion_app(engine, uri).await,
            None => MethodResult::error(codes::INVALID_ARGUMENT, "uri is not a string"),
        },
        SEND_MESSAGE => match call.arguments {
            Value::Object(map) => send_message(engine, map).await,
            _ => MethodResult::error(codes::INVALID_ARGUMENT, "message is not an object"),
        },
        GET_CONNECTED_DEVICES => get_connected_devices(engine).await,
        GET_LOCAL_DEVICE => match engine.local_node().await {
            Ok(node) => MethodResult::Success(node.to_value()),
            Err(e) => MethodResult::error(codes::GET_LOCAL_NODE_FAILED, e.0),
        },
        _ => MethodResult::NotImplemented,
    }
}

fn set_package_name_class_name(engine: &RelayEngine, args: &Value) -> MethodResult {
    let pkg = args.get("packageName").and_then(Value::as_str);
    let cls = args.get("className").and_then(Value::as_str);
    match (pkg, cls) {
        (Some(pkg), Some(cls)) => {
            engine.set_companion_service(pkg, cls);
            MethodResult::Success(Value::Null)
        }
        _ => MethodResult::error(codes::INVALID_ARGUMENTS, "missing packageName or className"),
    }
}

async fn launch_companion_app(engine: &RelayEngine, uri: &str) -> MethodResult {
    match engine.launch_companion(uri).await {
        LaunchOutcome::Launched => MethodResult::Success(Value::Bool(true)),
        LaunchOutcome::FellBackToStore => MethodResult::Success(Value::Bool(false)),
        LaunchOutcome::Failed(reason) => MethodResult::error(codes::PLAY_STORE_FAIL, reason),
    }
}

/// Fire-and-forget from the caller's view: discovery and per-peer failures are logged and
/// the call still acknowledges. Only an unencodable message is reported back.
async fn send_message(engine: &RelayEngine, map: Map) -> MethodResult {
    match engine.send(&Envelope::from_map(map)).await {
        Ok(report) => {
            if !report.all_delivered() {
                warn!(failed = report.failed.len(), "message not delivered to every peer");
            }
            MethodResult::Success(Value::Null)
        }
        Err(RelayError::Encode(e)) => MethodResult::error(codes::MESSAGE_TOO_LARGE, e.to_string()),
        Err(e) => {
            warn!(error = %e, "message not sent");
            MethodResult::Success(Value::Null)
        }
    }
}

async fn get_connected_devices(engine: &RelayEngine) -> MethodResult {
    match engine.connected_devices().await {
        Ok(peers) => MethodResult::Success(Value::Array(peers.iter().map(Node::to_value).collect())),
        Err(SnapshotError::LocalNode(e)) => {
            MethodResult::error(codes::GET_LOCAL_NODE_FAILED, e.0)
        }
        Err(SnapshotError::ConnectedNodes(e)) => {
            MethodResult::error(codes::GET_CONNECTED_FAILED, e.0)
        }
    }
}
