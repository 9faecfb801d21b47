//! Wearlink envelope: an object value tree with reserved addressing fields.

use crate::node::NodeId;
use crate::value::{Map, Value};

/// Default channel path messages travel on.
pub const MESSAGE_PATH: &str = "/message";

/// Reserved key: `{ "id": <node id> }`. Absent means broadcast.
pub const TARGET_KEY: &str = "target";
/// Reserved key inside `target`.
pub const TARGET_ID_KEY: &str = "id";
/// Reserved key: message kind. `"command"` marks a local-action message.
pub const MESSAGE_TYPE_KEY: &str = "messageType";
/// `messageType` value for local commands.
pub const COMMAND_TYPE: &str = "command";
/// Directive key read from command envelopes.
pub const PLAY_KEY: &str = "play";

/// Message envelope. Positional identity only; unknown fields pass through untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Envelope {
    body: Map,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(body: Map) -> Self {
        Self { body }
    }

    /// Envelope addressed to a single node.
    pub fn targeted(target: &NodeId, mut body: Map) -> Self {
        let mut t = Map::new();
        t.insert(TARGET_ID_KEY.to_owned(), Value::from(target.as_str()));
        body.insert(TARGET_KEY.to_owned(), Value::Object(t));
        Self { body }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.body.insert(key.to_owned(), value.into());
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) -> Option<Value> {
        self.body.insert(key.to_owned(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn body(&self) -> &Map {
        &self.body
    }

    pub fn into_map(self) -> Map {
        self.body
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.body)
    }

    /// `target.id`, when present and a string.
    pub fn target_id(&self) -> Option<NodeId> {
        self.body
            .get(TARGET_KEY)
            .and_then(|t| t.get(TARGET_ID_KEY))
            .and_then(Value::as_str)
            .map(NodeId::from)
    }

    pub fn message_type(&self) -> Option<&str> {
        self.body.get(MESSAGE_TYPE_KEY).and_then(Value::as_str)
    }

    pub fn is_command(&self) -> bool {
        self.message_type() == Some(COMMAND_TYPE)
    }

    /// Directive carried by a command envelope. A non-bool `play` reads as absent.
    pub fn directive(&self) -> CommandDirective {
        CommandDirective {
            play: self.body.get(PLAY_KEY).and_then(Value::as_bool),
        }
    }
}

impl From<Map> for Envelope {
    fn from(body: Map) -> Self {
        Self { body }
    }
}

/// Action requested by a local command. `play: None` leaves the choice to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandDirective {
    pub play: Option<bool>,
}
