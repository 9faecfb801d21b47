//! Node identity: opaque node id, display name, proximity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::{Map, Value};

/// Opaque node identifier, stable per install and device pairing.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

/// A discovered endpoint. The local node carries no proximity flag.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub display_name: String,
    pub is_nearby: Option<bool>,
}

impl Node {
    /// Local node descriptor.
    pub fn local(id: impl Into<NodeId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            is_nearby: None,
        }
    }

    /// Connected peer descriptor.
    pub fn peer(id: impl Into<NodeId>, display_name: impl Into<String>, is_nearby: bool) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            is_nearby: Some(is_nearby),
        }
    }

    /// Application-facing form: `{id, name, isNearby?}`.
    pub fn to_value(&self) -> Value {
        let mut m = Map::new();
        m.insert("id".into(), Value::from(self.id.as_str()));
        m.insert("name".into(), Value::from(self.display_name.as_str()));
        if let Some(nearby) = self.is_nearby {
            m.insert("isNearby".into(), Value::Bool(nearby));
        }
        Value::Object(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_node_has_no_proximity_field() {
        let v = Node::local("me", "Phone").to_value();
        assert_eq!(v.get("id").and_then(Value::as_str), Some("me"));
        assert_eq!(v.get("name").and_then(Value::as_str), Some("Phone"));
        assert!(v.get("isNearby").is_none());
    }

    #[test]
    fn peer_node_reports_proximity() {
        let v = Node::peer("w1", "Watch", true).to_value();
        assert_eq!(v.get("isNearby").and_then(Value::as_bool), Some(true));
    }
}
