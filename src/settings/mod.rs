//! Node settings carrier.
//!
//! [`NodeSettings`] is the persistence-boundary representation of a node's
//! configuration: a plain JSON object with typed, defaulted getters. Node
//! implementations do not poke at it directly; each node type declares a
//! typed serde config struct and converts at the boundary via
//! [`NodeSettings::decode`] / [`NodeSettings::encode`], so defaults live in
//! the struct definition rather than in runtime type-sniffing.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::NodeError;

/// JSON-backed key/value settings for one node instance.
///
/// Everything stored here must survive a JSON round trip: a node's
/// `save_settings` output is reloaded by `load_settings` in a later process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSettings {
    entries: Map<String, Value>,
}

impl NodeSettings {
    pub fn new() -> Self {
        NodeSettings::default()
    }

    /// Wrap a raw JSON value. Non-object values yield empty settings.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(entries) => NodeSettings { entries },
            _ => NodeSettings::default(),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.entries.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.entries
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    pub fn get_number(&self, key: &str, default: f64) -> f64 {
        self.entries
            .get(key)
            .and_then(Value::as_f64)
            .unwrap_or(default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.entries
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    /// Deserialize the whole settings object into a typed config struct.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, NodeError> {
        serde_json::from_value(self.to_value())
            .map_err(|e| NodeError::Validation(e.to_string()))
    }

    /// Serialize a typed config struct into settings.
    pub fn encode<T: Serialize>(config: &T) -> Result<Self, NodeError> {
        Ok(NodeSettings::from_value(serde_json::to_value(config)?))
    }
}
