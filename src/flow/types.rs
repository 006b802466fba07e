// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plaintext flow payload and response types

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::state_machine::DispatchError;

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Accept a string, number or boolean as text; `null` becomes empty
fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(de::Error::custom("expected a string or number")),
    }
}

/// Decrypted request body sent by the platform
///
/// `ping` probes carry neither `data` nor `flow_token`, so both default.
/// Numeric `flow_token` and `version` values are kept as text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecryptedPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    #[serde(default = "empty_object")]
    pub data: Value,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub version: String,
    pub action: String,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub flow_token: String,
}

impl DecryptedPayload {
    /// Check decrypted JSON against the payload shape
    ///
    /// The error names the problem (missing field, wrong type) but never
    /// echoes submitted values.
    pub fn from_value(value: Value) -> Result<Self, DispatchError> {
        serde_json::from_value(value).map_err(|e| {
            let message = e.to_string();
            let summary = match message.split_once(':') {
                Some((kind, _)) => kind.to_string(),
                None => message,
            };
            DispatchError::InvalidPayload(summary)
        })
    }

    pub fn flow_action(&self) -> FlowAction {
        FlowAction::from(self.action.as_str())
    }

    /// Names of the submitted fields, safe to log
    pub fn field_names(&self) -> Vec<&str> {
        match &self.data {
            Value::Object(map) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

/// Actions the platform can send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowAction {
    /// Health probe
    Ping,
    /// Flow opened; show the entry screen
    Init,
    /// A screen was submitted
    DataExchange,
    Other(String),
}

impl From<&str> for FlowAction {
    fn from(action: &str) -> Self {
        match action {
            "ping" => FlowAction::Ping,
            "INIT" => FlowAction::Init,
            "data_exchange" => FlowAction::DataExchange,
            other => FlowAction::Other(other.to_string()),
        }
    }
}

/// Plaintext response, encrypted before it leaves the gateway
///
/// `screen` is omitted for the ping health response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    #[serde(default = "empty_object")]
    pub data: Value,
}

impl ScreenResponse {
    pub fn screen(screen: impl Into<String>, data: Value) -> Self {
        Self {
            screen: Some(screen.into()),
            data,
        }
    }

    pub fn data_only(data: Value) -> Self {
        Self { screen: None, data }
    }
}
