// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Flow state machine
//!
//! Three linear states keyed by `(action, screen)`:
//!
//! ```text
//! INIT ──► entry ──data_exchange──► intermediate ──data_exchange──► SUCCESS
//! ```
//!
//! `ping` is answered from any state. Nothing is remembered between requests;
//! the platform round-trips `flow_token` to correlate the steps.

use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

use super::screens::ScreenRegistry;
use super::types::{DecryptedPayload, FlowAction, ScreenResponse};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unhandled screen: {0}")]
    UnhandledScreen(String),
    #[error("Missing required field '{field}' on screen '{screen}'")]
    MissingField { screen: String, field: String },
    #[error("No response generated for action '{0}'")]
    EmptyResponse(String),
    #[error("Decrypted payload has the wrong shape: {0}")]
    InvalidPayload(String),
}

/// Validated entry-screen submission, handed to a [`super::SubmissionSink`]
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub flow_token: String,
    pub screen: String,
    /// Required fields only, in registry order
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct FlowStateMachine {
    screens: Arc<ScreenRegistry>,
}

impl FlowStateMachine {
    pub fn new(screens: ScreenRegistry) -> Self {
        Self {
            screens: Arc::new(screens),
        }
    }

    pub fn screens(&self) -> &ScreenRegistry {
        &self.screens
    }

    /// Map a decrypted payload to its plaintext response
    pub fn dispatch(&self, payload: &DecryptedPayload) -> Result<ScreenResponse, DispatchError> {
        match payload.flow_action() {
            FlowAction::Ping => Ok(ScreenResponse::data_only(serde_json::json!({
                "status": "active"
            }))),
            FlowAction::Init => Ok(self.screens.entry.to_response()),
            FlowAction::DataExchange => self.data_exchange(payload),
            FlowAction::Other(action) => Err(DispatchError::EmptyResponse(action)),
        }
    }

    /// Required fields of an entry-screen submission, if `payload` is one
    ///
    /// Returns `None` for every other payload, including entry submissions
    /// that fail validation.
    pub fn submission(&self, payload: &DecryptedPayload) -> Option<Submission> {
        if payload.flow_action() != FlowAction::DataExchange {
            return None;
        }
        let screen = payload.screen.as_deref()?;
        if !self.screens.is_entry(screen) {
            return None;
        }
        let fields = self.required_fields(screen, &payload.data).ok()?;

        Some(Submission {
            flow_token: payload.flow_token.clone(),
            screen: screen.to_string(),
            fields,
        })
    }

    fn data_exchange(&self, payload: &DecryptedPayload) -> Result<ScreenResponse, DispatchError> {
        let screen = payload
            .screen
            .as_deref()
            .ok_or_else(|| DispatchError::UnhandledScreen("<none>".to_string()))?;

        if self.screens.is_entry(screen) {
            self.required_fields(screen, &payload.data)?;
            return Ok(self.screens.intermediate.to_response());
        }

        if self.screens.is_intermediate(screen) {
            return Ok(self.success_response(&payload.flow_token));
        }

        Err(DispatchError::UnhandledScreen(screen.to_string()))
    }

    fn required_fields(
        &self,
        screen: &str,
        data: &Value,
    ) -> Result<Map<String, Value>, DispatchError> {
        let mut fields = Map::new();
        for name in &self.screens.required_fields {
            let value = data.get(name).filter(|v| is_present(v)).ok_or_else(|| {
                DispatchError::MissingField {
                    screen: screen.to_string(),
                    field: name.clone(),
                }
            })?;
            fields.insert(name.clone(), value.clone());
        }
        Ok(fields)
    }

    fn success_response(&self, flow_token: &str) -> ScreenResponse {
        let mut response = self.screens.success.to_response();

        if !response.data.is_object() {
            response.data = Value::Object(Map::new());
        }
        let data = &mut response.data;
        if !data["extension_message_response"].is_object() {
            data["extension_message_response"] = Value::Object(Map::new());
        }
        let extension = &mut data["extension_message_response"];
        if !extension["params"].is_object() {
            extension["params"] = Value::Object(Map::new());
        }
        extension["params"]["flow_token"] = Value::String(flow_token.to_string());

        response
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}
