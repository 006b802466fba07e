// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Screen template registry
//!
//! Response content for the three flow states lives here as data. The state
//! machine only decides *which* template to send.
//!
//! A registry can be loaded from JSON:
//!
//! ```json
//! {
//!   "entry":        { "screen": "REGISTER", "data": {} },
//!   "intermediate": { "screen": "CONFIRM",  "data": {} },
//!   "success":      { "screen": "SUCCESS",  "data": { "extension_message_response": { "params": {} } } },
//!   "required_fields": ["name", "email"]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::Path;
use thiserror::Error;

use super::types::ScreenResponse;

/// Errors raised while loading a screen registry
#[derive(Error, Debug)]
pub enum ScreenRegistryError {
    #[error("Failed to read screen registry {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid screen registry JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid screen registry: {0}")]
    Invalid(String),
}

/// A named screen and the data sent with it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenTemplate {
    pub screen: String,
    #[serde(default = "empty_object")]
    pub data: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl ScreenTemplate {
    pub fn new(screen: impl Into<String>, data: Value) -> Self {
        Self {
            screen: screen.into(),
            data,
        }
    }

    pub fn to_response(&self) -> ScreenResponse {
        ScreenResponse::screen(self.screen.clone(), self.data.clone())
    }
}

/// Templates for the entry, intermediate and success screens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenRegistry {
    pub entry: ScreenTemplate,
    pub intermediate: ScreenTemplate,
    pub success: ScreenTemplate,
    /// Fields the entry screen must submit
    #[serde(default)]
    pub required_fields: Vec<String>,
}

impl ScreenRegistry {
    pub fn new(
        entry: ScreenTemplate,
        intermediate: ScreenTemplate,
        success: ScreenTemplate,
        required_fields: Vec<String>,
    ) -> Self {
        Self {
            entry,
            intermediate,
            success,
            required_fields,
        }
    }

    /// Load and validate a registry from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ScreenRegistryError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ScreenRegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, ScreenRegistryError> {
        let registry: Self = serde_json::from_str(json)?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn validate(&self) -> Result<(), ScreenRegistryError> {
        for template in [&self.entry, &self.intermediate, &self.success] {
            if template.screen.trim().is_empty() {
                return Err(ScreenRegistryError::Invalid(
                    "screen identifiers must not be empty".to_string(),
                ));
            }
            if !template.data.is_object() {
                return Err(ScreenRegistryError::Invalid(format!(
                    "data for screen '{}' must be a JSON object",
                    template.screen
                )));
            }
        }
        if self.entry.screen == self.intermediate.screen {
            return Err(ScreenRegistryError::Invalid(format!(
                "entry and intermediate screens must differ (both '{}')",
                self.entry.screen
            )));
        }
        Ok(())
    }

    pub fn is_entry(&self, screen: &str) -> bool {
        self.entry.screen == screen
    }

    pub fn is_intermediate(&self, screen: &str) -> bool {
        self.intermediate.screen == screen
    }
}

impl Default for ScreenRegistry {
    /// Registration flow: details form, confirmation screen, success
    fn default() -> Self {
        Self {
            entry: ScreenTemplate::new("screen_lmaspf", json!({})),
            intermediate: ScreenTemplate::new(
                "screen_cnktoz",
                json!({
                    "screen_0_Full_name_0": "Example",
                    "screen_0_Email_address_1": "Example"
                }),
            ),
            success: ScreenTemplate::new(
                "SUCCESS",
                json!({
                    "extension_message_response": {
                        "params": {}
                    }
                }),
            ),
            required_fields: vec![
                "screen_0_Full_name_0".to_string(),
                "screen_0_Email_address_1".to_string(),
            ],
        }
    }
}
