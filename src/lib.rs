// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod flow;
pub mod version;

pub use api::{create_app, AppState, Dispatcher, GatewayError};
pub use config::{ConfigError, GatewayConfig, KeyMaterial};
pub use crypto::{decrypt_request, encrypt_response, EnvelopeCodec, EnvelopeError, SignatureGate};
pub use flow::{DecryptedPayload, FlowStateMachine, ScreenRegistry, ScreenResponse};
