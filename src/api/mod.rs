// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod dispatcher;
pub mod errors;
pub mod http_server;

pub use dispatcher::Dispatcher;
pub use errors::{GatewayError, STATUS_DECRYPTION_FAILED, STATUS_SIGNATURE_INVALID};
pub use http_server::{create_app, start_server, AppState, HealthResponse};
