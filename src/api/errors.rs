// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use crate::crypto::EnvelopeError;
use crate::flow::DispatchError;

/// Status the platform reads as "invalid signature"
pub const STATUS_SIGNATURE_INVALID: u16 = 432;

/// Status the platform reads as "refresh the public key"
pub const STATUS_DECRYPTION_FAILED: u16 = 421;

/// Outcome of a failed flow request
///
/// Only this type knows about transport status codes. Responses never carry
/// a body, so internals do not leak to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayError {
    SignatureInvalid,
    InvalidEnvelope(String),
    DecryptionFailed(EnvelopeError),
    InvalidPayload(String),
    UnhandledScreen(String),
    MissingField { screen: String, field: String },
    EmptyResponse(String),
    EncodingFailed(EnvelopeError),
}

impl GatewayError {
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::SignatureInvalid => STATUS_SIGNATURE_INVALID,
            GatewayError::DecryptionFailed(_) => STATUS_DECRYPTION_FAILED,
            GatewayError::InvalidEnvelope(_)
            | GatewayError::InvalidPayload(_)
            | GatewayError::UnhandledScreen(_)
            | GatewayError::MissingField { .. }
            | GatewayError::EmptyResponse(_)
            | GatewayError::EncodingFailed(_) => 500,
        }
    }

    /// Short tag for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::SignatureInvalid => "signature_invalid",
            GatewayError::InvalidEnvelope(_) => "invalid_envelope",
            GatewayError::DecryptionFailed(_) => "decryption_failed",
            GatewayError::InvalidPayload(_) => "invalid_payload",
            GatewayError::UnhandledScreen(_) => "unhandled_screen",
            GatewayError::MissingField { .. } => "missing_field",
            GatewayError::EmptyResponse(_) => "empty_response",
            GatewayError::EncodingFailed(_) => "encoding_failed",
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::SignatureInvalid => write!(f, "Request signature is invalid"),
            GatewayError::InvalidEnvelope(msg) => write!(f, "Invalid envelope: {}", msg),
            GatewayError::DecryptionFailed(err) => {
                write!(f, "Failed to decrypt the request: {}", err)
            }
            GatewayError::InvalidPayload(msg) => write!(f, "Invalid payload: {}", msg),
            GatewayError::UnhandledScreen(screen) => write!(f, "Unhandled screen: {}", screen),
            GatewayError::MissingField { screen, field } => write!(
                f,
                "Missing required field '{}' on screen '{}'",
                field, screen
            ),
            GatewayError::EmptyResponse(action) => {
                write!(f, "No response generated for action '{}'", action)
            }
            GatewayError::EncodingFailed(err) => write!(f, "Encoding failed: {}", err),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<DispatchError> for GatewayError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::UnhandledScreen(screen) => GatewayError::UnhandledScreen(screen),
            DispatchError::MissingField { screen, field } => {
                GatewayError::MissingField { screen, field }
            }
            DispatchError::EmptyResponse(action) => GatewayError::EmptyResponse(action),
            DispatchError::InvalidPayload(msg) => GatewayError::InvalidPayload(msg),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response()
    }
}
