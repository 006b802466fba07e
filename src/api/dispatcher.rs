// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Flow request dispatcher
//!
//! Runs one request through the whole pipeline:
//!
//! ```text
//! raw body ─► signature gate ─► envelope JSON ─► decrypt ─► state machine ─► encrypt
//! ```
//!
//! Every stage short-circuits into a [`GatewayError`]; nothing partial is ever
//! returned. The dispatcher holds only immutable state and is shared across
//! all requests.

use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::errors::GatewayError;
use crate::config::KeyMaterial;
use crate::crypto::{EnvelopeCodec, EnvelopeError, FlowEnvelope, SignatureGate};
use crate::flow::{FlowStateMachine, LoggingSubmissionSink, ScreenRegistry, SubmissionSink};

pub struct Dispatcher {
    gate: SignatureGate,
    codec: EnvelopeCodec,
    state_machine: FlowStateMachine,
    sink: Arc<dyn SubmissionSink>,
}

impl Dispatcher {
    /// Build a dispatcher from startup key material
    ///
    /// Parses the private key once; a key that does not load aborts startup.
    pub fn new(keys: &KeyMaterial, screens: ScreenRegistry) -> Result<Self, EnvelopeError> {
        let codec = EnvelopeCodec::from_pem(&keys.private_key_pem, &keys.passphrase)?;
        let gate = SignatureGate::new(keys.app_secret.clone());

        if !gate.is_enforcing() {
            warn!("⚠️  APP_SECRET not set - request signatures will NOT be verified");
        }

        Ok(Self::from_parts(
            gate,
            codec,
            FlowStateMachine::new(screens),
            Arc::new(LoggingSubmissionSink),
        ))
    }

    pub fn from_parts(
        gate: SignatureGate,
        codec: EnvelopeCodec,
        state_machine: FlowStateMachine,
        sink: Arc<dyn SubmissionSink>,
    ) -> Self {
        Self {
            gate,
            codec,
            state_machine,
            sink,
        }
    }

    /// Replace the submission sink
    pub fn with_sink(mut self, sink: Arc<dyn SubmissionSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn state_machine(&self) -> &FlowStateMachine {
        &self.state_machine
    }

    /// Handle one raw flow request
    ///
    /// `raw_body` must be the exact bytes received; the signature covers them.
    /// On success returns the base64 response body.
    pub async fn handle(
        &self,
        raw_body: &[u8],
        signature_header: Option<&str>,
    ) -> Result<String, GatewayError> {
        let request_id = Uuid::new_v4();

        let result = self.process(request_id, raw_body, signature_header).await;
        if let Err(err) = &result {
            // 432/421 are caller-side problems
            match err {
                GatewayError::SignatureInvalid | GatewayError::DecryptionFailed(_) => warn!(
                    request_id = %request_id,
                    kind = err.kind(),
                    status = err.status_code(),
                    "Flow request rejected: {}",
                    err
                ),
                _ => error!(
                    request_id = %request_id,
                    kind = err.kind(),
                    status = err.status_code(),
                    "Flow request failed: {}",
                    err
                ),
            }
        }
        result
    }

    async fn process(
        &self,
        request_id: Uuid,
        raw_body: &[u8],
        signature_header: Option<&str>,
    ) -> Result<String, GatewayError> {
        if !self.gate.verify(raw_body, signature_header) {
            return Err(GatewayError::SignatureInvalid);
        }

        let envelope: FlowEnvelope = serde_json::from_slice(raw_body).map_err(|e| {
            GatewayError::InvalidEnvelope(format!(
                "{:?} error at line {} column {}",
                e.classify(),
                e.line(),
                e.column()
            ))
        })?;

        let decrypted = self
            .codec
            .decrypt(&envelope)
            .map_err(GatewayError::DecryptionFailed)?;
        let payload = &decrypted.payload()?;

        debug!(
            request_id = %request_id,
            action = %payload.action,
            screen = payload.screen.as_deref().unwrap_or("-"),
            version = %payload.version,
            fields = ?payload.field_names(),
            "💬 Decrypted flow request"
        );

        let response = self.state_machine.dispatch(payload)?;

        if let Some(submission) = self.state_machine.submission(payload) {
            if let Err(e) = self.sink.record(submission).await {
                error!(
                    request_id = %request_id,
                    "Submission sink failed, responding anyway: {}",
                    e
                );
            }
        }

        let encrypted = self
            .codec
            .encrypt(&response, &decrypted.session)
            .map_err(GatewayError::EncodingFailed)?;

        info!(
            request_id = %request_id,
            action = %payload.action,
            screen = response.screen.as_deref().unwrap_or("-"),
            "👉 Flow response sent"
        );

        Ok(encrypted)
    }
}
