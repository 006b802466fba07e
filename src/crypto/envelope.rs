// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Flow Envelope Codec
//!
//! Hybrid decryption of the platform's request envelope and encryption of the
//! matching response.
//!
//! ## Request
//!
//! ```text
//! {
//!   "encrypted_aes_key":   base64(RSA-OAEP-SHA256(aes_key)),
//!   "encrypted_flow_data": base64(AES-128-GCM(aes_key, iv, json) | tag),
//!   "initial_vector":      base64(iv)
//! }
//! ```
//!
//! ## Response
//!
//! The HTTP body is the bare string `base64(AES-128-GCM(aes_key, !iv, json) | tag)`.
//! The AES key and IV only live inside [`SessionKey`] for the span of one
//! request.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::aes_gcm::{self, AES_KEY_LEN, IV_LEN};
use super::error::EnvelopeError;
use super::private_key::FlowPrivateKey;
use crate::flow::{DecryptedPayload, DispatchError};

/// Encrypted request body posted by the platform
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlowEnvelope {
    pub encrypted_aes_key: String,
    pub encrypted_flow_data: String,
    pub initial_vector: String,
}

/// Per-request AES key and request IV
///
/// Needed to encrypt exactly one response, then dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey {
    aes_key: [u8; AES_KEY_LEN],
    iv: [u8; IV_LEN],
}

impl SessionKey {
    pub fn new(aes_key: [u8; AES_KEY_LEN], iv: [u8; IV_LEN]) -> Self {
        Self { aes_key, iv }
    }

    pub fn aes_key(&self) -> &[u8; AES_KEY_LEN] {
        &self.aes_key
    }

    /// IV the request was encrypted with (not the reply IV)
    pub fn request_iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    /// Encrypt a response for the request this key came from
    pub fn encrypt_response<T: Serialize>(&self, response: &T) -> Result<String, EnvelopeError> {
        encrypt_response(response, &self.aes_key, &self.iv)
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey([REDACTED])")
    }
}

/// Result of a successful envelope decryption
#[derive(Debug, Clone)]
pub struct DecryptedRequest {
    /// Decrypted JSON, not yet checked against the payload shape
    pub plaintext: Value,
    pub session: SessionKey,
}

impl DecryptedRequest {
    /// Typed view of the plaintext
    ///
    /// A shape mismatch is a dispatch problem, not a key problem.
    pub fn payload(&self) -> Result<DecryptedPayload, DispatchError> {
        DecryptedPayload::from_value(self.plaintext.clone())
    }
}

/// Envelope codec bound to the endpoint's private key
///
/// Holds no per-request state; share it freely across requests.
#[derive(Debug, Clone)]
pub struct EnvelopeCodec {
    private_key: FlowPrivateKey,
}

impl EnvelopeCodec {
    pub fn new(private_key: FlowPrivateKey) -> Self {
        Self { private_key }
    }

    /// Load the private key from PEM and build a codec around it
    pub fn from_pem(pem: &str, passphrase: &str) -> Result<Self, EnvelopeError> {
        Ok(Self::new(FlowPrivateKey::from_pem(pem, passphrase)?))
    }

    pub fn private_key(&self) -> &FlowPrivateKey {
        &self.private_key
    }

    /// Decrypt a request envelope
    pub fn decrypt(&self, envelope: &FlowEnvelope) -> Result<DecryptedRequest, EnvelopeError> {
        decrypt_with_key(envelope, &self.private_key)
    }

    /// Encrypt a response with the session key of the request it answers
    pub fn encrypt<T: Serialize>(
        &self,
        response: &T,
        session: &SessionKey,
    ) -> Result<String, EnvelopeError> {
        session.encrypt_response(response)
    }
}

/// Decrypt a request envelope, loading the private key from PEM first
///
/// Any failure, including a key that will not load, is a decryption failure.
pub fn decrypt_request(
    envelope: &FlowEnvelope,
    private_key_pem: &str,
    passphrase: &str,
) -> Result<DecryptedRequest, EnvelopeError> {
    let private_key = FlowPrivateKey::from_pem(private_key_pem, passphrase)?;
    decrypt_with_key(envelope, &private_key)
}

/// Decrypt a request envelope with an already loaded private key
pub fn decrypt_with_key(
    envelope: &FlowEnvelope,
    private_key: &FlowPrivateKey,
) -> Result<DecryptedRequest, EnvelopeError> {
    // 1. Unwrap the per-request AES key
    let wrapped_key = decode_field("encrypted_aes_key", &envelope.encrypted_aes_key)?;
    let aes_key = private_key.unwrap_aes_key(&wrapped_key)?;

    // 2. Split ciphertext body and trailing tag
    let flow_data = decode_field("encrypted_flow_data", &envelope.encrypted_flow_data)?;
    let (body, tag) = aes_gcm::split_tag(&flow_data)?;

    // 3. IV must be exactly 12 bytes
    let iv_bytes = decode_field("initial_vector", &envelope.initial_vector)?;
    let iv: [u8; IV_LEN] = iv_bytes
        .as_slice()
        .try_into()
        .map_err(|_| EnvelopeError::invalid_length("initial_vector", IV_LEN, iv_bytes.len()))?;

    // 4. Decrypt and verify tag
    let plaintext = aes_gcm::open(&aes_key, &iv, body, tag)?;

    // 5. Parse JSON (shape is checked later)
    let json = std::str::from_utf8(&plaintext).map_err(|e| EnvelopeError::InvalidPayload {
        reason: format!("decrypted data is not valid UTF-8: {}", e),
    })?;
    let plaintext: Value = serde_json::from_str(json)?;

    Ok(DecryptedRequest {
        plaintext,
        session: SessionKey::new(aes_key, iv),
    })
}

/// Encrypt a response object under the request's AES key and inverted IV
///
/// Returns the bare base64 string that forms the HTTP response body.
pub fn encrypt_response<T: Serialize>(
    response: &T,
    aes_key: &[u8; AES_KEY_LEN],
    request_iv: &[u8; IV_LEN],
) -> Result<String, EnvelopeError> {
    let reply_iv = aes_gcm::invert_iv(request_iv);

    let json = serde_json::to_vec(response).map_err(|e| EnvelopeError::EncryptionFailed {
        reason: format!("failed to serialize response: {}", e),
    })?;

    let sealed = aes_gcm::seal(aes_key, &reply_iv, &json)?;
    Ok(STANDARD.encode(sealed))
}

fn decode_field(field: &str, value: &str) -> Result<Vec<u8>, EnvelopeError> {
    STANDARD
        .decode(value.trim())
        .map_err(|e| EnvelopeError::InvalidEncoding {
            field: field.to_string(),
            reason: e.to_string(),
        })
}
