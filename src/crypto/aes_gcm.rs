// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! AES-128-GCM for Flow Envelopes
//!
//! **Encryption Format** (flow data exchange):
//! ```text
//! [ciphertext (variable length) | tag (16 bytes)]
//! ```
//!
//! - Key: 16 bytes, unwrapped per request from `encrypted_aes_key`
//! - IV: 12 bytes, sent separately as `initial_vector`
//! - No Additional Authenticated Data (AAD)
//!
//! Responses are sealed under the same key with the bitwise complement of the
//! request IV, so a key never encrypts two messages under one IV.

use aes_gcm::{
    aead::{Aead, AeadInPlace, KeyInit, Payload},
    Aes128Gcm, Nonce, Tag,
};

use super::error::EnvelopeError;

/// AES-128 key size in bytes
pub const AES_KEY_LEN: usize = 16;

/// GCM IV size in bytes
pub const IV_LEN: usize = 12;

/// GCM authentication tag size in bytes
pub const TAG_LEN: usize = 16;

/// Flip every bit of the request IV to obtain the reply IV
///
/// # Example
///
/// ```
/// use flow_gateway::crypto::aes_gcm::invert_iv;
///
/// let iv = [0x00u8; 12];
/// assert_eq!(invert_iv(&iv), [0xFFu8; 12]);
/// ```
pub fn invert_iv(iv: &[u8; IV_LEN]) -> [u8; IV_LEN] {
    let mut flipped = [0u8; IV_LEN];
    for (out, byte) in flipped.iter_mut().zip(iv.iter()) {
        *out = !byte;
    }
    flipped
}

/// Split a `ciphertext | tag` blob into its two parts
///
/// # Errors
///
/// Returns `InvalidLength` if the blob is shorter than the tag.
pub fn split_tag(blob: &[u8]) -> Result<(&[u8], &[u8]), EnvelopeError> {
    if blob.len() < TAG_LEN {
        return Err(EnvelopeError::invalid_length(
            "encrypted_flow_data",
            TAG_LEN,
            blob.len(),
        ));
    }
    Ok(blob.split_at(blob.len() - TAG_LEN))
}

/// Decrypt a ciphertext body and verify its detached tag
///
/// The tag is checked before any plaintext is released; on failure nothing
/// but `AuthenticationFailed` comes back.
pub fn open(
    key: &[u8; AES_KEY_LEN],
    iv: &[u8; IV_LEN],
    body: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    if tag.len() != TAG_LEN {
        return Err(EnvelopeError::invalid_length("tag", TAG_LEN, tag.len()));
    }

    let cipher = Aes128Gcm::new_from_slice(key)
        .map_err(|_| EnvelopeError::invalid_length("aes_key", AES_KEY_LEN, key.len()))?;

    let mut buffer = body.to_vec();
    cipher
        .decrypt_in_place_detached(Nonce::from_slice(iv), b"", &mut buffer, Tag::from_slice(tag))
        .map_err(|_| EnvelopeError::AuthenticationFailed)?;

    Ok(buffer)
}

/// Encrypt plaintext, returning `ciphertext | tag`
///
/// Callers pick the IV; for flow responses it must come from [`invert_iv`].
pub fn seal(
    key: &[u8; AES_KEY_LEN],
    iv: &[u8; IV_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    let cipher =
        Aes128Gcm::new_from_slice(key).map_err(|e| EnvelopeError::EncryptionFailed {
            reason: format!("failed to create AES-GCM cipher: {}", e),
        })?;

    cipher
        .encrypt(
            Nonce::from_slice(iv),
            Payload {
                msg: plaintext,
                aad: b"",
            },
        )
        .map_err(|e| EnvelopeError::EncryptionFailed {
            reason: format!("AES-GCM encryption failed: {}", e),
        })
}
