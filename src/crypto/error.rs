// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Envelope Codec Error Types
//!
//! Error type shared by every stage of the flow envelope protocol. The codec
//! stays transport agnostic: it never decides status codes, it only reports
//! which stage failed.
//!
//! ## Error Variants
//!
//! - **KeyLoad**: the RSA private key PEM could not be parsed (bad PEM, wrong passphrase)
//! - **KeyUnwrap**: RSA-OAEP unwrap of the per-request AES key failed
//! - **InvalidEncoding**: an envelope field is not valid base64
//! - **InvalidLength**: a key, IV or ciphertext blob has the wrong size
//! - **AuthenticationFailed**: AES-GCM tag verification failed
//! - **InvalidPayload**: decrypted bytes are not UTF-8 JSON
//! - **EncryptionFailed**: the response could not be serialized or sealed
//!
//! Everything except `EncryptionFailed` is a decryption failure, which the
//! platform reads as "your cached public key is stale".
//!
//! No variant ever carries plaintext, key bytes or passphrases.

use std::fmt;

/// Error type for envelope decryption and response encryption
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Private key PEM could not be loaded
    KeyLoad {
        /// Specific failure reason
        reason: String,
    },

    /// RSA-OAEP unwrap of `encrypted_aes_key` failed
    ///
    /// Wrong key pair, wrong OAEP hash, or a corrupted wrapped key.
    KeyUnwrap {
        /// Specific failure reason
        reason: String,
    },

    /// Envelope field is not valid base64
    InvalidEncoding {
        /// Which envelope field failed to decode
        field: String,
        /// Specific failure reason
        reason: String,
    },

    /// Decoded value has the wrong size
    InvalidLength {
        /// Which value had the wrong size (e.g. "aes_key", "initial_vector")
        field: String,
        /// Expected size in bytes
        expected: usize,
        /// Actual size in bytes
        actual: usize,
    },

    /// AES-GCM authentication tag did not verify
    AuthenticationFailed,

    /// Decrypted plaintext is not UTF-8 JSON
    InvalidPayload {
        /// Specific failure reason (never includes plaintext)
        reason: String,
    },

    /// Response could not be serialized or encrypted
    EncryptionFailed {
        /// Specific failure reason
        reason: String,
    },
}

impl EnvelopeError {
    /// True for every failure on the request (decrypt) side of the protocol
    pub fn is_decryption_failure(&self) -> bool {
        !matches!(self, EnvelopeError::EncryptionFailed { .. })
    }

    pub(crate) fn invalid_length(field: &str, expected: usize, actual: usize) -> Self {
        EnvelopeError::InvalidLength {
            field: field.to_string(),
            expected,
            actual,
        }
    }
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeError::KeyLoad { reason } => {
                write!(f, "Failed to load private key: {}", reason)
            }
            EnvelopeError::KeyUnwrap { reason } => {
                write!(f, "Failed to unwrap AES key: {}", reason)
            }
            EnvelopeError::InvalidEncoding { field, reason } => {
                write!(f, "Invalid base64 in '{}': {}", field, reason)
            }
            EnvelopeError::InvalidLength {
                field,
                expected,
                actual,
            } => write!(
                f,
                "Invalid {} length: expected {} bytes, got {} bytes",
                field, expected, actual
            ),
            EnvelopeError::AuthenticationFailed => {
                write!(f, "AES-GCM authentication tag verification failed")
            }
            EnvelopeError::InvalidPayload { reason } => {
                write!(f, "Invalid decrypted payload: {}", reason)
            }
            EnvelopeError::EncryptionFailed { reason } => {
                write!(f, "Failed to encrypt response: {}", reason)
            }
        }
    }
}

impl std::error::Error for EnvelopeError {}

impl From<rsa::Error> for EnvelopeError {
    fn from(err: rsa::Error) -> Self {
        EnvelopeError::KeyUnwrap {
            reason: err.to_string(),
        }
    }
}

// serde_json messages can quote offending values, so only the category and
// position are kept.
impl From<serde_json::Error> for EnvelopeError {
    fn from(err: serde_json::Error) -> Self {
        EnvelopeError::InvalidPayload {
            reason: format!(
                "{:?} error at line {} column {}",
                err.classify(),
                err.line(),
                err.column()
            ),
        }
    }
}
