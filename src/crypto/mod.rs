// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Flow Envelope Cryptography
//!
//! This module implements the cryptographic side of the flow data exchange:
//!
//! - **Signature**: HMAC-SHA256 over the raw request body (`x-hub-signature-256`)
//! - **Private Key**: RSA-OAEP(SHA-256) unwrap of the per-request AES key
//! - **AES-GCM**: AES-128-GCM open/seal with a detached 16-byte tag
//! - **Envelope**: the full request decrypt / response encrypt codec
//!
//! ## Security Considerations
//!
//! - The private key, passphrase and app secret are loaded once and never logged
//! - AES keys and IVs live only for the request that produced them
//! - Responses use the bitwise complement of the request IV, never the IV itself
//! - Signature digests are compared in constant time
//!
//! ## Protocol Flow
//!
//! 1. Platform generates a random AES-128 key and 12-byte IV
//! 2. Platform wraps the AES key with the endpoint's RSA public key (OAEP, SHA-256)
//! 3. Platform encrypts the JSON payload with AES-128-GCM and appends the tag
//! 4. Platform signs the raw JSON body with the app secret
//! 5. Endpoint verifies the signature, unwraps the key, decrypts the payload
//! 6. Endpoint encrypts its JSON response with the same key and the inverted IV

pub mod aes_gcm;
pub mod envelope;
pub mod error;
pub mod private_key;
pub mod signature;

pub use aes_gcm::{invert_iv, AES_KEY_LEN, IV_LEN, TAG_LEN};
pub use envelope::{
    decrypt_request, decrypt_with_key, encrypt_response, DecryptedRequest, EnvelopeCodec,
    FlowEnvelope, SessionKey,
};
pub use error::EnvelopeError;
pub use private_key::FlowPrivateKey;
pub use signature::{
    compute_signature, verify_signature, SignatureGate, SIGNATURE_HEADER, SIGNATURE_PREFIX,
};
