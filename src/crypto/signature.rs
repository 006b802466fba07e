// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request Signature Gate
//!
//! The platform signs every webhook body with HMAC-SHA256 keyed by the app
//! secret and sends the hex digest in `x-hub-signature-256: sha256=<hex>`.
//! The digest covers the exact bytes on the wire, so verification must run on
//! the raw body before any JSON parsing.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Optional prefix in front of the hex digest
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Compute the hex HMAC-SHA256 digest of `body` under `secret`
///
/// Returns `None` if the MAC cannot be keyed.
pub fn compute_signature(body: &[u8], secret: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a raw request body against its signature header
///
/// - `secret` absent: returns `true` (unsigned development mode, logged loudly)
/// - `secret` present, header absent: returns `false`
/// - otherwise: constant-time comparison of the hex digest
pub fn verify_signature(
    raw_body: &[u8],
    signature_header: Option<&str>,
    secret: Option<&str>,
) -> bool {
    let Some(secret) = secret else {
        warn!(
            "⚠️  App secret is not configured - accepting request WITHOUT signature verification"
        );
        return true;
    };

    let Some(header) = signature_header else {
        debug!("Request rejected: {} header missing", SIGNATURE_HEADER);
        return false;
    };

    let provided = header
        .trim()
        .strip_prefix(SIGNATURE_PREFIX)
        .unwrap_or_else(|| header.trim());
    let Some(expected) = compute_signature(raw_body, secret) else {
        warn!("Request rejected: signature could not be computed");
        return false;
    };

    !provided.is_empty() && constant_time_compare(provided, &expected)
}

/// Constant-time string comparison
///
/// Both inputs are padded to the same length with different filler bytes so
/// the comparison time does not depend on where the first mismatch is, and a
/// length mismatch can never compare equal.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    let max_len = std::cmp::max(a.len(), b.len());

    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];

    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);

    (lengths_equal & contents_equal).into()
}

/// Signature gate holding the shared app secret
#[derive(Clone, Default)]
pub struct SignatureGate {
    secret: Option<String>,
}

impl SignatureGate {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    /// Gate that accepts everything (no secret configured)
    pub fn unsigned() -> Self {
        Self { secret: None }
    }

    pub fn is_enforcing(&self) -> bool {
        self.secret.is_some()
    }

    pub fn verify(&self, raw_body: &[u8], signature_header: Option<&str>) -> bool {
        verify_signature(raw_body, signature_header, self.secret.as_deref())
    }
}

impl fmt::Debug for SignatureGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureGate")
            .field("enforcing", &self.is_enforcing())
            .finish()
    }
}
