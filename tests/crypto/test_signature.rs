// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request signature gate

use flow_gateway::crypto::{compute_signature, verify_signature, SignatureGate};

use crate::common::{sign, TEST_SECRET};

const BODY: &[u8] = br#"{"encrypted_aes_key":"a","encrypted_flow_data":"b","initial_vector":"c"}"#;

#[test]
fn test_valid_signature_accepted() {
    let gate = SignatureGate::new(Some(TEST_SECRET.to_string()));
    assert!(gate.is_enforcing());
    assert!(gate.verify(BODY, Some(&sign(BODY, TEST_SECRET))));
}

#[test]
fn test_modified_body_rejected() {
    let gate = SignatureGate::new(Some(TEST_SECRET.to_string()));
    let header = sign(BODY, TEST_SECRET);

    let mut tampered = BODY.to_vec();
    tampered[5] ^= 0x01;
    assert!(!gate.verify(&tampered, Some(&header)));
}

#[test]
fn test_modified_header_rejected() {
    let gate = SignatureGate::new(Some(TEST_SECRET.to_string()));
    let header = sign(BODY, TEST_SECRET);

    let last = header.chars().last().unwrap();
    let replacement = if last == '0' { '1' } else { '0' };
    let tampered = format!("{}{}", &header[..header.len() - 1], replacement);

    assert!(!gate.verify(BODY, Some(&tampered)));
}

#[test]
fn test_wrong_secret_rejected() {
    let gate = SignatureGate::new(Some(TEST_SECRET.to_string()));
    assert!(!gate.verify(BODY, Some(&sign(BODY, "another-secret"))));
}

#[test]
fn test_missing_header_rejected() {
    let gate = SignatureGate::new(Some(TEST_SECRET.to_string()));
    assert!(!gate.verify(BODY, None));
}

#[test]
fn test_truncated_digest_rejected() {
    let digest = compute_signature(BODY, TEST_SECRET).unwrap();
    let truncated = format!("sha256={}", &digest[..32]);
    assert!(!verify_signature(BODY, Some(&truncated), Some(TEST_SECRET)));
}

#[test]
fn test_no_secret_accepts_everything() {
    let gate = SignatureGate::unsigned();
    assert!(!gate.is_enforcing());
    assert!(gate.verify(BODY, None));
    assert!(gate.verify(BODY, Some("sha256=garbage")));
}

#[test]
fn test_signature_covers_exact_bytes() {
    // Same JSON, different whitespace
    let reformatted = br#"{ "encrypted_aes_key": "a", "encrypted_flow_data": "b", "initial_vector": "c" }"#;
    let header = sign(BODY, TEST_SECRET);

    assert!(!verify_signature(reformatted, Some(&header), Some(TEST_SECRET)));
}

#[test]
fn test_empty_digest_never_matches() {
    let gate = SignatureGate::new(Some(TEST_SECRET.to_string()));
    assert!(!gate.verify(BODY, Some("sha256=")));
    assert!(!gate.verify(b"", Some("sha256=")));
}
