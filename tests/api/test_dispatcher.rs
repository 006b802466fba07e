// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Dispatcher pipeline with a recording submission sink

use async_trait::async_trait;
use flow_gateway::{
    api::GatewayError,
    config::KeyMaterial,
    flow::{ScreenRegistry, Submission, SubmissionSink},
    Dispatcher,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

use crate::common::{platform_request, test_key_pem, TEST_SECRET};

#[derive(Default)]
struct RecordingSink {
    submissions: Mutex<Vec<Submission>>,
    fail: bool,
}

#[async_trait]
impl SubmissionSink for RecordingSink {
    async fn record(&self, submission: Submission) -> anyhow::Result<()> {
        self.submissions.lock().unwrap().push(submission);
        if self.fail {
            anyhow::bail!("storage unavailable");
        }
        Ok(())
    }
}

fn dispatcher(sink: Arc<RecordingSink>) -> Dispatcher {
    let keys = KeyMaterial::new(test_key_pem(), "", Some(TEST_SECRET.to_string()));
    Dispatcher::new(&keys, ScreenRegistry::default())
        .unwrap()
        .with_sink(sink)
}

fn entry_submission() -> serde_json::Value {
    json!({
        "action": "data_exchange",
        "screen": "screen_lmaspf",
        "version": "3.0",
        "flow_token": "tok-7",
        "data": {
            "screen_0_Full_name_0": "John",
            "screen_0_Email_address_1": "j@x.com"
        }
    })
}

#[tokio::test]
async fn test_entry_submission_recorded() {
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher(sink.clone());

    let request = platform_request(&entry_submission());
    let body = dispatcher
        .handle(&request.body(), Some(&request.signature(TEST_SECRET)))
        .await
        .unwrap();

    assert_eq!(request.decrypt_response(&body)["screen"], "screen_cnktoz");

    let submissions = sink.submissions.lock().unwrap();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].flow_token, "tok-7");
    assert_eq!(submissions[0].fields["screen_0_Full_name_0"], "John");
}

#[tokio::test]
async fn test_sink_failure_does_not_change_response() {
    let sink = Arc::new(RecordingSink {
        fail: true,
        ..Default::default()
    });
    let dispatcher = dispatcher(sink.clone());

    let request = platform_request(&entry_submission());
    let result = dispatcher
        .handle(&request.body(), Some(&request.signature(TEST_SECRET)))
        .await;

    assert!(result.is_ok());
    assert_eq!(sink.submissions.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_non_entry_requests_not_recorded() {
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher(sink.clone());

    for payload in [
        json!({"action": "ping"}),
        json!({"action": "INIT", "flow_token": "tok-7"}),
        json!({"action": "data_exchange", "screen": "screen_cnktoz", "flow_token": "tok-7"}),
    ] {
        let request = platform_request(&payload);
        dispatcher
            .handle(&request.body(), Some(&request.signature(TEST_SECRET)))
            .await
            .unwrap();
    }

    assert!(sink.submissions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_field_maps_to_500() {
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher(sink.clone());

    let request = platform_request(&json!({
        "action": "data_exchange",
        "screen": "screen_lmaspf",
        "flow_token": "tok-7",
        "data": {"screen_0_Full_name_0": "John"}
    }));
    let err = dispatcher
        .handle(&request.body(), Some(&request.signature(TEST_SECRET)))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GatewayError::MissingField {
            screen: "screen_lmaspf".to_string(),
            field: "screen_0_Email_address_1".to_string(),
        }
    );
    assert_eq!(err.status_code(), 500);
    assert!(sink.submissions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_signature_checked_before_decryption() {
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher(sink);

    let request = platform_request(&entry_submission());
    let err = dispatcher
        .handle(&request.body(), Some(&request.signature("wrong-secret")))
        .await
        .unwrap_err();

    assert_eq!(err, GatewayError::SignatureInvalid);
    assert_eq!(err.status_code(), 432);
}

#[test]
fn test_unloadable_key_fails_construction() {
    let keys = KeyMaterial::new("not a pem", "", Some(TEST_SECRET.to_string()));
    assert!(Dispatcher::new(&keys, ScreenRegistry::default()).is_err());
}

#[tokio::test]
async fn test_missing_action_is_invalid_payload() {
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = dispatcher(sink);

    let request = platform_request(&json!({"flow_token": "tok-7", "version": "3.0"}));
    let err = dispatcher
        .handle(&request.body(), Some(&request.signature(TEST_SECRET)))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GatewayError::InvalidPayload("missing field `action`".to_string())
    );
    assert_eq!(err.status_code(), 500);
}
