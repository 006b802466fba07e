// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Submission hand-off
//!
//! Persisting what the user typed is not the gateway's job. Validated entry
//! submissions are passed to a [`SubmissionSink`]; storage, ticketing or
//! messaging live behind that trait.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::state_machine::Submission;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn record(&self, submission: Submission) -> Result<()>;
}

/// Default sink: logs that a submission arrived, never its values
#[derive(Debug, Clone, Default)]
pub struct LoggingSubmissionSink;

#[async_trait]
impl SubmissionSink for LoggingSubmissionSink {
    async fn record(&self, submission: Submission) -> Result<()> {
        let fields: Vec<&str> = submission.fields.keys().map(String::as_str).collect();
        info!(
            flow_token = %submission.flow_token,
            screen = %submission.screen,
            fields = ?fields,
            "📝 Flow submission received"
        );
        Ok(())
    }
}
