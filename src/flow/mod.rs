// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod screens;
pub mod state_machine;
pub mod submission;
pub mod types;

pub use screens::{ScreenRegistry, ScreenRegistryError, ScreenTemplate};
pub use state_machine::{DispatchError, FlowStateMachine, Submission};
pub use submission::{LoggingSubmissionSink, SubmissionSink};
pub use types::{DecryptedPayload, FlowAction, ScreenResponse};
