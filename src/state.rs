//! Interaction state owned by the active form.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::flow::{ChatSubmissionFlow, Outcome, SubmissionEvent};
use crate::wire::ChatRequest;

/// Developer message pre-filled in a fresh form.
pub const DEFAULT_DEVELOPER_MESSAGE: &str = "You are a helpful assistant.";

/// Everything the form shows for one interaction.
///
/// Only the submission flow mutates the output fields (`is_pending`,
/// `error_text`, `response_text`). Text already shown is kept when a
/// submission fails midway; the error is shown next to it.
#[derive(Clone, PartialEq, Eq)]
pub struct SubmissionState {
    pub user_message: String,
    pub developer_message: String,
    pub api_key: String,
    pub is_pending: bool,
    pub error_text: Option<String>,
    pub response_text: String,
}

impl Default for SubmissionState {
    fn default() -> Self {
        Self {
            user_message: String::new(),
            developer_message: DEFAULT_DEVELOPER_MESSAGE.to_string(),
            api_key: String::new(),
            is_pending: false,
            error_text: None,
            response_text: String::new(),
        }
    }
}

impl std::fmt::Debug for SubmissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionState")
            .field("user_message", &self.user_message)
            .field("developer_message", &self.developer_message)
            .field("has_api_key", &!self.api_key.is_empty())
            .field("is_pending", &self.is_pending)
            .field("error_text", &self.error_text)
            .field("response_len", &self.response_text.len())
            .finish()
    }
}

impl SubmissionState {
    /// Build the wire request from the three input fields.
    pub fn request(&self) -> ChatRequest {
        ChatRequest::new(
            self.developer_message.clone(),
            self.user_message.clone(),
            self.api_key.clone(),
        )
    }

    /// Reset the output fields at the start of a submission.
    pub fn begin(&mut self) {
        self.is_pending = true;
        self.error_text = None;
        self.response_text.clear();
    }

    /// Apply one event from the submission stream.
    pub fn apply(&mut self, event: &SubmissionEvent) {
        match event {
            SubmissionEvent::Snapshot(text) => self.response_text.clone_from(text),
            SubmissionEvent::Settled(Outcome::Success(text)) => {
                self.response_text.clone_from(text);
                self.is_pending = false;
            }
            SubmissionEvent::Settled(Outcome::Failure(err)) => {
                self.error_text = Some(err.to_string());
                self.is_pending = false;
            }
        }
    }

    /// Run one submission through `flow`, updating this state as it goes.
    ///
    /// `on_update` sees the state after every change: once when the
    /// submission begins, once per snapshot, and once when it settles.
    pub async fn submit_with<F>(
        &mut self,
        flow: &ChatSubmissionFlow,
        cancel: CancellationToken,
        mut on_update: F,
    ) -> Outcome
    where
        F: FnMut(&Self),
    {
        self.begin();
        on_update(self);

        let mut submission = flow.submit(self.request(), cancel);
        while let Some(event) = submission.next().await {
            self.apply(&event);
            on_update(self);
            if let SubmissionEvent::Settled(outcome) = event {
                return outcome;
            }
        }

        // A submission always ends with `Settled`.
        self.is_pending = false;
        Outcome::Failure(crate::error::SubmitError::unknown(""))
    }
}
