//! The chat submission flow.
//!
//! One submission is: validate → send → read the streamed body → emit the
//! accumulated text after every chunk → settle. [`ChatSubmissionFlow::submit`]
//! returns a [`Submission`], a stream of [`SubmissionEvent`]s that ends with
//! exactly one [`SubmissionEvent::Settled`].
//!
//! # Example
//!
//! ```rust,no_run
//! use chat_stream_form::{ChatSubmissionFlow, HttpBackend, SubmissionEvent};
//! use chat_stream_form::wire::ChatRequest;
//! use futures::StreamExt;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let flow = ChatSubmissionFlow::new(HttpBackend::new("http://localhost:8000")?);
//! let req = ChatRequest::new("You are a helpful assistant.", "Hello!", "sk-...");
//! let mut submission = flow.submit(req, CancellationToken::new());
//! while let Some(event) = submission.next().await {
//!     match event {
//!         SubmissionEvent::Snapshot(text) => println!("{text}"),
//!         SubmissionEvent::Settled(outcome) => println!("{outcome:?}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{BackendResponse, ChatBackend};
use crate::decode::Utf8StreamDecoder;
use crate::error::SubmitError;
use crate::wire::{self, ChatRequest};

/// How a submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The stream closed normally. Holds the full response text.
    Success(String),
    /// The submission failed. Text already emitted as snapshots is not
    /// repeated here.
    Failure(SubmitError),
}

impl Outcome {
    /// Whether the submission succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The error, if the submission failed.
    pub fn error(&self) -> Option<&SubmitError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(e) => Some(e),
        }
    }
}

/// Item of a [`Submission`] stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    /// The whole response received so far.
    Snapshot(String),
    /// Terminal outcome. Always the last item.
    Settled(Outcome),
}

/// Clears the shared pending flag when dropped.
#[derive(Debug)]
struct PendingGuard {
    flag: Arc<AtomicBool>,
}

impl PendingGuard {
    /// Take the flag, or `None` if another submission holds it.
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A running submission.
///
/// Lazy, ordered, finite and not restartable. Dropping it before it settles
/// abandons the request and clears the pending flag.
pub struct Submission {
    inner: Pin<Box<dyn Stream<Item = SubmissionEvent> + Send>>,
}

impl std::fmt::Debug for Submission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submission").finish_non_exhaustive()
    }
}

impl Submission {
    /// Drive the submission to completion and return its outcome.
    pub async fn outcome(mut self) -> Outcome {
        let mut last = None;
        while let Some(event) = self.inner.next().await {
            if let SubmissionEvent::Settled(outcome) = event {
                last = Some(outcome);
            }
        }
        last.unwrap_or_else(|| Outcome::Failure(SubmitError::unknown("")))
    }
}

impl Stream for Submission {
    type Item = SubmissionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Performs chat submissions against one backend.
///
/// Clones share the backend and the pending flag, so at most one submission
/// is pending across all clones.
#[derive(Clone)]
pub struct ChatSubmissionFlow {
    backend: Arc<dyn ChatBackend>,
    pending: Arc<AtomicBool>,
}

impl std::fmt::Debug for ChatSubmissionFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSubmissionFlow")
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}

impl ChatSubmissionFlow {
    /// Create a flow over the given backend.
    pub fn new(backend: impl ChatBackend + 'static) -> Self {
        Self::with_backend(Arc::new(backend))
    }

    /// Create a flow over a shared backend.
    pub fn with_backend(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            pending: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a submission is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Start a submission.
    ///
    /// The pending flag is taken here, before the returned stream is first
    /// polled. It is released just before the `Settled` event is yielded, or
    /// when the submission is dropped. If another submission is pending the
    /// returned stream settles with [`SubmitError::Busy`] right away.
    pub fn submit(&self, req: ChatRequest, cancel: CancellationToken) -> Submission {
        let Some(guard) = PendingGuard::acquire(&self.pending) else {
            warn!(name: "chat.submit.busy", "Submission rejected: another one is pending");
            let busy = SubmissionEvent::Settled(Outcome::Failure(SubmitError::Busy));
            return Submission {
                inner: Box::pin(futures::stream::iter([busy])),
            };
        };

        let backend = Arc::clone(&self.backend);
        let request_id = uuid::Uuid::new_v4().to_string();

        let stream = async_stream::stream! {
            let guard = guard;

            info!(
                name: "chat.submit.started",
                request_id = %request_id,
                developer_message_len = req.developer_message.len(),
                user_message_len = req.user_message.len(),
                "Submission started"
            );

            let outcome = 'submit: {
                if req.api_key.is_empty() {
                    break 'submit Outcome::Failure(SubmitError::MissingCredential);
                }

                let sent = tokio::select! {
                    biased;
                    () = cancel.cancelled() => None,
                    result = backend.send(&req) => Some(result),
                };

                let response = match sent {
                    None => break 'submit Outcome::Failure(SubmitError::Cancelled),
                    Some(Err(e)) => break 'submit Outcome::Failure(e),
                    Some(Ok(r)) => r,
                };

                let mut body = match response {
                    BackendResponse::Stream(body) => body,
                    BackendResponse::NoBody => {
                        break 'submit Outcome::Failure(SubmitError::StreamUnavailable);
                    }
                    BackendResponse::Failed { status, body } => {
                        let message = wire::backend_error_message(&body);
                        debug!(request_id = %request_id, status, message = %message, "Backend error body");
                        break 'submit Outcome::Failure(SubmitError::BackendError(message));
                    }
                };

                let mut decoder = Utf8StreamDecoder::new();
                let mut accumulated = String::new();
                let mut chunks = 0usize;

                loop {
                    let next = tokio::select! {
                        biased;
                        () = cancel.cancelled() => None,
                        chunk = body.next() => Some(chunk),
                    };

                    match next {
                        None => break 'submit Outcome::Failure(SubmitError::Cancelled),
                        Some(None) => break,
                        Some(Some(Err(e))) => break 'submit Outcome::Failure(e),
                        Some(Some(Ok(bytes))) => {
                            chunks += 1;
                            let text = decoder.decode(&bytes);
                            tracing::trace!(
                                request_id = %request_id,
                                chunk_len = bytes.len(),
                                text_len = text.len(),
                                "Body chunk"
                            );
                            if !text.is_empty() {
                                accumulated.push_str(&text);
                                yield SubmissionEvent::Snapshot(accumulated.clone());
                            }
                        }
                    }
                }

                let tail = decoder.finish();
                if !tail.is_empty() {
                    accumulated.push_str(&tail);
                    yield SubmissionEvent::Snapshot(accumulated.clone());
                }

                debug!(request_id = %request_id, chunks, "Body stream closed");
                Outcome::Success(accumulated)
            };

            match &outcome {
                Outcome::Success(text) => info!(
                    name: "chat.submit.succeeded",
                    request_id = %request_id,
                    response_len = text.len(),
                    "Submission succeeded"
                ),
                Outcome::Failure(e) => warn!(
                    name: "chat.submit.failed",
                    request_id = %request_id,
                    kind = e.kind(),
                    error = %e,
                    "Submission failed"
                ),
            }

            drop(guard);
            yield SubmissionEvent::Settled(outcome);
        };

        Submission {
            inner: Box::pin(stream),
        }
    }
}
