//! Streaming chat form client
//!
//! Collects an API key, a developer message and a user message, posts them to
//! a backend's `/api/chat` endpoint, and renders the streamed reply as it
//! arrives.
//!
//! # Architecture
//!
//! - **Flow**: [`ChatSubmissionFlow`] validates, sends, decodes the streamed
//!   body and settles each submission, one at a time, cancellable
//! - **Backend**: [`ChatBackend`] seam with the `reqwest`-based [`HttpBackend`]
//! - **State**: [`SubmissionState`] holds the form fields and what is on screen
//! - **Presentation**: [`render::TerminalView`] for the command-line front end
//!
//! # Modules
//!
//! - [`flow`]: submission lifecycle and its event stream
//! - [`decode`]: stream-aware UTF-8 decoding of body chunks
//! - [`wire`]: request and error body formats
//! - [`config`]: CLI, file and environment configuration

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod backend;
pub mod config;
pub mod decode;
pub mod error;
pub mod flow;
pub mod render;
pub mod state;
pub mod telemetry;
pub mod wire;

pub use backend::{BackendResponse, ChatBackend, HttpBackend};
pub use error::SubmitError;
pub use flow::{ChatSubmissionFlow, Outcome, Submission, SubmissionEvent};
pub use state::SubmissionState;
