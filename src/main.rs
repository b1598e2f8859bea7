//! Command-line chat form.
//!
//! Fills the three form fields from flags, environment and stdin, submits
//! once, and streams the reply to stdout. Ctrl-C cancels the submission.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::info;

use chat_stream_form::config::{AppConfig, Cli};
use chat_stream_form::render::TerminalView;
use chat_stream_form::{ChatSubmissionFlow, HttpBackend, SubmissionState, telemetry};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the submission succeeded.
async fn run() -> anyhow::Result<bool> {
    // Load .env (if present) before clap reads env-backed flags
    let _ = dotenv();

    let cli = Cli::parse();
    let config = AppConfig::load_from_cli(&cli)?;
    telemetry::init(&config.logging)?;

    info!(
        name: "chat.config.loaded",
        base_url = %config.backend.base_url,
        "Configuration loaded"
    );

    let user_message = match cli.user_message {
        Some(msg) => msg,
        None => read_stdin().await?,
    };

    let mut state = SubmissionState {
        user_message,
        developer_message: config.form.developer_message.clone(),
        api_key: cli.api_key,
        ..SubmissionState::default()
    };

    let flow = ChatSubmissionFlow::new(HttpBackend::new(&config.backend.base_url)?);

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(name: "chat.submit.interrupt", "Interrupted, cancelling submission");
            on_ctrl_c.cancel();
        }
    });

    let mut view = TerminalView::stdio();
    let mut render_error = None;
    let outcome = state
        .submit_with(&flow, cancel, |s| {
            if render_error.is_none()
                && let Err(e) = view.update(s)
            {
                render_error = Some(e);
            }
        })
        .await;

    if let Some(e) = render_error {
        tracing::error!(error = %e, "Failed to write to the terminal");
    }

    Ok(outcome.is_success())
}

async fn read_stdin() -> anyhow::Result<String> {
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("reading user message from stdin")?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
