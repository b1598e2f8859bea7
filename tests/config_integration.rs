use chat_stream_form::config::{AppConfig, DEFAULT_API_URL, LogFormat};
use chat_stream_form::state::DEFAULT_DEVELOPER_MESSAGE;
use serial_test::serial;
use std::env;
use std::fs;

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("CHAT__BACKEND__BASE_URL");
        env::remove_var("CHAT__LOGGING__FORMAT");
        env::remove_var("CHAT_API_URL");
        env::remove_var("CONFIG_FILE");
        env::remove_var("LOG_FORMAT");
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args(["chat-stream-form"]).expect("defaults load");
    assert_eq!(config.backend.base_url, DEFAULT_API_URL);
    assert_eq!(config.form.developer_message, DEFAULT_DEVELOPER_MESSAGE);
    assert_eq!(config.logging.format, LogFormat::Text);
    assert_eq!(config.logging.filter, "info");
}

#[test]
#[serial]
fn test_prefixed_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("CHAT__BACKEND__BASE_URL", "http://10.0.0.2:9000");
        env::set_var("CHAT__LOGGING__FORMAT", "json");
    }

    let config = AppConfig::load_from_args(["chat-stream-form"]).expect("Failed to load config");
    assert_eq!(config.backend.base_url, "http://10.0.0.2:9000");
    assert_eq!(config.logging.format, LogFormat::Json);

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_env_var_beats_prefixed_env() {
    clear_env_vars();
    unsafe {
        env::set_var("CHAT__BACKEND__BASE_URL", "http://10.0.0.2:9000");
        env::set_var("CHAT_API_URL", "http://api.internal:8000");
    }

    let config = AppConfig::load_from_args(["chat-stream-form"]).expect("Failed to load config");
    assert_eq!(config.backend.base_url, "http://api.internal:8000");

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_flags_override_everything() {
    clear_env_vars();
    unsafe {
        env::set_var("CHAT_API_URL", "http://api.internal:8000");
    }

    let config = AppConfig::load_from_args([
        "chat-stream-form",
        "--api-url",
        "http://127.0.0.1:7000",
        "--developer-message",
        "Answer in French.",
        "--log-format",
        "json",
    ])
    .expect("Failed to load config");

    assert_eq!(config.backend.base_url, "http://127.0.0.1:7000");
    assert_eq!(config.form.developer_message, "Answer in French.");
    assert_eq!(config.logging.format, LogFormat::Json);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let dir = tempfile::tempdir().expect("temp dir");
    let file_path = dir.path().join("chat.yaml");
    fs::write(
        &file_path,
        r"
backend:
  base_url: http://files.example:8080
form:
  developer_message: You are terse.
logging:
  filter: debug
",
    )
    .expect("Failed to write temp config");

    // Tell AppConfig to use this file via Env Var
    unsafe {
        env::set_var("CONFIG_FILE", &file_path);
    }

    let config = AppConfig::load_from_args(["chat-stream-form"])
        .expect("Failed to load config from file");
    assert_eq!(config.backend.base_url, "http://files.example:8080");
    assert_eq!(config.form.developer_message, "You are terse.");
    assert_eq!(config.logging.filter, "debug");
    assert_eq!(config.logging.format, LogFormat::Text);

    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    clear_env_vars();

    let result = AppConfig::load_from_args([
        "chat-stream-form",
        "--config",
        "/nonexistent/chat-stream-form.yaml",
    ]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_invalid_base_url_is_rejected() {
    clear_env_vars();

    let err = AppConfig::load_from_args(["chat-stream-form", "--api-url", "not a url"])
        .expect_err("invalid URL must fail");
    assert!(err.to_string().contains("backend.base_url"));
}
