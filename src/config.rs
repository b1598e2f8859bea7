use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::state::DEFAULT_DEVELOPER_MESSAGE;

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Parser, Clone)]
#[command(author, version, about = "Send one message to a streaming chat backend", long_about = None)]
pub struct Cli {
    /// Config file path (YAML, TOML or JSON)
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Backend base URL; requests go to <URL>/api/chat
    #[arg(long, env = "CHAT_API_URL")]
    pub api_url: Option<String>,

    /// Key forwarded to the backend
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, default_value = "")]
    pub api_key: String,

    /// Developer/system message
    #[arg(short, long)]
    pub developer_message: Option<String>,

    /// User message; read from stdin when omitted
    #[arg(short, long)]
    pub user_message: Option<String>,

    /// Log output format: text or json
    #[arg(long, env = "LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

impl std::fmt::Debug for Cli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cli")
            .field("config", &self.config)
            .field("api_url", &self.api_url)
            .field("has_api_key", &!self.api_key.is_empty())
            .field("developer_message", &self.developer_message)
            .field("user_message", &self.user_message)
            .field("log_format", &self.log_format)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub form: FormConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FormConfig {
    pub developer_message: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|e| ConfigError::Message(e.to_string()))?;
        Self::load_from_cli(&cli)
    }

    /// Layer defaults, config file, `CHAT__*` environment and CLI flags.
    ///
    /// Priority: CLI flag > CLI env var > `CHAT__*` env > config file > defaults.
    pub fn load_from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("backend.base_url", DEFAULT_API_URL)?
            .set_default("form.developer_message", DEFAULT_DEVELOPER_MESSAGE)?
            .set_default("logging.format", "text")?
            .set_default("logging.filter", "info")?;

        // An explicit path must exist; ./chat.{yaml,toml,json} is optional.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path).required(true)),
            None => builder.add_source(File::with_name("chat").required(false)),
        };

        // E.g. CHAT__BACKEND__BASE_URL=http://10.0.0.2:8000
        builder = builder.add_source(
            Environment::with_prefix("CHAT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(url) = &cli.api_url {
            builder = builder.set_override("backend.base_url", url.as_str())?;
        }
        if let Some(msg) = &cli.developer_message {
            builder = builder.set_override("form.developer_message", msg.as_str())?;
        }
        if let Some(format) = cli.log_format {
            let format = match format {
                LogFormat::Text => "text",
                LogFormat::Json => "json",
            };
            builder = builder.set_override("logging.format", format)?;
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let base = self.backend.base_url.trim();
        if base.is_empty() {
            return Err(ConfigError::Message(
                "backend.base_url cannot be empty".to_string(),
            ));
        }
        url::Url::parse(base).map_err(|e| {
            ConfigError::Message(format!("backend.base_url is not a valid URL ({base}): {e}"))
        })?;
        Ok(())
    }
}
