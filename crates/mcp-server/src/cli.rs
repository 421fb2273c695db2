use clap::{Parser, ValueEnum};
use klaud_api_tools::config::DEFAULT_BASE_URL;
use klaud_api_tools::{ClientConfig, Credentials, Secret};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// MCP server (stdio) exposing the Klaud API catalog as tools.
#[derive(Debug, Parser)]
#[command(name = "klaud-api-mcp", version, about)]
pub struct Cli {
    /// Upstream API origin.
    #[arg(long, env = "KLAUD_API_BASE", default_value = DEFAULT_BASE_URL)]
    pub api_base: String,

    /// General API key, sent as the `key` query parameter on content endpoints.
    #[arg(long, env = "KLAUD_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Default key-value store token (a per-call `token` argument overrides it).
    #[arg(long, env = "KLAUD_STORE_TOKEN", hide_env_values = true)]
    pub store_token: Option<String>,

    /// Default agent token for messaging, registry and task endpoints.
    #[arg(long, env = "KLAUD_AGENT_TOKEN", hide_env_values = true)]
    pub agent_token: Option<String>,

    /// Log filter (overridden by `RUST_LOG`). Logs go to stderr.
    #[arg(long, env = "KLAUD_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "KLAUD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base.clone(),
            credentials: Credentials {
                api_key: self.api_key.clone().and_then(Secret::new),
                store_token: self.store_token.clone().and_then(Secret::new),
                agent_token: self.agent_token.clone().and_then(Secret::new),
            },
        }
    }
}
