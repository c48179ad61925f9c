use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_HOST, ENV_JAEGER_URL, ENV_NLQUERY_ENABLED, ENV_NLQUERY_ENDPOINT,
    ENV_NLQUERY_EXTRACTOR, ENV_NLQUERY_MAX_TOKENS, ENV_NLQUERY_MODEL, ENV_NLQUERY_PROVIDER,
    ENV_NLQUERY_TEMPERATURE, ENV_PORT, ENV_SESSION_MAX_MESSAGES, ENV_SESSION_TTL_SECS,
};
use crate::domain::nlquery::ExtractorKind;

#[derive(Parser)]
#[command(name = "nlquery")]
#[command(
    version,
    about = "Natural-language trace search and analysis",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Enable or disable the natural-language endpoints
    #[arg(long, global = true, env = ENV_NLQUERY_ENABLED)]
    pub nlquery_enabled: Option<bool>,

    /// Model provider (ollama)
    #[arg(long, global = true, env = ENV_NLQUERY_PROVIDER)]
    pub provider: Option<String>,

    /// Model provider base URL, e.g. http://localhost:11434
    #[arg(long, global = true, env = ENV_NLQUERY_ENDPOINT)]
    pub endpoint: Option<String>,

    /// Model name, e.g. qwen2.5:1.5b
    #[arg(long, global = true, env = ENV_NLQUERY_MODEL)]
    pub model: Option<String>,

    /// Sampling temperature (0.0 - 1.0)
    #[arg(long, global = true, env = ENV_NLQUERY_TEMPERATURE)]
    pub temperature: Option<f32>,

    /// Output token limit
    #[arg(long, global = true, env = ENV_NLQUERY_MAX_TOKENS)]
    pub max_tokens: Option<u32>,

    /// Extractor variant (stub, heuristic or llm)
    #[arg(long, global = true, env = ENV_NLQUERY_EXTRACTOR, value_parser = parse_extractor_kind)]
    pub extractor: Option<ExtractorKind>,

    /// Session idle timeout in seconds
    #[arg(long, global = true, env = ENV_SESSION_TTL_SECS)]
    pub session_ttl_secs: Option<u64>,

    /// Maximum messages kept per session
    #[arg(long, global = true, env = ENV_SESSION_MAX_MESSAGES)]
    pub session_max_messages: Option<usize>,

    /// Jaeger query API base URL
    #[arg(long, global = true, env = ENV_JAEGER_URL)]
    pub jaeger_url: Option<String>,
}

/// Parse extractor variant from CLI/env string
fn parse_extractor_kind(s: &str) -> Result<ExtractorKind, String> {
    s.parse()
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub nlquery_enabled: Option<bool>,
    pub provider: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub extractor: Option<ExtractorKind>,
    pub session_ttl_secs: Option<u64>,
    pub session_max_messages: Option<usize>,
    pub jaeger_url: Option<String>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        nlquery_enabled: cli.nlquery_enabled,
        provider: cli.provider,
        endpoint: cli.endpoint,
        model: cli.model,
        temperature: cli.temperature,
        max_tokens: cli.max_tokens,
        extractor: cli.extractor,
        session_ttl_secs: cli.session_ttl_secs,
        session_max_messages: cli.session_max_messages,
        jaeger_url: cli.jaeger_url,
    };
    (config, cli.command)
}
