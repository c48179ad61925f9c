use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::llm::GenerateOptions;
use crate::domain::nlquery::{ExtractorKind, SessionConfig};
use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_HOST, DEFAULT_JAEGER_TIMEOUT_SECS,
    DEFAULT_JAEGER_URL, DEFAULT_MAX_TOKENS, DEFAULT_PORT, DEFAULT_SESSION_MAX_MESSAGES,
    DEFAULT_SESSION_SWEEP_INTERVAL_SECS, DEFAULT_SESSION_TTL_SECS, DEFAULT_TEMPERATURE,
    MIN_ANALYSIS_MAX_TOKENS, PROVIDER_OLLAMA,
};

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Natural-language query configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct NlQueryFileConfig {
    pub enabled: Option<bool>,
    pub provider: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub extractor: Option<ExtractorKind>,
}

/// Conversation session limits
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SessionsFileConfig {
    pub ttl_secs: Option<u64>,
    pub max_messages: Option<usize>,
    pub sweep_interval_secs: Option<u64>,
}

/// Trace backend section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct JaegerFileConfig {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub nlquery: Option<NlQueryFileConfig>,
    pub sessions: Option<SessionsFileConfig>,
    pub jaeger: Option<JaegerFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        // Server
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                tracing::trace!(host = ?server.host, "Merging server.host");
                current.host = server.host;
            }
            if server.port.is_some() {
                tracing::trace!(port = ?server.port, "Merging server.port");
                current.port = server.port;
            }
        }

        // NL query
        if let Some(nlquery) = other.nlquery {
            let current = self.nlquery.get_or_insert_with(NlQueryFileConfig::default);
            if nlquery.enabled.is_some() {
                tracing::trace!(enabled = ?nlquery.enabled, "Merging nlquery.enabled");
                current.enabled = nlquery.enabled;
            }
            if nlquery.provider.is_some() {
                tracing::trace!(provider = ?nlquery.provider, "Merging nlquery.provider");
                current.provider = nlquery.provider;
            }
            if nlquery.endpoint.is_some() {
                tracing::trace!(endpoint = ?nlquery.endpoint, "Merging nlquery.endpoint");
                current.endpoint = nlquery.endpoint;
            }
            if nlquery.model.is_some() {
                tracing::trace!(model = ?nlquery.model, "Merging nlquery.model");
                current.model = nlquery.model;
            }
            if nlquery.temperature.is_some() {
                tracing::trace!(temperature = ?nlquery.temperature, "Merging nlquery.temperature");
                current.temperature = nlquery.temperature;
            }
            if nlquery.max_tokens.is_some() {
                tracing::trace!(max_tokens = ?nlquery.max_tokens, "Merging nlquery.max_tokens");
                current.max_tokens = nlquery.max_tokens;
            }
            if nlquery.extractor.is_some() {
                tracing::trace!(extractor = ?nlquery.extractor, "Merging nlquery.extractor");
                current.extractor = nlquery.extractor;
            }
        }

        // Sessions
        if let Some(sessions) = other.sessions {
            let current = self.sessions.get_or_insert_with(SessionsFileConfig::default);
            if sessions.ttl_secs.is_some() {
                tracing::trace!(ttl_secs = ?sessions.ttl_secs, "Merging sessions.ttl_secs");
                current.ttl_secs = sessions.ttl_secs;
            }
            if sessions.max_messages.is_some() {
                tracing::trace!(max_messages = ?sessions.max_messages, "Merging sessions.max_messages");
                current.max_messages = sessions.max_messages;
            }
            if sessions.sweep_interval_secs.is_some() {
                tracing::trace!(
                    sweep_interval_secs = ?sessions.sweep_interval_secs,
                    "Merging sessions.sweep_interval_secs"
                );
                current.sweep_interval_secs = sessions.sweep_interval_secs;
            }
        }

        // Jaeger
        if let Some(jaeger) = other.jaeger {
            let current = self.jaeger.get_or_insert_with(JaegerFileConfig::default);
            if jaeger.url.is_some() {
                tracing::trace!(url = ?jaeger.url, "Merging jaeger.url");
                current.url = jaeger.url;
            }
            if jaeger.timeout_secs.is_some() {
                tracing::trace!(timeout_secs = ?jaeger.timeout_secs, "Merging jaeger.timeout_secs");
                current.timeout_secs = jaeger.timeout_secs;
            }
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Natural-language query configuration
#[derive(Debug, Clone)]
pub struct NlQueryConfig {
    pub enabled: bool,
    /// Lowercased provider name; `None` runs without a model
    pub provider: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Resolved variant: explicit value, else `llm` with a provider, else `heuristic`
    pub extractor: ExtractorKind,
}

impl NlQueryConfig {
    /// Options for structured extraction
    pub fn extraction_options(&self) -> GenerateOptions {
        GenerateOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            json_mode: true,
        }
    }

    /// Output token limit for analysis answers
    pub fn analysis_max_tokens(&self) -> u32 {
        self.max_tokens.max(MIN_ANALYSIS_MAX_TOKENS)
    }
}

/// Session store configuration
#[derive(Debug, Clone)]
pub struct SessionsConfig {
    pub ttl_secs: u64,
    pub max_messages: usize,
    pub sweep_interval_secs: u64,
}

impl SessionsConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            ttl: Duration::from_secs(self.ttl_secs),
            max_messages: self.max_messages,
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
        }
    }
}

/// Trace backend configuration
#[derive(Debug, Clone)]
pub struct JaegerConfig {
    pub url: String,
    pub timeout_secs: u64,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub nlquery: NlQueryConfig,
    pub sessions: SessionsConfig,
    pub jaeger: JaegerConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.nlquery/nlquery.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir (~/.nlquery/nlquery.json) - skip if not exists
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::from_layers(cli, file_config);
        config.validate()?;
        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    pub(crate) fn from_layers(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_nlquery = file_config.nlquery.unwrap_or_default();
        let file_sessions = file_config.sessions.unwrap_or_default();
        let file_jaeger = file_config.jaeger.unwrap_or_default();

        let host = cli
            .host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT);

        // Empty provider string means "no model"
        let provider = cli
            .provider
            .clone()
            .or(file_nlquery.provider)
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty());

        let extractor = cli
            .extractor
            .or(file_nlquery.extractor)
            .unwrap_or(if provider.is_some() {
                ExtractorKind::Llm
            } else {
                ExtractorKind::Heuristic
            });

        let nlquery = NlQueryConfig {
            enabled: cli
                .nlquery_enabled
                .or(file_nlquery.enabled)
                .unwrap_or(true),
            provider,
            endpoint: cli
                .endpoint
                .clone()
                .or(file_nlquery.endpoint)
                .unwrap_or_default(),
            model: cli.model.clone().or(file_nlquery.model).unwrap_or_default(),
            temperature: cli
                .temperature
                .or(file_nlquery.temperature)
                .unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: cli
                .max_tokens
                .or(file_nlquery.max_tokens)
                .unwrap_or(DEFAULT_MAX_TOKENS),
            extractor,
        };

        let sessions = SessionsConfig {
            ttl_secs: cli
                .session_ttl_secs
                .or(file_sessions.ttl_secs)
                .unwrap_or(DEFAULT_SESSION_TTL_SECS),
            max_messages: cli
                .session_max_messages
                .or(file_sessions.max_messages)
                .unwrap_or(DEFAULT_SESSION_MAX_MESSAGES),
            sweep_interval_secs: file_sessions
                .sweep_interval_secs
                .unwrap_or(DEFAULT_SESSION_SWEEP_INTERVAL_SECS),
        };

        let jaeger = JaegerConfig {
            url: cli
                .jaeger_url
                .clone()
                .or(file_jaeger.url)
                .unwrap_or_else(|| DEFAULT_JAEGER_URL.to_string()),
            timeout_secs: file_jaeger
                .timeout_secs
                .unwrap_or(DEFAULT_JAEGER_TIMEOUT_SECS),
        };

        let config = Self {
            server: ServerConfig { host, port },
            nlquery,
            sessions,
            jaeger,
        };
        tracing::debug!(config = ?config, "Configuration resolved");
        config
    }

    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        if self.jaeger.url.trim().is_empty() {
            anyhow::bail!("Configuration error: jaeger.url must not be empty");
        }
        if self.jaeger.timeout_secs == 0 {
            anyhow::bail!("Configuration error: jaeger.timeout_secs must be greater than 0");
        }

        if self.sessions.ttl_secs == 0 {
            anyhow::bail!("Configuration error: sessions.ttl_secs must be greater than 0");
        }
        if self.sessions.max_messages == 0 {
            anyhow::bail!("Configuration error: sessions.max_messages must be greater than 0");
        }
        if self.sessions.sweep_interval_secs == 0 {
            anyhow::bail!(
                "Configuration error: sessions.sweep_interval_secs must be greater than 0"
            );
        }

        let nlquery = &self.nlquery;
        if !nlquery.enabled {
            return Ok(());
        }

        if !nlquery.temperature.is_finite() || !(0.0..=1.0).contains(&nlquery.temperature) {
            anyhow::bail!(
                "Configuration error: nlquery.temperature must be between 0 and 1, got {}",
                nlquery.temperature
            );
        }

        match nlquery.provider.as_deref() {
            Some(PROVIDER_OLLAMA) => {
                if nlquery.endpoint.trim().is_empty() {
                    anyhow::bail!(
                        "Configuration error: nlquery.endpoint is required when a provider is set"
                    );
                }
                if nlquery.model.trim().is_empty() {
                    anyhow::bail!(
                        "Configuration error: nlquery.model is required when a provider is set"
                    );
                }
            }
            Some(other) => {
                anyhow::bail!(
                    "Configuration error: unsupported nlquery.provider '{}'. Valid options: {}",
                    other,
                    PROVIDER_OLLAMA
                );
            }
            None => {
                if nlquery.extractor == ExtractorKind::Llm {
                    anyhow::bail!(
                        "Configuration error: nlquery.extractor 'llm' requires nlquery.provider"
                    );
                }
            }
        }

        if is_all_interfaces(&self.server.host) {
            tracing::warn!(
                host = %self.server.host,
                "Server is bound to all interfaces and has no authentication"
            );
        }

        Ok(())
    }
}

/// Get the profile config path (~/.nlquery/nlquery.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Check if host binds to all network interfaces
pub(crate) fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}
