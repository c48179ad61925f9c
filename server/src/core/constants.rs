// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "NLQuery";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "nlquery";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".nlquery";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "nlquery.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "NLQUERY_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "NLQUERY_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "NLQUERY_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "NLQUERY_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5390;

/// Default body limit for API requests (1 MB)
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

// =============================================================================
// Environment Variables - Natural Language Query
// =============================================================================

/// Enable or disable the natural-language endpoints
pub const ENV_NLQUERY_ENABLED: &str = "NLQUERY_ENABLED";

/// Model provider (currently only `ollama`)
pub const ENV_NLQUERY_PROVIDER: &str = "NLQUERY_PROVIDER";

/// Model provider base URL
pub const ENV_NLQUERY_ENDPOINT: &str = "NLQUERY_ENDPOINT";

/// Model name
pub const ENV_NLQUERY_MODEL: &str = "NLQUERY_MODEL";

/// Sampling temperature (0.0 - 1.0)
pub const ENV_NLQUERY_TEMPERATURE: &str = "NLQUERY_TEMPERATURE";

/// Output token limit
pub const ENV_NLQUERY_MAX_TOKENS: &str = "NLQUERY_MAX_TOKENS";

/// Extractor variant (stub, heuristic, llm)
pub const ENV_NLQUERY_EXTRACTOR: &str = "NLQUERY_EXTRACTOR";

// =============================================================================
// Natural Language Query Defaults
// =============================================================================

/// Only supported model provider
pub const PROVIDER_OLLAMA: &str = "ollama";

/// Default sampling temperature (deterministic)
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Default output token limit for extraction
pub const DEFAULT_MAX_TOKENS: u32 = 256;

/// Lower bound on output tokens for analysis answers
pub const MIN_ANALYSIS_MAX_TOKENS: u32 = 512;

/// Model request timeout in seconds
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// Sessions
// =============================================================================

/// Environment variable for session idle TTL (seconds)
pub const ENV_SESSION_TTL_SECS: &str = "NLQUERY_SESSION_TTL_SECS";

/// Environment variable for maximum messages per session
pub const ENV_SESSION_MAX_MESSAGES: &str = "NLQUERY_SESSION_MAX_MESSAGES";

/// Default session idle TTL (30 minutes)
pub const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;

/// Default maximum messages per session
pub const DEFAULT_SESSION_MAX_MESSAGES: usize = 50;

/// Default interval between expired-session sweeps (5 minutes)
pub const DEFAULT_SESSION_SWEEP_INTERVAL_SECS: u64 = 5 * 60;

/// Random bytes in a session id (hex-encoded to 32 characters)
pub const SESSION_ID_BYTES: usize = 16;

// =============================================================================
// Trace Backend
// =============================================================================

/// Environment variable for the Jaeger query API base URL
pub const ENV_JAEGER_URL: &str = "NLQUERY_JAEGER_URL";

/// Default Jaeger query API base URL
pub const DEFAULT_JAEGER_URL: &str = "http://localhost:16686";

/// Default trace backend request timeout in seconds
pub const DEFAULT_JAEGER_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Shutdown
// =============================================================================

/// Graceful shutdown timeout in seconds
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;
