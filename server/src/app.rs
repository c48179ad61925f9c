//! Core application

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::{JaegerClient, TraceRepository};
use crate::domain::NlQueryComponents;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub repository: Arc<dyn TraceRepository>,
    /// `None` when natural-language query is disabled
    pub nlquery: Option<Arc<NlQueryComponents>>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Start) | None => {
                let app = Self::init(&cli_config).await?;
                Self::start_server(app).await
            }
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let repository: Arc<dyn TraceRepository> = Arc::new(
            JaegerClient::new(
                &config.jaeger.url,
                Duration::from_secs(config.jaeger.timeout_secs),
            )
            .context("Failed to initialize trace backend client")?,
        );
        tracing::debug!(url = %config.jaeger.url, "Trace backend configured");

        let nlquery = NlQueryComponents::from_config(&config.nlquery, &config.sessions)
            .await
            .context("Failed to initialize natural-language query")?
            .map(Arc::new);

        let shutdown = ShutdownService::new(nlquery.clone());

        Ok(Self {
            shutdown,
            config,
            repository,
            nlquery,
        })
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        let extractor = app.nlquery.as_ref().map(|n| n.extractor_kind());
        let analysis = app
            .nlquery
            .as_ref()
            .is_some_and(|n| n.analyzer.is_some());
        banner::print_banner(&app.config, extractor, analysis);

        // Bind failures still need the session store closed
        let shutdown = app.shutdown.clone();
        let result = ApiServer::new(app).start().await;
        shutdown.shutdown().await;

        result.map(|_| ())
    }
}
