//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;

use super::middleware::{self, AllowedOrigins};
use super::routes::health;
use super::routes::nlquery::{self, NlQueryApiState};
use crate::core::CoreApp;
use crate::core::constants::DEFAULT_BODY_LIMIT;
use crate::core::shutdown::ShutdownService;
use crate::domain::SearchBridge;

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let allowed_origins = AllowedOrigins::new(&app.config.server.host, app.config.server.port);
        Self {
            app,
            allowed_origins,
        }
    }

    /// Returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self {
            app,
            allowed_origins,
        } = self;

        let shutdown = app.shutdown.clone();
        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);

        let cancel = cancellation_token_from_shutdown(&shutdown);
        let router = build_router(&app, &allowed_origins, cancel);

        let listener = TcpListener::bind(addr).await?;
        tracing::debug!(addr = %addr, "API server listening");
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.wait())
        .await?;

        Ok(app)
    }
}

fn build_router(
    app: &CoreApp,
    allowed_origins: &AllowedOrigins,
    cancel: CancellationToken,
) -> Router {
    let router = Router::new().route("/api/v1/health", get(health::health));

    let router = match &app.nlquery {
        Some(components) => {
            let state = NlQueryApiState {
                nlquery: components.clone(),
                bridge: Arc::new(SearchBridge::new(app.repository.clone())),
                cancel,
            };
            router.nest("/api/nlquery", nlquery::routes(state))
        }
        None => router,
    };

    router
        .fallback(middleware::handle_404)
        .layer(CompressionLayer::new())
        .layer(middleware::cors(allowed_origins))
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
}

/// Token cancelled once shutdown is triggered, for in-flight model calls
pub fn cancellation_token_from_shutdown(shutdown: &ShutdownService) -> CancellationToken {
    let token = CancellationToken::new();
    let mut rx = shutdown.subscribe();
    let t = token.clone();
    tokio::spawn(async move {
        let _ = rx.wait_for(|&v| v).await;
        t.cancel();
    });
    token
}
