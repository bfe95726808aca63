//! Server Implementation
//!
//! HTTP 服务器启动和管理

use std::future::IntoFuture;
use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;

use crate::core::{Config, Result, ServerState};
use crate::services::HttpService;

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (for sharing with oneshot)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    /// Serve until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        let shutdown = CancellationToken::new();
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down...");
            signal_token.cancel();
        });
        self.run_until(shutdown).await
    }

    /// Serve until `shutdown` is cancelled; in-flight requests get
    /// `shutdown_timeout` to finish
    pub async fn run_until(&self, shutdown: CancellationToken) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        let http = HttpService::new(state);
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Market server listening on {}", addr);

        let grace = self.config.shutdown_timeout();
        let signal = shutdown.clone();
        let serve = axum::serve(listener, http.router().into_make_service())
            .with_graceful_shutdown(async move { signal.cancelled().await })
            .into_future();

        tokio::select! {
            result = serve => result?,
            _ = async {
                shutdown.cancelled().await;
                tokio::time::sleep(grace).await;
            } => {
                tracing::warn!(
                    grace_ms = grace.as_millis() as u64,
                    "Graceful shutdown window elapsed, exiting"
                );
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}
