//! Server Implementation
//!
//! HTTP 服务器启动和管理

use crate::core::{Config, ServerState};

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

    /// Create server with existing state (for sharing with tests)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config),
        };

        // Start background tasks (initial full sync)
        state.start_background_tasks();

        let app = crate::api::router(state.clone());

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        tracing::info!("Atelier Order Server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        let shutdown = state.shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutting down...");
                        shutdown.cancel();
                    }
                    _ = shutdown.cancelled() => {}
                }
            })
            .await?;

        Ok(())
    }
}
