use axum::Router;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::metrics::RelayMetrics;
use crate::registry::ConnectionRegistry;

pub struct RelayServer {
    config: ServerConfig,
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<RelayMetrics>,
    shutdown_tx: watch::Sender<bool>,
}

impl RelayServer {
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let registry = Arc::new(ConnectionRegistry::new(config.forward_queue_depth));
        let metrics = Arc::new(RelayMetrics::new()?);
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            registry,
            metrics,
            shutdown_tx,
        })
    }

    pub async fn start(&self) -> anyhow::Result<()> {
        let state = AppState {
            registry: self.registry.clone(),
            metrics: Arc::clone(&self.metrics),
            config: self.config.clone(),
        };

        let app = Router::new()
            .route("/v1/ws", axum::routing::get(crate::api::ws_handler))
            .route("/v1/send", axum::routing::post(crate::api::post_send))
            .route("/health", axum::routing::get(crate::api::get_health))
            .route("/metrics", axum::routing::get(crate::api::get_metrics))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let shutdown_rx = self.shutdown_tx.subscribe();

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        info!("amora-relay listening on {}", self.config.bind_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(Self::shutdown_signal(shutdown_rx))
            .await?;

        Ok(())
    }

    async fn shutdown_signal(mut shutdown: watch::Receiver<bool>) {
        #[cfg(unix)]
        let mut sigterm = {
            use tokio::signal::unix::{signal, SignalKind};
            signal(SignalKind::terminate()).ok()
        };

        tokio::select! {
            _ = async {
                #[cfg(unix)]
                {
                    if let Some(ref mut sigterm) = sigterm {
                        sigterm.recv().await;
                    }
                }
                #[cfg(not(unix))]
                {
                    std::future::pending::<()>().await;
                }
            } => {
                info!("Received SIGTERM, starting graceful shutdown");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, starting graceful shutdown");
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("Shutdown requested");
                }
            }
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
