pub mod routes;

use crate::config::ServiceConfig;
use crate::core::etl::EtlEngine;
use crate::core::pipeline::GeocodePipeline;
use crate::core::Pipeline;
use crate::utils::error::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

pub const GEOLOCATE_PATH: &str = "/api/geolocate";

pub struct AppState<P: Pipeline> {
    pub engine: Arc<EtlEngine<P>>,
}

impl<P: Pipeline> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

pub fn router<P: Pipeline + 'static>(engine: EtlEngine<P>, max_upload_bytes: usize) -> Router {
    let state = AppState {
        engine: Arc::new(engine),
    };

    Router::new()
        .route("/", get(routes::upload_page))
        .route("/web-version", get(routes::upload_page))
        .route(GEOLOCATE_PATH, post(routes::geolocate::<P>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(config: &ServiceConfig) -> Result<()> {
    let addr = config.listen_addr()?;
    let pipeline = GeocodePipeline::from_config(config.clone())?;
    let app = router(EtlEngine::new(pipeline), config.max_upload_bytes());

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    tracing::info!(
        "geocoding via {} ({} concurrent requests, {:?} row failure policy)",
        config.geocode_endpoint,
        config.concurrent_requests,
        config.row_failure
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("shutdown signal received");
}
