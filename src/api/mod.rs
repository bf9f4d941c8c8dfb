//! REST control API for Meetbot.
//!
//! Provides HTTP endpoints for:
//! - Health checks
//! - Joining, inspecting and leaving meetings

pub mod error;
pub mod routes;

use anyhow::{Context, Result};
use axum::Router;
use std::future::Future;
use std::time::Duration;
use tower::ServiceBuilder;
use tracing::{info, warn};

pub use routes::meetings::{JoinRequest, MeetingState, MeetingView, PlatformFactory};

const PUMP_INTERVAL: Duration = Duration::from_millis(10);

pub struct ApiServer {
    address: String,
    state: MeetingState,
}

impl ApiServer {
    pub fn new(address: impl Into<String>, state: MeetingState) -> Self {
        Self {
            address: address.into(),
            state,
        }
    }

    pub fn router(state: MeetingState) -> Router {
        Router::new()
            .merge(routes::health::router(state.clone()))
            .nest("/api", routes::meetings::router(state))
            .layer(ServiceBuilder::new())
    }

    /// Serves until `shutdown` resolves, then leaves every meeting.
    pub async fn start(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.address)
            .await
            .with_context(|| format!("Failed to bind API server to {}", self.address))?;

        info!("API server listening on http://{}", self.address);
        info!("Endpoints:");
        info!("  GET    /health                   - Service health");
        info!("  GET    /api/meetings             - List meetings");
        info!("  POST   /api/meetings             - Join a meeting");
        info!("  GET    /api/meetings/:meeting_id - Meeting status");
        info!("  DELETE /api/meetings/:meeting_id - Leave a meeting");

        let pump = tokio::spawn(pump_platforms(self.state.clone()));

        axum::serve(listener, Self::router(self.state.clone()))
            .with_graceful_shutdown(shutdown)
            .await?;

        pump.abort();
        let state = self.state;
        tokio::task::spawn_blocking(move || state.shutdown()).await?;
        info!("API server stopped");
        Ok(())
    }
}

/// Delivers platform events for every served meeting. Event handlers may
/// block (audio subscribe retries), so each round runs off the runtime.
async fn pump_platforms(state: MeetingState) {
    let mut ticker = tokio::time::interval(PUMP_INTERVAL);
    loop {
        ticker.tick().await;
        let round = state.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || round.pump()).await {
            warn!("platform event round failed: {}", e);
        }
    }
}
