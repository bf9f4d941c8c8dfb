//! CLI handler for `meetbot serve`.
//!
//! Exposes the meeting control API. Each joined meeting gets its own
//! simulated platform that completes joins and grants recording on its own.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{ApiServer, MeetingState, PlatformFactory};
use crate::cli::simulate::simulation_config;
use crate::cli::ServeCliArgs;
use crate::platform::sim::SimPlatform;
use crate::platform::Platform;
use crate::registry::Registry;

pub async fn handle_serve_command(args: ServeCliArgs) -> Result<()> {
    let config = tokio::task::spawn_blocking(simulation_config).await??;
    let address = args.address.unwrap_or_else(|| config.api.address.clone());

    let registry = Registry::new();
    registry.set_recording_options(config.recording_options());

    let platforms: PlatformFactory =
        Arc::new(|| -> Arc<dyn Platform> { SimPlatform::new().with_auto_flow() });
    let state = MeetingState::new(
        registry,
        config.sdk_config(),
        config.bot.display_name.clone(),
        platforms,
    );

    ApiServer::new(address, state).start(shutdown_signal()).await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Interrupt received, leaving meetings"),
        Err(e) => {
            warn!("Cannot listen for interrupts: {}", e);
            std::future::pending::<()>().await
        }
    }
}
