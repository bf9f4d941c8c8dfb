use anyhow::Result;
use clap::Parser;
use meetbot::cli::{
    handle_config_command, handle_serve_command, handle_simulate_command, Cli, CliCommand,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        CliCommand::Version => {
            println!("Meetbot {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliCommand::Config(args) => handle_config_command(args),
        CliCommand::Serve(args) => handle_serve_command(args).await,
        CliCommand::Simulate(args) => {
            let cancel = Arc::new(AtomicBool::new(false));
            let interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupt received, leaving meetings");
                    interrupt.store(true, Ordering::SeqCst);
                }
            });

            tokio::task::spawn_blocking(move || handle_simulate_command(args, cancel)).await?
        }
    }
}
