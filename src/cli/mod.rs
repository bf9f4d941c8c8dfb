use clap::{Args as ClapArgs, Parser, Subcommand};

pub mod config;
pub mod serve;
pub mod simulate;

pub use config::handle_config_command;
pub use serve::handle_serve_command;
pub use simulate::handle_simulate_command;

#[derive(Parser, Debug)]
#[command(name = "meetbot")]
#[command(about = "Headless meeting bot with raw audio and share capture", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Join meetings on the simulated platform and capture raw media
    Simulate(SimulateCliArgs),
    /// Serve the meeting control API on simulated platforms
    Serve(ServeCliArgs),
    /// Inspect the configuration file
    Config(ConfigCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SimulateCliArgs {
    /// Meeting id and password pairs: <ID> <PASSWORD> [<ID> <PASSWORD> ...]
    #[arg(required = true, num_args = 2.., value_names = ["ID", "PASSWORD"])]
    pub meetings: Vec<String>,
    /// Capture raw audio
    #[arg(long)]
    pub audio: bool,
    /// Capture the shared screen
    #[arg(long)]
    pub video: bool,
    /// Frames to push per captured stream before leaving
    #[arg(long, default_value = "50")]
    pub frames: u32,
    /// Display name in the meeting (defaults to the configured name)
    #[arg(long)]
    pub name: Option<String>,
    /// Print the final statistics as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeCliArgs {
    /// Listen address (defaults to the configured `api.address`)
    #[arg(long)]
    pub address: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct ConfigCliArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration with secrets masked
    Show,
    /// Print the configuration file path
    Path,
}
