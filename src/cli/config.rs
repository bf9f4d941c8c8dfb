//! CLI handler for `meetbot config`.

use crate::cli::{ConfigCliArgs, ConfigCommand};
use crate::config::Config;
use anyhow::Result;

pub fn handle_config_command(args: ConfigCliArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Show => handle_show(),
        ConfigCommand::Path => {
            println!("{}", Config::config_path()?.display());
            Ok(())
        }
    }
}

fn handle_show() -> Result<()> {
    let config = Config::load()?;

    println!();
    println!("Meetbot Configuration");
    println!("=====================");
    println!();
    println!("SDK:");
    println!("  Key:          {}", mask_secret(&config.sdk.key));
    println!("  Secret:       {}", mask_secret(&config.sdk.secret));
    println!("  Web domain:   {}", config.sdk.web_domain);
    println!(
        "  Proxy:        {}",
        config.sdk.proxy.as_deref().unwrap_or("<auto-detect>")
    );
    println!("  Auth timeout: {}s", config.sdk.auth_timeout_seconds);
    println!("  JWT lifetime: {}h", config.sdk.jwt_ttl_hours);
    println!();
    println!("Bot:");
    println!("  Display name: {}", config.bot.display_name);
    println!();
    println!("Capture:");
    println!(
        "  Audio retry:  {} attempts every {}ms",
        config.capture.audio_subscribe_attempts, config.capture.audio_subscribe_interval_ms
    );
    println!("  Resolution:   {:?}", config.capture.video_resolution);
    println!();
    println!("API:");
    println!("  Address:      {}", config.api.address);
    println!();
    println!("Config file:    {}", Config::config_path()?.display());

    if let Err(e) = config.validate() {
        println!();
        println!("Warning: {e}");
    }

    Ok(())
}

fn mask_secret(secret: &str) -> String {
    match secret.len() {
        0 => "<not set>".to_string(),
        len if len > 8 => format!("{}****{}", &secret[..4], &secret[len - 2..]),
        len => "*".repeat(len),
    }
}
