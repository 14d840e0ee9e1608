use std::path::PathBuf;

use clap::Parser;
use stagehand::prelude::*;

/// Staging lobby server with the placeholder active phase.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Interface to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
    /// Connections to accept before closing the listener
    #[arg(short, long)]
    max_clients: Option<usize>,
    /// Tick period in milliseconds
    #[arg(short, long)]
    tick_ms: Option<u64>,
    /// Start countdown in milliseconds
    #[arg(long)]
    countdown_ms: Option<u64>,
}

impl Args {
    fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(max_clients) = self.max_clients {
            config.max_clients = max_clients;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_period_ms = tick_ms;
        }
        if let Some(countdown_ms) = self.countdown_ms {
            config.countdown_ms = countdown_ms;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Args::parse().into_config()?;
    tracing::info!(addr = %config.bind_addr(), "starting lobby server");

    let server = StagehandServer::builder()
        .config(config)
        .build(PlaceholderActive::new())
        .await?;

    server.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from(["lobby-server", "--port", "4000", "-m", "5", "--countdown-ms", "250"]);
        let config = args.into_config().unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.max_clients, 5);
        assert_eq!(config.countdown_ms, 250);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_out_of_range_flag_rejected() {
        let args = Args::parse_from(["lobby-server", "--tick-ms", "0"]);
        assert!(matches!(args.into_config(), Err(ConfigError::Invalid(_))));
    }
}
