//! folio-relay binary
//!
//! Serves `POST /api/chat` for the portfolio chat widget.

use anyhow::Context;
use clap::Parser;
use folio_relay::config::ProviderKind;
use folio_relay::{create_provider, shutdown_signal, ConfigLoader, RelayConfig, RelayServer, ServerConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "folio-relay")]
#[command(about = "Streaming relay between the portfolio chat widget and the completion API")]
#[command(version)]
struct Args {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server bind address, overrides the config file
    #[arg(short, long)]
    bind: Option<String>,

    /// CORS allowed origins (comma-separated), overrides the config file
    #[arg(long)]
    cors_origins: Option<String>,

    /// Answer with the offline echo provider instead of Mistral
    #[arg(long)]
    echo: bool,

    /// Disable per-request logging
    #[arg(long)]
    no_request_log: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    let mut relay_config = match &args.config {
        Some(path) => ConfigLoader::from_file(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => RelayConfig::default(),
    };

    if let Some(bind) = &args.bind {
        relay_config.server.bind_addr = bind.clone();
    }
    if let Some(origins) = &args.cors_origins {
        relay_config.server.cors_origins =
            origins.split(',').map(|s| s.trim().to_string()).collect();
    }
    if args.echo {
        relay_config.provider.kind = ProviderKind::Echo;
    }
    relay_config.validate()?;

    let config = ServerConfig::from_relay_config(&relay_config)?.with_logging(!args.no_request_log);
    let provider = create_provider(&relay_config.provider)
        .context("creating the completion provider")?;

    log::info!("Configuration:");
    log::info!("  Bind address: {}", config.bind_addr);
    log::info!("  Provider: {:?} ({})", relay_config.provider.kind, provider.model());
    log::info!("  Provider idle timeout: {:?}", config.idle_timeout);
    log::info!("  Max body size: {} bytes", config.max_body_size);
    log::info!("  SSE keep-alive: {:?}", config.sse_keepalive_interval);

    RelayServer::with_config(provider, config)
        .serve_with_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
