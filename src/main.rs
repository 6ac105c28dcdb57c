use anyhow::Result;
use clap::{Parser, Subcommand};
use huedebug_config::Config;
use huedebug_proxy::Debugger;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "huedebug", about = "Hue Remote API login and debugging proxy")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the debugger server.
    Serve {
        /// Path to the YAML configuration file.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Override the listening port (default: 8080).
        #[arg(short, long)]
        port: Option<u16>,
        /// Override the listening address (default: 0.0.0.0).
        #[arg(long)]
        host: Option<String>,
    },
    /// Print the effective configuration with secrets masked.
    Config {
        /// Path to the YAML configuration file.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, port, host } => cmd_serve(config, port, host).await,
        Commands::Config { config } => cmd_config(config),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    Config::load(path.map(PathBuf::as_path)).map_err(|e| anyhow::anyhow!("config error: {e}"))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn cmd_serve(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    host: Option<String>,
) -> Result<()> {
    let mut config = load_config(config_path.as_ref())?;
    if let Some(p) = port {
        config.port = p;
    }
    if let Some(h) = host {
        config.host = h;
    }
    init_tracing(config.log.json);

    let debugger = Debugger::from_config(&config)?;
    tracing::info!(
        version = %config.api_version,
        upstream = %debugger.target().host,
        prefixes = ?config.proxy_prefixes,
        "debugger configured"
    );
    let app = huedebug_proxy::make_router(Arc::new(debugger));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{addr}");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

fn cmd_config(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_ref())?;
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}
