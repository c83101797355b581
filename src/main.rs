//! Fish classification API - entry point

use clap::{Parser, Subcommand};
use fishid::{run_server, ServerConfig};

#[derive(Parser)]
#[command(name = "fishid", about = "Fish species classification REST API", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Bind address (defaults to API_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (defaults to API_PORT or 8080)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fishid=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::default();

    if let Some(Commands::Serve { host, port }) = cli.command {
        if let Some(host) = host {
            config.host = host;
        }
        if let Some(port) = port {
            config.port = port;
        }
    }

    run_server(config).await
}
