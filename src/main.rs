//! tenant-router
//!
//! An edge proxy for multi-tenant web applications.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                  TENANT ROUTER                   │
//!   Client Request    │  ┌─────────┐   ┌────────────┐   ┌────────────┐  │
//!   ──────────────────┼─▶│  http   │──▶│ middleware │──▶│  routing   │  │
//!                     │  │ server  │   │  session   │   │  decision  │  │
//!                     │  └─────────┘   └─────┬──────┘   └────────────┘  │
//!                     │                      │                          │
//!                     │        redirect ◀────┤                          │
//!                     │                      ▼ pass-through / rewrite   │
//!   Client Response   │               ┌────────────┐                    │     Upstream
//!   ◀─────────────────┼───────────────│  upstream  │◀───────────────────┼──── Application
//!                     │               │ forwarder  │                    │
//!                     │               └────────────┘                    │
//!                     │  config (toml, hot reload) · observability ·    │
//!                     │  lifecycle (signals, graceful shutdown)         │
//!                     └──────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use tenant_router::config::watcher::ConfigWatcher;
use tenant_router::config::{load_config, RouterConfig};
use tenant_router::http::HttpServer;
use tenant_router::lifecycle::{wait_for_signal, Shutdown};
use tenant_router::observability::{logging, metrics};
use tenant_router::routing::{RequestFacts, TenantRouter};

#[derive(Parser)]
#[command(name = "tenant-router", version)]
#[command(about = "Host and path based routing for multi-tenant web apps", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the router (default)
    Serve {
        /// Path to a TOML config file; defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a config file and exit
    Check {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the routing decision for a host and path
    Explain {
        #[arg(long)]
        host: Option<String>,
        #[arg(long, default_value = "/")]
        path: String,
        #[arg(long)]
        query: Option<String>,
        #[arg(long, default_value = "http")]
        scheme: String,
        #[arg(long)]
        accept_language: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve { config: None }) {
        Commands::Serve { config } => serve(config).await,
        Commands::Check { config } => {
            let loaded = load_config(&config)?;
            println!(
                "{}: ok ({} redirect rules, rewrite prefix {})",
                config.display(),
                loaded.redirects.len(),
                loaded.tenancy.rewrite_prefix
            );
            Ok(())
        }
        Commands::Explain {
            host,
            path,
            query,
            scheme,
            accept_language,
            country,
            config,
        } => {
            let config = load_or_default(config.as_deref())?;
            let router = TenantRouter::from_config(&config);
            let facts = RequestFacts::new(host.as_deref(), &path)
                .with_scheme(&scheme)
                .with_query(query.as_deref())
                .with_accept_language(accept_language.as_deref())
                .with_country(country.as_deref());
            println!("{}", serde_json::to_string_pretty(&router.decide(&facts))?);
            Ok(())
        }
    }
}

fn load_or_default(path: Option<&Path>) -> Result<RouterConfig, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    })
}

async fn serve(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_or_default(config_path.as_deref())?;
    logging::init_logging(&config.observability);

    tracing::info!("tenant-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        mode = ?config.mode,
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        rewrite_prefix = %config.tenancy.rewrite_prefix,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watcher must stay alive for the lifetime of the server.
    let (_watcher, config_updates) = match &config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_shutdown.trigger();
    });

    let tls = config.listener.tls.clone();
    let server = HttpServer::new(config)?;
    match tls {
        Some(tls) => server.run_tls(&tls, config_updates, server_shutdown).await?,
        None => {
            let listener = TcpListener::bind(&server.config().listener.bind_address).await?;
            server.run(listener, config_updates, server_shutdown).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
