//! Phrixus cart HTTP service.
//!
//! Usage:
//!   phrixus-server --org acme --app shop --client-id ... --client-secret ...
//!   phrixus-server --memory --user alice   # in-process store, for local development

use std::sync::Arc;
use anyhow::{Context, Result, bail};
use clap::Parser;
use phrixus_cart::CartService;
use phrixus_model::RemoteStore;
use phrixus_server::{build_router, seed_users};
use phrixus_store::{HttpRemoteStore, MemoryStore, StoreConfig};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "phrixus-server")]
#[command(about = "Phrixus cart HTTP service")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Remote entity store root URL
    #[arg(long, default_value = "https://api.usergrid.com")]
    store_url: String,

    /// Remote store organization
    #[arg(long, default_value = "")]
    org: String,

    /// Remote store application
    #[arg(long, default_value = "")]
    app: String,

    /// Client id for the client-credentials grant
    #[arg(long)]
    client_id: Option<String>,

    /// Client secret for the client-credentials grant
    #[arg(long)]
    client_secret: Option<String>,

    /// Remote store request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Serve from an in-process store instead of the remote one
    #[arg(long)]
    memory: bool,

    /// Username to create at startup if missing (repeatable)
    #[arg(long = "user")]
    users: Vec<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn build_store(args: &Args) -> Result<Arc<dyn RemoteStore>> {
    if args.memory {
        info!("Using in-process entity store");
        return Ok(Arc::new(MemoryStore::new()));
    }
    if args.org.is_empty() || args.app.is_empty() {
        bail!("--org and --app are required unless --memory is set");
    }

    let config = StoreConfig {
        base_url: args.store_url.clone(),
        org: args.org.clone(),
        app: args.app.clone(),
        client_id: args.client_id.clone(),
        client_secret: args.client_secret.clone(),
        timeout_secs: args.timeout_secs,
        ..Default::default()
    };
    info!("Using remote entity store at {}", config.url(""));
    let store = HttpRemoteStore::new(config).context("Failed to create store client")?;
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("Phrixus server starting...");
    let registry = Arc::new(phrixus_cart::registry().context("Failed to register entity classes")?);
    let store = build_store(&args)?;
    let service = Arc::new(CartService::new(registry, store));
    seed_users(&service, &args.users)
        .await
        .context("Failed to seed users")?;
    if !args.users.is_empty() {
        info!("Seeded users: {}", args.users.join(", "));
    }

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port))
        .await
        .context("Failed to bind HTTP port")?;
    info!("HTTP API listening on port {}", args.port);
    axum::serve(listener, build_router(service))
        .await
        .context("HTTP server failed")?;
    Ok(())
}
