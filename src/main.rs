//! go2go server binary.

use anyhow::Result;
use clap::Parser;
use go2go::cli::Cli;
use go2go::ident::IdGenerator;
use go2go::server::{self, AppState};
use go2go::session::MatchRegistry;
use go2go::storage::FileStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let storage = Arc::new(FileStore::new(&cli.data_dir));
    let registry = MatchRegistry::new(storage, Duration::from_secs(cli.expiry_hours * 3600));
    let app = server::router(AppState {
        registry,
        ids: IdGenerator::new(),
    });

    let listener = tokio::net::TcpListener::bind((cli.host.as_str(), cli.port)).await?;
    info!(
        host = %cli.host,
        port = cli.port,
        data_dir = %cli.data_dir.display(),
        expiry_hours = cli.expiry_hours,
        "go2go listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
