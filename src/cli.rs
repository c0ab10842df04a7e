//! Command-line interface for the go2go server.

use clap::Parser;
use std::path::PathBuf;

/// go2go - two-player Go server with a per-match authoritative referee
#[derive(Parser, Debug)]
#[command(name = "go2go")]
#[command(about = "Serve two-player Go matches over WebSockets", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind to
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Directory for persisted match state
    #[arg(long, default_value = "go2go_data")]
    pub data_dir: PathBuf,

    /// Hours a match survives without activity before it is destroyed
    #[arg(long, default_value_t = 24)]
    pub expiry_hours: u64,
}
