//! CLI argument definitions for the Armory binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use url::Url;

/// Armory catalog and account API server
#[derive(Parser, Debug)]
#[command(name = "armory")]
#[command(about = "Armory: catalog, collection sync and account API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the API server
    Serve(ServeArgs),
    /// Check health of a running Armory server
    Health(HealthArgs),
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8000, env = "ARMORY_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "ARMORY_HOST")]
    pub host: String,

    /// Data directory; the SQLite database is stored here as armory.db
    #[arg(short = 'D', long, env = "ARMORY_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Secret used to sign access and refresh tokens (at least 16 bytes)
    #[arg(long, env = "ARMORY_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Base URL of the web frontend, used in verification and reset links
    #[arg(long, default_value = "http://localhost:3000", env = "ARMORY_FRONTEND_URL")]
    pub frontend_url: Url,

    /// Mark auth cookies Secure (serve behind HTTPS)
    #[arg(long, env = "ARMORY_SECURE_COOKIES")]
    pub secure_cookies: bool,

    /// Keep capeless armor sets out of upward sync (pass false to sync them on helmet and armor)
    #[arg(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        env = "ARMORY_REQUIRE_CAPE_FOR_SYNC"
    )]
    pub require_cape_for_sync: bool,
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// Base URL of the server to check
    #[arg(default_value = "http://127.0.0.1:8000", env = "ARMORY_URL")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}
