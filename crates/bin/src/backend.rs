//! Opening the Armory instance behind the server.

use std::{path::PathBuf, sync::Arc};

use armory::{Armory, AuthConfig, Config, sync::SyncPolicy, user::LogMailer};

use crate::cli::ServeArgs;

const DB_FILE: &str = "armory.db";

/// Build the library configuration from the serve arguments.
pub fn config(args: &ServeArgs) -> Config {
    let auth = AuthConfig::new(args.jwt_secret.clone(), args.frontend_url.clone());
    Config::new(auth).with_sync(SyncPolicy {
        require_cape: args.require_cape_for_sync,
    })
}

/// Open (or create) the SQLite database in the data directory.
pub async fn open_armory(args: &ServeArgs) -> Result<Armory, Box<dyn std::error::Error>> {
    let data_dir = args.data_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    tokio::fs::create_dir_all(&data_dir).await?;

    let db_path = data_dir.join(DB_FILE);
    tracing::info!("Using SQLite database at {}", db_path.display());

    let armory = Armory::builder(config(args))
        .mailer(Arc::new(LogMailer))
        .open(&db_path)
        .await?;
    Ok(armory)
}
