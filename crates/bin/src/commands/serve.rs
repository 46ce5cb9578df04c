//! Serve command - runs the Armory HTTP API.

use tokio::signal::unix::{SignalKind, signal};

use crate::api::{self, AppState};
use crate::backend::open_armory;
use crate::cli::ServeArgs;

/// Run the Armory server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let armory = open_armory(args).await?;
    let state = AppState::new(armory.clone(), args.secure_cookies);
    let app = api::router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(%local_addr, "Armory API listening");
    println!("Armory API listening on http://{local_addr}");
    println!();
    println!("Available endpoints:");
    println!("  GET  /health                     - Health check");
    println!("  GET  /api/v1/version             - Catalog version");
    println!("  *    /api/v1/auth/...            - Accounts and sessions");
    println!("  *    /api/v1/catalog/...         - Items and armor sets");
    println!("  *    /api/v1/relations/...       - Favorites, collection, wishlist");
    println!("  *    /api/v1/loadouts/...        - User loadouts");
    println!();
    println!("Press Ctrl+C to shutdown");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown...")
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown...")
                }
            }
        })
        .await?;

    armory.close().await;
    println!("Server shut down");
    Ok(())
}
