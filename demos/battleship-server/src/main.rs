//! Runnable battleship server with the default ruleset.
//!
//! Usage: `battleship-server [bind-addr]` (default `0.0.0.0:8080`).
//! Log verbosity via `RUST_LOG`, e.g. `RUST_LOG=broadside=debug`.

use broadside::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:8080".to_string());
    tracing::info!(%addr, "starting battleship server");

    let server = BroadsideServerBuilder::new()
        .bind(&addr)
        .build()
        .await?;
    server.run().await?;
    Ok(())
}
