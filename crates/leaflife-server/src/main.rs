use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

mod config;
mod routes;
mod state;

use config::Args;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    tracing_subscriber::fmt::init();
    info!("leaflife v{}", env!("CARGO_PKG_VERSION"));

    let state = Arc::new(AppState::start(&args).await?);
    let app = routes::router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(addr = %addr, "API server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
