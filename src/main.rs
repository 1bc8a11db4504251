use anyhow::Result;
use tracing::info;

use workspace_importer::{build_router, init_tracing, AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = AppConfig::from_env();
    let bind_addr = config.bind_addr.clone();

    let state = AppState::initialize(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
