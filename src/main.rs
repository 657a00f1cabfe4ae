use kllchat::{AppState, config::ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    kllchat::init_tracing();

    let config = ServerConfig::from_env()?;
    let app = kllchat::app(AppState::default());

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("relay listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
