use tracing::error;
use tracing_subscriber::EnvFilter;
use travel_diary::{run_app, AppState, Config};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(error) = start().await {
        error!("Error: {:#}", error);
        std::process::exit(1);
    }
}

async fn start() -> travel_diary::Result<()> {
    let config = Config::from_env()?;
    let address = config.address()?;
    let state = AppState::new(config).await?;
    run_app(state, address).await
}
