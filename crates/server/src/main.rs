use cpi_server::{serve, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (optional - won't fail if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cpi_server=info,tower_http=info".into()),
        )
        .init();

    let result = match ServerConfig::from_env() {
        Ok(config) => serve(config).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
