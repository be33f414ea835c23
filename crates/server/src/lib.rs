//! # cpi-server
//!
//! Read-only REST API over the CPI wide table. The table is loaded once at
//! start and shared by every handler.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{routing::get, Router};
use cpi_data::{TableError, WideTable};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod routes;

/// Default table file, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "cpi_data.csv";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<WideTable>,
}

impl AppState {
    pub fn new(table: WideTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }
}

/// Errors that stop the server from starting
#[derive(Error, Debug)]
pub enum ServerError {
    /// The table could not be loaded
    #[error("Failed to load table: {0}")]
    Table(#[from] TableError),

    /// HOST/PORT do not form a socket address
    #[error("Invalid address {0}")]
    InvalidAddress(String),

    /// Binding or serving failed
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Listen address and table location.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
        }
    }
}

impl ServerConfig {
    /// Read `HOST`, `PORT` and `CPI_DATA_PATH`, falling back to defaults.
    pub fn from_env() -> Result<Self, ServerError> {
        let defaults = Self::default();
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ServerError::InvalidAddress(format!("PORT={}", raw)))?,
            Err(_) => defaults.port,
        };
        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port,
            data_path: env::var("CPI_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
        })
    }

    pub fn addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

/// Build the router with middleware.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::liveness))
        .route("/data", get(routes::all_rows))
        .route("/data/:series_id", get(routes::series))
        .route(
            "/data/:series_id/:start_date/:end_date",
            get(routes::series_between),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Load the table and serve until the process is stopped.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let table = WideTable::read_csv(&config.data_path)?;
    tracing::info!(
        path = %config.data_path.display(),
        rows = table.len(),
        columns = table.columns().len(),
        "table loaded"
    );

    let addr = config.addr()?;
    tracing::info!(
        "cpi-server v{} listening on {}",
        env!("CARGO_PKG_VERSION"),
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(AppState::new(table))).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, PathBuf::from("cpi_data.csv"));
        assert_eq!(config.addr().unwrap().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_invalid_host() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(config.addr(), Err(ServerError::InvalidAddress(_))));
    }
}
