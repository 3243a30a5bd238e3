//! Web server for sortbox.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::{Config, WebConfig};
use crate::file::FileStorage;
use crate::{Result, SortboxError};

use super::handlers::AppState;
use super::router::create_app;

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Web configuration.
    web_config: WebConfig,
    /// Request body limit in bytes.
    max_request_bytes: usize,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, storage: Arc<FileStorage>) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| {
                SortboxError::Config(format!(
                    "invalid server address {}:{}: {}",
                    config.server.host, config.server.port, e
                ))
            })?;

        Ok(Self {
            addr,
            app_state: Arc::new(AppState::from_config(config, storage)),
            web_config: config.web.clone(),
            max_request_bytes: config.max_request_bytes(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn into_router(self) -> Router {
        create_app(self.app_state, &self.web_config, self.max_request_bytes)
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let router = self.into_router();

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router).await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let router = self.into_router();

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config(temp_dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0; // Use random port
        config.storage.path = temp_dir.path().join("uploads").display().to_string();
        config
    }

    #[test]
    fn test_web_server_new() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_test_config(&temp_dir);
        let storage = Arc::new(FileStorage::new(&config.storage.path).unwrap());

        let server = WebServer::new(&config, storage).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[test]
    fn test_web_server_invalid_host() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = create_test_config(&temp_dir);
        config.server.host = "not a host".to_string();
        let storage = Arc::new(FileStorage::new(&config.storage.path).unwrap());

        let result = WebServer::new(&config, storage);
        assert!(matches!(result, Err(SortboxError::Config(_))));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_test_config(&temp_dir);
        let storage = Arc::new(FileStorage::new(&config.storage.path).unwrap());

        let server = WebServer::new(&config, storage).unwrap();
        let addr = server.run_with_addr().await.unwrap();

        let client = reqwest::Client::new();
        let resp = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap();

        assert!(resp.status().is_success());
        assert_eq!(resp.text().await.unwrap(), "OK");
    }
}
