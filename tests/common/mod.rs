#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use donation_server::config::{AppConfig, Environment, SecurityConfig, ServerConfig, StorageConfig};
use donation_server::state::AppState;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::oneshot;

pub const ADMIN_PASSWORD: &str = "1234";

/// A server running in-process on a free port, with its own data and uploads directories.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
    pub client: reqwest::Client,
    root: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let root = tempfile::tempdir()?;

        let state = AppState::new(test_config(&root, port)?);
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;

        let (tx, rx) = oneshot::channel::<()>();
        let server_state = state.clone();
        tokio::spawn(async move {
            let shutdown = async move {
                let _ = rx.await;
            };
            if let Err(e) = donation_server::serve(server_state, listener, shutdown).await {
                eprintln!("test server failed: {e:?}");
            }
        });

        let server = Self {
            port,
            base_url,
            state,
            client: reqwest::Client::new(),
            root,
            shutdown: Some(tx),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.path().join("data")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.path().join("uploads")
    }

    /// Log in as admin over HTTP and return the token.
    pub async fn login(&self) -> Result<String> {
        let res = self
            .client
            .post(self.url("/admin/login"))
            .json(&json!({ "username": "admin", "password": ADMIN_PASSWORD }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());

        let body = res.json::<Value>().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .context("login response had no token")
    }

    pub async fn donate(&self, body: Value) -> Result<reqwest::Response> {
        Ok(self.client.post(self.url("/donate")).json(&body).send().await?)
    }

    pub async fn donations(&self, token: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(self.url("/donations"))
            .header("Authorization", token)
            .send()
            .await?)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn test_config(root: &TempDir, port: u16) -> Result<AppConfig> {
    Ok(AppConfig {
        environment: Environment::Development,
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port,
            public_url: None,
            enable_cors: true,
            max_upload_bytes: None,
        },
        storage: StorageConfig {
            data_dir: root.path().join("data"),
            uploads_dir: root.path().join("uploads"),
        },
        security: SecurityConfig {
            jwt_secret: "integration-test-secret".to_string(),
            jwt_expiry_hours: 8,
            admin_username: "admin".to_string(),
            admin_password_hash: bcrypt::hash(ADMIN_PASSWORD, 4)?,
        },
    })
}
