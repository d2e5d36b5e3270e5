//! Test helpers for integration tests
//!
//! Builds service contexts on the in-memory repositories and spawns test
//! servers wired to a [`FakePlatform`].

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use vault_api::extractors::UPDATE_SECRET_HEADER;
use vault_api::{create_app, AppState};
use vault_common::AppConfig;
use vault_service::{GateConfig, ServiceContext, ServiceContextBuilder};

use crate::fixtures::{base_env, FakePlatform, ADMIN_KEY, UPDATE_SECRET};

/// Configuration from [`base_env`] with `overrides` applied on top
pub fn test_config(overrides: &[(&str, &str)]) -> Result<AppConfig> {
    let mut vars: HashMap<String, String> = base_env()
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    for (key, value) in overrides {
        vars.insert((*key).to_string(), (*value).to_string());
    }

    AppConfig::from_lookup(|key| vars.get(key).cloned())
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))
}

/// Service context on in-memory repositories
pub fn test_context(platform: Arc<FakePlatform>, config: &AppConfig) -> Result<ServiceContext> {
    ServiceContextBuilder::new()
        .memory_repositories()
        .platform(platform)
        .config(GateConfig::from(config))
        .build()
        .map_err(|e| anyhow::anyhow!("Context error: {e}"))
}

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: AppState,
    pub platform: Arc<FakePlatform>,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with the default test configuration
    pub async fn start(platform: Arc<FakePlatform>) -> Result<Self> {
        Self::start_with_config(platform, test_config(&[])?).await
    }

    /// Start a server with custom config
    pub async fn start_with_config(platform: Arc<FakePlatform>, config: AppConfig) -> Result<Self> {
        let context = test_context(platform.clone(), &config)?;
        let state = AppState::new(context, config);
        let app = create_app(state.clone());

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            addr,
            client,
            state,
            platform,
            _handle: handle,
        })
    }

    /// Service context behind the server
    pub fn context(&self) -> &ServiceContext {
        self.state.service_context()
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Make a GET request with the admin key
    pub async fn get_admin(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).bearer_auth(ADMIN_KEY).send().await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).json(body).send().await?)
    }

    /// Make a POST request with the admin key
    pub async fn post_admin<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self
            .client
            .post(&url)
            .bearer_auth(ADMIN_KEY)
            .json(body)
            .send()
            .await?)
    }
}

impl TestServer {
    /// POST a platform event the way the update relay does
    pub async fn post_update<T: Serialize + ?Sized>(&self, event: &T) -> Result<Response> {
        Ok(self.update_request(event).send().await?)
    }

    /// Relay request for `event`, ready to be tweaked before sending
    pub fn update_request<T: Serialize + ?Sized>(&self, event: &T) -> RequestBuilder {
        self.client
            .post(format!("{}/api/v1/updates", self.base_url()))
            .header(UPDATE_SECRET_HEADER, UPDATE_SECRET)
            .json(event)
    }
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(response: Response, expected_status: StatusCode) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}

/// Poll `condition` every few milliseconds until it holds or `timeout` passes
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
