#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use rio_api::app::{router, AppState};
use rio_api::config::AppConfig;
use rio_api::models::AdminInput;

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: Client,
}

/// Development defaults with a cheap bcrypt cost and quiet request logs
pub fn test_config(enforce_permissions: bool) -> AppConfig {
    let mut config = AppConfig::development();
    config.api.enable_request_logging = false;
    config.security.bcrypt_cost = 4;
    config.security.enforce_permissions = enforce_permissions;
    config.security.jwt_secret = "rio-test-secret".to_string();
    config.catalog.max_limit = Some(50);
    config
}

impl TestServer {
    /// Boots the real router over a fresh in-memory store on an unused port.
    pub async fn start(config: AppConfig) -> Result<Self> {
        Self::start_with_state(AppState::in_memory(config)).await
    }

    /// Same as `start`, for tests that seed the store before serving
    pub async fn start_with_state(state: AppState) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind {}", base_url))?;
        let app = router(state);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self { port, base_url, client: Client::new() };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
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

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str, body: &Value) -> RequestBuilder {
        self.client.post(self.url(path)).json(body)
    }

    pub fn put(&self, path: &str, body: &Value) -> RequestBuilder {
        self.client.put(self.url(path)).json(body)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }

    /// POST /api/products, asserting 201; returns the created product
    pub async fn create_product(&self, body: Value) -> Result<Value> {
        let (status, json) = send(self.post("/api/products", &body)).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create product failed: {} {}", status, json);
        Ok(json["data"].clone())
    }

    /// POST /api/admins, asserting 201; returns the created admin
    pub async fn create_admin(&self, body: Value) -> Result<Value> {
        let (status, json) = send(self.post("/api/admins", &body)).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create admin failed: {} {}", status, json);
        Ok(json["data"].clone())
    }

    /// POST /api/auth/login, asserting 200; returns the bearer token
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let (status, json) =
            send(self.post("/api/auth/login", &json!({ "email": email, "password": password }))).await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, json);
        json["data"]["token"].as_str().map(str::to_string).context("login response missing token")
    }
}

/// Sends a request and decodes the JSON envelope
pub async fn send(request: RequestBuilder) -> Result<(StatusCode, Value)> {
    let res = request.send().await?;
    let status = res.status();
    let body = res.json::<Value>().await.context("response body is not JSON")?;
    Ok((status, body))
}

pub fn phone(name: &str, price: i64, stock: i64) -> Value {
    json!({
        "name": name,
        "category": "mobile_phone",
        "brand": "Samsung",
        "ram": "8GB",
        "storage": "256GB",
        "color": "Black",
        "price": price,
        "stock": stock,
        "description": "Flagship handset",
        "specifications": { "display": "6.1 inch" },
        "features": ["5G", "NFC"]
    })
}

pub fn accessory(name: &str, brand: &str, price: i64, stock: i64) -> Value {
    json!({
        "name": name,
        "category": "accessories",
        "brand": brand,
        "color": "White",
        "price": price,
        "stock": stock
    })
}

/// Creates an active super admin straight through the service, bypassing
/// the permission gate that would otherwise block the first account.
pub async fn seed_super_admin(state: &AppState, email: &str, password: &str) -> Result<()> {
    state
        .admins
        .create(AdminInput {
            name: Some("Root".to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            role: Some("super_admin".to_string()),
            ..Default::default()
        })
        .await?;
    Ok(())
}

pub fn admin_body(email: &str, password: &str, role: &str, permissions: &[&str]) -> Value {
    json!({
        "name": "Test Admin",
        "email": email,
        "password": password,
        "role": role,
        "permissions": permissions
    })
}
