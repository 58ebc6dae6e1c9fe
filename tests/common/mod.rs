//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use admission_gate::auth::Claims;
use admission_gate::clock::SystemClock;
use admission_gate::config::GateConfig;
use admission_gate::http::{AppState, HttpServer};
use admission_gate::lifecycle::Shutdown;
use admission_gate::permission::PermissionLoader;
use jsonwebtoken::{encode, EncodingKey, Header};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub const SECRET: &str = "integration-secret";

/// Subject holding the wildcard.
pub const ADMIN: &str = "1";
/// Subject allowed to view gate status only.
pub const VIEWER: &str = "2";
/// Subject with no permissions.
pub const NOBODY: &str = "3";

/// A gate listening on an ephemeral port.
pub struct TestGate {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<GateConfig>,
    pub state: AppState,
}

impl TestGate {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGate {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn config() -> GateConfig {
    let mut config = GateConfig::default();
    config.auth.secret = Some(SECRET.to_string());
    config.observability.metrics_enabled = false;
    config.permissions.subjects = HashMap::from([
        (ADMIN.to_string(), vec!["*:*:*".to_string()]),
        (VIEWER.to_string(), vec!["system:gate:view".to_string()]),
    ]);
    config
}

pub async fn spawn_gate(config: GateConfig) -> TestGate {
    start(HttpServer::new(config)).await
}

pub async fn spawn_gate_with(config: GateConfig, loader: Arc<dyn PermissionLoader>) -> TestGate {
    start(HttpServer::with_parts(config, Arc::new(SystemClock), loader)).await
}

async fn start(server: HttpServer) -> TestGate {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = server.state().clone();

    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    TestGate {
        addr,
        shutdown,
        updates,
        state,
    }
}

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Token for `sub` expiring `ttl_secs` from now (negative for already expired).
pub fn mint(sub: &str, ttl_secs: i64) -> String {
    mint_with(sub, ttl_secs, SECRET)
}

pub fn mint_with(sub: &str, ttl_secs: i64, secret: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        exp: now().saturating_add_signed(ttl_secs),
        iat: Some(now()),
        username: Some(format!("user-{sub}")),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
