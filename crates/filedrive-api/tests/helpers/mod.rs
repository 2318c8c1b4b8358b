//! Test helpers: build AppState and router for integration tests.
//!
//! Local filesystem storage in a temp dir, in-memory metadata, shared-secret tokens.
//! Run with `cargo test -p filedrive-api`.

#![allow(dead_code)]

use axum_test::TestServer;
use base64::Engine;
use filedrive_api::auth::SharedSecretVerifier;
use filedrive_api::setup::{routes, services};
use filedrive_api::state::AppState;
use filedrive_core::{Config, UserIdentity};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const TEST_SIGNING_SECRET: &str = "integration-test-signing-secret";
pub const BOUNDARY: &str = "----filedrive-test-boundary";

/// Test application: server, state, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub config: Config,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Bearer token for `uid`, valid for ten minutes.
    pub fn token_for(&self, uid: &str) -> String {
        SharedSecretVerifier::new(TEST_JWT_SECRET)
            .issue(&identity(uid), chrono::Duration::minutes(10))
            .expect("Failed to issue test token")
    }

    pub fn bearer(&self, uid: &str) -> String {
        format!("Bearer {}", self.token_for(uid))
    }
}

pub fn identity(uid: &str) -> UserIdentity {
    UserIdentity {
        uid: uid.to_string(),
        email: format!("{}@example.com", uid),
        name: "Test User".to_string(),
        picture: String::new(),
    }
}

/// Build a config for tests; `overrides` replace the defaults.
pub fn test_config(temp_dir: &TempDir, overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("ENVIRONMENT", "test"),
        ("STORAGE_BACKEND", "local"),
        ("LOCAL_STORAGE_BASE_URL", "http://localhost/storage"),
        ("STORAGE_SIGNING_SECRET", TEST_SIGNING_SECRET),
        ("METADATA_BACKEND", "memory"),
        ("AUTH_PROVIDER", "jwt"),
        ("JWT_SECRET", TEST_JWT_SECRET),
        ("MAX_FILE_SIZE_MB", "1"),
        ("CLEANUP_INTERVAL_SECS", "0"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    vars.insert(
        "LOCAL_STORAGE_PATH".to_string(),
        temp_dir.path().to_string_lossy().into_owned(),
    );
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }

    let config = Config::from_lookup(|key| vars.get(key).cloned()).expect("Invalid test config");
    config.validate().expect("Test config failed validation");
    config
}

/// Setup test app with local storage in a temp dir and in-memory metadata.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(&[]).await
}

pub async fn setup_test_app_with(overrides: &[(&str, &str)]) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = test_config(&temp_dir, overrides);

    let state = services::initialize_services(&config)
        .await
        .expect("Failed to initialize services");
    let app = routes::setup_routes(&config, state.clone()).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        config,
        _temp_dir: temp_dir,
    }
}

/// A `multipart/form-data` body with one file part.
pub fn multipart_body(file_name: &str, content_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"description\"\r\n\r\n");
    body.extend_from_slice(b"holiday pictures\r\n");
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub fn base64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Split a signed download URL into its route path and `(expires, signature)`.
pub fn split_download_url(url: &str) -> (String, String, String) {
    let path_and_query = url
        .strip_prefix("http://localhost")
        .expect("download URL uses the test base URL");
    let (path, query) = path_and_query
        .split_once('?')
        .expect("download URL has a query string");
    let params: HashMap<&str, &str> = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .collect();
    (
        path.to_string(),
        params["expires"].to_string(),
        params["signature"].to_string(),
    )
}
