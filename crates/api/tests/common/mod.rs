#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use openerr_api::auth::jwt::JwtConfig;
use openerr_api::config::ServerConfig;
use openerr_api::mail::{MailError, OtpMailer};
use openerr_api::router::build_app_router;
use openerr_api::state::AppState;
use openerr_db::log_source::{LogSource, LogSourceConnector, LogSourceError, NewErrorLog};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

/// Connection strings containing this fail to connect.
pub const UNREACHABLE_HOST: &str = "unreachable.invalid";

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough".to_string(),
            token_expiry_days: 7,
        },
        cookie_secure: false,
        log_fetch_limit: 1000,
        otp_expiry_mins: 5,
        source_connect_timeout_secs: 1,
        smtp: None,
    }
}

/// The application with an in-memory log store and a capturing mailer.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, Arc::new(MemoryConnector::default()), None)
}

pub fn build_test_app_with(
    pool: PgPool,
    sources: Arc<MemoryConnector>,
    mailer: Option<Arc<CapturingMailer>>,
) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        sources,
        mailer: mailer.map(|m| m as Arc<dyn OtpMailer>),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// In-memory log databases
// ---------------------------------------------------------------------------

/// Log databases keyed by connection string. A database has no `errors`
/// table until something is inserted or seeded.
#[derive(Default)]
pub struct MemoryConnector {
    tables: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    invalidated: Mutex<Vec<String>>,
}

impl MemoryConnector {
    /// Put raw documents into the table for `uri`, creating it.
    pub fn seed(&self, uri: &str, docs: Vec<Value>) {
        self.tables
            .lock()
            .unwrap()
            .entry(uri.to_string())
            .or_default()
            .extend(docs);
    }

    pub fn rows(&self, uri: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(uri)
            .cloned()
            .unwrap_or_default()
    }

    pub fn invalidated(&self) -> Vec<String> {
        self.invalidated.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogSourceConnector for MemoryConnector {
    async fn connect(&self, uri: &str) -> Result<Arc<dyn LogSource>, LogSourceError> {
        if uri.contains(UNREACHABLE_HOST) {
            return Err(LogSourceError::Connect(format!(
                "error connecting to server: Connection refused ({UNREACHABLE_HOST})"
            )));
        }
        Ok(Arc::new(MemorySource {
            uri: uri.to_string(),
            tables: Arc::clone(&self.tables),
        }))
    }

    async fn invalidate(&self, uri: &str) -> bool {
        self.invalidated.lock().unwrap().push(uri.to_string());
        true
    }
}

struct MemorySource {
    uri: String,
    tables: Arc<Mutex<HashMap<String, Vec<Value>>>>,
}

#[async_trait]
impl LogSource for MemorySource {
    async fn fetch_recent(&self, limit: i64) -> Result<Vec<Value>, LogSourceError> {
        let tables = self.tables.lock().unwrap();
        let mut rows = tables
            .get(&self.uri)
            .cloned()
            .ok_or(LogSourceError::MissingTable)?;
        // RFC 3339 strings in UTC sort chronologically.
        rows.sort_by(|a, b| {
            b["timestamp"]
                .as_str()
                .unwrap_or("")
                .cmp(a["timestamp"].as_str().unwrap_or(""))
        });
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn insert(&self, entries: &[NewErrorLog]) -> Result<u64, LogSourceError> {
        let mut tables = self.tables.lock().unwrap();
        let table = tables.entry(self.uri.clone()).or_default();
        for entry in entries {
            let id = table.len() + 1;
            table.push(json!({
                "id": id,
                "error_type": entry.error_type,
                "message": entry.message,
                "stack_trace": entry.stack_trace,
                "url": entry.url,
                "metadata": entry.metadata,
                "timestamp": entry.timestamp.to_rfc3339(),
            }));
        }
        Ok(entries.len() as u64)
    }

    async fn ping(&self) -> Result<(), LogSourceError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mailer
// ---------------------------------------------------------------------------

/// Records `(to, code)` instead of sending.
#[derive(Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingMailer {
    pub fn last_code_for(&self, to: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(addr, _)| addr == to)
            .map(|(_, code)| code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl OtpMailer for CapturingMailer {
    async fn send_otp(&self, to: &str, code: &str, _expiry_mins: i64) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), code.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, empty_request(Method::GET, uri, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request(Method::GET, uri, Some(token))).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, None, body)).await
}

/// Also used with a project API key as the bearer token.
pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, Some(token), body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request(Method::POST, uri, Some(token))).await
}

pub async fn put_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, json_request(Method::PUT, uri, Some(token), body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request(Method::DELETE, uri, Some(token))).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Register through the API and return the access token.
pub async fn register(app: Router, email: &str) -> String {
    let response = post_json(
        app,
        "/api/v1/auth/register",
        json!({ "name": "Test User", "email": email, "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), 201, "registration of {email} failed");
    body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Create a project and return `(project_id, api_key)`.
pub async fn create_project(app: Router, token: &str, name: &str, source_uri: &str) -> (i64, String) {
    let response = post_json_auth(
        app,
        "/api/v1/projects",
        token,
        json!({ "name": name, "source_uri": source_uri }),
    )
    .await;
    assert_eq!(response.status(), 201, "project creation failed");
    let json = body_json(response).await;
    (
        json["data"]["project"]["id"].as_i64().unwrap(),
        json["data"]["api_key"].as_str().unwrap().to_string(),
    )
}
