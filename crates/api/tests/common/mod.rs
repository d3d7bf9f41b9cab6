#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use bytes::Bytes;
use futures::StreamExt;
use http_body_util::BodyExt;
use report_core::generation::ChatPayload;
use report_upstream::{ByteStream, FileUpload, GenerationService, UpstreamConfig, UpstreamError};
use sqlx::PgPool;
use tower::ServiceExt;

use report_api::auth::jwt::JwtConfig;
use report_api::config::ServerConfig;
use report_api::router::build_app_router;
use report_api::state::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults and a (fake) configured upstream.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 10 * 1024 * 1024,
        db_max_connections: 5,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 60,
        },
        upstream: UpstreamConfig {
            base_url: Some("http://upstream.test/v1".to_string()),
            api_key: Some("test-key".to_string()),
            ..Default::default()
        },
    }
}

/// Build the full application router backed by `pool` and a default fake upstream.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, Arc::new(FakeGenerationService::default()))
}

/// Build the full application router with a specific generation service.
pub fn build_test_app_with(pool: PgPool, generation: Arc<dyn GenerationService>) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        generation,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fake generation service
// ---------------------------------------------------------------------------

/// In-memory stand-in for the upstream service.
///
/// Uploads return `"<kind>-file-id"`. The chat call replays `chunks`.
#[derive(Default)]
pub struct FakeGenerationService {
    /// Ordered log: `"upload image"`, `"upload video"`, `"chat"`.
    pub calls: Mutex<Vec<String>>,
    /// Every chat payload received, as JSON.
    pub payloads: Mutex<Vec<serde_json::Value>>,
    /// Names of uploaded files, in call order.
    pub uploaded_names: Mutex<Vec<String>>,
    pub chunks: Vec<&'static str>,
    /// When set, every upload fails with this status.
    pub upload_status: Option<u16>,
    /// When set, the chat call fails with this status.
    pub chat_status: Option<u16>,
}

impl FakeGenerationService {
    pub fn streaming(chunks: Vec<&'static str>) -> Self {
        Self {
            chunks,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_payload(&self) -> serde_json::Value {
        self.payloads
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("chat was called")
    }
}

#[async_trait]
impl GenerationService for FakeGenerationService {
    async fn upload_file(&self, upload: FileUpload, _actor: &str) -> Result<String, UpstreamError> {
        let kind = upload.kind.as_str();
        self.calls.lock().unwrap().push(format!("upload {kind}"));
        self.uploaded_names.lock().unwrap().push(upload.file_name);
        if let Some(status) = self.upload_status {
            return Err(UpstreamError::Upload {
                status,
                body: "upload rejected".into(),
            });
        }
        Ok(format!("{kind}-file-id"))
    }

    async fn stream_chat(&self, payload: &ChatPayload) -> Result<ByteStream, UpstreamError> {
        self.calls.lock().unwrap().push("chat".into());
        self.payloads
            .lock()
            .unwrap()
            .push(serde_json::to_value(payload).unwrap());
        if let Some(status) = self.chat_status {
            return Err(UpstreamError::Stream {
                status,
                body: "chat rejected".into(),
            });
        }
        let chunks: Vec<Result<Bytes, UpstreamError>> = self
            .chunks
            .iter()
            .map(|c| Ok(Bytes::from_static(c.as_bytes())))
            .collect();
        Ok(futures::stream::iter(chunks).boxed())
    }
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "report-test-boundary";

/// One part of a multipart form.
pub enum FormPart {
    Text(&'static str, String),
    File {
        name: &'static str,
        file_name: &'static str,
        content_type: &'static str,
        data: Vec<u8>,
    },
}

pub fn text(name: &'static str, value: &str) -> FormPart {
    FormPart::Text(name, value.to_string())
}

/// Encode `parts` as a `multipart/form-data` body.
pub fn multipart_body(parts: &[FormPart]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            FormPart::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            FormPart::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(app: Router, uri: &str, parts: &[FormPart]) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

// ---------------------------------------------------------------------------
// JSON requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::PUT, uri, None, Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None, None).await
}

pub async fn delete_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::DELETE, uri, None, Some(body)).await
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Number of rows in the `reports` table.
pub async fn count_reports(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM reports")
        .fetch_one(pool)
        .await
        .unwrap()
}
