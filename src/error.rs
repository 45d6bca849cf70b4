//! Gateway error types and HTTP response mapping.

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Every failure the gateway can surface to a caller.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("{0}")]
    ResourceNotFound(String),

    #[error("{message}")]
    Upstream { status: Option<u16>, message: String },

    #[error("error communicating with upstream API at {url}: {source}")]
    UpstreamUnavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{message}")]
    Http { status: StatusCode, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ProxyError::ResourceNotFound(message.into())
    }

    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        ProxyError::Http {
            status,
            message: message.into(),
        }
    }

    /// Status code and `error` label the failure maps to.
    pub fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ProxyError::ResourceNotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            ProxyError::Upstream { .. } | ProxyError::UpstreamUnavailable { .. } => {
                (StatusCode::BAD_GATEWAY, "External API Error")
            }
            ProxyError::Http { status, .. } => (*status, "HTTP Error"),
            ProxyError::Config(_)
            | ProxyError::Database(_)
            | ProxyError::PasswordHash(_)
            | ProxyError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

impl From<argon2::password_hash::Error> for ProxyError {
    fn from(e: argon2::password_hash::Error) -> Self {
        ProxyError::PasswordHash(e.to_string())
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            tracing::error!("{} ({}): {}", kind, status, self);
        } else {
            tracing::debug!("{} ({}): {}", kind, status, self);
        }

        let unauthorized = status == StatusCode::UNAUTHORIZED;
        let mut response = (status, error_body(kind, &self.to_string())).into_response();
        if unauthorized {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"rickmorty-gateway\""),
            );
        }
        response
    }
}

fn error_body(kind: &str, message: &str) -> Json<serde_json::Value> {
    Json(json!({
        "error": kind,
        "message": message,
    }))
}

/// Rewrites error responses produced by the framework itself (method routing,
/// unmatched paths, extractor rejections) into the gateway's JSON error shape.
pub async fn json_error_responses(req: Request<Body>, next: Next) -> Response {
    let response = next.run(req).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let detail = axum::body::to_bytes(body, 64 * 1024)
        .await
        .ok()
        .map(|b| String::from_utf8_lossy(&b).trim().to_string())
        .filter(|s| !s.is_empty());
    let message = detail.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    });
    let kind = if status.is_server_error() {
        "Internal Server Error"
    } else {
        "HTTP Error"
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.remove(header::CONTENT_TYPE);
    let rewritten = error_body(kind, &message).into_response();
    let (json_parts, json_body) = rewritten.into_parts();
    parts.headers.extend(json_parts.headers);
    Response::from_parts(parts, json_body)
}

/// Result type for gateway operations.
pub type ProxyResult<T> = Result<T, ProxyError>;
