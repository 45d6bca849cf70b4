//! Password hashing and role-based access control for the admin endpoints.

use crate::error::{ProxyError, ProxyResult};
use crate::models::User;
use crate::routes::AppState;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Hashes a plain password into a PHC string (Argon2id, random salt).
pub fn hash_password(plain: &str) -> ProxyResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(plain.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// False for a wrong password or an unparsable hash.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Extracts `(email, password)` from an `Authorization: Basic ...` header.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (email, password) = decoded.split_once(':')?;
    Some((email.to_string(), password.to_string()))
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> ProxyResult<User> {
    let unauthorized = || ProxyError::http(StatusCode::UNAUTHORIZED, "Authentication required");

    let (email, password) = basic_credentials(headers).ok_or_else(unauthorized)?;
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ProxyError::http(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;

    if !verify_password(&password, &user.password_hash) {
        tracing::debug!("Rejected credentials for {}", email);
        return Err(ProxyError::http(StatusCode::UNAUTHORIZED, "Invalid credentials"));
    }
    Ok(user)
}

/// Authenticates the caller and requires every role in `required`.
pub async fn enforce_roles(
    state: &AppState,
    required: &[&str],
    req: Request<Body>,
    next: Next,
) -> ProxyResult<Response> {
    let user = authenticate(state, req.headers()).await?;

    if let Some(missing) = required.iter().find(|role| !user.has_role(role)) {
        tracing::warn!("User {} lacks role {}", user.email, missing);
        return Err(ProxyError::http(StatusCode::FORBIDDEN, "Access Denied."));
    }

    Ok(next.run(req).await)
}

/// Middleware guarding the user administration routes.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> ProxyResult<Response> {
    enforce_roles(&state, &[crate::models::ROLE_ADMIN], req, next).await
}
