#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rickmorty_gateway::{
    auth::hash_password,
    models::{NewUser, User, ROLE_ADMIN, ROLE_USER},
    router,
    store::{SqliteUserStore, UserStore},
    AppState, ProxyResult, RickMortyClient,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@rickmorty.com";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const USER_EMAIL: &str = "morty@rickmorty.com";
pub const USER_PASSWORD: &str = "morty123";

/// Sqlite store that counts writes, so tests can prove a path never persisted.
pub struct RecordingStore {
    inner: SqliteUserStore,
    inserts: AtomicUsize,
}

impl RecordingStore {
    pub async fn new() -> Arc<Self> {
        let inner = SqliteUserStore::connect("sqlite::memory:").await.unwrap();
        inner.migrate().await.unwrap();
        Arc::new(Self {
            inner,
            inserts: AtomicUsize::new(0),
        })
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for RecordingStore {
    async fn find_by_id(&self, id: i64) -> ProxyResult<Option<User>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> ProxyResult<Option<User>> {
        self.inner.find_by_email(email).await
    }

    async fn list(&self) -> ProxyResult<Vec<User>> {
        self.inner.list().await
    }

    async fn insert(&self, user: NewUser) -> ProxyResult<User> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(user).await
    }

    async fn update(&self, user: User) -> ProxyResult<User> {
        self.inner.update(user).await
    }

    async fn delete(&self, id: i64) -> ProxyResult<bool> {
        self.inner.delete(id).await
    }
}

pub fn app(base_url: &str, store: Arc<RecordingStore>) -> Router {
    let api = RickMortyClient::new(reqwest::Client::new(), base_url);
    router(AppState::new(api, store))
}

/// Inserts an admin and a regular user directly, bypassing the insert counter.
pub async fn seed_accounts(store: &RecordingStore) -> (User, User) {
    let admin = store
        .inner
        .insert(NewUser {
            email: ADMIN_EMAIL.to_string(),
            password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
            first_name: "Admin".to_string(),
            last_name: "User".to_string(),
            roles: vec![ROLE_ADMIN.to_string(), ROLE_USER.to_string()],
        })
        .await
        .unwrap();
    let user = store
        .inner
        .insert(NewUser {
            email: USER_EMAIL.to_string(),
            password_hash: hash_password(USER_PASSWORD).unwrap(),
            first_name: "Morty".to_string(),
            last_name: "Smith".to_string(),
            roles: vec![ROLE_USER.to_string()],
        })
        .await
        .unwrap();
    (admin, user)
}

pub fn basic(email: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{email}:{password}")))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, body: &Value, auth: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn authed(method: &str, uri: &str, auth: String) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, auth)
        .body(Body::empty())
        .unwrap()
}

pub async fn send(app: Router, req: Request<Body>) -> Response<Body> {
    app.oneshot(req).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
