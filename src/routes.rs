//! Route table and shared handler state.

use crate::auth::require_admin;
use crate::client::RickMortyClient;
use crate::error::json_error_responses;
use crate::proxy::resource_routes;
use crate::resource::Resource;
use crate::store::UserStore;
use crate::users;
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Dependencies injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub api: RickMortyClient,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(api: RickMortyClient, users: Arc<dyn UserStore>) -> Self {
        Self { api, users }
    }
}

/// Builds the full gateway router.
pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/api/users", get(users::list_users))
        .route(
            "/api/users/:id",
            get(users::show_user)
                .put(users::update_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let mut app = Router::new()
        .route("/", get(home))
        .route("/api/auth/register", post(users::register))
        .merge(admin);
    for resource in Resource::ALL {
        app = app.merge(resource_routes(resource));
    }

    app.with_state(state)
        .layer(middleware::from_fn(json_error_responses))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// `GET /`: index of the proxied endpoints and their filters.
pub async fn home() -> Json<Value> {
    let mut endpoints = Map::new();
    let mut filters = Map::new();
    for resource in Resource::ALL {
        let base = format!("/api/{}", resource.collection());
        let sample: Vec<String> = resource
            .filter_keys()
            .iter()
            .take(2)
            .map(|key| format!("{key}=..."))
            .collect();
        endpoints.insert(
            resource.collection().to_string(),
            json!({
                "list": format!("GET {base}"),
                "list_with_pagination": format!("GET {base}?page=2"),
                "list_with_filters": format!("GET {base}?{}", sample.join("&")),
                "single": format!("GET {base}/{{id}}"),
                "multiple": format!("GET {base}/multiple?ids=1,2,3"),
            }),
        );
        filters.insert(resource.collection().to_string(), json!(resource.filter_keys()));
    }

    Json(json!({
        "name": "Rick and Morty API Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "A JSON gateway for the Rick and Morty API",
        "endpoints": endpoints,
        "filters": filters,
    }))
}
