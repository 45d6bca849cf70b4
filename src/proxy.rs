//! HTTP handlers for the proxied resources; upstream payloads are returned verbatim.

use crate::error::{ProxyError, ProxyResult};
use crate::resource::{parse_ids, Resource, ResourceQuery};
use crate::routes::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;

/// Routes for one resource collection: list, multiple and show.
pub fn resource_routes(resource: Resource) -> Router<AppState> {
    let base = format!("/api/{}", resource.collection());
    Router::new()
        .route(&base, get(list))
        .route(&format!("{base}/multiple"), get(multiple))
        .route(&format!("{base}/:id"), get(show))
        .layer(Extension(resource))
}

/// `GET /api/{collection}?page&<filters>`
pub async fn list(
    State(state): State<AppState>,
    Extension(resource): Extension<Resource>,
    Query(params): Query<HashMap<String, String>>,
) -> ProxyResult<Json<Value>> {
    let query = ResourceQuery::from_params(resource, &params);
    tracing::debug!(
        "List {} page={:?} filters={:?}",
        resource.collection(),
        query.page,
        query.filters
    );
    let data = state.api.list_resource(resource, &query).await?;
    Ok(Json(data))
}

/// `GET /api/{collection}/{id}`; the id must be all digits.
pub async fn show(
    State(state): State<AppState>,
    Extension(resource): Extension<Resource>,
    Path(raw_id): Path<String>,
) -> ProxyResult<Json<Value>> {
    let id = parse_path_id(&raw_id)?;
    let data = state.api.get_resource(resource, id).await?;
    Ok(Json(data))
}

/// `GET /api/{collection}/multiple?ids=1,2,3`
pub async fn multiple(
    State(state): State<AppState>,
    Extension(resource): Extension<Resource>,
    Query(params): Query<HashMap<String, String>>,
) -> ProxyResult<Json<Value>> {
    let raw = params
        .get("ids")
        .filter(|ids| !ids.is_empty())
        .ok_or_else(|| ProxyError::not_found("ids parameter is required"))?;
    let ids = parse_ids(raw);
    let data = state.api.get_multiple_resources(resource, &ids).await?;
    Ok(Json(data))
}

/// Non-numeric ids do not match the route.
fn parse_path_id(raw: &str) -> ProxyResult<u64> {
    let no_route = || {
        ProxyError::http(
            StatusCode::NOT_FOUND,
            format!("No route found for id \"{raw}\""),
        )
    };
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(no_route());
    }
    raw.parse().map_err(|_| no_route())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_id_requires_digits() {
        assert_eq!(parse_path_id("42").unwrap(), 42);
        assert!(parse_path_id("").is_err());
        assert!(parse_path_id("-1").is_err());
        assert!(parse_path_id("abc").is_err());
        assert_eq!(
            parse_path_id("x1").unwrap_err().status_and_kind(),
            (StatusCode::NOT_FOUND, "HTTP Error")
        );
    }
}
