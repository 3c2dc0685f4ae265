//! Ratings pool endpoints
//!
//! `POST /api/beli-ratings` bulk-ingests place JSON. The admin picker routes
//! search, filter and match against the pool.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    routing::{delete, get, post},
    Json, Router,
};
use platebook_common::place::{extract_place_array, normalize_places, retain_named};
use platebook_common::Place;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::ratings_pool::{self, PoolFacets, PoolFilter, PoolSort};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Bulk ingest response
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub message: String,
    pub count: usize,
    pub places: Vec<Place>,
}

fn ingest_example() -> Value {
    json!({
        "places": [{
            "name": "O-Ku",
            "rating": 10,
            "price": "$$$",
            "cuisine": ["Japanese", "Sushi"],
            "location": ["Northeast Washington", "Washington, DC"]
        }]
    })
}

/// Entries of `{ "places": [...] }` or a bare array; `None` for any other shape
fn raw_places(body: Value) -> Option<Vec<Value>> {
    match body {
        Value::Array(items) => Some(items),
        Value::Object(_) if body.get("places").map_or(false, Value::is_array) => {
            Some(extract_place_array(body))
        }
        _ => None,
    }
}

/// POST /api/beli-ratings
pub async fn bulk_ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<IngestResponse>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !content_type.contains("application/json") {
        return Err(ApiError::bad_request_with(
            "Expected application/json",
            json!({
                "got": content_type,
                "tip": r#"Send a JSON body with a "places" array."#,
            }),
        ));
    }

    let body: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))?;

    let raw = match raw_places(body) {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            return Err(ApiError::bad_request_with(
                r#"Body must contain a non-empty "places" array."#,
                json!({ "example": ingest_example() }),
            ))
        }
    };

    let received = raw.len();
    let valid = retain_named(normalize_places(raw));
    if valid.is_empty() {
        return Err(ApiError::bad_request(
            "No valid places found (each must have a non-empty name).",
        ));
    }

    let saved = ratings_pool::bulk_upsert(&state.db, &valid)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::info!(received, saved = saved.len(), "Bulk ingested places");

    Ok(Json(IngestResponse {
        message: format!("Upserted {} place(s) to Beli pool.", saved.len()),
        count: saved.len(),
        places: saved,
    }))
}

/// Query string of the picker search
#[derive(Debug, Default, Deserialize)]
pub struct PoolQuery {
    #[serde(default)]
    pub q: String,
    pub cuisine: Option<String>,
    pub location: Option<String>,
    pub price: Option<String>,
    pub sort: Option<PoolSort>,
}

impl PoolQuery {
    fn filter(&self) -> PoolFilter {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        PoolFilter {
            cuisine: non_empty(&self.cuisine),
            location: non_empty(&self.location),
            price: non_empty(&self.price),
            sort: self.sort.unwrap_or_default(),
        }
    }
}

/// GET /api/admin/beli-ratings
pub async fn search_places(
    State(state): State<AppState>,
    Query(query): Query<PoolQuery>,
) -> ApiResult<Json<Vec<Place>>> {
    let hits = ratings_pool::search(&state.db, &query.q).await?;
    Ok(Json(ratings_pool::apply_filter(hits, &query.filter())))
}

/// GET /api/admin/beli-ratings/facets
pub async fn place_facets(State(state): State<AppState>) -> ApiResult<Json<PoolFacets>> {
    let places = ratings_pool::list_all(&state.db).await?;
    Ok(Json(ratings_pool::facets(&places)))
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    #[serde(rename = "match")]
    pub found: Option<Place>,
}

/// GET /api/admin/beli-ratings/match?name=…&location=…&location=…
pub async fn match_place(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Json<MatchResponse>> {
    let mut name = String::new();
    let mut locations = Vec::new();
    for (key, value) in pairs {
        match key.as_str() {
            "name" => name = value,
            "location" => locations.push(value),
            _ => {}
        }
    }

    if name.trim().is_empty() {
        return Err(ApiError::bad_request("Query parameter \"name\" is required"));
    }

    let found = ratings_pool::find_match(&state.db, &name, &locations).await?;
    Ok(Json(MatchResponse { found }))
}

/// DELETE /api/admin/beli-ratings/:id
pub async fn delete_place(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let deleted = ratings_pool::delete(&state.db, &id).await?;
    if deleted {
        tracing::info!(id = %id, "Deleted place from ratings pool");
    }
    Ok(Json(json!({ "deleted": deleted })))
}

pub fn ingest_routes() -> Router<AppState> {
    Router::new().route("/api/beli-ratings", post(bulk_ingest))
}

pub fn ratings_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/beli-ratings", get(search_places))
        .route("/api/admin/beli-ratings/facets", get(place_facets))
        .route("/api/admin/beli-ratings/match", get(match_place))
        .route("/api/admin/beli-ratings/:id", delete(delete_place))
}
