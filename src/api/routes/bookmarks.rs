//! Bookmark Routes
//!
//! - GET /api/users/:uid/bookmarks - Bookmarked restaurant ids
//! - PUT /api/users/:uid/bookmarks/:restaurant_id - Bookmark a restaurant
//! - DELETE /api/users/:uid/bookmarks/:restaurant_id - Remove a bookmark

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::BookmarksResponse;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// GET /api/users/:uid/bookmarks
pub async fn list_bookmarks(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> ApiResult<Json<BookmarksResponse>> {
    let restaurant_ids = state.bookmarks.list(&uid).await?;
    Ok(Json(BookmarksResponse {
        user_id: uid,
        restaurant_ids,
    }))
}

/// PUT /api/users/:uid/bookmarks/:restaurant_id
///
/// Only restaurants in the catalog can be bookmarked.
pub async fn add_bookmark(
    State(state): State<Arc<AppState>>,
    Path((uid, restaurant_id)): Path<(String, String)>,
) -> ApiResult<Json<BookmarksResponse>> {
    if state.catalog.find(&restaurant_id).is_none() {
        return Err(ApiError::NotFound(format!("Restaurant {} not found", restaurant_id)));
    }
    let restaurant_ids = state.bookmarks.add(&uid, &restaurant_id).await?;
    Ok(Json(BookmarksResponse {
        user_id: uid,
        restaurant_ids,
    }))
}

/// DELETE /api/users/:uid/bookmarks/:restaurant_id
pub async fn remove_bookmark(
    State(state): State<Arc<AppState>>,
    Path((uid, restaurant_id)): Path<(String, String)>,
) -> ApiResult<Json<BookmarksResponse>> {
    let restaurant_ids = state.bookmarks.remove(&uid, &restaurant_id).await?;
    Ok(Json(BookmarksResponse {
        user_id: uid,
        restaurant_ids,
    }))
}
