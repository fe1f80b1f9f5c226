//! Profile Routes
//!
//! - GET /api/users/search?q=&limit= - Username prefix search
//! - GET /api/users/:uid/profile - Read a profile
//! - POST /api/users/:uid/profile - Create a profile at sign-up
//! - PATCH /api/users/:uid/profile - Merge changes into a profile
//! - POST /api/users/:uid/profile/:field - Add a value to a preference list
//! - DELETE /api/users/:uid/profile/:field - Remove a value from a preference list

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CreateProfileRequest, PreferenceValueRequest, UserSearchQuery};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::social::profiles::DEFAULT_SEARCH_LIMIT;
use crate::social::{PreferenceField, ProfileUpdate, UserProfile, UserSummary};

/// Largest page a search may ask for
const MAX_SEARCH_LIMIT: usize = 50;

/// GET /api/users/search
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserSearchQuery>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);
    let term = query.q.unwrap_or_default();

    Ok(Json(state.profiles.search_by_username(&term, limit).await?))
}

/// GET /api/users/:uid/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(state.profiles.require(&uid).await?))
}

/// POST /api/users/:uid/profile
pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    ApiJson(req): ApiJson<CreateProfileRequest>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    if req.username.trim().is_empty() || !req.email.contains('@') {
        return Err(ApiError::Validation(
            "A username and a valid email are required".to_string(),
        ));
    }

    let profile = state
        .profiles
        .create(&uid, req.email.trim(), req.username.trim(), req.avatar_url.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// PATCH /api/users/:uid/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<Json<UserProfile>> {
    if update.is_empty() {
        return Err(ApiError::Validation("No profile fields to update".to_string()));
    }
    if update.username.as_deref().is_some_and(|u| u.trim().is_empty()) {
        return Err(ApiError::Validation("username cannot be empty".to_string()));
    }
    Ok(Json(state.profiles.update(&uid, &update).await?))
}

fn preference_value(req: &PreferenceValueRequest) -> ApiResult<&str> {
    let value = req.value.trim();
    if value.is_empty() {
        return Err(ApiError::Validation("value is required".to_string()));
    }
    Ok(value)
}

/// POST /api/users/:uid/profile/:field
pub async fn add_preference(
    State(state): State<Arc<AppState>>,
    Path((uid, field)): Path<(String, String)>,
    ApiJson(req): ApiJson<PreferenceValueRequest>,
) -> ApiResult<Json<UserProfile>> {
    let field = PreferenceField::parse(&field)?;
    let value = preference_value(&req)?;
    Ok(Json(state.profiles.add_preference(&uid, field, value).await?))
}

/// DELETE /api/users/:uid/profile/:field
pub async fn remove_preference(
    State(state): State<Arc<AppState>>,
    Path((uid, field)): Path<(String, String)>,
    ApiJson(req): ApiJson<PreferenceValueRequest>,
) -> ApiResult<Json<UserProfile>> {
    let field = PreferenceField::parse(&field)?;
    let value = preference_value(&req)?;
    Ok(Json(state.profiles.remove_preference(&uid, field, value).await?))
}
