//! Friend Routes
//!
//! - GET /api/users/:uid/friends - Friend ids
//! - DELETE /api/users/:uid/friends/:friend_id - Unfriend (both sides)
//! - GET /api/users/:uid/friends/status/:other_id - Relationship to another user
//! - GET /api/users/:uid/friend-requests/incoming - Pending requests to the user
//! - GET /api/users/:uid/friend-requests/outgoing - Pending requests from the user
//! - POST /api/friend-requests - Send a request
//! - POST /api/friend-requests/:id/accept - Accept
//! - POST /api/friend-requests/:id/reject - Reject
//! - DELETE /api/friend-requests/:id - Withdraw

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{FriendRequestBody, FriendsResponse, FriendshipStatusResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::social::{FriendRequest, SendOutcome};

/// GET /api/users/:uid/friends
pub async fn list_friends(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> ApiResult<Json<FriendsResponse>> {
    let friends = state.friends.friends(&uid).await?;
    Ok(Json(FriendsResponse { user_id: uid, friends }))
}

/// DELETE /api/users/:uid/friends/:friend_id
pub async fn remove_friend(
    State(state): State<Arc<AppState>>,
    Path((uid, friend_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.friends.remove_friend(&uid, &friend_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users/:uid/friends/status/:other_id
pub async fn friendship_status(
    State(state): State<Arc<AppState>>,
    Path((uid, other_id)): Path<(String, String)>,
) -> ApiResult<Json<FriendshipStatusResponse>> {
    let status = state.friends.status(&uid, &other_id).await?;
    Ok(Json(FriendshipStatusResponse { status }))
}

/// GET /api/users/:uid/friend-requests/incoming
pub async fn incoming_requests(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> ApiResult<Json<Vec<FriendRequest>>> {
    Ok(Json(state.friends.incoming(&uid).await?))
}

/// GET /api/users/:uid/friend-requests/outgoing
pub async fn outgoing_requests(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> ApiResult<Json<Vec<FriendRequest>>> {
    Ok(Json(state.friends.outgoing(&uid).await?))
}

/// POST /api/friend-requests
///
/// 201 for a new request, 200 when an old one was reset or the other
/// user's pending request was accepted instead.
pub async fn send_request(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<FriendRequestBody>,
) -> ApiResult<(StatusCode, Json<SendOutcome>)> {
    let from = req.from_user_id.trim();
    let to = req.to_user_id.trim();
    if from.is_empty() || to.is_empty() {
        return Err(ApiError::Validation("fromUserId and toUserId are required".to_string()));
    }

    let outcome = state.friends.send_request(from, to).await?;
    let status = match outcome {
        SendOutcome::Sent(_) => StatusCode::CREATED,
        SendOutcome::Resent(_) | SendOutcome::AutoAccepted(_) => StatusCode::OK,
    };
    Ok((status, Json(outcome)))
}

/// POST /api/friend-requests/:id/accept
pub async fn accept_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<FriendRequest>> {
    Ok(Json(state.friends.accept(&id).await?))
}

/// POST /api/friend-requests/:id/reject
pub async fn reject_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<FriendRequest>> {
    Ok(Json(state.friends.reject(&id).await?))
}

/// DELETE /api/friend-requests/:id
pub async fn cancel_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.friends.cancel(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
