//! Group Routes
//!
//! - GET /api/users/:uid/groups - Groups the user belongs to
//! - POST /api/groups - Create a group
//! - GET /api/groups/:id - Read a group
//! - GET /api/groups/:id/messages - Chat history, oldest first
//! - POST /api/groups/:id/messages - Post a text message
//!
//! Groups come back with a formatted dining time and the chosen
//! restaurant's tags.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{GroupResponse, SendMessageRequest, SendMessageResponse};
use crate::api::error::ApiResult;
use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::social::{ChatMessage, NewGroup};

/// GET /api/users/:uid/groups
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> ApiResult<Json<Vec<GroupResponse>>> {
    let groups = state.groups.list_for_member(&uid).await?;
    Ok(Json(
        groups
            .into_iter()
            .map(|g| GroupResponse::new(g, &state.catalog))
            .collect(),
    ))
}

/// POST /api/groups
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<NewGroup>,
) -> ApiResult<(StatusCode, Json<GroupResponse>)> {
    let group = state.groups.create(&req).await?;
    Ok((StatusCode::CREATED, Json(GroupResponse::new(group, &state.catalog))))
}

/// GET /api/groups/:id
pub async fn get_group(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<GroupResponse>> {
    let group = state.groups.get(&id).await?;
    Ok(Json(GroupResponse::new(group, &state.catalog)))
}

/// GET /api/groups/:id/messages
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    Ok(Json(state.groups.messages(&id).await?))
}

/// POST /api/groups/:id/messages
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> ApiResult<Json<SendMessageResponse>> {
    let message = state.groups.send_text(&id, &req.sender_id, &req.text).await?;
    Ok(Json(SendMessageResponse {
        sent: message.is_some(),
        message,
    }))
}
