//! Public Channel Routes
//!
//! - GET /api/channels?search= - Channels by name
//! - POST /api/channels - Create or claim a channel
//! - GET /api/channels/:name - Read a channel
//! - DELETE /api/channels/:name?requestedBy= - Disband a channel
//! - GET /api/channels/:name/messages - Chat history, oldest first
//! - POST /api/channels/:name/messages - Post a text message
//! - GET /api/channels/:name/events - Dining events
//! - POST /api/channels/:name/events - Plan a dining event
//! - DELETE /api/channels/:name/events/:event_id - Cancel an event

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{
    ChannelEventResponse, ChannelListQuery, CreateChannelRequest, DisbandQuery, SendMessageRequest,
    SendMessageResponse,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::social::{Channel, ChatMessage, NewChannelEvent};

/// GET /api/channels
pub async fn list_channels(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChannelListQuery>,
) -> ApiResult<Json<Vec<Channel>>> {
    Ok(Json(state.channels.list(query.search.as_deref()).await?))
}

/// POST /api/channels
pub async fn create_channel(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateChannelRequest>,
) -> ApiResult<(StatusCode, Json<Channel>)> {
    let channel = state.channels.create(&req.name, &req.created_by).await?;
    Ok((StatusCode::CREATED, Json(channel)))
}

/// GET /api/channels/:name
pub async fn get_channel(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Channel>> {
    Ok(Json(state.channels.get(&name).await?))
}

/// DELETE /api/channels/:name
pub async fn disband_channel(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<DisbandQuery>,
) -> ApiResult<StatusCode> {
    let requested_by = query
        .requested_by
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("requestedBy is required".to_string()))?;

    state.channels.disband(&name, &requested_by).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/channels/:name/messages
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    Ok(Json(state.channels.messages(&name).await?))
}

/// POST /api/channels/:name/messages
///
/// Posting to a channel that does not exist yet creates it.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> ApiResult<Json<SendMessageResponse>> {
    let message = state
        .channels
        .send_message(&name, &req.sender_id, &req.text)
        .await?;
    Ok(Json(SendMessageResponse {
        sent: message.is_some(),
        message,
    }))
}

/// GET /api/channels/:name/events
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<ChannelEventResponse>>> {
    let events = state.channels.events(&name).await?;
    Ok(Json(events.into_iter().map(ChannelEventResponse::from).collect()))
}

/// POST /api/channels/:name/events
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    ApiJson(req): ApiJson<NewChannelEvent>,
) -> ApiResult<(StatusCode, Json<ChannelEventResponse>)> {
    let event = state.channels.create_event(&name, &req).await?;
    Ok((StatusCode::CREATED, Json(event.into())))
}

/// DELETE /api/channels/:name/events/:event_id
pub async fn cancel_event(
    State(state): State<Arc<AppState>>,
    Path((name, event_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.channels.cancel_event(&name, &event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
