//! Feedback Routes
//!
//! - POST /api/feedback - Email a correction for a restaurant's menu or
//!   contact details

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::SuccessResponse;
use crate::api::error::ApiResult;
use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::feedback::FeedbackRequest;

/// POST /api/feedback
pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<FeedbackRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    state.feedback.submit(req).await?;
    Ok(Json(SuccessResponse::ok("Feedback submitted successfully")))
}
