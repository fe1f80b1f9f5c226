//! Image Host Routes
//!
//! - GET /api/cloudinary-test - Check image-host credentials and connectivity

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::ImageHostTestResponse;
use crate::api::state::AppState;

/// GET /api/cloudinary-test
///
/// Lists at most one uploaded image. Credentials are reported as
/// present/missing, never echoed.
pub async fn test_image_host(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ImageHostTestResponse>) {
    let Some(host) = &state.vendors.image_host else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ImageHostTestResponse {
                success: false,
                config: None,
                resources: None,
                error: Some("Cloudinary is not configured".to_string()),
            }),
        );
    };

    match host.check_connection().await {
        Ok(resources) => (
            StatusCode::OK,
            Json(ImageHostTestResponse {
                success: true,
                config: Some(host.status()),
                resources: Some(resources),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Cloudinary test failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ImageHostTestResponse {
                    success: false,
                    config: Some(host.status()),
                    resources: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
