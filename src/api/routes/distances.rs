//! Distance Routes
//!
//! - GET /api/distances?userAddress= - Miles from the user to every restaurant

use axum::{
    extract::{Query, State},
    Json,
};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::dto::UserAddressQuery;
use crate::api::state::AppState;

/// GET /api/distances
///
/// Maps restaurant id to miles (one decimal), or null when either address
/// cannot be geocoded. Falls back to the configured default address.
pub async fn get_distances(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserAddressQuery>,
) -> Json<BTreeMap<String, Option<f64>>> {
    let user_address = query
        .user_address
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| state.config.default_user_address.clone());

    if !state.distance.is_enabled() {
        tracing::debug!("No geocoder configured, all distances are unknown");
    }

    let distances = state
        .distance
        .distances(state.catalog.restaurants(), &user_address)
        .await;
    Json(distances)
}
