//! Pre-order Routes
//!
//! - POST /api/groups/:id/preorder - Split a group order per member

use axum::{
    extract::{Path, State},
    Json,
};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::dto::PreOrderResponse;
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::preorder::{self, PreOrderRequest, DEFAULT_TIP_PERCENT, DEFAULT_ZIP_CODE};

/// POST /api/groups/:id/preorder
///
/// Items may only be assigned to group members. The tax rate is looked up
/// from the restaurant's ZIP code unless the body carries one; the
/// restaurant is `restaurantId` or else the group's chosen restaurant.
pub async fn split_preorder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<PreOrderRequest>,
) -> ApiResult<Json<PreOrderResponse>> {
    let group = state.groups.get(&id).await?;

    let restaurant = match req.restaurant_id.as_deref() {
        Some(restaurant_id) => Some(state.catalog.find(restaurant_id).ok_or_else(|| {
            ApiError::NotFound(format!("Restaurant {} not found", restaurant_id))
        })?),
        None => group
            .restaurant_name
            .as_deref()
            .and_then(|name| state.catalog.find_by_name(name)),
    };

    let zip_code = restaurant
        .map(|r| preorder::zip_from_address(&r.address))
        .unwrap_or(DEFAULT_ZIP_CODE)
        .to_string();

    let tax_rate = match req.tax_rate {
        Some(rate) => rate,
        None => state.tax.lookup(&zip_code).await.rate(),
    };

    let bill = preorder::split(
        &req.items,
        &group.member_ids,
        tax_rate,
        req.tip_percent.unwrap_or(DEFAULT_TIP_PERCENT),
    )?;

    let mut allergies = BTreeMap::new();
    for member in &group.member_ids {
        if let Some(profile) = state.profiles.get(member).await? {
            if !profile.allergies.is_empty() {
                allergies.insert(profile.username, profile.allergies);
            }
        }
    }

    tracing::debug!(group_id = %id, total = bill.total, "Split pre-order");

    Ok(Json(PreOrderResponse {
        bill,
        zip_code,
        restaurant_name: restaurant.map(|r| r.name.clone()),
        allergies,
    }))
}
