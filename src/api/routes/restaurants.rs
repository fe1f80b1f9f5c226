//! Restaurant Routes
//!
//! Read-only views over the restaurant catalog.
//!
//! - GET /api/restaurants - The full restaurant list
//! - GET /api/restaurants/:id - Restaurant page data
//! - GET /api/restaurants/:id/deals/:deal_id - One deal

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{DealResponse, RestaurantDetailResponse, UserAddressQuery};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::catalog::{format, process_restaurant_menus, Restaurant};
use crate::vendors::cloudinary::{restaurant_folder, FOLDER_MAX_RESULTS, IMAGE_PREFIXES};
use crate::vendors::filter_by_prefix;

/// GET /api/restaurants
pub async fn list_restaurants(State(state): State<Arc<AppState>>) -> Json<Vec<Restaurant>> {
    Json(state.catalog.restaurants().to_vec())
}

/// GET /api/restaurants/:id
///
/// Menus come back regrouped by category. The distance is computed from
/// `userAddress` only when the query names one.
pub async fn get_restaurant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<UserAddressQuery>,
) -> ApiResult<Json<RestaurantDetailResponse>> {
    let mut restaurant = state
        .catalog
        .find(&id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("Restaurant {} not found", id)))?;

    restaurant.menus = process_restaurant_menus(&restaurant.menus);

    if let Some(user_address) = query.user_address.as_deref().filter(|a| !a.trim().is_empty()) {
        if !restaurant.address.trim().is_empty() {
            restaurant.distance = state.distance.distance(&restaurant.address, user_address).await;
        }
    }

    let image_urls = image_urls(&state, &restaurant).await;

    Ok(Json(RestaurantDetailResponse {
        summary: format::summary(&restaurant),
        distance_label: format::format_distance(restaurant.distance),
        image_urls,
        restaurant,
    }))
}

/// Photo URLs for a restaurant page
///
/// Hosted assets whose names carry a known prefix win; otherwise the images
/// declared in the catalog are used.
async fn image_urls(state: &AppState, restaurant: &Restaurant) -> Vec<String> {
    if let Some(host) = &state.vendors.image_host {
        match host
            .list_folder(&restaurant_folder(&restaurant.id), FOLDER_MAX_RESULTS)
            .await
        {
            Ok(assets) => {
                let urls: Vec<String> = filter_by_prefix(assets, &IMAGE_PREFIXES)
                    .into_iter()
                    .filter_map(|a| a.secure_url)
                    .collect();
                if !urls.is_empty() {
                    return urls;
                }
            }
            Err(e) => {
                tracing::warn!(restaurant_id = %restaurant.id, error = %e, "Image listing failed, using catalog images");
            }
        }
    }

    restaurant
        .images
        .iter()
        .filter_map(|image| {
            // A bare public_id needs a configured cloud to resolve
            image.url.clone().or_else(|| {
                let public_id = image.public_id.as_deref()?;
                let host = state.vendors.image_host.as_ref()?;
                Some(host.delivery_url(public_id))
            })
        })
        .collect()
}

/// GET /api/restaurants/:id/deals/:deal_id
pub async fn get_deal(
    State(state): State<Arc<AppState>>,
    Path((id, deal_id)): Path<(String, String)>,
) -> ApiResult<Json<DealResponse>> {
    let (restaurant, deal) = state
        .catalog
        .deal(&id, &deal_id)
        .ok_or_else(|| ApiError::NotFound(format!("Deal {} not found for restaurant {}", deal_id, id)))?;

    Ok(Json(DealResponse {
        restaurant_id: restaurant.id.clone(),
        restaurant_name: restaurant.name.clone(),
        valid: format::deal_valid_string(deal),
        validity: format::deal_validity_lines(deal),
        deal: deal.clone(),
    }))
}
