//! Tax Rate Routes
//!
//! - GET /api/tax-rate?zipCode= - Combined sales-tax estimate for a ZIP code

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::TaxRateQuery;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::tax::TaxRateResponse;

/// GET /api/tax-rate
///
/// Always 200 once a ZIP code is given; oracle failures fall back to the
/// default rate and are flagged in the body.
pub async fn get_tax_rate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TaxRateQuery>,
) -> ApiResult<Json<TaxRateResponse>> {
    let zip_code = query
        .zip_code
        .map(|z| z.trim().to_string())
        .filter(|z| !z.is_empty())
        .ok_or_else(|| ApiError::Validation("Zip code is required".to_string()))?;

    let lookup = state.tax.lookup(&zip_code).await;
    Ok(Json(TaxRateResponse::new(&zip_code, lookup)))
}
