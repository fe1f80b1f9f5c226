//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.
//!
//! Field names are camelCase on the wire, matching the documents the web
//! client already reads from the store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{format, Catalog, Deal, Restaurant};
use crate::preorder::BillSplit;
use crate::social::{ChannelEvent, Group};
use crate::vendors::{ImageAsset, ImageHostStatus};

// ============================================
// COMMON DTOs
// ============================================

/// `{success, message}` acknowledgement
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

// ============================================
// RESTAURANT DTOs
// ============================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAddressQuery {
    pub user_address: Option<String>,
}

/// Restaurant page: the record with menus regrouped by category
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantDetailResponse {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    /// "Cuisine • $$ • ⭐ 4.5"
    pub summary: String,
    /// "2.4 mi", absent when the distance is unknown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_label: Option<String>,
    pub image_urls: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealResponse {
    pub restaurant_id: String,
    pub restaurant_name: String,
    #[serde(flatten)]
    pub deal: Deal,
    /// Short validity suffix for deal cards
    pub valid: String,
    /// "Valid from: ..." / "Valid through: ..." lines for the deal page
    pub validity: Vec<String>,
}

// ============================================
// TAX DTOs
// ============================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRateQuery {
    pub zip_code: Option<String>,
}

// ============================================
// AUTH DTOs
// ============================================

#[derive(Debug, Default, Deserialize)]
pub struct SendVerificationRequest {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendVerificationResponse {
    pub success: bool,
    pub message: String,
    /// Only present when codes are exposed for development
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A verification code typed into a form arrives as a string or a number
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VerificationCode {
    Text(String),
    Number(serde_json::Number),
}

impl VerificationCode {
    pub fn as_text(&self) -> String {
        match self {
            VerificationCode::Text(s) => s.clone(),
            VerificationCode::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    pub user_id: Option<String>,
    pub new_email: Option<String>,
    pub verification_code: Option<VerificationCode>,
}

// ============================================
// IMAGE DTOs
// ============================================

#[derive(Debug, Serialize)]
pub struct ImageHostTestResponse {
    pub success: bool,
    pub config: Option<ImageHostStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<ImageAsset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================
// SOCIAL DTOs
// ============================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    pub email: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PreferenceValueRequest {
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserSearchQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarksResponse {
    pub user_id: String,
    pub restaurant_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendsResponse {
    pub user_id: String,
    pub friends: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub from_user_id: String,
    pub to_user_id: String,
}

#[derive(Debug, Serialize)]
pub struct FriendshipStatusResponse {
    pub status: crate::social::FriendshipStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub sender_id: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    /// False when the text was blank and nothing was posted
    pub sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<crate::social::ChatMessage>,
}

/// A group as shown on a group card
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    #[serde(flatten)]
    pub group: Group,
    pub dining_time_label: String,
    /// Tags of the chosen restaurant; empty until one is chosen
    pub tags: Vec<String>,
}

impl GroupResponse {
    pub fn new(group: Group, catalog: &Catalog) -> Self {
        let tags = group
            .restaurant_name
            .as_deref()
            .map(|name| catalog.group_tags(name))
            .unwrap_or_default();
        Self {
            dining_time_label: format::dining_time(group.dining_time.as_deref()),
            tags,
            group,
        }
    }
}

/// A group's bill split with the allergies the table should know about
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreOrderResponse {
    #[serde(flatten)]
    pub bill: BillSplit,
    pub zip_code: String,
    pub restaurant_name: Option<String>,
    /// Username to allergies, for members who listed any
    pub allergies: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelEventResponse {
    #[serde(flatten)]
    pub event: ChannelEvent,
    pub dining_time_label: String,
}

impl From<ChannelEvent> for ChannelEventResponse {
    fn from(event: ChannelEvent) -> Self {
        Self {
            dining_time_label: format::dining_time(Some(&event.dining_time)),
            event,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ChannelListQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelRequest {
    pub name: String,
    pub created_by: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisbandQuery {
    pub requested_by: Option<String>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded"
    pub status: String,
    /// Store backend name
    pub store: String,
    /// Store status: "ok" or "error"
    pub store_status: String,
    pub restaurants: usize,
    pub websocket_connections: usize,
    pub vendors: VendorStatus,
    pub uptime_seconds: u64,
    pub version: String,
}

/// Which vendor integrations are configured
#[derive(Debug, Serialize)]
pub struct VendorStatus {
    pub email: bool,
    pub auth: bool,
    pub images: bool,
    pub tax: bool,
    pub maps: bool,
}
