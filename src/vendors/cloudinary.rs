//! Cloudinary Admin API client
//!
//! Restaurant photos live in asset folders named
//! `foodbuddy/restaurants/{restaurant_id}`. Only files whose public id starts
//! with a known prefix are shown; everything else in the folder is ignored.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ensure_success, http_client, ImageHost, ImageHostStatus, VendorError};

pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

/// Maximum number of assets fetched for one restaurant
pub const FOLDER_MAX_RESULTS: u32 = 100;

/// Public-id prefixes of restaurant photos
pub const IMAGE_PREFIXES: [&str; 9] = [
    "tables_",
    "foods_",
    "menu1_",
    "menu2_",
    "menu3_",
    "menu_",
    "food1_",
    "food_",
    "happyhour_",
];

/// Asset folder holding a restaurant's photos
pub fn restaurant_folder(restaurant_id: &str) -> String {
    format!("foodbuddy/restaurants/{}", restaurant_id)
}

/// An asset as returned by the Admin API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageAsset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ImageAsset {
    pub fn new(public_id: impl Into<String>) -> Self {
        Self {
            public_id: Some(public_id.into()),
            ..Default::default()
        }
    }

    pub fn secure_url(mut self, url: impl Into<String>) -> Self {
        self.secure_url = Some(url.into());
        self
    }
}

/// Keep assets whose public id is present and starts with one of `prefixes`
pub fn filter_by_prefix(resources: Vec<ImageAsset>, prefixes: &[&str]) -> Vec<ImageAsset> {
    resources
        .into_iter()
        .filter(|asset| {
            asset
                .public_id
                .as_deref()
                .map(|id| prefixes.iter().any(|p| id.starts_with(p)))
                .unwrap_or(false)
        })
        .collect()
}

/// API credentials for one Cloudinary account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl CloudinaryCredentials {
    /// Parse `cloudinary://{api_key}:{api_secret}@{cloud_name}`
    pub fn from_url(url: &str) -> Result<Self, VendorError> {
        if !url.starts_with("cloudinary://") {
            return Err(VendorError::Parse(
                "CLOUDINARY_URL must begin with 'cloudinary://'".to_string(),
            ));
        }

        let re = regex::Regex::new(r"^cloudinary://([^:]+):([^@]+)@(.+)$")
            .map_err(|e| VendorError::Parse(e.to_string()))?;
        let caps = re
            .captures(url)
            .ok_or_else(|| VendorError::Parse("Malformed CLOUDINARY_URL".to_string()))?;

        Ok(Self {
            api_key: caps[1].to_string(),
            api_secret: caps[2].to_string(),
            cloud_name: caps[3].to_string(),
        })
    }

    /// Separate key, secret and cloud name win over the URL form
    pub fn resolve(
        api_key: Option<&str>,
        api_secret: Option<&str>,
        cloud_name: Option<&str>,
        url: Option<&str>,
    ) -> Option<Self> {
        let present = |v: Option<&str>| v.map(str::trim).filter(|s| !s.is_empty()).map(String::from);

        if let (Some(api_key), Some(api_secret), Some(cloud_name)) =
            (present(api_key), present(api_secret), present(cloud_name))
        {
            return Some(Self {
                cloud_name,
                api_key,
                api_secret,
            });
        }

        let url = present(url)?;
        match Self::from_url(&url) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                tracing::error!(error = %e, "Ignoring invalid Cloudinary URL");
                None
            }
        }
    }
}

#[derive(Deserialize)]
struct ResourcesResponse {
    #[serde(default)]
    resources: Vec<ImageAsset>,
}

pub struct CloudinaryClient {
    client: Client,
    api_base: String,
    credentials: CloudinaryCredentials,
}

impl CloudinaryClient {
    pub fn new(credentials: CloudinaryCredentials, timeout_ms: u64) -> Result<Self, VendorError> {
        Ok(Self {
            client: http_client(timeout_ms)?,
            api_base: DEFAULT_API_BASE.to_string(),
            credentials,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn cloud_name(&self) -> &str {
        &self.credentials.cloud_name
    }

    async fn fetch_resources(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<ImageAsset>, VendorError> {
        let url = format!(
            "{}/v1_1/{}/{}",
            self.api_base, self.credentials.cloud_name, path
        );

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.credentials.api_key, Some(&self.credentials.api_secret))
            .query(query)
            .send()
            .await
            .map_err(VendorError::from_transport)?;

        let response = ensure_success(response).await?;
        let body: ResourcesResponse = response
            .json()
            .await
            .map_err(|e| VendorError::Parse(e.to_string()))?;
        Ok(body.resources)
    }
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    async fn list_folder(&self, folder: &str, max_results: u32) -> Result<Vec<ImageAsset>, VendorError> {
        let resources = self
            .fetch_resources(
                "resources/by_asset_folder",
                &[
                    ("asset_folder", folder.to_string()),
                    ("resource_type", "image".to_string()),
                    ("max_results", max_results.to_string()),
                ],
            )
            .await?;

        tracing::debug!(folder = %folder, count = resources.len(), "Listed Cloudinary folder");
        Ok(resources)
    }

    async fn check_connection(&self) -> Result<Vec<ImageAsset>, VendorError> {
        self.fetch_resources("resources/image/upload", &[("max_results", "1".to_string())])
            .await
    }

    fn status(&self) -> ImageHostStatus {
        ImageHostStatus {
            cloud_name: Some(self.credentials.cloud_name.clone()),
            api_key: if self.credentials.api_key.is_empty() { "missing" } else { "present" },
            api_secret: if self.credentials.api_secret.is_empty() { "missing" } else { "present" },
        }
    }

    fn delivery_url(&self, public_id: &str) -> String {
        format!(
            "https://res.cloudinary.com/{}/image/upload/{}",
            self.credentials.cloud_name, public_id
        )
    }
}
