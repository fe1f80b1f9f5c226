//! Vendor Clients
//!
//! FoodBuddy delegates every hard problem to a managed service. Each service
//! sits behind a small trait so handlers can be exercised without network
//! access:
//!
//! - [`Mailer`]: transactional email (Resend)
//! - [`AuthAdmin`]: account administration (Firebase Auth)
//! - [`ImageHost`]: restaurant photo listing (Cloudinary Admin API)
//! - [`TaxRateOracle`]: sales-tax estimation (OpenAI chat completions)
//! - [`Geocoder`]: address to coordinates (Google Geocoding API)
//!
//! None of the clients retry. A failure is reported once and the caller
//! decides on a fallback.

pub mod cloudinary;
pub mod firebase_auth;
pub mod google_maps;
pub mod openai;
pub mod resend;

pub use cloudinary::{filter_by_prefix, CloudinaryClient, CloudinaryCredentials, ImageAsset};
pub use firebase_auth::FirebaseAuthAdmin;
pub use google_maps::{Coordinates, GoogleGeocoder};
pub use openai::OpenAiTaxOracle;
pub use resend::ResendMailer;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// An outgoing email; the sender address belongs to the mailer
#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub reply_to: Option<String>,
}

impl Email {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            to: vec![to.into()],
            subject: subject.into(),
            html: html.into(),
            reply_to: None,
        }
    }

    /// Builder method: set the reply-to address
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send an email, returning the provider's message id
    async fn send(&self, email: &Email) -> Result<String, VendorError>;
}

#[async_trait]
pub trait AuthAdmin: Send + Sync {
    /// Change the sign-in email of an account
    async fn update_email(&self, user_id: &str, new_email: &str) -> Result<(), VendorError>;
}

/// Redacted view of image-host configuration
#[derive(Debug, Clone, Serialize)]
pub struct ImageHostStatus {
    pub cloud_name: Option<String>,
    pub api_key: &'static str,
    pub api_secret: &'static str,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// List image assets stored in an asset folder
    async fn list_folder(&self, folder: &str, max_results: u32) -> Result<Vec<ImageAsset>, VendorError>;

    /// Connectivity check: list at most one uploaded image
    async fn check_connection(&self) -> Result<Vec<ImageAsset>, VendorError>;

    fn status(&self) -> ImageHostStatus;

    /// Public delivery URL for an asset id
    fn delivery_url(&self, public_id: &str) -> String;
}

#[async_trait]
pub trait TaxRateOracle: Send + Sync {
    /// Raw answer for the combined sales-tax rate of a ZIP code
    async fn estimate(&self, zip_code: &str) -> Result<String, VendorError>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve an address; `Ok(None)` when the service has no match
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, VendorError>;
}

/// Errors returned by vendor clients
#[derive(Error, Debug)]
pub enum VendorError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Service unavailable")]
    Unavailable,

    #[error("Unexpected response: {0}")]
    Parse(String),
}

impl VendorError {
    /// Classify a transport error
    pub fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            VendorError::Timeout
        } else if e.is_connect() {
            VendorError::Unavailable
        } else {
            VendorError::Request(e)
        }
    }
}

/// Build the HTTP client shared by one vendor
pub(crate) fn http_client(timeout_ms: u64) -> Result<Client, VendorError> {
    Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(VendorError::Request)
}

/// Turn a non-success response into [`VendorError::Api`]
pub(crate) async fn ensure_success(response: Response) -> Result<Response, VendorError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    Err(VendorError::Api { status, message })
}
