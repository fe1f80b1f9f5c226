//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use chrono::Duration;
use std::sync::Arc;
use std::time::Instant;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::distance::DistanceCalculator;
use crate::feedback::{FeedbackService, DEFAULT_RECIPIENT};
use crate::social::{BookmarkService, ChannelService, FriendService, GroupService, ProfileService};
use crate::store::DocumentStore;
use crate::tax::{TaxRateService, DEFAULT_CACHE_TTL_HOURS, DEFAULT_TAX_RATE, MAX_TAX_RATE};
use crate::vendors::{AuthAdmin, Geocoder, ImageHost, Mailer, TaxRateOracle};
use crate::verification::{VerificationStore, DEFAULT_CODE_TTL_SECS};
use crate::websocket::{ConnectionHub, HubConfig};

/// Vendor clients; each one is absent when its credentials are not configured
#[derive(Clone, Default)]
pub struct Vendors {
    pub mailer: Option<Arc<dyn Mailer>>,
    pub auth_admin: Option<Arc<dyn AuthAdmin>>,
    pub image_host: Option<Arc<dyn ImageHost>>,
    pub tax_oracle: Option<Arc<dyn TaxRateOracle>>,
    pub geocoder: Option<Arc<dyn Geocoder>>,
}

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    /// Document store for users, friends, groups and channels
    pub store: Arc<dyn DocumentStore>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// WebSocket connection hub for realtime updates
    pub ws_hub: Arc<ConnectionHub>,
    pub profiles: Arc<ProfileService>,
    pub bookmarks: Arc<BookmarkService>,
    pub friends: Arc<FriendService>,
    pub groups: Arc<GroupService>,
    pub channels: Arc<ChannelService>,
    pub tax: Arc<TaxRateService>,
    pub distance: Arc<DistanceCalculator>,
    pub feedback: Arc<FeedbackService>,
    pub verification: Arc<VerificationStore>,
    pub vendors: Vendors,
}

impl AppState {
    pub fn new(catalog: Catalog, store: Arc<dyn DocumentStore>, vendors: Vendors, config: ApiConfig) -> Self {
        let ws_hub = Arc::new(ConnectionHub::new(HubConfig {
            max_connections: config.max_ws_connections,
        }));

        let tax = TaxRateService::new(
            vendors.tax_oracle.clone(),
            Duration::hours(config.tax_cache_ttl_hours),
        )
        .with_rates(config.default_tax_rate, config.max_tax_rate);

        Self {
            catalog: Arc::new(catalog),
            profiles: Arc::new(ProfileService::new(Arc::clone(&store))),
            bookmarks: Arc::new(BookmarkService::new(Arc::clone(&store), Arc::clone(&ws_hub))),
            friends: Arc::new(FriendService::new(Arc::clone(&store), Arc::clone(&ws_hub))),
            groups: Arc::new(GroupService::new(Arc::clone(&store), Arc::clone(&ws_hub))),
            channels: Arc::new(ChannelService::new(Arc::clone(&store), Arc::clone(&ws_hub))),
            tax: Arc::new(tax),
            distance: Arc::new(DistanceCalculator::new(vendors.geocoder.clone())),
            feedback: Arc::new(FeedbackService::new(
                vendors.mailer.clone(),
                config.feedback_recipient.clone(),
            )),
            verification: Arc::new(VerificationStore::new(Duration::seconds(config.code_ttl_secs))),
            store,
            ws_hub,
            vendors,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get WebSocket connection count
    pub async fn ws_connection_count(&self) -> usize {
        self.ws_hub.connection_count().await
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Allowed CORS origins; empty allows any
    pub cors_origins: Vec<String>,
    pub max_ws_connections: usize,
    /// Address used by `/api/distances` when the caller names none
    pub default_user_address: String,
    pub feedback_recipient: String,
    pub code_ttl_secs: i64,
    /// Include verification codes in responses (development only)
    pub expose_codes: bool,
    pub tax_cache_ttl_hours: i64,
    pub default_tax_rate: f64,
    pub max_tax_rate: f64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
            max_ws_connections: 1000,
            default_user_address: crate::distance::DEFAULT_USER_ADDRESS.to_string(),
            feedback_recipient: DEFAULT_RECIPIENT.to_string(),
            code_ttl_secs: DEFAULT_CODE_TTL_SECS,
            expose_codes: false,
            tax_cache_ttl_hours: DEFAULT_CACHE_TTL_HOURS,
            default_tax_rate: DEFAULT_TAX_RATE,
            max_tax_rate: MAX_TAX_RATE,
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            cors_origins: config.server.cors_origins.clone(),
            max_ws_connections: config.server.max_ws_connections,
            default_user_address: config.maps.default_user_address.clone(),
            feedback_recipient: config.email.feedback_recipient.clone(),
            code_ttl_secs: config.verification.code_ttl_secs,
            expose_codes: config.verification.expose_codes,
            tax_cache_ttl_hours: config.tax.cache_ttl_hours,
            default_tax_rate: config.tax.default_rate,
            max_tax_rate: config.tax.max_rate,
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
