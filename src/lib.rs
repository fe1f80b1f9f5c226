//! # FoodBuddy
//!
//! Restaurant discovery backend: a restaurant catalog with deals and
//! categorized menus, plus the social layer around it (profiles, bookmarks,
//! friends, private groups and public channels).
//!
//! ## Features
//!
//! - **Catalog**: Static restaurant records with menu categorization and popular tags
//! - **Distances**: Geocoded, cached miles from the user to each restaurant
//! - **Tax estimates**: Per-ZIP sales-tax rates with a daily cache
//! - **Email change**: Mailed six-digit codes with expiry
//! - **Social**: Friend requests, group and channel chat, dining events
//! - **Pre-orders**: Group orders split per member with tax and tip
//! - **Real-time**: WebSocket push for every social change
//!
//! ## Modules
//!
//! - [`catalog`]: Restaurant records, menus, deals and display formatting
//! - [`store`]: Document store abstraction (in-memory or Firestore)
//! - [`social`]: Profiles, bookmarks, friends, groups, channels
//! - [`vendors`]: Email, auth, image, tax and geocoding clients
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use foodbuddy::api::{serve, ApiConfig, AppState, Vendors};
//! use foodbuddy::catalog::Catalog;
//! use foodbuddy::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApiConfig::new("127.0.0.1", 8080);
//!     let state = AppState::new(
//!         Catalog::bundled()?,
//!         Arc::new(MemoryStore::new()),
//!         Vendors::default(),
//!         config.clone(),
//!     );
//!
//!     state.channels.ensure_defaults().await?;
//!     serve(state, &config).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod distance;
pub mod feedback;
pub mod preorder;
pub mod social;
pub mod store;
pub mod tax;
pub mod vendors;
pub mod verification;
pub mod websocket;

// Re-export top-level types for convenience
pub use api::{build_router, serve, ApiConfig, ApiError, AppState, Vendors};

pub use catalog::{Catalog, CatalogError, Deal, Menu, MenuItem, Restaurant};

pub use store::{DocumentStore, FirestoreStore, MemoryStore, StoreError, StoreResult};

pub use social::{
    BookmarkService, ChannelService, FriendService, GroupService, ProfileService, SocialError,
};

pub use websocket::{
    websocket_handler, ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage, WsEvent,
};

pub use config::{generate_default_config, Config, ConfigError, LoggingConfig};
