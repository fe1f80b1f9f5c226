//! FoodBuddy REST API
//!
//! HTTP API layer for FoodBuddy, built with Axum.
//!
//! # Endpoints
//!
//! ## Restaurants
//! - `GET /api/restaurants` - Full restaurant list
//! - `GET /api/restaurants/:id` - Restaurant page (summary, distance, categorized menus, photos)
//! - `GET /api/restaurants/:id/deals/:deal_id` - One deal
//! - `GET /api/distances` - Miles from the user to every restaurant
//! - `GET /api/tax-rate` - Sales-tax estimate for a ZIP code
//! - `POST /api/feedback` - Email a menu or contact-info correction
//!
//! ## Account
//! - `POST /api/auth/send-verification` - Mail an email-change code
//! - `POST /api/auth/verify-and-update-email` - Confirm the code and change the email
//! - `GET /api/cloudinary-test` - Image host connectivity check
//!
//! ## Social
//! - `/api/users/...` - Profiles, search, bookmarks, friends, friend requests, groups
//! - `/api/friend-requests/...` - Send, accept, reject and withdraw requests
//! - `/api/groups/...` - Private dining groups, their chat and pre-order bill splits
//! - `/api/channels/...` - Public channels, their chat and dining events
//!
//! ## Health
//! - `GET /health/live` - Liveness check
//! - `GET /health/ready` - Readiness check
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /ws` - Realtime updates
//!
//! # Example
//!
//! ```rust,ignore
//! use foodbuddy::api::{serve, ApiConfig, AppState, Vendors};
//! use foodbuddy::catalog::Catalog;
//! use foodbuddy::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApiConfig::default();
//!     let state = AppState::new(
//!         Catalog::bundled()?,
//!         Arc::new(MemoryStore::new()),
//!         Vendors::default(),
//!         config.clone(),
//!     );
//!     serve(state, &config).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use extract::ApiJson;
pub use state::{ApiConfig, AppState, Vendors};

use axum::{
    http::HeaderValue,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::websocket::websocket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Catalog routes
        .route("/restaurants", get(routes::restaurants::list_restaurants))
        .route("/restaurants/:id", get(routes::restaurants::get_restaurant))
        .route("/restaurants/:id/deals/:deal_id", get(routes::restaurants::get_deal))
        .route("/distances", get(routes::distances::get_distances))
        .route("/tax-rate", get(routes::tax_rate::get_tax_rate))
        .route("/feedback", post(routes::feedback::submit_feedback))
        // Account routes
        .route("/auth/send-verification", post(routes::auth::send_verification))
        .route(
            "/auth/verify-and-update-email",
            post(routes::auth::verify_and_update_email),
        )
        .route("/cloudinary-test", get(routes::images::test_image_host))
        // Profile routes
        .route("/users/search", get(routes::profiles::search_users))
        .route(
            "/users/:uid/profile",
            get(routes::profiles::get_profile)
                .post(routes::profiles::create_profile)
                .patch(routes::profiles::update_profile),
        )
        .route(
            "/users/:uid/profile/:field",
            post(routes::profiles::add_preference).delete(routes::profiles::remove_preference),
        )
        // Bookmark routes
        .route("/users/:uid/bookmarks", get(routes::bookmarks::list_bookmarks))
        .route(
            "/users/:uid/bookmarks/:restaurant_id",
            put(routes::bookmarks::add_bookmark).delete(routes::bookmarks::remove_bookmark),
        )
        // Friend routes
        .route("/users/:uid/friends", get(routes::friends::list_friends))
        .route("/users/:uid/friends/:friend_id", delete(routes::friends::remove_friend))
        .route(
            "/users/:uid/friends/status/:other_id",
            get(routes::friends::friendship_status),
        )
        .route(
            "/users/:uid/friend-requests/incoming",
            get(routes::friends::incoming_requests),
        )
        .route(
            "/users/:uid/friend-requests/outgoing",
            get(routes::friends::outgoing_requests),
        )
        .route("/friend-requests", post(routes::friends::send_request))
        .route("/friend-requests/:id", delete(routes::friends::cancel_request))
        .route("/friend-requests/:id/accept", post(routes::friends::accept_request))
        .route("/friend-requests/:id/reject", post(routes::friends::reject_request))
        // Group routes
        .route("/users/:uid/groups", get(routes::groups::list_groups))
        .route("/groups", post(routes::groups::create_group))
        .route("/groups/:id", get(routes::groups::get_group))
        .route(
            "/groups/:id/messages",
            get(routes::groups::list_messages).post(routes::groups::send_message),
        )
        .route("/groups/:id/preorder", post(routes::preorder::split_preorder))
        // Channel routes
        .route(
            "/channels",
            get(routes::channels::list_channels).post(routes::channels::create_channel),
        )
        .route(
            "/channels/:name",
            get(routes::channels::get_channel).delete(routes::channels::disband_channel),
        )
        .route(
            "/channels/:name/messages",
            get(routes::channels::list_messages).post(routes::channels::send_message),
        )
        .route(
            "/channels/:name/events",
            get(routes::channels::list_events).post(routes::channels::create_event),
        )
        .route(
            "/channels/:name/events/:event_id",
            delete(routes::channels::cancel_event),
        );

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health_routes)
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Permissive when no origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("FoodBuddy API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("FoodBuddy API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::store::{DocumentStore, MemoryStore};
    use crate::vendors::fakes::{
        FakeAuthAdmin, FakeGeocoder, FakeImageHost, FakeTaxOracle, RecordingMailer,
    };
    use crate::vendors::ImageAsset;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn create_state(vendors: Vendors, config: ApiConfig) -> AppState {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        AppState::new(Catalog::bundled().unwrap(), store, vendors, config)
    }

    fn create_test_app() -> Router {
        build_router(create_state(Vendors::default(), ApiConfig::default()))
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn send(app: Router, method: &str, uri: &str, body: Value) -> Response {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = create_test_app();

        let response = get(app.clone(), "/health/live").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get(app.clone(), "/health/ready").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get(app, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["store"], "memory");
        assert_eq!(body["restaurants"], 7);
        assert_eq!(body["vendors"]["email"], false);
    }

    #[tokio::test]
    async fn test_list_restaurants() {
        let response = get(create_test_app(), "/api/restaurants").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body.as_array().map(Vec::len), Some(7));
        assert_eq!(body[0]["id"], "r1");
    }

    #[tokio::test]
    async fn test_restaurant_detail() {
        let host = FakeImageHost {
            assets: vec![
                ImageAsset::new("foods_pho").secure_url("https://img/foods_pho.jpg"),
                ImageAsset::new("logo").secure_url("https://img/logo.jpg"),
            ],
            ..Default::default()
        };
        let geocoder = FakeGeocoder::default()
            .with("84 Beacon St, Boston, MA 02108", 42.3557, -71.0707)
            .with("Home", 42.3601, -71.0589);
        let vendors = Vendors {
            image_host: Some(Arc::new(host)),
            geocoder: Some(Arc::new(geocoder)),
            ..Default::default()
        };
        let app = build_router(create_state(vendors, ApiConfig::default()));

        let response = get(app, "/api/restaurants/r1?userAddress=Home").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["name"], "84 Viet");
        assert!(body["summary"].as_str().unwrap().starts_with("Chinese • $$"));
        assert_eq!(body["imageUrls"], json!(["https://img/foods_pho.jpg"]));
        assert_eq!(body["distanceLabel"], "0.7 mi");
        assert!(body["menus"][0]["id"].as_str().unwrap().starts_with("menu-0-"));
    }

    #[tokio::test]
    async fn test_restaurant_not_found() {
        let response = get(create_test_app(), "/api/restaurants/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_get_deal() {
        let response = get(create_test_app(), "/api/restaurants/r1/deals/d1").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["restaurantId"], "r1");
        assert_eq!(body["id"], "d1");

        let response = get(create_test_app(), "/api/restaurants/r1/deals/d9").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_distances_without_geocoder_are_null() {
        let response = get(create_test_app(), "/api/distances").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body.as_object().map(|m| m.len()), Some(7));
        assert!(body["r1"].is_null());
    }

    #[tokio::test]
    async fn test_tax_rate() {
        let response = get(create_test_app(), "/api/tax-rate").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["message"], "Zip code is required");

        let vendors = Vendors {
            tax_oracle: Some(Arc::new(FakeTaxOracle::answering("0.0625"))),
            ..Default::default()
        };
        let app = build_router(create_state(vendors, ApiConfig::default()));

        let body = json_body(get(app.clone(), "/api/tax-rate?zipCode=02108").await).await;
        assert_eq!(body["taxRate"], 0.0625);
        assert!(body.get("cached").is_none());

        let body = json_body(get(app, "/api/tax-rate?zipCode=02108").await).await;
        assert_eq!(body["cached"], true);
    }

    #[tokio::test]
    async fn test_feedback() {
        let request = json!({
            "restaurantId": "r6",
            "restaurantName": "Taco Town",
            "userEmail": "diner@example.com",
            "userName": "Dana",
            "feedbackType": "contact-info",
            "feedbackContent": "Phone number changed"
        });

        // No mailer configured
        let response = send(create_test_app(), "POST", "/api/feedback", request.clone()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"]["message"], "Email service not configured");

        let mailer = Arc::new(RecordingMailer::default());
        let vendors = Vendors {
            mailer: Some(mailer.clone()),
            ..Default::default()
        };
        let app = build_router(create_state(vendors, ApiConfig::default()));

        let response = send(app.clone(), "POST", "/api/feedback", request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Feedback submitted successfully");
        assert_eq!(mailer.sent().len(), 1);

        let response = send(app, "POST", "/api/feedback", json!({"restaurantId": "r6"})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_email_change_flow() {
        let mailer = Arc::new(RecordingMailer::default());
        let admin = Arc::new(FakeAuthAdmin::default());
        let vendors = Vendors {
            mailer: Some(mailer.clone()),
            auth_admin: Some(admin.clone()),
            ..Default::default()
        };
        let config = ApiConfig {
            expose_codes: true,
            ..Default::default()
        };
        let app = build_router(create_state(vendors, config));

        let response = send(app.clone(), "POST", "/api/auth/send-verification", json!({"email": "nope"})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            app.clone(),
            "POST",
            "/api/auth/send-verification",
            json!({"email": "new@example.com"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let code = body["code"].as_str().unwrap().to_string();
        assert_eq!(code.len(), 6);
        assert!(mailer.sent()[0].html.contains(&code));

        let response = send(
            app.clone(),
            "POST",
            "/api/auth/verify-and-update-email",
            json!({"userId": "u1", "newEmail": "new@example.com", "verificationCode": "000000"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["message"], "Invalid verification code");

        // Numeric codes are accepted
        let numeric: u64 = code.parse().unwrap();
        let response = send(
            app.clone(),
            "POST",
            "/api/auth/verify-and-update-email",
            json!({"userId": "u1", "newEmail": "new@example.com", "verificationCode": numeric}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["message"], "Email updated successfully");
        assert_eq!(
            admin.updates.lock().unwrap().clone(),
            vec![("u1".to_string(), "new@example.com".to_string())]
        );

        // The code is single use
        let response = send(
            app,
            "POST",
            "/api/auth/verify-and-update-email",
            json!({"userId": "u1", "newEmail": "new@example.com", "verificationCode": code}),
        )
        .await;
        assert_eq!(
            json_body(response).await["error"]["message"],
            "No verification code found. Please request a new one."
        );
    }

    #[tokio::test]
    async fn test_send_verification_mail_failure() {
        let vendors = Vendors {
            mailer: Some(Arc::new(RecordingMailer::failing())),
            ..Default::default()
        };
        let app = build_router(create_state(vendors, ApiConfig::default()));

        let response = send(app, "POST", "/api/auth/send-verification", json!({"email": "a@b.co"})).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await["error"]["message"],
            "Failed to send verification code"
        );
    }

    #[tokio::test]
    async fn test_verify_without_auth_admin() {
        let state = create_state(Vendors::default(), ApiConfig::default());
        state.verification.store_at("a@b.co", "123456", chrono::Utc::now()).await;
        let app = build_router(state);

        let response = send(
            app,
            "POST",
            "/api/auth/verify-and-update-email",
            json!({"userId": "u1", "newEmail": "a@b.co", "verificationCode": "123456"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await["error"]["message"],
            "Failed to update email in authentication system"
        );
    }

    #[tokio::test]
    async fn test_cloudinary_test_route() {
        let response = get(create_test_app(), "/api/cloudinary-test").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["success"], false);

        let host = FakeImageHost {
            assets: vec![ImageAsset::new("foods_1")],
            ..Default::default()
        };
        let vendors = Vendors {
            image_host: Some(Arc::new(host)),
            ..Default::default()
        };
        let app = build_router(create_state(vendors, ApiConfig::default()));

        let response = get(app, "/api/cloudinary-test").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["config"]["api_key"], "present");
        assert_eq!(body["resources"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_profile_and_bookmarks() {
        let app = create_test_app();

        let response = send(
            app.clone(),
            "POST",
            "/api/users/u1/profile",
            json!({"email": "ana@example.com", "username": "AnaB"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(app.clone(), "POST", "/api/users/u1/profile/cravings", json!({"value": "pho"})).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["cravings"], json!(["pho"]));

        let response = send(app.clone(), "POST", "/api/users/u1/profile/shoeSize", json!({"value": "9"})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(get(app.clone(), "/api/users/search?q=ana").await).await;
        assert_eq!(body[0]["userId"], "u1");

        let response = send(app.clone(), "PUT", "/api/users/u1/bookmarks/r3", json!({})).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(app.clone(), "PUT", "/api/users/u1/bookmarks/r99", json!({})).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = json_body(get(app, "/api/users/u1/bookmarks").await).await;
        assert_eq!(body["restaurantIds"], json!(["r3"]));
    }

    #[tokio::test]
    async fn test_friend_request_routes() {
        let app = create_test_app();

        let response = send(
            app.clone(),
            "POST",
            "/api/friend-requests",
            json!({"fromUserId": "a", "toUserId": "b"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = json_body(response).await["requestId"].as_str().unwrap().to_string();

        let response = send(
            app.clone(),
            "POST",
            "/api/friend-requests",
            json!({"fromUserId": "a", "toUserId": "b"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = send(app.clone(), "POST", &format!("/api/friend-requests/{}/accept", id), json!({})).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(get(app.clone(), "/api/users/b/friends").await).await;
        assert_eq!(body["friends"], json!(["a"]));

        let body = json_body(get(app, "/api/users/a/friends/status/b").await).await;
        assert_eq!(body["status"], "friends");
    }

    #[tokio::test]
    async fn test_group_routes() {
        let app = create_test_app();

        let response = send(
            app.clone(),
            "POST",
            "/api/groups",
            json!({"name": "Lunch", "createdBy": "a", "memberIds": ["b"]}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = json_body(response).await["id"].as_str().unwrap().to_string();

        let response = send(
            app.clone(),
            "POST",
            &format!("/api/groups/{}/messages", id),
            json!({"senderId": "b", "text": "noon?"}),
        )
        .await;
        assert_eq!(json_body(response).await["sent"], true);

        let body = json_body(get(app.clone(), &format!("/api/groups/{}/messages", id)).await).await;
        assert_eq!(body[0]["text"], "noon?");

        let body = json_body(get(app.clone(), "/api/users/b/groups").await).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));

        let response = send(app, "POST", "/api/groups", json!({"createdBy": "a"})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_channel_routes() {
        let app = create_test_app();

        let response = send(
            app.clone(),
            "POST",
            "/api/channels",
            json!({"name": "Data Science", "createdBy": "a"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json_body(get(app.clone(), "/api/channels?search=data").await).await;
        assert_eq!(body[0]["createdBy"], "a");

        let response = send(
            app.clone(),
            "POST",
            "/api/channels/Data%20Science/events",
            json!({
                "creatorId": "a",
                "restaurantId": "r2",
                "restaurantName": "Red Garden",
                "diningTime": "2026-10-24T18:30"
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(app.clone(), "DELETE", "/api/channels/Data%20Science?requestedBy=b", json!({})).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(app.clone(), "DELETE", "/api/channels/Data%20Science", json!({})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(app.clone(), "DELETE", "/api/channels/Data%20Science?requestedBy=a", json!({})).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = get(app, "/api/channels/Data%20Science").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    async fn send_raw(app: Router, method: &str, uri: &str, body: &str) -> Response {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn assert_validation_error(response: Response, context: &str) {
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", context);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR", "{}", context);
        assert!(body["error"]["message"].is_string(), "{}", context);
        assert!(body["request_id"].is_string(), "{}", context);
    }

    #[tokio::test]
    async fn test_bad_request_bodies_use_error_envelope() {
        let app = create_test_app();

        // (method, uri, missing field, wrong type)
        let cases = [
            ("POST", "/api/friend-requests", r#"{"fromUserId":"a"}"#, r#"{"fromUserId":"a","toUserId":5}"#),
            ("POST", "/api/groups/g1/messages", r#"{"senderId":"a"}"#, r#"{"senderId":"a","text":["hi"]}"#),
            ("POST", "/api/users/u1/profile", r#"{"email":"a@b.co"}"#, r#"{"email":"a@b.co","username":7}"#),
            ("POST", "/api/users/u1/profile/cravings", r#"{}"#, r#"{"value":1}"#),
            ("DELETE", "/api/users/u1/profile/cravings", r#"{}"#, r#"{"value":false}"#),
            ("POST", "/api/channels", r#"{"name":"Food"}"#, r#"{"name":"Food","createdBy":{}}"#),
            ("POST", "/api/channels/Food/messages", r#"{"text":"hi"}"#, r#"{"senderId":1,"text":"hi"}"#),
            ("POST", "/api/feedback", r#"{"restaurantId":"r1"}"#, r#"{"restaurantId":"r1","feedbackType":5}"#),
            ("POST", "/api/auth/send-verification", r#"{}"#, r#"{"email":42}"#),
            ("POST", "/api/groups", r#"{"createdBy":"a"}"#, r#"{"name":"Lunch","createdBy":"a","memberIds":"b"}"#),
            ("POST", "/api/channels/Food/events", r#"{"creatorId":"a"}"#, r#"{"creatorId":"a","diningTime":1}"#),
        ];

        for (method, uri, missing, wrong_type) in cases {
            let response = send_raw(app.clone(), method, uri, missing).await;
            assert_validation_error(response, &format!("{} {} missing field", method, uri)).await;

            let response = send_raw(app.clone(), method, uri, wrong_type).await;
            assert_validation_error(response, &format!("{} {} wrong type", method, uri)).await;

            let response = send_raw(app.clone(), method, uri, r#"{"unterminated":"#).await;
            assert_validation_error(response, &format!("{} {} malformed", method, uri)).await;
        }

        let response = send_raw(app.clone(), "PATCH", "/api/users/u1/profile", "{").await;
        assert_validation_error(response, "PATCH profile malformed").await;

        let response = send_raw(
            app,
            "POST",
            "/api/auth/verify-and-update-email",
            r#"{"userId":"u1","newEmail":"a@b.co","verificationCode":true}"#,
        )
        .await;
        assert_validation_error(response, "verification code wrong type").await;
    }

    #[tokio::test]
    async fn test_path_ids_with_slashes_are_rejected() {
        let state = create_state(Vendors::default(), ApiConfig::default());
        let store = Arc::clone(&state.store);
        let app = build_router(state);

        let response = get(app.clone(), "/api/users/a%2Fb/friends").await;
        assert_validation_error(response, "friends").await;

        let response = send(app.clone(), "PUT", "/api/users/a%2Fx%2Fy/bookmarks/r3", json!({})).await;
        assert_validation_error(response, "bookmark").await;
        assert!(store.list("users/a/x/y/bookmarks").await.unwrap_or_default().is_empty());

        let response = get(app.clone(), "/api/users/..%2Fgroups/profile").await;
        assert_validation_error(response, "profile").await;

        let response = get(app.clone(), "/api/groups/g1%2Fmessages%2Fm1").await;
        assert_validation_error(response, "group").await;

        let response = send(app, "POST", "/api/friend-requests/x%2Fy/accept", json!({})).await;
        assert_validation_error(response, "friend request").await;
    }

    #[tokio::test]
    async fn test_group_cards_show_time_and_tags() {
        let app = create_test_app();

        let response = send(
            app.clone(),
            "POST",
            "/api/groups",
            json!({
                "name": "Lunch",
                "createdBy": "a",
                "restaurantName": "84 viet",
                "diningTime": "2026-10-24T12:00"
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["diningTimeLabel"], "Sat 2026-10-24 12:00");
        assert_eq!(body["tags"], json!(["solo-friendly", "healthy"]));

        send(app.clone(), "POST", "/api/groups", json!({"name": "Later", "createdBy": "a"})).await;

        let body = json_body(get(app.clone(), "/api/users/a/groups").await).await;
        let undecided = body
            .as_array()
            .unwrap()
            .iter()
            .find(|g| g["name"] == "Later")
            .unwrap();
        assert_eq!(undecided["diningTimeLabel"], "N/A");
        assert_eq!(undecided["tags"], json!([]));

        send(app.clone(), "POST", "/api/channels", json!({"name": "Food", "createdBy": "a"})).await;
        let response = send(
            app.clone(),
            "POST",
            "/api/channels/Food/events",
            json!({
                "creatorId": "a",
                "restaurantId": "r2",
                "restaurantName": "Red Garden",
                "diningTime": "2026-10-24T18:30"
            }),
        )
        .await;
        assert_eq!(json_body(response).await["diningTimeLabel"], "Sat 2026-10-24 18:30");

        let body = json_body(get(app, "/api/channels/Food/events").await).await;
        assert_eq!(body[0]["diningTimeLabel"], "Sat 2026-10-24 18:30");
    }

    #[tokio::test]
    async fn test_preorder_split() {
        let oracle = Arc::new(FakeTaxOracle::answering("0.1"));
        let vendors = Vendors {
            tax_oracle: Some(oracle.clone()),
            ..Default::default()
        };
        let app = build_router(create_state(vendors, ApiConfig::default()));

        send(app.clone(), "POST", "/api/users/a/profile", json!({"email": "a@x.co", "username": "alice"})).await;
        send(app.clone(), "POST", "/api/users/a/profile/allergies", json!({"value": "peanuts"})).await;
        send(app.clone(), "POST", "/api/users/b/profile", json!({"email": "b@x.co", "username": "bob"})).await;

        let response = send(
            app.clone(),
            "POST",
            "/api/groups",
            json!({"name": "Pho night", "createdBy": "a", "memberIds": ["b"], "restaurantName": "84 Viet"}),
        )
        .await;
        let id = json_body(response).await["id"].as_str().unwrap().to_string();
        let uri = format!("/api/groups/{}/preorder", id);

        let order = json!({
            "items": [
                {"name": "Pho", "price": 12.0, "assignedTo": ["a"]},
                {"name": "Rolls", "price": 8.0, "assignedTo": ["a", "b"]}
            ],
            "tipPercent": 20
        });
        let response = send(app.clone(), "POST", &uri, order).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["zipCode"], "02108");
        assert_eq!(body["restaurantName"], "84 Viet");
        assert_eq!(body["subtotal"], 20.0);
        assert_eq!(body["tax"], 2.0);
        assert_eq!(body["tip"], 4.0);
        assert_eq!(body["total"], 26.0);
        assert_eq!(body["shares"]["a"], 20.8);
        assert_eq!(body["shares"]["b"], 5.2);
        assert_eq!(body["allergies"], json!({"alice": ["peanuts"]}));
        assert_eq!(oracle.calls(), 1);

        // A given rate skips the lookup; the default tip applies
        let response = send(
            app.clone(),
            "POST",
            &uri,
            json!({"items": [{"name": "Pho", "price": 10.0, "assignedTo": ["b"]}], "taxRate": 0.05}),
        )
        .await;
        let body = json_body(response).await;
        assert_eq!(body["taxRate"], 0.05);
        assert_eq!(body["tipPercent"], 18.0);
        assert_eq!(body["shares"]["b"], 12.3);
        assert_eq!(body["shares"]["a"], 0.0);

        let response = send(
            app.clone(),
            "POST",
            &uri,
            json!({"items": [{"name": "Pho", "price": 10.0, "assignedTo": ["z"]}]}),
        )
        .await;
        assert_validation_error(response, "outsider").await;

        let response = send(app.clone(), "POST", &uri, json!({"items": []})).await;
        assert_validation_error(response, "empty order").await;

        let response = send(app.clone(), "POST", &uri, json!({"tipPercent": 15})).await;
        assert_validation_error(response, "missing items").await;

        let response = send(
            app.clone(),
            "POST",
            &uri,
            json!({"items": [{"name": "Pho", "price": 10.0, "assignedTo": ["a"]}], "restaurantId": "nope"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(app, "POST", "/api/groups/missing/preorder", json!({"items": []})).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
