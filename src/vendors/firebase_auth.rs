//! Firebase Auth administration
//!
//! Uses the Identity Toolkit REST API with an OAuth2 access token carrying
//! admin scope.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{ensure_success, http_client, AuthAdmin, VendorError};

pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com";

pub struct FirebaseAuthAdmin {
    client: Client,
    base_url: String,
    project_id: String,
    access_token: String,
}

impl FirebaseAuthAdmin {
    pub fn new(
        project_id: impl Into<String>,
        access_token: impl Into<String>,
        timeout_ms: u64,
    ) -> Result<Self, VendorError> {
        Ok(Self {
            client: http_client(timeout_ms)?,
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
            access_token: access_token.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn update_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/accounts:update",
            self.base_url, self.project_id
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAccountRequest<'a> {
    local_id: &'a str,
    email: &'a str,
}

#[async_trait]
impl AuthAdmin for FirebaseAuthAdmin {
    async fn update_email(&self, user_id: &str, new_email: &str) -> Result<(), VendorError> {
        let body = UpdateAccountRequest {
            local_id: user_id,
            email: new_email,
        };

        let response = self
            .client
            .post(self.update_url())
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(VendorError::from_transport)?;

        ensure_success(response).await?;
        tracing::info!(user_id = %user_id, "Updated account email");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_url() {
        let admin = FirebaseAuthAdmin::new("foodbuddy-demo", "token", 1000).unwrap();
        assert_eq!(
            admin.update_url(),
            "https://identitytoolkit.googleapis.com/v1/projects/foodbuddy-demo/accounts:update"
        );
    }

    #[test]
    fn test_request_uses_local_id() {
        let body = UpdateAccountRequest {
            local_id: "uid-1",
            email: "new@example.com",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["localId"], "uid-1");
        assert_eq!(json["email"], "new@example.com");
    }
}
