//! Resend email client
//!
//! Sends transactional email through `POST https://api.resend.com/emails`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ensure_success, http_client, Email, Mailer, VendorError};

pub const DEFAULT_BASE_URL: &str = "https://api.resend.com";

/// Sender used when no verified domain address is configured
pub const DEFAULT_FROM: &str = "FoodBuddy <onboarding@resend.dev>";

pub struct ResendMailer {
    client: Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>, timeout_ms: u64) -> Result<Self, VendorError> {
        Ok(Self {
            client: http_client(timeout_ms)?,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            from: from.into(),
        })
    }

    /// Point the client at another endpoint (used against local mocks)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn from_address(&self) -> &str {
        &self.from
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    #[serde(default)]
    id: String,
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &Email) -> Result<String, VendorError> {
        let url = format!("{}/emails", self.base_url);
        let body = SendEmailRequest {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
            reply_to: email.reply_to.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(VendorError::from_transport)?;

        let response = ensure_success(response).await?;
        let sent: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| VendorError::Parse(e.to_string()))?;

        tracing::info!(message_id = %sent.id, recipients = email.to.len(), "Email sent");
        Ok(sent.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let to = vec!["a@example.com".to_string()];
        let body = SendEmailRequest {
            from: DEFAULT_FROM,
            to: &to,
            subject: "Hi",
            html: "<p>Hi</p>",
            reply_to: None,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["from"], DEFAULT_FROM);
        assert_eq!(json["to"][0], "a@example.com");
        assert!(json.get("reply_to").is_none());
    }

    #[test]
    fn test_reply_to_serialized() {
        let to = vec!["team@example.com".to_string()];
        let body = SendEmailRequest {
            from: DEFAULT_FROM,
            to: &to,
            subject: "Feedback",
            html: "",
            reply_to: Some("user@example.com"),
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["reply_to"], "user@example.com");
    }
}
