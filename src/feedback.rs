//! Restaurant feedback
//!
//! Users report wrong menus or contact details; each report is emailed to
//! the team inbox with the reporter as reply-to.

use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use crate::vendors::{Email, Mailer, VendorError};

/// Inbox receiving feedback when none is configured
pub const DEFAULT_RECIPIENT: &str = "feedback@foodbuddy.app";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackType {
    Menu,
    ContactInfo,
}

impl FeedbackType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "menu" => Some(FeedbackType::Menu),
            "contact-info" => Some(FeedbackType::ContactInfo),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeedbackType::Menu => "Menu",
            FeedbackType::ContactInfo => "Contact Info",
        }
    }
}

/// Body of `POST /api/feedback`; every field is required
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub restaurant_id: Option<String>,
    pub restaurant_name: Option<String>,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub feedback_type: Option<String>,
    pub feedback_content: Option<String>,
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub restaurant_id: String,
    pub restaurant_name: String,
    pub user_email: String,
    pub user_name: String,
    pub kind: FeedbackType,
    pub content: String,
}

impl FeedbackRequest {
    pub fn validate(self) -> Result<Feedback, FeedbackError> {
        fn required(value: Option<String>) -> Result<String, FeedbackError> {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or(FeedbackError::MissingFields)
        }

        let restaurant_id = required(self.restaurant_id)?;
        let restaurant_name = required(self.restaurant_name)?;
        let user_email = required(self.user_email)?;
        let user_name = required(self.user_name)?;
        let raw_type = required(self.feedback_type)?;
        let content = required(self.feedback_content)?;

        let kind = FeedbackType::parse(&raw_type).ok_or(FeedbackError::InvalidType(raw_type))?;

        Ok(Feedback {
            restaurant_id,
            restaurant_name,
            user_email,
            user_name,
            kind,
            content,
        })
    }
}

/// Escape text for inclusion in an HTML body
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

impl Feedback {
    pub fn subject(&self) -> String {
        format!(
            "FoodBuddy Feedback - {} for {}",
            self.kind.label(),
            self.restaurant_name
        )
    }

    pub fn html(&self) -> String {
        let content = escape_html(&self.content).replace('\n', "<br />");
        format!(
            "<h2>New Feedback Received</h2>\n\
             <p><strong>Feedback Type:</strong> {kind}</p>\n\
             <p><strong>Restaurant:</strong> {name} (ID: {id})</p>\n\
             <p><strong>User Name:</strong> {user}</p>\n\
             <p><strong>User Email:</strong> {email}</p>\n\
             <hr />\n\
             <h3>Feedback Content:</h3>\n\
             <p>{content}</p>\n\
             <hr />\n\
             <p><em>Submitted from FoodBuddy Application</em></p>\n",
            kind = self.kind.label(),
            name = escape_html(&self.restaurant_name),
            id = escape_html(&self.restaurant_id),
            user = escape_html(&self.user_name),
            email = escape_html(&self.user_email),
            content = content,
        )
    }

    pub fn to_email(&self, recipient: &str) -> Email {
        Email::new(recipient, self.subject(), self.html()).reply_to(self.user_email.clone())
    }
}

pub struct FeedbackService {
    mailer: Option<Arc<dyn Mailer>>,
    recipient: String,
}

impl FeedbackService {
    pub fn new(mailer: Option<Arc<dyn Mailer>>, recipient: impl Into<String>) -> Self {
        Self {
            mailer,
            recipient: recipient.into(),
        }
    }

    pub async fn submit(&self, request: FeedbackRequest) -> Result<(), FeedbackError> {
        let feedback = request.validate()?;

        let mailer = self.mailer.as_ref().ok_or(FeedbackError::NotConfigured)?;

        tracing::info!(
            restaurant_id = %feedback.restaurant_id,
            kind = feedback.kind.label(),
            "Submitting feedback"
        );

        mailer
            .send(&feedback.to_email(&self.recipient))
            .await
            .map_err(FeedbackError::Send)?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid feedback type: {0}")]
    InvalidType(String),

    #[error("Email service not configured")]
    NotConfigured,

    #[error("Failed to submit feedback")]
    Send(#[source] VendorError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendors::fakes::RecordingMailer;

    fn request() -> FeedbackRequest {
        FeedbackRequest {
            restaurant_id: Some("r6".to_string()),
            restaurant_name: Some("Taco Town".to_string()),
            user_email: Some("diner@example.com".to_string()),
            user_name: Some("Dana".to_string()),
            feedback_type: Some("menu".to_string()),
            feedback_content: Some("Prices changed.\nAl pastor is <$5>".to_string()),
        }
    }

    #[test]
    fn test_missing_field_rejected() {
        let mut req = request();
        req.user_name = Some("   ".to_string());
        assert!(matches!(req.validate(), Err(FeedbackError::MissingFields)));

        let mut req = request();
        req.feedback_content = None;
        assert!(matches!(req.validate(), Err(FeedbackError::MissingFields)));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut req = request();
        req.feedback_type = Some("hours".to_string());
        assert!(matches!(req.validate(), Err(FeedbackError::InvalidType(t)) if t == "hours"));
    }

    #[test]
    fn test_email_composition() {
        let feedback = request().validate().unwrap();
        let email = feedback.to_email("team@example.com");

        assert_eq!(email.subject, "FoodBuddy Feedback - Menu for Taco Town");
        assert_eq!(email.to, vec!["team@example.com"]);
        assert_eq!(email.reply_to.as_deref(), Some("diner@example.com"));
        assert!(email.html.contains("Prices changed.<br />Al pastor is &lt;$5&gt;"));
        assert!(email.html.contains("Taco Town (ID: r6)"));
    }

    #[test]
    fn test_contact_info_label() {
        let mut req = request();
        req.feedback_type = Some("contact-info".to_string());
        let feedback = req.validate().unwrap();
        assert_eq!(feedback.subject(), "FoodBuddy Feedback - Contact Info for Taco Town");
    }

    #[tokio::test]
    async fn test_submit_without_mailer() {
        let service = FeedbackService::new(None, DEFAULT_RECIPIENT);
        assert!(matches!(service.submit(request()).await, Err(FeedbackError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_submit_sends_one_email() {
        let mailer = Arc::new(RecordingMailer::default());
        let service = FeedbackService::new(Some(mailer.clone()), DEFAULT_RECIPIENT);

        service.submit(request()).await.unwrap();
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_mail_failure() {
        let service = FeedbackService::new(Some(Arc::new(RecordingMailer::failing())), DEFAULT_RECIPIENT);
        assert!(matches!(service.submit(request()).await, Err(FeedbackError::Send(_))));
    }
}
