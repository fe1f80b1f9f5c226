//! Auth Routes
//!
//! Email change with a mailed confirmation code.
//!
//! - POST /api/auth/send-verification - Mail a six-digit code to the new address
//! - POST /api/auth/verify-and-update-email - Check the code and update the
//!   account's sign-in email

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{
    SendVerificationRequest, SendVerificationResponse, SuccessResponse, VerifyEmailRequest,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::social::ProfileUpdate;
use crate::vendors::Email;

const SEND_FAILED: &str = "Failed to send verification code";
const AUTH_UPDATE_FAILED: &str = "Failed to update email in authentication system";

fn verification_email(to: &str, code: &str, ttl_minutes: i64) -> Email {
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h2 style="color: #333; border-bottom: 2px solid #4F46E5; padding-bottom: 10px;">Email Verification</h2>
  <p style="color: #666; font-size: 16px; line-height: 1.5;">Thank you for using FoodBuddy! Please use the verification code below to verify your email address:</p>
  <div style="background-color: #F3F4F6; border-radius: 8px; padding: 20px; text-align: center; margin: 30px 0;">
    <h1 style="color: #4F46E5; font-size: 36px; letter-spacing: 8px; margin: 0;">{code}</h1>
  </div>
  <p style="color: #666; font-size: 14px; line-height: 1.5;">This code will expire in <strong>{ttl_minutes} minutes</strong>.</p>
  <p style="color: #666; font-size: 14px; line-height: 1.5;">If you didn't request this code, you can safely ignore this email.</p>
  <hr style="border: none; border-top: 1px solid #E5E7EB; margin: 30px 0;">
  <p style="color: #999; font-size: 12px; text-align: center;">FoodBuddy - Your Restaurant Discovery Platform</p>
</div>"#
    );
    Email::new(to, "FoodBuddy - Email Verification Code", html)
}

/// POST /api/auth/send-verification
///
/// The code is stored before mailing, so a failed send leaves it pending
/// until it expires. Expired codes are swept after every successful send.
pub async fn send_verification(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SendVerificationRequest>,
) -> ApiResult<Json<SendVerificationResponse>> {
    let email = req
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| e.contains('@'))
        .ok_or_else(|| ApiError::Validation("Invalid email address".to_string()))?;

    let code = state.verification.issue(&email).await;

    let mailer = state.vendors.mailer.as_ref().ok_or_else(|| {
        tracing::error!("Cannot send verification code: email service not configured");
        ApiError::Upstream(SEND_FAILED.to_string())
    })?;

    let ttl_minutes = state.config.code_ttl_secs / 60;
    match mailer.send(&verification_email(&email, &code, ttl_minutes)).await {
        Ok(message_id) => {
            tracing::info!(email = %email, message_id = %message_id, "Verification code sent");
        }
        Err(e) => {
            tracing::error!(email = %email, error = %e, "Failed to send verification email");
            return Err(ApiError::Upstream(SEND_FAILED.to_string()));
        }
    }

    state.verification.sweep().await;

    Ok(Json(SendVerificationResponse {
        success: true,
        message: "Verification code sent".to_string(),
        code: state.config.expose_codes.then_some(code),
    }))
}

/// POST /api/auth/verify-and-update-email
///
/// The code is consumed only after the account update succeeds, so a
/// failed update can be retried with the same code.
pub async fn verify_and_update_email(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<VerifyEmailRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let non_blank = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    let (Some(user_id), Some(new_email), Some(code)) = (
        non_blank(req.user_id),
        non_blank(req.new_email),
        non_blank(req.verification_code.map(|c| c.as_text())),
    ) else {
        return Err(ApiError::Validation("Missing required fields".to_string()));
    };

    state.verification.verify(&new_email, &code).await?;

    let admin = state.vendors.auth_admin.as_ref().ok_or_else(|| {
        tracing::error!("Cannot update email: auth admin not configured");
        ApiError::Upstream(AUTH_UPDATE_FAILED.to_string())
    })?;

    if let Err(e) = admin.update_email(&user_id, &new_email).await {
        tracing::error!(user_id = %user_id, error = %e, "Failed to update auth email");
        return Err(ApiError::Upstream(AUTH_UPDATE_FAILED.to_string()));
    }

    state.verification.consume(&new_email).await;

    // Keep the stored profile in step with the account
    match state.profiles.get(&user_id).await {
        Ok(Some(_)) => {
            let update = ProfileUpdate {
                email: Some(new_email.clone()),
                ..Default::default()
            };
            if let Err(e) = state.profiles.update(&user_id, &update).await {
                tracing::warn!(user_id = %user_id, error = %e, "Profile email not updated");
            }
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(user_id = %user_id, error = %e, "Profile lookup failed"),
    }

    tracing::info!(user_id = %user_id, "Email updated");
    Ok(Json(SuccessResponse::ok("Email updated successfully")))
}
