//! OpenAI chat-completions client used as a sales-tax oracle

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ensure_success, http_client, TaxRateOracle, VendorError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o";

const SYSTEM_PROMPT: &str = "You are a US sales tax rate expert. Your job is to provide the EXACT combined sales tax rate (state + county + city + district taxes) for a given US zip code.

Important considerations:
- Include ALL applicable taxes: state, county, city, and special district taxes
- California has varying rates by city/district (e.g., Berkeley CA 94704 = 10.25%, Oakland CA = 10.25%, San Francisco = 8.625%)
- Be precise to the nearest 0.125% as that's how tax rates are typically set
- If unsure about exact local rates, use the most likely combined rate for that area

Respond with ONLY the tax rate as a decimal number (e.g., 0.1025 for 10.25%). No other text.";

fn user_prompt(zip_code: &str) -> String {
    format!(
        "What is the exact combined sales tax rate for zip code {}? Include state, county, city, and any special district taxes.",
        zip_code
    )
}

pub struct OpenAiTaxOracle {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiTaxOracle {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout_ms: u64) -> Result<Self, VendorError> {
        Ok(Self {
            client: http_client(timeout_ms)?,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request<'a>(&'a self, zip_code: &str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(zip_code),
                },
            ],
            temperature: 0.0,
            max_tokens: 20,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatResponse {
    /// Trimmed text of the first choice, empty when absent
    fn answer(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TaxRateOracle for OpenAiTaxOracle {
    async fn estimate(&self, zip_code: &str) -> Result<String, VendorError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request(zip_code))
            .send()
            .await
            .map_err(VendorError::from_transport)?;

        let response = ensure_success(response).await?;
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| VendorError::Parse(e.to_string()))?;

        Ok(body.answer())
    }
}
