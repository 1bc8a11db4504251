use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::info;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

pub fn validate_email(email: &str) -> AppResult<()> {
    if EMAIL_PATTERN.is_match(email.trim()) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid email format".into()))
    }
}

/// Forwards waitlist signups to the CRM passthrough API. Validation happens
/// before any outbound call; upstream failures are surfaced verbatim.
#[derive(Clone)]
pub struct WaitlistForwarder {
    http: Client,
    api_url: Option<String>,
    api_token: Option<SecretString>,
}

impl WaitlistForwarder {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            api_url: config.crm_api_url.clone(),
            api_token: config.crm_api_token.clone(),
        })
    }

    pub async fn forward(&self, email: &str) -> AppResult<()> {
        validate_email(email)?;

        let url = self
            .api_url
            .as_deref()
            .ok_or_else(|| AppError::Config("CRM_API_URL is not set".into()))?;
        let token = self
            .api_token
            .as_ref()
            .ok_or_else(|| AppError::Config("CRM_API_TOKEN is not set".into()))?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token.expose_secret())
            .json(&json!({ "email": email.trim() }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                format!("CRM request failed ({status})")
            } else {
                body
            };
            return Err(AppError::provider(Some(status.as_u16()), message));
        }

        info!("waitlist signup forwarded");
        Ok(())
    }
}
