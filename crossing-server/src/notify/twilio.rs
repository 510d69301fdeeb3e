//! Twilio SMS provider.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;

use crate::domain::PhoneNumber;

use super::sms::{DeliveryError, SmsProvider};

/// Default base URL for the Twilio REST API.
const DEFAULT_BASE_URL: &str = "https://api.twilio.com/2010-04-01";

/// Twilio credentials and sender number.
#[derive(Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Number messages are sent from
    pub from_number: PhoneNumber,
    /// Base URL for the API (defaults to production Twilio)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TwilioConfig {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: PhoneNumber,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

// Keeps the auth token out of logs.
impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("from_number", &self.from_number)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Error body returned by Twilio.
#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    message: String,
}

/// Sends SMS through Twilio's Messages API.
///
/// Twilio has no batch endpoint: each recipient gets its own request, and
/// the requests run concurrently.
#[derive(Debug, Clone)]
pub struct TwilioProvider {
    http: reqwest::Client,
    config: TwilioConfig,
}

impl TwilioProvider {
    pub fn new(config: TwilioConfig) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    async fn send_one(&self, to: &PhoneNumber, text: &str) -> Result<(), DeliveryError> {
        let url = format!(
            "{}/Accounts/{}/Messages.json",
            self.config.base_url, self.config.account_sid
        );

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", to.as_str()),
                ("From", self.config.from_number.as_str()),
                ("Body", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<TwilioErrorBody>(&body)
            .map(|e| e.message)
            .unwrap_or(body);

        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl SmsProvider for TwilioProvider {
    async fn send_batch(
        &self,
        subject: &str,
        body: &str,
        recipients: &[PhoneNumber],
    ) -> Vec<Result<(), DeliveryError>> {
        let text = format!("{subject}\n{body}");
        join_all(recipients.iter().map(|to| self.send_one(to, &text))).await
    }
}
