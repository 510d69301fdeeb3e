//! SMS provider abstraction.

use async_trait::async_trait;
use tracing::info;

use crate::domain::PhoneNumber;

/// Failure delivering to a single recipient.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// Request to the provider failed in transit
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider refused the message
    #[error("provider rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Provider returned no result for this recipient
    #[error("provider reported no result for recipient")]
    Missing,
}

/// Sends one message to many recipients.
#[async_trait]
pub trait SmsProvider: Send + Sync {
    /// Send `body` under `subject` to every recipient.
    ///
    /// Returns one result per recipient, in the order given. A failure for
    /// one recipient must not prevent delivery to the others.
    async fn send_batch(
        &self,
        subject: &str,
        body: &str,
        recipients: &[PhoneNumber],
    ) -> Vec<Result<(), DeliveryError>>;
}

/// Provider that only logs messages.
///
/// Used when no SMS credentials are configured.
#[derive(Debug, Clone, Default)]
pub struct LogProvider;

#[async_trait]
impl SmsProvider for LogProvider {
    async fn send_batch(
        &self,
        subject: &str,
        body: &str,
        recipients: &[PhoneNumber],
    ) -> Vec<Result<(), DeliveryError>> {
        for recipient in recipients {
            info!(%recipient, subject, body, "SMS (not sent, no provider configured)");
        }
        recipients.iter().map(|_| Ok(())).collect()
    }
}
