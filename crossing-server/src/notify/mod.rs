//! Subscriber notifications for crossing transitions.
//!
//! The [`Notifier`] renders one message per transition and hands it to an
//! [`SmsProvider`] as a single batch. Recipients are isolated from each
//! other: a failed delivery is logged and reported, and only a batch in
//! which every recipient failed is an error.

mod sms;
mod twilio;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::{PhoneNumber, TransitionEvent};
use crate::events::{HandlerError, TransitionHandler};

pub use sms::{DeliveryError, LogProvider, SmsProvider};
pub use twilio::{TwilioConfig, TwilioProvider};

/// Subject line for every transition message.
pub const SUBJECT: &str = "railroad crossing changed";

/// Errors from notifying subscribers.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// No recipient received the message
    #[error("delivery failed for all {recipients} recipients")]
    Delivery { recipients: usize },
}

/// Outcome of notifying a crossing's subscribers.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: Vec<(PhoneNumber, DeliveryError)>,
}

impl DeliveryReport {
    pub fn is_partial(&self) -> bool {
        self.delivered > 0 && !self.failed.is_empty()
    }
}

/// Message text for a transition.
pub fn render_message(event: &TransitionEvent) -> String {
    if event.open {
        format!("railroad crossing on {} is back open.", event.crossing.name)
    } else {
        format!("railroad crossing on {} is closed!", event.crossing.name)
    }
}

/// Delivers transition messages to subscribers.
#[derive(Clone)]
pub struct Notifier {
    provider: Arc<dyn SmsProvider>,
}

impl Notifier {
    pub fn new(provider: Arc<dyn SmsProvider>) -> Self {
        Self { provider }
    }

    /// Notify every subscriber of `event`.
    ///
    /// An event without subscribers is acknowledged without sending.
    pub async fn notify(&self, event: &TransitionEvent) -> Result<DeliveryReport, NotifyError> {
        if event.subscribers.is_empty() {
            info!(crossing = %event.crossing.name, "skipping notification, no subscribers");
            return Ok(DeliveryReport::default());
        }

        let message = render_message(event);
        let results = self
            .provider
            .send_batch(SUBJECT, &message, &event.subscribers)
            .await;

        // A recipient without a result was not confirmed delivered.
        let mut results = results.into_iter();
        let mut report = DeliveryReport::default();
        for recipient in &event.subscribers {
            match results.next().unwrap_or(Err(DeliveryError::Missing)) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(
                        crossing = %event.crossing.name,
                        %recipient,
                        error = %e,
                        "failed to deliver notification"
                    );
                    report.failed.push((recipient.clone(), e));
                }
            }
        }

        if report.delivered == 0 {
            return Err(NotifyError::Delivery {
                recipients: event.subscribers.len(),
            });
        }

        info!(
            crossing = %event.crossing.name,
            open = event.open,
            delivered = report.delivered,
            failed = report.failed.len(),
            "notification sent"
        );
        Ok(report)
    }
}

#[async_trait]
impl TransitionHandler for Notifier {
    async fn handle(&self, event: &TransitionEvent) -> Result<(), HandlerError> {
        self.notify(event).await?;
        Ok(())
    }
}
