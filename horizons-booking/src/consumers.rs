//! Handlers behind the two long-running consumer loops.
//!
//! Each handler decodes one message and drives the coordinator. Errors are returned to the
//! loop, which logs them and moves on: a bad message never stops consumption. Broker wiring
//! lives with the binary.

use async_trait::async_trait;
use horizons_core::{BookingError, BookingId};
use horizons_shared::models::events::{topics, UserDeletedEvent};
use std::sync::Arc;
use tracing::{debug, info};

use crate::service::BookingService;

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Could not decode message on {topic}: {source}")]
    Decode {
        topic: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Handler does not consume topic {0}")]
    UnexpectedTopic(String),
    #[error(transparent)]
    Booking(#[from] BookingError),
}

/// What a handler did with a message. Feeds logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Nothing to change, e.g. the booking was already deleted.
    Skipped,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Applied => "applied",
            Outcome::Skipped => "skipped",
        }
    }
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Consumer name, used for the consumer group suffix and log fields.
    fn name(&self) -> &'static str;

    fn topics(&self) -> &'static [&'static str];

    async fn handle(&self, topic: &str, payload: &[u8]) -> Result<Outcome, HandlerError>;
}

fn decode<T: serde::de::DeserializeOwned>(topic: &str, payload: &[u8]) -> Result<T, HandlerError> {
    serde_json::from_slice(payload).map_err(|source| HandlerError::Decode {
        topic: topic.to_string(),
        source,
    })
}

/// Consumes `payment.success` and `payment.failed`; both carry a bare booking id.
pub struct PaymentEventHandler {
    service: Arc<BookingService>,
}

impl PaymentEventHandler {
    const TOPICS: [&'static str; 2] = [topics::PAYMENT_SUCCESS, topics::PAYMENT_FAILED];

    pub fn new(service: Arc<BookingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for PaymentEventHandler {
    fn name(&self) -> &'static str {
        "payment-events"
    }

    fn topics(&self) -> &'static [&'static str] {
        &Self::TOPICS
    }

    async fn handle(&self, topic: &str, payload: &[u8]) -> Result<Outcome, HandlerError> {
        let booking_id: BookingId = decode(topic, payload)?;
        debug!(topic, booking_id, "Payment event received");

        match topic {
            topics::PAYMENT_SUCCESS => match self.service.confirm_payment(booking_id).await? {
                Some(_) => Ok(Outcome::Applied),
                None => Ok(Outcome::Skipped),
            },
            topics::PAYMENT_FAILED => {
                // At-least-once: the booking may already be gone, which is fine.
                if self.service.discard_unpaid(booking_id).await? {
                    info!(booking_id, "Booking removed after failed payment");
                    Ok(Outcome::Applied)
                } else {
                    debug!(booking_id, "Failed payment for a booking that no longer exists");
                    Ok(Outcome::Skipped)
                }
            }
            other => Err(HandlerError::UnexpectedTopic(other.to_string())),
        }
    }
}

/// Consumes `user_deleted` and removes every booking of the user.
pub struct UserEventHandler {
    service: Arc<BookingService>,
}

impl UserEventHandler {
    const TOPICS: [&'static str; 1] = [topics::USER_DELETED];

    pub fn new(service: Arc<BookingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for UserEventHandler {
    fn name(&self) -> &'static str {
        "user-events"
    }

    fn topics(&self) -> &'static [&'static str] {
        &Self::TOPICS
    }

    async fn handle(&self, topic: &str, payload: &[u8]) -> Result<Outcome, HandlerError> {
        if topic != topics::USER_DELETED {
            return Err(HandlerError::UnexpectedTopic(topic.to_string()));
        }

        let event: UserDeletedEvent = decode(topic, payload)?;
        let removed = self.service.purge_user(event.user_id).await?;

        Ok(if removed > 0 {
            Outcome::Applied
        } else {
            Outcome::Skipped
        })
    }
}
