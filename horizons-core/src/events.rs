use async_trait::async_trait;

use crate::StoreError;

/// Outbound side of the event channel.
///
/// Publishing is fire-and-forget for the business logic: the returned error only tells whether
/// the broker accepted the message.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), StoreError>;
}
