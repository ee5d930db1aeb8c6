use std::sync::Arc;
use horizons_booking::{EventHandler, Outcome};
use horizons_store::EventConsumer;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use crate::metrics::Metrics;

/// Consumes until the process stops. A failing message is logged, counted and skipped.
pub async fn run_consumer(
    consumer: EventConsumer,
    handler: Arc<dyn EventHandler>,
    metrics: Arc<Metrics>,
) {
    info!(consumer = handler.name(), topics = ?handler.topics(), "Event consumer started");

    loop {
        match consumer.next_message().await {
            Err(e) => {
                error!(consumer = handler.name(), "Kafka error: {}", e);
                sleep(Duration::from_secs(1)).await;
            }
            Ok(message) => {
                info!(
                    consumer = handler.name(),
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    "Message received"
                );
                dispatch(handler.as_ref(), &metrics, &message.topic, &message.payload).await;
            }
        }
    }
}

/// Hands one message to the handler and records how it went.
pub async fn dispatch(
    handler: &dyn EventHandler,
    metrics: &Metrics,
    topic: &str,
    payload: &[u8],
) -> Option<Outcome> {
    match handler.handle(topic, payload).await {
        Ok(outcome) => {
            metrics.record_event(topic, outcome.as_str());
            Some(outcome)
        }
        Err(e) => {
            warn!(consumer = handler.name(), topic, error = %e, "Message skipped");
            metrics.record_event(topic, "error");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizons_booking::{
        BookingService, InMemoryBookingRepository, PaymentEventHandler, RecordingPublisher,
    };
    use horizons_core::{Booking, BookingStatus};

    fn service() -> Arc<BookingService> {
        Arc::new(BookingService::new(
            Arc::new(InMemoryBookingRepository::new()),
            Arc::new(RecordingPublisher::new()),
        ))
    }

    fn counted(metrics: &Metrics, topic: &str, outcome: &str) -> u64 {
        metrics.events_consumed.with_label_values(&[topic, outcome]).get()
    }

    #[tokio::test]
    async fn malformed_payload_is_counted_and_skipped() {
        let metrics = Metrics::new().unwrap();
        let handler = PaymentEventHandler::new(service());

        let outcome = dispatch(&handler, &metrics, "payment.success", b"not-a-number").await;

        assert!(outcome.is_none());
        assert_eq!(counted(&metrics, "payment.success", "error"), 1);
    }

    #[tokio::test]
    async fn applied_and_skipped_messages_are_counted() {
        let metrics = Metrics::new().unwrap();
        let service = service();
        service.create(Booking::new(1, 2, "FR788")).await.unwrap();
        let handler = PaymentEventHandler::new(service.clone());

        let first = dispatch(&handler, &metrics, "payment.success", b"1").await;
        let second = dispatch(&handler, &metrics, "payment.success", b"99").await;

        assert_eq!(first, Some(Outcome::Applied));
        assert_eq!(second, Some(Outcome::Skipped));
        assert_eq!(counted(&metrics, "payment.success", "applied"), 1);
        assert_eq!(counted(&metrics, "payment.success", "skipped"), 1);
        assert_eq!(
            service.get_by_id(1).await.unwrap().unwrap().status,
            BookingStatus::Success
        );
    }
}
