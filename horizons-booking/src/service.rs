use chrono::Utc;
use horizons_core::events::EventPublisher;
use horizons_core::repository::BookingRepository;
use horizons_core::{Booking, BookingError, BookingId, BookingResult, BookingStatus, UserId};
use horizons_shared::models::events::{topics, BookingCreatedEvent};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::lifecycle::{self, Rejection};

/// Booking lifecycle coordinator.
///
/// The only component that mutates bookings or publishes booking events. HTTP handlers and the
/// event consumers share one instance; it holds no mutable state of its own, so consistency rests
/// on the store's per-operation transactions.
pub struct BookingService {
    repo: Arc<dyn BookingRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl BookingService {
    pub fn new(repo: Arc<dyn BookingRepository>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { repo, publisher }
    }

    pub async fn booking_exists(&self, id: BookingId) -> BookingResult<bool> {
        Ok(self.repo.exists(id).await?)
    }

    pub async fn get_all(&self) -> BookingResult<Vec<Booking>> {
        Ok(self.repo.get_all().await?)
    }

    pub async fn get_by_id(&self, id: BookingId) -> BookingResult<Option<Booking>> {
        Ok(self.repo.get_by_id(id).await?)
    }

    pub async fn get_by_user_id(&self, user_id: UserId) -> BookingResult<Vec<Booking>> {
        Ok(self.repo.get_by_user_id(user_id).await?)
    }

    /// Stores a new booking in `Pending` and announces it to the payment service.
    ///
    /// The existence check and the insert are two separate store calls. Two concurrent creates
    /// with the same id can both pass the check; the primary key then rejects the second insert,
    /// which surfaces as `CreateFailed`.
    pub async fn create(&self, mut booking: Booking) -> BookingResult<Booking> {
        let exists = self.repo.exists(booking.id).await?;
        let status = lifecycle::on_create(exists).map_err(|r| rejected(r, booking.id))?;

        booking.status = status;
        booking.created_at = Some(Utc::now());
        let payment = booking.payment.take();

        let created = self.repo.create(&booking).await.map_err(|e| {
            error!(booking_id = booking.id, error = %e, "Failed to insert booking");
            BookingError::CreateFailed(booking.id)
        })?;

        info!(booking_id = created.id, user_id = created.user_id, "Booking created");

        let event = BookingCreatedEvent {
            booking_id: created.id,
            payment,
        };
        self.publish_json(topics::BOOKING_CREATED, created.id, &event).await;

        Ok(created)
    }

    /// Full replace of the booking and its passengers and seats.
    ///
    /// The `status` and `created_at` sent by the client are ignored; the stored values are kept,
    /// since status only moves through payment events.
    pub async fn update(&self, mut booking: Booking) -> BookingResult<Booking> {
        let current = self.repo.get_by_id(booking.id).await?;
        lifecycle::on_api_mutation(current.is_some()).map_err(|r| rejected(r, booking.id))?;

        if let Some(current) = current {
            booking.status = current.status;
            booking.created_at = current.created_at;
        }
        booking.payment = None;

        let updated = self.repo.update(&booking).await?;
        info!(booking_id = updated.id, "Booking updated");
        Ok(updated)
    }

    /// Deletes the booking with its children. `Ok(false)` means the row vanished between the
    /// existence check and the delete.
    pub async fn delete_by_booking_id(&self, id: BookingId) -> BookingResult<bool> {
        let exists = self.repo.exists(id).await?;
        lifecycle::on_api_mutation(exists).map_err(|r| rejected(r, id))?;

        let deleted = self.repo.delete_by_booking_id(id).await?;
        info!(booking_id = id, deleted, "Booking delete requested");
        Ok(deleted)
    }

    /// Overwrites the status without any precondition. A missing booking is logged only.
    pub(crate) async fn update_status(&self, id: BookingId, status: BookingStatus) -> BookingResult<bool> {
        let updated = self.repo.update_status(id, status).await?;
        if !updated {
            warn!(booking_id = id, %status, "Status update matched no booking");
        }
        Ok(updated)
    }

    /// Reaction to `payment.success`: mark the booking `Success` and hand the full booking to the
    /// notification service. Returns the confirmed booking, or `None` if it no longer exists.
    pub async fn confirm_payment(&self, id: BookingId) -> BookingResult<Option<Booking>> {
        let exists = self.repo.exists(id).await?;
        let Some(status) = lifecycle::on_payment_succeeded(exists) else {
            warn!(booking_id = id, "Payment succeeded for a booking that does not exist");
            return Ok(None);
        };

        if !self.update_status(id, status).await? {
            return Ok(None);
        }

        let Some(booking) = self.repo.get_by_id(id).await? else {
            warn!(booking_id = id, "Booking deleted while its payment was being confirmed");
            return Ok(None);
        };

        self.publish_json(topics::BOOKING_CONFIRMED, id, &booking).await;
        info!(booking_id = id, "Booking confirmed");
        Ok(Some(booking))
    }

    /// Reaction to `payment.failed`: the booking is rolled back by deleting it. Repeated or late
    /// events for a booking that is already gone are not an error. Returns whether a row was
    /// removed.
    pub async fn discard_unpaid(&self, id: BookingId) -> BookingResult<bool> {
        self.remove_on_event(id).await
    }

    /// Reaction to `user_deleted`: every booking of the user is deleted, one by one.
    ///
    /// A failure on one booking does not stop the cascade; the count of removed bookings is
    /// returned and failures are logged.
    pub async fn purge_user(&self, user_id: UserId) -> BookingResult<usize> {
        let bookings = self.repo.get_by_user_id(user_id).await?;
        let mut removed = 0;

        for booking in bookings {
            match self.remove_on_event(booking.id).await {
                Ok(true) => removed += 1,
                Ok(false) => debug!(booking_id = booking.id, user_id, "Booking already gone"),
                Err(e) => {
                    error!(booking_id = booking.id, user_id, error = %e, "Failed to delete booking of deleted user")
                }
            }
        }

        info!(user_id, removed, "Deleted the bookings of a deleted user");
        Ok(removed)
    }

    /// Event-driven removal: a booking that is already gone is not an error.
    async fn remove_on_event(&self, id: BookingId) -> BookingResult<bool> {
        let exists = self.repo.exists(id).await?;
        if !lifecycle::on_removal_event(exists) {
            return Ok(false);
        }
        Ok(self.repo.delete_by_booking_id(id).await?)
    }

    /// Publish failures never undo the mutation the event describes; they are logged here.
    async fn publish_json<T: serde::Serialize>(&self, topic: &str, id: BookingId, payload: &T) {
        let json = match serde_json::to_string(payload) {
            Ok(json) => json,
            Err(e) => {
                error!(topic, booking_id = id, error = %e, "Failed to serialize event");
                return;
            }
        };

        match self.publisher.publish(topic, &id.to_string(), &json).await {
            Ok(()) => debug!(topic, booking_id = id, "Event published"),
            Err(e) => error!(topic, booking_id = id, error = %e, "Failed to publish event"),
        }
    }
}

fn rejected(rejection: Rejection, id: BookingId) -> BookingError {
    match rejection {
        Rejection::AlreadyExists => BookingError::AlreadyExists(id),
        Rejection::NotFound => BookingError::NotFound(id),
    }
}
