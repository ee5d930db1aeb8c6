//! In-process implementations of the store and publisher contracts.
//!
//! Used by the test suites of this crate and of the API, and handy for running the service
//! without Postgres or Kafka.

use async_trait::async_trait;
use horizons_core::events::EventPublisher;
use horizons_core::record::BookingRecord;
use horizons_core::repository::BookingRepository;
use horizons_core::{Booking, BookingId, BookingStatus, StoreError, UserId};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;

/// Booking store kept in a map of storage records.
pub struct InMemoryBookingRepository {
    bookings: RwLock<BTreeMap<BookingId, BookingRecord>>,
    next_child_id: AtomicI32,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self {
            bookings: RwLock::new(BTreeMap::new()),
            next_child_id: AtomicI32::new(1),
        }
    }

    /// Stores children with fresh ids, like a serial column would.
    fn assign_child_ids(&self, record: &mut BookingRecord) {
        for passenger in &mut record.passengers {
            passenger.id = Some(self.next_child_id.fetch_add(1, Ordering::SeqCst));
        }
        for seat in &mut record.seats {
            seat.id = Some(self.next_child_id.fetch_add(1, Ordering::SeqCst));
        }
    }

    pub async fn len(&self) -> usize {
        self.bookings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bookings.read().await.is_empty()
    }
}

impl Default for InMemoryBookingRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn get_all(&self) -> Result<Vec<Booking>, StoreError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.values().cloned().map(Booking::from).collect())
    }

    async fn get_by_id(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(&id).cloned().map(Booking::from))
    }

    async fn get_by_user_id(&self, user_id: UserId) -> Result<Vec<Booking>, StoreError> {
        let bookings = self.bookings.read().await;
        Ok(bookings
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .map(Booking::from)
            .collect())
    }

    async fn exists(&self, id: BookingId) -> Result<bool, StoreError> {
        Ok(self.bookings.read().await.contains_key(&id))
    }

    async fn create(&self, booking: &Booking) -> Result<Booking, StoreError> {
        let mut bookings = self.bookings.write().await;
        if bookings.contains_key(&booking.id) {
            return Err(format!("duplicate key value for booking {}", booking.id).into());
        }

        let mut record = BookingRecord::from(booking);
        self.assign_child_ids(&mut record);
        bookings.insert(record.id, record.clone());

        Ok(record.into_booking())
    }

    async fn update(&self, booking: &Booking) -> Result<Booking, StoreError> {
        let mut bookings = self.bookings.write().await;
        if !bookings.contains_key(&booking.id) {
            return Err(format!("no booking row with id {}", booking.id).into());
        }

        let mut record = BookingRecord::from(booking);
        self.assign_child_ids(&mut record);
        bookings.insert(record.id, record.clone());

        Ok(record.into_booking())
    }

    async fn update_status(&self, id: BookingId, status: BookingStatus) -> Result<bool, StoreError> {
        let mut bookings = self.bookings.write().await;
        match bookings.get_mut(&id) {
            Some(record) => {
                record.status = status.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_by_booking_id(&self, id: BookingId) -> Result<bool, StoreError> {
        Ok(self.bookings.write().await.remove(&id).is_some())
    }
}

/// A message captured by `RecordingPublisher`.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub topic: String,
    pub key: String,
    pub payload: String,
}

/// Publisher that keeps every message in memory. Can be switched to reject publishes to
/// exercise the broker-down paths.
#[derive(Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<PublishedMessage>>,
    failing: AtomicBool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    pub fn messages_on(&self, topic: &str) -> Vec<PublishedMessage> {
        self.messages()
            .into_iter()
            .filter(|m| m.topic == topic)
            .collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(format!("broker unavailable, {} not delivered", topic).into());
        }

        let mut messages = self
            .messages
            .lock()
            .map_err(|_| "recording publisher lock poisoned")?;
        messages.push(PublishedMessage {
            topic: topic.to_string(),
            key: key.to_string(),
            payload: payload.to_string(),
        });
        Ok(())
    }
}
