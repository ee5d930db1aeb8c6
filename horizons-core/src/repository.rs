use async_trait::async_trait;

use crate::booking::{Booking, BookingId, BookingStatus, Seat, UserId};
use crate::StoreError;

/// Repository trait for booking data access.
///
/// Every read eagerly loads passengers and seats. Writes touching children run as one unit.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Booking>, StoreError>;

    async fn get_by_id(&self, id: BookingId) -> Result<Option<Booking>, StoreError>;

    async fn get_by_user_id(&self, user_id: UserId) -> Result<Vec<Booking>, StoreError>;

    /// Primary-key lookup, no children loaded.
    async fn exists(&self, id: BookingId) -> Result<bool, StoreError>;

    /// Inserts the booking and its children, returning it with store-assigned child ids.
    async fn create(&self, booking: &Booking) -> Result<Booking, StoreError>;

    /// Overwrites the booking row and regenerates every child row.
    async fn update(&self, booking: &Booking) -> Result<Booking, StoreError>;

    /// Returns `false` when no row carried that id.
    async fn update_status(&self, id: BookingId, status: BookingStatus) -> Result<bool, StoreError>;

    /// Deletes children first, then the booking. `true` only if the booking row was removed.
    async fn delete_by_booking_id(&self, id: BookingId) -> Result<bool, StoreError>;
}

/// Read-only seat map of a flight.
#[async_trait]
pub trait SeatRepository: Send + Sync {
    /// Every seat option of the aircraft, with `available = false` for seats held by a booking
    /// on `flight_code`.
    async fn get_by_flight_code(&self, flight_code: &str) -> Result<Vec<Seat>, StoreError>;
}
