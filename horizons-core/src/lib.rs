pub mod booking;
pub mod events;
pub mod luggage;
pub mod record;
pub mod repository;

pub use booking::{Booking, BookingId, BookingStatus, FlightClass, Passenger, Seat, UserId};
pub use luggage::{Luggage, LuggageSet};

/// Errors surfaced by the booking lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Booking with the ID {0} already exists")]
    AlreadyExists(BookingId),
    #[error("Booking with the ID {0} was not found")]
    NotFound(BookingId),
    #[error("Booking with the ID {0} could not be created successfully")]
    CreateFailed(BookingId),
    #[error("Booking store failure: {0}")]
    Store(#[source] StoreError),
}

/// Boxed error returned by store and publisher implementations.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

pub type BookingResult<T> = Result<T, BookingError>;

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        BookingError::Store(err)
    }
}
