pub mod consumers;
pub mod lifecycle;
pub mod memory;
pub mod service;

pub use consumers::{EventHandler, HandlerError, Outcome, PaymentEventHandler, UserEventHandler};
pub use lifecycle::{Transition, Trigger};
pub use memory::{InMemoryBookingRepository, RecordingPublisher};
pub use service::BookingService;
