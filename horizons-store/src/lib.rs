pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod events;
pub mod seat_repo;

pub use booking_repo::StoreBookingRepository;
pub use database::DbClient;
pub use events::{declare_topics, EventConsumer, EventProducer, InboundMessage};
pub use seat_repo::StoreSeatRepository;
