use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pii::Masked;

/// Topic names shared with the payment, identity and notification services.
pub mod topics {
    /// Outbound: a booking was stored and awaits payment.
    pub const BOOKING_CREATED: &str = "booking.created";
    /// Outbound: payment went through, carries the full booking for the notification service.
    pub const BOOKING_CONFIRMED: &str = "booking.confirmed";
    /// Inbound: bare JSON integer booking id.
    pub const PAYMENT_SUCCESS: &str = "payment.success";
    /// Inbound: bare JSON integer booking id.
    pub const PAYMENT_FAILED: &str = "payment.failed";
    /// Inbound: `UserDeletedEvent`.
    pub const USER_DELETED: &str = "user_deleted";

    pub const ALL: [&str; 5] = [
        BOOKING_CREATED,
        BOOKING_CONFIRMED,
        PAYMENT_SUCCESS,
        PAYMENT_FAILED,
        USER_DELETED,
    ];
}

/// Opaque payment sub-payload. The booking service never inspects it, it only hands it on to the
/// payment service inside `BookingCreatedEvent`.
pub type PaymentDetails = Masked<serde_json::Value>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BookingCreatedEvent {
    pub booking_id: i32,
    pub payment: Option<PaymentDetails>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserDeletedEvent {
    #[serde(alias = "userId", alias = "UserID")]
    pub user_id: i32,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}
