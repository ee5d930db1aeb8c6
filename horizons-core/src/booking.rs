use chrono::{DateTime, Utc};
use horizons_shared::models::events::PaymentDetails;
use horizons_shared::Masked;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::luggage::LuggageSet;

pub type BookingId = i32;
pub type UserId = i32;

/// Fare class. Travels as an integer on the wire and in storage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(from = "i32", into = "i32")]
pub enum FlightClass {
    #[default]
    Economy,
    Business,
}

impl From<i32> for FlightClass {
    /// Anything that is not a known code falls back to `Economy`.
    fn from(value: i32) -> Self {
        match value {
            1 => FlightClass::Business,
            _ => FlightClass::Economy,
        }
    }
}

impl From<FlightClass> for i32 {
    fn from(class: FlightClass) -> Self {
        match class {
            FlightClass::Economy => 0,
            FlightClass::Business => 1,
        }
    }
}

/// Booking status in the lifecycle. A deleted booking has no status: it is gone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BookingStatus {
    /// Created, payment not resolved yet
    #[default]
    Pending,
    /// Payment confirmed
    Success,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Success => "Success",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown booking status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(BookingStatus::Pending),
            "Success" => Ok(BookingStatus::Success),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passenger {
    /// Assigned by the store; whatever a client sends is ignored.
    #[serde(default)]
    pub id: Option<i32>,
    pub full_name: String,
    pub date_of_birth: DateTime<Utc>,
    pub passport_number: Masked<String>,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Seat {
    pub row: i32,
    pub column: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Seat {
    pub fn new(row: i32, column: impl Into<String>) -> Self {
        Self {
            row,
            column: column.into(),
            available: true,
        }
    }
}

/// A flight booking with its passengers and seats.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub flight_code: String,
    #[serde(default)]
    pub flight_class: FlightClass,
    #[serde(default)]
    pub luggage: LuggageSet,
    #[serde(default)]
    pub seats: Vec<Seat>,
    #[serde(default)]
    pub passengers: Vec<Passenger>,
    #[serde(default)]
    pub status: BookingStatus,
    /// Server-assigned on creation.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Only present on the create request; forwarded to the payment service, never stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentDetails>,
}

impl Booking {
    pub fn new(id: BookingId, user_id: UserId, flight_code: impl Into<String>) -> Self {
        Self {
            id,
            user_id,
            flight_code: flight_code.into(),
            flight_class: FlightClass::Economy,
            luggage: LuggageSet::default(),
            seats: Vec::new(),
            passengers: Vec::new(),
            status: BookingStatus::Pending,
            created_at: None,
            payment: None,
        }
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}
