//! Storage representation of a booking.
//!
//! Mirrors the relational layout: the fare class is an integer column, luggage a JSON text
//! column, status a text column, and passengers/seats child rows keyed by `booking_id`.

use chrono::{DateTime, Utc};
use horizons_shared::Masked;

use crate::booking::{Booking, BookingId, BookingStatus, FlightClass, Passenger, Seat, UserId};
use crate::luggage::LuggageSet;

#[derive(Debug, Clone, PartialEq)]
pub struct BookingRecord {
    pub id: BookingId,
    pub user_id: UserId,
    pub flight_code: String,
    pub flight_class: i32,
    pub created_at: DateTime<Utc>,
    pub luggage: String,
    pub status: String,
    pub passengers: Vec<PassengerRecord>,
    pub seats: Vec<SeatRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassengerRecord {
    pub id: Option<i32>,
    pub booking_id: BookingId,
    pub full_name: String,
    pub date_of_birth: DateTime<Utc>,
    pub passport_number: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeatRecord {
    pub id: Option<i32>,
    pub booking_id: BookingId,
    pub row: i32,
    pub column: String,
}

impl BookingRecord {
    /// Converts a booking into rows. A booking that has no `created_at` yet gets `now`.
    pub fn from_booking(booking: &Booking) -> Self {
        let passengers = booking
            .passengers
            .iter()
            .map(|p| PassengerRecord {
                id: p.id,
                booking_id: booking.id,
                full_name: p.full_name.clone(),
                date_of_birth: p.date_of_birth,
                passport_number: p.passport_number.expose().clone(),
                email: p.email.clone(),
            })
            .collect();

        let seats = booking
            .seats
            .iter()
            .map(|s| SeatRecord {
                id: None,
                booking_id: booking.id,
                row: s.row,
                column: s.column.clone(),
            })
            .collect();

        Self {
            id: booking.id,
            user_id: booking.user_id,
            flight_code: booking.flight_code.clone(),
            flight_class: booking.flight_class.into(),
            created_at: booking.created_at.unwrap_or_else(Utc::now),
            luggage: booking.luggage.to_json_string(),
            status: booking.status.to_string(),
            passengers,
            seats,
        }
    }

    pub fn into_booking(self) -> Booking {
        let status = self.status.parse::<BookingStatus>().unwrap_or_else(|e| {
            tracing::warn!(booking_id = self.id, error = %e, "Normalizing stored status to Pending");
            BookingStatus::Pending
        });

        Booking {
            id: self.id,
            user_id: self.user_id,
            flight_code: self.flight_code,
            flight_class: FlightClass::from(self.flight_class),
            luggage: LuggageSet::from_json_string(&self.luggage),
            seats: self
                .seats
                .into_iter()
                .map(|s| Seat::new(s.row, s.column))
                .collect(),
            passengers: self
                .passengers
                .into_iter()
                .map(|p| Passenger {
                    id: p.id,
                    full_name: p.full_name,
                    date_of_birth: p.date_of_birth,
                    passport_number: Masked::new(p.passport_number),
                    email: p.email,
                })
                .collect(),
            status,
            created_at: Some(self.created_at),
            payment: None,
        }
    }
}

impl From<&Booking> for BookingRecord {
    fn from(booking: &Booking) -> Self {
        BookingRecord::from_booking(booking)
    }
}

impl From<BookingRecord> for Booking {
    fn from(record: BookingRecord) -> Self {
        record.into_booking()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::luggage::Luggage;
    use chrono::TimeZone;

    fn sample() -> Booking {
        let mut booking = Booking::new(1, 2, "FR788");
        booking.flight_class = FlightClass::Business;
        booking.luggage = [Luggage::SmallBag, Luggage::Cargo20kg].into_iter().collect();
        booking.passengers = vec![Passenger {
            id: Some(7),
            full_name: "John Doe".to_string(),
            date_of_birth: Utc.with_ymd_and_hms(1985, 7, 9, 1, 0, 0).unwrap(),
            passport_number: Masked::new("1234".to_string()),
            email: "john@example.com".to_string(),
        }];
        booking.seats = vec![Seat::new(1, "A"), Seat::new(1, "B")];
        booking
    }

    #[test]
    fn round_trip_preserves_booking_content() {
        let booking = sample();
        let record = BookingRecord::from(&booking);

        assert_eq!(record.flight_class, 1);
        assert_eq!(record.luggage, r#"["SmallBag","Cargo20kg"]"#);
        assert!(record.passengers.iter().all(|p| p.booking_id == 1));
        assert!(record.seats.iter().all(|s| s.booking_id == 1));

        let back = Booking::from(record);
        assert_eq!(back.id, booking.id);
        assert_eq!(back.user_id, booking.user_id);
        assert_eq!(back.flight_code, booking.flight_code);
        assert_eq!(back.flight_class, booking.flight_class);
        assert_eq!(back.luggage, booking.luggage);
        assert_eq!(back.passengers, booking.passengers);
        assert_eq!(back.seats, booking.seats);
        assert!(back.created_at.is_some());
    }

    #[test]
    fn unknown_stored_status_is_normalized() {
        let mut record = BookingRecord::from(&sample());
        record.status = "Refunded".to_string();
        assert_eq!(record.into_booking().status, BookingStatus::Pending);
    }

    #[test]
    fn existing_created_at_is_kept() {
        let mut booking = sample();
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        booking.created_at = Some(created);
        assert_eq!(BookingRecord::from(&booking).created_at, created);
    }
}
