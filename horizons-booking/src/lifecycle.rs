//! Booking lifecycle transition table.
//!
//! States are `Pending`, `Success` and `Deleted`, where `Deleted` is the absence of the record.
//! `Create` is the only way into `Pending`; `Success` is only reached from a payment-success
//! event; every other automated path ends in deletion.

use horizons_core::BookingStatus;

/// What asked the booking to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// `POST /bookings`
    Create,
    /// `payment.success` event
    PaymentSucceeded,
    /// `payment.failed` event
    PaymentFailed,
    /// `user_deleted` event, applied to each booking of the user
    UserDeleted,
    /// `PUT /bookings/`
    Update,
    /// `DELETE /bookings/{id}`
    Delete,
}

/// What the coordinator has to do to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Insert with this status, whatever the client sent.
    Insert(BookingStatus),
    /// Overwrite the status only.
    SetStatus(BookingStatus),
    /// Full overwrite of the booking and its children.
    Overwrite,
    /// Delete children, then the booking.
    Remove,
    /// The booking is already gone; an event about it is not a fault.
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("booking already exists")]
    AlreadyExists,
    #[error("booking not found")]
    NotFound,
}

/// `Create`: only an unknown id may enter the lifecycle, and always as `Pending`.
pub fn on_create(exists: bool) -> Result<BookingStatus, Rejection> {
    if exists {
        Err(Rejection::AlreadyExists)
    } else {
        Ok(BookingStatus::Pending)
    }
}

/// `PaymentSucceeded`: the status to write, or `None` when the booking is already gone.
pub fn on_payment_succeeded(exists: bool) -> Option<BookingStatus> {
    exists.then_some(BookingStatus::Success)
}

/// `PaymentFailed` and `UserDeleted`: whether there is a booking left to remove.
pub fn on_removal_event(exists: bool) -> bool {
    exists
}

/// `Update` and `Delete` from the API act on an existing booking only.
pub fn on_api_mutation(exists: bool) -> Result<(), Rejection> {
    if exists {
        Ok(())
    } else {
        Err(Rejection::NotFound)
    }
}

/// Resolves a trigger against whether the booking currently exists.
pub fn next(exists: bool, trigger: Trigger) -> Result<Transition, Rejection> {
    match trigger {
        Trigger::Create => on_create(exists).map(Transition::Insert),
        Trigger::PaymentSucceeded => {
            Ok(on_payment_succeeded(exists).map_or(Transition::Ignore, Transition::SetStatus))
        }
        Trigger::PaymentFailed | Trigger::UserDeleted => Ok(if on_removal_event(exists) {
            Transition::Remove
        } else {
            Transition::Ignore
        }),
        Trigger::Update => on_api_mutation(exists).map(|()| Transition::Overwrite),
        Trigger::Delete => on_api_mutation(exists).map(|()| Transition::Remove),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_always_enters_pending() {
        assert_eq!(
            next(false, Trigger::Create),
            Ok(Transition::Insert(BookingStatus::Pending))
        );
        assert_eq!(next(true, Trigger::Create), Err(Rejection::AlreadyExists));
    }

    #[test]
    fn payment_success_moves_to_success_only_when_present() {
        assert_eq!(
            next(true, Trigger::PaymentSucceeded),
            Ok(Transition::SetStatus(BookingStatus::Success))
        );
        assert_eq!(next(false, Trigger::PaymentSucceeded), Ok(Transition::Ignore));
    }

    #[test]
    fn event_driven_deletes_are_idempotent() {
        for trigger in [Trigger::PaymentFailed, Trigger::UserDeleted] {
            assert_eq!(next(true, trigger), Ok(Transition::Remove));
            assert_eq!(next(false, trigger), Ok(Transition::Ignore));
        }
    }

    #[test]
    fn api_mutations_need_an_existing_booking() {
        assert_eq!(next(true, Trigger::Update), Ok(Transition::Overwrite));
        assert_eq!(next(false, Trigger::Update), Err(Rejection::NotFound));
        assert_eq!(next(true, Trigger::Delete), Ok(Transition::Remove));
        assert_eq!(next(false, Trigger::Delete), Err(Rejection::NotFound));
    }

    #[test]
    fn typed_steps_agree_with_the_table() {
        for exists in [false, true] {
            assert_eq!(on_create(exists).map(Transition::Insert), next(exists, Trigger::Create));
            assert_eq!(
                on_payment_succeeded(exists).is_some(),
                next(exists, Trigger::PaymentSucceeded) != Ok(Transition::Ignore)
            );
            assert_eq!(
                on_removal_event(exists),
                next(exists, Trigger::PaymentFailed) == Ok(Transition::Remove)
            );
            assert_eq!(on_api_mutation(exists).is_ok(), next(exists, Trigger::Update).is_ok());
        }
    }
}
