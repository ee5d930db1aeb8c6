use async_trait::async_trait;
use chrono::{DateTime, Utc};
use horizons_core::record::{BookingRecord, PassengerRecord, SeatRecord};
use horizons_core::repository::BookingRepository;
use horizons_core::{Booking, BookingId, BookingStatus, StoreError, UserId};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;

pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i32,
    user_id: i32,
    flight_code: String,
    flight_class: i32,
    created_at: DateTime<Utc>,
    luggage: String,
    status: String,
}

#[derive(sqlx::FromRow)]
struct PassengerRow {
    id: i32,
    booking_id: i32,
    full_name: String,
    date_of_birth: DateTime<Utc>,
    passport_number: String,
    email: String,
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    id: i32,
    booking_id: i32,
    seat_row: i32,
    seat_column: String,
}

impl From<PassengerRow> for PassengerRecord {
    fn from(row: PassengerRow) -> Self {
        Self {
            id: Some(row.id),
            booking_id: row.booking_id,
            full_name: row.full_name,
            date_of_birth: row.date_of_birth,
            passport_number: row.passport_number,
            email: row.email,
        }
    }
}

impl From<SeatRow> for SeatRecord {
    fn from(row: SeatRow) -> Self {
        Self {
            id: Some(row.id),
            booking_id: row.booking_id,
            row: row.seat_row,
            column: row.seat_column,
        }
    }
}

impl BookingRow {
    fn into_record(self, passengers: Vec<PassengerRecord>, seats: Vec<SeatRecord>) -> BookingRecord {
        BookingRecord {
            id: self.id,
            user_id: self.user_id,
            flight_code: self.flight_code,
            flight_class: self.flight_class,
            created_at: self.created_at,
            luggage: self.luggage,
            status: self.status,
            passengers,
            seats,
        }
    }
}

/// Groups child rows by the booking they belong to and assembles full bookings,
/// keeping the order of `rows`.
fn assemble(
    rows: Vec<BookingRow>,
    passengers: Vec<PassengerRow>,
    seats: Vec<SeatRow>,
) -> Vec<Booking> {
    let mut passengers_by_booking: HashMap<i32, Vec<PassengerRecord>> = HashMap::new();
    for p in passengers {
        passengers_by_booking.entry(p.booking_id).or_default().push(p.into());
    }

    let mut seats_by_booking: HashMap<i32, Vec<SeatRecord>> = HashMap::new();
    for s in seats {
        seats_by_booking.entry(s.booking_id).or_default().push(s.into());
    }

    rows.into_iter()
        .map(|row| {
            let id = row.id;
            row.into_record(
                passengers_by_booking.remove(&id).unwrap_or_default(),
                seats_by_booking.remove(&id).unwrap_or_default(),
            )
            .into_booking()
        })
        .collect()
}

const BOOKING_COLUMNS: &str =
    "id, user_id, flight_code, flight_class, created_at, luggage, status";

impl StoreBookingRepository {
    async fn load_children(
        &self,
        ids: &[i32],
    ) -> Result<(Vec<PassengerRow>, Vec<SeatRow>), sqlx::Error> {
        if ids.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let passengers = sqlx::query_as::<_, PassengerRow>(
            "SELECT id, booking_id, full_name, date_of_birth, passport_number, email \
             FROM passenger WHERE booking_id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let seats = sqlx::query_as::<_, SeatRow>(
            "SELECT id, booking_id, seat_row, seat_column \
             FROM seat WHERE booking_id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok((passengers, seats))
    }

    async fn load_many(&self, rows: Vec<BookingRow>) -> Result<Vec<Booking>, StoreError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let (passengers, seats) = self.load_children(&ids).await?;
        Ok(assemble(rows, passengers, seats))
    }

    async fn insert_children(
        tx: &mut Transaction<'_, Postgres>,
        record: &BookingRecord,
    ) -> Result<(Vec<PassengerRecord>, Vec<SeatRecord>), sqlx::Error> {
        let mut passengers = Vec::with_capacity(record.passengers.len());
        for p in &record.passengers {
            let id: i32 = sqlx::query_scalar(
                "INSERT INTO passenger (booking_id, full_name, date_of_birth, passport_number, email) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING id",
            )
            .bind(record.id)
            .bind(&p.full_name)
            .bind(p.date_of_birth)
            .bind(&p.passport_number)
            .bind(&p.email)
            .fetch_one(&mut **tx)
            .await?;

            passengers.push(PassengerRecord { id: Some(id), ..p.clone() });
        }

        let mut seats = Vec::with_capacity(record.seats.len());
        for s in &record.seats {
            let id: i32 = sqlx::query_scalar(
                "INSERT INTO seat (booking_id, seat_row, seat_column) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(record.id)
            .bind(s.row)
            .bind(&s.column)
            .fetch_one(&mut **tx)
            .await?;

            seats.push(SeatRecord { id: Some(id), ..s.clone() });
        }

        Ok((passengers, seats))
    }

    async fn delete_children(
        tx: &mut Transaction<'_, Postgres>,
        id: BookingId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM passenger WHERE booking_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        sqlx::query("DELETE FROM seat WHERE booking_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn get_all(&self) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM booking ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.load_many(rows).await
    }

    async fn get_by_id(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM booking WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.load_many(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn get_by_user_id(&self, user_id: UserId) -> Result<Vec<Booking>, StoreError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM booking WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.load_many(rows).await
    }

    async fn exists(&self, id: BookingId) -> Result<bool, StoreError> {
        let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM booking WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found)
    }

    async fn create(&self, booking: &Booking) -> Result<Booking, StoreError> {
        let record = BookingRecord::from_booking(booking);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO booking (id, user_id, flight_code, flight_class, created_at, luggage, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.flight_code)
        .bind(record.flight_class)
        .bind(record.created_at)
        .bind(&record.luggage)
        .bind(&record.status)
        .execute(&mut *tx)
        .await?;

        let (passengers, seats) = Self::insert_children(&mut tx, &record).await?;

        tx.commit().await?;

        tracing::debug!(booking_id = record.id, "Booking row inserted");
        Ok(BookingRecord { passengers, seats, ..record }.into_booking())
    }

    async fn update(&self, booking: &Booking) -> Result<Booking, StoreError> {
        let record = BookingRecord::from_booking(booking);
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE booking SET user_id = $2, flight_code = $3, flight_class = $4, \
             created_at = $5, luggage = $6, status = $7 WHERE id = $1",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.flight_code)
        .bind(record.flight_class)
        .bind(record.created_at)
        .bind(&record.luggage)
        .bind(&record.status)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(format!("booking {} does not exist", record.id).into());
        }

        Self::delete_children(&mut tx, record.id).await?;
        let (passengers, seats) = Self::insert_children(&mut tx, &record).await?;

        tx.commit().await?;

        Ok(BookingRecord { passengers, seats, ..record }.into_booking())
    }

    async fn update_status(&self, id: BookingId, status: BookingStatus) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE booking SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_booking_id(&self, id: BookingId) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        Self::delete_children(&mut tx, id).await?;

        let result = sqlx::query("DELETE FROM booking WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}
