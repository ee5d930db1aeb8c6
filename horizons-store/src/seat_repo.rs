use async_trait::async_trait;
use horizons_core::repository::SeatRepository;
use horizons_core::{Seat, StoreError};
use sqlx::PgPool;

pub struct StoreSeatRepository {
    pool: PgPool,
}

impl StoreSeatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SeatOptionRow {
    seat_row: i32,
    seat_column: String,
    available: bool,
}

impl From<SeatOptionRow> for Seat {
    fn from(row: SeatOptionRow) -> Self {
        Seat {
            row: row.seat_row,
            column: row.seat_column,
            available: row.available,
        }
    }
}

#[async_trait]
impl SeatRepository for StoreSeatRepository {
    async fn get_by_flight_code(&self, flight_code: &str) -> Result<Vec<Seat>, StoreError> {
        let rows = sqlx::query_as::<_, SeatOptionRow>(
            r#"
            SELECT so.seat_row, so.seat_column,
                   NOT EXISTS (
                       SELECT 1
                       FROM seat s
                       JOIN booking b ON b.id = s.booking_id
                       WHERE s.seat_row = so.seat_row
                         AND s.seat_column = so.seat_column
                         AND b.flight_code = $1
                   ) AS available
            FROM seat_option so
            ORDER BY so.seat_row, so.seat_column
            "#,
        )
        .bind(flight_code)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(flight_code, error = %e, "Failed to fetch seat options");
            e
        })?;

        Ok(rows.into_iter().map(Seat::from).collect())
    }
}
