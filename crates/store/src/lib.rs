//! Read-only access to the bookings database.
//!
//! The report needs exactly two aggregation queries: the earliest booking
//! item per booker (with a cutoff filter), and summed turnover plus item
//! counts for a given booker set. Both live here; nothing in this crate
//! writes to the database.

use ltv_core::types::{BookerId, BookerTotals, FirstBooking};
use ltv_core::ReportResult;
use sqlx::SqlitePool;
use tracing::debug;

/// Query layer over the `bookers`/`bookings`/`bookingitems` tables.
pub struct BookingStore {
    pool: SqlitePool,
}

impl BookingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the bookings database.
    pub async fn connect(url: &str) -> ReportResult<Self> {
        let pool = SqlitePool::connect(url).await?;
        debug!(url, "Connected to bookings database");
        Ok(Self { pool })
    }

    /// All bookers whose earliest booking-item end timestamp is at or before
    /// `cutoff` (inclusive), with that earliest timestamp. Bookers without
    /// any booking items are absent from the result.
    pub async fn first_bookings_before(&self, cutoff: i64) -> ReportResult<Vec<FirstBooking>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT bookers.id, MIN(bookingitems.end_timestamp) AS first_end
               FROM bookers
              INNER JOIN bookings ON bookings.booker_id = bookers.id
              INNER JOIN bookingitems ON bookingitems.booking_id = bookings.id
              GROUP BY bookers.id
             HAVING first_end <= ?
              ORDER BY bookers.id",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(booker_id, first_end_timestamp)| FirstBooking {
                booker_id,
                first_end_timestamp,
            })
            .collect())
    }

    /// Summed locked price and booking-item count per booker, restricted to
    /// the given booker set. An empty set short-circuits to an empty result
    /// instead of issuing an `IN ()` query.
    pub async fn booker_totals(&self, booker_ids: &[BookerId]) -> ReportResult<Vec<BookerTotals>> {
        if booker_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; booker_ids.len()].join(", ");
        let sql = format!(
            "SELECT bookings.booker_id,
                    SUM(bookingitems.locked_total_price) AS turnover,
                    COUNT(bookingitems.id) AS booking_count
               FROM bookingitems
              INNER JOIN bookings ON bookings.id = bookingitems.booking_id
              WHERE bookings.booker_id IN ({placeholders})
              GROUP BY bookings.booker_id"
        );

        let mut query = sqlx::query_as::<_, (i64, f64, i64)>(&sql);
        for id in booker_ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(booker_id, turnover, booking_count)| BookerTotals {
                booker_id,
                turnover,
                booking_count,
            })
            .collect())
    }
}
