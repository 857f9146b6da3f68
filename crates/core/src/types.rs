use serde::{Deserialize, Serialize};

pub type BookerId = i64;

/// A qualifying booker together with the end timestamp (unix-epoch seconds)
/// of their earliest booking item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstBooking {
    pub booker_id: BookerId,
    pub first_end_timestamp: i64,
}

/// Per-booker aggregate over all their booking items.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookerTotals {
    pub booker_id: BookerId,
    pub turnover: f64,
    pub booking_count: i64,
}
