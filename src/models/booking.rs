use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::Seat;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub seat_id: i64,
    pub customer_name: String,
    pub phone: String,
    pub email: String,
    pub event_date: NaiveDate,
    pub event_time: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Бронь вместе со снимком места на момент чтения.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub seat_details: Seat,
}

// Тело POST /api/bookings
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBooking {
    #[serde(alias = "seat")]
    pub seat_id: i64,
    #[validate(length(min = 1, max = 255))]
    pub customer_name: String,
    #[validate(length(min = 1, max = 15))]
    pub phone: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    pub event_date: NaiveDate,
    pub event_time: NaiveTime,
}

impl NewBooking {
    pub fn event_at(&self) -> NaiveDateTime {
        self.event_date.and_time(self.event_time)
    }
}
