use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Класс места. В Postgres хранится как enum `seat_type`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "seat_type", rename_all = "UPPERCASE")]
pub enum SeatType {
    #[default]
    Regular,
    Vip,
}

/// Статус места, производный от флага `is_booked`.
///
/// AVAILABLE -> BOOKED только при создании брони,
/// BOOKED -> AVAILABLE только при её удалении.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatStatus {
    Available,
    Booked,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub venue_id: i64,
    pub venue_name: String,
    pub seat_number: String,
    #[serde(rename = "type")]
    pub seat_type: SeatType,
    pub price: f64,
    pub is_booked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Seat {
    pub fn status(&self) -> SeatStatus {
        if self.is_booked {
            SeatStatus::Booked
        } else {
            SeatStatus::Available
        }
    }
}

// Тело POST /api/seats
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewSeat {
    #[serde(alias = "venue")]
    pub venue_id: i64,
    #[validate(length(min = 1, max = 10))]
    pub seat_number: String,
    #[serde(rename = "type", default)]
    pub seat_type: SeatType,
    #[validate(range(min = 0.0))]
    pub price: f64,
}

// Флаг брони сюда не входит: его меняет только журнал бронирований
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SeatChanges {
    #[validate(length(min = 1, max = 10))]
    pub seat_number: Option<String>,
    #[serde(rename = "type")]
    pub seat_type: Option<SeatType>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
}

/// Тело PUT /api/seats/{id}: полная замена. Зал у места не меняется.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeatReplacement {
    pub seat_number: String,
    #[serde(rename = "type", default)]
    pub seat_type: SeatType,
    pub price: f64,
}

impl From<SeatReplacement> for SeatChanges {
    fn from(seat: SeatReplacement) -> Self {
        Self {
            seat_number: Some(seat.seat_number),
            seat_type: Some(seat.seat_type),
            price: Some(seat.price),
        }
    }
}
