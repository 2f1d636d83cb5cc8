//! Порт хранилища.
//!
//! Каждый изменяющий метод выполняется как одна атомарная единица и сам
//! перепроверяет инвариант, который защищает (ёмкость зала, флаг брони,
//! ссылки на зависимые записи). Проверки в сервисах лишь отсекают заведомо
//! неверные запросы заранее.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use crate::error::AppError;
use crate::models::{
    BookingDetails, NewBooking, NewSeat, NewVenue, Seat, SeatChanges, Venue, VenueChanges,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    // === Залы ===

    /// Fails with `DuplicateName` if the name is taken.
    async fn insert_venue(&self, venue: &NewVenue) -> Result<Venue, AppError>;

    async fn find_venue(&self, id: i64) -> Result<Option<Venue>, AppError>;

    async fn find_venue_by_name(&self, name: &str) -> Result<Option<Venue>, AppError>;

    async fn list_venues(&self) -> Result<Vec<Venue>, AppError>;

    async fn update_venue(&self, id: i64, changes: &VenueChanges) -> Result<Venue, AppError>;

    /// Deletes the venue and all of its seats, or nothing if any seat is booked.
    async fn delete_venue(&self, id: i64) -> Result<(), AppError>;

    // === Места ===

    /// Counts the venue's seats and inserts under the same lock, so concurrent
    /// inserts can never push the venue past its capacity.
    async fn insert_seat(&self, seat: &NewSeat) -> Result<Seat, AppError>;

    async fn find_seat(&self, id: i64) -> Result<Option<Seat>, AppError>;

    async fn find_seat_by_number(
        &self,
        venue_id: i64,
        seat_number: &str,
    ) -> Result<Option<Seat>, AppError>;

    async fn count_seats(&self, venue_id: i64) -> Result<i64, AppError>;

    async fn list_seats(&self) -> Result<Vec<Seat>, AppError>;

    async fn update_seat(&self, id: i64, changes: &SeatChanges) -> Result<Seat, AppError>;

    /// Fails with `ReferentialIntegrity` while a booking references the seat.
    async fn delete_seat(&self, id: i64) -> Result<(), AppError>;

    // === Брони ===

    /// Inserts the booking and raises the seat's flag as one unit.
    async fn insert_booking(&self, booking: &NewBooking) -> Result<BookingDetails, AppError>;

    async fn find_booking(&self, id: i64) -> Result<Option<BookingDetails>, AppError>;

    async fn booking_exists(
        &self,
        seat_id: i64,
        event_date: NaiveDate,
        event_time: NaiveTime,
    ) -> Result<bool, AppError>;

    /// Newest first.
    async fn list_bookings(&self) -> Result<Vec<BookingDetails>, AppError>;

    /// Removes the booking and clears the seat's flag as one unit.
    /// Returns the removed booking with the released seat.
    async fn delete_booking(&self, id: i64) -> Result<BookingDetails, AppError>;
}
