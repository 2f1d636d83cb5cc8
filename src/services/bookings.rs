//! bookings.rs
//!
//! Журнал бронирований: единственное место, где меняется флаг `is_booked`.
//!
//! Создание брони проверяет по порядку:
//! 1.  дата и время события строго в будущем (`PastEvent`);
//! 2.  место существует (`NotFound`);
//! 3.  место свободно (`SeatAlreadyBooked`);
//! 4.  для этого места нет брони на тот же сеанс (`DuplicateBooking`).
//!
//! Сама запись брони и подъём флага выполняются хранилищем атомарно,
//! с повторной проверкой под блокировкой места. Удаление снимает флаг
//! в той же атомарной операции. Изменять бронь нельзя: только удалить
//! и создать заново.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::error::{AppError, Entity};
use crate::models::{BookingDetails, NewBooking, SeatStatus};
use crate::store::Store;

/// Событие должно начинаться строго позже `now`.
pub fn ensure_future_event(
    event_date: NaiveDate,
    event_time: NaiveTime,
    now: NaiveDateTime,
) -> Result<(), AppError> {
    if event_date.and_time(event_time) > now {
        Ok(())
    } else {
        Err(AppError::PastEvent {
            event_date,
            event_time,
        })
    }
}

#[derive(Clone)]
pub struct BookingLedger {
    store: Arc<dyn Store>,
}

impl BookingLedger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, booking: NewBooking) -> Result<BookingDetails, AppError> {
        self.create_at(booking, Utc::now().naive_utc()).await
    }

    async fn create_at(
        &self,
        booking: NewBooking,
        now: NaiveDateTime,
    ) -> Result<BookingDetails, AppError> {
        booking.validate()?;

        if let Err(e) = ensure_future_event(booking.event_date, booking.event_time, now) {
            warn!("rejected booking for seat {}: event {} is not in the future", booking.seat_id, booking.event_at());
            return Err(e);
        }

        let seat = self
            .store
            .find_seat(booking.seat_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Seat, booking.seat_id))?;

        if seat.status() == SeatStatus::Booked {
            warn!("seat {} ({}) is already booked", seat.id, seat.seat_number);
            return Err(AppError::SeatAlreadyBooked {
                seat_id: seat.id,
                seat_number: seat.seat_number,
            });
        }

        if self
            .store
            .booking_exists(seat.id, booking.event_date, booking.event_time)
            .await?
        {
            return Err(AppError::DuplicateBooking {
                seat_id: seat.id,
                event_date: booking.event_date,
                event_time: booking.event_time,
            });
        }

        let created = self.store.insert_booking(&booking).await?;
        info!(
            "Booking {} created: seat {} for {} {}",
            created.booking.id,
            created.seat_details.seat_number,
            created.booking.event_date,
            created.booking.event_time
        );
        Ok(created)
    }

    pub async fn read(&self, id: i64) -> Result<BookingDetails, AppError> {
        self.store
            .find_booking(id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Booking, id))
    }

    /// Сначала новые.
    pub async fn list(&self) -> Result<Vec<BookingDetails>, AppError> {
        self.store.list_bookings().await
    }

    /// Удаляет бронь и освобождает место.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let removed = self.store.delete_booking(id).await?;
        info!(
            "Booking {} deleted, seat {} released",
            id, removed.seat_details.id
        );
        Ok(())
    }
}
