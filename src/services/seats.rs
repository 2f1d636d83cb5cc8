//! Инвентарь мест.
//!
//! Следит за вместимостью зала и уникальностью номера места внутри зала.
//! Флаг `is_booked` здесь только читается: менять его может лишь
//! [`BookingLedger`](crate::services::BookingLedger).

use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::error::{AppError, Entity};
use crate::models::{NewSeat, Seat, SeatChanges};
use crate::store::Store;

#[derive(Clone)]
pub struct SeatInventory {
    store: Arc<dyn Store>,
}

impl SeatInventory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Проверки по порядку: зал существует, в зале есть свободная
    /// вместимость, номер места не занят. Окончательно вместимость
    /// проверяется хранилищем под блокировкой зала.
    pub async fn create(&self, seat: NewSeat) -> Result<Seat, AppError> {
        seat.validate()?;

        let venue = self
            .store
            .find_venue(seat.venue_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Venue, seat.venue_id))?;

        let count = self.store.count_seats(venue.id).await?;
        if count >= i64::from(venue.capacity) {
            warn!("venue {} is full ({} of {} seats)", venue.id, count, venue.capacity);
            return Err(AppError::CapacityExceeded {
                venue_id: venue.id,
                capacity: venue.capacity,
            });
        }

        if self
            .store
            .find_seat_by_number(venue.id, &seat.seat_number)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateSeat {
                venue_id: venue.id,
                seat_number: seat.seat_number,
            });
        }

        let created = self.store.insert_seat(&seat).await?;
        info!("Created seat {} ({}) in venue {}", created.seat_number, created.id, venue.name);
        Ok(created)
    }

    pub async fn read(&self, id: i64) -> Result<Seat, AppError> {
        self.store
            .find_seat(id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Seat, id))
    }

    pub async fn list(&self) -> Result<Vec<Seat>, AppError> {
        self.store.list_seats().await
    }

    pub async fn update(&self, id: i64, changes: SeatChanges) -> Result<Seat, AppError> {
        changes.validate()?;

        let current = self.read(id).await?;
        if let Some(number) = changes
            .seat_number
            .as_deref()
            .filter(|n| *n != current.seat_number)
        {
            if self
                .store
                .find_seat_by_number(current.venue_id, number)
                .await?
                .is_some()
            {
                return Err(AppError::DuplicateSeat {
                    venue_id: current.venue_id,
                    seat_number: number.to_string(),
                });
            }
        }

        let updated = self.store.update_seat(id, &changes).await?;
        info!("Updated seat {}", id);
        Ok(updated)
    }

    /// Забронированное место удалить нельзя: сначала нужно снять бронь.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        match self.store.delete_seat(id).await {
            Ok(()) => {
                info!("Deleted seat {}", id);
                Ok(())
            }
            Err(e @ AppError::ReferentialIntegrity { .. }) => {
                warn!("seat {} is referenced by a booking", id);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}
