//! In-memory `Store`.
//!
//! Все операции выполняются под одним мьютексом, поэтому каждая из них
//! атомарна так же, как транзакция в PgStore. Используется в тестах и при
//! `STORAGE_BACKEND=memory`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use super::Store;
use crate::error::{AppError, Entity};
use crate::models::{
    Booking, BookingDetails, NewBooking, NewSeat, NewVenue, Seat, SeatChanges, SeatType, Venue,
    VenueChanges,
};

#[derive(Debug, Clone)]
struct SeatRow {
    id: i64,
    venue_id: i64,
    seat_number: String,
    seat_type: SeatType,
    price: f64,
    is_booked: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    venues: BTreeMap<i64, Venue>,
    seats: BTreeMap<i64, SeatRow>,
    bookings: BTreeMap<i64, Booking>,
    last_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn seat(&self, id: i64) -> Option<Seat> {
        let row = self.seats.get(&id)?;
        let venue = self.venues.get(&row.venue_id)?;
        Some(Seat {
            id: row.id,
            venue_id: row.venue_id,
            venue_name: venue.name.clone(),
            seat_number: row.seat_number.clone(),
            seat_type: row.seat_type,
            price: row.price,
            is_booked: row.is_booked,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn details(&self, booking: Booking) -> Result<BookingDetails, AppError> {
        let seat = self
            .seat(booking.seat_id)
            .ok_or_else(|| AppError::not_found(Entity::Seat, booking.seat_id))?;
        Ok(BookingDetails {
            booking,
            seat_details: seat,
        })
    }

    fn name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.venues
            .values()
            .any(|v| v.name == name && Some(v.id) != except)
    }

    fn seat_number_taken(&self, venue_id: i64, seat_number: &str, except: Option<i64>) -> bool {
        self.seats.values().any(|s| {
            s.venue_id == venue_id && s.seat_number == seat_number && Some(s.id) != except
        })
    }

    fn is_referenced(&self, seat_id: i64) -> bool {
        self.bookings.values().any(|b| b.seat_id == seat_id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_venue(&self, venue: &NewVenue) -> Result<Venue, AppError> {
        let mut state = self.state.lock().await;
        if state.name_taken(&venue.name, None) {
            return Err(AppError::DuplicateName {
                name: venue.name.clone(),
            });
        }

        let now = Utc::now();
        let created = Venue {
            id: state.next_id(),
            name: venue.name.clone(),
            location: venue.location.clone(),
            capacity: venue.capacity,
            created_at: now,
            updated_at: now,
        };
        state.venues.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_venue(&self, id: i64) -> Result<Option<Venue>, AppError> {
        Ok(self.state.lock().await.venues.get(&id).cloned())
    }

    async fn find_venue_by_name(&self, name: &str) -> Result<Option<Venue>, AppError> {
        let state = self.state.lock().await;
        Ok(state.venues.values().find(|v| v.name == name).cloned())
    }

    async fn list_venues(&self) -> Result<Vec<Venue>, AppError> {
        Ok(self.state.lock().await.venues.values().cloned().collect())
    }

    async fn update_venue(&self, id: i64, changes: &VenueChanges) -> Result<Venue, AppError> {
        let mut state = self.state.lock().await;
        if let Some(name) = &changes.name {
            if state.name_taken(name, Some(id)) {
                return Err(AppError::DuplicateName { name: name.clone() });
            }
        }

        let venue = state
            .venues
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(Entity::Venue, id))?;
        if let Some(name) = &changes.name {
            venue.name = name.clone();
        }
        if let Some(location) = &changes.location {
            venue.location = location.clone();
        }
        if let Some(capacity) = changes.capacity {
            venue.capacity = capacity;
        }
        venue.updated_at = Utc::now();
        Ok(venue.clone())
    }

    async fn delete_venue(&self, id: i64) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if !state.venues.contains_key(&id) {
            return Err(AppError::not_found(Entity::Venue, id));
        }

        let owned: Vec<i64> = state
            .seats
            .values()
            .filter(|s| s.venue_id == id)
            .map(|s| s.id)
            .collect();
        if owned.iter().any(|seat_id| state.is_referenced(*seat_id)) {
            return Err(AppError::ReferentialIntegrity {
                entity: Entity::Venue,
                id,
                dependent: Entity::Booking,
            });
        }

        for seat_id in owned {
            state.seats.remove(&seat_id);
        }
        state.venues.remove(&id);
        Ok(())
    }

    async fn insert_seat(&self, seat: &NewSeat) -> Result<Seat, AppError> {
        let mut state = self.state.lock().await;
        let capacity = state
            .venues
            .get(&seat.venue_id)
            .map(|v| v.capacity)
            .ok_or_else(|| AppError::not_found(Entity::Venue, seat.venue_id))?;

        let count = state
            .seats
            .values()
            .filter(|s| s.venue_id == seat.venue_id)
            .count();
        if count as i64 >= i64::from(capacity) {
            return Err(AppError::CapacityExceeded {
                venue_id: seat.venue_id,
                capacity,
            });
        }
        if state.seat_number_taken(seat.venue_id, &seat.seat_number, None) {
            return Err(AppError::DuplicateSeat {
                venue_id: seat.venue_id,
                seat_number: seat.seat_number.clone(),
            });
        }

        let now = Utc::now();
        let id = state.next_id();
        state.seats.insert(
            id,
            SeatRow {
                id,
                venue_id: seat.venue_id,
                seat_number: seat.seat_number.clone(),
                seat_type: seat.seat_type,
                price: seat.price,
                is_booked: false,
                created_at: now,
                updated_at: now,
            },
        );
        state
            .seat(id)
            .ok_or_else(|| AppError::not_found(Entity::Seat, id))
    }

    async fn find_seat(&self, id: i64) -> Result<Option<Seat>, AppError> {
        Ok(self.state.lock().await.seat(id))
    }

    async fn find_seat_by_number(
        &self,
        venue_id: i64,
        seat_number: &str,
    ) -> Result<Option<Seat>, AppError> {
        let state = self.state.lock().await;
        let id = state
            .seats
            .values()
            .find(|s| s.venue_id == venue_id && s.seat_number == seat_number)
            .map(|s| s.id);
        Ok(id.and_then(|id| state.seat(id)))
    }

    async fn count_seats(&self, venue_id: i64) -> Result<i64, AppError> {
        let state = self.state.lock().await;
        Ok(state.seats.values().filter(|s| s.venue_id == venue_id).count() as i64)
    }

    async fn list_seats(&self) -> Result<Vec<Seat>, AppError> {
        let state = self.state.lock().await;
        let mut seats: Vec<Seat> = state.seats.keys().filter_map(|id| state.seat(*id)).collect();
        seats.sort_by(|a, b| (a.venue_id, &a.seat_number).cmp(&(b.venue_id, &b.seat_number)));
        Ok(seats)
    }

    async fn update_seat(&self, id: i64, changes: &SeatChanges) -> Result<Seat, AppError> {
        let mut state = self.state.lock().await;
        let venue_id = state
            .seats
            .get(&id)
            .map(|s| s.venue_id)
            .ok_or_else(|| AppError::not_found(Entity::Seat, id))?;

        if let Some(number) = &changes.seat_number {
            if state.seat_number_taken(venue_id, number, Some(id)) {
                return Err(AppError::DuplicateSeat {
                    venue_id,
                    seat_number: number.clone(),
                });
            }
        }

        if let Some(row) = state.seats.get_mut(&id) {
            if let Some(number) = &changes.seat_number {
                row.seat_number = number.clone();
            }
            if let Some(seat_type) = changes.seat_type {
                row.seat_type = seat_type;
            }
            if let Some(price) = changes.price {
                row.price = price;
            }
            row.updated_at = Utc::now();
        }
        state
            .seat(id)
            .ok_or_else(|| AppError::not_found(Entity::Seat, id))
    }

    async fn delete_seat(&self, id: i64) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if !state.seats.contains_key(&id) {
            return Err(AppError::not_found(Entity::Seat, id));
        }
        if state.is_referenced(id) {
            return Err(AppError::ReferentialIntegrity {
                entity: Entity::Seat,
                id,
                dependent: Entity::Booking,
            });
        }
        state.seats.remove(&id);
        Ok(())
    }

    async fn insert_booking(&self, booking: &NewBooking) -> Result<BookingDetails, AppError> {
        let mut state = self.state.lock().await;
        let (seat_id, seat_number, is_booked) = state
            .seats
            .get(&booking.seat_id)
            .map(|s| (s.id, s.seat_number.clone(), s.is_booked))
            .ok_or_else(|| AppError::not_found(Entity::Seat, booking.seat_id))?;

        if is_booked || state.is_referenced(seat_id) {
            return Err(AppError::SeatAlreadyBooked {
                seat_id,
                seat_number,
            });
        }
        let duplicate = state.bookings.values().any(|b| {
            b.seat_id == seat_id
                && b.event_date == booking.event_date
                && b.event_time == booking.event_time
        });
        if duplicate {
            return Err(AppError::DuplicateBooking {
                seat_id,
                event_date: booking.event_date,
                event_time: booking.event_time,
            });
        }

        let now = Utc::now();
        let created = Booking {
            id: state.next_id(),
            seat_id,
            customer_name: booking.customer_name.clone(),
            phone: booking.phone.clone(),
            email: booking.email.clone(),
            event_date: booking.event_date,
            event_time: booking.event_time,
            created_at: now,
            updated_at: now,
        };
        state.bookings.insert(created.id, created.clone());
        if let Some(row) = state.seats.get_mut(&seat_id) {
            row.is_booked = true;
            row.updated_at = now;
        }
        state.details(created)
    }

    async fn find_booking(&self, id: i64) -> Result<Option<BookingDetails>, AppError> {
        let state = self.state.lock().await;
        match state.bookings.get(&id).cloned() {
            Some(booking) => Ok(Some(state.details(booking)?)),
            None => Ok(None),
        }
    }

    async fn booking_exists(
        &self,
        seat_id: i64,
        event_date: NaiveDate,
        event_time: NaiveTime,
    ) -> Result<bool, AppError> {
        let state = self.state.lock().await;
        Ok(state.bookings.values().any(|b| {
            b.seat_id == seat_id && b.event_date == event_date && b.event_time == event_time
        }))
    }

    async fn list_bookings(&self) -> Result<Vec<BookingDetails>, AppError> {
        let state = self.state.lock().await;
        // Идентификаторы монотонны, так что обратный порядок = сначала новые
        state
            .bookings
            .values()
            .rev()
            .cloned()
            .map(|b| state.details(b))
            .collect()
    }

    async fn delete_booking(&self, id: i64) -> Result<BookingDetails, AppError> {
        let mut state = self.state.lock().await;
        let removed = state
            .bookings
            .remove(&id)
            .ok_or_else(|| AppError::not_found(Entity::Booking, id))?;
        if let Some(row) = state.seats.get_mut(&removed.seat_id) {
            row.is_booked = false;
            row.updated_at = Utc::now();
        }
        state.details(removed)
    }
}
