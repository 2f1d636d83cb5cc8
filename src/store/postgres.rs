//! PostgreSQL-реализация `Store`.
//!
//! Проверка и запись выполняются в одной транзакции под блокировкой строки
//! родителя (`SELECT ... FOR UPDATE`): зал при добавлении места, место при
//! создании и удалении брони. Уникальные ограничения и внешние ключи со
//! `ON DELETE RESTRICT` остаются последним рубежом, а их нарушения
//! переводятся в ошибки домена по имени ограничения.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::{PgExecutor, PgPool};
use std::collections::HashMap;
use tracing::debug;

use super::Store;
use crate::error::{AppError, Entity};
use crate::models::{
    Booking, BookingDetails, NewBooking, NewSeat, NewVenue, Seat, SeatChanges, Venue,
    VenueChanges,
};

// Имена ограничений из src/migrations
const VENUE_NAME_KEY: &str = "venues_name_key";
const SEAT_NUMBER_KEY: &str = "seats_venue_seat_number_key";
const SEAT_VENUE_FKEY: &str = "seats_venue_id_fkey";
const BOOKING_SEAT_KEY: &str = "bookings_seat_id_key";
const BOOKING_SHOWING_KEY: &str = "bookings_seat_showing_key";
const BOOKING_SEAT_FKEY: &str = "bookings_seat_id_fkey";

const SEAT_SELECT: &str = r#"
    SELECT s.id, s.venue_id, v.name AS venue_name, s.seat_number, s.seat_type,
           s.price, s.is_booked, s.created_at, s.updated_at
    FROM seats s
    JOIN venues v ON v.id = s.venue_id
"#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/* ---------- helpers ---------- */

fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    err.as_database_error()
        .and_then(|e| e.constraint())
        .is_some_and(|name| name == constraint)
}

async fn fetch_seat<'e, E>(executor: E, id: i64, lock: bool) -> sqlx::Result<Option<Seat>>
where
    E: PgExecutor<'e>,
{
    let sql = if lock {
        format!("{SEAT_SELECT} WHERE s.id = $1 FOR UPDATE OF s")
    } else {
        format!("{SEAT_SELECT} WHERE s.id = $1")
    };

    sqlx::query_as::<_, Seat>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

async fn attach_seat<'e, E>(executor: E, booking: Booking) -> Result<BookingDetails, AppError>
where
    E: PgExecutor<'e>,
{
    let seat = fetch_seat(executor, booking.seat_id, false)
        .await?
        .ok_or_else(|| AppError::not_found(Entity::Seat, booking.seat_id))?;

    Ok(BookingDetails {
        booking,
        seat_details: seat,
    })
}

#[async_trait]
impl Store for PgStore {
    /* ---------- VENUES ---------- */

    async fn insert_venue(&self, venue: &NewVenue) -> Result<Venue, AppError> {
        sqlx::query_as::<_, Venue>(
            "INSERT INTO venues (name, location, capacity)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(&venue.name)
        .bind(&venue.location)
        .bind(venue.capacity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, VENUE_NAME_KEY) {
                AppError::DuplicateName {
                    name: venue.name.clone(),
                }
            } else {
                e.into()
            }
        })
    }

    async fn find_venue(&self, id: i64) -> Result<Option<Venue>, AppError> {
        let venue = sqlx::query_as::<_, Venue>("SELECT * FROM venues WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(venue)
    }

    async fn find_venue_by_name(&self, name: &str) -> Result<Option<Venue>, AppError> {
        let venue = sqlx::query_as::<_, Venue>("SELECT * FROM venues WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(venue)
    }

    async fn list_venues(&self) -> Result<Vec<Venue>, AppError> {
        let venues = sqlx::query_as::<_, Venue>("SELECT * FROM venues ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(venues)
    }

    async fn update_venue(&self, id: i64, changes: &VenueChanges) -> Result<Venue, AppError> {
        sqlx::query_as::<_, Venue>(
            r#"
            UPDATE venues
            SET name = COALESCE($2, name),
                location = COALESCE($3, location),
                capacity = COALESCE($4, capacity),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.location)
        .bind(changes.capacity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if violates(&e, VENUE_NAME_KEY) {
                AppError::DuplicateName {
                    name: changes.name.clone().unwrap_or_default(),
                }
            } else {
                e.into()
            }
        })?
        .ok_or_else(|| AppError::not_found(Entity::Venue, id))
    }

    async fn delete_venue(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // 1) Блокируем зал: параллельное добавление мест будет ждать
        let locked = sqlx::query_scalar::<_, i64>("SELECT id FROM venues WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(AppError::not_found(Entity::Venue, id));
        }

        // 2) Забронированные места защищают зал от удаления
        let booked = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
              SELECT 1
              FROM bookings b
              JOIN seats s ON s.id = b.seat_id
              WHERE s.venue_id = $1
            )
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if booked {
            return Err(AppError::ReferentialIntegrity {
                entity: Entity::Venue,
                id,
                dependent: Entity::Booking,
            });
        }

        // 3) Каскадно удаляем места, затем сам зал
        let seats = sqlx::query("DELETE FROM seats WHERE venue_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if violates(&e, BOOKING_SEAT_FKEY) {
                    AppError::ReferentialIntegrity {
                        entity: Entity::Venue,
                        id,
                        dependent: Entity::Booking,
                    }
                } else {
                    e.into()
                }
            })?;

        sqlx::query("DELETE FROM venues WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if violates(&e, SEAT_VENUE_FKEY) {
                    AppError::ReferentialIntegrity {
                        entity: Entity::Venue,
                        id,
                        dependent: Entity::Seat,
                    }
                } else {
                    e.into()
                }
            })?;

        tx.commit().await?;
        debug!("venue {} deleted with {} seats", id, seats.rows_affected());
        Ok(())
    }

    /* ---------- SEATS ---------- */

    async fn insert_seat(&self, seat: &NewSeat) -> Result<Seat, AppError> {
        let mut tx = self.pool.begin().await?;

        let capacity = sqlx::query_scalar::<_, i32>(
            "SELECT capacity FROM venues WHERE id = $1 FOR UPDATE",
        )
        .bind(seat.venue_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(Entity::Venue, seat.venue_id))?;

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM seats WHERE venue_id = $1")
            .bind(seat.venue_id)
            .fetch_one(&mut *tx)
            .await?;
        if count >= i64::from(capacity) {
            return Err(AppError::CapacityExceeded {
                venue_id: seat.venue_id,
                capacity,
            });
        }

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO seats (venue_id, seat_number, seat_type, price)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(seat.venue_id)
        .bind(&seat.seat_number)
        .bind(seat.seat_type)
        .bind(seat.price)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if violates(&e, SEAT_NUMBER_KEY) {
                AppError::DuplicateSeat {
                    venue_id: seat.venue_id,
                    seat_number: seat.seat_number.clone(),
                }
            } else {
                e.into()
            }
        })?;

        let created = fetch_seat(&mut *tx, id, false)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Seat, id))?;

        tx.commit().await?;
        Ok(created)
    }

    async fn find_seat(&self, id: i64) -> Result<Option<Seat>, AppError> {
        Ok(fetch_seat(&self.pool, id, false).await?)
    }

    async fn find_seat_by_number(
        &self,
        venue_id: i64,
        seat_number: &str,
    ) -> Result<Option<Seat>, AppError> {
        let sql = format!("{SEAT_SELECT} WHERE s.venue_id = $1 AND s.seat_number = $2");
        let seat = sqlx::query_as::<_, Seat>(&sql)
            .bind(venue_id)
            .bind(seat_number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(seat)
    }

    async fn count_seats(&self, venue_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM seats WHERE venue_id = $1")
            .bind(venue_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_seats(&self) -> Result<Vec<Seat>, AppError> {
        let sql = format!("{SEAT_SELECT} ORDER BY s.venue_id, s.seat_number");
        let seats = sqlx::query_as::<_, Seat>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(seats)
    }

    async fn update_seat(&self, id: i64, changes: &SeatChanges) -> Result<Seat, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = fetch_seat(&mut *tx, id, true)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Seat, id))?;

        sqlx::query(
            r#"
            UPDATE seats
            SET seat_number = COALESCE($2, seat_number),
                seat_type = COALESCE($3, seat_type),
                price = COALESCE($4, price),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.seat_number)
        .bind(changes.seat_type)
        .bind(changes.price)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if violates(&e, SEAT_NUMBER_KEY) {
                AppError::DuplicateSeat {
                    venue_id: current.venue_id,
                    seat_number: changes.seat_number.clone().unwrap_or_default(),
                }
            } else {
                e.into()
            }
        })?;

        let updated = fetch_seat(&mut *tx, id, false)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Seat, id))?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_seat(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if fetch_seat(&mut *tx, id, true).await?.is_none() {
            return Err(AppError::not_found(Entity::Seat, id));
        }

        let referenced = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE seat_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let protected = AppError::ReferentialIntegrity {
            entity: Entity::Seat,
            id,
            dependent: Entity::Booking,
        };
        if referenced {
            return Err(protected);
        }

        sqlx::query("DELETE FROM seats WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if violates(&e, BOOKING_SEAT_FKEY) {
                    protected
                } else {
                    e.into()
                }
            })?;

        tx.commit().await?;
        Ok(())
    }

    /* ---------- BOOKINGS ---------- */

    async fn insert_booking(&self, booking: &NewBooking) -> Result<BookingDetails, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1) Блокируем место до конца транзакции
        let seat = fetch_seat(&mut *tx, booking.seat_id, true)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Seat, booking.seat_id))?;

        let already_booked = AppError::SeatAlreadyBooked {
            seat_id: seat.id,
            seat_number: seat.seat_number.clone(),
        };
        if seat.is_booked {
            return Err(already_booked);
        }

        let duplicate = AppError::DuplicateBooking {
            seat_id: seat.id,
            event_date: booking.event_date,
            event_time: booking.event_time,
        };
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
              SELECT 1 FROM bookings
              WHERE seat_id = $1 AND event_date = $2 AND event_time = $3
            )
            "#,
        )
        .bind(seat.id)
        .bind(booking.event_date)
        .bind(booking.event_time)
        .fetch_one(&mut *tx)
        .await?;
        if taken {
            return Err(duplicate);
        }

        // 2) Вставляем бронь
        let created = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (seat_id, customer_name, phone, email, event_date, event_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(seat.id)
        .bind(&booking.customer_name)
        .bind(&booking.phone)
        .bind(&booking.email)
        .bind(booking.event_date)
        .bind(booking.event_time)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if violates(&e, BOOKING_SEAT_KEY) {
                already_booked
            } else if violates(&e, BOOKING_SHOWING_KEY) {
                duplicate
            } else {
                e.into()
            }
        })?;

        // 3) Поднимаем флаг места
        sqlx::query("UPDATE seats SET is_booked = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(seat.id)
            .execute(&mut *tx)
            .await?;

        let details = attach_seat(&mut *tx, created).await?;

        // 4) Коммитим
        tx.commit().await?;
        Ok(details)
    }

    async fn find_booking(&self, id: i64) -> Result<Option<BookingDetails>, AppError> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match booking {
            Some(booking) => Ok(Some(attach_seat(&self.pool, booking).await?)),
            None => Ok(None),
        }
    }

    async fn booking_exists(
        &self,
        seat_id: i64,
        event_date: NaiveDate,
        event_time: NaiveTime,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
              SELECT 1 FROM bookings
              WHERE seat_id = $1 AND event_date = $2 AND event_time = $3
            )
            "#,
        )
        .bind(seat_id)
        .bind(event_date)
        .bind(event_time)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list_bookings(&self) -> Result<Vec<BookingDetails>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let seat_ids: Vec<i64> = bookings.iter().map(|b| b.seat_id).collect();
        let sql = format!("{SEAT_SELECT} WHERE s.id = ANY($1)");
        let seats: HashMap<i64, Seat> = sqlx::query_as::<_, Seat>(&sql)
            .bind(seat_ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        Ok(bookings
            .into_iter()
            .filter_map(|booking| {
                let seat = seats.get(&booking.seat_id).cloned()?;
                Some(BookingDetails {
                    booking,
                    seat_details: seat,
                })
            })
            .collect())
    }

    async fn delete_booking(&self, id: i64) -> Result<BookingDetails, AppError> {
        let mut tx = self.pool.begin().await?;

        // Сначала блокируем место, затем удаляем бронь: тот же порядок, что при создании
        let seat_id = sqlx::query_scalar::<_, i64>("SELECT seat_id FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Booking, id))?;
        fetch_seat(&mut *tx, seat_id, true).await?;

        let removed = sqlx::query_as::<_, Booking>("DELETE FROM bookings WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Booking, id))?;

        sqlx::query("UPDATE seats SET is_booked = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(removed.seat_id)
            .execute(&mut *tx)
            .await?;

        let details = attach_seat(&mut *tx, removed).await?;

        tx.commit().await?;
        Ok(details)
    }
}
