//! error.rs
//!
//! Единая таксономия ошибок ядра бронирования.
//!
//! Каждая ошибка относится к одной операции и не оставляет хранилище
//! в промежуточном состоянии. Для HTTP-слоя ошибка сама знает свой
//! статус, машинный `kind` и поле запроса, которое её вызвало.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use std::fmt;
use thiserror::Error;

/// Сущности, на которые ссылаются ошибки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Venue,
    Seat,
    Booking,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Venue => "venue",
            Entity::Seat => "seat",
            Entity::Booking => "booking",
        })
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },

    #[error("venue with name {name:?} already exists")]
    DuplicateName { name: String },

    #[error("seat {seat_number:?} already exists in venue {venue_id}")]
    DuplicateSeat { venue_id: i64, seat_number: String },

    #[error("seat {seat_id} is already booked for {event_date} {event_time}")]
    DuplicateBooking {
        seat_id: i64,
        event_date: NaiveDate,
        event_time: NaiveTime,
    },

    #[error("maximum capacity of venue {venue_id} ({capacity} seats) has been reached")]
    CapacityExceeded { venue_id: i64, capacity: i32 },

    #[error("event date and time must be in the future, got {event_date} {event_time}")]
    PastEvent {
        event_date: NaiveDate,
        event_time: NaiveTime,
    },

    #[error("seat {seat_number} is already booked")]
    SeatAlreadyBooked { seat_id: i64, seat_number: String },

    #[error("{entity} {id} cannot be deleted while a {dependent} references it")]
    ReferentialIntegrity {
        entity: Entity,
        id: i64,
        dependent: Entity,
    },

    #[error("invalid input: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Тело или путь запроса не разобраны экстрактором axum.
    #[error("{message}")]
    Rejection {
        status: StatusCode,
        field: Option<String>,
        message: String,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        AppError::Rejection {
            status: rejection.status(),
            field: rejected_field(&message),
            message,
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Rejection {
            status: rejection.status(),
            field: Some("id".to_string()),
            message: rejection.body_text(),
        }
    }
}

/// Имя поля из текста ошибки serde: "missing field `x`", "unknown field `x`"
/// или префикс пути serde_path_to_error ("event_date: ...").
fn rejected_field(text: &str) -> Option<String> {
    if let Some(start) = text.find("field `") {
        let rest = &text[start + "field `".len()..];
        return rest.find('`').map(|end| rest[..end].to_string());
    }

    let detail = text
        .split_once("target type: ")
        .map_or(text, |(_, detail)| detail);
    detail
        .split_once(": ")
        .map(|(path, _)| path)
        .filter(|path| *path != "." && !path.is_empty() && !path.contains(' '))
        .map(str::to_string)
}

impl AppError {
    pub fn not_found(entity: Entity, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Стабильный машинный идентификатор вида ошибки.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "not_found",
            AppError::DuplicateName { .. } => "duplicate_name",
            AppError::DuplicateSeat { .. } => "duplicate_seat",
            AppError::DuplicateBooking { .. } => "duplicate_booking",
            AppError::CapacityExceeded { .. } => "capacity_exceeded",
            AppError::PastEvent { .. } => "past_event",
            AppError::SeatAlreadyBooked { .. } => "seat_already_booked",
            AppError::ReferentialIntegrity { .. } => "referential_integrity",
            AppError::Validation(_) => "validation",
            AppError::Rejection { .. } => "invalid_request",
            AppError::Database(_) => "internal",
        }
    }

    /// Поле запроса (или сущность), из-за которого операция отклонена.
    pub fn field(&self) -> Option<&str> {
        match self {
            AppError::NotFound { entity, .. } | AppError::ReferentialIntegrity { entity, .. } => {
                Some(match entity {
                    Entity::Venue => "venue",
                    Entity::Seat => "seat",
                    Entity::Booking => "booking",
                })
            }
            AppError::DuplicateName { .. } => Some("name"),
            AppError::DuplicateSeat { .. } => Some("seat_number"),
            AppError::DuplicateBooking { .. } => Some("event_time"),
            AppError::CapacityExceeded { .. } => Some("venue"),
            AppError::PastEvent { .. } => Some("event_time"),
            AppError::SeatAlreadyBooked { .. } => Some("seat"),
            AppError::Rejection { field, .. } => field.as_deref(),
            AppError::Validation(_) | AppError::Database(_) => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::DuplicateName { .. }
            | AppError::DuplicateSeat { .. }
            | AppError::DuplicateBooking { .. }
            | AppError::SeatAlreadyBooked { .. }
            | AppError::ReferentialIntegrity { .. } => StatusCode::CONFLICT,
            AppError::CapacityExceeded { .. }
            | AppError::PastEvent { .. }
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Rejection { status, .. } => *status,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Детали ошибок БД остаются в логах
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let mut body = serde_json::json!({
            "error": self.kind(),
            "field": self.field(),
            "message": message,
        });
        if let AppError::Validation(errors) = &self {
            body["details"] = serde_json::to_value(errors).unwrap_or_default();
        }

        (status, Json(body)).into_response()
    }
}
