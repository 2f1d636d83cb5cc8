use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::{IdPath, JsonBody};
use crate::error::AppError;
use crate::models::{NewSeat, SeatChanges, SeatReplacement};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seats", get(list_seats).post(create_seat))
        .route(
            "/seats/{id}",
            get(get_seat)
                .put(replace_seat)
                .patch(update_seat)
                .delete(delete_seat),
        )
}

// GET /api/seats
async fn list_seats(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.seats.list().await?))
}

// POST /api/seats
async fn create_seat(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<NewSeat>,
) -> Result<impl IntoResponse, AppError> {
    let seat = state.seats.create(req).await?;
    Ok((StatusCode::CREATED, Json(seat)))
}

// GET /api/seats/{id}
async fn get_seat(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.seats.read(id).await?))
}

// PUT /api/seats/{id}
async fn replace_seat(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath<i64>,
    JsonBody(req): JsonBody<SeatReplacement>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.seats.update(id, SeatChanges::from(req)).await?))
}

// PATCH /api/seats/{id}
// is_booked в теле отклоняется экстрактором (deny_unknown_fields)
async fn update_seat(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath<i64>,
    JsonBody(req): JsonBody<SeatChanges>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.seats.update(id, req).await?))
}

// DELETE /api/seats/{id}
async fn delete_seat(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.seats.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
