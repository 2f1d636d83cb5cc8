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
use crate::models::NewBooking;
use crate::AppState;

// Обновления брони нет: только создать или удалить
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/{id}", get(get_booking).delete(delete_booking))
}

/* ---------- BOOKINGS ---------- */

// GET /api/bookings
async fn list_bookings(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.list().await?))
}

// POST /api/bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<NewBooking>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.bookings.create(req).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings/{id}
async fn get_booking(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.bookings.read(id).await?))
}

// DELETE /api/bookings/{id}
async fn delete_booking(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.bookings.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
