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
use crate::models::{NewVenue, VenueChanges};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/venues", get(list_venues).post(create_venue))
        .route(
            "/venues/{id}",
            get(get_venue)
                .put(replace_venue)
                .patch(update_venue)
                .delete(delete_venue),
        )
}

// GET /api/venues
async fn list_venues(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.venues.list().await?))
}

// POST /api/venues
async fn create_venue(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<NewVenue>,
) -> Result<impl IntoResponse, AppError> {
    let venue = state.venues.create(req).await?;
    Ok((StatusCode::CREATED, Json(venue)))
}

// GET /api/venues/{id}
async fn get_venue(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.venues.read(id).await?))
}

// PUT /api/venues/{id}
async fn replace_venue(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath<i64>,
    JsonBody(req): JsonBody<NewVenue>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.venues.update(id, VenueChanges::from(req)).await?))
}

// PATCH /api/venues/{id}
async fn update_venue(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath<i64>,
    JsonBody(req): JsonBody<VenueChanges>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.venues.update(id, req).await?))
}

// DELETE /api/venues/{id}
async fn delete_venue(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.venues.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
