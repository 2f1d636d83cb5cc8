pub mod venues;
pub mod seats;
pub mod bookings;

use axum::{
    extract::{FromRequest, FromRequestParts},
    Router,
};
use std::sync::Arc;

use crate::error::AppError;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(venues::routes())
        .merge(seats::routes())
        .merge(bookings::routes())
}

// Ошибки разбора тела и пути отдаются тем же JSON, что и ошибки домена
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct IdPath<T>(pub T);
