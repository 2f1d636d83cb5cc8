use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use seat_booking::{build_router, config::Config, store::MemoryStore, AppState};

fn app() -> Router {
    build_router(AppState::with_store(
        Config::default(),
        Arc::new(MemoryStore::new()),
    ))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create_venue(app: &Router, name: &str, capacity: i32) -> i64 {
    let (status, venue) = send(
        app,
        "POST",
        "/api/venues",
        Some(json!({"name": name, "location": "Test Location", "capacity": capacity})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    venue["id"].as_i64().unwrap()
}

async fn create_seat(app: &Router, venue_id: i64, number: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/seats",
        Some(json!({"venue": venue_id, "seat_number": number, "type": "REGULAR", "price": 50.0})),
    )
    .await
}

fn booking_body(seat_id: i64, event_date: &str, event_time: &str) -> Value {
    json!({
        "seat": seat_id,
        "customer_name": "Shamim Azad",
        "phone": "1234567890",
        "email": "shamim@example.com",
        "event_date": event_date,
        "event_time": event_time,
    })
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_venue_crud() {
    let app = app();
    let id = create_venue(&app, "New Venue", 200).await;

    let (status, venues) = send(&app, "GET", "/api/venues", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(venues.as_array().unwrap().len(), 1);

    let (status, venue) = send(&app, "GET", &format!("/api/venues/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(venue["name"], "New Venue");

    let (status, venue) = send(
        &app,
        "PUT",
        &format!("/api/venues/{id}"),
        Some(json!({"name": "Updated Venue", "location": "Test Location", "capacity": 200})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(venue["name"], "Updated Venue");

    let (status, venue) = send(
        &app,
        "PATCH",
        &format!("/api/venues/{id}"),
        Some(json!({"location": "Elsewhere"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(venue["location"], "Elsewhere");
    assert_eq!(venue["name"], "Updated Venue");

    let (status, _) = send(&app, "DELETE", &format!("/api/venues/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, venues) = send(&app, "GET", "/api/venues", None).await;
    assert!(venues.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_venue_not_found() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/venues/9999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["field"], "venue");
}

#[tokio::test]
async fn test_duplicate_venue_name() {
    let app = app();
    create_venue(&app, "Arena", 10).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/venues",
        Some(json!({"name": "Arena", "location": "Other", "capacity": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_name");
    assert_eq!(body["field"], "name");
}

#[tokio::test]
async fn test_invalid_venue_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/venues",
        Some(json!({"name": "", "location": "Somewhere", "capacity": 0})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");
    assert!(body["details"].get("capacity").is_some());
}

#[tokio::test]
async fn test_seat_capacity_exceeded() {
    let app = app();
    let venue_id = create_venue(&app, "Small Room", 1).await;

    let (status, seat) = create_seat(&app, venue_id, "A1").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(seat["venue_name"], "Small Room");
    assert_eq!(seat["type"], "REGULAR");
    assert_eq!(seat["is_booked"], false);

    let (status, body) = create_seat(&app, venue_id, "A2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "capacity_exceeded");
    assert_eq!(body["field"], "venue");

    let (_, seats) = send(&app, "GET", "/api/seats", None).await;
    assert_eq!(seats.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_seat_update_cannot_touch_booked_flag() {
    let app = app();
    let venue_id = create_venue(&app, "Test Venue", 5).await;
    let (_, seat) = create_seat(&app, venue_id, "A1").await;
    let seat_id = seat["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/seats/{seat_id}"),
        Some(json!({"is_booked": true})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_request");
    assert_eq!(body["field"], "is_booked");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/seats/{seat_id}"),
        Some(json!({"seat_number": "A1", "price": 75.0, "is_booked": true})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "is_booked");

    let (status, seat) = send(
        &app,
        "PUT",
        &format!("/api/seats/{seat_id}"),
        Some(json!({"seat_number": "A1", "type": "VIP", "price": 75.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seat["type"], "VIP");
    assert_eq!(seat["price"], 75.0);
    assert_eq!(seat["is_booked"], false);
}

#[tokio::test]
async fn test_booking_past_event() {
    let app = app();
    let venue_id = create_venue(&app, "Test Venue", 5).await;
    let (_, seat) = create_seat(&app, venue_id, "A2").await;
    let seat_id = seat["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(booking_body(seat_id, "2023-01-01", "10:00:00")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "past_event");
    assert_eq!(body["field"], "event_time");

    let (_, bookings) = send(&app, "GET", "/api/bookings", None).await;
    assert!(bookings.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_booking_lifecycle() {
    let app = app();
    let venue_id = create_venue(&app, "Test Venue", 5).await;
    let (_, seat) = create_seat(&app, venue_id, "A1").await;
    let seat_id = seat["id"].as_i64().unwrap();

    // Бронь встраивает снимок места
    let (status, booking) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(booking_body(seat_id, "2030-01-01", "10:00:00")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["seat_id"], seat_id);
    assert_eq!(booking["seat_details"]["is_booked"], true);
    assert_eq!(booking["seat_details"]["seat_number"], "A1");
    let booking_id = booking["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(booking_body(seat_id, "2030-01-02", "11:00:00")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "seat_already_booked");
    assert_eq!(body["message"], "seat A1 is already booked");

    // Бронь защищает место и зал
    let (status, body) = send(&app, "DELETE", &format!("/api/seats/{seat_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "referential_integrity");
    let (status, _) = send(&app, "DELETE", &format!("/api/venues/{venue_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(&app, "GET", &format!("/api/venues/{venue_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, fetched) = send(&app, "GET", &format!("/api/bookings/{booking_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["customer_name"], "Shamim Azad");

    let (status, _) = send(&app, "DELETE", &format!("/api/bookings/{booking_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, seat) = send(&app, "GET", &format!("/api/seats/{seat_id}"), None).await;
    assert_eq!(seat["is_booked"], false);

    let (status, _) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(booking_body(seat_id, "2030-01-02", "11:00:00")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_booking_not_found() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/bookings/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["field"], "booking");

    let (status, _) = send(&app, "DELETE", "/api/bookings/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_for_unknown_seat() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/bookings",
        Some(booking_body(9999, "2030-01-01", "10:00:00")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["field"], "seat");
}

#[tokio::test]
async fn test_invalid_email_rejected() {
    let app = app();
    let venue_id = create_venue(&app, "Test Venue", 5).await;
    let (_, seat) = create_seat(&app, venue_id, "A1").await;
    let mut body = booking_body(seat["id"].as_i64().unwrap(), "2030-01-01", "10:00:00");
    body["email"] = json!("not-an-email");

    let (status, body) = send(&app, "POST", "/api/bookings", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");
}

#[tokio::test]
async fn test_malformed_body_returns_json_error() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/bookings")
        .header("content-type", "application/json")
        .body(Body::from(json!({"seat": 1}).to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.headers()["content-type"],
        "application/json"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "invalid_request");
    assert_eq!(body["field"], "customer_name");
    assert!(body["message"].as_str().unwrap().contains("customer_name"));

    let (status, body) = send(&app, "POST", "/api/venues", Some(json!("not an object"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_request");

    let mut booking = booking_body(1, "2030-01-01", "10:00:00");
    booking["event_date"] = json!("tomorrow");
    let (status, body) = send(&app, "POST", "/api/bookings", Some(booking)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "event_date");
}

#[tokio::test]
async fn test_non_numeric_id_returns_json_error() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/venues/abc", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
    assert_eq!(body["field"], "id");
}

#[tokio::test]
async fn test_put_requires_every_field() {
    let app = app();
    let venue_id = create_venue(&app, "Arena", 10).await;
    let (_, seat) = create_seat(&app, venue_id, "A1").await;
    let seat_id = seat["id"].as_i64().unwrap();

    // Частичное тело подходит только для PATCH
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/venues/{venue_id}"),
        Some(json!({"location": "Elsewhere"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "name");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/seats/{seat_id}"),
        Some(json!({"seat_number": "B1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "price");

    let (_, seat) = send(&app, "GET", &format!("/api/seats/{seat_id}"), None).await;
    assert_eq!(seat["seat_number"], "A1");

    let (status, venue) = send(
        &app,
        "PUT",
        &format!("/api/venues/{venue_id}"),
        Some(json!({"name": "Arena", "location": "Elsewhere", "capacity": 20})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(venue["location"], "Elsewhere");
    assert_eq!(venue["capacity"], 20);
}
