use actix_identity::Identity;
use actix_web::{
    get, post,
    web::{self, Data},
    HttpMessage, HttpRequest, HttpResponse, Responder,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use crate::{
    booking::{book_flight, BookingClass, SeatOrder},
    db,
    errors::AppError,
    structs::SessionUser,
    utils, AppState,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(signup_handler)
        .service(login_handler)
        .service(logout_handler)
        .service(check_auth_handler)
        .service(search_flights_handler)
        .service(list_flights_handler)
        .service(add_flight_handler)
        .service(create_booking_handler)
        .service(booking_history_handler);
}

/// Resolves the identity cookie to typed claims, refusing stale or
/// absent sessions.
async fn require_user(
    identity: Option<Identity>,
    state: &AppState,
) -> Result<SessionUser, AppError> {
    let identity =
        identity.ok_or_else(|| AppError::Unauthenticated("Please login first".to_string()))?;
    let user_id: i64 = identity
        .id()?
        .parse()
        .map_err(|_| AppError::Unauthenticated("Invalid session".to_string()))?;
    let user = db::get_user_by_id(&state.db_pool, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Invalid session".to_string()))?;
    Ok(SessionUser {
        user_id: user.user_id,
        name: user.name,
        email: user.email,
        is_admin: user.is_admin,
    })
}

#[derive(Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[post("/api/signup")]
pub async fn signup_handler(
    payload: web::Json<SignupRequest>,
    state: Data<AppState>,
    request: HttpRequest,
) -> Result<impl Responder, AppError> {
    let name = payload.name.trim();
    let email = payload.email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation("All fields are required".to_string()));
    }
    if payload.password.len() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let user = db::create_user(&state.db_pool, name, &email, &payload.password).await?;

    Identity::login(&request.extensions(), user.user_id.to_string())?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Registration successful",
        "user": { "id": user.user_id, "name": user.name, "email": user.email }
    })))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[post("/api/login")]
pub async fn login_handler(
    payload: web::Json<LoginRequest>,
    state: Data<AppState>,
    request: HttpRequest,
) -> Result<impl Responder, AppError> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let user = db::get_user_by_email(&state.db_pool, &email).await?;
    match user {
        Some(user) if utils::verify_password(&payload.password, &user.password_hash) => {
            Identity::login(&request.extensions(), user.user_id.to_string())?;
            Ok(HttpResponse::Ok().json(json!({
                "message": "Login successful",
                "user": {
                    "id": user.user_id,
                    "name": user.name,
                    "email": user.email,
                    "is_admin": user.is_admin
                }
            })))
        }
        // One message for both a missing account and a wrong password.
        _ => Err(AppError::Unauthenticated(
            "Invalid email or password".to_string(),
        )),
    }
}

#[get("/api/logout")]
pub async fn logout_handler(identity: Option<Identity>) -> impl Responder {
    if let Some(identity) = identity {
        identity.logout();
    }
    HttpResponse::Ok().json(json!({ "message": "Logout successful" }))
}

#[get("/api/check-auth")]
pub async fn check_auth_handler(
    identity: Option<Identity>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    match require_user(identity, &state).await {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({
            "authenticated": true,
            "user": {
                "id": user.user_id,
                "name": user.name,
                "email": user.email,
                "is_admin": user.is_admin
            }
        }))),
        Err(AppError::Unauthenticated(_)) | Err(AppError::Identity(_)) => {
            Ok(HttpResponse::Ok().json(json!({ "authenticated": false })))
        }
        Err(e) => Err(e),
    }
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    source: String,
    #[serde(default)]
    destination: String,
    #[serde(default)]
    date: String,
}

#[get("/api/flights/search")]
pub async fn search_flights_handler(
    query: web::Query<SearchQuery>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let source = query.source.trim();
    let destination = query.destination.trim();
    let date = query.date.trim();
    if source.is_empty() || destination.is_empty() || date.is_empty() {
        return Err(AppError::Validation(
            "Source, destination, and date are required".to_string(),
        ));
    }

    let now = Local::now();
    let today = now.format("%Y-%m-%d").to_string();

    // Past dates have nothing bookable by definition.
    if *date < *today {
        return Ok(HttpResponse::Ok().json(json!({ "flights": [] })));
    }

    // A same-day search only shows flights still ahead of the clock.
    let current_time = now.format("%H:%M").to_string();
    let min_departure = (date == today).then_some(current_time.as_str());

    let flights =
        db::search_flights(&state.db_pool, source, destination, date, min_departure).await?;
    Ok(HttpResponse::Ok().json(json!({ "flights": flights })))
}

#[get("/api/flights")]
pub async fn list_flights_handler(state: Data<AppState>) -> Result<impl Responder, AppError> {
    let flights = db::get_all_flights(&state.db_pool).await?;
    Ok(HttpResponse::Ok().json(json!({ "flights": flights })))
}

#[derive(Deserialize)]
pub struct AddFlightRequest {
    #[serde(default)]
    flight_number: String,
    airline: Option<String>,
    aircraft: Option<String>,
    #[serde(default)]
    source: String,
    #[serde(default)]
    destination: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    departure_time: String,
    #[serde(default)]
    arrival_time: String,
    price: Option<f64>,
    total_seats: Option<i64>,
}

#[post("/api/flights")]
pub async fn add_flight_handler(
    payload: web::Json<AddFlightRequest>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let user = require_user(identity, &state).await?;
    if !user.is_admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    let required = [
        ("flight_number", &payload.flight_number),
        ("source", &payload.source),
        ("destination", &payload.destination),
        ("date", &payload.date),
        ("departure_time", &payload.departure_time),
        ("arrival_time", &payload.arrival_time),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{} is required", field)));
        }
    }
    let price = payload
        .price
        .ok_or_else(|| AppError::Validation("price is required".to_string()))?;
    let total_seats = payload
        .total_seats
        .ok_or_else(|| AppError::Validation("total_seats is required".to_string()))?;
    if total_seats < 1 {
        return Err(AppError::Validation(
            "total_seats must be at least 1".to_string(),
        ));
    }

    let flight = db::NewFlight {
        flight_number: payload.flight_number.trim().to_string(),
        airline: payload.airline.clone(),
        aircraft: payload.aircraft.clone(),
        source: payload.source.trim().to_string(),
        destination: payload.destination.trim().to_string(),
        date: payload.date.trim().to_string(),
        departure_time: payload.departure_time.trim().to_string(),
        arrival_time: payload.arrival_time.trim().to_string(),
        price,
        total_seats,
    };
    let flight_id = db::create_flight(&state.db_pool, &flight).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Flight added successfully",
        "flight_id": flight_id
    })))
}

#[derive(Deserialize)]
pub struct BookingRequest {
    flight_id: Option<i64>,
    seats_booked: Option<i64>,
    #[serde(default)]
    passenger_names: String,
    #[serde(default = "default_booking_class")]
    booking_class: String,
    #[serde(default)]
    seat_numbers: String,
}

fn default_booking_class() -> String {
    "Economy".to_string()
}

#[post("/api/bookings")]
pub async fn create_booking_handler(
    payload: web::Json<BookingRequest>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let user = require_user(identity, &state).await?;

    let (Some(flight_id), Some(seats_booked)) = (payload.flight_id, payload.seats_booked) else {
        return Err(AppError::Validation(
            "Flight ID and number of seats are required".to_string(),
        ));
    };

    let order = SeatOrder {
        flight_id,
        seats: seats_booked,
        class: BookingClass::parse(&payload.booking_class),
        passenger_names: payload.passenger_names.clone(),
        seat_numbers: payload.seat_numbers.clone(),
    };
    let confirmation = book_flight(&state.db_pool, user.user_id, &order).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Booking confirmed successfully",
        "booking_id": confirmation.booking_id,
        "total_price": confirmation.total_price,
        "seats_booked": confirmation.seats_booked
    })))
}

#[get("/api/bookings/history")]
pub async fn booking_history_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let user = require_user(identity, &state).await?;
    let bookings = db::get_user_bookings(&state.db_pool, user.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "bookings": bookings })))
}
