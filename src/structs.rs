use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct User {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: String,
}

/// date is `YYYY-MM-DD`, departure/arrival are `HH:MM` clock strings.
/// Arrival carries no date, so an overnight flight only stores its
/// arrival time-of-day.
#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Flight {
    pub flight_id: i64,
    pub flight_number: String,
    pub airline: String,
    pub aircraft: String,
    pub source: String,
    pub destination: String,
    pub date: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub price: f64,
    pub total_seats: i64,
    pub available_seats: i64,
    pub created_at: String,
}

/// A booking joined with the flight it reserves, as returned by the
/// booking-history listing.
#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct BookingRecord {
    pub booking_id: i64,
    pub user_id: i64,
    pub flight_id: i64,
    pub seats_booked: i64,
    pub booking_class: String,
    pub seat_numbers: Option<String>,
    pub passenger_names: String,
    pub total_price: f64,
    pub booking_date: String,
    pub status: String,
    pub flight_number: String,
    pub source: String,
    pub destination: String,
    pub date: String,
    pub departure_time: String,
    pub arrival_time: String,
}

/// Typed claims derived from the identity cookie, passed to anything
/// that needs to know who is calling.
#[derive(Serialize, Debug, Clone)]
pub struct SessionUser {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}
