use serde::Serialize;
use sqlx::SqlitePool;

use crate::errors::AppError;

/// Fare class. Anything unrecognized books as Economy rather than
/// failing validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingClass {
    Economy,
    Business,
    First,
}

impl BookingClass {
    pub fn parse(s: &str) -> Self {
        match s {
            "Business" => BookingClass::Business,
            "First" => BookingClass::First,
            _ => BookingClass::Economy,
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            BookingClass::Economy => 1.0,
            BookingClass::Business => 2.5,
            BookingClass::First => 4.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingClass::Economy => "Economy",
            BookingClass::Business => "Business",
            BookingClass::First => "First",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeatOrder {
    pub flight_id: i64,
    pub seats: i64,
    pub class: BookingClass,
    pub passenger_names: String,
    pub seat_numbers: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Confirmation {
    pub booking_id: i64,
    pub total_price: f64,
    pub seats_booked: i64,
}

pub fn total_price(base_price: f64, class: BookingClass, seats: i64) -> f64 {
    base_price * class.multiplier() * seats as f64
}

/// Books seats on a flight for `user_id`.
///
/// The availability check and the decrement are a single conditional
/// UPDATE, so two concurrent orders can never both pass a stale check
/// and oversell the flight. The booking insert shares the transaction
/// with the decrement; a failure on either side rolls both back.
pub async fn book_flight(
    pool: &SqlitePool,
    user_id: i64,
    order: &SeatOrder,
) -> Result<Confirmation, AppError> {
    if order.seats < 1 {
        return Err(AppError::Validation(
            "At least 1 seat must be booked".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let base_price: Option<f64> = sqlx::query_scalar(
        "UPDATE flights SET available_seats = available_seats - $1 \
         WHERE flight_id = $2 AND available_seats >= $1 \
         RETURNING price",
    )
    .bind(order.seats)
    .bind(order.flight_id)
    .fetch_optional(&mut *tx)
    .await?;

    let base_price = match base_price {
        Some(price) => price,
        None => {
            // Nothing was written; dropping the transaction rolls back.
            let remaining: Option<i64> =
                sqlx::query_scalar("SELECT available_seats FROM flights WHERE flight_id = $1")
                    .bind(order.flight_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            return match remaining {
                None => Err(AppError::NotFound("Flight not found".to_string())),
                Some(remaining) => Err(AppError::InsufficientSeats { remaining }),
            };
        }
    };

    let total_price = total_price(base_price, order.class, order.seats);
    let booking_date = chrono::Utc::now().to_string();

    let booking_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO bookings (user_id, flight_id, seats_booked, booking_class, seat_numbers, \
         passenger_names, total_price, booking_date) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING booking_id",
    )
    .bind(user_id)
    .bind(order.flight_id)
    .bind(order.seats)
    .bind(order.class.as_str())
    .bind(&order.seat_numbers)
    .bind(&order.passenger_names)
    .bind(total_price)
    .bind(&booking_date)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    log::info!(
        "Booking {} confirmed: user {} took {} seat(s) on flight {}",
        booking_id,
        user_id,
        order.seats,
        order.flight_id
    );

    Ok(Confirmation {
        booking_id,
        total_price,
        seats_booked: order.seats,
    })
}
