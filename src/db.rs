use sqlx::SqlitePool;

use crate::{
    errors::AppError,
    structs::{BookingRecord, Flight, User},
    utils,
};

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub async fn create_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let password_hash = utils::hash_password(password).map_err(|e| {
        log::error!("Failed to hash password: {}", e);
        AppError::Password(e.to_string())
    })?;
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Email already registered".to_string())
        } else {
            AppError::Database(e)
        }
    })?;
    log::info!("User created: {} ({})", user.user_id, user.email);
    Ok(user)
}

pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn get_user_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_all_flights(pool: &SqlitePool) -> Result<Vec<Flight>, sqlx::Error> {
    sqlx::query_as::<_, Flight>("SELECT * FROM flights ORDER BY date, departure_time")
        .fetch_all(pool)
        .await
}

/// Route search: case-insensitive substring match on both endpoints,
/// exact date, bookable flights only. `min_departure` narrows a
/// same-day search to departures still ahead of the clock.
pub async fn search_flights(
    pool: &SqlitePool,
    source: &str,
    destination: &str,
    date: &str,
    min_departure: Option<&str>,
) -> Result<Vec<Flight>, sqlx::Error> {
    let mut query = String::from(
        "SELECT * FROM flights \
         WHERE LOWER(source) LIKE LOWER($1) \
         AND LOWER(destination) LIKE LOWER($2) \
         AND date = $3 \
         AND available_seats > 0",
    );
    if min_departure.is_some() {
        query.push_str(" AND departure_time > $4");
    }
    query.push_str(" ORDER BY departure_time");

    let mut q = sqlx::query_as::<_, Flight>(&query)
        .bind(format!("%{}%", source))
        .bind(format!("%{}%", destination))
        .bind(date);
    if let Some(min_departure) = min_departure {
        q = q.bind(min_departure);
    }
    q.fetch_all(pool).await
}

pub struct NewFlight {
    pub flight_number: String,
    pub airline: Option<String>,
    pub aircraft: Option<String>,
    pub source: String,
    pub destination: String,
    pub date: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub price: f64,
    pub total_seats: i64,
}

/// Admin insert; every seat starts available.
pub async fn create_flight(pool: &SqlitePool, flight: &NewFlight) -> Result<i64, AppError> {
    let flight_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO flights (flight_number, airline, aircraft, source, destination, date, \
         departure_time, arrival_time, price, total_seats, available_seats) \
         VALUES ($1, COALESCE($2, 'Standard Air'), COALESCE($3, 'Boeing 737'), $4, $5, $6, $7, $8, $9, $10, $10) \
         RETURNING flight_id",
    )
    .bind(&flight.flight_number)
    .bind(&flight.airline)
    .bind(&flight.aircraft)
    .bind(&flight.source)
    .bind(&flight.destination)
    .bind(&flight.date)
    .bind(&flight.departure_time)
    .bind(&flight.arrival_time)
    .bind(flight.price)
    .bind(flight.total_seats)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Flight number already exists".to_string())
        } else {
            AppError::Database(e)
        }
    })?;
    log::info!(
        "Flight {} added: {} {} -> {}",
        flight_id,
        flight.flight_number,
        flight.source,
        flight.destination
    );
    Ok(flight_id)
}

/// Insert for generated inventory. A flight-number collision skips the
/// row instead of failing, so one duplicate never aborts a whole batch;
/// the caller decides whether to regenerate. Returns whether a row
/// landed.
pub async fn insert_generated_flight(
    pool: &SqlitePool,
    flight: &crate::flightgen::GeneratedFlight,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO flights (flight_number, airline, aircraft, source, destination, date, \
         departure_time, arrival_time, price, total_seats, available_seats) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT(flight_number) DO NOTHING",
    )
    .bind(&flight.flight_number)
    .bind(flight.airline)
    .bind(flight.aircraft)
    .bind(flight.source)
    .bind(flight.destination)
    .bind(&flight.date)
    .bind(&flight.departure_time)
    .bind(&flight.arrival_time)
    .bind(flight.price)
    .bind(flight.total_seats)
    .bind(flight.available_seats)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn count_flights(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM flights")
        .fetch_one(pool)
        .await
}

pub async fn count_future_flights(pool: &SqlitePool, today: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM flights WHERE date >= $1")
        .bind(today)
        .fetch_one(pool)
        .await
}

pub async fn get_user_bookings(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<BookingRecord>, sqlx::Error> {
    sqlx::query_as::<_, BookingRecord>(
        "SELECT b.booking_id, b.user_id, b.flight_id, b.seats_booked, b.booking_class, \
         b.seat_numbers, b.passenger_names, b.total_price, b.booking_date, b.status, \
         f.flight_number, f.source, f.destination, f.date, f.departure_time, f.arrival_time \
         FROM bookings b \
         JOIN flights f ON b.flight_id = f.flight_id \
         WHERE b.user_id = $1 \
         ORDER BY b.booking_date DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    use sqlx::sqlite::SqlitePoolOptions;

    // One connection: a fresh `sqlite::memory:` database per extra
    // connection would otherwise lose the schema.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    sqlx::migrate!().run(&pool).await.expect("migrations");
    pool
}

#[cfg(test)]
pub(crate) async fn insert_test_user(pool: &SqlitePool, email: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (name, email, password_hash) VALUES ('Test User', $1, 'unused') \
         RETURNING user_id",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .expect("insert user")
}

#[cfg(test)]
pub(crate) async fn insert_test_flight(
    pool: &SqlitePool,
    flight_number: &str,
    date: &str,
    departure_time: &str,
    price: f64,
    total_seats: i64,
    available_seats: i64,
) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO flights (flight_number, airline, aircraft, source, destination, date, \
         departure_time, arrival_time, price, total_seats, available_seats) \
         VALUES ($1, 'IndiGo', 'Airbus A320neo', 'Delhi (DEL)', 'Mumbai (BOM)', $2, $3, '11:30', $4, $5, $6) \
         RETURNING flight_id",
    )
    .bind(flight_number)
    .bind(date)
    .bind(departure_time)
    .bind(price)
    .bind(total_seats)
    .bind(available_seats)
    .fetch_one(pool)
    .await
    .expect("insert flight")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn duplicate_email_is_a_conflict_and_inserts_nothing() {
        let pool = test_pool().await;
        create_user(&pool, "Asha", "asha@example.com", "secret-pw")
            .await
            .unwrap();
        let err = create_user(&pool, "Asha Again", "asha@example.com", "other-pw")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(users, 1);
    }

    #[actix_web::test]
    async fn search_matches_substring_case_insensitively() {
        let pool = test_pool().await;
        insert_test_flight(&pool, "6E101", "2031-01-10", "09:00", 4000.0, 180, 100).await;

        let hits = search_flights(&pool, "delhi", "mumbai", "2031-01-10", None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].flight_number, "6E101");

        let misses = search_flights(&pool, "delhi", "mumbai", "2031-01-11", None)
            .await
            .unwrap();
        assert!(misses.is_empty());
    }

    #[actix_web::test]
    async fn same_day_search_hides_departed_flights() {
        let pool = test_pool().await;
        insert_test_flight(&pool, "6E201", "2031-01-10", "08:00", 4000.0, 180, 100).await;
        insert_test_flight(&pool, "6E202", "2031-01-10", "18:00", 4000.0, 180, 100).await;

        let hits = search_flights(&pool, "delhi", "mumbai", "2031-01-10", Some("12:00"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].flight_number, "6E202");
    }

    #[actix_web::test]
    async fn sold_out_flights_never_show_in_search() {
        let pool = test_pool().await;
        insert_test_flight(&pool, "6E301", "2031-01-10", "09:00", 4000.0, 180, 0).await;

        let hits = search_flights(&pool, "Delhi", "Mumbai", "2031-01-10", None)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[actix_web::test]
    async fn duplicate_flight_number_is_a_conflict() {
        let pool = test_pool().await;
        let flight = NewFlight {
            flight_number: "AI999".to_string(),
            airline: None,
            aircraft: None,
            source: "Delhi (DEL)".to_string(),
            destination: "Goa (GOI)".to_string(),
            date: "2031-02-01".to_string(),
            departure_time: "10:00".to_string(),
            arrival_time: "12:00".to_string(),
            price: 5500.0,
            total_seats: 180,
        };
        create_flight(&pool, &flight).await.unwrap();
        let err = create_flight(&pool, &flight).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
