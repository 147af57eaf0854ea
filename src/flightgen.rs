use chrono::{Duration, Local, NaiveDate};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sqlx::SqlitePool;

use crate::{db, errors::AppError, utils};

/// Keep at least this many future flights on hand.
pub const POOL_FLOOR: i64 = 500;

/// Days of schedule written by the first-time seed.
const SEED_HORIZON_DAYS: i64 = 60;

/// How often a regenerated flight number may collide before the row is
/// given up on.
const COLLISION_RETRIES: u32 = 5;

pub struct Airline {
    pub name: &'static str,
    pub code: &'static str,
    pub fleet: &'static [&'static str],
    /// Whether the carrier flies domestic routes at all. Long-haul-only
    /// carriers are skipped when a domestic flight is synthesized.
    pub domestic: bool,
}

pub const AIRLINES: &[Airline] = &[
    Airline { name: "Air India", code: "AI", fleet: &["Boeing 787 Dreamliner", "Boeing 777-300ER", "Airbus A321neo"], domestic: true },
    Airline { name: "IndiGo", code: "6E", fleet: &["Airbus A320neo", "Airbus A321neo"], domestic: true },
    Airline { name: "Vistara", code: "UK", fleet: &["Boeing 787-9", "Airbus A321neo"], domestic: true },
    Airline { name: "SpiceJet", code: "SG", fleet: &["Boeing 737 MAX", "Q400"], domestic: true },
    Airline { name: "Akasa Air", code: "QP", fleet: &["Boeing 737 MAX"], domestic: true },
    Airline { name: "Emirates", code: "EK", fleet: &["Airbus A380", "Boeing 777-300ER"], domestic: false },
    Airline { name: "British Airways", code: "BA", fleet: &["Boeing 787", "Airbus A350-1000"], domestic: false },
    Airline { name: "Lufthansa", code: "LH", fleet: &["Boeing 747-8", "Airbus A350"], domestic: false },
    Airline { name: "Singapore Airlines", code: "SQ", fleet: &["Airbus A350-900", "Boeing 787-10"], domestic: false },
    Airline { name: "Qatar Airways", code: "QR", fleet: &["Airbus A350-1000", "Boeing 777"], domestic: false },
];

pub const DOMESTIC_AIRPORTS: &[&str] = &[
    "Delhi (DEL)",
    "Mumbai (BOM)",
    "Bangalore (BLR)",
    "Chennai (MAA)",
    "Kolkata (CCU)",
    "Hyderabad (HYD)",
    "Pune (PNQ)",
    "Goa (GOI)",
    "Ahmedabad (AMD)",
    "Jaipur (JAI)",
];

pub const INTERNATIONAL_AIRPORTS: &[&str] = &[
    "Dubai (DXB)",
    "London (LHR)",
    "New York (JFK)",
    "Singapore (SIN)",
    "Bangkok (BKK)",
    "Paris (CDG)",
    "Frankfurt (FRA)",
    "Tokyo (HND)",
];

const CAPACITIES: &[i64] = &[150, 180, 220, 300];
const MINUTE_GRID: &[u32] = &[0, 5, 10, 15, 30, 45];

#[derive(Debug, Clone)]
pub struct GeneratedFlight {
    pub flight_number: String,
    pub airline: &'static str,
    pub aircraft: &'static str,
    pub source: &'static str,
    pub destination: &'static str,
    pub date: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub price: f64,
    pub total_seats: i64,
    pub available_seats: i64,
}

fn pick<'a, T: ?Sized>(rng: &mut impl Rng, items: &'a [&'a T]) -> &'a T {
    items[rng.gen_range(0..items.len())]
}

/// Synthesize one plausible flight for `date`. 70% of flights are
/// domestic; international routes always touch one domestic airport,
/// direction randomized.
pub fn synth_flight(rng: &mut impl Rng, date: NaiveDate) -> GeneratedFlight {
    let domestic = rng.gen_bool(0.7);

    let (source, destination, base_price, duration_range) = if domestic {
        let source = pick(rng, DOMESTIC_AIRPORTS);
        let destination = loop {
            let candidate = pick(rng, DOMESTIC_AIRPORTS);
            if candidate != source {
                break candidate;
            }
        };
        (source, destination, 3000i64, 90..=180i64)
    } else if rng.gen_bool(0.5) {
        (
            pick(rng, DOMESTIC_AIRPORTS),
            pick(rng, INTERNATIONAL_AIRPORTS),
            15000,
            240..=900,
        )
    } else {
        (
            pick(rng, INTERNATIONAL_AIRPORTS),
            pick(rng, DOMESTIC_AIRPORTS),
            15000,
            240..=900,
        )
    };

    let carriers: Vec<&Airline> = AIRLINES
        .iter()
        .filter(|a| !domestic || a.domestic)
        .collect();
    let airline = carriers[rng.gen_range(0..carriers.len())];
    let aircraft = pick(rng, airline.fleet);

    let flight_number = format!("{}{}", airline.code, rng.gen_range(100..=9999));

    let hour = rng.gen_range(0..24u32);
    let minute = MINUTE_GRID[rng.gen_range(0..MINUTE_GRID.len())];
    let departure_time = format!("{:02}:{:02}", hour, minute);

    let duration = rng.gen_range(duration_range);
    // Arrival is stored as a bare clock time; a flight landing past
    // midnight simply wraps.
    let arrival_minutes = (hour as i64 * 60 + minute as i64 + duration) % (24 * 60);
    let arrival_time = format!("{:02}:{:02}", arrival_minutes / 60, arrival_minutes % 60);

    let raw_price = base_price + duration * 10 + rng.gen_range(-500..=2000);
    let price = (raw_price as f64 / 10.0).round() * 10.0;

    let total_seats = CAPACITIES[rng.gen_range(0..CAPACITIES.len())];
    let available_seats = (total_seats as f64 * rng.gen_range(0.1..0.9)) as i64;

    GeneratedFlight {
        flight_number,
        airline: airline.name,
        aircraft,
        source,
        destination,
        date: date.format("%Y-%m-%d").to_string(),
        departure_time,
        arrival_time,
        price,
        total_seats,
        available_seats,
    }
}

/// Insert one synthesized flight for `date`, regenerating on a
/// flight-number collision up to the retry budget.
async fn insert_with_retry(
    pool: &SqlitePool,
    rng: &mut StdRng,
    date: NaiveDate,
) -> Result<bool, AppError> {
    for attempt in 0..=COLLISION_RETRIES {
        let flight = synth_flight(rng, date);
        if db::insert_generated_flight(pool, &flight).await? {
            return Ok(true);
        }
        log::debug!(
            "Flight number {} collided (attempt {}), regenerating",
            flight.flight_number,
            attempt + 1
        );
    }
    log::warn!(
        "Gave up after {} flight-number collisions for {}",
        COLLISION_RETRIES + 1,
        date
    );
    Ok(false)
}

/// Top-up path: scatter `count` flights over the next 45 days.
pub async fn generate_flights(pool: &SqlitePool, count: i64) -> Result<i64, AppError> {
    let today = Local::now().date_naive();
    let mut rng = StdRng::from_entropy();
    let mut inserted = 0;
    for _ in 0..count {
        let date = today + Duration::days(rng.gen_range(1..=45));
        if insert_with_retry(pool, &mut rng, date).await? {
            inserted += 1;
        }
    }
    log::info!("Generated {} new flights", inserted);
    Ok(inserted)
}

/// First-time seed: a 60-day schedule of 20-30 flights per day, plus
/// the demo admin account.
pub async fn seed_flights(pool: &SqlitePool) -> Result<i64, AppError> {
    let today = Local::now().date_naive();
    let mut rng = StdRng::from_entropy();
    let mut inserted = 0;
    for day_offset in 0..SEED_HORIZON_DAYS {
        let date = today + Duration::days(day_offset);
        let flights_today = rng.gen_range(20..=30);
        for _ in 0..flights_today {
            if insert_with_retry(pool, &mut rng, date).await? {
                inserted += 1;
            }
        }
    }

    let admin_hash = utils::hash_password("admin123").map_err(|e| {
        log::error!("Failed to hash admin password: {}", e);
        AppError::Password(e.to_string())
    })?;
    sqlx::query(
        "INSERT INTO users (name, email, password_hash, is_admin) VALUES ($1, $2, $3, 1) \
         ON CONFLICT(email) DO NOTHING",
    )
    .bind("Admin User")
    .bind("admin@flight.com")
    .bind(admin_hash)
    .execute(pool)
    .await?;

    log::info!("Seeded {} flights across {} days", inserted, SEED_HORIZON_DAYS);
    Ok(inserted)
}

/// Startup maintenance: seed an empty store, otherwise top the pool
/// back up to the floor. The caller logs and swallows any error so a
/// generator failure never blocks boot.
pub async fn maintain_pool(pool: &SqlitePool) -> Result<(), AppError> {
    if db::count_flights(pool).await? == 0 {
        log::info!("Empty flight store, running first-time seed");
        seed_flights(pool).await?;
        return Ok(());
    }

    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    let future = db::count_future_flights(pool, &today).await?;
    log::info!("Current valid flights: {}", future);
    if future < POOL_FLOOR {
        let needed = POOL_FLOOR - future;
        log::info!("Flight pool low, generating {} new flights", needed);
        generate_flights(pool, needed).await?;
    }
    Ok(())
}
