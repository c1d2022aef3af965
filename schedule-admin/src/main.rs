mod cache;
mod cli;
mod upstream;

use std::{env, io, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, put},
    Json, Router,
};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use schedule_core::{
    generate_slots, month_grid, parse_hhmm, total_weeks_in_month, week_days, week_start_date,
    AvailabilityMap, DayAvailability,
};

use crate::cache::{Config as CacheConfig, MonthKey, ScheduleCache};
use crate::upstream::UpstreamClient;

struct App {
    cache: Arc<ScheduleCache>,
    upstream: UpstreamClient,
}

type AppState = Arc<App>;

#[tokio::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("schedule_admin=info,schedule_core=info")),
        )
        .init();

    let args = cli::parse(env::args().skip(1).collect());

    let app = Arc::new(App {
        cache: ScheduleCache::new(CacheConfig {
            enabled: args.enable_cache,
            ttl: args.cache_ttl,
        }),
        upstream: UpstreamClient::new(args.upstream),
    });

    let router = Router::new()
        .route("/calendar/month", get(handle_month))
        .route("/calendar/week", get(handle_week))
        .route("/slots", get(handle_slots))
        .route("/schedule/day", put(handle_put_day))
        .fallback(|| async { Redirect::permanent(env!("CARGO_PKG_REPOSITORY")) })
        .with_state(app);

    let listener = TcpListener::bind(args.address).await?;
    info!("listening at http://{}", args.address);
    axum::serve(listener, router).await
}

fn bad_request<E: std::fmt::Display>(err: E) -> Response {
    (StatusCode::BAD_REQUEST, err.to_string()).into_response()
}

fn bad_gateway(err: anyhow::Error) -> Response {
    error!(error = %err, "upstream request failed");
    (StatusCode::BAD_GATEWAY, format!("{err:#}")).into_response()
}

/// Months whose 42-cell grids can contain a given date: its own month and
/// both neighbors.
fn neighbors(key: MonthKey) -> [MonthKey; 3] {
    let (year, month) = key;
    let prev = if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    };
    let next = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    [prev, key, next]
}

/// Availability covering the whole 6x7 grid of `(year, month)`, cached per
/// month so the month and week views share one upstream fetch.
async fn grid_availability(
    app: &App,
    key: MonthKey,
    grid_start: NaiveDate,
) -> anyhow::Result<Arc<AvailabilityMap>> {
    if let Some(map) = app.cache.get(&key).await {
        return Ok(map);
    }

    let map = app
        .upstream
        .fetch_range(grid_start, grid_start + Duration::days(41))
        .await?;

    Ok(Arc::clone(&app.cache).insert(key, map).await)
}

#[derive(Deserialize)]
struct MonthQuery {
    year: i32,
    month: u32,
}

async fn handle_month(State(app): State<AppState>, Query(query): Query<MonthQuery>) -> Response {
    let grid_start = match week_start_date(0, query.month, query.year) {
        Ok(start) => start,
        Err(err) => return bad_request(err),
    };

    let availability =
        match grid_availability(&app, (query.year, query.month), grid_start).await {
            Ok(map) => map,
            Err(err) => return bad_gateway(err),
        };

    let today = Utc::now().date_naive();
    match month_grid(query.month, query.year, &availability, today) {
        Ok(cells) => Json(cells).into_response(),
        Err(err) => bad_request(err),
    }
}

#[derive(Deserialize)]
struct WeekQuery {
    year: i32,
    month: u32,
    week: i64,
}

/// Requested week indices land on the nearest row of the month's grid.
/// Rows past the end would fall outside the 42-day span the availability
/// fetch covered and come back as all-fallback days.
fn clamp_week(week: i64, total_weeks: u32) -> i64 {
    week.clamp(0, i64::from(total_weeks) - 1)
}

async fn handle_week(State(app): State<AppState>, Query(query): Query<WeekQuery>) -> Response {
    let grid_start = match week_start_date(0, query.month, query.year) {
        Ok(start) => start,
        Err(err) => return bad_request(err),
    };
    let total_weeks = match total_weeks_in_month(query.month, query.year) {
        Ok(total) => total,
        Err(err) => return bad_request(err),
    };

    let availability =
        match grid_availability(&app, (query.year, query.month), grid_start).await {
            Ok(map) => map,
            Err(err) => return bad_gateway(err),
        };

    match week_days(
        clamp_week(query.week, total_weeks),
        query.month,
        query.year,
        &availability,
        &DayAvailability::fallback(),
    ) {
        Ok(days) => Json(days).into_response(),
        Err(err) => bad_request(err),
    }
}

#[derive(Deserialize)]
struct SlotsQuery {
    start: String,
    end: String,
    duration: i64,
}

async fn handle_slots(Query(query): Query<SlotsQuery>) -> Response {
    let start = match parse_hhmm(&query.start) {
        Ok(time) => time,
        Err(err) => return bad_request(err),
    };
    let end = match parse_hhmm(&query.end) {
        Ok(time) => time,
        Err(err) => return bad_request(err),
    };

    match generate_slots(start, end, query.duration) {
        Ok(slots) => Json(slots).into_response(),
        Err(err) => bad_request(err),
    }
}

#[derive(Deserialize)]
struct DayUpdate {
    date: NaiveDate,
    availability: DayAvailability,
}

async fn handle_put_day(State(app): State<AppState>, Json(update): Json<DayUpdate>) -> Response {
    if let Err(err) = update.availability.validate() {
        return bad_request(err);
    }

    if let Err(err) = app.upstream.put_day(update.date, &update.availability).await {
        return bad_gateway(err);
    }

    for key in neighbors((update.date.year(), update.date.month())) {
        app.cache.invalidate(&key).await;
    }

    info!(date = %update.date, "schedule updated");
    StatusCode::NO_CONTENT.into_response()
}
