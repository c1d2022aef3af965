//! Calendar and slot derivation engine for the garage scheduling dashboard.
//!
//! Everything in this crate is pure date arithmetic over `chrono` civil
//! dates: resolving Sunday-aligned week boundaries, laying out the 6x7
//! month grid, materializing a week of availability, and cutting a time
//! range into appointment slots. Fetching and persisting schedules is the
//! job of the service crate; nothing here performs I/O or reads a clock.

pub mod availability;
pub mod calendar;
pub mod slots;

pub use availability::{parse_hhmm, AvailabilityMap, DayAvailability, DayKind, Slot};
pub use calendar::{
    month_grid, total_weeks_in_month, week_days, week_index_for_date, week_start_date, GridCell,
    WeekCursor, WeekDay,
};
pub use slots::generate_slots;

use chrono::NaiveTime;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    #[error("no such date: {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("invalid HH:MM time: `{0}`")]
    InvalidTime(String),

    #[error("slot duration must be positive, got {0}")]
    InvalidDuration(i64),

    #[error("start time {start} is not before end time {end}")]
    InvalidRange { start: NaiveTime, end: NaiveTime },
}
