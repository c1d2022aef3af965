use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;
use tracing::{debug, trace};

use crate::availability::{AvailabilityMap, DayAvailability};
use crate::ScheduleError;

/// The month grid is always rendered as 6 rows of 7 days, Sunday first.
pub const GRID_WEEKS: usize = 6;
pub const DAYS_PER_WEEK: usize = 7;

fn first_of_month(month: u32, year: i32) -> Result<NaiveDate, ScheduleError> {
    if !(1..=12).contains(&month) {
        return Err(ScheduleError::InvalidMonth(month));
    }

    NaiveDate::from_ymd_opt(year, month, 1).ok_or(ScheduleError::InvalidDate {
        year,
        month,
        day: 1,
    })
}

fn days_in_month(month: u32, year: i32) -> Result<i64, ScheduleError> {
    let first = first_of_month(month, year)?;
    let next = if month == 12 {
        first_of_month(1, year + 1)?
    } else {
        first_of_month(month + 1, year)?
    };
    Ok((next - first).num_days())
}

/// Day offset of `date` from the grid's first cell, `week_start_date(0, ..)`.
///
/// Both [`week_index_for_date`] and the per-cell index in [`month_grid`]
/// divide this same offset by 7, so the calendar view and the week view
/// cannot disagree about which row a date belongs to.
fn grid_offset(date: NaiveDate, month: u32, year: i32) -> Result<i64, ScheduleError> {
    Ok((date - week_start_date(0, month, year)?).num_days())
}

/// Sunday starting week `week_index` of the grid for `(month, year)`.
///
/// Week 0 is the week containing the 1st, which may start in the previous
/// month. `week_index` is not clamped to the month: out-of-range values
/// resolve to Sundays far outside it, and callers clamp using
/// [`total_weeks_in_month`] (see [`WeekCursor`]). Indices that would step
/// past the representable date range fail with
/// [`ScheduleError::InvalidDate`] instead of panicking.
pub fn week_start_date(
    week_index: i64,
    month: u32,
    year: i32,
) -> Result<NaiveDate, ScheduleError> {
    let first = first_of_month(month, year)?;
    let lead = i64::from(first.weekday().num_days_from_sunday());

    let start = week_index
        .checked_mul(7)
        .and_then(|days| days.checked_sub(lead))
        .and_then(Duration::try_days)
        .and_then(|offset| first.checked_add_signed(offset))
        .ok_or(ScheduleError::InvalidDate {
            year,
            month,
            day: 1,
        })?;

    trace!(%start, week_index, month, year, "resolved week start");
    Ok(start)
}

/// Grid row of `date` within the grid for `(month, year)`.
///
/// Exact inverse of the partition [`week_start_date`] induces: for any date
/// in the month, `week_start_date(week_index_for_date(d)) <= d` and the gap
/// is under 7 days. Dates before the grid's first Sunday clamp to row 0.
pub fn week_index_for_date(
    date: NaiveDate,
    month: u32,
    year: i32,
) -> Result<u32, ScheduleError> {
    let offset = grid_offset(date, month, year)?;
    Ok(offset.div_euclid(7).max(0) as u32)
}

/// Number of Sunday-aligned week rows needed to cover the month, from the
/// week of the 1st through the week of the last day. 5 or 6 for almost every
/// month; 4 only for a 28-day February beginning on a Sunday.
pub fn total_weeks_in_month(month: u32, year: i32) -> Result<u32, ScheduleError> {
    let first = first_of_month(month, year)?;
    let lead = i64::from(first.weekday().num_days_from_sunday());
    let days = days_in_month(month, year)?;
    Ok(((lead + days + 6) / 7) as u32)
}

/// One cell of the 6x7 month grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCell {
    pub date: NaiveDate,
    pub day_number: u32,
    pub week_index: u32,
    pub is_current_month: bool,
    pub is_today: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<DayAvailability>,
}

/// Lays out the full 42-cell grid for `(month, year)`, starting at
/// `week_start_date(0, ..)`.
///
/// Leading and trailing cells from adjacent months are flagged
/// `is_current_month = false` but still carry availability from the map, so
/// their indicators render. `today` is injected by the caller; the grid
/// never reads a clock.
pub fn month_grid(
    month: u32,
    year: i32,
    availability: &AvailabilityMap,
    today: NaiveDate,
) -> Result<Vec<GridCell>, ScheduleError> {
    let start = week_start_date(0, month, year)?;
    debug!(%start, month, year, "building month grid");

    let mut cells = Vec::with_capacity(GRID_WEEKS * DAYS_PER_WEEK);
    for offset in 0..(GRID_WEEKS * DAYS_PER_WEEK) as i64 {
        let date = start + Duration::days(offset);
        cells.push(GridCell {
            date,
            day_number: date.day(),
            week_index: (offset / 7) as u32,
            is_current_month: date.month() == month && date.year() == year,
            is_today: date == today,
            availability: availability.get(&date).cloned(),
        });
    }

    Ok(cells)
}

/// One day of a materialized week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekDay {
    pub day_name: &'static str,
    pub date: NaiveDate,
    pub availability: DayAvailability,
    pub is_current_month: bool,
}

fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

/// Materializes the 7 days of week `week_index`, Sunday through Saturday.
///
/// Dates missing from the map get a clone of `fallback` instead of being
/// left unset; an absent lookup never means "no schedule" to the caller.
pub fn week_days(
    week_index: i64,
    month: u32,
    year: i32,
    availability: &AvailabilityMap,
    fallback: &DayAvailability,
) -> Result<Vec<WeekDay>, ScheduleError> {
    let start = week_start_date(week_index, month, year)?;
    debug!(%start, week_index, month, year, "materializing week");

    let mut days = Vec::with_capacity(DAYS_PER_WEEK);
    for offset in 0..DAYS_PER_WEEK as i64 {
        let date = start + Duration::days(offset);
        days.push(WeekDay {
            day_name: day_name(date.weekday()),
            date,
            availability: availability
                .get(&date)
                .cloned()
                .unwrap_or_else(|| fallback.clone()),
            is_current_month: date.month() == month && date.year() == year,
        });
    }

    Ok(days)
}

/// Position of the week view: a month plus a row of its grid.
///
/// Stepping off either end of the month wraps to the adjacent month, which
/// is where out-of-range week indices get clamped away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekCursor {
    pub year: i32,
    pub month: u32,
    pub week_index: u32,
}

impl WeekCursor {
    pub fn new(year: i32, month: u32, week_index: u32) -> Result<Self, ScheduleError> {
        first_of_month(month, year)?;
        Ok(Self {
            year,
            month,
            week_index,
        })
    }

    /// The Sunday this cursor's week starts on.
    pub fn start(&self) -> Result<NaiveDate, ScheduleError> {
        week_start_date(i64::from(self.week_index), self.month, self.year)
    }

    /// Moves one week back, wrapping to the last week of the previous month
    /// when leaving week 0. The boundary week straddling both months is
    /// reachable from either side.
    pub fn prev(self) -> Result<Self, ScheduleError> {
        if self.week_index > 0 {
            return Ok(Self {
                week_index: self.week_index - 1,
                ..self
            });
        }

        let (year, month) = if self.month == 1 {
            (self.year - 1, 12)
        } else {
            (self.year, self.month - 1)
        };

        Ok(Self {
            year,
            month,
            week_index: total_weeks_in_month(month, year)? - 1,
        })
    }

    /// Moves one week forward, wrapping to week 0 of the next month past the
    /// last row.
    pub fn next(self) -> Result<Self, ScheduleError> {
        if self.week_index + 1 < total_weeks_in_month(self.month, self.year)? {
            return Ok(Self {
                week_index: self.week_index + 1,
                ..self
            });
        }

        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };

        Ok(Self {
            year,
            month,
            week_index: 0,
        })
    }
}
