use chrono::{NaiveTime, Timelike};
use tracing::trace;

use crate::availability::Slot;
use crate::ScheduleError;

/// Cuts `[start, end)` into contiguous slots of exactly `duration_minutes`.
///
/// Emission stops as soon as the next slot's end would pass `end`; there is
/// never a truncated final slot. An empty range, or a duration that does not
/// fit even once, yields an empty vec rather than an error. A non-positive
/// duration fails with [`ScheduleError::InvalidDuration`].
///
/// Slots are minute-granular, matching the `HH:MM` wire format: any seconds
/// carried by `start` or `end` are dropped, so the produced slots sit on the
/// containing minute.
pub fn generate_slots(
    start: NaiveTime,
    end: NaiveTime,
    duration_minutes: i64,
) -> Result<Vec<Slot>, ScheduleError> {
    if duration_minutes <= 0 {
        return Err(ScheduleError::InvalidDuration(duration_minutes));
    }

    let end_minutes = minutes_of(end);

    let mut slots = Vec::new();
    let mut cursor = minutes_of(start);
    while cursor + duration_minutes <= end_minutes {
        slots.push(Slot {
            start: from_minutes(cursor),
            end: from_minutes(cursor + duration_minutes),
        });
        cursor += duration_minutes;
    }

    trace!(%start, %end, duration_minutes, count = slots.len(), "generated slots");
    Ok(slots)
}

fn minutes_of(time: NaiveTime) -> i64 {
    i64::from(time.hour() * 60 + time.minute())
}

fn from_minutes(minutes: i64) -> NaiveTime {
    // Callers stay below 24:00; the guard in the loop guarantees it.
    NaiveTime::from_hms_opt((minutes / 60) as u32, (minutes % 60) as u32, 0)
        .unwrap_or(NaiveTime::MIN)
}
