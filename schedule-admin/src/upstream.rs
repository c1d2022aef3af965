use anyhow::Context;
use chrono::{Datelike, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use tracing::warn;

use schedule_core::{parse_hhmm, AvailabilityMap, DayAvailability, DayKind};

/// Day classification as the scheduling API spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryKind {
    Open,
    Closed,
    Holiday,
}

/// One schedule row as returned and accepted by the scheduling API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub event_date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u8>,
}

impl ScheduleEntry {
    /// Validates the wire row and converts it into the engine's typed form.
    /// This is the boundary where loosely-typed API data becomes an
    /// `AvailabilityMap` value; anything malformed fails here, not deep in
    /// the date arithmetic.
    pub fn into_availability(self) -> anyhow::Result<DayAvailability> {
        match self.kind {
            EntryKind::Holiday => Ok(DayAvailability::holiday(
                self.description.unwrap_or_default(),
            )),
            EntryKind::Open | EntryKind::Closed => {
                let start = parse_hhmm(
                    self.start_time
                        .as_deref()
                        .context("open entry without start_time")?,
                )?;
                let end = parse_hhmm(
                    self.end_time
                        .as_deref()
                        .context("open entry without end_time")?,
                )?;
                let duration = self.slot_duration.unwrap_or(60);

                let availability = if self.kind == EntryKind::Open {
                    DayAvailability::working(start, end, duration)?
                } else {
                    DayAvailability::weekend(start, end, duration)?
                };
                Ok(availability)
            }
        }
    }

    pub fn from_availability(date: NaiveDate, availability: &DayAvailability) -> Self {
        let kind = match availability.kind {
            DayKind::Working => EntryKind::Open,
            DayKind::Weekend => EntryKind::Closed,
            DayKind::Holiday => EntryKind::Holiday,
        };

        Self {
            event_date: date,
            kind,
            start_time: availability
                .start
                .map(|t| format!("{:02}:{:02}", t.hour(), t.minute())),
            end_time: availability
                .end
                .map(|t| format!("{:02}:{:02}", t.hour(), t.minute())),
            slot_duration: availability.slot_duration,
            description: availability.description.clone(),
            is_recurring: false,
            day_of_week: Some(date.weekday().num_days_from_sunday() as u8),
        }
    }
}

pub struct UpstreamClient {
    base: String,
    http: reqwest::Client,
}

impl UpstreamClient {
    pub fn new<S: Into<String>>(base: S) -> Self {
        Self {
            base: base.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Fetches the schedule rows covering `[from, to]` and folds them into
    /// an availability map. Rows that fail validation are logged and
    /// skipped; one bad entry must not blank the whole calendar.
    pub async fn fetch_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<AvailabilityMap> {
        let url = format!("{}/schedules?from={from}&to={to}", self.base);

        let entries: Vec<ScheduleEntry> = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .context("scheduling API returned an error status")?
            .json()
            .await
            .context("scheduling API returned an invalid payload")?;

        let mut map = AvailabilityMap::new();
        for entry in entries {
            let date = entry.event_date;
            match entry.into_availability() {
                Ok(availability) => {
                    map.insert(date, availability);
                }
                Err(err) => warn!(%date, error = %err, "skipping invalid schedule entry"),
            }
        }

        Ok(map)
    }

    /// Persists one day's configuration.
    pub async fn put_day(
        &self,
        date: NaiveDate,
        availability: &DayAvailability,
    ) -> anyhow::Result<()> {
        let url = format!("{}/schedules/{date}", self.base);
        let entry = ScheduleEntry::from_availability(date, availability);

        self.http
            .put(&url)
            .json(&entry)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .context("scheduling API rejected the schedule update")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn entry(kind: EntryKind) -> ScheduleEntry {
        ScheduleEntry {
            event_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            kind,
            start_time: Some("09:00".to_string()),
            end_time: Some("17:00".to_string()),
            slot_duration: Some(60),
            description: None,
            is_recurring: false,
            day_of_week: None,
        }
    }

    #[test]
    fn open_entry_becomes_working_day_with_slots() {
        let availability = entry(EntryKind::Open).into_availability().unwrap();
        assert_eq!(availability.kind, DayKind::Working);
        assert_eq!(availability.slots.len(), 8);
        assert_eq!(
            availability.start,
            Some(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
        );
    }

    #[test]
    fn closed_entry_becomes_weekend() {
        let availability = entry(EntryKind::Closed).into_availability().unwrap();
        assert_eq!(availability.kind, DayKind::Weekend);
    }

    #[test]
    fn malformed_time_is_rejected_at_the_boundary() {
        let mut bad = entry(EntryKind::Open);
        bad.start_time = Some("9 o'clock".to_string());
        assert!(bad.into_availability().is_err());
    }

    #[test]
    fn inverted_range_is_rejected_at_the_boundary() {
        let mut bad = entry(EntryKind::Open);
        bad.start_time = Some("17:00".to_string());
        bad.end_time = Some("09:00".to_string());
        assert!(bad.into_availability().is_err());
    }

    #[test]
    fn missing_times_on_open_entry_are_rejected() {
        let mut bad = entry(EntryKind::Open);
        bad.start_time = None;
        assert!(bad.into_availability().is_err());
    }

    #[test]
    fn round_trip_preserves_the_wire_shape() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let availability = entry(EntryKind::Open).into_availability().unwrap();
        let back = ScheduleEntry::from_availability(date, &availability);

        assert_eq!(back.kind, EntryKind::Open);
        assert_eq!(back.start_time.as_deref(), Some("09:00"));
        assert_eq!(back.end_time.as_deref(), Some("17:00"));
        assert_eq!(back.slot_duration, Some(60));
        // Jan 15 2025 is a Wednesday.
        assert_eq!(back.day_of_week, Some(3));
    }

    #[test]
    fn holiday_entry_keeps_its_description() {
        let mut holiday = entry(EntryKind::Holiday);
        holiday.start_time = None;
        holiday.end_time = None;
        holiday.description = Some("Inventory day".to_string());

        let availability = holiday.into_availability().unwrap();
        assert_eq!(availability.kind, DayKind::Holiday);
        assert_eq!(availability.description.as_deref(), Some("Inventory day"));
    }
}
