use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::slots::generate_slots;
use crate::ScheduleError;

/// `HH:MM` (de)serialization for `NaiveTime`, the wire form the dashboard
/// and the scheduling API exchange.
pub mod hhmm {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:02}:{:02}", time.hour(), time.minute()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M").map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => super::serialize(time, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            raw.map(|raw| {
                NaiveTime::parse_from_str(&raw, "%H:%M").map_err(serde::de::Error::custom)
            })
            .transpose()
        }
    }
}

/// Parses a zero-padded 24-hour `HH:MM` string at the boundary where data
/// enters from the API client or a query parameter.
pub fn parse_hhmm(raw: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| ScheduleError::InvalidTime(raw.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayKind {
    Working,
    Weekend,
    Holiday,
}

/// One bookable interval within a day. `end - start` equals the slot
/// duration that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

/// One day's schedule configuration. `slots` is derived from the bounds
/// and duration, never authoritative on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub kind: DayKind,
    #[serde(default, with = "hhmm::option", skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveTime>,
    #[serde(default, with = "hhmm::option", skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<Slot>,
}

/// Per-date schedule lookup, keyed by civil date (`YYYY-MM-DD` on the
/// wire). Owned by the caller; the engine only reads it.
pub type AvailabilityMap = HashMap<NaiveDate, DayAvailability>;

impl DayAvailability {
    pub fn working(
        start: NaiveTime,
        end: NaiveTime,
        slot_duration: u32,
    ) -> Result<Self, ScheduleError> {
        Self::open(DayKind::Working, start, end, slot_duration)
    }

    pub fn weekend(
        start: NaiveTime,
        end: NaiveTime,
        slot_duration: u32,
    ) -> Result<Self, ScheduleError> {
        Self::open(DayKind::Weekend, start, end, slot_duration)
    }

    fn open(
        kind: DayKind,
        start: NaiveTime,
        end: NaiveTime,
        slot_duration: u32,
    ) -> Result<Self, ScheduleError> {
        if start >= end {
            return Err(ScheduleError::InvalidRange { start, end });
        }

        let slots = generate_slots(start, end, i64::from(slot_duration))?;

        Ok(Self {
            kind,
            start: Some(start),
            end: Some(end),
            slot_duration: Some(slot_duration),
            description: None,
            slots,
        })
    }

    pub fn holiday<S: Into<String>>(description: S) -> Self {
        Self {
            kind: DayKind::Holiday,
            start: None,
            end: None,
            slot_duration: None,
            description: Some(description.into()),
            slots: Vec::new(),
        }
    }

    /// Default applied to dates missing from the availability map: a
    /// working day, 10:00-18:00, 60-minute slots.
    pub fn fallback() -> Self {
        // Literal times, cannot fail.
        let start = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        Self::working(start, end, 60).unwrap()
    }

    /// Checks the invariants that hold for well-formed map entries:
    /// bounds are ordered on open days and the slot duration is positive.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.kind != DayKind::Holiday {
            if let (Some(start), Some(end)) = (self.start, self.end) {
                if start >= end {
                    return Err(ScheduleError::InvalidRange { start, end });
                }
            }
        }

        if self.slot_duration == Some(0) {
            return Err(ScheduleError::InvalidDuration(0));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn working_day_derives_slots() {
        let day = DayAvailability::working(hm(9, 0), hm(11, 0), 60).unwrap();
        assert_eq!(day.kind, DayKind::Working);
        assert_eq!(day.slots.len(), 2);
        assert_eq!(day.slots[0].start, hm(9, 0));
        assert_eq!(day.slots[1].end, hm(11, 0));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = DayAvailability::working(hm(17, 0), hm(9, 0), 60).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::InvalidRange {
                start: hm(17, 0),
                end: hm(9, 0),
            }
        );
    }

    #[test]
    fn validate_flags_zero_duration() {
        let mut day = DayAvailability::working(hm(9, 0), hm(17, 0), 60).unwrap();
        day.slot_duration = Some(0);
        assert_eq!(day.validate(), Err(ScheduleError::InvalidDuration(0)));
    }

    #[test]
    fn parse_hhmm_rejects_garbage() {
        assert!(parse_hhmm("09:00").is_ok());
        assert_eq!(
            parse_hhmm("25:99"),
            Err(ScheduleError::InvalidTime("25:99".to_string()))
        );
        assert!(parse_hhmm("noon").is_err());
    }

    #[test]
    fn times_serialize_as_hhmm() {
        let day = DayAvailability::working(hm(9, 30), hm(10, 30), 30).unwrap();
        let json = serde_json::to_value(&day).unwrap();
        assert_eq!(json["start"], "09:30");
        assert_eq!(json["end"], "10:30");
        assert_eq!(json["slots"][0]["end"], "10:00");

        let back: DayAvailability = serde_json::from_value(json).unwrap();
        assert_eq!(back, day);
    }

    #[test]
    fn holiday_carries_description_only() {
        let day = DayAvailability::holiday("Christmas");
        assert_eq!(day.kind, DayKind::Holiday);
        assert_eq!(day.description.as_deref(), Some("Christmas"));
        assert!(day.start.is_none());
        assert!(day.slots.is_empty());
        assert!(day.validate().is_ok());
    }
}
