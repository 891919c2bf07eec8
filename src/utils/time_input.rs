//! Time-of-day values as they arrive from clients and configuration.
//!
//! Every accepted encoding funnels through [`normalize_time`], so handlers
//! only ever see a `NaiveTime`.

use chrono::{DateTime, NaiveDateTime, NaiveTime};
use serde::Deserialize;

const CLOCK_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];
const TWELVE_HOUR_FORMATS: &[&str] = &["%I:%M %p", "%I:%M%p", "%I:%M:%S %p", "%I:%M:%S%p"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A time of day either as text or as separate fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TimeInput {
    Text(String),
    Parts {
        hour: u32,
        minute: u32,
        #[serde(default)]
        second: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid time value: {0}")]
pub struct InvalidTime(pub String);

pub fn normalize_time(input: &TimeInput) -> Result<NaiveTime, InvalidTime> {
    match input {
        TimeInput::Text(raw) => parse_time_text(raw),
        TimeInput::Parts {
            hour,
            minute,
            second,
        } => NaiveTime::from_hms_opt(*hour, *minute, second.unwrap_or(0)).ok_or_else(|| {
            InvalidTime(format!("{hour}:{minute}:{}", second.unwrap_or(0)))
        }),
    }
}

pub fn parse_time_text(raw: &str) -> Result<NaiveTime, InvalidTime> {
    let s = raw.trim();

    let clock = CLOCK_FORMATS
        .iter()
        .chain(TWELVE_HOUR_FORMATS)
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok());
    if let Some(t) = clock {
        return Ok(t);
    }

    // date-times with an offset or Z keep the wall time as written
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.time());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.time())
        .ok_or_else(|| InvalidTime(raw.to_string()))
}
