//! Column adapters between domain values and SQLite storage classes.
//!
//! Booleans are stored as `0`/`1` integers, identifiers as hyphenated UUID
//! text, dates as `YYYY-MM-DD`, times as `HH:MM:SS[.f]`, instants as RFC 3339.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{EnergyLevel, MoodLevel, TaskPriority};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";
const SHORT_TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Error)]
#[error("unknown {kind} value: {value}")]
struct UnknownVariant {
    kind: &'static str,
    value: String,
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub fn bool_to_sql(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub fn bool_from_sql(value: i64) -> bool {
    value != 0
}

pub fn date_to_sql(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn time_to_sql(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, SHORT_TIME_FORMAT))
        .ok()
}

pub fn get_bool(row: &Row<'_>, idx: usize) -> rusqlite::Result<bool> {
    Ok(bool_from_sql(row.get::<_, i64>(idx)?))
}

pub fn get_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

pub fn get_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

pub fn get_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

pub fn get_optional_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => NaiveDate::parse_from_str(&raw, DATE_FORMAT)
            .map(Some)
            .map_err(|e| conversion_error(idx, e)),
        None => Ok(None),
    }
}

pub fn get_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveTime> {
    let raw: String = row.get(idx)?;
    parse_time(&raw).ok_or_else(|| {
        conversion_error(
            idx,
            UnknownVariant {
                kind: "time",
                value: raw,
            },
        )
    })
}

pub fn get_priority(row: &Row<'_>, idx: usize) -> rusqlite::Result<TaskPriority> {
    let raw: String = row.get(idx)?;
    TaskPriority::from_str(&raw).ok_or_else(|| {
        conversion_error(
            idx,
            UnknownVariant {
                kind: "priority",
                value: raw,
            },
        )
    })
}

pub fn get_mood(row: &Row<'_>, idx: usize) -> rusqlite::Result<MoodLevel> {
    let raw: String = row.get(idx)?;
    MoodLevel::from_str(&raw).ok_or_else(|| {
        conversion_error(
            idx,
            UnknownVariant {
                kind: "mood level",
                value: raw,
            },
        )
    })
}

pub fn get_energy(row: &Row<'_>, idx: usize) -> rusqlite::Result<EnergyLevel> {
    let raw: String = row.get(idx)?;
    EnergyLevel::from_str(&raw).ok_or_else(|| {
        conversion_error(
            idx,
            UnknownVariant {
                kind: "energy level",
                value: raw,
            },
        )
    })
}
