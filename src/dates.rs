//! Resolves the configured `YYYYMMDD` start/end strings into the inclusive
//! sequence of days to import.

use chrono::NaiveDate;

use crate::error::{ImportError, Result};

/// Parses a compact 8-digit `YYYYMMDD` date string.
pub fn parse_compact_date(value: &str) -> Result<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ImportError::Config(format!(
            "date must be 8 digits (YYYYMMDD), got '{}'",
            value
        )));
    }

    let year: i32 = value[0..4].parse().expect("checked ascii digits");
    let month: u32 = value[4..6].parse().expect("checked ascii digits");
    let day: u32 = value[6..8].parse().expect("checked ascii digits");

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        ImportError::Config(format!("'{}' is not a real calendar date", value))
    })
}

/// Returns every day from `start` through `end`, both inclusive.
///
/// A reversed range is rejected; the legacy importer would have walked
/// forever past the end date instead.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
    if start > end {
        return Err(ImportError::Config(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }

    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        days.push(day);
        day = day
            .succ_opt()
            .ok_or_else(|| ImportError::Config("date range overflows calendar".into()))?;
    }
    Ok(days)
}
