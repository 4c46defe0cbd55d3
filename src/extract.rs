//! Field extraction for one decoded time-clock line.
//!
//! Lines use a fixed-width layout with two variants, chosen by the
//! password-entry marker. All offsets below are decoded-character
//! positions inherited from the legacy terminal format; changing any of
//! them silently corrupts every downstream field.

use std::ops::Range;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{ImportError, Result};
use crate::models::{
    AttendanceRecord, ExclusionReason, LayoutVariant, LineOutcome, EMPLOYEE_ID_FIELD_WIDTH,
};

/// Administrative entries carry this marker and are never persisted.
const ADMIN_MARKER: &str = "ADMIN";
const ADMIN_RANGE: Range<usize> = 140..145;

/// A blank at this position marks a line with no employee entry.
const BLANK_OFFSET: usize = 144;

/// Marks a password entry, which uses the shifted field layout.
const PASSWORD_MARKER: &str = "按密碼";
const PASSWORD_MARKER_START: usize = 58;

/// Offsets shared by both layout variants.
const CARD_ID_RANGE: Range<usize> = 15..27;
const DATE_RANGE: Range<usize> = 27..37;
const TIME_RANGE: Range<usize> = 37..45;

/// Classification of one line, before any field is pulled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineClass {
    Admin,
    Blank,
    Record(LayoutVariant),
}

/// Runs the full extraction over one decoded line.
///
/// Excluded lines (admin marker, blank marker) produce
/// [`LineOutcome::Excluded`]; anything that fails a field bound or a
/// numeric parse is an [`ImportError::Extraction`] so the caller can skip
/// the line and keep going.
pub fn extract_record(line: &str, employee_id_digits: usize) -> Result<LineOutcome> {
    let chars: Vec<char> = line.chars().collect();

    let variant = match classify(&chars)? {
        LineClass::Admin => return Ok(LineOutcome::Excluded(ExclusionReason::AdminMarker)),
        LineClass::Blank => return Ok(LineOutcome::Excluded(ExclusionReason::BlankMarker)),
        LineClass::Record(variant) => variant,
    };

    let card_id = field(&chars, CARD_ID_RANGE)?;
    let date = field(&chars, DATE_RANGE)?;
    let time = field(&chars, TIME_RANGE)?;
    let raw_employee_id = field(&chars, variant.employee_id_range())?;
    let employee_id = normalize_employee_id(&raw_employee_id, employee_id_digits)?;
    let name = extract_name(&chars, variant.name_start())?;
    let message = field(&chars, variant.message_range())?;
    let date_time = compose_datetime(&date, &time)?;

    debug!(
        ?variant,
        card_id = %card_id,
        employee_id = %employee_id,
        name = %name,
        %date_time,
        "record extracted"
    );

    Ok(LineOutcome::Record(AttendanceRecord {
        card_id,
        date,
        time,
        employee_id,
        name,
        message,
        date_time,
    }))
}

/// Decides what kind of line this is. Pure; the variant choice depends
/// only on the line content.
fn classify(chars: &[char]) -> Result<LineClass> {
    if field(chars, ADMIN_RANGE)? == ADMIN_MARKER {
        return Ok(LineClass::Admin);
    }
    // ADMIN_RANGE covers BLANK_OFFSET, so the index is in bounds here.
    if chars[BLANK_OFFSET] == ' ' {
        return Ok(LineClass::Blank);
    }

    let marker_chars = PASSWORD_MARKER.chars().count();
    let marker = field(
        chars,
        PASSWORD_MARKER_START..PASSWORD_MARKER_START + marker_chars,
    )?;
    if marker == PASSWORD_MARKER {
        Ok(LineClass::Record(LayoutVariant::PasswordEntry))
    } else {
        Ok(LineClass::Record(LayoutVariant::Standard))
    }
}

/// Copies a fixed-offset field out of the line, failing on short lines
/// instead of reading out of bounds.
fn field(chars: &[char], range: Range<usize>) -> Result<String> {
    if range.end > chars.len() {
        return Err(ImportError::Extraction(format!(
            "line too short: field at {}..{} but line has {} characters",
            range.start,
            range.end,
            chars.len()
        )));
    }
    Ok(chars[range].iter().collect())
}

/// Scans the variable-length name field.
///
/// The name runs from `start` up to and including the first position whose
/// two following characters are both blank. The scan is bounded by the
/// line length; a line without the double-blank terminator is malformed.
fn extract_name(chars: &[char], start: usize) -> Result<String> {
    let mut i = start;
    loop {
        if i + 2 >= chars.len() {
            return Err(ImportError::Extraction(format!(
                "name field at {} is not terminated by a double blank",
                start
            )));
        }
        if chars[i + 1] == ' ' && chars[i + 2] == ' ' {
            return Ok(chars[start..=i].iter().collect());
        }
        i += 1;
    }
}

/// Keeps the trailing `digits` characters of the raw employee-ID field.
pub fn normalize_employee_id(raw: &str, digits: usize) -> Result<String> {
    let chars: Vec<char> = raw.chars().collect();
    if digits == 0 || digits > chars.len() {
        return Err(ImportError::Config(format!(
            "employee-ID digit count {} must be between 1 and {}",
            digits,
            chars.len()
        )));
    }
    Ok(chars[chars.len() - digits..].iter().collect())
}

/// Combines the `YYYY/MM/DD` date field and `HH:MM:SS` time field into a
/// single local wall-clock timestamp with zero sub-second precision.
///
/// Components sit at fixed positions within each field; this is not a
/// general date parser.
fn compose_datetime(date: &str, time: &str) -> Result<NaiveDateTime> {
    let date_chars: Vec<char> = date.chars().collect();
    let time_chars: Vec<char> = time.chars().collect();

    let year = numeric_field(&date_chars, 0..4, "year")? as i32;
    let month = numeric_field(&date_chars, 5..7, "month")?;
    let day = numeric_field(&date_chars, 8..10, "day")?;
    let hour = numeric_field(&time_chars, 0..2, "hour")?;
    let minute = numeric_field(&time_chars, 3..5, "minute")?;
    let second = numeric_field(&time_chars, 6..8, "second")?;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(|| {
            ImportError::Extraction(format!(
                "'{}' / '{}' is not a real calendar instant",
                date, time
            ))
        })
}

fn numeric_field(chars: &[char], range: Range<usize>, what: &str) -> Result<u32> {
    if range.end > chars.len() {
        return Err(ImportError::Extraction(format!(
            "{} field is missing: expected characters {}..{}",
            what, range.start, range.end
        )));
    }
    let text: String = chars[range].iter().collect();
    text.parse().map_err(|_| {
        ImportError::Extraction(format!("{} field '{}' is not numeric", what, text))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{admin_line, blank_line, record_line, LineSpec};

    fn default_spec(variant: LayoutVariant) -> LineSpec {
        LineSpec {
            variant,
            card_id: "001234567890",
            date: "2020/11/04",
            time: "14:18:01",
            employee_id: "00123",
            name: "王小明",
            message: "正常進出",
        }
    }

    #[test]
    fn admin_line_is_excluded() {
        let line = admin_line();
        assert_eq!(
            extract_record(&line, 3).unwrap(),
            LineOutcome::Excluded(ExclusionReason::AdminMarker)
        );
    }

    #[test]
    fn blank_line_is_excluded() {
        let line = blank_line();
        assert_eq!(
            extract_record(&line, 3).unwrap(),
            LineOutcome::Excluded(ExclusionReason::BlankMarker)
        );
    }

    #[test]
    fn password_marker_selects_password_layout() {
        let line = record_line(&default_spec(LayoutVariant::PasswordEntry));
        let outcome = extract_record(&line, 3).unwrap();
        let record = match outcome {
            LineOutcome::Record(record) => record,
            other => panic!("expected a record, got {:?}", other),
        };
        assert_eq!(record.card_id, "001234567890");
        assert_eq!(record.employee_id, "123");
        assert_eq!(record.name, "王小明");
        assert!(record.message.starts_with("正常進出"));
        // Password layout keeps the wider message field.
        assert_eq!(record.message.chars().count(), 23);
    }

    #[test]
    fn plain_line_selects_standard_layout() {
        let line = record_line(&default_spec(LayoutVariant::Standard));
        let outcome = extract_record(&line, 3).unwrap();
        let record = match outcome {
            LineOutcome::Record(record) => record,
            other => panic!("expected a record, got {:?}", other),
        };
        assert_eq!(record.employee_id, "123");
        assert_eq!(record.name, "王小明");
        assert_eq!(record.message.chars().count(), 12);
    }

    #[test]
    fn variant_selection_is_deterministic() {
        let line = record_line(&default_spec(LayoutVariant::PasswordEntry));
        let first = extract_record(&line, 3).unwrap();
        let second = extract_record(&line, 3).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn name_never_includes_terminating_blanks() {
        for variant in [LayoutVariant::PasswordEntry, LayoutVariant::Standard] {
            let mut spec = default_spec(variant);
            spec.name = "陳大文";
            let line = record_line(&spec);
            match extract_record(&line, 3).unwrap() {
                LineOutcome::Record(record) => {
                    assert_eq!(record.name, "陳大文");
                    assert!(!record.name.ends_with(' '));
                }
                other => panic!("expected a record, got {:?}", other),
            }
        }
    }

    #[test]
    fn single_character_name_is_extracted() {
        let mut spec = default_spec(LayoutVariant::Standard);
        spec.name = "王";
        let line = record_line(&spec);
        match extract_record(&line, 3).unwrap() {
            LineOutcome::Record(record) => assert_eq!(record.name, "王"),
            other => panic!("expected a record, got {:?}", other),
        }
    }

    #[test]
    fn unterminated_name_fails_instead_of_scanning_past_the_line() {
        let line = record_line(&default_spec(LayoutVariant::Standard));
        // Fill everything after the name start with non-blanks so the
        // double-blank terminator never appears.
        let truncated: String = line
            .chars()
            .enumerate()
            .map(|(i, c)| if i >= 144 { 'x' } else { c })
            .collect();
        assert!(matches!(
            extract_record(&truncated, 3),
            Err(ImportError::Extraction(_))
        ));
    }

    #[test]
    fn short_line_is_an_extraction_error() {
        assert!(matches!(
            extract_record("too short", 3),
            Err(ImportError::Extraction(_))
        ));
        assert!(matches!(
            extract_record("", 3),
            Err(ImportError::Extraction(_))
        ));
    }

    #[test]
    fn non_numeric_date_is_an_extraction_error() {
        let mut spec = default_spec(LayoutVariant::Standard);
        spec.date = "2020/1x/04";
        let line = record_line(&spec);
        assert!(matches!(
            extract_record(&line, 3),
            Err(ImportError::Extraction(_))
        ));
    }

    #[test]
    fn impossible_calendar_instant_is_an_extraction_error() {
        let mut spec = default_spec(LayoutVariant::Standard);
        spec.date = "2020/13/40";
        let line = record_line(&spec);
        assert!(matches!(
            extract_record(&line, 3),
            Err(ImportError::Extraction(_))
        ));
    }

    #[test]
    fn datetime_components_round_trip() {
        let line = record_line(&default_spec(LayoutVariant::Standard));
        let record = match extract_record(&line, 3).unwrap() {
            LineOutcome::Record(record) => record,
            other => panic!("expected a record, got {:?}", other),
        };
        assert_eq!(
            record.date_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2020-11-04 14:18:01"
        );
    }

    #[test]
    fn employee_id_keeps_exactly_n_trailing_characters() {
        for n in 1..=EMPLOYEE_ID_FIELD_WIDTH {
            let normalized = normalize_employee_id("00123", n).unwrap();
            assert_eq!(normalized.chars().count(), n);
            assert!("00123".ends_with(&normalized));
        }
    }

    #[test]
    fn employee_id_digit_count_out_of_range_is_a_config_error() {
        assert!(matches!(
            normalize_employee_id("00123", 0),
            Err(ImportError::Config(_))
        ));
        assert!(matches!(
            normalize_employee_id("00123", 6),
            Err(ImportError::Config(_))
        ));
    }
}
