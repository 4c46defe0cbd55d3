use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Width in characters of the employee-ID field in both layout variants.
pub const EMPLOYEE_ID_FIELD_WIDTH: usize = 5;

/// One attendance event decoded from a line of a daily `.st` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Badge identifier, opaque fixed-width token.
    pub card_id: String,
    /// Source-format calendar date (`YYYY/MM/DD`).
    pub date: String,
    /// Source-format clock time (`HH:MM:SS`).
    pub time: String,
    /// Employee number, normalized to the configured trailing digit count.
    pub employee_id: String,
    /// Employee name, terminated in the source by two consecutive blanks.
    pub name: String,
    /// Entry/exit status text.
    pub message: String,
    /// `date` + `time` combined; the canonical ordering and cleanup key.
    pub date_time: NaiveDateTime,
}

/// Field layout of a record line, selected by the password-entry marker.
///
/// The two layouts share the card/date/time offsets but shift the
/// employee-ID, name and message boundaries. The offset values encode an
/// undocumented legacy file format and must not be changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutVariant {
    /// "按密碼" entry: narrower employee-ID slot, name starts later,
    /// wider message field.
    PasswordEntry,
    /// Normal entry or wrong-password entry.
    Standard,
}

impl LayoutVariant {
    pub fn employee_id_range(&self) -> Range<usize> {
        match self {
            LayoutVariant::PasswordEntry => 142..147,
            LayoutVariant::Standard => 139..144,
        }
    }

    pub fn name_start(&self) -> usize {
        match self {
            LayoutVariant::PasswordEntry => 147,
            LayoutVariant::Standard => 144,
        }
    }

    pub fn message_range(&self) -> Range<usize> {
        match self {
            LayoutVariant::PasswordEntry => 45..68,
            LayoutVariant::Standard => 45..57,
        }
    }
}

/// Why a line was excluded from ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// The line carries the administrative marker.
    AdminMarker,
    /// The marker position is blank.
    BlankMarker,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionReason::AdminMarker => "admin marker",
            ExclusionReason::BlankMarker => "blank marker",
        }
    }
}

/// Result of running extraction over one decoded line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Excluded(ExclusionReason),
    Record(AttendanceRecord),
}
