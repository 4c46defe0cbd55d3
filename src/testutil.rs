//! Builders for fixture lines in the legacy fixed-width layout.
//!
//! Test-only; offsets here mirror the extraction constants so fixtures
//! stay layout-correct when fields change width by variant.

use crate::models::LayoutVariant;

/// Field values for one synthetic record line.
pub struct LineSpec {
    pub variant: LayoutVariant,
    pub card_id: &'static str,
    pub date: &'static str,
    pub time: &'static str,
    pub employee_id: &'static str,
    pub name: &'static str,
    pub message: &'static str,
}

fn place(chars: &mut Vec<char>, start: usize, text: &str) {
    for (i, c) in text.chars().enumerate() {
        let idx = start + i;
        if idx >= chars.len() {
            chars.resize(idx + 1, ' ');
        }
        chars[idx] = c;
    }
}

/// Builds a full line for the given spec, padded with blanks so the name
/// terminator and all fixed-width fields line up.
pub fn record_line(spec: &LineSpec) -> String {
    let mut chars: Vec<char> = vec![' '; 170];

    place(&mut chars, 15, spec.card_id);
    place(&mut chars, 27, spec.date);
    place(&mut chars, 37, spec.time);
    place(&mut chars, 45, spec.message);
    if spec.variant == LayoutVariant::PasswordEntry {
        place(&mut chars, 58, "按密碼");
    }
    place(&mut chars, spec.variant.employee_id_range().start, spec.employee_id);
    place(&mut chars, spec.variant.name_start(), spec.name);
    // Two blanks after the name terminate the scan; the padding already
    // provides them as long as the line is long enough.
    let name_end = spec.variant.name_start() + spec.name.chars().count();
    if name_end + 2 > chars.len() {
        chars.resize(name_end + 2, ' ');
    }

    chars.into_iter().collect()
}

/// A line carrying the administrative marker.
pub fn admin_line() -> String {
    let mut chars: Vec<char> = vec![' '; 170];
    place(&mut chars, 15, "000000000000");
    place(&mut chars, 27, "2020/11/04");
    place(&mut chars, 37, "08:00:00");
    place(&mut chars, 140, "ADMIN");
    chars.into_iter().collect()
}

/// A line with a blank at the employee marker position.
pub fn blank_line() -> String {
    let mut chars: Vec<char> = vec![' '; 170];
    place(&mut chars, 15, "000000000000");
    place(&mut chars, 27, "2020/11/04");
    place(&mut chars, 37, "08:00:00");
    chars.into_iter().collect()
}
