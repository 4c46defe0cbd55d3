//! Walks the configured day range and feeds extracted records into the
//! ingestion queue.
//!
//! One file per calendar day, `<root>/<YYYYMM>/<YYYYMMDD>.st`. A missing
//! file skips the day; an unreadable file or line skips that file or line
//! only. Nothing here aborts the run.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::decode::decode_big5;
use crate::extract::extract_record;
use crate::models::{AttendanceRecord, LineOutcome};

/// Fixed extension of the legacy daily files.
const ST_EXTENSION: &str = "st";

/// Producer-side counters for the run summary.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalkStats {
    pub files_read: usize,
    pub files_missing: usize,
    pub files_failed: usize,
    pub lines_read: usize,
    pub lines_excluded: usize,
    pub lines_failed: usize,
    pub records: usize,
}

/// Expected path of one day's file under the source root.
pub fn day_file_path(folder: &Path, day: NaiveDate) -> PathBuf {
    folder
        .join(day.format("%Y%m").to_string())
        .join(format!("{}.{}", day.format("%Y%m%d"), ST_EXTENSION))
}

/// Reads every day file in order and sends surviving records to `tx`.
///
/// The sender is dropped on return, which closes the queue and is the
/// consumers' only termination signal. Returns early only if all
/// consumers are gone.
pub async fn walk_days(
    days: Vec<NaiveDate>,
    folder: PathBuf,
    employee_id_digits: usize,
    tx: mpsc::Sender<AttendanceRecord>,
) -> WalkStats {
    let mut stats = WalkStats::default();

    for day in days {
        let path = day_file_path(&folder, day);

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(file = %path.display(), "day file missing, skipping");
                stats.files_missing += 1;
                continue;
            }
            Err(err) => {
                error!(file = %path.display(), error = %err, "failed to open day file, skipping");
                stats.files_failed += 1;
                continue;
            }
        };

        info!(file = %path.display(), "reading day file");
        if !read_day_file(file, &path, employee_id_digits, &tx, &mut stats).await {
            // All receivers dropped; no point walking further days.
            warn!("ingestion queue closed early, stopping walker");
            return stats;
        }
    }

    info!(
        files_read = stats.files_read,
        files_missing = stats.files_missing,
        records = stats.records,
        "all day files processed, closing queue"
    );
    stats
}

/// Processes one opened day file line by line. Returns `false` if the
/// queue's receivers are gone.
async fn read_day_file(
    file: File,
    path: &Path,
    employee_id_digits: usize,
    tx: &mpsc::Sender<AttendanceRecord>,
    stats: &mut WalkStats,
) -> bool {
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                error!(file = %path.display(), error = %err, "read error, skipping rest of file");
                stats.files_failed += 1;
                return true;
            }
        }

        line_no += 1;
        stats.lines_read += 1;

        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }

        let line = decode_big5(&buf);
        match extract_record(&line, employee_id_digits) {
            Ok(LineOutcome::Excluded(reason)) => {
                info!(
                    file = %path.display(),
                    line = line_no,
                    reason = reason.as_str(),
                    "line excluded"
                );
                stats.lines_excluded += 1;
            }
            Ok(LineOutcome::Record(record)) => {
                if tx.send(record).await.is_err() {
                    return false;
                }
                stats.records += 1;
            }
            Err(err) => {
                warn!(
                    file = %path.display(),
                    line = line_no,
                    error = %err,
                    "line skipped"
                );
                stats.lines_failed += 1;
            }
        }
    }

    stats.files_read += 1;
    true
}
