//! Producer/worker ingestion pipeline.
//!
//! One walker task produces records into a bounded queue; a fixed pool of
//! workers drains it, each over its own store connection. Queue closure is
//! the only termination signal, and control returns to the caller only
//! after every worker has drained the closed queue.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info};

use crate::config::Config;
use crate::dates::{date_range, parse_compact_date};
use crate::error::ImportError;
use crate::models::AttendanceRecord;
use crate::storage::Storage;
use crate::walker::{walk_days, WalkStats};

/// Queue bound; the walker suspends when workers fall this far behind.
const QUEUE_CAPACITY: usize = 64;

/// Aggregated outcome of one import run.
#[derive(Debug, Default, Clone)]
pub struct ImportSummary {
    pub walk: WalkStats,
    pub inserted: usize,
    pub insert_failures: usize,
    pub workers: usize,
}

#[derive(Debug, Default)]
struct WorkerStats {
    inserted: usize,
    failed: usize,
}

/// Runs the full import: resolve the day range, walk the files, fan
/// records out to the worker pool, and wait for every worker to finish.
///
/// A store connection failure in any worker aborts the run. Per-record
/// insert failures are counted and logged, not retried.
pub async fn run_import(config: &Config) -> Result<ImportSummary> {
    let start = parse_compact_date(&config.start_date)?;
    let end = parse_compact_date(&config.end_date)?;
    let days = date_range(start, end)?;
    let workers = config.worker_count();

    info!(
        start = %start,
        end = %end,
        days = days.len(),
        workers,
        "starting import"
    );

    let (tx, rx) = mpsc::channel::<AttendanceRecord>(QUEUE_CAPACITY);
    // Single producer, multiple consumers: the receiver is shared and the
    // lock is held only across one recv.
    let rx = Arc::new(Mutex::new(rx));

    let producer = tokio::spawn(walk_days(
        days,
        config.folder_path.clone(),
        config.employee_id_digits,
        tx,
    ));

    let mut handles = Vec::with_capacity(workers);
    for worker_id in 0..workers {
        let rx = Arc::clone(&rx);
        let database = config.database_path.clone();
        let collection = config.collection.clone();
        handles.push(tokio::spawn(async move {
            insert_worker(worker_id, rx, &database, &collection).await
        }));
    }

    let walk = producer.await?;

    // Join barrier: every worker signals completion exactly once by
    // finishing; cleanup must not start before all of them have.
    let mut summary = ImportSummary {
        walk,
        workers,
        ..ImportSummary::default()
    };
    for handle in handles {
        let stats = handle.await??;
        summary.inserted += stats.inserted;
        summary.insert_failures += stats.failed;
    }

    info!(
        records = summary.walk.records,
        inserted = summary.inserted,
        insert_failures = summary.insert_failures,
        "import finished"
    );
    Ok(summary)
}

/// One pool worker: opens its own connection, drains the queue until it is
/// closed and empty, and reports its counts.
async fn insert_worker(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<AttendanceRecord>>>,
    database_path: &str,
    collection: &str,
) -> Result<WorkerStats, ImportError> {
    let mut storage = Storage::connect(database_path, collection).await?;
    let mut stats = WorkerStats::default();

    loop {
        // `None` means closed *and* drained; a temporarily empty queue
        // just parks the worker inside recv.
        let record = { rx.lock().await.recv().await };
        match record {
            Some(record) => match storage.insert_record(&record).await {
                Ok(()) => stats.inserted += 1,
                Err(err) => {
                    error!(
                        worker_id,
                        card_id = %record.card_id,
                        date_time = %record.date_time,
                        error = %err,
                        "insert failed, record dropped"
                    );
                    stats.failed += 1;
                }
            },
            None => break,
        }
    }

    info!(
        worker_id,
        inserted = stats.inserted,
        failed = stats.failed,
        "worker completed"
    );
    Ok(stats)
}
