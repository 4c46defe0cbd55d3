//! Importer configuration.
//!
//! Loaded from a JSON file (the shape the legacy tool's `config.json`
//! carried) or from `STCLOCK_*` environment variables, with CLI flags
//! overriding either. Validation happens once at startup; the pipeline
//! treats the values as already checked.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::ConfigOverrides;
use crate::dates::{date_range, parse_compact_date};
use crate::error::{ImportError, Result};
use crate::models::EMPLOYEE_ID_FIELD_WIDTH;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database file.
    pub database_path: String,
    /// Destination table for attendance records.
    pub collection: String,
    /// Root folder holding `<YYYYMM>/<YYYYMMDD>.st` files.
    pub folder_path: PathBuf,
    /// First day to import, `YYYYMMDD`.
    pub start_date: String,
    /// Last day to import, `YYYYMMDD`, inclusive.
    pub end_date: String,
    /// How many trailing digits of the employee-ID field to keep.
    pub employee_id_digits: usize,
    /// Worker pool size; defaults to available CPU parallelism.
    pub workers: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: "./attendance.db".to_string(),
            collection: "daily_records".to_string(),
            folder_path: PathBuf::from("./records"),
            start_date: String::new(),
            end_date: String::new(),
            employee_id_digits: 3,
            workers: None,
        }
    }
}

impl Config {
    /// Loads configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|err| {
            ImportError::Config(format!("failed to parse {}: {}", path.display(), err))
        })
    }

    /// Loads configuration from `STCLOCK_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();
        Ok(Config {
            database_path: env_or("STCLOCK_DB_PATH", defaults.database_path),
            collection: env_or("STCLOCK_COLLECTION", defaults.collection),
            folder_path: match std::env::var("STCLOCK_FOLDER_PATH") {
                Ok(value) => PathBuf::from(value),
                Err(_) => defaults.folder_path.clone(),
            },
            start_date: env_or("STCLOCK_START_DATE", defaults.start_date),
            end_date: env_or("STCLOCK_END_DATE", defaults.end_date),
            employee_id_digits: parse_env_var("STCLOCK_EMPLOYEE_ID_DIGITS")?
                .unwrap_or(defaults.employee_id_digits),
            workers: parse_env_var("STCLOCK_WORKERS")?,
        })
    }

    /// Builds the effective configuration: config file if given, else
    /// environment, with individual flags overriding either. Callers that
    /// import must still run [`Config::validate`]; cleanup-only paths do
    /// not need the date fields.
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = match &overrides.config {
            Some(path) => Config::from_file(path)?,
            None => Config::from_env()?,
        };

        if let Some(database) = &overrides.database {
            config.database_path = database.clone();
        }
        if let Some(collection) = &overrides.collection {
            config.collection = collection.clone();
        }
        if let Some(folder) = &overrides.folder {
            config.folder_path = folder.clone();
        }
        if let Some(start_date) = &overrides.start_date {
            config.start_date = start_date.clone();
        }
        if let Some(end_date) = &overrides.end_date {
            config.end_date = end_date.clone();
        }
        if let Some(digits) = overrides.employee_id_digits {
            config.employee_id_digits = digits;
        }
        if let Some(workers) = overrides.workers {
            config.workers = Some(workers);
        }

        Ok(config)
    }

    /// Checks everything the pipeline assumes: parseable dates, a
    /// forward range, and a digit count that fits the employee-ID field.
    pub fn validate(&self) -> Result<()> {
        let start = parse_compact_date(&self.start_date)?;
        let end = parse_compact_date(&self.end_date)?;
        date_range(start, end)?;

        if self.employee_id_digits == 0 || self.employee_id_digits > EMPLOYEE_ID_FIELD_WIDTH {
            return Err(ImportError::Config(format!(
                "employee_id_digits must be between 1 and {}, got {}",
                EMPLOYEE_ID_FIELD_WIDTH, self.employee_id_digits
            )));
        }

        if let Some(workers) = self.workers {
            if workers == 0 {
                return Err(ImportError::Config("workers must be at least 1".into()));
            }
        }

        Ok(())
    }

    /// Effective worker pool size.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }
}

fn env_or(var: &str, default: String) -> String {
    std::env::var(var).unwrap_or(default)
}

fn parse_env_var<T>(var: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
{
    match std::env::var(var) {
        Ok(value) => value.parse().map(Some).map_err(|_| {
            ImportError::Config(format!("failed to parse {} = '{}'", var, value))
        }),
        Err(_) => Ok(None),
    }
}
