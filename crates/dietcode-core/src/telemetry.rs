//! Centralised tracing initialisation for DietCode binaries.
//!
//! Call [`init_tracing`] once at program start to configure the global
//! subscriber with an `EnvFilter`, optional JSON formatting, and an optional
//! daily log file.
//!
//! Safe to call more than once; subsequent calls are silently ignored
//! (the global subscriber can only be set once per process).

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::domain::Result;

/// Path of the log file for `date` inside `dir`: `<dir>/agent_YYYYMMDD.log`.
pub fn log_file_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("agent_{}.log", date.format("%Y%m%d")))
}

/// Initialise the global tracing subscriber.
///
/// * `json`: when `true`, console output is newline-delimited JSON.
/// * `level`: default verbosity when `RUST_LOG` is not set.
/// * `log_dir`: when set, plain-text lines are also appended to today's
///   log file in that directory (created if missing).
///
/// Returns the log file path, if one was opened.
pub fn init_tracing(json: bool, level: Level, log_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let (log_file, file_path) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let path = log_file_path(dir, Utc::now().date_naive());
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            (Some(file), Some(path))
        }
        None => (None, None),
    };

    // The file layer's type depends on the stack below it, so it is built
    // separately in each branch.
    macro_rules! file_layer {
        () => {
            log_file.map(|file| {
                fmt::layer()
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(Mutex::new(file))
            })
        };
    }

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).json())
            .with(file_layer!())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .with(file_layer!())
            .try_init()
            .ok();
    }

    Ok(file_path)
}
