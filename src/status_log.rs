#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use chrono::{SecondsFormat, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Lines go to stdout and are appended to the file as `[<timestamp>] [PID:<pid>] <message>`.
#[derive(Clone, Debug)]
pub struct StatusLog {
    path: PathBuf,
    pid: u32,
    write_failures: Arc<AtomicU64>,
}

impl StatusLog {
    pub fn new(path: impl Into<PathBuf>, pid: u32) -> Self {
        Self {
            path: path.into(),
            pid,
            write_failures: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    pub fn format_line(&self, message: &str) -> String {
        let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        format!("[{ts}] [PID:{}] {message}", self.pid)
    }

    pub fn log(&self, message: &str) {
        let line = self.format_line(message);
        println!("{line}");
        if let Err(e) = self.append(&line) {
            self.write_failures.fetch_add(1, Ordering::Relaxed);
            // reaches the console whatever RUST_LOG says
            eprintln!("{}", write_failure_report(&self.path, &e));
            warn!(path = %self.path.display(), error = %e, "failed to write to log file");
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(f, "{line}")
    }
}

pub fn write_failure_report(path: &Path, err: &std::io::Error) -> String {
    format!("Failed to write to log file {}: {err}", path.display())
}
