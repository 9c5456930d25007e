#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    Running,
    CleaningUp,
    Terminated,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Running => f.write_str("RUNNING"),
            Phase::CleaningUp => f.write_str("CLEANING_UP"),
            Phase::Terminated => f.write_str("TERMINATED"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownReason {
    Signal(&'static str),
    IterationLimit(u64),
    Requested,
}

impl std::fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownReason::Signal(name) => write!(f, "{name} signal"),
            ShutdownReason::IterationLimit(n) => write!(f, "iteration limit of {n}"),
            ShutdownReason::Requested => f.write_str("shutdown request"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ShutdownTrigger {
    tx: Arc<watch::Sender<Option<ShutdownReason>>>,
}

#[derive(Clone, Debug)]
pub struct ShutdownListener {
    rx: watch::Receiver<Option<ShutdownReason>>,
}

pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownListener) {
    let (tx, rx) = watch::channel(None);
    (ShutdownTrigger { tx: Arc::new(tx) }, ShutdownListener { rx })
}

impl ShutdownTrigger {
    /// Returns false if a shutdown was already requested.
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        self.tx.send_if_modified(|cur| {
            if cur.is_some() {
                return false;
            }
            *cur = Some(reason);
            true
        })
    }

    pub fn is_triggered(&self) -> bool {
        self.tx.borrow().is_some()
    }
}

impl ShutdownListener {
    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.rx.borrow()
    }

    // Never resolves if every trigger is dropped without firing.
    pub async fn requested(&mut self) -> ShutdownReason {
        loop {
            if let Some(reason) = *self.rx.borrow_and_update() {
                return reason;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulatorStatus {
    pub name: String,
    pub pid: u32,
    pub phase: Phase,
    pub iteration: u64,
    pub memory_chunks: usize,
    pub max_chunks: usize,
    pub scratch_files: usize,
    pub max_scratch_files: usize,
    pub rss_bytes: u64,
    pub started_ts_seconds: i64,
    pub last_error: Option<String>,
}

#[derive(Clone, Default)]
pub struct StatusBoard {
    pub state: Arc<Mutex<SimulatorStatus>>,
}

impl StatusBoard {
    pub fn new(initial: SimulatorStatus) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial)),
        }
    }

    pub fn snapshot(&self) -> SimulatorStatus {
        self.state.lock().clone()
    }

    pub fn update(&self, f: impl FnOnce(&mut SimulatorStatus)) {
        let mut st = self.state.lock();
        f(&mut st);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScratchRecord {
    pub iteration: u64,
    pub timestamp: String,
    pub pid: u32,
    pub random_data: Vec<f64>,
}

#[derive(Clone)]
pub struct AppState {
    pub board: StatusBoard,
    pub metrics: crate::metrics::Metrics,
    pub shutdown: ShutdownTrigger,
}
