#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use anyhow::{bail, Context, Result as AnyResult};
use rand::Rng;
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::WorkloadConfig;
use crate::domain::{Phase, ShutdownListener, ShutdownReason, SimulatorStatus, StatusBoard};
use crate::lib_cpu::busy_compute;
use crate::lib_file::{Removal, ScratchFiles};
use crate::lib_mem::MemoryBallast;
use crate::metrics::Metrics;
use crate::status_log::StatusLog;
use crate::usage::{default_probes, resource_usage_with, ResourceUsage, UsageProbe};
use crate::validation::validate_config;

pub struct Simulator {
    cfg: WorkloadConfig,
    pid: u32,
    phase: Phase,
    iteration: u64,
    ballast: MemoryBallast,
    scratch: ScratchFiles,
    log: StatusLog,
    probes: Vec<Box<dyn UsageProbe>>,
    board: StatusBoard,
    metrics: Metrics,
    shutdown: ShutdownListener,
}

impl Simulator {
    pub fn new(
        cfg: WorkloadConfig,
        metrics: Metrics,
        board: StatusBoard,
        shutdown: ShutdownListener,
    ) -> AnyResult<Self> {
        validate_config(&cfg).context("invalid configuration")?;
        let pid = std::process::id();
        let ballast = MemoryBallast::new(cfg.chunk_bytes, cfg.max_chunks);
        let scratch = ScratchFiles::new(
            cfg.scratch_dir.clone(),
            &cfg.scratch_prefix,
            pid,
            cfg.max_scratch_files,
        );
        let log = StatusLog::new(cfg.log_file.clone(), pid);
        board.update(|st| {
            *st = SimulatorStatus {
                name: cfg.name.clone(),
                pid,
                phase: Phase::Running,
                max_chunks: cfg.max_chunks,
                max_scratch_files: cfg.max_scratch_files,
                started_ts_seconds: chrono::Utc::now().timestamp(),
                ..SimulatorStatus::default()
            };
        });
        Ok(Self {
            cfg,
            pid,
            phase: Phase::Running,
            iteration: 0,
            ballast,
            scratch,
            log,
            probes: default_probes(),
            board,
            metrics,
            shutdown,
        })
    }

    #[must_use]
    pub fn with_probes(mut self, probes: Vec<Box<dyn UsageProbe>>) -> Self {
        self.probes = probes;
        self
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn ballast(&self) -> &MemoryBallast {
        &self.ballast
    }

    pub fn scratch(&self) -> &ScratchFiles {
        &self.scratch
    }

    pub fn status_log(&self) -> &StatusLog {
        &self.log
    }

    pub async fn start(&mut self) -> AnyResult<ShutdownReason> {
        if !self.cfg.quiet_banner {
            println!("{}", self.banner());
        }
        self.log_startup();
        if let Err(e) = self.prepare() {
            self.log.log(&format!("Unexpected error: {e:#}"));
            self.cleanup();
            return Err(e);
        }
        self.metrics.running.set(1);
        info!(pid = self.pid, name = %self.cfg.name, "workload loop started");
        let reason = match self.run_loop().await {
            Ok(reason) => reason,
            Err(e) => {
                self.log.log(&format!("Unexpected error: {e:#}"));
                self.cleanup();
                return Err(e);
            }
        };
        self.handle_shutdown(reason);
        Ok(reason)
    }

    fn prepare(&self) -> AnyResult<()> {
        std::fs::create_dir_all(self.scratch.dir())
            .with_context(|| format!("create scratch dir {}", self.scratch.dir().display()))
    }

    async fn run_loop(&mut self) -> AnyResult<ShutdownReason> {
        loop {
            if let Some(reason) = self.shutdown.reason() {
                return Ok(reason);
            }
            if let Some(limit) = self.limit_reached() {
                return Ok(limit);
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.tick()));
            let pause = match outcome {
                Err(payload) => {
                    self.metrics.tick_errors_total.inc();
                    bail!(
                        "iteration {} panicked: {}",
                        self.iteration,
                        panic_message(payload.as_ref())
                    );
                }
                Ok(Ok(())) => self.next_sleep(),
                Ok(Err(e)) => {
                    let msg = format!("{e:#}");
                    self.log.log(&format!("Error in main loop: {msg}"));
                    self.metrics.tick_errors_total.inc();
                    self.board.update(|st| st.last_error = Some(msg));
                    self.cfg.error_delay()
                }
            };
            if let Some(limit) = self.limit_reached() {
                return Ok(limit);
            }
            tokio::select! {
                reason = self.shutdown.requested() => return Ok(reason),
                () = tokio::time::sleep(pause) => {}
            }
        }
    }

    fn limit_reached(&self) -> Option<ShutdownReason> {
        match self.cfg.iterations {
            Some(limit) if self.iteration >= limit => Some(ShutdownReason::IterationLimit(limit)),
            _ => None,
        }
    }

    fn next_sleep(&self) -> Duration {
        let ms = rand::rng().random_range(self.cfg.min_sleep_ms..=self.cfg.max_sleep_ms);
        Duration::from_millis(ms)
    }

    pub fn tick(&mut self) -> AnyResult<()> {
        self.iteration += 1;
        self.metrics.iterations_total.inc();

        let usage = self.resource_usage();
        self.metrics
            .rss_bytes
            .set(i64::try_from(usage.rss_bytes).unwrap_or(i64::MAX));
        self.log.log(&format!(
            "Iteration {} - Memory: {}MB RSS, {}MB VMS",
            self.iteration,
            usage.rss_mb(),
            usage.virtual_mb()
        ));

        let busy = busy_compute(self.cfg.cpu_budget());
        self.metrics
            .cpu_busy_ms_total
            .inc_by(u64::try_from(busy.elapsed.as_millis()).unwrap_or(u64::MAX));
        debug!(iteration = self.iteration, rounds = busy.rounds, "busy computation finished");

        let grown = self
            .ballast
            .maybe_grow(self.iteration, self.cfg.alloc_every)
            .context("memory allocation error");
        if let Ok(true) = grown {
            debug!(
                iteration = self.iteration,
                chunks = self.ballast.len(),
                held_bytes = self.ballast.held_bytes(),
                "memory chunk allocated"
            );
        }

        let files = self.file_operations();
        self.publish(usage);
        grown?;
        files
    }

    fn file_operations(&mut self) -> AnyResult<()> {
        let written = self
            .scratch
            .write_and_verify(self.iteration, self.cfg.payload_len);
        if self.iteration % self.cfg.prune_every == 0 {
            if let Some(r) = self.scratch.prune_oldest(self.cfg.retain_scratch) {
                self.report_prune(r);
            }
        }
        for r in self.scratch.enforce_cap() {
            self.report_prune(r);
        }
        written.map(|_| ()).context("file operation error")
    }

    fn report_prune(&self, removal: Removal) {
        match removal {
            Removal::Removed(path) | Removal::AlreadyGone(path) => {
                debug!(path = %path.display(), "old scratch file pruned");
            }
            Removal::Failed(path, e) => {
                self.log.log(&format!(
                    "Error removing old temp file {}: {e}",
                    path.display()
                ));
            }
        }
    }

    fn publish(&self, usage: ResourceUsage) {
        let chunks = self.ballast.len();
        let files = self.scratch.len();
        self.metrics
            .memory_chunks
            .set(i64::try_from(chunks).unwrap_or(i64::MAX));
        self.metrics
            .scratch_files
            .set(i64::try_from(files).unwrap_or(i64::MAX));
        let (phase, iteration) = (self.phase, self.iteration);
        self.board.update(|st| {
            st.phase = phase;
            st.iteration = iteration;
            st.memory_chunks = chunks;
            st.scratch_files = files;
            st.rss_bytes = usage.rss_bytes;
        });
    }

    pub fn resource_usage(&self) -> ResourceUsage {
        resource_usage_with(&self.probes, self.pid)
    }

    pub fn handle_shutdown(&mut self, reason: ShutdownReason) {
        let msg = match reason {
            ShutdownReason::Signal(name) => format!("Received {name} signal. Starting graceful shutdown..."),
            other => format!("Stopping on {other}. Starting graceful shutdown..."),
        };
        self.log.log(&msg);
        self.cleanup();
    }

    // Idempotent; individual removal failures are logged and skipped.
    pub fn cleanup(&mut self) {
        if self.phase == Phase::Terminated {
            return;
        }
        self.phase = Phase::CleaningUp;
        self.metrics.running.set(0);
        self.publish(ResourceUsage::default());
        self.log.log("Cleaning up resources...");

        self.ballast.release();
        for r in self.scratch.remove_all() {
            self.report_cleanup(r);
        }
        match self.scratch.sweep_dir() {
            Ok(stragglers) => {
                for r in stragglers {
                    self.report_cleanup(r);
                }
            }
            Err(e) => self.log.log(&format!("Error during cleanup: {e:#}")),
        }

        self.phase = Phase::Terminated;
        self.publish(ResourceUsage::default());
        self.log.log("Graceful shutdown completed. Goodbye!");
        info!(iterations = self.iteration, "workload stopped");
    }

    fn report_cleanup(&self, removal: Removal) {
        match removal {
            Removal::Removed(path) => {
                let name = path
                    .file_name()
                    .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
                self.log.log(&format!("Cleaned up temporary file: {name}"));
            }
            Removal::AlreadyGone(path) => {
                debug!(path = %path.display(), "scratch file already gone");
            }
            Removal::Failed(path, e) => {
                warn!(path = %path.display(), error = %e, "scratch file cleanup failed");
                self.log
                    .log(&format!("Failed to clean up {}: {e}", path.display()));
            }
        }
    }

    fn log_startup(&self) {
        self.log.log(&format!("=== {} Started ===", self.cfg.name));
        self.log.log(&format!("PID: {}", self.pid));
        self.log
            .log(&format!("Version: {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));
        self.log.log(&format!(
            "Platform: {} {}",
            std::env::consts::OS,
            std::env::consts::ARCH
        ));
        let cwd = std::env::current_dir()
            .map_or_else(|e| format!("<unknown: {e}>"), |p| p.display().to_string());
        self.log.log(&format!("Working directory: {cwd}"));
        self.log
            .log(&format!("Log file: {}", self.log.path().display()));
        let args: Vec<String> = std::env::args().collect();
        self.log.log(&format!("Command line: {}", args.join(" ")));
    }

    pub fn banner(&self) -> String {
        let log_name = self
            .log
            .path()
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        format!(
            "\n\
             Test Rust Process Started!\n\
             ┌─────────────────────────────────────┐\n\
             │  PID: {:<29} │\n\
             │  Name: {:<28} │\n\
             │  Log File: {:<24} │\n\
             └─────────────────────────────────────┘\n\
             \n\
             This process will:\n\
             • Use CPU and memory resources\n\
             • Create JSON temporary files\n\
             • Write a log line every iteration\n\
             • Shut down gracefully on SIGTERM, SIGINT, SIGUSR1 or SIGUSR2\n\
             \n\
             Use Ctrl+C to stop gracefully, or test the dashboard!\n",
            self.pid, self.cfg.name, log_name
        )
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub phase: Phase,
    pub iteration: u64,
    pub metrics_ok: bool,
    pub registry_metrics: usize,
    pub invariants_ok: bool,
}

pub fn health(board: &StatusBoard, metrics: &Metrics) -> HealthReport {
    let st = board.snapshot();
    let invariants_ok =
        st.memory_chunks <= st.max_chunks && st.scratch_files <= st.max_scratch_files;
    let metrics_ok = metrics.encode_text().is_ok();
    let registry_metrics = metrics.registry.gather().len();
    let status = if metrics_ok && invariants_ok {
        "ok"
    } else {
        "degraded"
    };
    HealthReport {
        status: status.to_string(),
        phase: st.phase,
        iteration: st.iteration,
        metrics_ok,
        registry_metrics,
        invariants_ok,
    }
}
