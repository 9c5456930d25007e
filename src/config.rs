#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Clone, Debug, Parser)]
#[command(name = "dummy-workload")]
#[command(about = "Long-running dummy process that burns CPU, memory and disk for dashboard testing")]
pub struct WorkloadConfig {
    /// Name printed in the banner and startup log.
    #[arg(long, env = "DUMMY_WORKLOAD_NAME", default_value = "TestRustProcess")]
    pub name: String,

    #[arg(long, env = "DUMMY_WORKLOAD_LOG_FILE", default_value = "./test-rust-process.log")]
    pub log_file: PathBuf,

    #[arg(long, env = "DUMMY_WORKLOAD_SCRATCH_DIR", default_value = ".")]
    pub scratch_dir: PathBuf,

    /// Scratch files are named `temp-<prefix>-<pid>-<iteration>.json`.
    #[arg(long, env = "DUMMY_WORKLOAD_SCRATCH_PREFIX", default_value = "rust")]
    pub scratch_prefix: String,

    #[arg(long, env = "DUMMY_WORKLOAD_CPU_BUDGET_MS", default_value_t = 100)]
    pub cpu_budget_ms: u64,

    #[arg(long, env = "DUMMY_WORKLOAD_CHUNK_BYTES", default_value_t = 1024 * 1024)]
    pub chunk_bytes: usize,

    /// Allocate a chunk on iterations divisible by this.
    #[arg(long, env = "DUMMY_WORKLOAD_ALLOC_EVERY", default_value_t = 10)]
    pub alloc_every: u64,

    #[arg(long, env = "DUMMY_WORKLOAD_MAX_CHUNKS", default_value_t = 20)]
    pub max_chunks: usize,

    /// Drop the oldest scratch file on iterations divisible by this.
    #[arg(long, env = "DUMMY_WORKLOAD_PRUNE_EVERY", default_value_t = 3)]
    pub prune_every: u64,

    /// Periodic pruning leaves at least this many scratch files behind.
    #[arg(long, env = "DUMMY_WORKLOAD_RETAIN_SCRATCH", default_value_t = 3)]
    pub retain_scratch: usize,

    #[arg(long, env = "DUMMY_WORKLOAD_MAX_SCRATCH_FILES", default_value_t = 10)]
    pub max_scratch_files: usize,

    #[arg(long, env = "DUMMY_WORKLOAD_PAYLOAD_LEN", default_value_t = 100)]
    pub payload_len: usize,

    #[arg(long, env = "DUMMY_WORKLOAD_MIN_SLEEP_MS", default_value_t = 1000)]
    pub min_sleep_ms: u64,

    #[arg(long, env = "DUMMY_WORKLOAD_MAX_SLEEP_MS", default_value_t = 3000)]
    pub max_sleep_ms: u64,

    #[arg(long, env = "DUMMY_WORKLOAD_ERROR_DELAY_MS", default_value_t = 2000)]
    pub error_delay_ms: u64,

    /// Shut down gracefully after this many iterations.
    #[arg(long, env = "DUMMY_WORKLOAD_ITERATIONS")]
    pub iterations: Option<u64>,

    /// Serve /healthz, /status, /metrics and /shutdown on this address.
    #[arg(long, env = "DUMMY_WORKLOAD_HTTP_BIND")]
    pub http_bind: Option<String>,

    #[arg(long, env = "DUMMY_WORKLOAD_QUIET_BANNER")]
    pub quiet_banner: bool,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            name: "TestRustProcess".to_string(),
            log_file: PathBuf::from("./test-rust-process.log"),
            scratch_dir: PathBuf::from("."),
            scratch_prefix: "rust".to_string(),
            cpu_budget_ms: 100,
            chunk_bytes: 1024 * 1024,
            alloc_every: 10,
            max_chunks: 20,
            prune_every: 3,
            retain_scratch: 3,
            max_scratch_files: 10,
            payload_len: 100,
            min_sleep_ms: 1000,
            max_sleep_ms: 3000,
            error_delay_ms: 2000,
            iterations: None,
            http_bind: None,
            quiet_banner: false,
        }
    }
}

impl WorkloadConfig {
    pub fn cpu_budget(&self) -> Duration {
        Duration::from_millis(self.cpu_budget_ms)
    }

    pub fn error_delay(&self) -> Duration {
        Duration::from_millis(self.error_delay_ms)
    }
}
