#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use anyhow::{Context, Result as AnyResult};
use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,
    pub iterations_total: IntCounter,
    pub tick_errors_total: IntCounter,
    pub cpu_busy_ms_total: IntCounter,
    pub memory_chunks: IntGauge,
    pub scratch_files: IntGauge,
    pub rss_bytes: IntGauge,
    pub running: IntGauge,
}

impl Metrics {
    pub fn new() -> AnyResult<Self> {
        let registry = Registry::new();
        let iterations_total =
            IntCounter::with_opts(Opts::new("workload_iterations_total", "ticks started"))
                .context("create iterations_total")?;
        let tick_errors_total =
            IntCounter::with_opts(Opts::new("workload_tick_errors_total", "ticks that failed"))
                .context("create tick_errors_total")?;
        let cpu_busy_ms_total = IntCounter::with_opts(Opts::new(
            "workload_cpu_busy_ms_total",
            "milliseconds spent in the busy computation",
        ))
        .context("create cpu_busy_ms_total")?;
        registry
            .register(Box::new(iterations_total.clone()))
            .context("register iterations_total")?;
        registry
            .register(Box::new(tick_errors_total.clone()))
            .context("register tick_errors_total")?;
        registry
            .register(Box::new(cpu_busy_ms_total.clone()))
            .context("register cpu_busy_ms_total")?;
        let memory_chunks = IntGauge::with_opts(Opts::new(
            "workload_memory_chunks",
            "chunks held in the memory buffer",
        ))
        .context("create memory_chunks")?;
        let scratch_files = IntGauge::with_opts(Opts::new(
            "workload_scratch_files",
            "scratch files currently tracked",
        ))
        .context("create scratch_files")?;
        let rss_bytes = IntGauge::with_opts(Opts::new("workload_rss_bytes", "last resident set size"))
            .context("create rss_bytes")?;
        let running = IntGauge::with_opts(Opts::new(
            "workload_running",
            "1 while the main loop is running",
        ))
        .context("create running")?;
        registry
            .register(Box::new(memory_chunks.clone()))
            .context("register memory_chunks")?;
        registry
            .register(Box::new(scratch_files.clone()))
            .context("register scratch_files")?;
        registry
            .register(Box::new(rss_bytes.clone()))
            .context("register rss_bytes")?;
        registry
            .register(Box::new(running.clone()))
            .context("register running")?;
        Ok(Self {
            registry,
            iterations_total,
            tick_errors_total,
            cpu_busy_ms_total,
            memory_chunks,
            scratch_files,
            rss_bytes,
            running,
        })
    }

    pub fn encode_text(&self) -> AnyResult<Vec<u8>> {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        encoder.encode(&mf, &mut buf).context("encode metrics")?;
        Ok(buf)
    }
}
