#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use anyhow::{bail, Result as AnyResult};
use crate::config::WorkloadConfig;

pub const MAX_CHUNK_BYTES: usize = 256 * 1024 * 1024;
pub const MAX_BALLAST_BYTES: usize = 1024 * 1024 * 1024;
pub const MAX_PAYLOAD_LEN: usize = 1_000_000;

pub fn validate_config(cfg: &WorkloadConfig) -> AnyResult<()> {
    if cfg.name.trim().is_empty() { bail!("name is empty"); }
    if cfg.cpu_budget_ms == 0 { bail!("cpu_budget_ms must be > 0"); }
    if cfg.chunk_bytes == 0 { bail!("chunk_bytes must be > 0"); }
    if cfg.alloc_every == 0 { bail!("alloc_every must be > 0"); }
    if cfg.max_chunks == 0 { bail!("max_chunks must be > 0"); }
    if cfg.chunk_bytes > MAX_CHUNK_BYTES {
        bail!("chunk_bytes ({}) exceeds {MAX_CHUNK_BYTES}", cfg.chunk_bytes);
    }
    match cfg.chunk_bytes.checked_mul(cfg.max_chunks) {
        Some(total) if total <= MAX_BALLAST_BYTES => {}
        _ => bail!("chunk_bytes * max_chunks exceeds {MAX_BALLAST_BYTES} bytes"),
    }
    if cfg.payload_len > MAX_PAYLOAD_LEN {
        bail!("payload_len ({}) exceeds {MAX_PAYLOAD_LEN}", cfg.payload_len);
    }
    if cfg.prune_every == 0 { bail!("prune_every must be > 0"); }
    if cfg.max_scratch_files == 0 { bail!("max_scratch_files must be > 0"); }
    if cfg.retain_scratch > cfg.max_scratch_files {
        bail!("retain_scratch ({}) exceeds max_scratch_files ({})", cfg.retain_scratch, cfg.max_scratch_files);
    }
    if cfg.min_sleep_ms > cfg.max_sleep_ms {
        bail!("min_sleep_ms ({}) exceeds max_sleep_ms ({})", cfg.min_sleep_ms, cfg.max_sleep_ms);
    }
    let prefix = cfg.scratch_prefix.as_str();
    if prefix.trim().is_empty() { bail!("scratch_prefix is empty"); }
    if prefix.contains(['/', '\\']) {
        bail!(format!("scratch_prefix must not contain a path separator: {prefix}"));
    }
    Ok(())
}
