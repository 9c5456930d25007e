#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use anyhow::{anyhow, Context, Result as AnyResult};
use serde::Serialize;
use sysinfo::{Pid, System};
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum UsageSource {
    Sysinfo,
    ProcStatus,
    #[default]
    Unavailable,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResourceUsage {
    pub rss_bytes: u64,
    pub virtual_bytes: u64,
    pub source: UsageSource,
}

impl ResourceUsage {
    pub fn rss_mb(&self) -> u64 {
        self.rss_bytes / 1024 / 1024
    }

    pub fn virtual_mb(&self) -> u64 {
        self.virtual_bytes / 1024 / 1024
    }
}

pub trait UsageProbe: Send + Sync {
    fn name(&self) -> &'static str;
    fn probe(&self, pid: u32) -> AnyResult<ResourceUsage>;
}

pub struct SysinfoProbe;

impl UsageProbe for SysinfoProbe {
    fn name(&self) -> &'static str {
        "sysinfo"
    }

    fn probe(&self, pid: u32) -> AnyResult<ResourceUsage> {
        let pid = Pid::from_u32(pid);
        let mut sys = System::new();
        if !sys.refresh_process(pid) {
            return Err(anyhow!("process {pid} not found"));
        }
        let process = sys
            .process(pid)
            .ok_or_else(|| anyhow!("process {pid} vanished after refresh"))?;
        Ok(ResourceUsage {
            rss_bytes: process.memory(),
            virtual_bytes: process.virtual_memory(),
            source: UsageSource::Sysinfo,
        })
    }
}

/// Reads `VmRSS`/`VmSize` from `/proc/<pid>/status`.
pub struct ProcStatusProbe;

impl UsageProbe for ProcStatusProbe {
    fn name(&self) -> &'static str {
        "proc-status"
    }

    fn probe(&self, pid: u32) -> AnyResult<ResourceUsage> {
        let path = format!("/proc/{pid}/status");
        let text = std::fs::read_to_string(&path).with_context(|| format!("read {path}"))?;
        parse_proc_status(&text).ok_or_else(|| anyhow!("no VmRSS line in {path}"))
    }
}

// VmRSS is required, VmSize optional.
pub fn parse_proc_status(text: &str) -> Option<ResourceUsage> {
    let kb = |key: &str| {
        text.lines()
            .find_map(|l| l.strip_prefix(key))
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|v| v.parse::<u64>().ok())
    };
    let rss_kb = kb("VmRSS:")?;
    Some(ResourceUsage {
        rss_bytes: rss_kb * 1024,
        virtual_bytes: kb("VmSize:").unwrap_or(0) * 1024,
        source: UsageSource::ProcStatus,
    })
}

pub fn default_probes() -> Vec<Box<dyn UsageProbe>> {
    vec![Box::new(SysinfoProbe), Box::new(ProcStatusProbe)]
}

pub fn resource_usage_with(probes: &[Box<dyn UsageProbe>], pid: u32) -> ResourceUsage {
    for p in probes {
        match p.probe(pid) {
            Ok(u) => return u,
            Err(e) => debug!(probe = p.name(), error = %format!("{e:#}"), "usage probe failed"),
        }
    }
    ResourceUsage::default()
}

pub fn resource_usage(pid: u32) -> ResourceUsage {
    resource_usage_with(&default_probes(), pid)
}
