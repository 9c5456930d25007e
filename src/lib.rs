#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod domain;
pub mod http;
pub mod lib_cpu;
pub mod lib_file;
pub mod lib_mem;
pub mod metrics;
pub mod service;
pub mod signals;
pub mod status_log;
pub mod usage;
pub mod validation;

pub use config::WorkloadConfig;
pub use domain::{
    shutdown_channel, AppState, Phase, ScratchRecord, ShutdownListener, ShutdownReason,
    ShutdownTrigger, SimulatorStatus, StatusBoard,
};
pub use http::serve;
pub use http::{health, healthz, scrape_metrics, shutdown, status};
pub use metrics::Metrics;
pub use service::Simulator;
pub use usage::{resource_usage, ResourceUsage};
pub use validation::validate_config;
