#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use clap::Parser;
use dummy_workload::{
    serve, shutdown_channel, signals, AppState, Metrics, Simulator, StatusBoard, WorkloadConfig,
};
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let fmt = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr);
    fmt.json().init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cfg = WorkloadConfig::parse();

    let metrics = Metrics::new()?;
    let board = StatusBoard::default();
    let (trigger, listener) = shutdown_channel();
    signals::spawn_signal_listener(trigger.clone())?;

    let http_bind = cfg.http_bind.clone();
    let mut sim = match Simulator::new(cfg, metrics.clone(), board.clone(), listener) {
        Ok(sim) => sim,
        Err(e) => {
            error!(error = %format!("{e:#}"), "startup failed");
            return Err(e.into());
        }
    };

    if let Some(bind) = http_bind {
        let state = AppState {
            board,
            metrics,
            shutdown: trigger,
        };
        let server = serve(&bind, state)?;
        info!(bind = %bind, "status endpoint listening");
        tokio::spawn(async move {
            if let Err(e) = server.await {
                error!(error = %e, "status endpoint stopped");
            }
        });
    }

    let reason = match sim.start().await {
        Ok(reason) => reason,
        Err(e) => {
            error!(error = %format!("{e:#}"), "startup failed");
            return Err(e.into());
        }
    };
    info!(reason = %reason, "exiting");
    Ok(())
}
