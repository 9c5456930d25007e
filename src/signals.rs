#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use anyhow::Result as AnyResult;
use tracing::info;

use crate::domain::{ShutdownReason, ShutdownTrigger};

/// Must be installed before the first tick; it replaces the default terminate action.
#[cfg(unix)]
pub struct ShutdownSignals {
    term: tokio::signal::unix::Signal,
    int: tokio::signal::unix::Signal,
    usr1: tokio::signal::unix::Signal,
    usr2: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    pub fn install() -> AnyResult<Self> {
        use anyhow::Context;
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            term: signal(SignalKind::terminate()).context("install SIGTERM handler")?,
            int: signal(SignalKind::interrupt()).context("install SIGINT handler")?,
            usr1: signal(SignalKind::user_defined1()).context("install SIGUSR1 handler")?,
            usr2: signal(SignalKind::user_defined2()).context("install SIGUSR2 handler")?,
        })
    }

    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.term.recv() => "SIGTERM",
            _ = self.int.recv() => "SIGINT",
            _ = self.usr1.recv() => "SIGUSR1",
            _ = self.usr2.recv() => "SIGUSR2",
        }
    }
}

#[cfg(not(unix))]
pub struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    pub fn install() -> AnyResult<Self> {
        Ok(Self)
    }

    pub async fn recv(&mut self) -> &'static str {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        "SIGINT"
    }
}

pub fn spawn_signal_listener(trigger: ShutdownTrigger) -> AnyResult<tokio::task::JoinHandle<()>> {
    let mut signals = ShutdownSignals::install()?;
    Ok(tokio::spawn(async move {
        let name = signals.recv().await;
        info!(signal = name, "shutdown signal received");
        trigger.trigger(ShutdownReason::Signal(name));
    }))
}
