#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use rand::Rng;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug)]
pub struct BusyResult {
    pub value: f64,
    pub rounds: u64,
    pub elapsed: Duration,
}

/// Spins on random arithmetic until `budget` of wall-clock time has passed.
pub fn busy_compute(budget: Duration) -> BusyResult {
    let mut rng = rand::rng();
    let start = Instant::now();
    let mut value = 0f64;
    let mut rounds = 0u64;
    while start.elapsed() < budget {
        let x: f64 = rng.random();
        value += x * x;
        rounds += 1;
    }
    BusyResult {
        value: std::hint::black_box(value),
        rounds,
        elapsed: start.elapsed(),
    }
}
