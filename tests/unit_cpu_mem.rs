#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use dummy_workload::lib_cpu::busy_compute;
use dummy_workload::lib_mem::MemoryBallast;
use std::time::Duration;

#[test]
fn cpu_runs_for_budget() {
    let r = busy_compute(Duration::from_millis(20));
    assert!(r.elapsed >= Duration::from_millis(20));
    assert!(r.rounds > 0);
    assert!(r.value >= 0.0);
}

#[test]
fn mem_never_exceeds_cap() {
    let mut m = MemoryBallast::new(4096, 3);
    for i in 1..=10 {
        m.grow().expect("grow");
        assert!(m.len() <= 3, "len {} after grow {i}", m.len());
    }
    assert_eq!(m.len(), 3);
    assert_eq!(m.held_bytes(), 3 * 4096);
}

#[test]
fn mem_evicts_one_per_grow_at_cap() {
    let mut m = MemoryBallast::new(16, 2);
    assert_eq!(m.grow().expect("grow"), 0);
    assert_eq!(m.grow().expect("grow"), 0);
    assert_eq!(m.grow().expect("grow"), 1);
}

#[test]
fn mem_grows_on_cadence_only() {
    let mut m = MemoryBallast::new(16, 50);
    let grown = (1..=30)
        .filter(|i| m.maybe_grow(*i, 10).expect("grow"))
        .count();
    assert_eq!(grown, 3);
    assert_eq!(m.len(), 3);
}

#[test]
fn mem_release_empties() {
    let mut m = MemoryBallast::new(1024, 4);
    m.grow().expect("grow");
    m.grow().expect("grow");
    m.release();
    assert!(m.is_empty());
    assert_eq!(m.held_bytes(), 0);
}

#[test]
fn mem_unallocatable_chunk_is_an_error() {
    let mut m = MemoryBallast::new(usize::MAX, 2);
    let err = m.grow().expect_err("capacity overflow");
    assert!(format!("{err:#}").contains("allocate"));
    assert!(m.is_empty());
    assert!(m.maybe_grow(10, 10).is_err());
    assert!(m.maybe_grow(11, 10).is_ok());
}
