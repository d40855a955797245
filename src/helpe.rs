pub use std::{
    sync::{Arc, Mutex, OnceLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    collections::HashMap,
    path::PathBuf,
    time::Instant,
};
pub use thiserror::Error;
pub use itertools::Itertools;
pub use rayon::prelude::*;
pub use indexmap::IndexMap;
pub use clap::{Parser, ValueEnum};

pub use crate::{
    imath::*,
    wide::WideInt,
    primes::*,
    pi_table::PiTable,
    aligned::AlignedSlots,
};

/// The widest integer the library computes with. Every formula
/// narrows to `i64` whenever x fits, so this type only pays its
/// cost above 2^63.
pub type MaxInt = i128;

/// Sentinel meaning "use every hardware thread".
pub const MAX_THREADS: usize = usize::MAX;

/// Arguments below this bound are answered by the sieve directly.
/// This is also what breaks the pi <-> nth_prime circularity: the
/// tiny lookups the formulas need never reach the big machinery.
pub const SIEVE_LIMIT: i64 = 100_000;

static THREADS: AtomicUsize = AtomicUsize::new(MAX_THREADS);
static PRINT_STATUS: AtomicBool = AtomicBool::new(false);
static EPOCH: OnceLock<Instant> = OnceLock::new();

pub fn set_num_threads(threads: usize) {
    THREADS.store(threads.max(1), Ordering::Relaxed);
}

/// The currently configured thread count, resolved against the
/// hardware if it was left at [MAX_THREADS].
pub fn get_num_threads() -> usize {
    let t = THREADS.load(Ordering::Relaxed);
    if t == MAX_THREADS {
        num_cpus::get()
    } else {
        t.min(num_cpus::get()).max(1)
    }
}

pub fn set_print_status(enable: bool) {
    PRINT_STATUS.store(enable, Ordering::Relaxed);
}

pub fn print_status() -> bool {
    PRINT_STATUS.load(Ordering::Relaxed)
}

/// Wall time in seconds since the library was first touched.
pub fn get_wtime() -> f64 {
    EPOCH.get_or_init(Instant::now).elapsed().as_secs_f64()
}

/// Clamps a requested thread count so that every thread has at
/// least `min_work` units to chew on. Each formula passes its own
/// threshold; spawning a thread for less work than that loses more
/// to startup than it gains.
pub fn ideal_num_threads(threads: usize, work: i64, min_work: i64) -> usize {
    let threads = if threads == MAX_THREADS { num_cpus::get() } else { threads };
    let max_threads = (work / min_work.max(1)).max(1) as usize;
    in_between(1, threads, max_threads.min(num_cpus::get()))
}
