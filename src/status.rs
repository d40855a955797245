//! Progress reporting. Two numbers are published: a percent-done
//! estimate and the relative standard deviation of the per-thread
//! runtimes, shown as "load balance".

use crate::helpe::*;

/// The raw completion ratio of the special-leaves sieve crawls
/// through the dense prefix and then sprints, which looks broken
/// on a terminal. The probe below bends it through a pow curve so
/// the printed number grows roughly linearly in wall time. The
/// skew is cosmetic; nothing may schedule off it.
#[derive(Default)]
pub struct Status {
    last_percent: f64,
}

impl Status {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotone non-decreasing percent estimate, fed by both the
    /// sieve position and the accumulated sum.
    pub fn percent(&mut self, low: i64, limit: i64, sum: MaxInt, sum_approx: MaxInt) -> f64 {
        let by_low = if limit > 0 {
            100.0 * low as f64 / limit as f64
        } else {
            100.0
        };
        let by_sum = if sum_approx > 0 {
            100.0 * sum as f64 / sum_approx as f64
        } else {
            0.0
        };
        let raw = by_low.max(by_sum).max(0.0).min(100.0);
        let skewed = skew(raw);
        if skewed > self.last_percent {
            self.last_percent = skewed;
        }
        self.last_percent
    }
}

fn skew(percent: f64) -> f64 {
    let base = 0.95 + percent / 2100.0;
    let low = base.powf(100.0);
    let span = 1.0 - low;
    if span <= 0.0 {
        return percent;
    }
    let bent = 100.0 * (base.powf(percent) - low) / span;
    100.0 - bent.max(0.0).min(100.0)
}

/// Relative standard deviation of the per-thread runtimes, in
/// percent of the mean.
pub fn rsd(times: &[f64]) -> f64 {
    if times.len() < 2 {
        return 0.0;
    }
    let mean = times.iter().sum::<f64>() / times.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }
    let var = times.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / times.len() as f64;
    100.0 * var.sqrt() / mean
}

pub fn print_percent(percent: f64, load_rsd: f64) {
    let load_balance = (100.0 - load_rsd + 0.5).clamp(0.0, 100.0) as i64;
    eprint!("\rStatus: {}%, Load balance: {}%", percent as i64, load_balance);
}

pub fn print_header(name: &str) {
    if print_status() {
        eprintln!();
        eprintln!("=== {name} ===");
    }
}

pub fn print_result(name: &str, result: impl std::fmt::Display, start: f64) {
    if print_status() {
        eprintln!("{name} = {result}");
        eprintln!("Seconds: {:.3}", get_wtime() - start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_monotone_and_bounded() {
        let mut status = Status::new();
        let mut last = 0.0;
        for low in (0..=1000).step_by(50) {
            let p = status.percent(low, 1000, low as MaxInt, 1000);
            assert!(p >= last, "went backwards at low={low}");
            assert!((0.0..=100.0).contains(&p));
            last = p;
        }
        assert!(status.percent(1000, 1000, 1000, 1000) > 99.9);
    }

    #[test]
    fn percent_tracks_the_larger_signal() {
        let mut a = Status::new();
        let mut b = Status::new();
        // identical low, larger sum: at least as far along
        let pa = a.percent(10, 1000, 900, 1000);
        let pb = b.percent(10, 1000, 0, 1000);
        assert!(pa >= pb);
    }

    #[test]
    fn rsd_of_balanced_threads_is_zero() {
        assert_eq!(rsd(&[1.0, 1.0, 1.0, 1.0]), 0.0);
        assert_eq!(rsd(&[5.0]), 0.0);
        assert!(rsd(&[1.0, 3.0]) > 0.0);
    }
}
