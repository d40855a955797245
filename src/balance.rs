//! The dispatcher for the hard special-leaves sieve.
//!
//! Splitting [1, sieve_limit] into equal per-thread intervals does
//! not scale: the leaves are heavily skewed toward the front of
//! the range, so one thread would own nearly all the work. Instead
//! threads pull variable-size chunks through a single critical
//! section. Chunks start small, double while the dense prefix
//! lasts, and contract near the tail so that no thread is ever
//! holding more than a quarter of the remaining work.

use crate::helpe::*;
use crate::status::Status;

/// Wall-clock profile of one worker's last chunk. `init` is the
/// setup portion (allocating and priming the sieve), `secs` the
/// whole chunk.
#[derive(Default, Clone, Copy)]
pub struct Runtime {
    pub init: f64,
    pub secs: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct WorkChunk {
    pub low: i64,
    pub segments: i64,
    pub segment_size: i64,
}

impl WorkChunk {
    /// Exclusive end of the chunk, clamped to the sieve limit.
    #[inline]
    pub fn end(&self, sieve_limit: i64) -> i64 {
        (self.low + self.segments * self.segment_size).min(sieve_limit + 1)
    }
}

struct Dispatch {
    low: i64,
    max_low: i64,
    segments: i64,
    segment_size: i64,
    sum: MaxInt,
    status: Status,
}

pub struct LoadBalancer {
    state: Mutex<Dispatch>,
    sieve_limit: i64,
    max_size: i64,
    sum_approx: MaxInt,
    smallest_hard_leaf: i64,
    start_time: f64,
}

const MIN_SEGMENT_SIZE: i64 = 1 << 9;

impl LoadBalancer {
    pub fn new(sieve_limit: i64, sum_approx: MaxInt, smallest_hard_leaf: i64) -> Self {
        let sqrt = isqrt(sieve_limit.max(1) as u64) as i64;
        let segment_size =
            next_power_of_2(MIN_SEGMENT_SIZE.max(sqrt / ilog(sqrt)));
        let max_size = next_power_of_2(sqrt.max(30 * (1 << 15)));
        Self {
            state: Mutex::new(Dispatch {
                low: 1,
                max_low: 0,
                segments: 1,
                segment_size,
                sum: 0,
                status: Status::new(),
            }),
            sieve_limit,
            max_size,
            sum_approx,
            smallest_hard_leaf,
            start_time: get_wtime(),
        }
    }

    /// One dispatch. The worker reports its previous chunk as
    /// `(low, sum_delta)`; `None` on the first call. Returns
    /// `None` once the whole range has been handed out.
    pub fn get_work(&self, prev: Option<(i64, MaxInt)>, runtime: &Runtime) -> Option<WorkChunk> {
        let (chunk, percent) = {
            let mut d = self.state.lock().unwrap();

            if let Some((prev_low, sum_delta)) = prev {
                d.sum += sum_delta;
                if prev_low > d.max_low {
                    d.max_low = prev_low;
                    if d.sum == 0 {
                        // still inside the leaf-dense prefix:
                        // keep chunks small
                    } else if d.segment_size < self.max_size {
                        d.segment_size = (d.segment_size * 2).min(self.max_size);
                    } else {
                        self.update_segments(&mut d, runtime);
                    }
                }
            }

            if d.low > self.sieve_limit {
                return None;
            }

            // Most hard leaves sit just past this marker; crossing
            // it with a wide chunk would hand the bulk of the work
            // to one thread.
            let high = d.low + d.segments * d.segment_size;
            if d.low <= self.smallest_hard_leaf && high >= self.smallest_hard_leaf {
                d.segments = 1;
            }

            let chunk = WorkChunk {
                low: d.low,
                segments: d.segments,
                segment_size: d.segment_size,
            };
            d.low += d.segments * d.segment_size;

            let percent = if print_status() {
                let (low, sum) = (d.low, d.sum);
                Some(d.status.percent(low, self.sieve_limit, sum, self.sum_approx))
            } else {
                None
            };
            (chunk, percent)
        };

        if let Some(p) = percent {
            crate::status::print_percent(p, 0.0);
        }
        Some(chunk)
    }

    /// Tail contraction. The chunk a thread receives should cost
    /// roughly a quarter of the time still remaining, so threads
    /// converge on the finish line together.
    fn update_segments(&self, d: &mut Dispatch, runtime: &Runtime) {
        let (low, sum) = (d.low, d.sum);
        let percent = d
            .status
            .percent(low, self.sieve_limit, sum, self.sum_approx)
            .max(10.0);
        let elapsed = get_wtime() - self.start_time;
        let remaining = elapsed * (100.0 / percent - 1.0);
        let threshold = (remaining / 4.0).max(runtime.init * 10.0).max(0.01);

        let mut factor = threshold / runtime.secs.max(0.001);
        // A chunk that ran vastly longer than its own setup was
        // oversized no matter what the estimate says.
        if runtime.secs > runtime.init * 1000.0 {
            factor = factor.min(runtime.init * 1000.0 / runtime.secs);
        }
        let factor = factor.clamp(0.5, 2.0);
        d.segments = ((d.segments as f64 * factor).round() as i64).max(1);
    }

    /// The accumulated sum of everything reported through
    /// [get_work].
    pub fn result(&self) -> MaxInt {
        self.state.lock().unwrap().sum
    }

    pub fn sieve_limit(&self) -> i64 {
        self.sieve_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(balancer: &LoadBalancer, delta: MaxInt) -> Vec<WorkChunk> {
        let runtime = Runtime { init: 0.0001, secs: 0.01 };
        let mut chunks = vec![];
        let mut prev = None;
        while let Some(chunk) = balancer.get_work(prev, &runtime) {
            prev = Some((chunk.low, delta));
            chunks.push(chunk);
        }
        chunks
    }

    #[test]
    fn chunks_tile_the_range_exactly() {
        for limit in [1_000i64, 123_456, 5_000_000] {
            let balancer = LoadBalancer::new(limit, 1_000_000, 0);
            let chunks = drain(&balancer, 1);
            assert_eq!(chunks[0].low, 1);
            for pair in chunks.windows(2) {
                let end = pair[0].low + pair[0].segments * pair[0].segment_size;
                assert_eq!(end, pair[1].low, "gap or overlap at {}", pair[1].low);
            }
            let last = chunks.last().unwrap();
            assert!(last.low <= limit);
            assert!(last.low + last.segments * last.segment_size > limit);
            assert_eq!(last.end(limit), limit + 1);
        }
    }

    #[test]
    fn segment_size_stays_bounded() {
        let limit = 50_000_000;
        let balancer = LoadBalancer::new(limit, 1_000_000, 0);
        for chunk in drain(&balancer, 1) {
            assert!(chunk.segment_size >= MIN_SEGMENT_SIZE);
            assert!(chunk.segment_size <= balancer.max_size);
            assert_eq!(chunk.segment_size.count_ones(), 1, "not a power of two");
            assert!(chunk.segments >= 1);
        }
    }

    #[test]
    fn dense_prefix_defers_growth() {
        let balancer = LoadBalancer::new(10_000_000, 1_000_000, 0);
        // zero deltas: the balancer must not grow segment_size
        let runtime = Runtime { init: 0.0001, secs: 0.01 };
        let mut prev = None;
        let mut sizes = vec![];
        for _ in 0..5 {
            let chunk = balancer.get_work(prev, &runtime).unwrap();
            prev = Some((chunk.low, 0));
            sizes.push(chunk.segment_size);
        }
        assert!(sizes.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn accumulates_the_exact_sum() {
        let balancer = LoadBalancer::new(100_000, 0, 0);
        let chunks = drain(&balancer, 7);
        assert_eq!(balancer.result(), 7 * chunks.len() as MaxInt);
    }
}
