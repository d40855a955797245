//! The special leaves S2, split three ways.
//!
//! Every leaf is a pair n = p_b * m with m in (y / p_b, y],
//! lpf(m) > p_b, contributing -mu(m) * phi(x / n, b - 1). For
//! p_b > sqrt(y) the cofactor m is necessarily prime, and the
//! leaf's phi argument t = x / n decides its fate:
//!
//! * t < p_b          -> trivial: phi = 1, a pi difference
//! * p_b <= t < y     -> easy: phi = pi(t) - b + 2, one lookup
//! * t >= y           -> hard: phi needs the sieve
//!
//! For p_b <= sqrt(y) composite cofactors exist and everything
//! goes through the sieve.

use crate::balance::{LoadBalancer, Runtime, WorkChunk};
use crate::helpe::*;
use crate::phi::tiny_prime;
use crate::resume::{FormulaRecord, ResumeLog};
use crate::status;

/// Trivial leaves satisfy phi(x / n, b - 1) = 1, so each prime
/// p in (max(p_c, sqrt(z)), y] contributes the count of primes
/// q in (max(x / p^2, p), y].
pub fn s2_trivial<T: WideInt>(
    x: T,
    y: i64,
    z: i64,
    c: i64,
    threads: usize,
    log: &ResumeLog,
) -> T {
    let time = get_wtime();
    status::print_header("S2_trivial(x, y)");

    if let Some(sum) = log.is_resume("S2_trivial", x, y, z) {
        status::print_result("S2_trivial", sum, time);
        return sum;
    }

    let threads = ideal_num_threads(threads, y, ipow(10, 7));
    let pi = PiTable::new(y);
    let pi_y = pi.get(y);
    let sqrtz = isqrt(z.max(0) as u64) as i64;
    let start = tiny_prime(c).max(sqrtz) + 1;
    let thread_distance = ceil_div((y - start).max(1), threads as i64).max(1);

    let sum = (0..threads as i64)
        .into_par_iter()
        .map(|i| {
            let lo = start + thread_distance * i;
            let hi = (lo + thread_distance).min(y);
            let mut it = PrimeStream::new(lo - 1, hi);
            let mut local = T::ZERO;
            while let Some(prime) = it.next_prime() {
                if prime >= hi {
                    break;
                }
                let xn = x.fast_div(prime).fast_div64(prime).max(prime);
                local += T::from_i64(pi_y - pi.get(xn));
            }
            local
        })
        .reduce(|| T::ZERO, |p, q| p + q);

    log.store(
        "S2_trivial",
        FormulaRecord::new(x, y, z, sum, 100.0, get_wtime() - time),
    );
    status::print_result("S2_trivial", sum, time);
    sum
}

/// Easy leaves: prime cofactors q with x / (p_b * q) below y, so
/// phi collapses to a PiTable lookup.
pub fn s2_easy<T: WideInt>(x: T, y: i64, c: i64, threads: usize) -> T {
    let time = get_wtime();
    status::print_header("S2_easy(x, y)");

    let x13 = iroot::<3>(x.as_i128().max(0) as u128) as i64;
    let threads = ideal_num_threads(threads, x13, 1000);
    let pi = PiTable::new(y);
    let primes = generate_primes(y);
    let pi_sqrty = pi.get(isqrt(y.max(0) as u64) as i64);
    let pi_x13 = pi.get(x13.min(y));
    let b_min = c.max(pi_sqrty);

    let min_len = ceil_div((pi_x13 - b_min).max(1), threads as i64 * 4).max(1) as usize;
    let sum = ((b_min + 1) as usize..(pi_x13 as usize + 1))
        .into_par_iter()
        .with_min_len(min_len)
        .map(|b| {
            let b = b as i64;
            let prime = primes[b as usize];
            let xp = x.fast_div(prime);
            // q ranges over (max(prime, x/(prime*y)), min(y, x/prime^2)]
            let q_min = xp.fast_div64(y).max(prime);
            let q_max = xp.fast_div64(prime).min(y);
            let l_min = pi.get(q_min.min(y));
            let l_max = pi.get(q_max);
            let mut sum_b = T::ZERO;
            for l in (l_min + 1)..=l_max {
                let xn = xp.fast_div64(primes[l as usize]);
                sum_b += T::from_i64(pi.get(xn) - b + 2);
            }
            sum_b
        })
        .reduce(|| T::ZERO, |p, q| p + q);

    status::print_result("S2_easy", sum, time);
    sum
}

/// Per-chunk output of the hard-leaves sieve. The phi counts a
/// chunk sees are relative to its own start, so the dispatcher
/// folds chunks together in position order with a running carry,
/// exactly like the P2 merge.
struct ChunkRec {
    low: i64,
    sum: i128,
    /// unsieved counts per b, over the whole chunk
    phi: Vec<i64>,
    /// signed leaf multiplicities per b
    leaves: Vec<i64>,
}

/// Hard leaves: phi(t, b - 1) with t in the sieve range. A byte
/// sieve over [1, z] is advanced prime by prime; the leaves of
/// each b are visited in increasing t, so a single forward cursor
/// per (segment, b) yields all counts.
///
/// The sieve only owns leaves whose smallest factor is at most
/// `prime_limit`: Gourdon's assembly hands everything above that
/// bound to [a_hard_leaves](super::a::a_hard_leaves), where phi
/// reduces to pi lookups. The Deleglise-Rivat caller passes y,
/// which makes the cap inert.
pub fn s2_hard<T: WideInt>(
    x: T,
    y: i64,
    z: i64,
    c: i64,
    prime_limit: i64,
    s2_hard_approx: MaxInt,
    threads: usize,
) -> T {
    let time = get_wtime();
    status::print_header("S2_hard(x, y)");

    let pi = PiTable::new(y);
    let primes = generate_primes(y);
    let mu = generate_moebius(y);
    let lpf = generate_lpf(y);
    let pi_sqrty = pi.get(isqrt(y.max(0) as u64) as i64);
    let sqrtz = isqrt(z.max(0) as u64) as i64;
    let max_b = pi.get(sqrtz.min(y).min(prime_limit.max(0)));
    if max_b <= c {
        return T::ZERO;
    }

    let threads = ideal_num_threads(threads, z, 10_000);

    // Most hard leaves sit just past this point; the balancer
    // narrows to single segments while crossing it.
    let alpha = (y as f64 / x.to_f64().powf(1.0 / 3.0)).max(1.0);
    let leaf_marker =
        (x.to_f64() / (y as f64 * alpha.sqrt() * x.to_f64().powf(1.0 / 6.0))) as i64;
    let balancer = LoadBalancer::new(z, s2_hard_approx, in_between(0, leaf_marker, z));

    let records: Mutex<Vec<ChunkRec>> = Mutex::new(Vec::new());
    let run_times: Mutex<Vec<f64>> = Mutex::new(Vec::new());

    rayon::scope(|scope| {
        for _ in 0..threads {
            let balancer = &balancer;
            let records = &records;
            let run_times = &run_times;
            let (pi, primes, mu, lpf) = (&pi, &primes, &mu, &lpf);
            scope.spawn(move |_| {
                let mut runtime = Runtime::default();
                let mut prev: Option<(i64, MaxInt)> = None;
                let mut total = 0.0;
                while let Some(chunk) = balancer.get_work(prev, &runtime) {
                    let t0 = get_wtime();
                    let rec = sieve_chunk(
                        x, y, z, c, max_b, pi_sqrty, primes, mu, lpf, pi, &chunk,
                        &mut runtime,
                    );
                    runtime.secs = (get_wtime() - t0).max(1e-9);
                    total += runtime.secs;
                    prev = Some((chunk.low, rec.sum));
                    records.lock().unwrap().push(rec);
                }
                run_times.lock().unwrap().push(total);
            });
        }
    });

    // Fold the chunks in position order: each chunk's leaves are
    // missing the unsieved counts of everything before it.
    let mut recs = records.into_inner().unwrap();
    recs.sort_by_key(|r| r.low);
    let blen = (max_b - c) as usize;
    let mut carry = vec![0i64; blen];
    let mut correction: MaxInt = 0;
    for rec in &recs {
        for j in 0..blen {
            correction += carry[j] as MaxInt * rec.leaves[j] as MaxInt;
            carry[j] += rec.phi[j];
        }
    }
    let sum = T::from_i128(balancer.result() + correction);

    if print_status() {
        let times = run_times.into_inner().unwrap();
        status::print_percent(100.0, status::rsd(&times));
        eprintln!();
    }
    status::print_result("S2_hard", sum, time);
    sum
}

/// Strike every multiple of `prime` inside the segment starting
/// at `seg_low`.
fn strike(sieve: &mut [bool], prime: i64, seg_low: i64) {
    let mut m = ceil_div(seg_low, prime) * prime;
    while ((m - seg_low) as usize) < sieve.len() {
        sieve[(m - seg_low) as usize] = false;
        m += prime;
    }
}

#[allow(clippy::too_many_arguments)]
fn sieve_chunk<T: WideInt>(
    x: T,
    y: i64,
    z: i64,
    c: i64,
    max_b: i64,
    pi_sqrty: i64,
    primes: &[i64],
    mu: &[i8],
    lpf: &[i64],
    pi: &PiTable,
    chunk: &WorkChunk,
    runtime: &mut Runtime,
) -> ChunkRec {
    let init_time = get_wtime();
    let chunk_end = chunk.end(z);
    let blen = (max_b - c) as usize;
    let mut phi = vec![0i64; blen];
    let mut leaves = vec![0i64; blen];
    let mut sum: i128 = 0;
    let mut sieve = vec![true; chunk.segment_size as usize];
    runtime.init = (get_wtime() - init_time).max(1e-9);

    let mut seg_low = chunk.low;
    while seg_low < chunk_end {
        let seg_high = (seg_low + chunk.segment_size).min(chunk_end);
        let len = (seg_high - seg_low) as usize;
        sieve[..len].fill(true);

        // base state: sieved by the wheel primes
        for b in 1..=c {
            strike(&mut sieve[..len], primes[b as usize], seg_low);
        }

        for b in (c + 1)..=max_b {
            let prime = primes[b as usize];
            let idx = (b - c - 1) as usize;
            let xp = x.fast_div(prime);
            let mut pos = 0usize;
            let mut count = 0i64;

            if b <= pi_sqrty {
                // squarefree cofactors m in (y / prime, y],
                // restricted to the m whose leaf lands in this
                // segment; decreasing m walks t forward
                let m_max = xp.fast_div64(seg_low).min(y);
                let m_min = (y / prime).max(xp.fast_div64(seg_high));
                for m in ((m_min + 1)..=m_max).rev() {
                    let mi = m as usize;
                    if mu[mi] != 0 && lpf[mi] > prime {
                        let t = xp.fast_div64(m);
                        debug_assert!(t >= seg_low && t < seg_high);
                        let target = (t - seg_low) as usize;
                        while pos <= target {
                            count += sieve[pos] as i64;
                            pos += 1;
                        }
                        let phi_t = phi[idx] + count;
                        if mu[mi] > 0 {
                            sum -= phi_t as i128;
                            leaves[idx] -= 1;
                        } else {
                            sum += phi_t as i128;
                            leaves[idx] += 1;
                        }
                    }
                }
            } else {
                // prime cofactors; only t >= y is ours, smaller t
                // was settled by the easy and trivial formulas
                let t_min = seg_low.max(y);
                if t_min < seg_high {
                    let q_max = xp.fast_div64(t_min).min(y);
                    let q_min = xp.fast_div64(seg_high).max(prime);
                    let l_max = pi.get(q_max);
                    let l_min = pi.get(q_min.min(y));
                    for l in ((l_min + 1)..=l_max).rev() {
                        let q = primes[l as usize];
                        let t = xp.fast_div64(q);
                        debug_assert!(t >= seg_low && t < seg_high && t >= y);
                        let target = (t - seg_low) as usize;
                        while pos <= target {
                            count += sieve[pos] as i64;
                            pos += 1;
                        }
                        sum += (phi[idx] + count) as i128;
                        leaves[idx] += 1;
                    }
                }
            }

            // the next segment needs phi over this whole one
            while pos < len {
                count += sieve[pos] as i64;
                pos += 1;
            }
            phi[idx] += count;
            strike(&mut sieve[..len], prime, seg_low);
        }
        seg_low = seg_high;
    }

    ChunkRec { low: chunk.low, sum, phi, leaves }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phi::{get_c, phi};
    use rand::prelude::*;

    /// The whole S2 sum, straight from the definition.
    fn s2_brute(x: i64, y: i64, c: i64) -> i64 {
        let primes = generate_primes(y);
        let mu = generate_moebius(y);
        let lpf = generate_lpf(y);
        let mut sum = 0i64;
        for b in (c + 1)..primes.len() as i64 {
            let p = primes[b as usize];
            for m in (y / p + 1)..=y {
                let mi = m as usize;
                if mu[mi] != 0 && lpf[mi] > p {
                    sum -= mu[mi] as i64 * phi(x / (p * m), b - 1, 1);
                }
            }
        }
        sum
    }

    fn s2_all(x: i64, y: i64, threads: usize) -> i64 {
        let z = x / y;
        let c = get_c(y);
        let path = std::env::temp_dir().join(format!(
            "picount-s2-test-{}-{x}-{y}.json",
            std::process::id()
        ));
        // a stale checkpoint would short-circuit the computation
        let _ = std::fs::remove_file(&path);
        let log = ResumeLog::at(path);
        s2_trivial(x, y, z, c, threads, &log)
            + s2_easy(x, y, c, threads)
            + s2_hard(x, y, z, c, y, 0, threads)
    }

    #[test]
    fn split_covers_every_leaf() {
        // y = x^(1/3) exercises the pure-sieve regime, larger y
        // moves leaves into the easy and trivial formulas
        for (x, y) in [(100_000i64, 47i64), (100_000, 150), (1_000_000, 100), (1_000_000, 400)] {
            assert_eq!(s2_all(x, y, 2), s2_brute(x, y, get_c(y)), "S2({x}, {y})");
        }
    }

    #[test]
    fn trivial_matches_naive_double_loop() {
        // the classic cross-check, on random inputs
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);
        for _ in 0..20 {
            let x = rng.gen_range(100..1_000_000i64);
            let x13 = iroot::<3>(x as u128) as i64;
            let y = (x13 * 2).min(isqrt(x as u64) as i64).max(2);
            let z = x / y;
            let c = get_c(y);
            let primes = generate_primes(y);

            let mut expected = 0i64;
            for b in (c + 1)..primes.len() as i64 {
                for l in (b + 1)..primes.len() as i64 {
                    let n = primes[b as usize] * primes[l as usize];
                    if n > x {
                        break;
                    }
                    if phi(x / n, b - 1, 1) == 1 {
                        expected += 1;
                    }
                }
            }

            let log = ResumeLog::at(std::env::temp_dir().join(format!(
                "picount-s2t-test-{}-{x}.json",
                std::process::id()
            )));
            let got = s2_trivial(x, y, z, c, 2, &log);
            assert_eq!(got, expected, "S2_trivial({x}, {y})");
            // and the checkpoint round-trips
            assert_eq!(log.is_resume("S2_trivial", x, y, z), Some(expected));
        }
    }

    #[test]
    fn thread_count_invariant() {
        // z = x / y is large enough that the balancer really
        // dispatches to several workers
        let (x, y) = (20_000_000i64, 300i64);
        let reference = s2_all(x, y, 1);
        assert_eq!(reference, s2_brute(x, y, get_c(y)));
        for t in [2, 4, 8] {
            assert_eq!(s2_all(x, y, t), reference, "threads={t}");
        }
    }

    #[test]
    fn prime_limit_hands_leaves_to_the_lookup_path() {
        use crate::formula::a::{a_hard_leaves, a_start};
        // capping the sieve at a_start and adding the A-based
        // lookup term must reproduce the uncapped sieve exactly
        let (x, y) = (20_000_000i64, 600i64);
        let z = x / y;
        let c = get_c(y);
        let full = s2_hard(x, y, z, c, y, 0, 2);
        let capped = s2_hard(x, y, z, c, a_start(x, y), 0, 2);
        assert_eq!(capped + a_hard_leaves(x, y, 2), full);
    }

    #[test]
    fn wide_kernels_agree_with_narrow() {
        let (x, y) = (500_000i64, 120i64);
        let z = x / y;
        let c = get_c(y);
        assert_eq!(
            s2_hard(x as i128, y, z, c, y, 0, 2).to_i64(),
            s2_hard(x, y, z, c, y, 0, 2)
        );
        assert_eq!(s2_easy(x as i128, y, c, 2).to_i64(), s2_easy(x, y, c, 2));
    }
}
