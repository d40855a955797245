//! B(x, y) and the second partial sieve function P2.
//!
//! B(x, y) = sum over primes y < p <= sqrt(x) of pi(x / p). The
//! pi values are never looked up in a table; both the primes p
//! (walked backward) and the counting range (walked forward) are
//! streamed, so memory stays at O(sqrt(z)) while the operation
//! count is O(z log log z), z = x / y.

use crate::helpe::*;
use crate::status;

/// Count the primes <= stop, advancing the forward cursor.
/// `next` holds the next unconsumed prime of the stream.
fn count_to(stream: &mut PrimeStream, next: &mut i64, stop: i64) -> i64 {
    let mut count = 0;
    while *next <= stop {
        count += 1;
        *next = stream.next_prime().unwrap_or(i64::MAX);
    }
    count
}

/// One thread's share: primes are counted relative to the chunk
/// start, so `pix` and `pix_count` must be folded back in chunk
/// order by the caller.
fn b_thread<T: WideInt>(
    x: T,
    y: i64,
    z: i64,
    low: i64,
    thread_num: i64,
    thread_distance: i64,
    pix: &mut i64,
    pix_count: &mut i64,
) -> T {
    let mut sum = T::ZERO;
    *pix = 0;
    *pix_count = 0;

    let low = low + thread_distance * thread_num;
    let z = (low + thread_distance).min(z);
    let start = x.fast_div64(z).max(y);
    let stop = x.fast_div64(low).min(isqrt_u128(x.as_i128() as u128) as i64);

    let mut it = PrimeStream::new(low - 1, z);
    let mut rit = PrimeStream::new(stop + 1, start);
    let mut next = it.next_prime().unwrap_or(i64::MAX);

    while let Some(prime) = rit.prev_prime() {
        if prime <= start {
            break;
        }
        let xp = x.fast_div64(prime);
        if xp >= z {
            break;
        }
        *pix += count_to(&mut it, &mut next, xp);
        *pix_count += 1;
        sum += T::from_i64(*pix);
    }

    // leave pix at pi(z - 1) relative to the chunk start, for the
    // carry of the next chunk
    *pix += count_to(&mut it, &mut next, z - 1);
    sum
}

/// Grow the per-thread sieving distance while batches come back
/// quickly, shrink it when they drag. The first chunks are by far
/// the densest, so starting small avoids handing one thread a
/// stretch the others must wait out.
fn balance_load(thread_distance: &mut i64, low: i64, z: i64, threads: usize, seconds: f64) {
    let min_distance: i64 = 1 << 23;
    let max_distance = ceil_div(z - low, threads as i64).max(1);

    if seconds < 60.0 {
        *thread_distance *= 2;
    }
    if seconds > 60.0 {
        *thread_distance /= 2;
    }
    *thread_distance = in_between(min_distance, *thread_distance, max_distance.max(min_distance));
}

/// B(x, y) = sum_{i = pi(y)+1}^{pi(sqrt(x))} pi(x / primes[i])
pub fn b<T: WideInt>(x: T, y: i64, threads: usize) -> T {
    if x < T::from_i64(4) {
        return T::ZERO;
    }

    let time = get_wtime();
    status::print_header("B(x, y)");

    let z = x.fast_div64(y.max(1));
    let mut sum = T::ZERO;
    let mut pix_total: i64 = 0;
    let mut low: i64 = 2;
    let mut thread_distance: i64 = 1 << 23;

    while low < z {
        let max_threads = ceil_div(z - low, thread_distance).max(1) as usize;
        let threads = in_between(1, threads, max_threads);
        let batch_time = get_wtime();

        let mut pix = AlignedSlots::<i64>::new(threads);
        let mut counts = AlignedSlots::<i64>::new(threads);

        sum += pix
            .slots_mut()
            .par_iter_mut()
            .zip(counts.slots_mut().par_iter_mut())
            .enumerate()
            .map(|(i, (pix_i, count_i))| {
                b_thread(x, y, z, low, i as i64, thread_distance, pix_i, count_i)
            })
            .reduce(|| T::ZERO, |p, q| p + q);

        low += thread_distance * threads as i64;
        balance_load(&mut thread_distance, low, z, threads, get_wtime() - batch_time);

        // Every pix is relative to its chunk start. Recover the
        // absolute pi(x / p) values by carrying the running total
        // through the chunks in order; the reduction above would
        // be wrong without this.
        for i in 0..threads {
            sum += T::from_i64(pix_total) * T::from_i64(counts[i]);
            pix_total += pix[i];
        }

        if print_status() {
            let percent = 100.0 * low.min(z) as f64 / z as f64;
            eprint!("\rStatus: {}%", percent as i64);
        }
    }

    status::print_result("B", sum, time);
    sum
}

/// P2(x, y) counts the integers <= x with exactly two prime
/// factors, both exceeding y. It differs from B by an arithmetic
/// progression: P2 = B - sum_{i=a+1}^{b} (i - 1) with a = pi(y),
/// b = pi(sqrt(x)).
pub fn p2<T: WideInt>(x: T, y: i64, threads: usize) -> T {
    let sum = b(x, y, threads);
    let sqrtx = isqrt_u128(x.as_i128().max(0) as u128) as i64;
    let pi_y = count_primes(y.min(sqrtx));
    let pi_sqrtx = count_primes(sqrtx);
    if pi_sqrtx <= pi_y {
        return T::ZERO;
    }
    let correction = (pi_y + pi_sqrtx - 1) as i128 * (pi_sqrtx - pi_y) as i128 / 2;
    sum - T::from_i128(correction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::iproduct;

    fn b_brute(x: i64, y: i64) -> i64 {
        let sqrtx = isqrt(x as u64) as i64;
        let primes = generate_primes(sqrtx);
        let all = generate_primes((x / y.max(1)).max(2));
        primes[1..]
            .iter()
            .filter(|&&p| p > y)
            .map(|&p| pi_bsearch(&all, x / p))
            .sum()
    }

    #[test]
    fn zero_below_four() {
        assert_eq!(b(0i64, 1, 1), 0);
        assert_eq!(b(3i64, 1, 4), 0);
    }

    #[test]
    fn matches_brute_force() {
        for (x, y) in [(100i64, 3i64), (1_000, 5), (20_000, 13), (1_000_000, 50)] {
            assert_eq!(b(x, y, 2), b_brute(x, y), "B({x}, {y})");
        }
    }

    #[test]
    fn thread_count_invariant() {
        // the second value is large enough that the batch loop
        // spans several chunks, exercising the ordered carry
        let xs: [i64; 2] = [300_000, 40_000_000];
        let reference: Vec<i64> = xs.iter().map(|&x| b(x, 2, 1)).collect();
        for (i, t) in iproduct!(0..xs.len(), [2usize, 4, 8]) {
            assert_eq!(b(xs[i], 2, t), reference[i], "x={} threads={t}", xs[i]);
        }
    }

    #[test]
    fn wide_and_narrow_agree() {
        for (x, y) in [(50_000i64, 7i64), (2_000_000, 31)] {
            assert_eq!(b(x as i128, y, 2).to_i64(), b(x, y, 2));
            assert_eq!(p2(x as i128, y, 2).to_i64(), p2(x, y, 2));
        }
    }

    #[test]
    fn p2_counts_semiprimes_with_large_factors() {
        // count n <= x that are p*q with y < p <= q by brute force
        let x: i64 = 10_000;
        let y: i64 = 11;
        let primes = generate_primes(x / 2);
        let mut expected = 0;
        for i in 1..primes.len() {
            for j in i..primes.len() {
                let (p, q) = (primes[i], primes[j]);
                if p > y && q > y && p.checked_mul(q).map_or(false, |n| n <= x) {
                    expected += 1;
                }
            }
        }
        assert_eq!(p2(x, y, 2), expected);
    }
}
