//! Gourdon's A formula:
//!
//! A(x, y) = sum_{b} sum_{j} w * pi(x / (p_b * p_j)),
//!
//! with pi(start) < b <= pi(x^(1/3)), b < j <= pi(sqrt(x / p_b)),
//! and weight w = 2 whenever x / (p_b * p_j) < y. Every inner
//! argument stays below sqrt(x), so a single PiTable to sqrt(x)
//! answers all of them.

use crate::helpe::*;
use crate::status;

/// A has leaves only for p_b above this bound. The same bound
/// tells the sieve where to stop owning hard leaves, so every
/// caller must compute it identically.
pub(super) fn a_start<T: WideInt>(x: T, y: i64) -> i64 {
    (iroot::<4>(x.as_i128().max(0) as u128) as i64)
        .max(x.fast_div(y.max(1)).fast_div64(y.max(1)))
}

pub fn a<T: WideInt>(x: T, y: i64, threads: usize) -> T {
    let time = get_wtime();
    status::print_header("A(x, y)");

    let x13 = iroot::<3>(x.as_i128().max(0) as u128) as i64;
    let sqrtx = isqrt_u128(x.as_i128().max(0) as u128) as i64;
    let threads = ideal_num_threads(threads, x13, 1000);

    let start = a_start(x, y);
    if start >= x13 {
        return T::ZERO;
    }
    let max_prime = isqrt_u128(x.fast_div(start.max(1)).as_i128() as u128) as i64;
    let primes = generate_primes(max_prime);
    let pi = PiTable::new(sqrtx);
    let pi_x13 = pi.get(x13);
    let pi_start = pi.get(start.min(sqrtx));

    let min_len = ceil_div((pi_x13 - pi_start).max(1), threads as i64 * 4).max(1) as usize;
    let sum = ((pi_start + 1) as usize..(pi_x13 as usize + 1))
        .into_par_iter()
        .with_min_len(min_len)
        .map(|b| {
            let b = b as i64;
            let prime = primes[b as usize];
            let x2 = x.fast_div(prime);
            let max_j = pi.get(isqrt_u128(x2.as_i128() as u128) as i64);
            let mut sum_b = T::ZERO;
            for j in (b + 1)..=max_j {
                let xn = x2.fast_div64(primes[j as usize]);
                // leaves under y count twice
                if xn < y {
                    sum_b += T::from_i64(pi.get(xn) * 2);
                } else {
                    sum_b += T::from_i64(pi.get(xn));
                }
            }
            sum_b
        })
        .reduce(|| T::ZERO, |p, q| p + q);

    status::print_result("A", sum, time);
    sum
}

/// The hard prime leaves whose smallest factor exceeds
/// max(x^(1/4), x/y^2): the sum of phi(x/(p_b q), b - 1) over
/// primes q in (p_b, x/(p_b y)]. Above that bound p_b^4 > x, so
/// phi(t, b - 1) = pi(t) - b + 2 holds even for t >= y and these
/// leaves never touch the sieve.
///
/// A is the vehicle: it counts each of these leaves once and
/// every leaf with t < y twice, so peeling the doubled layer and
/// the (b - 2) offsets off A leaves exactly this partial sum.
pub fn a_hard_leaves<T: WideInt>(x: T, y: i64, threads: usize) -> T {
    let x13 = iroot::<3>(x.as_i128().max(0) as u128) as i64;
    let start = a_start(x, y);
    if start >= x13 {
        return T::ZERO;
    }

    let a_sum = a(x, y, threads);

    let threads = ideal_num_threads(threads, x13, 1000);
    let pi = PiTable::new(y);
    let primes = generate_primes(y);
    let b_min = pi.get(start);
    let b_max = pi.get(x13);

    let min_len = ceil_div((b_max - b_min).max(1), threads as i64 * 4).max(1) as usize;
    let peeled = ((b_min + 1) as usize..(b_max as usize + 1))
        .into_par_iter()
        .with_min_len(min_len)
        .map(|b| {
            let b = b as i64;
            let prime = primes[b as usize];
            let xp = x.fast_div(prime);
            // q <= l_hard holds exactly for the leaves with t >= y
            let l_hard = xp.fast_div64(y);
            let r = isqrt_u128(xp.as_i128() as u128) as i64;
            // the layer A counts twice: q in (max(prime, l_hard), r]
            let l_min = pi.get(l_hard.max(prime));
            let l_max = pi.get(r);
            let mut doubled = 0i64;
            for l in (l_min + 1)..=l_max {
                let t = xp.fast_div64(primes[l as usize]);
                doubled += pi.get(t);
            }
            let leaf_count = (pi.get(l_hard) - b).max(0);
            T::from_i64(2 * doubled + (b - 2) * leaf_count)
        })
        .reduce(|| T::ZERO, |p, q| p + q);

    a_sum - peeled
}
