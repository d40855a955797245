//! The prime counting algorithms, assembled from the partial
//! sums. Everything funnels into the same identity
//!
//!   pi(x) = S1 + S2 + pi(y) - 1 - P2(x, y)
//!
//! with S2 split into its trivial, easy and hard leaves; the
//! algorithms differ in where they put y and how much of the work
//! each term then carries.

pub mod a;
pub mod p2;
pub mod p3;
pub mod s1;
pub mod s2;

use crate::helpe::*;
use crate::phi::{get_c, phi};
use crate::resume::ResumeLog;

/// Largest supported argument, 10^27. Callers are contractually
/// obliged to gate on this; the library asserts.
pub fn max_x() -> MaxInt {
    10i128.pow(27)
}

fn assert_in_range(x: MaxInt) {
    assert!(x <= max_x(), "x exceeds the supported maximum of 10^27");
}

/// y = alpha * x^(1/3). Growing alpha moves leaves out of the
/// sieve and into the pi-table formulas, trading memory for time;
/// a cubic in log x tracks the optimum closely enough.
fn alpha_deleglise_rivat(x: f64) -> f64 {
    let l = x.max(8.0).ln();
    (l.powi(3) / 1000.0).max(1.0)
}

fn pi_with_alpha<T: WideInt>(x: T, alpha: f64, hard_leaves_via_a: bool, threads: usize) -> T {
    let x13 = iroot::<3>(x.as_i128() as u128) as i64;
    let sqrtx = isqrt_u128(x.as_i128() as u128) as i64;
    let alpha = alpha.min(iroot::<6>(x.as_i128() as u128) as f64).max(1.0);
    let y = in_between(x13, (alpha * x13 as f64) as i64, sqrtx.max(x13));
    let z = x.fast_div64(y);
    let c = get_c(y);
    let pi_y = count_primes(y);

    let s1 = s1::s1(x, y, c, threads);
    let p2 = p2::p2(x, y, threads);
    let log = ResumeLog::default();
    let s2_trivial = s2::s2_trivial(x, y, z, c, threads, &log);
    let s2_easy = s2::s2_easy(x, y, c, threads);

    // Gourdon's trick: hard leaves whose smallest factor exceeds
    // a_start have p^4 > x, so A answers them by pi lookup and
    // the sieve stops at that bound.
    let (prime_limit, a_leaves) = if hard_leaves_via_a {
        (a::a_start(x, y), a::a_hard_leaves(x, y, threads))
    } else {
        (y, T::ZERO)
    };

    // only feeds the progress estimate of the sieve
    let s2_hard_approx = (li(x.to_f64()) as MaxInt - s1.as_i128()
        - (pi_y - 1) as MaxInt
        + p2.as_i128()
        - s2_trivial.as_i128()
        - s2_easy.as_i128()
        - a_leaves.as_i128())
        .max(0);
    let s2_hard = s2::s2_hard(x, y, z, c, prime_limit, s2_hard_approx, threads);

    s1 + s2_trivial + s2_easy + a_leaves + s2_hard + T::from_i64(pi_y - 1) - p2
}

/// Common entry: answer small arguments by sieve, pick the 64-bit
/// kernels whenever x fits, fall back to 128 bits above that.
fn pi_dispatch(x: MaxInt, alpha: f64, hard_leaves_via_a: bool, threads: usize) -> MaxInt {
    assert_in_range(x);
    if x < 2 {
        return 0;
    }
    if x < SIEVE_LIMIT as MaxInt {
        return count_primes(x as i64) as MaxInt;
    }
    if x <= i64::MAX as MaxInt {
        pi_with_alpha::<i64>(x as i64, alpha, hard_leaves_via_a, threads) as MaxInt
    } else {
        pi_with_alpha::<i128>(x, alpha, hard_leaves_via_a, threads)
    }
}

/// Deleglise-Rivat, the default algorithm.
/// Run time O(x^(2/3) / log^2 x), memory O(x^(1/3) log^3 x).
pub fn pi_deleglise_rivat(x: MaxInt, threads: usize) -> MaxInt {
    pi_dispatch(x, alpha_deleglise_rivat(x as f64), false, threads)
}

/// Lagarias-Miller-Odlyzko: the same decomposition pinned at
/// y = x^(1/3), which sends every non-trivial leaf to the sieve.
pub fn pi_lmo(x: MaxInt, threads: usize) -> MaxInt {
    pi_dispatch(x, 1.0, false, threads)
}

/// Gourdon's variant: the Deleglise-Rivat decomposition with the
/// deep hard leaves routed through the A formula instead of the
/// sieve.
pub fn pi_gourdon(x: MaxInt, threads: usize) -> MaxInt {
    pi_dispatch(x, alpha_deleglise_rivat(x as f64), true, threads)
}

/// Legendre's formula, pi(x) = phi(x, a) + a - 1 with
/// a = pi(sqrt(x)).
pub fn pi_legendre(x: MaxInt, threads: usize) -> MaxInt {
    assert_in_range(x);
    assert!(x <= i64::MAX as MaxInt, "pi_legendre is 64-bit only");
    if x < 2 {
        return 0;
    }
    let x = x as i64;
    let a = count_primes(isqrt(x as u64) as i64);
    (phi(x, a, threads) + a - 1) as MaxInt
}

/// Meissel's refinement: a drops to pi(x^(1/3)), the two-factor
/// survivors are subtracted via P2.
pub fn pi_meissel(x: MaxInt, threads: usize) -> MaxInt {
    assert_in_range(x);
    assert!(x <= i64::MAX as MaxInt, "pi_meissel is 64-bit only");
    if x < 2 {
        return 0;
    }
    let x = x as i64;
    let y = iroot::<3>(x as u128) as i64;
    let a = count_primes(y);
    (phi(x, a, threads) + a - 1 - p2::p2(x, y, threads)) as MaxInt
}

/// Lehmer: a = pi(x^(1/4)), with both P2 and P3 corrections.
pub fn pi_lehmer(x: MaxInt, threads: usize) -> MaxInt {
    assert_in_range(x);
    assert!(x <= i64::MAX as MaxInt, "pi_lehmer is 64-bit only");
    if x < 2 {
        return 0;
    }
    let x = x as i64;
    let y = iroot::<4>(x as u128) as i64;
    let a = count_primes(y);
    (phi(x, a, threads) + a - 1 - p2::p2(x, y, threads) - p3::p3(x, a, threads)) as MaxInt
}

/// Plain segmented sieving, the baseline the formulas are checked
/// against.
pub fn pi_primesieve(x: MaxInt, _threads: usize) -> MaxInt {
    assert!(x <= i64::MAX as MaxInt, "pi_primesieve is 64-bit only");
    if x < 2 {
        return 0;
    }
    count_primes(x as i64) as MaxInt
}

/// The n-th prime, 1-indexed: nth_prime(1) = 2. Seeded by the
/// inverse logarithmic integral, settled by pi plus a short prime
/// walk.
pub fn nth_prime(n: i64, threads: usize) -> i64 {
    assert!(n >= 1, "nth_prime requires n >= 1");
    if n < 100_000 {
        let primes = generate_n_primes(n as usize);
        return primes[n as usize];
    }

    let guess = nth_prime_approx(n) as i64;
    let count = pi_deleglise_rivat(guess as MaxInt, threads) as i64;

    if count < n {
        // walk forward from the guess
        let mut k = count;
        let mut start = guess;
        let span = (((n - count) as f64 + 10.0) * (guess as f64).ln() * 2.0) as i64 + 10_000;
        loop {
            let stop = start + span;
            let mut it = PrimeStream::new(start, stop);
            while let Some(p) = it.next_prime() {
                k += 1;
                if k == n {
                    return p;
                }
            }
            start = stop;
        }
    } else {
        // the count-th prime is the largest one <= guess
        let mut k = count;
        let mut it = PrimeStream::new(guess + 1, 2);
        while let Some(p) = it.prev_prime() {
            if k == n {
                return p;
            }
            k -= 1;
        }
        unreachable!("pi and the sieve disagree");
    }
}
