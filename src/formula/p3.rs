//! P3(x, a): integers <= x with exactly three prime factors, all
//! exceeding the a-th prime. Used by Lehmer's formula.

use crate::helpe::*;
use crate::status;

/// The lookups run over a prime array via binary search instead
/// of a PiTable: the bound is sqrt(x), and building a bit table
/// that far would cost more than the whole formula. The inner
/// arguments shrink quickly with i, so the searches stay cache
/// friendly.
pub fn p3(x: i64, a: i64, threads: usize) -> i64 {
    let time = get_wtime();
    status::print_header("P3(x, a)");

    let primes = generate_primes(isqrt(x.max(0) as u64) as i64);
    let y = iroot::<3>(x.max(0) as u128) as i64;
    let pi_y = pi_bsearch(&primes, y);
    let threads = ideal_num_threads(threads, pi_y, 100);
    let min_len = ceil_div((pi_y - a).max(1), threads as i64 * 4).max(1) as usize;

    let sum = ((a + 1) as usize..(pi_y as usize + 1))
        .into_par_iter()
        .with_min_len(min_len)
        .map(|i| {
            let i = i as i64;
            let xi = x / primes[i as usize];
            let bi = pi_bsearch(&primes, isqrt(xi as u64) as i64);
            let mut s = 0i64;
            for j in i..=bi {
                s += pi_bsearch(&primes, xi / primes[j as usize]) - (j - 1);
            }
            s
        })
        .sum();

    status::print_result("P3", sum, time);
    sum
}
