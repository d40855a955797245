//! S1, the ordinary leaves: the part of phi(x, pi(y)) whose
//! Legendre recursion bottoms out inside the wheel.
//!
//! S1(x, y) = sum over squarefree n <= y with lpf(n) > p_c of
//! mu(n) * phi(x / n, c).

use crate::helpe::*;
use crate::phi::{phi_tiny, tiny_prime};
use crate::status;

pub fn s1<T: WideInt>(x: T, y: i64, c: i64, threads: usize) -> T {
    let time = get_wtime();
    status::print_header("S1(x, y)");

    let mu = generate_moebius(y);
    let lpf = generate_lpf(y);
    let prime_c = tiny_prime(c);
    let threads = ideal_num_threads(threads, y, 10_000);
    let min_len = ceil_div(y, threads as i64 * 4).max(1) as usize;

    let sum = (1usize..(y as usize + 1))
        .into_par_iter()
        .with_min_len(min_len)
        .map(|n| {
            let n = n as i64;
            let idx = n as usize;
            if mu[idx] != 0 && lpf[idx] > prime_c {
                let term = phi_tiny(x.fast_div(n), c);
                if mu[idx] > 0 {
                    term
                } else {
                    T::ZERO - term
                }
            } else {
                T::ZERO
            }
        })
        .reduce(|| T::ZERO, |p, q| p + q);

    status::print_result("S1", sum, time);
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phi::phi;

    fn s1_brute(x: i64, y: i64, c: i64) -> i64 {
        let mu = generate_moebius(y);
        let lpf = generate_lpf(y);
        let pc = tiny_prime(c);
        let mut sum = 0i64;
        for n in 1..=y {
            if mu[n as usize] != 0 && lpf[n as usize] > pc {
                sum += mu[n as usize] as i64 * phi(x / n, c, 1);
            }
        }
        sum
    }

    #[test]
    fn matches_full_phi_evaluation() {
        for (x, y, c) in [(1_000i64, 10i64, 2i64), (50_000, 36, 3), (1_000_000, 100, 4)] {
            assert_eq!(s1(x, y, c, 2), s1_brute(x, y, c), "S1({x}, {y}, {c})");
        }
    }

    #[test]
    fn thread_count_invariant() {
        // y clears the 10^4-per-thread threshold here
        let reference = s1(1_000_000_000i64, 50_000, 6, 1);
        for t in [2, 4, 8] {
            assert_eq!(s1(1_000_000_000i64, 50_000, 6, t), reference);
        }
    }
}
