//! Welcome to `picount`!
//!
//! This crate computes pi(x), the number of primes not exceeding
//! x, for x far beyond anything a sieve could enumerate. It
//! implements the classical combinatorial algorithms (Legendre,
//! Meissel, Lehmer, Lagarias-Miller-Odlyzko, Deleglise-Rivat,
//! Gourdon), which all reduce pi(x) to a handful of partial sums
//! over primes:
//!
//! * [PiTable](helpe::PiTable) answers pi(n) in O(1) from one
//!   bit per odd integer,
//! * the P2/P3 terms count integers with exactly two or three
//!   large prime factors,
//! * the S1/S2 terms evaluate Legendre's phi recursion at its
//!   ordinary and special leaves, the hard ones via a segmented
//!   sieve whose range is parcelled out by an adaptive
//!   [LoadBalancer](balance::LoadBalancer).
//!
//! The work-horses are generic over [WideInt](helpe::WideInt):
//! every formula runs in 64 bits whenever x permits and switches
//! to 128 bits only above that, where a dedicated fast division
//! by 64-bit divisors keeps the inner loops honest.
//!
//! ```
//! assert_eq!(picount::pi(1_000_000), 78_498);
//! assert_eq!(picount::pi_str("10^6").unwrap(), "78498");
//! ```

mod aligned;
mod imath;
mod pi_table;
mod primes;
mod wide;

pub mod balance;
pub mod expr;
pub mod formula;
pub mod helpe;
pub mod phi;
pub mod resume;
pub mod status;

pub use crate::helpe::*;

pub use crate::formula::{
    max_x, nth_prime as nth_prime_threads, pi_deleglise_rivat, pi_gourdon, pi_legendre,
    pi_lehmer, pi_lmo, pi_meissel, pi_primesieve,
};

use crate::expr::ExprError;

/// pi(x) with the fastest available algorithm and the configured
/// thread count.
pub fn pi(x: MaxInt) -> MaxInt {
    formula::pi_deleglise_rivat(x, get_num_threads())
}

/// pi over a decimal integer or arithmetic expression such as
/// "10^20". The answer comes back as a string because it may not
/// fit 64 bits.
pub fn pi_str(expression: &str) -> Result<String, ExprError> {
    let x = expr::eval(expression)?;
    Ok(pi(x).to_string())
}

/// The n-th prime, 1-indexed.
pub fn nth_prime(n: i64) -> i64 {
    formula::nth_prime(n, get_num_threads())
}

/// Legendre's partial sieve function phi(x, a).
pub fn phi(x: i64, a: i64) -> i64 {
    phi::phi(x, a, get_num_threads())
}

/// Largest supported x, as a string (it exceeds 64 bits).
pub fn max() -> String {
    max_x().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_round_trip() {
        assert_eq!(pi_str("10^6").unwrap(), "78498");
        assert_eq!(pi_str("1000000").unwrap(), "78498");
        assert!(pi_str("10^").is_err());
    }

    #[test]
    fn supported_maximum() {
        assert_eq!(max(), "1000000000000000000000000000");
        assert_eq!(expr::eval(&max()).unwrap(), max_x());
    }

    #[test]
    fn settings_round_trip() {
        set_num_threads(3);
        assert!(get_num_threads() >= 1);
        set_num_threads(MAX_THREADS);
        assert_eq!(get_num_threads(), num_cpus::get());

        set_print_status(true);
        assert!(print_status());
        set_print_status(false);
        assert!(!print_status());
    }

    #[test]
    fn wtime_is_monotone() {
        let a = get_wtime();
        let b = get_wtime();
        assert!(b >= a);
    }

    #[test]
    fn public_entry_points() {
        assert_eq!(pi(100), 25);
        assert_eq!(nth_prime(4), 7);
        assert_eq!(phi(100, 3), 26);
    }
}
