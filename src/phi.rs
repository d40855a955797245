//! Legendre's partial sieve function phi(x, a): how many integers
//! <= x survive sieving by the first a primes.
//!
//! The first six primes are handled by precomputed wheel tables
//! (phi is periodic in the primorial), everything above that by
//! the recurrence phi(x, a) = phi(x, a-1) - phi(x / p_a, a-1),
//! cut short wherever a pi lookup can answer directly.

use crate::helpe::*;

/// TINY_PRIMES[a] is the a-th prime; slot 0 is a sentinel.
pub const TINY_PRIMES: [i64; 7] = [0, 2, 3, 5, 7, 11, 13];

pub struct PhiTiny {
    prod: [i64; 7],
    totients: [i64; 7],
    counts: [Vec<i32>; 7],
}

static TINY: OnceLock<PhiTiny> = OnceLock::new();

fn tiny() -> &'static PhiTiny {
    TINY.get_or_init(PhiTiny::build)
}

impl PhiTiny {
    fn build() -> Self {
        let mut prod = [1i64; 7];
        let mut totients = [1i64; 7];
        let mut counts: [Vec<i32>; 7] = Default::default();
        for a in 0..7 {
            if a > 0 {
                prod[a] = prod[a - 1] * TINY_PRIMES[a];
            }
            let pp = prod[a] as usize;
            let mut table = vec![0i32; pp];
            let mut running = 0i32;
            for i in 0..pp {
                if i > 0 && (1..=a).all(|j| i as i64 % TINY_PRIMES[j] != 0) {
                    running += 1;
                }
                table[i] = running;
            }
            // phi over one full period
            totients[a] = if a == 0 { 1 } else { table[pp - 1] as i64 };
            counts[a] = table;
        }
        Self { prod, totients, counts }
    }
}

#[inline]
pub fn is_phi_tiny(a: i64) -> bool {
    (0..=6).contains(&a)
}

/// Largest a whose wheel still fits under y, i.e. the c parameter
/// of the leaf formulas.
pub fn get_c(y: i64) -> i64 {
    (0..=6).rev().find(|&a| TINY_PRIMES[a as usize] <= y).unwrap_or(0)
}

/// The c-th prime, for c within the wheel.
#[inline]
pub fn tiny_prime(c: i64) -> i64 {
    TINY_PRIMES[c as usize]
}

/// phi(x, a) for a <= 6, any x, in O(1).
pub fn phi_tiny<T: WideInt>(x: T, a: i64) -> T {
    debug_assert!(is_phi_tiny(a));
    if x <= T::ZERO {
        return T::ZERO;
    }
    let t = tiny();
    let pp = t.prod[a as usize];
    let quot = x.fast_div(pp);
    let rem = (x - quot * T::from_i64(pp)).to_i64();
    quot * T::from_i64(t.totients[a as usize])
        + T::from_i64(t.counts[a as usize][rem as usize] as i64)
}

/// Recursion scratch: the generated primes, a pi table over
/// sqrt(x), and a bounded memo of small subproblems. One cache per
/// thread, never shared.
pub struct PhiCache<'a> {
    primes: &'a [i64],
    pi: &'a PiTable,
    cache: HashMap<(i64, i64), i64>,
}

const CACHE_X_LIMIT: i64 = 1 << 16;
const CACHE_A_LIMIT: i64 = 500;

impl<'a> PhiCache<'a> {
    pub fn new(primes: &'a [i64], pi: &'a PiTable) -> Self {
        Self { primes, pi, cache: HashMap::new() }
    }

    /// True if phi(x, a) reduces to pi(x) - a + 1: x must be
    /// below the table bound and below the square of the next
    /// prime, so no coprime composite <= x exists.
    #[inline]
    fn is_pix(&self, x: i64, a: i64) -> bool {
        let next = a as usize + 1;
        x <= self.pi.limit()
            && next < self.primes.len()
            && x / self.primes[next] < self.primes[next]
    }

    pub fn phi(&mut self, x: i64, a: i64) -> i64 {
        if x < 1 {
            return 0;
        }
        if is_phi_tiny(a) {
            return phi_tiny(x, a);
        }
        if x <= self.primes[a as usize] {
            return 1;
        }
        if self.is_pix(x, a) {
            return self.pi.get(x) - a + 1;
        }
        if let Some(&v) = self.cache.get(&(x, a)) {
            return v;
        }

        let sqrtx = isqrt(x as u64) as i64;
        let c = get_c(sqrtx);
        let mut sum = phi_tiny(x, c);
        for i in (c + 1)..=a {
            let xp = x / self.primes[i as usize];
            if xp <= self.primes[(i - 1) as usize] {
                // every remaining term is exactly 1
                sum -= a - i + 1;
                break;
            }
            sum -= self.phi(xp, i - 1);
        }

        if x <= CACHE_X_LIMIT && a <= CACHE_A_LIMIT {
            self.cache.insert((x, a), sum);
        }
        sum
    }
}

/// Public phi(x, a). The top recursion level is split over the
/// thread pool; each task owns its cache.
pub fn phi(x: i64, a: i64, threads: usize) -> i64 {
    if x < 1 {
        return 0;
    }
    if a < 1 {
        return x;
    }
    if a > x {
        return 1;
    }
    if is_phi_tiny(a) {
        return phi_tiny(x, a);
    }

    let primes = generate_n_primes(a as usize + 1);
    if primes[a as usize] >= x {
        return 1;
    }
    let pi = PiTable::new(isqrt(x as u64) as i64);
    let c = get_c(isqrt(x as u64) as i64);

    // Terms past the point where x / p_i drops under p_{i-1} are
    // all 1; find that point once instead of testing in the loop.
    let cut = ((c + 1)..=a)
        .find(|&i| x / primes[i as usize] <= primes[(i - 1) as usize])
        .unwrap_or(a + 1);

    let indices: Vec<i64> = ((c + 1)..cut).collect();
    let threads = ideal_num_threads(threads, indices.len() as i64, 64);
    let chunk_len = ceil_div(indices.len().max(1) as i64, threads as i64) as usize;
    let big_terms: i64 = indices
        .par_chunks(chunk_len.max(1))
        .map(|chunk| {
            let mut cache = PhiCache::new(&primes, &pi);
            chunk
                .iter()
                .map(|&i| cache.phi(x / primes[i as usize], i - 1))
                .sum::<i64>()
        })
        .sum();

    let mut sum = phi_tiny(x, c) - big_terms;
    if cut <= a {
        sum -= a - cut + 1;
    }
    sum
}
