//! Prime utilities for constructing NTT-friendly modulus chains.
//!
//! The fast primality check is deterministic Miller-Rabin: for `u64` inputs a
//! fixed set of witness bases is known to leave no composite undetected, so
//! the probabilistic test becomes exact over the whole input range.
//! Reference:
//! https://en.wikipedia.org/wiki/Miller%E2%80%93Rabin_primality_test

// Deterministic for all n < 318,665,857,834,031,151,167,461, which covers u64.
// Source: https://miller-rabin.appspot.com/
const MILLER_RABIN_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

fn mul_mod(a: u64, b: u64, modulus: u64) -> u64 {
    assert!(modulus > 0, "mul_mod: modulus must be positive");
    ((a as u128 * b as u128) % modulus as u128) as u64
}

fn mod_pow(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    assert!(modulus > 0, "mod_pow: modulus must be positive");
    if modulus == 1 {
        return 0;
    }
    let mut acc = 1 % modulus;
    base %= modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, modulus);
        }
        base = mul_mod(base, base, modulus);
        exp >>= 1;
    }
    acc
}

/// Returns `(odd_part, power_of_two)` such that `n = odd_part * 2^power_of_two`.
fn decompose(n: u64) -> (u64, u32) {
    assert!(n > 0, "decompose: n must be positive");
    let mut d = n;
    let mut r = 0;
    while d & 1 == 0 {
        d >>= 1;
        r += 1;
    }
    (d, r)
}

/// Returns `true` if `n` is prime, using deterministic Miller-Rabin on `u64`.
pub fn is_prime(n: u64) -> bool {
    match n {
        0 | 1 => return false,
        2 | 3 => return true,
        _ if n & 1 == 0 => return false,
        _ => {}
    }

    let (d, r) = decompose(n - 1);
    'bases: for &a in MILLER_RABIN_BASES.iter() {
        if a >= n {
            continue;
        }
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'bases;
            }
        }
        return false;
    }
    true
}

/// Slow-but-clear reference test using `6k +/- 1` trial division.
pub fn is_prime_reference(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n == 2 || n == 3 {
        return true;
    }
    if n.is_multiple_of(2) || n.is_multiple_of(3) {
        return false;
    }
    let mut i = 5u64;
    while i.saturating_mul(i) <= n {
        if n.is_multiple_of(i) || n.is_multiple_of(i + 2) {
            return false;
        }
        i += 6;
    }
    true
}

/// Returns `true` when `p` is an NTT-friendly prime for ring degree `n`.
///
/// "NTT-friendly" means `p` is prime and `p = 1 (mod 2n)`, which guarantees a
/// primitive `2n`-th root of unity in `Z_p` for negacyclic NTT over `x^n + 1`.
#[inline]
pub fn is_ntt_friendly_prime(p: u64, n: u64) -> bool {
    assert!(n > 0, "is_ntt_friendly_prime: n must be positive");
    let modulus = n
        .checked_mul(2)
        .expect("is_ntt_friendly_prime: 2 * n must fit in u64");
    is_prime(p) && p % modulus == 1
}

/// Returns the smallest NTT-friendly prime strictly greater than `start`.
///
/// Only candidates `p = 1 (mod 2n)` are visited. Calling this repeatedly with
/// the previous result yields an ascending run of distinct chain primes.
///
/// # Panics
///
/// Panics if `n == 0`, `2 * n` overflows `u64`, or stepping upward overflows
/// before a prime is found.
pub fn next_ntt_prime_above(start: u64, n: u64) -> u64 {
    assert!(n > 0, "next_ntt_prime_above: n must be positive");
    let step = n
        .checked_mul(2)
        .expect("next_ntt_prime_above: 2 * n must fit in u64");

    // First candidate > start with candidate % step == 1.
    let remainder = start % step;
    let delta = (step + 1 - remainder) % step;
    let mut candidate = start
        .checked_add(if delta == 0 { step } else { delta })
        .expect("next_ntt_prime_above: overflow while stepping upward");

    loop {
        if is_prime(candidate) {
            return candidate;
        }
        candidate = candidate
            .checked_add(step)
            .expect("next_ntt_prime_above: overflow while stepping upward");
    }
}

/// Returns the largest NTT-friendly prime strictly less than `bound`, or
/// `None` if no candidate `p = 1 (mod 2n)` below `bound` is prime.
///
/// # Panics
///
/// Panics if `n == 0` or `2 * n` overflows `u64`.
pub fn next_ntt_prime_below(bound: u64, n: u64) -> Option<u64> {
    assert!(n > 0, "next_ntt_prime_below: n must be positive");
    if bound <= 2 {
        return None;
    }
    let step = n
        .checked_mul(2)
        .expect("next_ntt_prime_below: 2 * n must fit in u64");

    // Largest candidate < bound with candidate % step == 1.
    let value = bound - 1;
    let remainder = value % step;
    let delta = (remainder + step - 1) % step;
    let mut candidate = value.checked_sub(delta)?;

    loop {
        if candidate <= 2 {
            return None;
        }
        if is_prime(candidate) {
            return Some(candidate);
        }
        candidate = candidate.checked_sub(step)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN_SMALL_PRIMES: [u64; 8] = [2, 3, 5, 7, 11, 13, 17, 19];
    const KNOWN_SMALL_COMPOSITES: [u64; 10] = [0, 1, 4, 6, 8, 9, 10, 12, 15, 16];

    #[test]
    fn test_is_prime_basic() {
        for &prime in &KNOWN_SMALL_PRIMES {
            assert!(is_prime(prime));
            assert!(is_prime_reference(prime));
        }
        for &composite in &KNOWN_SMALL_COMPOSITES {
            assert!(!is_prime(composite));
            assert!(!is_prime_reference(composite));
        }
    }

    #[test]
    fn test_is_prime_tricky_composites() {
        // Carmichael numbers and strong pseudoprimes for small base sets.
        let tricky = [561u64, 1_105, 1_729, 3_215_031_751];
        for &n in &tricky {
            assert!(!is_prime(n), "expected composite: {n}");
        }
    }

    #[test]
    fn test_is_prime_near_u64_limit() {
        assert!(!is_prime(u64::MAX));
        assert!(is_prime(18_446_744_073_709_551_557));
    }

    #[test]
    fn miller_rabin_matches_reference_on_selected_ranges() {
        let ranges: [(u64, u64); 4] =
            [(2, 14), (90, 114), (10_000, 10_024), (1_000_000, 1_000_024)];

        for (start, end) in ranges {
            for n in start..=end {
                assert_eq!(is_prime(n), is_prime_reference(n), "mismatch at {n}");
            }
        }
    }

    #[test]
    fn test_ntt_friendly_condition() {
        assert!(is_ntt_friendly_prime(12289, 1024));
        assert_eq!(12289 % (2 * 1024), 1);

        assert!(!is_ntt_friendly_prime(2049, 1024));
        assert!(!is_ntt_friendly_prime(4097, 1024));
    }

    #[test]
    #[should_panic(expected = "is_ntt_friendly_prime: n must be positive")]
    fn ntt_friendly_panics_on_zero_degree() {
        let _ = is_ntt_friendly_prime(12289, 0);
    }

    #[test]
    fn next_prime_above_matches_reference() {
        let prime = next_ntt_prime_above(1u64 << 30, 1024);
        assert_eq!(prime, 1_073_750_017);
    }

    #[test]
    fn next_prime_above_is_strictly_increasing() {
        let n = 1024;
        let first = next_ntt_prime_above(1u64 << 30, n);
        let second = next_ntt_prime_above(first, n);
        assert!(second > first);
        assert!(is_ntt_friendly_prime(second, n));
    }

    #[test]
    fn next_prime_below_is_strictly_decreasing() {
        let n = 1024;
        let first = next_ntt_prime_below(1u64 << 31, n).unwrap();
        let second = next_ntt_prime_below(first, n).unwrap();
        assert!(first < 1u64 << 31);
        assert!(second < first);
        assert!(is_ntt_friendly_prime(first, n));
        assert!(is_ntt_friendly_prime(second, n));
    }

    #[test]
    fn next_prime_below_exhausts_to_none() {
        assert_eq!(next_ntt_prime_below(2, 1024), None);
        assert_eq!(next_ntt_prime_below(1, 1024), None);
    }

    #[test]
    #[should_panic(expected = "next_ntt_prime_above: n must be positive")]
    fn next_prime_above_panics_on_zero_degree() {
        let _ = next_ntt_prime_above(100, 0);
    }

    #[test]
    #[should_panic(expected = "next_ntt_prime_above: 2 * n must fit in u64")]
    fn next_prime_above_panics_on_degree_overflow() {
        let too_large_n = (u64::MAX / 2) + 1;
        let _ = next_ntt_prime_above(100, too_large_n);
    }

    #[test]
    #[should_panic(expected = "next_ntt_prime_below: n must be positive")]
    fn next_prime_below_panics_on_zero_degree() {
        let _ = next_ntt_prime_below(100, 0);
    }
}
