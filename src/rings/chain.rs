use crate::math::is_ntt_friendly_prime;

use super::errors::{RingError, RingResult};

/// Per-prime tables for the negacyclic NTT over `Z_q[X]/(X^N + 1)`.
///
/// The transform is the classic twisted cyclic NTT: coefficients are first
/// multiplied by powers of `ψ` (a primitive `2N`-th root of unity), then run
/// through a cyclic FFT with `ω = ψ²`. Entry `k` of the forward transform
/// holds the evaluation at `ψ^{2k+1}`, the same point for every channel, so
/// pointwise channel products realize the negacyclic polynomial product.
#[derive(Debug, Clone)]
pub struct NttTable<const DEGREE: usize> {
    /// `ω^j`, natural order.
    pub forward_roots: [u64; DEGREE],
    /// `ω^{-j}`, natural order.
    pub inverse_roots: [u64; DEGREE],
    /// `ψ^i`, applied to coefficients before the forward transform.
    pub twist: [u64; DEGREE],
    /// `ψ^{-i}`, applied after the inverse transform.
    pub twist_inv: [u64; DEGREE],
    pub n_inv: u64,
    pub modulus: u64,
}

impl<const DEGREE: usize> NttTable<DEGREE> {
    pub fn new(modulus: u64) -> RingResult<Self> {
        if !DEGREE.is_power_of_two() {
            return Err(RingError::InvalidDegree { degree: DEGREE });
        }
        if !is_ntt_friendly_prime(modulus, DEGREE as u64) {
            return Err(RingError::NonNttFriendlyModulus {
                modulus,
                degree: DEGREE,
            });
        }

        let order = 2 * DEGREE;
        let psi = find_primitive_root(modulus, order);
        let psi_inv = mod_inverse(psi, modulus);
        let omega = mul_mod(psi, psi, modulus);
        let omega_inv = mod_inverse(omega, modulus);

        let mut forward_roots = [1u64; DEGREE];
        let mut inverse_roots = [1u64; DEGREE];
        let mut twist = [1u64; DEGREE];
        let mut twist_inv = [1u64; DEGREE];
        for index in 1..DEGREE {
            forward_roots[index] =
                mul_mod(forward_roots[index - 1], omega, modulus);
            inverse_roots[index] =
                mul_mod(inverse_roots[index - 1], omega_inv, modulus);
            twist[index] = mul_mod(twist[index - 1], psi, modulus);
            twist_inv[index] = mul_mod(twist_inv[index - 1], psi_inv, modulus);
        }

        let n_inv = mod_inverse(DEGREE as u64, modulus);
        Ok(Self {
            forward_roots,
            inverse_roots,
            twist,
            twist_inv,
            n_inv,
            modulus,
        })
    }
}

/// An ordered chain of NTT-friendly primes with precomputed NTT tables.
///
/// Level `l` means the first `l + 1` primes are active; the full chain sits at
/// `max_level()`. Dropping and raising levels never rebuilds tables, callers
/// slice the chain through `primes_at_level`.
///
/// Invariant: `primes.len() == ntt_tables.len()` and
/// `ntt_tables[i].modulus == primes[i]` for all `i`.
#[derive(Debug, Clone)]
pub struct ModuliChain<const DEGREE: usize> {
    primes: Vec<u64>,
    ntt_tables: Vec<NttTable<DEGREE>>,
}

impl<const DEGREE: usize> ModuliChain<DEGREE> {
    pub fn new(primes: Vec<u64>) -> RingResult<Self> {
        if primes.is_empty() {
            return Err(RingError::EmptyChain);
        }
        for (i, &p) in primes.iter().enumerate() {
            if primes[..i].contains(&p) {
                return Err(RingError::DuplicatePrime { prime: p });
            }
        }
        let mut ntt_tables = Vec::with_capacity(primes.len());
        for &modulus in &primes {
            ntt_tables.push(NttTable::new(modulus)?);
        }
        Ok(Self { primes, ntt_tables })
    }

    pub fn primes(&self) -> &[u64] {
        &self.primes
    }

    /// The active primes at `level` (the first `level + 1` entries).
    pub fn primes_at_level(&self, level: usize) -> &[u64] {
        debug_assert!(level <= self.max_level());
        &self.primes[..=level]
    }

    pub fn ntt_table(&self, channel: usize) -> &NttTable<DEGREE> {
        &self.ntt_tables[channel]
    }

    pub fn prime_count(&self) -> usize {
        self.primes.len()
    }

    pub fn max_level(&self) -> usize {
        self.primes.len() - 1
    }

    pub fn contains(&self, prime: u64) -> bool {
        self.primes.contains(&prime)
    }

    /// How many leading channels can be CRT-reconstructed in `u128` without
    /// overflow. Capped so the product of moduli stays below `2^126`.
    pub fn reconstruction_channels(&self) -> usize {
        let mut bits = 0u32;
        let mut count = 0usize;
        for &p in &self.primes {
            bits += 64 - p.leading_zeros();
            if bits > 126 {
                break;
            }
            count += 1;
        }
        count.max(1)
    }

    /// CRT-reconstructs a single coefficient from the leading residues and
    /// centers it in `(-Q/2, Q/2]`, where `Q` is the product of the first
    /// `residues.len()` primes.
    ///
    /// # Overflow note
    /// Uses u128 arithmetic. The caller must keep `residues.len()` within
    /// `reconstruction_channels()`; the intermediate product `r * (Q/q_i)` is
    /// then bounded by `Q < 2^126`.
    pub fn reconstruct_centered_coeff(&self, residues: &[u64]) -> i64 {
        debug_assert!(!residues.is_empty());
        debug_assert!(residues.len() <= self.reconstruction_channels());
        let q: u128 = self.primes[..residues.len()]
            .iter()
            .map(|&m| m as u128)
            .product();
        let mut acc = 0u128;

        for (&r, &m) in residues.iter().zip(&self.primes) {
            // Q_i = Q / q_i  (exact: q_i divides Q)
            let qi = q / m as u128;
            let qi_inv = mod_inverse((qi % m as u128) as u64, m);
            // Reduce the weight mod q_i first; the product then stays below
            // Q < 2^126 and cannot overflow u128.
            let weight = mul_mod(r, qi_inv, m) as u128;
            acc = (acc + weight * qi) % q;
        }

        if acc > q / 2 {
            (acc as i128 - q as i128) as i64
        } else {
            acc as i64
        }
    }
}

// ─── Modular arithmetic helpers (crate-internal) ─────────────────────────────

pub(crate) fn add_mod(a: u64, b: u64, q: u64) -> u64 {
    let s = a + b;
    if s >= q { s - q } else { s }
}

pub(crate) fn sub_mod(a: u64, b: u64, q: u64) -> u64 {
    if a >= b { a - b } else { a + q - b }
}

pub(crate) fn mul_mod(a: u64, b: u64, q: u64) -> u64 {
    ((a as u128 * b as u128) % q as u128) as u64
}

pub(crate) fn mod_pow(mut base: u64, mut exponent: u64, modulus: u64) -> u64 {
    let mut result = 1u64;
    base %= modulus;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = mul_mod(result, base, modulus);
        }
        base = mul_mod(base, base, modulus);
        exponent >>= 1;
    }
    result
}

pub(crate) fn mod_inverse(value: u64, modulus: u64) -> u64 {
    fn extended_gcd(a: i128, b: i128) -> (i128, i128, i128) {
        if a == 0 {
            (b, 0, 1)
        } else {
            let (gcd, x1, y1) = extended_gcd(b % a, a);
            (gcd, y1 - (b / a) * x1, x1)
        }
    }
    let (gcd, x, _) = extended_gcd(value as i128, modulus as i128);
    assert_eq!(gcd, 1, "mod_inverse: values must be coprime");
    ((x % modulus as i128 + modulus as i128) % modulus as i128) as u64
}

/// Finds a primitive `order`-th root of unity in Z_modulus.
///
/// # Panics
/// Cannot panic when `modulus` is an NTT-friendly prime for the corresponding
/// degree, since such primes are guaranteed to have the required root.
fn find_primitive_root(modulus: u64, order: usize) -> u64 {
    let exponent = (modulus - 1) / order as u64;
    let factors = distinct_prime_factors(order);

    'candidate: for candidate in 2..modulus {
        let root = mod_pow(candidate, exponent, modulus);
        if root == 1 {
            continue;
        }
        for &factor in &factors {
            if mod_pow(root, (order / factor) as u64, modulus) == 1 {
                continue 'candidate;
            }
        }
        return root;
    }

    panic!(
        "find_primitive_root: no root found for modulus {modulus}, order {order}"
    );
}

fn distinct_prime_factors(mut value: usize) -> Vec<usize> {
    let mut factors = Vec::new();
    let mut d = 2usize;
    while d * d <= value {
        if value.is_multiple_of(d) {
            factors.push(d);
            while value.is_multiple_of(d) {
                value /= d;
            }
        }
        d += 1;
    }
    if value > 1 {
        factors.push(value);
    }
    factors
}

pub(crate) fn reverse_bits(value: usize, bit_count: usize) -> usize {
    value.reverse_bits() >> (usize::BITS as usize - bit_count)
}
