use crate::rings::{ModuliChain, RingResult, RnsPoly};
use crate::math::sampling::ternary_coefficients;
use rand::Rng;
use std::sync::Arc;

/// Ternary secret key with a fixed number of non-zero coefficients.
///
/// The same ternary polynomial is carried twice: once over the chain primes
/// (`poly_q`) and once over the shared auxiliary primes (`poly_p`), so the key
/// can serve as key-switching material without re-deriving residues. Both
/// copies live in NTT domain at the full level of their chain.
#[derive(Debug, Clone)]
pub struct SecretKey<const DEGREE: usize> {
    pub poly_q: RnsPoly<DEGREE>,
    pub poly_p: RnsPoly<DEGREE>,
    pub hamming_weight: usize,
}

impl<const DEGREE: usize> SecretKey<DEGREE> {
    pub fn generate<R: Rng>(
        chain: Arc<ModuliChain<DEGREE>>,
        aux: Arc<ModuliChain<DEGREE>>,
        hamming_weight: usize,
        rng: &mut R,
    ) -> RingResult<Self> {
        let coeffs = ternary_coefficients::<DEGREE, _>(hamming_weight, rng);
        Self::from_ternary_coeffs(&coeffs, chain, aux, hamming_weight)
    }

    /// Builds a key from explicit ternary coefficients. Used by key switching,
    /// which re-encodes an existing key's coefficients over new chains.
    pub(crate) fn from_ternary_coeffs(
        coeffs: &[i64],
        chain: Arc<ModuliChain<DEGREE>>,
        aux: Arc<ModuliChain<DEGREE>>,
        hamming_weight: usize,
    ) -> RingResult<Self> {
        let max_level = chain.max_level();
        let mut poly_q = RnsPoly::from_coeffs(coeffs, chain, max_level)?;
        let aux_level = aux.max_level();
        let mut poly_p = RnsPoly::from_coeffs(coeffs, aux, aux_level)?;
        poly_q.to_ntt_domain();
        poly_p.to_ntt_domain();
        Ok(Self {
            poly_q,
            poly_p,
            hamming_weight,
        })
    }

    /// The key's centered ternary coefficients, recovered from the first
    /// chain prime. Exact because every coefficient is in `{-1, 0, 1}`.
    pub(crate) fn ternary_coeffs(&self) -> [i64; DEGREE] {
        let mut poly = self.poly_q.clone();
        poly.to_coeff_domain();
        let q0 = poly.chain().primes()[0];
        let mut coeffs = [0i64; DEGREE];
        for (c, &r) in coeffs.iter_mut().zip(poly.channels()[0].iter()) {
            *c = if r > q0 / 2 { r as i64 - q0 as i64 } else { r as i64 };
        }
        coeffs
    }
}

/// Public encryption key `(b, a)` with `b = -(a * s) + e`, NTT domain.
#[derive(Debug, Clone)]
pub struct PublicKey<const DEGREE: usize> {
    pub b: RnsPoly<DEGREE>,
    pub a: RnsPoly<DEGREE>,
}

impl<const DEGREE: usize> PublicKey<DEGREE> {
    pub fn generate<R: Rng>(
        secret_key: &SecretKey<DEGREE>,
        error_std_dev: f64,
        rng: &mut R,
    ) -> RingResult<Self> {
        let chain = secret_key.poly_q.chain().clone();
        let level = secret_key.poly_q.level();

        let a = RnsPoly::sample_uniform_ntt(chain.clone(), level, rng)?;
        let mut e = RnsPoly::sample_gaussian(error_std_dev, chain, level, rng)?;
        e.to_ntt_domain();

        let mut b = a.clone();
        b.mul_assign_ntt(&secret_key.poly_q);
        b = -b;
        b += &e;

        Ok(Self { b, a })
    }
}
