use super::{
    chain::{ModuliChain, NttTable, add_mod, mod_inverse, mul_mod, reverse_bits, sub_mod},
    errors::{RingError, RingResult},
};
use crate::math::sampling::{
    gaussian_coefficients, ternary_coefficients, uniform_coefficients,
};
use rand::Rng;
use std::{
    ops::{AddAssign, Neg, SubAssign},
    sync::Arc,
};

/// A polynomial in `Z_{q_0} x … x Z_{q_l}[X] / (X^N + 1)` at chain level `l`.
///
/// Stores one `[u64; DEGREE]` array per active RNS channel. The full chain is
/// shared behind an `Arc`; `level` selects how many leading primes are live,
/// so level drops and raises never clone NTT tables. The `in_ntt_domain` flag
/// tracks whether the arrays hold coefficient-domain or NTT-domain values.
///
/// # Invariants
/// - `channels.len() == level + 1 <= chain.prime_count()`
/// - Every `channels[i][j] < chain.primes()[i]`
/// - `DEGREE` is a power of two
#[derive(Clone, Debug)]
pub struct RnsPoly<const DEGREE: usize> {
    channels: Vec<[u64; DEGREE]>,
    chain: Arc<ModuliChain<DEGREE>>,
    level: usize,
    in_ntt_domain: bool,
}

// ─── Constructors ─────────────────────────────────────────────────────────────

impl<const DEGREE: usize> RnsPoly<DEGREE> {
    /// Creates the zero polynomial at `level`, in coefficient domain.
    pub fn zero(chain: Arc<ModuliChain<DEGREE>>, level: usize) -> RingResult<Self> {
        check_level(&chain, level)?;
        let channels = vec![[0u64; DEGREE]; level + 1];
        Ok(Self {
            channels,
            chain,
            level,
            in_ntt_domain: false,
        })
    }

    /// Creates a polynomial from signed integer coefficients at `level`.
    ///
    /// Each coefficient is reduced into `[0, q_i)` per channel via `rem_euclid`.
    /// Accepts slices of length ≥ DEGREE; only the first DEGREE elements are used.
    pub fn from_coeffs(
        coeffs: &[i64],
        chain: Arc<ModuliChain<DEGREE>>,
        level: usize,
    ) -> RingResult<Self> {
        check_level(&chain, level)?;
        assert!(
            coeffs.len() >= DEGREE,
            "from_coeffs: need at least {DEGREE} coefficients, got {}",
            coeffs.len()
        );
        let mut channels = vec![[0u64; DEGREE]; level + 1];
        for (ch, channel) in channels.iter_mut().enumerate() {
            let q = chain.primes()[ch] as i128;
            for (i, coeff) in coeffs.iter().take(DEGREE).enumerate() {
                channel[i] = (*coeff as i128).rem_euclid(q) as u64;
            }
        }
        Ok(Self {
            channels,
            chain,
            level,
            in_ntt_domain: false,
        })
    }

    /// Creates a polynomial from pre-built channel arrays.
    ///
    /// Returns an error if the channel count doesn't match `level + 1`, or if
    /// any coefficient is not reduced (i.e., ≥ the corresponding modulus).
    pub fn from_channels(
        channels: Vec<[u64; DEGREE]>,
        chain: Arc<ModuliChain<DEGREE>>,
        level: usize,
        in_ntt_domain: bool,
    ) -> RingResult<Self> {
        check_level(&chain, level)?;
        let expected = level + 1;
        let actual = channels.len();
        if actual != expected {
            return Err(RingError::ChannelCountMismatch { expected, actual });
        }
        for (ch, channel) in channels.iter().enumerate() {
            let q = chain.primes()[ch];
            for &c in channel {
                if c >= q {
                    return Err(RingError::NonReducedCoefficient {
                        coefficient: c,
                        modulus: q,
                    });
                }
            }
        }
        Ok(Self {
            channels,
            chain,
            level,
            in_ntt_domain,
        })
    }

    // Internal: skips the O(N·L) reducedness check. Only for use where
    // coefficients are constructed correctly within this crate.
    pub(crate) fn from_channels_unchecked(
        channels: Vec<[u64; DEGREE]>,
        chain: Arc<ModuliChain<DEGREE>>,
        level: usize,
        in_ntt_domain: bool,
    ) -> Self {
        debug_assert_eq!(channels.len(), level + 1);
        Self {
            channels,
            chain,
            level,
            in_ntt_domain,
        }
    }
}

// ─── Accessors & domain conversion ───────────────────────────────────────────

impl<const DEGREE: usize> RnsPoly<DEGREE> {
    pub fn channels(&self) -> &[[u64; DEGREE]] {
        &self.channels
    }

    pub fn chain(&self) -> &Arc<ModuliChain<DEGREE>> {
        &self.chain
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn is_ntt_domain(&self) -> bool {
        self.in_ntt_domain
    }

    /// Converts to NTT domain in-place (no-op if already there).
    pub fn to_ntt_domain(&mut self) {
        if self.in_ntt_domain {
            return;
        }
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            forward_ntt(channel, self.chain.ntt_table(ch));
        }
        self.in_ntt_domain = true;
    }

    /// Converts to coefficient domain in-place (no-op if already there).
    pub fn to_coeff_domain(&mut self) {
        if !self.in_ntt_domain {
            return;
        }
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            inverse_ntt(channel, self.chain.ntt_table(ch));
        }
        self.in_ntt_domain = false;
    }

    /// Returns the polynomial truncated to `target_level` (noise-free level
    /// drop: the trailing channels are discarded, residues are untouched).
    pub fn mod_drop_to(&self, target_level: usize) -> RingResult<Self> {
        if target_level > self.level {
            return Err(RingError::LevelOutOfRange {
                level: target_level,
                max_level: self.level,
            });
        }
        Ok(Self {
            channels: self.channels[..=target_level].to_vec(),
            chain: self.chain.clone(),
            level: target_level,
            in_ntt_domain: self.in_ntt_domain,
        })
    }

    /// Divides by the top prime with rounding and drops one level.
    ///
    /// For each remaining channel: `c_i' = (c_i - c_top) * q_top^{-1} mod q_i`
    /// with `c_top` taken as the centered representative, which makes the
    /// division a rounding one. Requires coefficient domain.
    pub fn rescale_assign(&mut self) -> RingResult<()> {
        debug_assert!(
            !self.in_ntt_domain,
            "rescale_assign: requires coefficient domain"
        );
        if self.level == 0 {
            return Err(RingError::RescaleAtBottom);
        }
        let top = self
            .channels
            .pop()
            .expect("rescale_assign: level > 0 implies a top channel");
        let q_top = self.chain.primes()[self.level];
        let half_top = q_top / 2;
        self.level -= 1;

        for (ch, channel) in self.channels.iter_mut().enumerate() {
            let q = self.chain.primes()[ch];
            let q_top_inv = mod_inverse(q_top % q, q);
            for (c, &t) in channel.iter_mut().zip(top.iter()) {
                // Centered lift of the top residue, reduced into [0, q).
                let t_centered = if t > half_top {
                    sub_mod(t % q, q_top % q, q)
                } else {
                    t % q
                };
                *c = mul_mod(sub_mod(*c, t_centered, q), q_top_inv, q);
            }
        }
        Ok(())
    }

    /// Multiplies by the monomial `X^{N/2}` in-place.
    ///
    /// In the canonical embedding every slot value is multiplied by `i`.
    /// Requires coefficient domain.
    pub fn mul_by_i_assign(&mut self) {
        debug_assert!(
            !self.in_ntt_domain,
            "mul_by_i_assign: requires coefficient domain"
        );
        let half = DEGREE / 2;
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            let q = self.chain.primes()[ch];
            let mut rotated = [0u64; DEGREE];
            for k in 0..half {
                rotated[k + half] = channel[k];
            }
            for k in half..DEGREE {
                // X^N = -1 in Z[X]/(X^N + 1)
                let c = channel[k];
                rotated[k - half] = if c == 0 { 0 } else { q - c };
            }
            *channel = rotated;
        }
    }

    /// CRT-reconstructs centered coefficients from the leading channels.
    ///
    /// Uses at most `chain.reconstruction_channels()` channels, so the result
    /// is exact only when the true centered value fits in the corresponding
    /// sub-product. Decryption noise plus scaled plaintext satisfy this for
    /// the parameter sets this crate targets.
    ///
    /// If the polynomial is in NTT domain, a temporary clone is converted to
    /// coefficient domain first.
    pub fn to_coeffs_centered(&self) -> [i64; DEGREE] {
        let tmp;
        let channels: &[[u64; DEGREE]] = if self.in_ntt_domain {
            tmp = {
                let mut clone = self.clone();
                clone.to_coeff_domain();
                clone
            };
            &tmp.channels
        } else {
            &self.channels
        };

        let used = self.chain.reconstruction_channels().min(self.level + 1);
        let mut result = [0i64; DEGREE];
        let mut residues = vec![0u64; used];
        for i in 0..DEGREE {
            for (ch, channel) in channels.iter().take(used).enumerate() {
                residues[ch] = channel[i];
            }
            result[i] = self.chain.reconstruct_centered_coeff(&residues);
        }
        result
    }
}

// ─── Arithmetic ───────────────────────────────────────────────────────────────

impl<const DEGREE: usize> AddAssign<&RnsPoly<DEGREE>> for RnsPoly<DEGREE> {
    /// Coefficient-wise addition modulo each `q_i`.
    ///
    /// Works in both coefficient and NTT domain. Both operands must share the
    /// same chain, level and domain.
    fn add_assign(&mut self, rhs: &RnsPoly<DEGREE>) {
        debug_assert!(
            Arc::ptr_eq(&self.chain, &rhs.chain),
            "add_assign: chain mismatch"
        );
        debug_assert_eq!(self.level, rhs.level, "add_assign: level mismatch");
        debug_assert_eq!(
            self.in_ntt_domain, rhs.in_ntt_domain,
            "add_assign: domain mismatch"
        );
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            let q = self.chain.primes()[ch];
            for (a, &b) in channel.iter_mut().zip(rhs.channels[ch].iter()) {
                *a = add_mod(*a, b, q);
            }
        }
    }
}

impl<const DEGREE: usize> SubAssign<&RnsPoly<DEGREE>> for RnsPoly<DEGREE> {
    /// Coefficient-wise subtraction modulo each `q_i`; same requirements as
    /// addition.
    fn sub_assign(&mut self, rhs: &RnsPoly<DEGREE>) {
        debug_assert!(
            Arc::ptr_eq(&self.chain, &rhs.chain),
            "sub_assign: chain mismatch"
        );
        debug_assert_eq!(self.level, rhs.level, "sub_assign: level mismatch");
        debug_assert_eq!(
            self.in_ntt_domain, rhs.in_ntt_domain,
            "sub_assign: domain mismatch"
        );
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            let q = self.chain.primes()[ch];
            for (a, &b) in channel.iter_mut().zip(rhs.channels[ch].iter()) {
                *a = sub_mod(*a, b, q);
            }
        }
    }
}

impl<const DEGREE: usize> Neg for RnsPoly<DEGREE> {
    type Output = Self;

    /// Coefficient-wise negation modulo each `q_i`. Works in both domains.
    fn neg(mut self) -> Self {
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            let q = self.chain.primes()[ch];
            for c in channel.iter_mut() {
                if *c != 0 {
                    *c = q - *c;
                }
            }
        }
        self
    }
}

impl<const DEGREE: usize> RnsPoly<DEGREE> {
    /// Pointwise product in NTT domain, channel by channel.
    ///
    /// Both operands must be in NTT domain and share the same chain and level.
    pub fn mul_assign_ntt(&mut self, rhs: &RnsPoly<DEGREE>) {
        debug_assert!(
            self.in_ntt_domain && rhs.in_ntt_domain,
            "mul_assign_ntt: requires NTT domain; call to_ntt_domain first"
        );
        debug_assert!(
            Arc::ptr_eq(&self.chain, &rhs.chain),
            "mul_assign_ntt: chain mismatch"
        );
        debug_assert_eq!(self.level, rhs.level, "mul_assign_ntt: level mismatch");
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            let q = self.chain.primes()[ch];
            for (a, &b) in channel.iter_mut().zip(rhs.channels[ch].iter()) {
                *a = mul_mod(*a, b, q);
            }
        }
    }
}

// ─── Sampling ─────────────────────────────────────────────────────────────────

impl<const DEGREE: usize> RnsPoly<DEGREE> {
    /// Samples coefficients uniform in `[0, q_i)` per channel, NTT domain.
    ///
    /// Uniform residues are uniform in either domain, so the sample is tagged
    /// NTT-domain directly for use as the public random polynomial.
    pub fn sample_uniform_ntt<R: Rng>(
        chain: Arc<ModuliChain<DEGREE>>,
        level: usize,
        rng: &mut R,
    ) -> RingResult<Self> {
        check_level(&chain, level)?;
        let mut channels = vec![[0u64; DEGREE]; level + 1];
        for (ch, channel) in channels.iter_mut().enumerate() {
            *channel = uniform_coefficients::<DEGREE, _>(chain.primes()[ch], rng);
        }
        Ok(Self {
            channels,
            chain,
            level,
            in_ntt_domain: true,
        })
    }

    /// Samples noise from N(0, std_dev), rounded and CRT-encoded per channel.
    pub fn sample_gaussian<R: Rng>(
        std_dev: f64,
        chain: Arc<ModuliChain<DEGREE>>,
        level: usize,
        rng: &mut R,
    ) -> RingResult<Self> {
        let noise = gaussian_coefficients::<DEGREE, _>(std_dev, rng);
        Self::from_coeffs(&noise, chain, level)
    }

    /// Samples a ternary polynomial with exactly `hamming_weight` non-zero
    /// coefficients.
    pub fn sample_ternary<R: Rng>(
        hamming_weight: usize,
        chain: Arc<ModuliChain<DEGREE>>,
        level: usize,
        rng: &mut R,
    ) -> RingResult<Self> {
        let ternary = ternary_coefficients::<DEGREE, _>(hamming_weight, rng);
        Self::from_coeffs(&ternary, chain, level)
    }
}

fn check_level<const DEGREE: usize>(
    chain: &ModuliChain<DEGREE>,
    level: usize,
) -> RingResult<()> {
    if level > chain.max_level() {
        return Err(RingError::LevelOutOfRange {
            level,
            max_level: chain.max_level(),
        });
    }
    Ok(())
}

// ─── NTT kernels (private) ────────────────────────────────────────────────────

// Twisted negacyclic transform: entry k of the forward output holds the
// evaluation at ψ^{2k+1} (see `NttTable`).
fn forward_ntt<const DEGREE: usize>(
    coeffs: &mut [u64; DEGREE],
    table: &NttTable<DEGREE>,
) {
    for (c, &t) in coeffs.iter_mut().zip(table.twist.iter()) {
        *c = mul_mod(*c, t, table.modulus);
    }
    bit_reverse_permute(coeffs);
    cooley_tukey_ntt(coeffs, &table.forward_roots, table.modulus);
}

pub(crate) fn inverse_ntt<const DEGREE: usize>(
    evals: &mut [u64; DEGREE],
    table: &NttTable<DEGREE>,
) {
    bit_reverse_permute(evals);
    cooley_tukey_ntt(evals, &table.inverse_roots, table.modulus);
    for (v, &t) in evals.iter_mut().zip(table.twist_inv.iter()) {
        *v = mul_mod(mul_mod(*v, table.n_inv, table.modulus), t, table.modulus);
    }
}

fn cooley_tukey_ntt<const DEGREE: usize>(
    values: &mut [u64; DEGREE],
    roots: &[u64; DEGREE],
    modulus: u64,
) {
    let mut len = 2;
    while len <= DEGREE {
        let half = len / 2;
        let step = DEGREE / len;
        for start in (0..DEGREE).step_by(len) {
            for offset in 0..half {
                let left = start + offset;
                let right = left + half;
                let twiddle = roots[offset * step];
                let t = mul_mod(values[right], twiddle, modulus);
                let u = values[left];
                values[left] = add_mod(u, t, modulus);
                values[right] = sub_mod(u, t, modulus);
            }
        }
        len *= 2;
    }
}

fn bit_reverse_permute<const DEGREE: usize>(values: &mut [u64; DEGREE]) {
    let bits = DEGREE.trailing_zeros() as usize;
    for i in 0..DEGREE {
        let j = reverse_bits(i, bits);
        if i < j {
            values.swap(i, j);
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn chain_17_97() -> Arc<ModuliChain<8>> {
        Arc::new(ModuliChain::new(vec![17, 97]).unwrap())
    }

    fn chain_three() -> Arc<ModuliChain<8>> {
        Arc::new(ModuliChain::new(vec![17, 97, 113]).unwrap())
    }

    // ── Construction ──────────────────────────────────────────────────────────

    #[test]
    fn zero_poly_is_all_zeros() {
        let poly = RnsPoly::<8>::zero(chain_17_97(), 1).unwrap();
        for ch in poly.channels() {
            assert!(ch.iter().all(|&c| c == 0));
        }
        assert!(!poly.is_ntt_domain());
        assert_eq!(poly.level(), 1);
    }

    #[test]
    fn zero_rejects_level_beyond_chain() {
        assert!(matches!(
            RnsPoly::<8>::zero(chain_17_97(), 2),
            Err(RingError::LevelOutOfRange {
                level: 2,
                max_level: 1
            })
        ));
    }

    #[test]
    fn from_coeffs_reduces_correctly() {
        let poly =
            RnsPoly::<8>::from_coeffs(&[-1, 2, -3, 4, 0, 0, 0, 0], chain_17_97(), 1)
                .unwrap();
        // channel 0: mod 17 → [-1→16, 2→2, -3→14, 4→4, …]
        assert_eq!(poly.channels()[0][0], 16);
        assert_eq!(poly.channels()[0][1], 2);
        assert_eq!(poly.channels()[0][2], 14);
        // channel 1: mod 97 → [-1→96, …]
        assert_eq!(poly.channels()[1][0], 96);
    }

    #[test]
    fn from_coeffs_at_sub_level_uses_prefix_only() {
        let poly = RnsPoly::<8>::from_coeffs(&[5; 8], chain_three(), 0).unwrap();
        assert_eq!(poly.channels().len(), 1);
        assert_eq!(poly.level(), 0);
    }

    #[test]
    fn from_channels_rejects_unreduced_coefficient() {
        let bad = vec![[17u64; 8], [0u64; 8]]; // 17 ≥ q_0 = 17
        assert!(matches!(
            RnsPoly::from_channels(bad, chain_17_97(), 1, false),
            Err(RingError::NonReducedCoefficient { .. })
        ));
    }

    #[test]
    fn from_channels_rejects_wrong_channel_count() {
        let too_few = vec![[0u64; 8]]; // level 1 needs 2
        assert!(matches!(
            RnsPoly::from_channels(too_few, chain_17_97(), 1, false),
            Err(RingError::ChannelCountMismatch { .. })
        ));
    }

    // ── NTT roundtrip ─────────────────────────────────────────────────────────

    #[test]
    fn ntt_roundtrip_preserves_coefficients() {
        let mut poly =
            RnsPoly::<8>::from_coeffs(&[1, -2, 3, 4, -5, 6, 7, -8], chain_17_97(), 1)
                .unwrap();
        let original = poly.channels().to_vec();

        poly.to_ntt_domain();
        assert!(poly.is_ntt_domain());
        poly.to_coeff_domain();
        assert!(!poly.is_ntt_domain());

        assert_eq!(poly.channels(), original.as_slice());
    }

    #[test]
    fn to_ntt_is_idempotent() {
        let mut poly =
            RnsPoly::<8>::from_coeffs(&[1, 2, 3, 4, 5, 6, 7, 8], chain_17_97(), 1)
                .unwrap();
        poly.to_ntt_domain();
        let after_first = poly.channels().to_vec();
        poly.to_ntt_domain(); // no-op
        assert_eq!(poly.channels(), after_first.as_slice());
    }

    // ── Level drop & rescale ──────────────────────────────────────────────────

    #[test]
    fn mod_drop_truncates_channels() {
        let poly =
            RnsPoly::<8>::from_coeffs(&[1, 2, 3, 4, 5, 6, 7, 8], chain_three(), 2)
                .unwrap();
        let dropped = poly.mod_drop_to(1).unwrap();
        assert_eq!(dropped.level(), 1);
        assert_eq!(dropped.channels().len(), 2);
        assert_eq!(dropped.channels()[0], poly.channels()[0]);
        // Same chain handle, no table rebuild.
        assert!(Arc::ptr_eq(dropped.chain(), poly.chain()));
    }

    #[test]
    fn mod_drop_rejects_raising() {
        let poly = RnsPoly::<8>::from_coeffs(&[0; 8], chain_three(), 1).unwrap();
        assert!(matches!(
            poly.mod_drop_to(2),
            Err(RingError::LevelOutOfRange { .. })
        ));
    }

    #[test]
    fn rescale_divides_exact_multiples() {
        // 291 = 3 * 97: dividing by the top prime 97 must give exactly 3.
        let mut poly =
            RnsPoly::<8>::from_coeffs(&[291, 0, 0, 0, 0, 0, 0, 0], chain_17_97(), 1)
                .unwrap();
        poly.rescale_assign().unwrap();
        assert_eq!(poly.level(), 0);
        assert_eq!(poly.to_coeffs_centered()[0], 3);
    }

    #[test]
    fn rescale_rounds_to_nearest() {
        // 100 / 97 rounds to 1, 50 / 97 rounds to 1, 40 / 97 rounds to 0.
        for (value, expected) in [(100i64, 1i64), (50, 1), (40, 0)] {
            let mut coeffs = [0i64; 8];
            coeffs[0] = value;
            let mut poly =
                RnsPoly::<8>::from_coeffs(&coeffs, chain_17_97(), 1).unwrap();
            poly.rescale_assign().unwrap();
            assert_eq!(
                poly.to_coeffs_centered()[0],
                expected,
                "rescaling {value}"
            );
        }
    }

    #[test]
    fn rescale_at_level_zero_fails() {
        let mut poly = RnsPoly::<8>::from_coeffs(&[1; 8], chain_17_97(), 0).unwrap();
        assert!(matches!(
            poly.rescale_assign(),
            Err(RingError::RescaleAtBottom)
        ));
    }

    // ── Arithmetic ────────────────────────────────────────────────────────────

    #[test]
    fn add_assign_computes_correct_sum() {
        let chain = chain_17_97();
        let mut a =
            RnsPoly::<8>::from_coeffs(&[1, 2, 3, 4, 5, 6, 7, 8], chain.clone(), 1)
                .unwrap();
        let b = RnsPoly::<8>::from_coeffs(&[8, 7, 6, 5, 4, 3, 2, 1], chain, 1)
            .unwrap();
        a += &b;
        assert!(a.channels()[0].iter().all(|&c| c == 9));
        assert!(a.channels()[1].iter().all(|&c| c == 9));
    }

    #[test]
    fn sub_assign_inverts_add() {
        let chain = chain_17_97();
        let orig = RnsPoly::<8>::from_coeffs(&[1, -2, 3, -4, 5, -6, 7, -8], chain.clone(), 1)
            .unwrap();
        let b = RnsPoly::<8>::from_coeffs(&[9, 8, -7, 6, 5, -4, 3, 2], chain, 1)
            .unwrap();
        let mut a = orig.clone();
        a += &b;
        a -= &b;
        assert_eq!(a.channels(), orig.channels());
    }

    #[test]
    fn neg_negates_coefficients() {
        let poly =
            RnsPoly::<8>::from_coeffs(&[3, 0, 0, 0, 0, 0, 0, 0], chain_17_97(), 1)
                .unwrap();
        let neg = -poly;
        // -3 mod 17 = 14
        assert_eq!(neg.channels()[0][0], 14);
        // 0 stays 0
        assert_eq!(neg.channels()[0][1], 0);
    }

    #[test]
    fn ntt_pointwise_mul_matches_schoolbook() {
        // (1 + x) * (1 + x) = 1 + 2x + x^2  in Z[x]/(x^8+1)
        let chain = chain_17_97();
        let mut a =
            RnsPoly::<8>::from_coeffs(&[1, 1, 0, 0, 0, 0, 0, 0], chain.clone(), 1)
                .unwrap();
        let mut b = RnsPoly::<8>::from_coeffs(&[1, 1, 0, 0, 0, 0, 0, 0], chain, 1)
            .unwrap();
        a.to_ntt_domain();
        b.to_ntt_domain();
        a.mul_assign_ntt(&b);
        a.to_coeff_domain();
        let coeffs = a.to_coeffs_centered();
        assert_eq!(coeffs[0], 1);
        assert_eq!(coeffs[1], 2);
        assert_eq!(coeffs[2], 1);
        assert!(coeffs[3..].iter().all(|&c| c == 0));
    }

    #[test]
    fn ntt_mul_wraps_around_quotient() {
        // x^7 * x = x^8 = -1  in Z[x]/(x^8+1)
        let chain = chain_17_97();
        let mut a =
            RnsPoly::<8>::from_coeffs(&[0, 0, 0, 0, 0, 0, 0, 1], chain.clone(), 1)
                .unwrap();
        let mut b = RnsPoly::<8>::from_coeffs(&[0, 1, 0, 0, 0, 0, 0, 0], chain, 1)
            .unwrap();
        a.to_ntt_domain();
        b.to_ntt_domain();
        a.mul_assign_ntt(&b);
        a.to_coeff_domain();
        let coeffs = a.to_coeffs_centered();
        assert_eq!(coeffs[0], -1);
        assert!(coeffs[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn mul_by_i_twice_negates() {
        let input = [1i64, -2, 3, -4, 5, -6, 7, -8];
        let mut poly = RnsPoly::<8>::from_coeffs(&input, chain_17_97(), 1).unwrap();
        poly.mul_by_i_assign();
        poly.mul_by_i_assign();
        let coeffs = poly.to_coeffs_centered();
        for (got, &orig) in coeffs.iter().zip(input.iter()) {
            assert_eq!(*got, -orig);
        }
    }

    // ── Reconstruction ────────────────────────────────────────────────────────

    #[test]
    fn to_coeffs_centered_roundtrips_from_coeffs() {
        let input = [1i64, -2, 3, -4, 5, -6, 7, -8];
        let poly = RnsPoly::<8>::from_coeffs(&input, chain_17_97(), 1).unwrap();
        assert_eq!(poly.to_coeffs_centered(), input);
    }

    #[test]
    fn to_coeffs_centered_works_from_ntt_domain() {
        let input = [1i64, -2, 3, -4, 5, -6, 7, -8];
        let mut poly = RnsPoly::<8>::from_coeffs(&input, chain_17_97(), 1).unwrap();
        poly.to_ntt_domain();
        // Auto-converts a clone without mutating poly.
        assert_eq!(poly.to_coeffs_centered(), input);
        assert!(poly.is_ntt_domain(), "poly should still be in NTT domain");
    }

    // ── Sampling ──────────────────────────────────────────────────────────────

    #[test]
    fn sample_uniform_stays_in_range() {
        let chain = chain_17_97();
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let poly =
            RnsPoly::<8>::sample_uniform_ntt(chain.clone(), 1, &mut rng).unwrap();
        assert!(poly.is_ntt_domain());
        for (ch, channel) in poly.channels().iter().enumerate() {
            let q = chain.primes()[ch];
            for &c in channel {
                assert!(c < q);
            }
        }
    }

    #[test]
    fn sample_ternary_has_correct_hamming_weight() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let hw = 3;
        let poly =
            RnsPoly::<8>::sample_ternary(hw, chain_17_97(), 1, &mut rng).unwrap();
        let non_zero = poly.channels()[0].iter().filter(|&&c| c != 0).count();
        assert_eq!(non_zero, hw);
    }
}
