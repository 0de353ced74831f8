use crate::ciphertext::Ciphertext;
use crate::encoding::Plaintext;
use crate::extender::BasisExtender;
use crate::keys::{PublicKey, SecretKey};
use crate::params::ConfigResult;
use crate::rings::{ModuliChain, RingResult, RnsPoly};
use rand::Rng;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CkksParams {
    pub error_std_dev: f64,
    pub hamming_weight: usize,
}

impl Default for CkksParams {
    fn default() -> Self {
        Self {
            error_std_dev: 3.2,
            hamming_weight: 192,
        }
    }
}

/// Key generation, encryption, and the evaluator operations the bootstrap
/// orchestrator drives: add, plaintext multiply, rescale, level drop, and
/// in-chain modulus raise.
pub struct CkksEngine<const DEGREE: usize> {
    chain: Arc<ModuliChain<DEGREE>>,
    aux: Arc<ModuliChain<DEGREE>>,
    params: CkksParams,
}

impl<const DEGREE: usize> CkksEngine<DEGREE> {
    pub fn new(
        chain: Arc<ModuliChain<DEGREE>>,
        aux: Arc<ModuliChain<DEGREE>>,
        params: CkksParams,
    ) -> Self {
        Self { chain, aux, params }
    }

    pub fn chain(&self) -> &Arc<ModuliChain<DEGREE>> {
        &self.chain
    }

    pub fn params(&self) -> &CkksParams {
        &self.params
    }

    // ── Keys ─────────────────────────────────────────────────────────────────

    pub fn generate_secret_key<R: Rng>(
        &self,
        rng: &mut R,
    ) -> RingResult<SecretKey<DEGREE>> {
        SecretKey::generate(
            self.chain.clone(),
            self.aux.clone(),
            self.params.hamming_weight,
            rng,
        )
    }

    pub fn generate_public_key<R: Rng>(
        &self,
        secret_key: &SecretKey<DEGREE>,
        rng: &mut R,
    ) -> RingResult<PublicKey<DEGREE>> {
        PublicKey::generate(secret_key, self.params.error_std_dev, rng)
    }

    // ── Encryption / decryption ──────────────────────────────────────────────

    /// Encrypts at the plaintext's level. The public key lives at the full
    /// chain level and is dropped down as needed.
    pub fn encrypt<R: Rng>(
        &self,
        plaintext: &Plaintext<DEGREE>,
        public_key: &PublicKey<DEGREE>,
        rng: &mut R,
    ) -> RingResult<Ciphertext<DEGREE>> {
        let level = plaintext.poly.level();
        let b = public_key.b.mod_drop_to(level)?;
        let a = public_key.a.mod_drop_to(level)?;

        let mut u = RnsPoly::sample_ternary(
            self.params.hamming_weight,
            self.chain.clone(),
            level,
            rng,
        )?;
        u.to_ntt_domain();
        let mut e0 = RnsPoly::sample_gaussian(
            self.params.error_std_dev,
            self.chain.clone(),
            level,
            rng,
        )?;
        e0.to_ntt_domain();
        let mut e1 = RnsPoly::sample_gaussian(
            self.params.error_std_dev,
            self.chain.clone(),
            level,
            rng,
        )?;
        e1.to_ntt_domain();

        let mut message = plaintext.poly.clone();
        message.to_ntt_domain();

        // c0 = b * u + e0 + m
        let mut c0 = b;
        c0.mul_assign_ntt(&u);
        c0 += &e0;
        c0 += &message;

        // c1 = a * u + e1
        let mut c1 = a;
        c1.mul_assign_ntt(&u);
        c1 += &e1;

        Ok(Ciphertext::new(
            c0,
            c1,
            plaintext.scale,
            true,
            plaintext.slots,
        ))
    }

    /// Decrypts `c0 + c1 * s` into a coefficient-domain plaintext.
    pub fn decrypt(
        &self,
        ciphertext: &Ciphertext<DEGREE>,
        secret_key: &SecretKey<DEGREE>,
    ) -> RingResult<Plaintext<DEGREE>> {
        let level = ciphertext.level();
        let s = secret_key.poly_q.mod_drop_to(level)?;

        let mut c0 = ciphertext.c0.clone();
        let mut c1 = ciphertext.c1.clone();
        c0.to_ntt_domain();
        c1.to_ntt_domain();

        let mut result = c1;
        result.mul_assign_ntt(&s);
        result += &c0;
        result.to_coeff_domain();

        Ok(Plaintext {
            poly: result,
            scale: ciphertext.scale,
            slots: ciphertext.slots,
        })
    }

    // ── Homomorphic operations ───────────────────────────────────────────────

    pub fn add(
        &self,
        ct1: &Ciphertext<DEGREE>,
        ct2: &Ciphertext<DEGREE>,
    ) -> Ciphertext<DEGREE> {
        debug_assert_eq!(ct1.level(), ct2.level(), "add: level mismatch");
        debug_assert!(
            (ct1.scale - ct2.scale).abs() / ct1.scale < 1e-9,
            "add: scale mismatch"
        );
        let mut c0 = ct1.c0.clone();
        c0 += &ct2.c0;
        let mut c1 = ct1.c1.clone();
        c1 += &ct2.c1;
        Ciphertext::new(c0, c1, ct1.scale, ct1.is_batched, ct1.slots)
    }

    /// Multiplies by a plaintext; the scales multiply.
    pub fn mul_plain(
        &self,
        ct: &Ciphertext<DEGREE>,
        pt: &Plaintext<DEGREE>,
    ) -> Ciphertext<DEGREE> {
        debug_assert_eq!(ct.level(), pt.poly.level(), "mul_plain: level mismatch");
        let mut message = pt.poly.clone();
        message.to_ntt_domain();

        let mut c0 = ct.c0.clone();
        let mut c1 = ct.c1.clone();
        c0.to_ntt_domain();
        c1.to_ntt_domain();
        c0.mul_assign_ntt(&message);
        c1.mul_assign_ntt(&message);

        Ciphertext::new(c0, c1, ct.scale * pt.scale, ct.is_batched, ct.slots)
    }

    /// Multiplies every slot by `i` (monomial `X^{N/2}` on both components).
    pub fn mul_by_i(&self, ct: &Ciphertext<DEGREE>) -> Ciphertext<DEGREE> {
        let was_ntt = ct.is_ntt_domain();
        let mut c0 = ct.c0.clone();
        let mut c1 = ct.c1.clone();
        c0.to_coeff_domain();
        c1.to_coeff_domain();
        c0.mul_by_i_assign();
        c1.mul_by_i_assign();
        if was_ntt {
            c0.to_ntt_domain();
            c1.to_ntt_domain();
        }
        Ciphertext::new(c0, c1, ct.scale, ct.is_batched, ct.slots)
    }

    /// Divides by the top prime with rounding, consuming one level. The
    /// recorded scale shrinks by the exact prime value.
    pub fn rescale(&self, ct: &Ciphertext<DEGREE>) -> RingResult<Ciphertext<DEGREE>> {
        let was_ntt = ct.is_ntt_domain();
        let q_top = self.chain.primes()[ct.level()];

        let mut c0 = ct.c0.clone();
        let mut c1 = ct.c1.clone();
        c0.to_coeff_domain();
        c1.to_coeff_domain();
        c0.rescale_assign()?;
        c1.rescale_assign()?;
        if was_ntt {
            c0.to_ntt_domain();
            c1.to_ntt_domain();
        }

        Ok(Ciphertext::new(
            c0,
            c1,
            ct.scale / q_top as f64,
            ct.is_batched,
            ct.slots,
        ))
    }

    /// Noise-free level drop: trailing channels discarded, scale unchanged.
    pub fn mod_drop_to(
        &self,
        ct: &Ciphertext<DEGREE>,
        target_level: usize,
    ) -> RingResult<Ciphertext<DEGREE>> {
        Ok(Ciphertext::new(
            ct.c0.mod_drop_to(target_level)?,
            ct.c1.mod_drop_to(target_level)?,
            ct.scale,
            ct.is_batched,
            ct.slots,
        ))
    }

    /// In-chain modulus raise: extends the centered residues of the active
    /// prefix onto the dropped upper primes. Exact whenever the underlying
    /// centered values fit the active sub-modulus.
    pub fn mod_raise(
        &self,
        ct: &Ciphertext<DEGREE>,
        target_level: usize,
    ) -> ConfigResult<Ciphertext<DEGREE>> {
        let level = ct.level();
        debug_assert!(target_level > level, "mod_raise: target must be above");
        let extender = BasisExtender::new(
            self.chain.primes_at_level(level),
            &self.chain.primes()[level + 1..=target_level],
        )?;

        let was_ntt = ct.is_ntt_domain();
        let c0 = self.raise_poly(&ct.c0, target_level, &extender, was_ntt);
        let c1 = self.raise_poly(&ct.c1, target_level, &extender, was_ntt);

        Ok(Ciphertext::new(c0, c1, ct.scale, ct.is_batched, ct.slots))
    }

    fn raise_poly(
        &self,
        poly: &RnsPoly<DEGREE>,
        target_level: usize,
        extender: &BasisExtender,
        restore_ntt: bool,
    ) -> RnsPoly<DEGREE> {
        let mut base = poly.clone();
        base.to_coeff_domain();

        let added = target_level - poly.level();
        let mut upper = vec![[0u64; DEGREE]; added];
        extender.extend_channels(base.channels(), &mut upper);

        let mut channels = base.channels().to_vec();
        channels.extend(upper);
        let mut raised = RnsPoly::from_channels_unchecked(
            channels,
            self.chain.clone(),
            target_level,
            false,
        );
        if restore_ntt {
            raised.to_ntt_domain();
        }
        raised
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::CkksEncoder;
    use crate::math::next_ntt_prime_above;
    use approx::assert_relative_eq;
    use num_complex::Complex64;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const DEGREE: usize = 64;
    const SCALE: f64 = 4096.0;

    fn test_engine() -> CkksEngine<DEGREE> {
        let mut primes = Vec::new();
        let mut p = 1u64 << 20;
        for _ in 0..3 {
            p = next_ntt_prime_above(p, DEGREE as u64);
            primes.push(p);
        }
        let aux_prime = next_ntt_prime_above(1u64 << 21, DEGREE as u64);
        let chain = Arc::new(ModuliChain::new(primes).unwrap());
        let aux = Arc::new(ModuliChain::new(vec![aux_prime]).unwrap());
        CkksEngine::new(
            chain,
            aux,
            CkksParams {
                error_std_dev: 3.2,
                hamming_weight: 8,
            },
        )
    }

    fn sample_values(n: usize) -> Vec<Complex64> {
        (0..n)
            .map(|i| {
                Complex64::new(
                    (i as f64 * 0.37).sin(),
                    (i as f64 * 0.73).cos() * 0.5,
                )
            })
            .collect()
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let engine = test_engine();
        let encoder = CkksEncoder::<DEGREE>::new();
        let mut rng = ChaCha20Rng::seed_from_u64(42);

        let sk = engine.generate_secret_key(&mut rng).unwrap();
        let pk = engine.generate_public_key(&sk, &mut rng).unwrap();

        let values = sample_values(16);
        let pt = encoder
            .encode(&values, SCALE, engine.chain().clone(), 2)
            .unwrap();
        let ct = engine.encrypt(&pt, &pk, &mut rng).unwrap();
        let decrypted = engine.decrypt(&ct, &sk).unwrap();
        let decoded = encoder.decode(&decrypted);

        for (orig, got) in values.iter().zip(decoded.iter()) {
            assert_relative_eq!(orig.re, got.re, epsilon = 0.05);
            assert_relative_eq!(orig.im, got.im, epsilon = 0.05);
        }
    }

    #[test]
    fn add_is_homomorphic() {
        let engine = test_engine();
        let encoder = CkksEncoder::<DEGREE>::new();
        let mut rng = ChaCha20Rng::seed_from_u64(43);

        let sk = engine.generate_secret_key(&mut rng).unwrap();
        let pk = engine.generate_public_key(&sk, &mut rng).unwrap();

        let a = sample_values(8);
        let b: Vec<Complex64> = a.iter().map(|v| v * 2.0).collect();
        let ct_a = engine
            .encrypt(
                &encoder.encode(&a, SCALE, engine.chain().clone(), 2).unwrap(),
                &pk,
                &mut rng,
            )
            .unwrap();
        let ct_b = engine
            .encrypt(
                &encoder.encode(&b, SCALE, engine.chain().clone(), 2).unwrap(),
                &pk,
                &mut rng,
            )
            .unwrap();

        let sum = engine.add(&ct_a, &ct_b);
        let decoded = encoder.decode(&engine.decrypt(&sum, &sk).unwrap());
        for (i, got) in decoded.iter().enumerate() {
            let expected = a[i] * 3.0;
            assert_relative_eq!(expected.re, got.re, epsilon = 0.1);
            assert_relative_eq!(expected.im, got.im, epsilon = 0.1);
        }
    }

    #[test]
    fn mul_by_i_rotates_slots() {
        let engine = test_engine();
        let encoder = CkksEncoder::<DEGREE>::new();
        let mut rng = ChaCha20Rng::seed_from_u64(44);

        let sk = engine.generate_secret_key(&mut rng).unwrap();
        let pk = engine.generate_public_key(&sk, &mut rng).unwrap();

        let values = sample_values(8);
        let ct = engine
            .encrypt(
                &encoder
                    .encode(&values, SCALE, engine.chain().clone(), 2)
                    .unwrap(),
                &pk,
                &mut rng,
            )
            .unwrap();
        let rotated = engine.mul_by_i(&ct);
        let decoded = encoder.decode(&engine.decrypt(&rotated, &sk).unwrap());

        for (orig, got) in values.iter().zip(decoded.iter()) {
            let expected = orig * Complex64::new(0.0, 1.0);
            assert_relative_eq!(expected.re, got.re, epsilon = 0.05);
            assert_relative_eq!(expected.im, got.im, epsilon = 0.05);
        }
    }

    #[test]
    fn rescale_tracks_exact_prime() {
        let engine = test_engine();
        let encoder = CkksEncoder::<DEGREE>::new();
        let mut rng = ChaCha20Rng::seed_from_u64(45);

        let sk = engine.generate_secret_key(&mut rng).unwrap();
        let pk = engine.generate_public_key(&sk, &mut rng).unwrap();

        let q_top = engine.chain().primes()[2] as f64;
        // Scale up so one rescale lands back near the working scale.
        let pt = encoder
            .encode(
                &sample_values(8),
                SCALE * q_top,
                engine.chain().clone(),
                2,
            )
            .unwrap();
        let ct = engine.encrypt(&pt, &pk, &mut rng).unwrap();
        let rescaled = engine.rescale(&ct).unwrap();

        assert_eq!(rescaled.level(), 1);
        assert_relative_eq!(rescaled.scale, SCALE, epsilon = 1e-6);

        let decoded = encoder.decode(&engine.decrypt(&rescaled, &sk).unwrap());
        for (orig, got) in sample_values(8).iter().zip(decoded.iter()) {
            assert_relative_eq!(orig.re, got.re, epsilon = 0.05);
            assert_relative_eq!(orig.im, got.im, epsilon = 0.05);
        }
    }

    #[test]
    fn drop_then_raise_preserves_small_ciphertexts() {
        // Transparent small-norm ciphertext: raising from level 0 is exact
        // because the centered components fit below the base prime.
        let engine = test_engine();
        let chain = engine.chain().clone();

        let coeffs: Vec<i64> = (0..DEGREE as i64).map(|i| i - 32).collect();
        let poly = RnsPoly::from_coeffs(&coeffs, chain.clone(), 2).unwrap();
        let zero = RnsPoly::zero(chain.clone(), 2).unwrap();
        let ct = Ciphertext::new(poly, zero, SCALE, false, DEGREE / 2);

        let dropped = engine.mod_drop_to(&ct, 0).unwrap();
        let raised = engine.mod_raise(&dropped, 2).unwrap();

        assert_eq!(raised.level(), 2);
        assert_eq!(
            raised.c0.to_coeffs_centered().as_slice(),
            coeffs.as_slice()
        );
    }

    #[test]
    fn mod_raise_matches_centered_representative() {
        // -5 at level 0 must raise to -5 at level 2, not to q0 - 5.
        let engine = test_engine();
        let chain = engine.chain().clone();
        let mut coeffs = [0i64; DEGREE];
        coeffs[0] = -5;
        let poly = RnsPoly::from_coeffs(&coeffs, chain.clone(), 0).unwrap();
        let zero = RnsPoly::zero(chain.clone(), 0).unwrap();
        let ct = Ciphertext::new(poly, zero, SCALE, false, DEGREE / 2);

        let raised = engine.mod_raise(&ct, 2).unwrap();
        assert_eq!(raised.c0.to_coeffs_centered()[0], -5);
    }
}
