//! CKKS encoder/decoder over the canonical embedding.
//!
//! The embedding is evaluated through a twisted half-size FFT instead of a
//! direct Vandermonde product: with `m = N/2`, `ψ = e^{iπ/N}` and
//! `u_k = (c_k + i·c_{k+m})·ψ^k`, the unnormalized inverse FFT of `u` equals
//! the evaluations of the coefficient polynomial at the roots `ψ^{4j+1}`.
//! Every used root satisfies `root^{N/2} = i`, so multiplying the polynomial
//! by `X^{N/2}` multiplies every slot by `i`.

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

use crate::rings::{ModuliChain, RingResult, RnsPoly};

/// A plaintext polynomial with its scale and slot bookkeeping.
#[derive(Debug, Clone)]
pub struct Plaintext<const DEGREE: usize> {
    /// Scaled, rounded polynomial in coefficient domain.
    pub poly: RnsPoly<DEGREE>,
    pub scale: f64,
    /// Number of slots encoded (determines how many values `decode` returns).
    pub slots: usize,
}

/// Encoder/decoder between complex slot vectors and `RnsPoly` plaintexts.
pub struct CkksEncoder<const DEGREE: usize> {
    fft_forward: Arc<dyn Fft<f64>>,
    fft_inverse: Arc<dyn Fft<f64>>,
    twist: Vec<Complex64>,
    twist_inv: Vec<Complex64>,
}

impl<const DEGREE: usize> CkksEncoder<DEGREE> {
    pub fn new() -> Self {
        assert!(
            DEGREE.is_power_of_two() && DEGREE >= 4,
            "CkksEncoder: DEGREE must be a power of two, at least 4"
        );
        let half = DEGREE / 2;
        let mut planner = FftPlanner::new();
        let fft_forward = planner.plan_fft_forward(half);
        let fft_inverse = planner.plan_fft_inverse(half);

        let mut twist = Vec::with_capacity(half);
        let mut twist_inv = Vec::with_capacity(half);
        for k in 0..half {
            let angle = PI * k as f64 / DEGREE as f64;
            let root = Complex64::from_polar(1.0, angle);
            twist.push(root);
            twist_inv.push(root.conj());
        }

        Self {
            fft_forward,
            fft_inverse,
            twist,
            twist_inv,
        }
    }

    pub fn max_slots(&self) -> usize {
        DEGREE / 2
    }

    // ── Encoding ─────────────────────────────────────────────────────────────

    /// Encodes complex values into a plaintext at `level` with scale `scale`.
    ///
    /// Each value occupies one slot; at most `DEGREE/2` values fit.
    ///
    /// # Panics
    ///
    /// Panics if too many values are supplied or a scaled coefficient leaves
    /// the `i64` range.
    pub fn encode(
        &self,
        values: &[Complex64],
        scale: f64,
        chain: Arc<ModuliChain<DEGREE>>,
        level: usize,
    ) -> RingResult<Plaintext<DEGREE>> {
        let half = DEGREE / 2;
        assert!(
            values.len() <= half,
            "encode: {} values exceed max slots {half}",
            values.len()
        );

        let mut buffer = vec![Complex64::new(0.0, 0.0); half];
        for (slot, &v) in buffer.iter_mut().zip(values.iter()) {
            *slot = v * scale;
        }
        self.fft_forward.process(&mut buffer);

        // Forward FFT is unnormalized; fold 1/m into the untwist pass.
        let norm = 1.0 / half as f64;
        let mut coeffs = [0i64; DEGREE];
        for (k, u) in buffer.iter().enumerate() {
            let w = u * self.twist_inv[k] * norm;
            assert!(
                w.re.abs() < i64::MAX as f64 && w.im.abs() < i64::MAX as f64,
                "encode: coefficient overflow, reduce scale or input magnitude"
            );
            coeffs[k] = w.re.round() as i64;
            coeffs[k + half] = w.im.round() as i64;
        }

        Ok(Plaintext {
            poly: RnsPoly::from_coeffs(&coeffs, chain, level)?,
            scale,
            slots: values.len(),
        })
    }

    /// Encodes real values (imaginary parts zero).
    pub fn encode_real(
        &self,
        values: &[f64],
        scale: f64,
        chain: Arc<ModuliChain<DEGREE>>,
        level: usize,
    ) -> RingResult<Plaintext<DEGREE>> {
        let complex: Vec<Complex64> =
            values.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        self.encode(&complex, scale, chain, level)
    }

    // ── Decoding ─────────────────────────────────────────────────────────────

    /// Decodes a plaintext back to complex slot values.
    pub fn decode(&self, pt: &Plaintext<DEGREE>) -> Vec<Complex64> {
        let half = DEGREE / 2;
        let coeffs = pt.poly.to_coeffs_centered();

        let mut buffer = Vec::with_capacity(half);
        for k in 0..half {
            let u = Complex64::new(coeffs[k] as f64, coeffs[k + half] as f64);
            buffer.push(u * self.twist[k]);
        }
        // Unnormalized inverse FFT evaluates at the odd embedding roots.
        self.fft_inverse.process(&mut buffer);

        buffer
            .into_iter()
            .take(pt.slots)
            .map(|s| s / pt.scale)
            .collect()
    }

    /// Decodes, discarding imaginary parts.
    pub fn decode_real(&self, pt: &Plaintext<DEGREE>) -> Vec<f64> {
        self.decode(pt).into_iter().map(|s| s.re).collect()
    }
}

impl<const DEGREE: usize> Default for CkksEncoder<DEGREE> {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
