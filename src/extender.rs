//! Approximate CRT basis extension between disjoint prime sets.
//!
//! Given residues of a value `x` modulo the source primes `q_0 … q_{L-1}`,
//! produces residues of the centered representative of `x` modulo each target
//! prime, without ever materializing `x` as a big integer:
//!
//!   y_i  = x_i * (Q/q_i)^{-1} mod q_i
//!   v    = round(Σ y_i / q_i)            (float wrap-count estimate)
//!   out_j = Σ y_i * (Q/q_i) - v * Q      (mod p_j)
//!
//! With rounding, `v` absorbs the CRT wrap exactly for `x` away from the
//! `±Q/2` boundary, so the output encodes the signed value in
//! `(-Q/2, Q/2]` rather than the positive representative.

use crate::params::{ConfigError, ConfigResult};
use crate::rings::chain::{add_mod, mod_inverse, mul_mod, sub_mod};

/// Precomputed extension from a fixed source prime set onto a fixed,
/// disjoint target prime set.
#[derive(Debug, Clone)]
pub struct BasisExtender {
    source: Vec<u64>,
    target: Vec<u64>,
    /// `(Q/q_i)^{-1} mod q_i`
    source_hat_inv: Vec<u64>,
    /// `[j][i] = (Q/q_i) mod p_j`
    source_hat_mod_target: Vec<Vec<u64>>,
    /// `Q mod p_j`
    source_modulus_mod_target: Vec<u64>,
    /// `1 / q_i` for the float wrap estimate
    source_inv: Vec<f64>,
}

impl BasisExtender {
    /// Builds the extension tables.
    ///
    /// Rejects an empty source or target set and any prime shared between the
    /// two sets; a shared prime would make the CRT residues ambiguous.
    pub fn new(source: &[u64], target: &[u64]) -> ConfigResult<Self> {
        if source.is_empty() {
            return Err(ConfigError::EmptySourceBasis);
        }
        if target.is_empty() {
            return Err(ConfigError::EmptyTargetBasis);
        }
        for &p in target {
            if source.contains(&p) {
                return Err(ConfigError::OverlappingBases { prime: p });
            }
        }
        debug_assert!(
            (0..source.len()).all(|i| !source[..i].contains(&source[i])),
            "BasisExtender: source primes must be distinct"
        );

        let mut source_hat_inv = Vec::with_capacity(source.len());
        for (i, &q) in source.iter().enumerate() {
            let mut hat = 1u64;
            for (k, &other) in source.iter().enumerate() {
                if k != i {
                    hat = mul_mod(hat, other % q, q);
                }
            }
            source_hat_inv.push(mod_inverse(hat, q));
        }

        let mut source_hat_mod_target = Vec::with_capacity(target.len());
        let mut source_modulus_mod_target = Vec::with_capacity(target.len());
        for &p in target {
            let mut row = Vec::with_capacity(source.len());
            for i in 0..source.len() {
                let mut hat = 1u64;
                for (k, &other) in source.iter().enumerate() {
                    if k != i {
                        hat = mul_mod(hat, other % p, p);
                    }
                }
                row.push(hat);
            }
            let mut q_mod = 1u64;
            for &q in source {
                q_mod = mul_mod(q_mod, q % p, p);
            }
            source_hat_mod_target.push(row);
            source_modulus_mod_target.push(q_mod);
        }

        let source_inv = source.iter().map(|&q| 1.0 / q as f64).collect();

        Ok(Self {
            source: source.to_vec(),
            target: target.to_vec(),
            source_hat_inv,
            source_hat_mod_target,
            source_modulus_mod_target,
            source_inv,
        })
    }

    pub fn source_primes(&self) -> &[u64] {
        &self.source
    }

    pub fn target_primes(&self) -> &[u64] {
        &self.target
    }

    /// Upper bound on the extension error in integer units of the source
    /// modulus `Q`.
    ///
    /// The wrap count is estimated in `f64` from one term per source channel,
    /// so the accumulated float error grows with the channel count; the bound
    /// is conservative.
    pub fn error_bound_units(&self) -> u64 {
        self.source.len() as u64 / 2 + 1
    }

    /// Extends one coefficient: `residues[i] = x mod q_i` in, centered
    /// residues `out[j] = centered(x) mod p_j` out.
    pub fn extend_coefficient(&self, residues: &[u64], out: &mut [u64]) {
        debug_assert_eq!(residues.len(), self.source.len());
        debug_assert_eq!(out.len(), self.target.len());

        // Stack-free scratch would need allocation per call; callers on the
        // hot path use `extend_channels`, which amortizes it.
        let mut weights = vec![0u64; self.source.len()];
        self.extend_one(residues, &mut weights, out);
    }

    /// Extends full coefficient rows: `source[i]` holds the residue array for
    /// source prime `q_i`, `target[j]` receives the array for target prime
    /// `p_j`. Every target row is fully overwritten.
    pub fn extend_channels<const DEGREE: usize>(
        &self,
        source: &[[u64; DEGREE]],
        target: &mut [[u64; DEGREE]],
    ) {
        debug_assert_eq!(source.len(), self.source.len());
        debug_assert_eq!(target.len(), self.target.len());

        let mut residues = vec![0u64; self.source.len()];
        let mut weights = vec![0u64; self.source.len()];
        let mut out = vec![0u64; self.target.len()];
        for idx in 0..DEGREE {
            for (i, row) in source.iter().enumerate() {
                residues[i] = row[idx];
            }
            self.extend_one(&residues, &mut weights, &mut out);
            for (j, row) in target.iter_mut().enumerate() {
                row[idx] = out[j];
            }
        }
    }

    fn extend_one(&self, residues: &[u64], weights: &mut [u64], out: &mut [u64]) {
        let mut wrap_estimate = 0.0f64;
        for (i, (&x, &q)) in residues.iter().zip(self.source.iter()).enumerate() {
            let y = mul_mod(x, self.source_hat_inv[i], q);
            weights[i] = y;
            wrap_estimate += y as f64 * self.source_inv[i];
        }
        // Σ y_i/q_i = k + x/Q for the positive representative; rounding picks
        // k for x < Q/2 and k+1 above, which centers the output.
        let v = wrap_estimate.round() as u64;

        for (j, &p) in self.target.iter().enumerate() {
            let row = &self.source_hat_mod_target[j];
            let mut acc = 0u64;
            for (i, &y) in weights.iter().enumerate() {
                acc = add_mod(acc, mul_mod(y, row[i], p), p);
            }
            let correction = mul_mod(v % p, self.source_modulus_mod_target[j], p);
            out[j] = sub_mod(acc, correction, p);
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
