use crate::rings::RnsPoly;

/// Two-component CKKS ciphertext `(c0, c1)` decrypting to `c0 + c1 * s`.
///
/// The scale is tracked as a float rather than a bit count so rescaling by
/// non-power-of-two primes stays exact in the bookkeeping. `is_batched`
/// records whether the underlying plaintext is slot-packed (canonical
/// embedding) or coefficient-packed, which bootstrapping toggles mid-flight.
///
/// # Invariants
/// - `c0` and `c1` share chain, level, and NTT-domain flag.
#[derive(Debug, Clone)]
pub struct Ciphertext<const DEGREE: usize> {
    pub c0: RnsPoly<DEGREE>,
    pub c1: RnsPoly<DEGREE>,
    pub scale: f64,
    pub is_batched: bool,
    pub slots: usize,
}

impl<const DEGREE: usize> Ciphertext<DEGREE> {
    pub fn new(
        c0: RnsPoly<DEGREE>,
        c1: RnsPoly<DEGREE>,
        scale: f64,
        is_batched: bool,
        slots: usize,
    ) -> Self {
        debug_assert!(
            std::sync::Arc::ptr_eq(c0.chain(), c1.chain()),
            "Ciphertext: components must share a chain"
        );
        debug_assert_eq!(c0.level(), c1.level(), "Ciphertext: level mismatch");
        debug_assert_eq!(
            c0.is_ntt_domain(),
            c1.is_ntt_domain(),
            "Ciphertext: domain mismatch"
        );
        Self {
            c0,
            c1,
            scale,
            is_batched,
            slots,
        }
    }

    pub fn level(&self) -> usize {
        self.c0.level()
    }

    pub fn is_ntt_domain(&self) -> bool {
        self.c0.is_ntt_domain()
    }
}
