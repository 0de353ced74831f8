//! Cross-chain bootstrap orchestration.
//!
//! The bootstrapping circuit itself (homomorphic decode/encode and the
//! modular-reduction evaluation) is supplied by the caller through the
//! [`BootstrapCircuit`] trait; this module only sequences the stages and
//! places the two chain boundaries. Decode runs under chain one; scale-down,
//! modulus raise, encode, and modular reduction run under chain two, sized for
//! that circuit's depth; the result returns to chain one for further
//! computation.

use crate::ciphertext::Ciphertext;
use crate::rings::RingError;
use crate::switcher::{Direction, ModulusSwitcher, SwitchError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Switch(#[from] SwitchError),
    #[error(transparent)]
    Ring(#[from] RingError),
    #[error("bootstrap stage {stage} failed: {message}")]
    Stage {
        stage: &'static str,
        message: String,
    },
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// The externally supplied stages of one bootstrap pass, in pipeline order.
///
/// Every stage consumes and produces chain-two ciphertexts except
/// `slots_to_coeffs`, which runs under chain one before the first switch.
pub trait BootstrapCircuit<const DEGREE: usize> {
    /// Homomorphic decode: moves slot values into polynomial coefficients.
    fn slots_to_coeffs(
        &self,
        ct: &Ciphertext<DEGREE>,
    ) -> BootstrapResult<Ciphertext<DEGREE>>;

    /// Drops the spent lower primes to restore the message-to-modulus ratio.
    fn scale_down(
        &self,
        ct: &Ciphertext<DEGREE>,
    ) -> BootstrapResult<Ciphertext<DEGREE>>;

    /// Raises the ciphertext back to chain two's full prime count.
    fn raise_modulus(
        &self,
        ct: &Ciphertext<DEGREE>,
    ) -> BootstrapResult<Ciphertext<DEGREE>>;

    /// Homomorphic encode, split into the real and imaginary coefficient
    /// halves for independent modular reduction.
    fn coeffs_to_slots(
        &self,
        ct: &Ciphertext<DEGREE>,
    ) -> BootstrapResult<(Ciphertext<DEGREE>, Ciphertext<DEGREE>)>;

    /// Evaluates the modular-reduction approximation on one half.
    fn reduce_modulo(
        &self,
        ct: &Ciphertext<DEGREE>,
    ) -> BootstrapResult<Ciphertext<DEGREE>>;

    /// Recombines the reduced halves: `re + i * im`.
    fn combine_real_imag(
        &self,
        re: &Ciphertext<DEGREE>,
        im: &Ciphertext<DEGREE>,
    ) -> BootstrapResult<Ciphertext<DEGREE>>;
}

// ─── Configuration ────────────────────────────────────────────────────────────

/// Message-to-modulus ratio configuration for the modular-reduction stage.
///
/// The base ratio is calibrated for the full production ring; shrinking the
/// ring for insecure test runs shrinks the coefficient magnitudes the circuit
/// sees, and the ratio must widen by the lost degree bits to keep the
/// reduction approximation inside its accurate range. The correction lives
/// here, in one place, rather than in per-degree literal tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapConfig {
    pub log_message_ratio: u32,
}

impl BootstrapConfig {
    /// Ring degree the base ratio is calibrated against.
    pub const REFERENCE_LOG_DEGREE: u32 = 16;

    pub fn new(log_message_ratio: u32) -> Self {
        Self { log_message_ratio }
    }

    /// The ratio to use at ring degree `DEGREE`.
    pub fn adjusted_log_message_ratio<const DEGREE: usize>(&self) -> u32 {
        debug_assert!(DEGREE.is_power_of_two());
        self.log_message_ratio + Self::REFERENCE_LOG_DEGREE
            - DEGREE.trailing_zeros()
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self::new(10)
    }
}

// ─── Orchestrator ─────────────────────────────────────────────────────────────

/// Runs the grafted bootstrap pipeline: decode in chain one, the remaining
/// stages in chain two, with one modulus switch at each boundary.
///
/// A bootstrap is atomic from the caller's perspective: the first failing
/// stage aborts the whole pass and no partially processed ciphertext escapes.
pub struct CrossChainBootstrapper<const DEGREE: usize, C> {
    switcher: ModulusSwitcher<DEGREE>,
    circuit: C,
    config: BootstrapConfig,
}

impl<const DEGREE: usize, C: BootstrapCircuit<DEGREE>>
    CrossChainBootstrapper<DEGREE, C>
{
    pub fn new(
        switcher: ModulusSwitcher<DEGREE>,
        circuit: C,
        config: BootstrapConfig,
    ) -> Self {
        Self {
            switcher,
            circuit,
            config,
        }
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    pub fn switcher(&self) -> &ModulusSwitcher<DEGREE> {
        &self.switcher
    }

    pub fn circuit(&self) -> &C {
        &self.circuit
    }

    /// Refreshes one ciphertext living in chain one.
    pub fn bootstrap(
        &mut self,
        ciphertext: &Ciphertext<DEGREE>,
    ) -> BootstrapResult<Ciphertext<DEGREE>> {
        let decoded = self.circuit.slots_to_coeffs(ciphertext)?;
        let crossed = self.switcher.switch(&decoded, Direction::ChainOneToTwo)?;

        let scaled = self.circuit.scale_down(&crossed)?;
        let raised = self.circuit.raise_modulus(&scaled)?;
        let (re, im) = self.circuit.coeffs_to_slots(&raised)?;
        let re = self.circuit.reduce_modulo(&re)?;
        let im = self.circuit.reduce_modulo(&im)?;
        let combined = self.circuit.combine_real_imag(&re, &im)?;

        let refreshed =
            self.switcher.switch(&combined, Direction::ChainTwoToOne)?;
        Ok(refreshed)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
