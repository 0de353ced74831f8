//! Modulus switching between the two chains of a [`CrossChainContext`].
//!
//! A switch re-expresses each ciphertext component over the other chain's
//! primes through a centered basis extension, landing at the level whose
//! prime-count distance from the top matches the source. The extension is
//! exact for components whose centered coefficients stay inside the source
//! sub-modulus, which the graft pipeline guarantees by construction.

use crate::ciphertext::Ciphertext;
use crate::extender::BasisExtender;
use crate::keys::SecretKey;
use crate::params::{ConfigError, ConfigResult, CrossChainContext};
use crate::rings::poly::inverse_ntt;
use crate::rings::{ModuliChain, RingError, RnsPoly};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwitchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Ring(#[from] RingError),
    #[error("key level matches neither chain's top level")]
    KeySourceUnknown,
    #[error("key level matches both chains' top levels")]
    KeySourceAmbiguous,
}

pub type SwitchResult<T> = Result<T, SwitchError>;

/// Which chain a ciphertext is leaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ChainOneToTwo,
    ChainTwoToOne,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::ChainOneToTwo => Direction::ChainTwoToOne,
            Direction::ChainTwoToOne => Direction::ChainOneToTwo,
        }
    }
}

/// The level a switched ciphertext lands at: the distance from the top of the
/// chain is preserved, so matching prime budgets line up across chains.
pub fn target_level(
    source_level: usize,
    source_max_level: usize,
    target_max_level: usize,
) -> ConfigResult<usize> {
    debug_assert!(source_level <= source_max_level);
    (source_level + target_max_level)
        .checked_sub(source_max_level)
        .ok_or(ConfigError::NegativeTargetLevel {
            source_level,
            source_max_level,
            target_max_level,
        })
}

/// Coefficient-domain staging rows for one switch direction, sized once for
/// the direction's source chain so repeated switches never reallocate.
#[derive(Debug, Clone)]
struct SwitchBuffers<const DEGREE: usize> {
    rows: Vec<[u64; DEGREE]>,
}

impl<const DEGREE: usize> SwitchBuffers<DEGREE> {
    fn for_source(chain: &ModuliChain<DEGREE>) -> Self {
        Self {
            rows: vec![[0u64; DEGREE]; chain.prime_count()],
        }
    }
}

/// Switches ciphertexts and secret keys between the two chains of a context.
///
/// Each direction owns its staging buffers, so interleaved switches in both
/// directions never alias each other's scratch space.
pub struct ModulusSwitcher<const DEGREE: usize> {
    context: CrossChainContext<DEGREE>,
    forward: SwitchBuffers<DEGREE>,
    backward: SwitchBuffers<DEGREE>,
}

impl<const DEGREE: usize> ModulusSwitcher<DEGREE> {
    pub fn new(context: CrossChainContext<DEGREE>) -> Self {
        let forward = SwitchBuffers::for_source(context.chain1());
        let backward = SwitchBuffers::for_source(context.chain2());
        Self {
            context,
            forward,
            backward,
        }
    }

    pub fn context(&self) -> &CrossChainContext<DEGREE> {
        &self.context
    }

    fn endpoints(
        &self,
        direction: Direction,
    ) -> (&Arc<ModuliChain<DEGREE>>, &Arc<ModuliChain<DEGREE>>, f64) {
        match direction {
            Direction::ChainOneToTwo => (
                self.context.chain1(),
                self.context.chain2(),
                self.context.default_scale2(),
            ),
            Direction::ChainTwoToOne => (
                self.context.chain2(),
                self.context.chain1(),
                self.context.default_scale1(),
            ),
        }
    }

    /// Switches a ciphertext to the other chain.
    ///
    /// Both components are staged in coefficient domain, extended onto the
    /// destination prefix, and returned in the source's NTT-domain state. The
    /// result carries the destination chain's default scale.
    pub fn switch(
        &mut self,
        ciphertext: &Ciphertext<DEGREE>,
        direction: Direction,
    ) -> SwitchResult<Ciphertext<DEGREE>> {
        let (source, dest, dest_scale) = self.endpoints(direction);
        let source = source.clone();
        let dest = dest.clone();

        let level = ciphertext.level();
        let dest_level = target_level(level, source.max_level(), dest.max_level())?;
        let extender = BasisExtender::new(
            source.primes_at_level(level),
            dest.primes_at_level(dest_level),
        )?;

        let buffers = match direction {
            Direction::ChainOneToTwo => &mut self.forward,
            Direction::ChainTwoToOne => &mut self.backward,
        };

        let restore_ntt = ciphertext.is_ntt_domain();
        let c0 = switch_poly(
            &ciphertext.c0,
            &source,
            &dest,
            dest_level,
            &extender,
            &mut buffers.rows,
            restore_ntt,
        );
        let c1 = switch_poly(
            &ciphertext.c1,
            &source,
            &dest,
            dest_level,
            &extender,
            &mut buffers.rows,
            restore_ntt,
        );

        Ok(Ciphertext::new(
            c0,
            c1,
            dest_scale,
            ciphertext.is_batched,
            ciphertext.slots,
        ))
    }

    /// Re-encodes a secret key over the other chain.
    ///
    /// The source chain is identified by the key's level: it must match
    /// exactly one chain's top level. The auxiliary component is rebuilt over
    /// the shared auxiliary primes, so the switched key remains usable as
    /// key-switching material.
    pub fn switch_secret_key(
        &self,
        key: &SecretKey<DEGREE>,
    ) -> SwitchResult<SecretKey<DEGREE>> {
        let level = key.poly_q.level();
        let matches1 = level == self.context.chain1().max_level();
        let matches2 = level == self.context.chain2().max_level();
        let dest = match (matches1, matches2) {
            (true, true) => return Err(SwitchError::KeySourceAmbiguous),
            (false, false) => return Err(SwitchError::KeySourceUnknown),
            (true, false) => self.context.chain2(),
            (false, true) => self.context.chain1(),
        };

        let coeffs = key.ternary_coeffs();
        let switched = SecretKey::from_ternary_coeffs(
            &coeffs,
            dest.clone(),
            self.context.aux().clone(),
            key.hamming_weight,
        )?;
        Ok(switched)
    }
}

/// Stages one component in `scratch`, extends it, and rebuilds it over the
/// destination prefix. `scratch` only needs its first `level + 1` rows.
fn switch_poly<const DEGREE: usize>(
    poly: &RnsPoly<DEGREE>,
    source: &Arc<ModuliChain<DEGREE>>,
    dest: &Arc<ModuliChain<DEGREE>>,
    dest_level: usize,
    extender: &BasisExtender,
    scratch: &mut [[u64; DEGREE]],
    restore_ntt: bool,
) -> RnsPoly<DEGREE> {
    let channels = poly.level() + 1;
    let staging = &mut scratch[..channels];
    for (row, src) in staging.iter_mut().zip(poly.channels()) {
        row.copy_from_slice(src);
    }
    if poly.is_ntt_domain() {
        for (ch, row) in staging.iter_mut().enumerate() {
            inverse_ntt(row, source.ntt_table(ch));
        }
    }

    let mut out_rows = vec![[0u64; DEGREE]; dest_level + 1];
    extender.extend_channels(staging, &mut out_rows);

    let mut switched =
        RnsPoly::from_channels_unchecked(out_rows, dest.clone(), dest_level, false);
    if restore_ntt {
        switched.to_ntt_domain();
    }
    switched
}

// ─── Tests ────────────────────────────────────────────────────────────────────
