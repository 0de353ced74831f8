//! Chain parameter literals, prime generation, and the cross-chain context.
//!
//! A `ChainLiteral` names prime bit sizes; `CrossChainContext::generate` turns
//! a pair of literals into concrete disjoint chains plus the shared auxiliary
//! primes. Chain one is searched downward from each `2^bits`, chain two and
//! the auxiliary set upward, so the generated sets never intersect and every
//! chain-two prefix modulus dominates the chain-one prefix with the same bit
//! budget.

use crate::rings::{ModuliChain, RingError};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;

use crate::math::primes::{next_ntt_prime_above, next_ntt_prime_below};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("source basis must contain at least one prime")]
    EmptySourceBasis,
    #[error("target basis must contain at least one prime")]
    EmptyTargetBasis,
    #[error("source and target bases overlap at prime {prime}")]
    OverlappingBases { prime: u64 },
    #[error("moduli chains overlap at prime {prime}")]
    OverlappingChains { prime: u64 },
    #[error("both chains must share the same auxiliary prime configuration")]
    AuxiliaryPrimeMismatch,
    #[error(
        "switching from level {source_level} (chain max {source_max_level}) \
         would need negative target level on a chain with max {target_max_level}"
    )]
    NegativeTargetLevel {
        source_level: usize,
        source_max_level: usize,
        target_max_level: usize,
    },
    #[error("no remaining NTT-friendly prime near 2^{bits}")]
    PrimeSearchExhausted { bits: u32 },
    #[error(transparent)]
    Ring(#[from] RingError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ─── Chain literals ───────────────────────────────────────────────────────────

/// Named description of one chain: prime bit sizes plus the default scale.
///
/// `log_q[0]` is the base prime; the remaining entries are consumed top-down
/// by rescaling. `log_p` describes the auxiliary key-switching primes, which
/// both chains of a cross-chain setup must agree on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLiteral {
    pub log_q: Vec<u32>,
    pub log_p: Vec<u32>,
    pub log_default_scale: u32,
}

impl ChainLiteral {
    pub fn new(log_q: Vec<u32>, log_p: Vec<u32>, log_default_scale: u32) -> Self {
        Self {
            log_q,
            log_p,
            log_default_scale,
        }
    }

    /// Computation-side chain of the graft pair: 40-bit rescale primes, with
    /// the upper region sized for bootstrapping consumption.
    pub fn compute_chain() -> Self {
        let mut log_q = vec![55, 39, 39, 39];
        log_q.extend([40; 9]);
        log_q.extend([60; 8]);
        log_q.extend([56; 4]);
        Self::new(log_q, vec![61, 61, 61], 40)
    }

    /// Bootstrapping-side chain of the graft pair: the nine 40-bit rescale
    /// primes are regrouped into six 60-bit primes covering the same 360 bits,
    /// so the two chains line up at matching bit budgets.
    pub fn bootstrap_chain() -> Self {
        let mut log_q = vec![55, 39, 39, 39];
        log_q.extend([60; 6]);
        log_q.extend([60; 8]);
        log_q.extend([56; 4]);
        Self::new(log_q, vec![61, 61, 61], 40)
    }

    /// Truncates the chain to `keep_levels + 1` primes for fast insecure test
    /// runs. Auxiliary primes and scale are kept as-is.
    pub fn shortened(&self, keep_levels: usize) -> Self {
        let keep = (keep_levels + 1).min(self.log_q.len());
        Self {
            log_q: self.log_q[..keep].to_vec(),
            log_p: self.log_p.clone(),
            log_default_scale: self.log_default_scale,
        }
    }

    pub fn total_log_q(&self) -> u32 {
        self.log_q.iter().sum()
    }

    pub fn max_level(&self) -> usize {
        self.log_q.len() - 1
    }
}

// ─── Prime generation ─────────────────────────────────────────────────────────

/// Which side of `2^bits` a chain's primes are searched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimeSearch {
    Below,
    Above,
}

/// Generates one NTT-friendly prime per requested bit size, never reusing a
/// prime already in `taken`. Repeated bit sizes continue the search from the
/// previous hit, so all returned primes are distinct.
pub fn generate_chain_primes<const DEGREE: usize>(
    bit_sizes: &[u32],
    search: PrimeSearch,
    taken: &mut Vec<u64>,
) -> ConfigResult<Vec<u64>> {
    let mut cursors: HashMap<u32, u64> = HashMap::new();
    let mut primes = Vec::with_capacity(bit_sizes.len());

    for &bits in bit_sizes {
        assert!(bits < 62, "generate_chain_primes: bit size {bits} too large");
        let cursor = cursors.entry(bits).or_insert(1u64 << bits);
        loop {
            let candidate = match search {
                PrimeSearch::Below => next_ntt_prime_below(*cursor, DEGREE as u64)
                    .ok_or(ConfigError::PrimeSearchExhausted { bits })?,
                PrimeSearch::Above => next_ntt_prime_above(*cursor, DEGREE as u64),
            };
            *cursor = candidate;
            if !taken.contains(&candidate) {
                taken.push(candidate);
                primes.push(candidate);
                break;
            }
        }
    }
    Ok(primes)
}

// ─── Cross-chain context ──────────────────────────────────────────────────────

/// Two disjoint moduli chains over the same ring degree, plus the auxiliary
/// primes both share for key-switching material.
#[derive(Debug, Clone)]
pub struct CrossChainContext<const DEGREE: usize> {
    chain1: Arc<ModuliChain<DEGREE>>,
    chain2: Arc<ModuliChain<DEGREE>>,
    aux: Arc<ModuliChain<DEGREE>>,
    log_default_scale1: u32,
    log_default_scale2: u32,
}

impl<const DEGREE: usize> CrossChainContext<DEGREE> {
    /// Generates concrete chains from a pair of literals.
    ///
    /// Both literals must name the same auxiliary prime configuration.
    pub fn generate(
        lit1: &ChainLiteral,
        lit2: &ChainLiteral,
    ) -> ConfigResult<Self> {
        if lit1.log_p != lit2.log_p {
            return Err(ConfigError::AuxiliaryPrimeMismatch);
        }
        let mut taken = Vec::new();
        let q1 = generate_chain_primes::<DEGREE>(
            &lit1.log_q,
            PrimeSearch::Below,
            &mut taken,
        )?;
        let q2 = generate_chain_primes::<DEGREE>(
            &lit2.log_q,
            PrimeSearch::Above,
            &mut taken,
        )?;
        let p = generate_chain_primes::<DEGREE>(
            &lit1.log_p,
            PrimeSearch::Above,
            &mut taken,
        )?;

        Self::from_parts(
            Arc::new(ModuliChain::new(q1)?),
            Arc::new(ModuliChain::new(q2)?),
            Arc::new(ModuliChain::new(p)?),
            lit1.log_default_scale,
            lit2.log_default_scale,
        )
    }

    /// Builds a context from pre-built chains, validating disjointness.
    pub fn from_parts(
        chain1: Arc<ModuliChain<DEGREE>>,
        chain2: Arc<ModuliChain<DEGREE>>,
        aux: Arc<ModuliChain<DEGREE>>,
        log_default_scale1: u32,
        log_default_scale2: u32,
    ) -> ConfigResult<Self> {
        for &p in chain2.primes() {
            if chain1.contains(p) {
                return Err(ConfigError::OverlappingChains { prime: p });
            }
        }
        for &p in aux.primes() {
            if chain1.contains(p) || chain2.contains(p) {
                return Err(ConfigError::OverlappingChains { prime: p });
            }
        }
        Ok(Self {
            chain1,
            chain2,
            aux,
            log_default_scale1,
            log_default_scale2,
        })
    }

    pub fn chain1(&self) -> &Arc<ModuliChain<DEGREE>> {
        &self.chain1
    }

    pub fn chain2(&self) -> &Arc<ModuliChain<DEGREE>> {
        &self.chain2
    }

    pub fn aux(&self) -> &Arc<ModuliChain<DEGREE>> {
        &self.aux
    }

    pub fn default_scale1(&self) -> f64 {
        2f64.powi(self.log_default_scale1 as i32)
    }

    pub fn default_scale2(&self) -> f64 {
        2f64.powi(self.log_default_scale2 as i32)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
