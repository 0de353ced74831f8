//! CKKS modulus grafting: moving ciphertexts between two independently sized
//! RNS moduli chains.
//!
//! The chains share the ring degree and the auxiliary key-switching primes
//! but never a chain prime, so residues can be carried across by centered CRT
//! basis extension without reconstructing big integers. On top of the switch
//! sits a bootstrap orchestrator that runs the homomorphic decode under one
//! chain and the modular-reduction circuit under the other.

pub mod bootstrap;
pub mod ciphertext;
pub mod encoding;
pub mod engine;
pub mod extender;
pub mod keys;
pub mod math;
pub mod params;
pub mod rings;
pub mod switcher;

pub use bootstrap::{
    BootstrapCircuit, BootstrapConfig, BootstrapError, BootstrapResult,
    CrossChainBootstrapper,
};
pub use ciphertext::Ciphertext;
pub use encoding::{CkksEncoder, Plaintext};
pub use engine::{CkksEngine, CkksParams};
pub use extender::BasisExtender;
pub use keys::{PublicKey, SecretKey};
pub use params::{
    ChainLiteral, ConfigError, ConfigResult, CrossChainContext, PrimeSearch,
};
pub use rings::{ModuliChain, RingError, RingResult, RnsPoly};
pub use switcher::{
    Direction, ModulusSwitcher, SwitchError, SwitchResult, target_level,
};
