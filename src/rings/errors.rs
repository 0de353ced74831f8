use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RingError {
    #[error("ring degree must be a power of two, got {degree}")]
    InvalidDegree { degree: usize },
    #[error("modulus chain must contain at least one prime")]
    EmptyChain,
    #[error("modulus {modulus} is not NTT-friendly for degree {degree}")]
    NonNttFriendlyModulus { modulus: u64, degree: usize },
    #[error("chain primes must be distinct, {prime} appears twice")]
    DuplicatePrime { prime: u64 },
    #[error("level {level} out of range, chain supports at most level {max_level}")]
    LevelOutOfRange { level: usize, max_level: usize },
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelCountMismatch { expected: usize, actual: usize },
    #[error("coefficient {coefficient} is not reduced modulo {modulus}")]
    NonReducedCoefficient { coefficient: u64, modulus: u64 },
    #[error("cannot rescale below level 0")]
    RescaleAtBottom,
}

pub type RingResult<T> = Result<T, RingError>;
