pub mod primes;
pub mod sampling;

pub use primes::{
    is_ntt_friendly_prime, is_prime, next_ntt_prime_above, next_ntt_prime_below,
};
pub use sampling::{
    gaussian_coefficients, ternary_coefficients, uniform_coefficients,
};
