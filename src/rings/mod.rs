pub mod chain;
pub mod errors;
pub mod poly;

pub use chain::{ModuliChain, NttTable};
pub use errors::{RingError, RingResult};
pub use poly::RnsPoly;
