pub mod convert;
pub mod rng;
