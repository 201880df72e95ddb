pub mod catalog;
pub mod error;
pub mod executor;
pub mod generation;
pub mod pool;
pub mod rng;
pub mod synth;

pub use generation::{GenerationConfig, GenerationLoop, GenerationResult, GenerationStats};
