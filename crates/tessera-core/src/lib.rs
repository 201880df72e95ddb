pub mod config;
pub mod run;

pub use config::{ConfigError, RunConfig};
pub use run::{run_generation, run_wasm, RunError, RunReport};
