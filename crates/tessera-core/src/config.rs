//! Run configuration.
//!
//! Every field has a default, so `{}` is a valid configuration. Values are
//! checked by `validate` before a run starts; the generation loop itself
//! never sees an invalid setting.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tessera_explore::generation::{GenerationConfig, SamplingLimits};
use tessera_explore::synth::{SynthesisConfig, MAX_STRING_LEN};
use tessera_sandbox::config::SandboxConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("time limit must be a non-negative number of seconds a Duration can hold (got {0})")]
    TimeLimit(f64),

    #[error("reuse probability must be within [0, 1] (got {0})")]
    ReuseProbability(f64),

    #[error("{name} range is inverted: {min} > {max}")]
    InvertedRange { name: &'static str, min: String, max: String },

    #[error("float range [{min}, {max}] is too wide to sample")]
    FloatRangeTooWide { min: f64, max: f64 },

    #[error("string_max_len {0} exceeds {max}", max = MAX_STRING_LEN)]
    StringLength(usize),
}

/// Size caps on run inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputLimits {
    pub max_wasm_module_bytes: u64,
    pub max_manifest_json_bytes: u64,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_wasm_module_bytes: 64 * 1024 * 1024, // 64 MB
            max_manifest_json_bytes: 16 * 1024 * 1024, // 16 MB
        }
    }
}

/// Top-level settings of one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Wall-clock budget of the loop, in seconds.
    pub time_limit_secs: f64,
    /// Only passing sequences shorter than this are reused. 0 = unbounded;
    /// unbounded runs grow sequences exponentially and suit short runs only.
    pub max_sequence_length: usize,
    /// At most this many passing sequences are merged per candidate. 0 = unbounded.
    pub max_sequences_combined: usize,
    pub seed: u64,
    /// Include the per-iteration trace in the report.
    pub record_trace: bool,
    pub synthesis: SynthesisConfig,
    pub sandbox: SandboxConfig,
    pub inputs: InputLimits,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 10.0,
            max_sequence_length: 10,
            max_sequences_combined: 10,
            seed: 42,
            record_trace: false,
            synthesis: SynthesisConfig::default(),
            sandbox: SandboxConfig::default(),
            inputs: InputLimits::default(),
        }
    }
}

impl RunConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_limit_secs < 0.0 || Duration::try_from_secs_f64(self.time_limit_secs).is_err() {
            return Err(ConfigError::TimeLimit(self.time_limit_secs));
        }

        let synth = &self.synthesis;
        if !(0.0..=1.0).contains(&synth.reuse_probability) {
            return Err(ConfigError::ReuseProbability(synth.reuse_probability));
        }
        if synth.int_min > synth.int_max {
            return Err(ConfigError::InvertedRange {
                name: "int",
                min: synth.int_min.to_string(),
                max: synth.int_max.to_string(),
            });
        }
        if !synth.float_min.is_finite() || !synth.float_max.is_finite() || synth.float_min > synth.float_max {
            return Err(ConfigError::InvertedRange {
                name: "float",
                min: synth.float_min.to_string(),
                max: synth.float_max.to_string(),
            });
        }
        if !(synth.float_max - synth.float_min).is_finite() {
            return Err(ConfigError::FloatRangeTooWide {
                min: synth.float_min,
                max: synth.float_max,
            });
        }
        if synth.string_max_len > MAX_STRING_LEN {
            return Err(ConfigError::StringLength(synth.string_max_len));
        }
        Ok(())
    }

    pub fn time_limit(&self) -> Duration {
        Duration::try_from_secs_f64(self.time_limit_secs.max(0.0)).unwrap_or(Duration::MAX)
    }

    pub fn to_generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            time_limit: self.time_limit(),
            seed: self.seed,
            limits: SamplingLimits {
                max_sequence_length: self.max_sequence_length,
                max_sequences_combined: self.max_sequences_combined,
            },
            record_trace: self.record_trace,
        }
    }
}
