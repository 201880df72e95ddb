use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tessera_ir::{PrimitiveValue, Sequence, TypeRef, VarRef};

use crate::error::SynthesisError;

/// A value bound to one parameter slot.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueRef {
    /// New literal, appended to the sequence before the call.
    Fresh(PrimitiveValue),
    /// Result of an earlier statement of the sequence being built.
    Reuse(VarRef),
}

/// Produces a value for one formal parameter.
///
/// `context` is the sequence accumulated so far in this iteration; a
/// `Reuse` must point into it.
pub trait ValueSynthesizer {
    fn synthesize(
        &mut self,
        declared: &TypeRef,
        context: &Sequence,
        rng: &mut ChaCha8Rng,
    ) -> Result<ValueRef, SynthesisError>;
}

impl<S: ValueSynthesizer + ?Sized> ValueSynthesizer for &mut S {
    fn synthesize(
        &mut self,
        declared: &TypeRef,
        context: &Sequence,
        rng: &mut ChaCha8Rng,
    ) -> Result<ValueRef, SynthesisError> {
        (**self).synthesize(declared, context, rng)
    }
}

/// Longest string literal the synthesizer will produce.
pub const MAX_STRING_LEN: usize = 4096;

/// Knobs for `RandomValueSynthesizer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Chance of reusing a compatible earlier value for a primitive slot.
    pub reuse_probability: f64,
    pub int_min: i64,
    pub int_max: i64,
    pub float_min: f64,
    pub float_max: f64,
    /// Capped at `MAX_STRING_LEN`.
    pub string_max_len: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            reuse_probability: 0.5,
            int_min: -100,
            int_max: 100,
            float_min: -100.0,
            float_max: 100.0,
            string_max_len: 8,
        }
    }
}

/// Default synthesizer: random literals keyed by declared type, or reuse of
/// an earlier compatible result.
///
/// Object slots can only be filled by reuse; when nothing compatible has
/// been produced yet the slot fails with `NoCompatibleValue`.
#[derive(Debug, Clone, Default)]
pub struct RandomValueSynthesizer {
    config: SynthesisConfig,
}

impl RandomValueSynthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    fn reuse_probability(&self) -> f64 {
        let p = self.config.reuse_probability;
        if p.is_nan() {
            0.0
        } else {
            p.clamp(0.0, 1.0)
        }
    }

    fn fresh(&self, declared: &TypeRef, rng: &mut ChaCha8Rng) -> Result<PrimitiveValue, SynthesisError> {
        let cfg = &self.config;
        let value = match declared {
            TypeRef::Int => {
                PrimitiveValue::Int(rng.gen_range(cfg.int_min.min(cfg.int_max)..=cfg.int_max.max(cfg.int_min)))
            }
            TypeRef::Float => {
                let (lo, hi) = (cfg.float_min.min(cfg.float_max), cfg.float_max.max(cfg.float_min));
                if !(hi - lo).is_finite() {
                    return Err(SynthesisError::InvalidRange {
                        declared: declared.clone(),
                        min: lo.to_string(),
                        max: hi.to_string(),
                    });
                }
                PrimitiveValue::Float(rng.gen_range(lo..=hi))
            }
            TypeRef::Bool => PrimitiveValue::Bool(rng.gen_bool(0.5)),
            TypeRef::Str => {
                let len = rng.gen_range(0..=cfg.string_max_len.min(MAX_STRING_LEN));
                let s: String = (0..len).map(|_| rng.sample(Alphanumeric) as char).collect();
                PrimitiveValue::Str(s)
            }
            TypeRef::Any => {
                let kinds = [TypeRef::Int, TypeRef::Float, TypeRef::Bool, TypeRef::Str];
                let kind = kinds[rng.gen_range(0..kinds.len())].clone();
                return self.fresh(&kind, rng);
            }
            TypeRef::None | TypeRef::Object(_) => {
                return Err(SynthesisError::Unsupported {
                    declared: declared.clone(),
                })
            }
        };
        Ok(value)
    }
}

impl ValueSynthesizer for RandomValueSynthesizer {
    fn synthesize(
        &mut self,
        declared: &TypeRef,
        context: &Sequence,
        rng: &mut ChaCha8Rng,
    ) -> Result<ValueRef, SynthesisError> {
        if *declared == TypeRef::None {
            return Err(SynthesisError::Unsupported {
                declared: declared.clone(),
            });
        }

        let candidates = context.compatible_handles(declared);

        if let TypeRef::Object(_) = declared {
            return candidates
                .choose(rng)
                .map(|r| ValueRef::Reuse(*r))
                .ok_or_else(|| SynthesisError::NoCompatibleValue {
                    declared: declared.clone(),
                });
        }

        if !candidates.is_empty() && rng.gen_bool(self.reuse_probability()) {
            if let Some(r) = candidates.choose(rng) {
                return Ok(ValueRef::Reuse(*r));
            }
        }

        self.fresh(declared, rng).map(ValueRef::Fresh)
    }
}
