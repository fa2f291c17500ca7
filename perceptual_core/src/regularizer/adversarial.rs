//! Generator-side adversarial penalty on discriminator logits.

use ndarray::ArrayViewD;

use super::{ActivityPenalty, RegularizerConfig};
use crate::error::LossResult;
use crate::tensor::operations::{mean_map, softminus};
use crate::tensor::EvalContext;

pub const NAME: &str = "AdversarialLossRegularizer";
pub const DEFAULT_WEIGHT: f32 = 1e-3;

/// `weight * mean(1 - softminus(logits))` over discriminator outputs for
/// generated samples.
///
/// `softminus(g) = ln(sigmoid(g))`, so every element contributes at least 1
/// and the penalty shrinks toward `weight` as the discriminator grows
/// confident that the samples are real.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdversarialRegularizer {
    pub weight: f32,
}

impl AdversarialRegularizer {
    pub fn new(weight: f32) -> Self {
        Self { weight }
    }
}

impl Default for AdversarialRegularizer {
    fn default() -> Self {
        Self::new(DEFAULT_WEIGHT)
    }
}

impl ActivityPenalty for AdversarialRegularizer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn penalty(&self, ctx: &EvalContext, x: &ArrayViewD<'_, f32>) -> LossResult<f32> {
        let mean = mean_map(ctx, x, |logit| 1.0 - softminus(logit as f64));
        let penalty = (self.weight as f64 * mean) as f32;
        tracing::debug!(weight = self.weight, penalty, "adversarial penalty");
        Ok(penalty)
    }

    fn config(&self) -> RegularizerConfig {
        RegularizerConfig::new(NAME, self.weight)
    }
}
