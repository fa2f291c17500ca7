//! Activation regularizers.
//!
//! A regularizer turns the activation tensor of one network layer into a
//! scalar penalty that the training loop adds to its objective. Each kind is
//! an immutable value struct; [`Regularizer`] is the tagged union callers
//! dispatch on and [`RegularizerConfig`] is the flat record it exports.

pub mod adversarial;
pub mod content;
pub mod total_variation;

use ndarray::ArrayViewD;
use serde::{Deserialize, Serialize};

use crate::error::{LossError, LossResult};
use crate::tensor::{DataLayout, EvalContext};

pub use adversarial::AdversarialRegularizer;
pub use content::ContentRegularizer;
pub use total_variation::TotalVariationRegularizer;

/// Penalty computed from a single activation tensor.
pub trait ActivityPenalty {
    /// Record name used in exported configurations.
    fn name(&self) -> &'static str;

    /// Scalar penalty for `x`.
    fn penalty(&self, ctx: &EvalContext, x: &ArrayViewD<'_, f32>) -> LossResult<f32>;

    /// Flat description of the construction parameters.
    fn config(&self) -> RegularizerConfig;
}

/// Flat key-value record describing a regularizer.
///
/// Only `name` and `weight` are always present; the total-variation kind also
/// fills in the image extents and layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegularizerConfig {
    pub name: String,
    pub weight: f32,
    #[serde(default)]
    pub img_width: Option<usize>,
    #[serde(default)]
    pub img_height: Option<usize>,
    #[serde(default)]
    pub layout: Option<DataLayout>,
}

impl RegularizerConfig {
    pub fn new(name: &str, weight: f32) -> Self {
        Self {
            name: name.to_string(),
            weight,
            img_width: None,
            img_height: None,
            layout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Regularizer {
    Content(ContentRegularizer),
    Adversarial(AdversarialRegularizer),
    TotalVariation(TotalVariationRegularizer),
}

impl Regularizer {
    /// Rebuilds a regularizer from an exported record.
    ///
    /// # Errors
    ///
    /// Returns [`LossError::InvalidConfiguration`] for an unknown name, a
    /// negative or non-finite weight, or a total-variation record without
    /// image extents.
    pub fn from_config(config: &RegularizerConfig) -> LossResult<Self> {
        if !config.weight.is_finite() || config.weight < 0.0 {
            return Err(LossError::invalid_weight(&config.name, config.weight));
        }

        match config.name.as_str() {
            content::NAME => Ok(Regularizer::Content(ContentRegularizer::new(config.weight))),
            adversarial::NAME => Ok(Regularizer::Adversarial(AdversarialRegularizer::new(
                config.weight,
            ))),
            total_variation::NAME => {
                let img_width = require_extent(config, "img_width", config.img_width)?;
                let img_height = require_extent(config, "img_height", config.img_height)?;
                Ok(Regularizer::TotalVariation(
                    TotalVariationRegularizer::new(img_width, img_height)
                        .with_weight(config.weight)
                        .with_layout(config.layout.unwrap_or_default()),
                ))
            }
            other => Err(LossError::InvalidConfiguration {
                parameter: "name".to_string(),
                value: other.to_string(),
                reason: "unknown regularizer".to_string(),
            }),
        }
    }

    pub fn weight(&self) -> f32 {
        match self {
            Regularizer::Content(r) => r.weight,
            Regularizer::Adversarial(r) => r.weight,
            Regularizer::TotalVariation(r) => r.weight,
        }
    }
}

impl ActivityPenalty for Regularizer {
    fn name(&self) -> &'static str {
        match self {
            Regularizer::Content(r) => r.name(),
            Regularizer::Adversarial(r) => r.name(),
            Regularizer::TotalVariation(r) => r.name(),
        }
    }

    fn penalty(&self, ctx: &EvalContext, x: &ArrayViewD<'_, f32>) -> LossResult<f32> {
        match self {
            Regularizer::Content(r) => r.penalty(ctx, x),
            Regularizer::Adversarial(r) => r.penalty(ctx, x),
            Regularizer::TotalVariation(r) => r.penalty(ctx, x),
        }
    }

    fn config(&self) -> RegularizerConfig {
        match self {
            Regularizer::Content(r) => r.config(),
            Regularizer::Adversarial(r) => r.config(),
            Regularizer::TotalVariation(r) => r.config(),
        }
    }
}

impl From<ContentRegularizer> for Regularizer {
    fn from(value: ContentRegularizer) -> Self {
        Regularizer::Content(value)
    }
}

impl From<AdversarialRegularizer> for Regularizer {
    fn from(value: AdversarialRegularizer) -> Self {
        Regularizer::Adversarial(value)
    }
}

impl From<TotalVariationRegularizer> for Regularizer {
    fn from(value: TotalVariationRegularizer) -> Self {
        Regularizer::TotalVariation(value)
    }
}

fn require_extent(
    config: &RegularizerConfig,
    parameter: &str,
    value: Option<usize>,
) -> LossResult<usize> {
    match value {
        Some(extent) if extent > 0 => Ok(extent),
        Some(extent) => Err(LossError::InvalidConfiguration {
            parameter: parameter.to_string(),
            value: extent.to_string(),
            reason: format!("{} requires a positive extent", config.name),
        }),
        None => Err(LossError::InvalidConfiguration {
            parameter: parameter.to_string(),
            value: "missing".to_string(),
            reason: format!("{} requires image extents", config.name),
        }),
    }
}
