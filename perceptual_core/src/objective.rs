//! Aggregates the output loss and every attached activation penalty.
//!
//! The training loop owns the network; it hands over the activations of the
//! layers named here and receives one [`PenaltyReport`] per step.

use std::collections::HashMap;

use ndarray::{ArrayBase, ArrayViewD, Data, Dimension};
use serde::Serialize;

use crate::config::ObjectiveConfig;
use crate::error::{LossError, LossResult};
use crate::loss::LossHead;
use crate::regularizer::{ActivityPenalty, Regularizer, RegularizerConfig};
use crate::tensor::EvalContext;

/// Penalty contributed by one attached regularizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerPenalty {
    pub layer: String,
    pub regularizer: &'static str,
    pub penalty: f32,
}

/// Result of evaluating an [`Objective`] for one training step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PenaltyReport {
    /// Value of the output loss head
    pub loss: f32,
    /// Penalties in attachment order
    pub penalties: Vec<LayerPenalty>,
    /// `loss + Σ penalties`
    pub total: f32,
}

impl PenaltyReport {
    pub fn penalty_for(&self, layer: &str) -> Option<f32> {
        self.penalties
            .iter()
            .find(|entry| entry.layer == layer)
            .map(|entry| entry.penalty)
    }
}

/// Output loss head plus regularizers attached to named layers.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use ndarray::Array2;
/// use perceptual_core::{ContentRegularizer, EvalContext, LossHead, Objective};
///
/// let objective = Objective::new(LossHead::Dummy)
///     .with_regularizer("vgg_block2", ContentRegularizer::new(1.0));
///
/// let features = Array2::<f32>::zeros((2, 8));
/// let mut activations = HashMap::new();
/// activations.insert("vgg_block2".to_string(), features.view().into_dyn());
///
/// let output = Array2::<f32>::zeros((1, 4));
/// let report = objective
///     .evaluate(&EvalContext::default(), &output, &output, &activations)
///     .unwrap();
/// assert_eq!(report.total, 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Objective {
    head: LossHead,
    attachments: Vec<(String, Regularizer)>,
}

impl Objective {
    pub fn new(head: LossHead) -> Self {
        Self {
            head,
            attachments: Vec::new(),
        }
    }

    /// Builds the objective described by a parsed configuration.
    pub fn from_config(config: &ObjectiveConfig) -> LossResult<Self> {
        let mut objective = Self::new(config.loss);
        for spec in &config.regularizers {
            let regularizer = Regularizer::from_config(&spec.to_record(config.layout))?;
            objective.attach(spec.layer.clone(), regularizer);
        }
        Ok(objective)
    }

    pub fn with_regularizer<R>(mut self, layer: impl Into<String>, regularizer: R) -> Self
    where
        R: Into<Regularizer>,
    {
        self.attach(layer, regularizer);
        self
    }

    pub fn attach<R>(&mut self, layer: impl Into<String>, regularizer: R)
    where
        R: Into<Regularizer>,
    {
        self.attachments.push((layer.into(), regularizer.into()));
    }

    pub fn head(&self) -> LossHead {
        self.head
    }

    pub fn attachments(&self) -> &[(String, Regularizer)] {
        &self.attachments
    }

    /// Exported configuration records keyed by layer name.
    pub fn configs(&self) -> Vec<(String, RegularizerConfig)> {
        self.attachments
            .iter()
            .map(|(layer, regularizer)| (layer.clone(), regularizer.config()))
            .collect()
    }

    /// Evaluates the loss head and every attached penalty.
    ///
    /// # Errors
    ///
    /// Returns [`LossError::MissingActivation`] if a layer with an attached
    /// regularizer is absent from `activations`, and propagates any error from
    /// the loss head or the regularizers themselves.
    pub fn evaluate<S1, S2, D1, D2>(
        &self,
        ctx: &EvalContext,
        y_true: &ArrayBase<S1, D1>,
        y_pred: &ArrayBase<S2, D2>,
        activations: &HashMap<String, ArrayViewD<'_, f32>>,
    ) -> LossResult<PenaltyReport>
    where
        S1: Data<Elem = f32>,
        S2: Data<Elem = f32>,
        D1: Dimension,
        D2: Dimension,
    {
        let loss = self.head.evaluate(ctx, y_true, y_pred)?;

        let mut penalties = Vec::with_capacity(self.attachments.len());
        for (layer, regularizer) in &self.attachments {
            let activation = activations
                .get(layer)
                .ok_or_else(|| LossError::MissingActivation {
                    layer: layer.clone(),
                })?;
            let penalty = regularizer.penalty(ctx, activation)?;
            penalties.push(LayerPenalty {
                layer: layer.clone(),
                regularizer: regularizer.name(),
                penalty,
            });
        }

        let total = loss + penalties.iter().map(|entry| entry.penalty).sum::<f32>();
        tracing::debug!(loss, total, attached = penalties.len(), "objective evaluated");

        Ok(PenaltyReport {
            loss,
            penalties,
            total,
        })
    }
}
