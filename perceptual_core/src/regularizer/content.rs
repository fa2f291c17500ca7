//! Feature-matching penalty between generated and target activations.

use ndarray::{ArrayViewD, Axis, Slice};

use super::{ActivityPenalty, RegularizerConfig};
use crate::error::{LossError, LossResult};
use crate::tensor::operations::sum_squared_difference;
use crate::tensor::EvalContext;

pub const NAME: &str = "ContentVGGRegularizer";
pub const DEFAULT_WEIGHT: f32 = 1.0;

/// Pulls generated-image features toward target-image features.
///
/// The batch axis of the activation is split in two: the first half holds
/// the features of generated images, the second half the features of the
/// matching content images. The penalty is
/// `weight * Σ (content - generated)²` over every element.
///
/// An odd batch loses its final sample.
///
/// # Examples
///
/// ```
/// use ndarray::Array2;
/// use perceptual_core::{ActivityPenalty, ContentRegularizer, EvalContext};
///
/// let mut x = Array2::<f32>::zeros((2, 3));
/// x[[1, 0]] = 0.5;
/// let penalty = ContentRegularizer::new(2.0)
///     .penalty(&EvalContext::default(), &x.view().into_dyn())
///     .unwrap();
/// assert!((penalty - 0.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentRegularizer {
    pub weight: f32,
}

impl ContentRegularizer {
    pub fn new(weight: f32) -> Self {
        Self { weight }
    }
}

impl Default for ContentRegularizer {
    fn default() -> Self {
        Self::new(DEFAULT_WEIGHT)
    }
}

impl ActivityPenalty for ContentRegularizer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn penalty(&self, ctx: &EvalContext, x: &ArrayViewD<'_, f32>) -> LossResult<f32> {
        if x.ndim() == 0 {
            return Err(LossError::RankMismatch {
                expected: 1,
                got: 0,
                context: NAME.to_string(),
            });
        }

        let batch = x.len_of(Axis(0));
        let half = batch / 2;
        if batch % 2 != 0 {
            tracing::warn!("{NAME}: odd batch size {batch}, dropping the final sample");
        }

        let generated = x.slice_axis(Axis(0), Slice::from(..half));
        let content = x.slice_axis(Axis(0), Slice::from(half..2 * half));
        let total = sum_squared_difference(ctx, &generated, &content);

        let penalty = (self.weight as f64 * total) as f32;
        tracing::debug!(weight = self.weight, batch, penalty, "content penalty");
        Ok(penalty)
    }

    fn config(&self) -> RegularizerConfig {
        RegularizerConfig::new(NAME, self.weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array4};

    fn paired_batch(generated: f32, content: f32) -> Array4<f32> {
        let mut x = Array4::<f32>::zeros((4, 2, 2, 3));
        x.slice_mut(ndarray::s![..2, .., .., ..]).fill(generated);
        x.slice_mut(ndarray::s![2.., .., .., ..]).fill(content);
        x
    }

    #[test]
    fn equal_halves_have_zero_penalty() {
        let x = paired_batch(0.3, 0.3);
        let penalty = ContentRegularizer::new(2.0)
            .penalty(&EvalContext::default(), &x.view().into_dyn())
            .unwrap();
        assert_eq!(penalty, 0.0);
    }

    #[test]
    fn penalty_scales_with_squared_perturbation() {
        let ctx = EvalContext::default();
        let regularizer = ContentRegularizer::new(2.0);
        for &d in &[0.1f32, 0.5, 2.0] {
            let mut x = paired_batch(1.0, 1.0);
            x[[0, 1, 1, 2]] += d;
            let penalty = regularizer.penalty(&ctx, &x.view().into_dyn()).unwrap();
            let expected = 2.0 * d * d;
            assert!((penalty - expected).abs() < 1e-5 * expected.max(1.0));
        }
    }

    #[test]
    fn sums_every_element_of_the_difference() {
        let x = paired_batch(0.0, 1.0);
        // 2 samples * 2 * 2 * 3 elements, each differing by 1
        let penalty = ContentRegularizer::default()
            .penalty(&EvalContext::default(), &x.view().into_dyn())
            .unwrap();
        assert!((penalty - 24.0).abs() < 1e-5);
    }

    #[test]
    fn odd_batch_drops_last_sample() {
        let x = Array1::from(vec![1.0f32, 3.0, 100.0]);
        let penalty = ContentRegularizer::default()
            .penalty(&EvalContext::default(), &x.view().into_dyn())
            .unwrap();
        assert!((penalty - 4.0).abs() < 1e-6);
    }

    #[test]
    fn scalar_input_is_rejected() {
        let x = ndarray::arr0(1.0f32);
        let err = ContentRegularizer::default()
            .penalty(&EvalContext::default(), &x.view().into_dyn())
            .unwrap_err();
        assert!(matches!(err, LossError::RankMismatch { got: 0, .. }));
    }

    #[test]
    fn config_reports_weight() {
        let config = ContentRegularizer::new(0.25).config();
        assert_eq!(config.name, NAME);
        assert_eq!(config.weight, 0.25);
        assert_eq!(config.img_width, None);
    }
}
