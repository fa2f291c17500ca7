//! Anisotropic total-variation smoothness penalty for image activations.

use ndarray::{s, ArrayView3, ArrayViewD, Axis, Ix4, Zip};
use rayon::prelude::*;

use super::{ActivityPenalty, RegularizerConfig};
use crate::error::{LossError, LossResult};
use crate::tensor::{DataLayout, EvalContext};

pub const NAME: &str = "TVRegularizer";
pub const DEFAULT_WEIGHT: f32 = 2e-8;

const TV_EXPONENT: f64 = 1.25;

/// Enforces smoothness in image outputs.
///
/// Over the crop `[0, img_width - 1) x [0, img_height - 1)` the horizontal and
/// vertical first differences `a` and `b` are squared, combined as
/// `(a + b)^1.25`, summed over the spatial and channel axes, averaged over the
/// batch and scaled by `weight`.
///
/// The default weight is tiny because the raw sum grows with pixel count.
///
/// # Examples
///
/// ```
/// use ndarray::Array4;
/// use perceptual_core::{ActivityPenalty, EvalContext, TotalVariationRegularizer};
///
/// let flat = Array4::<f32>::from_elem((2, 4, 4, 3), 0.5);
/// let penalty = TotalVariationRegularizer::new(4, 4)
///     .with_weight(1.0)
///     .penalty(&EvalContext::default(), &flat.view().into_dyn())
///     .unwrap();
/// assert_eq!(penalty, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalVariationRegularizer {
    pub img_width: usize,
    pub img_height: usize,
    pub weight: f32,
    pub layout: DataLayout,
}

impl TotalVariationRegularizer {
    pub fn new(img_width: usize, img_height: usize) -> Self {
        Self {
            img_width,
            img_height,
            weight: DEFAULT_WEIGHT,
            layout: DataLayout::default(),
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_layout(mut self, layout: DataLayout) -> Self {
        self.layout = layout;
        self
    }

    fn check_extent(&self, parameter: &str, value: usize, extent: usize) -> LossResult<()> {
        if value == 0 || value > extent {
            return Err(LossError::DimensionMismatch {
                parameter: parameter.to_string(),
                value,
                extent,
            });
        }
        Ok(())
    }
}

impl ActivityPenalty for TotalVariationRegularizer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn penalty(&self, ctx: &EvalContext, x: &ArrayViewD<'_, f32>) -> LossResult<f32> {
        let x = x
            .view()
            .into_dimensionality::<Ix4>()
            .map_err(|_| LossError::RankMismatch {
                expected: 4,
                got: x.ndim(),
                context: NAME.to_string(),
            })?;

        let (width_axis, height_axis) = self.layout.spatial_axes();
        self.check_extent("img_width", self.img_width, x.len_of(Axis(width_axis)))?;
        self.check_extent("img_height", self.img_height, x.len_of(Axis(height_axis)))?;

        let w = self.img_width - 1;
        let h = self.img_height - 1;
        let (origin, right, below) = match self.layout {
            DataLayout::ChannelsFirst => (
                x.slice(s![.., .., ..w, ..h]),
                x.slice(s![.., .., 1..w + 1, ..h]),
                x.slice(s![.., .., ..w, 1..h + 1]),
            ),
            DataLayout::ChannelsLast => (
                x.slice(s![.., ..w, ..h, ..]),
                x.slice(s![.., 1..w + 1, ..h, ..]),
                x.slice(s![.., ..w, 1..h + 1, ..]),
            ),
        };

        let batch = origin.len_of(Axis(0));
        let sample = |n: usize| {
            sample_variation(
                origin.index_axis(Axis(0), n),
                right.index_axis(Axis(0), n),
                below.index_axis(Axis(0), n),
            )
        };
        let total: f64 = if ctx.should_parallelize(origin.len()) {
            (0..batch).into_par_iter().map(sample).sum()
        } else {
            (0..batch).map(sample).sum()
        };

        let penalty = (self.weight as f64 * total / batch as f64) as f32;
        tracing::debug!(
            weight = self.weight,
            batch,
            layout = %self.layout,
            penalty,
            "total variation penalty"
        );
        Ok(penalty)
    }

    fn config(&self) -> RegularizerConfig {
        RegularizerConfig {
            name: NAME.to_string(),
            weight: self.weight,
            img_width: Some(self.img_width),
            img_height: Some(self.img_height),
            layout: Some(self.layout),
        }
    }
}

fn sample_variation(
    origin: ArrayView3<'_, f32>,
    right: ArrayView3<'_, f32>,
    below: ArrayView3<'_, f32>,
) -> f64 {
    let mut total = 0.0;
    Zip::from(&origin)
        .and(&right)
        .and(&below)
        .for_each(|&c, &r, &b| {
            let dx = c as f64 - r as f64;
            let dy = c as f64 - b as f64;
            total += (dx * dx + dy * dy).powf(TV_EXPONENT);
        });
    total
}
