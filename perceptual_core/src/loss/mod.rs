//! Output-level losses and image-quality metrics.
//!
//! The generator is trained through penalties attached to intermediate
//! activations, so the output head usually carries [`dummy_loss`]. The PSNR
//! functions serve as evaluation losses on images scaled to [0, 1].

use ndarray::{ArrayBase, Data, Dimension};
use serde::{Deserialize, Serialize};

use crate::error::LossResult;
use crate::tensor::operations::{self, ensure_same_shape};
use crate::tensor::EvalContext;

/// `20 * log10(255)`: the peak term of PSNR for 8-bit pixel ranges.
pub const PSNR_MAX_255_DB: f64 = 48.1308036087;

/// Placeholder loss that always returns zero.
///
/// Both arguments are ignored, so any pair of shapes is accepted.
///
/// # Examples
///
/// ```
/// use ndarray::{Array1, Array2};
/// use perceptual_core::dummy_loss;
///
/// let y_true = Array2::<f32>::ones((2, 2));
/// let y_pred = Array1::<f32>::zeros(7);
/// assert_eq!(dummy_loss(&y_true, &y_pred), 0.0);
/// ```
pub fn dummy_loss<S1, S2, D1, D2>(_y_true: &ArrayBase<S1, D1>, _y_pred: &ArrayBase<S2, D2>) -> f32
where
    S1: Data<Elem = f32>,
    S2: Data<Elem = f32>,
    D1: Dimension,
    D2: Dimension,
{
    0.0
}

/// Mean squared error between two equally shaped tensors.
///
/// # Errors
///
/// Returns [`LossError::ShapeMismatch`](crate::LossError::ShapeMismatch) if the
/// shapes differ.
pub fn mean_squared_error<S1, S2, D1, D2>(
    ctx: &EvalContext,
    y_true: &ArrayBase<S1, D1>,
    y_pred: &ArrayBase<S2, D2>,
) -> LossResult<f32>
where
    S1: Data<Elem = f32>,
    S2: Data<Elem = f32>,
    D1: Dimension,
    D2: Dimension,
{
    let y_true = y_true.view().into_dyn();
    let y_pred = y_pred.view().into_dyn();
    ensure_same_shape(&y_true, &y_pred)?;
    Ok(operations::mean_squared_error(ctx, &y_true, &y_pred) as f32)
}

/// Peak signal-to-noise ratio for signals with a peak value of 1.
///
/// Computes `-10 * log10(mean((y_pred - y_true)²))`. Identical inputs give an
/// MSE of zero and therefore `+inf`; no epsilon is added.
///
/// # Arguments
///
/// * `ctx` - Evaluation context
/// * `y_true` - Reference tensor
/// * `y_pred` - Reconstructed tensor (must have the same shape as `y_true`)
///
/// # Errors
///
/// Returns [`LossError::ShapeMismatch`](crate::LossError::ShapeMismatch)
/// naming both shapes if they differ.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use perceptual_core::{psnr, EvalContext};
///
/// let ctx = EvalContext::default();
/// let y_true = array![[0.0f32, 0.0], [0.0, 0.0]];
/// let y_pred = array![[0.1f32, 0.1], [0.1, 0.1]];
/// let value = psnr(&ctx, &y_true, &y_pred).unwrap();
/// assert!((value - 20.0).abs() < 1e-4);
/// ```
pub fn psnr<S1, S2, D1, D2>(
    ctx: &EvalContext,
    y_true: &ArrayBase<S1, D1>,
    y_pred: &ArrayBase<S2, D2>,
) -> LossResult<f32>
where
    S1: Data<Elem = f32>,
    S2: Data<Elem = f32>,
    D1: Dimension,
    D2: Dimension,
{
    let mse = checked_mse(ctx, y_true, y_pred, "psnr")?;
    Ok((-10.0 * mse.log10()) as f32)
}

/// PSNR evaluation loss: `48.1308036087 - 10 * log10(MSE)`.
///
/// The constant is the `20 * log10(255)` peak term. Inputs scaled to [0, 1]
/// would make the peak term vanish, so only the MSE term varies between
/// calls. Like [`psnr`], an MSE of zero yields `+inf`.
///
/// # Errors
///
/// Returns [`LossError::ShapeMismatch`](crate::LossError::ShapeMismatch) if the
/// shapes differ.
pub fn psnr_loss<S1, S2, D1, D2>(
    ctx: &EvalContext,
    y_true: &ArrayBase<S1, D1>,
    y_pred: &ArrayBase<S2, D2>,
) -> LossResult<f32>
where
    S1: Data<Elem = f32>,
    S2: Data<Elem = f32>,
    D1: Dimension,
    D2: Dimension,
{
    let mse = checked_mse(ctx, y_true, y_pred, "psnr_loss")?;
    Ok((PSNR_MAX_255_DB - 10.0 * mse.log10()) as f32)
}

fn checked_mse<S1, S2, D1, D2>(
    ctx: &EvalContext,
    y_true: &ArrayBase<S1, D1>,
    y_pred: &ArrayBase<S2, D2>,
    name: &str,
) -> LossResult<f64>
where
    S1: Data<Elem = f32>,
    S2: Data<Elem = f32>,
    D1: Dimension,
    D2: Dimension,
{
    let y_true = y_true.view().into_dyn();
    let y_pred = y_pred.view().into_dyn();
    ensure_same_shape(&y_true, &y_pred)?;

    let mse = operations::mean_squared_error(ctx, &y_true, &y_pred);
    if mse == 0.0 {
        tracing::warn!("{name}: mean squared error is zero, result is infinite");
    }
    Ok(mse)
}

/// Loss attached to the network output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossHead {
    /// [`dummy_loss`]: all pressure comes from regularizers
    Dummy,
    /// [`psnr_loss`]
    Psnr,
}

impl Default for LossHead {
    fn default() -> Self {
        LossHead::Dummy
    }
}

impl LossHead {
    pub fn evaluate<S1, S2, D1, D2>(
        &self,
        ctx: &EvalContext,
        y_true: &ArrayBase<S1, D1>,
        y_pred: &ArrayBase<S2, D2>,
    ) -> LossResult<f32>
    where
        S1: Data<Elem = f32>,
        S2: Data<Elem = f32>,
        D1: Dimension,
        D2: Dimension,
    {
        match self {
            LossHead::Dummy => Ok(dummy_loss(y_true, y_pred)),
            LossHead::Psnr => psnr_loss(ctx, y_true, y_pred),
        }
    }
}
