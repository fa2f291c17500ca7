//! Element-wise and reduction primitives over activation tensors.
//!
//! These are the only places that touch raw tensor memory:
//! - [`sum_squared_difference`] - Σ (b - a)²
//! - [`mean_squared_error`] - Σ (b - a)² / N
//! - [`mean_map`] - mean of an element-wise transform
//! - [`softplus`] / [`softminus`] - numerically stable scalar activations
//!
//! Reductions accumulate in `f64` and switch to rayon once the tensor is larger
//! than the context's threshold.

use ndarray::ArrayViewD;
use rayon::prelude::*;

use super::EvalContext;
use crate::error::{LossError, LossResult};

/// Fails with [`LossError::ShapeMismatch`] unless both tensors have the same shape.
pub fn ensure_same_shape(a: &ArrayViewD<'_, f32>, b: &ArrayViewD<'_, f32>) -> LossResult<()> {
    if a.shape() != b.shape() {
        return Err(LossError::shape_mismatch(a.shape(), b.shape()));
    }
    Ok(())
}

/// Sums `(b - a)²` over every element.
///
/// Both views must have the same shape; callers check with [`ensure_same_shape`].
pub fn sum_squared_difference(
    ctx: &EvalContext,
    a: &ArrayViewD<'_, f32>,
    b: &ArrayViewD<'_, f32>,
) -> f64 {
    debug_assert_eq!(a.shape(), b.shape());

    match (a.as_slice(), b.as_slice()) {
        (Some(lhs), Some(rhs)) if ctx.should_parallelize(lhs.len()) => lhs
            .par_iter()
            .zip(rhs.par_iter())
            .map(|(&x, &y)| squared_diff(x, y))
            .sum(),
        (Some(lhs), Some(rhs)) => lhs
            .iter()
            .zip(rhs.iter())
            .map(|(&x, &y)| squared_diff(x, y))
            .sum(),
        _ => a
            .iter()
            .zip(b.iter())
            .map(|(&x, &y)| squared_diff(x, y))
            .sum(),
    }
}

/// Mean of `(b - a)²`. An empty tensor yields NaN.
pub fn mean_squared_error(
    ctx: &EvalContext,
    a: &ArrayViewD<'_, f32>,
    b: &ArrayViewD<'_, f32>,
) -> f64 {
    sum_squared_difference(ctx, a, b) / a.len() as f64
}

/// Mean of `f(x)` over every element. An empty tensor yields NaN.
pub fn mean_map<F>(ctx: &EvalContext, x: &ArrayViewD<'_, f32>, f: F) -> f64
where
    F: Fn(f32) -> f64 + Sync + Send,
{
    let total: f64 = match x.as_slice() {
        Some(values) if ctx.should_parallelize(values.len()) => {
            values.par_iter().map(|&v| f(v)).sum()
        }
        Some(values) => values.iter().map(|&v| f(v)).sum(),
        None => x.iter().map(|&v| f(v)).sum(),
    };
    total / x.len() as f64
}

/// `ln(1 + eˣ)` without overflow for large `|x|`.
pub fn softplus(x: f64) -> f64 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

/// `x - softplus(x)`, equal to `ln(sigmoid(x))`.
pub fn softminus(x: f64) -> f64 {
    x - softplus(x)
}

#[inline]
fn squared_diff(a: f32, b: f32) -> f64 {
    let diff = b as f64 - a as f64;
    diff * diff
}
