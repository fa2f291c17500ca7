//! Error types for loss and penalty evaluation
//!
//! Every shape or configuration problem surfaces as a [`LossError`] so the
//! surrounding training loop decides whether to abort. Numeric degeneracies
//! (log of zero, NaN from empty reductions) are not errors and propagate as
//! plain float values.

use std::fmt;

/// Result type alias for loss and penalty evaluation
pub type LossResult<T> = Result<T, LossError>;

#[derive(Debug, Clone, PartialEq)]
pub enum LossError {
    /// Two tensors that must agree element-wise have different shapes
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },

    /// Tensor has the wrong number of axes
    RankMismatch {
        expected: usize,
        got: usize,
        context: String,
    },

    /// A configured extent does not fit the tensor it is applied to
    DimensionMismatch {
        parameter: String,
        value: usize,
        extent: usize,
    },

    /// An attached regularizer had no activation supplied for its layer
    MissingActivation { layer: String },

    /// Invalid configuration parameter
    InvalidConfiguration {
        parameter: String,
        value: String,
        reason: String,
    },
}

impl fmt::Display for LossError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossError::ShapeMismatch { expected, got } => {
                write!(
                    f,
                    "Input shapes not same: y_true shape = {:?}, y_pred shape = {:?}",
                    expected, got
                )
            }
            LossError::RankMismatch {
                expected,
                got,
                context,
            } => {
                write!(
                    f,
                    "Rank mismatch in {}: expected {} dimensions, got {}",
                    context, expected, got
                )
            }
            LossError::DimensionMismatch {
                parameter,
                value,
                extent,
            } => {
                write!(
                    f,
                    "Dimension mismatch: {} = {} does not fit tensor extent {}",
                    parameter, value, extent
                )
            }
            LossError::MissingActivation { layer } => {
                write!(f, "No activation supplied for layer '{}'", layer)
            }
            LossError::InvalidConfiguration {
                parameter,
                value,
                reason,
            } => {
                write!(
                    f,
                    "Invalid configuration for parameter '{}' with value '{}': {}",
                    parameter, value, reason
                )
            }
        }
    }
}

impl std::error::Error for LossError {}

impl LossError {
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        LossError::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    pub fn invalid_weight(parameter: &str, weight: f32) -> Self {
        LossError::InvalidConfiguration {
            parameter: parameter.to_string(),
            value: weight.to_string(),
            reason: "weight must be finite and non-negative".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_reports_both_shapes() {
        let err = LossError::shape_mismatch(&[2, 3], &[3, 2]);
        let msg = err.to_string();
        assert!(msg.contains("[2, 3]"));
        assert!(msg.contains("[3, 2]"));
    }

    #[test]
    fn rank_mismatch_names_context() {
        let err = LossError::RankMismatch {
            expected: 4,
            got: 3,
            context: "TVRegularizer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Rank mismatch in TVRegularizer: expected 4 dimensions, got 3"
        );
    }
}
