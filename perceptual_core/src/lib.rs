//! # Perceptual Core
//!
//! Losses and activation regularizers for training generative adversarial
//! image-transformation networks (style transfer, super-resolution). The
//! generator's output head carries a placeholder loss; the real training
//! signal comes from penalties attached to intermediate activations.
//!
//! ## Quick Start
//!
//! ```rust
//! use ndarray::Array4;
//! use perceptual_core::{
//!     ActivityPenalty, ContentRegularizer, EvalContext, TotalVariationRegularizer,
//! };
//!
//! let ctx = EvalContext::default();
//!
//! // Generated and target features stacked along the batch axis
//! let features = Array4::<f32>::from_elem((4, 8, 8, 16), 0.5);
//! let content = ContentRegularizer::new(1.0).penalty(&ctx, &features.view().into_dyn()).unwrap();
//! assert_eq!(content, 0.0);
//!
//! let image = Array4::<f32>::from_shape_fn((1, 8, 8, 3), |(_, x, _, _)| x as f32 / 8.0);
//! let smoothness = TotalVariationRegularizer::new(8, 8)
//!     .penalty(&ctx, &image.view().into_dyn())
//!     .unwrap();
//! assert!(smoothness > 0.0);
//! ```
//!
//! ## Core Modules
//!
//! - [`loss`] - Dummy loss and PSNR metrics
//! - [`regularizer`] - Content, adversarial and total-variation penalties
//! - [`objective`] - Per-step aggregation of loss and penalties
//! - [`config`] - Objective configuration via TOML
//! - [`logging`] - JSON line-delimited penalty logging
//! - [`checkpoint`] - Versioned binary persistence of configurations

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod logging;
pub mod loss;
pub mod objective;
pub mod regularizer;
pub mod tensor;

pub use checkpoint::{CheckpointError, Checkpointable};
pub use config::{ConfigError, ObjectiveConfig, RegularizerKind, RegularizerSpec};
pub use error::{LossError, LossResult};
pub use loss::{dummy_loss, mean_squared_error, psnr, psnr_loss, LossHead, PSNR_MAX_255_DB};
pub use objective::{LayerPenalty, Objective, PenaltyReport};
pub use regularizer::{
    ActivityPenalty, AdversarialRegularizer, ContentRegularizer, Regularizer, RegularizerConfig,
    TotalVariationRegularizer,
};
pub use tensor::operations::{softminus, softplus};
pub use tensor::{DataLayout, EvalContext};
