//! Objective configuration management via TOML files.
//!
//! Describes which loss head drives the output and which regularizers are
//! attached to which layers, with the defaults of each regularizer kind.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::loss::LossHead;
use crate::regularizer::{adversarial, content, total_variation, RegularizerConfig};
use crate::tensor::{DataLayout, EvalContext, DEFAULT_PARALLEL_THRESHOLD};

/// Objective configuration loaded from a TOML file.
///
/// # Examples
///
/// ```
/// use perceptual_core::config::{ObjectiveConfig, RegularizerKind};
///
/// let config = ObjectiveConfig::from_str(
///     r#"
///     [objective]
///     layout = "channels_first"
///
///     [[objective.regularizers]]
///     layer = "output"
///     kind = "total_variation"
///     img_width = 96
///     img_height = 96
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.regularizers[0].kind, RegularizerKind::TotalVariation);
/// assert_eq!(config.regularizers[0].weight, 2e-8);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveConfig {
    /// Loss attached to the network output
    pub loss: LossHead,
    /// Axis ordering of image activations
    pub layout: DataLayout,
    /// Reductions over more elements than this run in parallel
    pub parallel_threshold: usize,
    /// Regularizers in attachment order
    pub regularizers: Vec<RegularizerSpec>,
}

impl ObjectiveConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_str(&contents)
    }

    pub fn from_str(toml_str: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(toml_str).map_err(|err| ConfigError::Parse(err.to_string()))?;
        let raw = raw.objective;

        let layout = raw
            .layout
            .parse::<DataLayout>()
            .map_err(ConfigError::Parse)?;

        let regularizers = raw
            .regularizers
            .iter()
            .map(RegularizerSpec::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            loss: raw.loss,
            layout,
            parallel_threshold: raw.parallel_threshold,
            regularizers,
        })
    }

    /// Evaluation context matching this configuration.
    pub fn context(&self) -> EvalContext {
        EvalContext::new(self.parallel_threshold)
    }
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        Self {
            loss: LossHead::Dummy,
            layout: DataLayout::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            regularizers: Vec::new(),
        }
    }
}

/// Kind of regularizer attached to a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegularizerKind {
    Content,
    Adversarial,
    TotalVariation,
}

impl RegularizerKind {
    pub fn default_weight(&self) -> f32 {
        match self {
            RegularizerKind::Content => content::DEFAULT_WEIGHT,
            RegularizerKind::Adversarial => adversarial::DEFAULT_WEIGHT,
            RegularizerKind::TotalVariation => total_variation::DEFAULT_WEIGHT,
        }
    }

    pub fn record_name(&self) -> &'static str {
        match self {
            RegularizerKind::Content => content::NAME,
            RegularizerKind::Adversarial => adversarial::NAME,
            RegularizerKind::TotalVariation => total_variation::NAME,
        }
    }
}

/// One regularizer attachment with defaults resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegularizerSpec {
    pub layer: String,
    pub kind: RegularizerKind,
    pub weight: f32,
    pub img_width: Option<usize>,
    pub img_height: Option<usize>,
}

impl RegularizerSpec {
    /// Flat record for this attachment, using the objective-wide layout.
    pub fn to_record(&self, layout: DataLayout) -> RegularizerConfig {
        let mut record = RegularizerConfig::new(self.kind.record_name(), self.weight);
        if self.kind == RegularizerKind::TotalVariation {
            record.img_width = self.img_width;
            record.img_height = self.img_height;
            record.layout = Some(layout);
        }
        record
    }

    fn try_from(raw: &RawRegularizer) -> Result<Self, ConfigError> {
        if raw.layer.trim().is_empty() {
            return Err(ConfigError::Parse(
                "regularizers.layer must not be empty".into(),
            ));
        }

        let weight = raw.weight.unwrap_or_else(|| raw.kind.default_weight());
        if !weight.is_finite() || weight < 0.0 {
            return Err(ConfigError::Parse(format!(
                "regularizers.weight for layer '{}' must be finite and non-negative",
                raw.layer
            )));
        }

        if raw.kind == RegularizerKind::TotalVariation {
            for (name, value) in [("img_width", raw.img_width), ("img_height", raw.img_height)] {
                match value {
                    Some(0) => {
                        return Err(ConfigError::Parse(format!(
                            "regularizers.{name} for layer '{}' must be positive",
                            raw.layer
                        )))
                    }
                    None => {
                        return Err(ConfigError::Parse(format!(
                            "regularizers.{name} is required for total_variation on layer '{}'",
                            raw.layer
                        )))
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(Self {
            layer: raw.layer.clone(),
            kind: raw.kind,
            weight,
            img_width: raw.img_width,
            img_height: raw.img_height,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    objective: RawObjective,
}

#[derive(Debug, Deserialize)]
struct RawObjective {
    #[serde(default)]
    loss: LossHead,
    #[serde(default = "default_layout")]
    layout: String,
    #[serde(default = "default_parallel_threshold")]
    parallel_threshold: usize,
    #[serde(default)]
    regularizers: Vec<RawRegularizer>,
}

impl Default for RawObjective {
    fn default() -> Self {
        Self {
            loss: LossHead::default(),
            layout: default_layout(),
            parallel_threshold: default_parallel_threshold(),
            regularizers: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRegularizer {
    layer: String,
    kind: RegularizerKind,
    #[serde(default)]
    weight: Option<f32>,
    #[serde(default)]
    img_width: Option<usize>,
    #[serde(default)]
    img_height: Option<usize>,
}

fn default_layout() -> String {
    DataLayout::default().as_str().to_string()
}

fn default_parallel_threshold() -> usize {
    DEFAULT_PARALLEL_THRESHOLD
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {}", err),
            ConfigError::Parse(err) => write!(f, "Parse error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}
