//! Checkpoint trait and error handling for deterministic configuration persistence.
//!
//! [`Checkpointable`] fixes a versioned binary contract so an objective saved
//! alongside model weights can be restored exactly. Implementations store a
//! version header with the payload and reject incompatible files on load.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::config::ObjectiveConfig;
use crate::error::LossError;
use crate::regularizer::Regularizer;

/// Schema version written by [`ObjectiveConfig::save_checkpoint`].
pub const OBJECTIVE_CHECKPOINT_VERSION: u32 = 1;

/// Errors that can occur while saving or loading checkpoints.
#[derive(Debug)]
pub enum CheckpointError {
    /// Underlying I/O failure while reading or writing checkpoint files.
    Io(std::io::Error),
    /// Serialization or deserialization error from the binary codec.
    Serialization(bincode::Error),
    /// The checkpoint file was well formed but produced an incompatible schema version.
    VersionMismatch { expected: u32, found: u32 },
    /// The checkpoint file did not match the expected structure.
    InvalidFormat(String),
    /// A restored regularizer record failed validation.
    Loss(LossError),
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointError::Io(err) => write!(f, "I/O error while accessing checkpoint: {err}"),
            CheckpointError::Serialization(err) => {
                write!(f, "Failed to (de)serialize checkpoint payload: {err}")
            }
            CheckpointError::VersionMismatch { expected, found } => write!(
                f,
                "Checkpoint version mismatch: expected {expected}, found {found}",
            ),
            CheckpointError::InvalidFormat(msg) => {
                write!(f, "Checkpoint file has invalid structure: {msg}")
            }
            CheckpointError::Loss(err) => write!(f, "Checkpoint holds an invalid regularizer: {err}"),
        }
    }
}

impl std::error::Error for CheckpointError {}

impl From<std::io::Error> for CheckpointError {
    fn from(err: std::io::Error) -> Self {
        CheckpointError::Io(err)
    }
}

impl From<bincode::Error> for CheckpointError {
    fn from(err: bincode::Error) -> Self {
        CheckpointError::Serialization(err)
    }
}

impl From<LossError> for CheckpointError {
    fn from(err: LossError) -> Self {
        CheckpointError::Loss(err)
    }
}

/// Deterministic binary codec options shared by all checkpoint implementations.
fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_little_endian()
}

/// Components that support deterministic persistence implement this trait.
pub trait Checkpointable: Sized {
    /// Save the current state to `path` using the deterministic codec.
    fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError>;

    /// Load a state from `path`.
    fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError>;

    /// Utility for writing a serializable snapshot with the shared codec.
    fn write_snapshot<P, T>(snapshot: &T, path: P) -> Result<(), CheckpointError>
    where
        P: AsRef<Path>,
        T: serde::Serialize,
    {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        codec().serialize_into(&mut writer, snapshot)?;
        writer.flush()?;
        Ok(())
    }

    /// Utility for reading a serializable snapshot with the shared codec.
    fn read_snapshot<P, T>(path: P) -> Result<T, CheckpointError>
    where
        P: AsRef<Path>,
        T: serde::de::DeserializeOwned,
    {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Ok(codec().deserialize_from(&mut reader)?)
    }
}

#[derive(Serialize, Deserialize)]
struct ObjectiveSnapshot {
    version: u32,
    config: ObjectiveConfig,
}

impl Checkpointable for ObjectiveConfig {
    fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let snapshot = ObjectiveSnapshot {
            version: OBJECTIVE_CHECKPOINT_VERSION,
            config: self.clone(),
        };
        Self::write_snapshot(&snapshot, path)
    }

    fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let snapshot: ObjectiveSnapshot = Self::read_snapshot(path)?;
        if snapshot.version != OBJECTIVE_CHECKPOINT_VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: OBJECTIVE_CHECKPOINT_VERSION,
                found: snapshot.version,
            });
        }

        let config = snapshot.config;
        if config.regularizers.iter().any(|spec| spec.layer.is_empty()) {
            return Err(CheckpointError::InvalidFormat(
                "regularizer attached to an unnamed layer".into(),
            ));
        }
        for spec in &config.regularizers {
            Regularizer::from_config(&spec.to_record(config.layout))?;
        }
        Ok(config)
    }
}
