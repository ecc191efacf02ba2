use glam::UVec3;
use thiserror::Error;

use crate::pipeline::Stage;
use crate::spline::SplineError;
use crate::transfer::Channel;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("invalid {channel} control points")]
    ControlPoints {
        channel: Channel,
        #[source]
        source: SplineError,
    },

    #[error("block size must be at least 1, got {block_size}")]
    InvalidBlockSize { block_size: u32 },

    #[error("precision must be a power of two between 2 and 65536, got {precision}")]
    InvalidPrecision { precision: u32 },

    #[error("a table of precision {precision} cannot be indexed by sample value {max_sample}")]
    PrecisionMismatch { precision: u32, max_sample: u32 },

    #[error("a volume of {dims} needs {expected} samples, got {actual}")]
    VolumeSizeMismatch {
        dims: UVec3,
        expected: usize,
        actual: usize,
    },

    #[error("volume dimensions must be non-zero, got {dims}")]
    EmptyVolume { dims: UVec3 },

    #[error("unknown transfer function preset `{name}`")]
    UnknownPreset { name: String },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("cancelled before {stage}")]
    Cancelled { stage: Stage },
}

pub type Result<T> = std::result::Result<T, PreprocessError>;
