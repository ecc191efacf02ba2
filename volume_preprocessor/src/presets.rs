//! Named transfer functions.
//!
//! Presets are plain control point data authored against the 8-bit density
//! domain. [`PresetId::points`] rescales them to the requested precision so a
//! preset covers the same relative density range at every table resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PreprocessError, Result};
use crate::spline::InterpolationKind;
use crate::transfer::{AlphaPoint, ColorPoint, Precision, TransferFunctionTable, TransferPoints};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetId {
    Linear,
    SoftTissue,
    Bone,
    Ultrasound,
}

// (density, r, g, b)
type ColorRow = (f64, f64, f64, f64);
// (density, a)
type AlphaRow = (f64, f64);

const LINEAR_COLOR: &[ColorRow] = &[(0.0, 0.0, 0.0, 0.0), (255.0, 255.0, 255.0, 255.0)];
const LINEAR_ALPHA: &[AlphaRow] = &[(0.0, 0.0), (255.0, 255.0)];

const SOFT_TISSUE_COLOR: &[ColorRow] = &[
    (0.0, 0.0, 0.0, 0.0),
    (20.0, 42.0, 0.0, 0.0),
    (30.0, 101.0, 36.0, 19.0),
    (40.0, 197.0, 153.0, 95.0),
    (220.0, 216.0, 213.0, 201.0),
    (255.0, 255.0, 255.0, 255.0),
];
const SOFT_TISSUE_ALPHA: &[AlphaRow] = &[
    (0.0, 0.0),
    (20.0, 0.0),
    (40.0, 38.0),
    (120.0, 77.0),
    (220.0, 97.0),
    (255.0, 128.0),
];

const BONE_COLOR: &[ColorRow] = &[
    (0.0, 40.0, 40.0, 40.0),
    (40.0, 40.0, 40.0, 40.0),
    (80.0, 40.0, 40.0, 40.0),
    (82.0, 255.0, 255.0, 255.0),
    (255.0, 255.0, 255.0, 255.0),
];
const BONE_ALPHA: &[AlphaRow] = &[
    (0.0, 0.0),
    (40.0, 0.0),
    (60.0, 51.0),
    (63.0, 13.0),
    (80.0, 0.0),
    (82.0, 230.0),
    (255.0, 255.0),
];

const ULTRASOUND_COLOR: &[ColorRow] = &[
    (0.0, 0.0, 0.0, 0.0),
    (30.0, 60.0, 30.0, 10.0),
    (120.0, 220.0, 150.0, 70.0),
    (255.0, 255.0, 240.0, 200.0),
];
const ULTRASOUND_ALPHA: &[AlphaRow] = &[
    (0.0, 0.0),
    (20.0, 0.0),
    (30.0, 0.0),
    (90.0, 40.0),
    (180.0, 150.0),
    (255.0, 220.0),
];

impl PresetId {
    pub const ALL: [PresetId; 4] =
        [PresetId::Linear, PresetId::SoftTissue, PresetId::Bone, PresetId::Ultrasound];

    pub fn name(self) -> &'static str {
        match self {
            PresetId::Linear => "linear",
            PresetId::SoftTissue => "soft_tissue",
            PresetId::Bone => "bone",
            PresetId::Ultrasound => "ultrasound",
        }
    }

    fn rows(self) -> (&'static [ColorRow], &'static [AlphaRow]) {
        match self {
            PresetId::Linear => (LINEAR_COLOR, LINEAR_ALPHA),
            PresetId::SoftTissue => (SOFT_TISSUE_COLOR, SOFT_TISSUE_ALPHA),
            PresetId::Bone => (BONE_COLOR, BONE_ALPHA),
            PresetId::Ultrasound => (ULTRASOUND_COLOR, ULTRASOUND_ALPHA),
        }
    }

    /// Control points in the 8-bit density domain.
    pub fn standard_points(self) -> TransferPoints {
        let (color, alpha) = self.rows();
        TransferPoints {
            color: color.iter().map(|&(d, r, g, b)| ColorPoint::new(d, r, g, b)).collect(),
            alpha: alpha.iter().map(|&(d, a)| AlphaPoint::new(d, a)).collect(),
        }
    }

    /// Control points scaled to the index domain of `precision`.
    pub fn points(self, precision: Precision) -> TransferPoints {
        self.standard_points().rescaled(precision.scale_from_standard())
    }

    pub fn build(
        self,
        precision: Precision,
        kind: InterpolationKind,
    ) -> Result<TransferFunctionTable> {
        self.points(precision).build(precision, kind)
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PresetId {
    type Err = PreprocessError;

    fn from_str(name: &str) -> Result<Self> {
        PresetId::ALL
            .into_iter()
            .find(|preset| preset.name() == name)
            .ok_or_else(|| PreprocessError::UnknownPreset { name: name.to_string() })
    }
}
