use serde::{Deserialize, Serialize};

use crate::error::{PreprocessError, Result};
use crate::occupancy::{self, ScanMode, DEFAULT_BLOCK_SIZE};
use crate::presets::PresetId;
use crate::spline::InterpolationKind;
use crate::transfer::{Precision, TransferFunctionTable, TransferPoints};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipMethod {
    /// Occupancy grid only, the renderer steps one block at a time.
    Uniform,
    /// Occupancy grid plus Chebyshev distance field.
    #[default]
    Chebyshev,
}

/// Where the transfer function control points come from.
///
/// Custom points are taken as given, in the index domain of the configured
/// precision. Presets are rescaled to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferSource {
    Preset(PresetId),
    Custom(TransferPoints),
}

impl Default for TransferSource {
    fn default() -> Self {
        Self::Preset(PresetId::SoftTissue)
    }
}

impl TransferSource {
    pub fn build_table(
        &self,
        precision: Precision,
        kind: InterpolationKind,
    ) -> Result<TransferFunctionTable> {
        match self {
            TransferSource::Preset(preset) => preset.build(precision, kind),
            TransferSource::Custom(points) => points.build(precision, kind),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreprocessConfig {
    pub block_size: u32,
    pub precision: Precision,
    pub interpolation: InterpolationKind,
    pub transfer: TransferSource,
    pub skip_method: SkipMethod,
    pub scan_mode: ScanMode,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            precision: Precision::default(),
            interpolation: InterpolationKind::default(),
            transfer: TransferSource::default(),
            skip_method: SkipMethod::default(),
            scan_mode: ScanMode::default(),
        }
    }
}

impl PreprocessConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PreprocessError::InvalidConfig { message: e.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        occupancy::validate_block_size(self.block_size)
    }

    /// Whether `other` yields the same transfer table.
    pub fn same_table_as(&self, other: &Self) -> bool {
        self.precision == other.precision
            && self.interpolation == other.interpolation
            && self.transfer == other.transfer
    }

    pub fn build_table(&self) -> Result<TransferFunctionTable> {
        self.transfer.build_table(self.precision, self.interpolation)
    }
}
