use std::error::Error;

use glam::UVec3;
use js_sys::{Array, Uint8Array};
use wasm_bindgen::prelude::*;
use web_time::Instant;

use crate::config::PreprocessConfig;
use crate::error::PreprocessError;
use crate::grid::Grid;
use crate::occupancy::SUGGESTED_BLOCK_SIZES;
use crate::pipeline::{Preprocessor, SkipStructure};
use crate::presets::PresetId;
use crate::synthetic::{self, GeneratedDataType};
use crate::volume::Volume;

#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildErrorType {
    ControlPoints,
    BlockSize,
    Precision,
    Volume,
    Config,
    Cancelled,
}

#[wasm_bindgen]
#[derive(Debug)]
pub struct BuildError(BuildErrorType, Option<String>);

#[wasm_bindgen]
impl BuildError {
    #[wasm_bindgen(getter)]
    pub fn kind(&self) -> BuildErrorType {
        self.0
    }

    #[wasm_bindgen(getter)]
    pub fn message(&self) -> String {
        format!("{:?}: {}", self.0, self.1.as_deref().unwrap_or("No Message Specified"))
    }
}

impl From<PreprocessError> for BuildError {
    fn from(error: PreprocessError) -> Self {
        let kind = match &error {
            PreprocessError::ControlPoints { .. } => BuildErrorType::ControlPoints,
            PreprocessError::InvalidBlockSize { .. } => BuildErrorType::BlockSize,
            PreprocessError::InvalidPrecision { .. }
            | PreprocessError::PrecisionMismatch { .. } => BuildErrorType::Precision,
            PreprocessError::VolumeSizeMismatch { .. } | PreprocessError::EmptyVolume { .. } => {
                BuildErrorType::Volume
            }
            PreprocessError::UnknownPreset { .. } | PreprocessError::InvalidConfig { .. } => {
                BuildErrorType::Config
            }
            PreprocessError::Cancelled { .. } => BuildErrorType::Cancelled,
        };

        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(&format!(": {cause}"));
            source = cause.source();
        }
        BuildError(kind, Some(message))
    }
}

#[wasm_bindgen]
pub struct SkipStructureHandle {
    inner: SkipStructure,
}

#[wasm_bindgen]
impl SkipStructureHandle {
    pub fn blocks_x(&self) -> u32 {
        self.inner.occupancy().dims().x
    }
    pub fn blocks_y(&self) -> u32 {
        self.inner.occupancy().dims().y
    }
    pub fn blocks_z(&self) -> u32 {
        self.inner.occupancy().dims().z
    }

    pub fn block_size(&self) -> u32 {
        self.inner.occupancy().block_size()
    }
    pub fn precision(&self) -> u32 {
        self.inner.table().precision().get()
    }
    pub fn occupied_blocks(&self) -> u32 {
        self.inner.occupancy().occupied_count() as u32
    }

    /// `precision` RGBA8 entries.
    pub fn table_data(&self) -> Uint8Array {
        Uint8Array::from(self.inner.table().as_bytes())
    }
    pub fn occupancy_data(&self) -> Uint8Array {
        Uint8Array::from(self.inner.occupancy().data())
    }
    pub fn distance_data(&self) -> Option<Uint8Array> {
        self.inner.distance_field().map(|field| Uint8Array::from(field.data()))
    }
}

fn parse_config(config: JsValue) -> crate::error::Result<PreprocessConfig> {
    if config.is_undefined() || config.is_null() {
        return Ok(PreprocessConfig::default());
    }
    serde_wasm_bindgen::from_value(config)
        .map_err(|e| PreprocessError::InvalidConfig { message: e.to_string() })
}

fn build(volume: &impl Grid, config: JsValue) -> Result<SkipStructureHandle, BuildError> {
    log::info!("Starting skip structure construction");
    let start = Instant::now();
    let preprocessor = Preprocessor::new(parse_config(config)?)?;
    let inner = preprocessor.build(volume)?;
    log::info!(
        "Skip structure construction took {:.1} ms",
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(SkipStructureHandle { inner })
}

/// Builds from 8-bit samples. `config` may be `undefined` for the defaults.
#[wasm_bindgen]
pub fn build_skip_structure_u8(
    width: u32,
    height: u32,
    depth: u32,
    samples: &[u8],
    config: JsValue,
) -> Result<SkipStructureHandle, BuildError> {
    let volume = Volume::<u8>::from_bytes(UVec3::new(width, height, depth), samples)?;
    build(&volume, config)
}

/// Builds from 16-bit samples passed as their little-endian bytes.
#[wasm_bindgen]
pub fn build_skip_structure_u16(
    width: u32,
    height: u32,
    depth: u32,
    samples: &[u8],
    config: JsValue,
) -> Result<SkipStructureHandle, BuildError> {
    let volume = Volume::<u16>::from_bytes(UVec3::new(width, height, depth), samples)?;
    log::info!("Grid Resolution: {} {} {}", width, height, depth);
    build(&volume, config)
}

#[wasm_bindgen]
pub fn preset_names() -> Array {
    PresetId::ALL.iter().map(|preset| JsValue::from_str(preset.name())).collect()
}

#[wasm_bindgen]
pub fn suggested_block_sizes() -> Vec<u32> {
    SUGGESTED_BLOCK_SIZES.to_vec()
}

#[wasm_bindgen]
pub fn generate_volume(
    width: u32,
    height: u32,
    depth: u32,
    how: GeneratedDataType,
) -> Result<Uint8Array, BuildError> {
    let volume = synthetic::generate(UVec3::new(width, height, depth), how)?;
    Ok(Uint8Array::from(volume.samples()))
}
