mod utils;

pub mod block_range;
pub mod buf3d;
pub mod config;
pub mod distance;
pub mod error;
pub mod grid;
pub mod occupancy;
pub mod parallel;
pub mod pipeline;
pub mod presets;
pub mod spline;
pub mod synthetic;
pub mod transfer;
pub mod volume;
pub mod wasm;

use wasm_bindgen::prelude::*;

pub use config::{PreprocessConfig, SkipMethod, TransferSource};
pub use distance::{Axis, DistanceField, DistanceFieldBuilder, MAX_DISTANCE};
pub use error::{PreprocessError, Result};
pub use grid::Grid;
pub use occupancy::{OccupancyGrid, ScanMode};
pub use pipeline::{CancelToken, Preprocessor, ProgressEvent, ProgressSink, SkipStructure, Stage};
pub use presets::PresetId;
pub use spline::{InterpolationKind, Spline, SplineError};
pub use transfer::{AlphaPoint, ColorPoint, Precision, TransferFunctionTable, TransferPoints};
pub use volume::{Sample, Volume};

#[wasm_bindgen]
pub fn init() {
    utils::set_panic_hook();
    utils::set_console_logger();
}
