use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glam::UVec3;
use web_time::Instant;

use crate::config::{PreprocessConfig, SkipMethod};
use crate::distance::{Axis, DistanceField, DistanceFieldBuilder};
use crate::error::{PreprocessError, Result};
use crate::grid::Grid;
use crate::occupancy::OccupancyGrid;
use crate::transfer::TransferFunctionTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    BuildTable,
    Classify,
    DistancePass(Axis),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::BuildTable => f.write_str("transfer table"),
            Stage::Classify => f.write_str("block classification"),
            Stage::DistancePass(axis) => write!(f, "distance pass {axis}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    StageStarted { stage: Stage },
    StageFinished { stage: Stage, elapsed_ms: f64 },
}

pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Shared flag checked between stages.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Identity of the volume a structure was classified from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct VolumeSignature {
    extent: UVec3,
    num_voxels: usize,
    range: (u32, u32),
    content_hash: u64,
}

impl VolumeSignature {
    fn of<G: Grid>(volume: &G) -> Self {
        Self {
            extent: volume.index_extent(),
            num_voxels: volume.num_voxels(),
            range: volume.minorant_majorant(),
            content_hash: volume.content_hash(),
        }
    }
}

/// Everything a renderer needs for one volume under one configuration.
///
/// The parts are immutable and shared; a rebuild produces a new structure that
/// can be swapped in once complete.
#[derive(Clone, Debug)]
pub struct SkipStructure {
    config: PreprocessConfig,
    volume: VolumeSignature,
    table: Arc<TransferFunctionTable>,
    occupancy: Arc<OccupancyGrid>,
    distance_field: Option<Arc<DistanceField>>,
}

impl SkipStructure {
    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    pub fn table(&self) -> &Arc<TransferFunctionTable> {
        &self.table
    }

    pub fn occupancy(&self) -> &Arc<OccupancyGrid> {
        &self.occupancy
    }

    /// Present when the structure was built with [`SkipMethod::Chebyshev`].
    pub fn distance_field(&self) -> Option<&Arc<DistanceField>> {
        self.distance_field.as_ref()
    }
}

pub struct Preprocessor {
    config: PreprocessConfig,
    progress: Option<ProgressSink>,
    cancel: CancelToken,
}

impl fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preprocessor")
            .field("config", &self.config)
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl Preprocessor {
    pub fn new(config: PreprocessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, progress: None, cancel: CancelToken::default() })
    }

    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    pub fn build<G: Grid>(&self, volume: &G) -> Result<SkipStructure> {
        self.rebuild(None, volume)
    }

    /// Builds a structure for `volume`, reusing whatever parts of `previous`
    /// the current configuration leaves unchanged.
    ///
    /// The transfer table only depends on the configuration. Block data is
    /// reused only when `volume` has the same extent and contents as the volume
    /// `previous` was built from.
    pub fn rebuild<G: Grid>(
        &self,
        previous: Option<&SkipStructure>,
        volume: &G,
    ) -> Result<SkipStructure> {
        let start = Instant::now();
        let config = &self.config;
        let signature = VolumeSignature::of(volume);

        let reused_table = previous
            .filter(|prev| prev.config.same_table_as(config))
            .map(|prev| &prev.table);
        let table = match reused_table {
            Some(table) => Arc::clone(table),
            None => Arc::new(self.run_stage(Stage::BuildTable, || config.build_table())?),
        };

        let same_volume = previous.is_some_and(|prev| prev.volume == signature);
        if previous.is_some() && !same_volume {
            log::debug!("volume changed, reclassifying all blocks");
        }
        let reused_occupancy = previous
            .filter(|prev| {
                same_volume && reused_table.is_some() && prev.config.block_size == config.block_size
            })
            .map(|prev| &prev.occupancy);
        let occupancy = match reused_occupancy {
            Some(occupancy) => Arc::clone(occupancy),
            None => Arc::new(self.run_stage(Stage::Classify, || {
                OccupancyGrid::classify(volume, &table, config.block_size, config.scan_mode)
            })?),
        };

        let distance_field = match config.skip_method {
            SkipMethod::Uniform => None,
            SkipMethod::Chebyshev => {
                let reused = previous
                    .filter(|_| reused_occupancy.is_some())
                    .and_then(|prev| prev.distance_field.as_ref());
                match reused {
                    Some(field) => Some(Arc::clone(field)),
                    None => Some(Arc::new(self.build_distance_field(&occupancy)?)),
                }
            }
        };

        log::info!(
            "skip structure ready in {:.1} ms: {} blocks ({} occupied), table of {} entries",
            start.elapsed().as_secs_f64() * 1000.0,
            occupancy.data().len(),
            occupancy.occupied_count(),
            table.len()
        );

        Ok(SkipStructure {
            config: config.clone(),
            volume: signature,
            table,
            occupancy,
            distance_field,
        })
    }

    fn build_distance_field(&self, occupancy: &OccupancyGrid) -> Result<DistanceField> {
        let mut builder = DistanceFieldBuilder::new(occupancy);
        while let Some(axis) = builder.next_axis() {
            self.run_stage(Stage::DistancePass(axis), || Ok(builder.run_next_pass()))?;
        }
        Ok(builder.finish())
    }

    fn run_stage<T>(&self, stage: Stage, work: impl FnOnce() -> Result<T>) -> Result<T> {
        if self.cancel.is_cancelled() {
            log::debug!("cancelled before {stage}");
            return Err(PreprocessError::Cancelled { stage });
        }
        self.emit(ProgressEvent::StageStarted { stage });
        let start = Instant::now();
        let output = work()?;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        log::debug!("{stage} took {elapsed_ms:.2} ms");
        self.emit(ProgressEvent::StageFinished { stage, elapsed_ms });
        Ok(output)
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(sink) = &self.progress {
            sink(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::TransferSource;
    use crate::occupancy::ScanMode;
    use crate::presets::PresetId;
    use crate::spline::InterpolationKind;
    use crate::volume::Volume;

    fn shell_volume() -> Volume<u8> {
        let dims = UVec3::splat(32);
        let samples = (0..32 * 32 * 32)
            .map(|i: u32| {
                let p = UVec3::new(i % 32, (i / 32) % 32, i / 1024).as_vec3() - 15.5;
                if p.length() < 10.0 { 200 } else { 0 }
            })
            .collect();
        Volume::new(dims, samples).unwrap()
    }

    fn recorded_stages(config: PreprocessConfig, volume: &Volume<u8>) -> Vec<ProgressEvent> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink_events = Arc::clone(&events);
        let sink: ProgressSink =
            Arc::new(move |event: ProgressEvent| sink_events.lock().unwrap().push(event));
        let preprocessor = Preprocessor::new(config).unwrap().with_progress(sink);
        preprocessor.build(volume).unwrap();
        let events = events.lock().unwrap().clone();
        events
    }

    fn started(events: &[ProgressEvent]) -> Vec<Stage> {
        events
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::StageStarted { stage } => Some(*stage),
                ProgressEvent::StageFinished { .. } => None,
            })
            .collect()
    }

    #[test]
    fn stages_run_in_pipeline_order() {
        let events = recorded_stages(PreprocessConfig::default(), &shell_volume());
        assert_eq!(
            started(&events),
            [
                Stage::BuildTable,
                Stage::Classify,
                Stage::DistancePass(Axis::X),
                Stage::DistancePass(Axis::Y),
                Stage::DistancePass(Axis::Z),
            ]
        );
        assert_eq!(events.len(), 10);
        assert!(matches!(events[1], ProgressEvent::StageFinished { stage: Stage::BuildTable, .. }));
    }

    #[test]
    fn uniform_method_skips_distance_field() {
        let config = PreprocessConfig { skip_method: SkipMethod::Uniform, ..Default::default() };
        let volume = shell_volume();
        assert_eq!(
            started(&recorded_stages(config.clone(), &volume)),
            [Stage::BuildTable, Stage::Classify]
        );
        let structure = Preprocessor::new(config).unwrap().build(&volume).unwrap();
        assert!(structure.distance_field().is_none());
    }

    #[test]
    fn cancelled_build_stops_before_next_stage() {
        let token = CancelToken::new();
        token.cancel();
        let preprocessor =
            Preprocessor::new(PreprocessConfig::default()).unwrap().with_cancel_token(token);
        let err = preprocessor.build(&shell_volume()).unwrap_err();
        assert!(matches!(err, PreprocessError::Cancelled { stage: Stage::BuildTable }));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = PreprocessConfig { block_size: 0, ..Default::default() };
        assert!(matches!(Preprocessor::new(config), Err(PreprocessError::InvalidBlockSize { .. })));
    }

    #[test]
    fn rebuild_reuses_unchanged_parts() {
        let volume = shell_volume();
        let base = PreprocessConfig {
            transfer: TransferSource::Preset(PresetId::Bone),
            ..Default::default()
        };
        let first = Preprocessor::new(base.clone()).unwrap().build(&volume).unwrap();

        // scan mode only changes how blocks are scanned, not the result
        let exhaustive = PreprocessConfig { scan_mode: ScanMode::Exhaustive, ..base.clone() };
        let same = Preprocessor::new(exhaustive)
            .unwrap()
            .rebuild(Some(&first), &volume)
            .unwrap();
        assert!(Arc::ptr_eq(same.table(), first.table()));
        assert!(Arc::ptr_eq(same.occupancy(), first.occupancy()));
        assert!(Arc::ptr_eq(same.distance_field().unwrap(), first.distance_field().unwrap()));

        let coarser = Preprocessor::new(PreprocessConfig { block_size: 16, ..base.clone() })
            .unwrap()
            .rebuild(Some(&first), &volume)
            .unwrap();
        assert!(Arc::ptr_eq(coarser.table(), first.table()));
        assert!(!Arc::ptr_eq(coarser.occupancy(), first.occupancy()));
        assert_eq!(coarser.occupancy().dims(), UVec3::splat(2));

        let linear = PreprocessConfig { interpolation: InterpolationKind::Linear, ..base };
        let relinearised = Preprocessor::new(linear)
            .unwrap()
            .rebuild(Some(&first), &volume)
            .unwrap();
        assert!(!Arc::ptr_eq(relinearised.table(), first.table()));
        assert!(!Arc::ptr_eq(relinearised.occupancy(), first.occupancy()));
    }

    #[test]
    fn rebuild_reclassifies_a_different_volume() {
        let config = PreprocessConfig {
            transfer: TransferSource::Preset(PresetId::Linear),
            ..Default::default()
        };
        let preprocessor = Preprocessor::new(config).unwrap();
        let empty = Volume::new(UVec3::splat(16), vec![0u8; 16 * 16 * 16]).unwrap();
        let first = preprocessor.build(&empty).unwrap();
        assert_eq!(first.occupancy().occupied_count(), 0);

        let full = Volume::new(UVec3::splat(32), vec![255u8; 32 * 32 * 32]).unwrap();
        let larger = preprocessor.rebuild(Some(&first), &full).unwrap();
        assert!(Arc::ptr_eq(larger.table(), first.table()));
        assert_eq!(larger.occupancy().dims(), UVec3::splat(4));
        assert_eq!(larger.occupancy().occupied_count(), 64);
        assert!(larger.distance_field().unwrap().data().iter().all(|&d| d == 0));

        // same extent, different contents
        let mut samples = vec![0u8; 16 * 16 * 16];
        samples[0] = 255;
        let dotted = Volume::new(UVec3::splat(16), samples).unwrap();
        let refreshed = preprocessor.rebuild(Some(&first), &dotted).unwrap();
        assert!(!Arc::ptr_eq(refreshed.occupancy(), first.occupancy()));
        assert!(refreshed.occupancy().is_occupied(UVec3::ZERO));
        assert_eq!(refreshed.distance_field().unwrap().get(UVec3::ONE), Some(1));
    }

    #[test]
    fn rebuild_adds_distance_field_when_switching_method() {
        let volume = shell_volume();
        let uniform = PreprocessConfig { skip_method: SkipMethod::Uniform, ..Default::default() };
        let first = Preprocessor::new(uniform).unwrap().build(&volume).unwrap();
        let second = Preprocessor::new(PreprocessConfig::default())
            .unwrap()
            .rebuild(Some(&first), &volume)
            .unwrap();
        assert!(Arc::ptr_eq(second.occupancy(), first.occupancy()));
        assert!(second.distance_field().is_some());
    }
}
