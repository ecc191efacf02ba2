use glam::UVec3;
use serde::{Deserialize, Serialize};

use crate::buf3d::{coord_of, div_round_up, Buf3D};
use crate::error::{PreprocessError, Result};
use crate::grid::Grid;
use crate::parallel;
use crate::transfer::TransferFunctionTable;

pub const EMPTY: u8 = 0;
pub const OCCUPIED: u8 = 255;

pub const DEFAULT_BLOCK_SIZE: u32 = 8;
/// Block sizes offered to users, coarse grids skip more but resolve less.
pub const SUGGESTED_BLOCK_SIZES: [u32; 4] = [8, 16, 32, 64];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Stop scanning a block at its first visible voxel.
    #[default]
    EarlyExit,
    /// Visit every voxel of every block.
    Exhaustive,
}

/// One byte per block: [`EMPTY`] when every voxel maps to zero alpha, [`OCCUPIED`] otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancyGrid {
    block_size: u32,
    cells: Buf3D<u8>,
}

pub fn block_count(extent: UVec3, block_size: u32) -> UVec3 {
    div_round_up(extent, UVec3::splat(block_size))
}

pub(crate) fn validate_block_size(block_size: u32) -> Result<()> {
    if block_size == 0 {
        return Err(PreprocessError::InvalidBlockSize { block_size });
    }
    Ok(())
}

/// Voxel range `[min, max)` of a block, clipped to the volume.
pub(crate) fn block_bounds(block: UVec3, block_size: u32, extent: UVec3) -> (UVec3, UVec3) {
    let min = block.saturating_mul(UVec3::splat(block_size)).min(extent);
    let max = min.saturating_add(UVec3::splat(block_size)).min(extent);
    (min, max)
}

pub(crate) fn check_precision(table: &TransferFunctionTable, max_sample: u32) -> Result<()> {
    if max_sample as usize >= table.len() {
        return Err(PreprocessError::PrecisionMismatch {
            precision: table.precision().get(),
            max_sample,
        });
    }
    Ok(())
}

impl OccupancyGrid {
    pub fn classify<G: Grid>(
        volume: &G,
        table: &TransferFunctionTable,
        block_size: u32,
        mode: ScanMode,
    ) -> Result<Self> {
        validate_block_size(block_size)?;
        let (_, max_sample) = volume.minorant_majorant();
        check_precision(table, max_sample)?;

        let extent = volume.index_extent();
        let mut cells = Buf3D::new(block_count(extent, block_size));
        let stride = cells.stride;

        parallel::for_each_indexed_mut(&mut cells.data, |index, cell| {
            let (min, max) = block_bounds(coord_of(stride, index), block_size, extent);
            let occupied = match mode {
                ScanMode::EarlyExit => any_visible(volume, table, min, max),
                ScanMode::Exhaustive => count_visible(volume, table, min, max) > 0,
            };
            *cell = if occupied { OCCUPIED } else { EMPTY };
        });

        log::debug!(
            "classified {} voxels ({} bytes) into {} blocks of size {block_size}, {} occupied",
            volume.num_voxels(),
            volume.size_bytes(),
            cells.len(),
            cells.data.iter().filter(|&&cell| cell != EMPTY).count()
        );
        Ok(Self { block_size, cells })
    }

    /// Wraps precomputed block flags; any non-zero byte counts as occupied.
    pub fn from_blocks(dims: UVec3, blocks: Vec<u8>, block_size: u32) -> Result<Self> {
        validate_block_size(block_size)?;
        let actual = blocks.len();
        let cells = Buf3D::from_data(dims, blocks).ok_or(PreprocessError::VolumeSizeMismatch {
            dims,
            expected: crate::buf3d::cell_count(dims),
            actual,
        })?;
        let cells = cells.map(|&cell| if cell == EMPTY { EMPTY } else { OCCUPIED });
        Ok(Self::from_cells(block_size, cells))
    }

    pub(crate) fn from_cells(block_size: u32, cells: Buf3D<u8>) -> Self {
        Self { block_size, cells }
    }

    pub fn dims(&self) -> UVec3 {
        self.cells.stride
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn get(&self, block: UVec3) -> Option<u8> {
        self.cells.get(block).copied()
    }

    pub fn is_occupied(&self, block: UVec3) -> bool {
        self.get(block).is_some_and(|cell| cell != EMPTY)
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.data.iter().filter(|&&cell| cell != EMPTY).count()
    }

    pub fn data(&self) -> &[u8] {
        &self.cells.data
    }

    pub fn cells(&self) -> &Buf3D<u8> {
        &self.cells
    }
}

fn any_visible<G: Grid>(volume: &G, table: &TransferFunctionTable, min: UVec3, max: UVec3) -> bool {
    for z in min.z..max.z {
        for y in min.y..max.y {
            for x in min.x..max.x {
                if table.alpha(volume.lookup(UVec3::new(x, y, z)) as usize) != 0 {
                    return true;
                }
            }
        }
    }
    false
}

fn count_visible<G: Grid>(
    volume: &G,
    table: &TransferFunctionTable,
    min: UVec3,
    max: UVec3,
) -> usize {
    let mut visible = 0;
    for z in min.z..max.z {
        for y in min.y..max.y {
            for x in min.x..max.x {
                let alpha = table.alpha(volume.lookup(UVec3::new(x, y, z)) as usize);
                visible += usize::from(alpha != 0);
            }
        }
    }
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spline::InterpolationKind;
    use crate::transfer::{AlphaPoint, ColorPoint, Precision};
    use crate::volume::Volume;

    /// alpha 0 for densities up to 100, 255 above
    fn threshold_table() -> TransferFunctionTable {
        TransferFunctionTable::build(
            &[ColorPoint::new(0.0, 0.0, 0.0, 0.0), ColorPoint::new(255.0, 255.0, 255.0, 255.0)],
            &[
                AlphaPoint::new(0.0, 0.0),
                AlphaPoint::new(100.0, 0.0),
                AlphaPoint::new(101.0, 255.0),
                AlphaPoint::new(255.0, 255.0),
            ],
            Precision::STANDARD,
            InterpolationKind::Linear,
        )
        .unwrap()
    }

    fn volume_from(dims: UVec3, f: impl Fn(UVec3) -> u8) -> Volume<u8> {
        let buf: Buf3D<u8> = Buf3D::new(dims);
        let samples = (0..buf.len()).map(|i| f(buf.calculate_coord(i))).collect();
        Volume::new(dims, samples).unwrap()
    }

    #[test]
    fn marks_exactly_the_blocks_inside_the_transparent_region() {
        // x < 20 is transparent, the rest visible
        let volume = volume_from(UVec3::new(32, 16, 16), |p| if p.x < 20 { 50 } else { 200 });
        let grid =
            OccupancyGrid::classify(&volume, &threshold_table(), 8, ScanMode::EarlyExit).unwrap();
        assert_eq!(grid.dims(), UVec3::new(4, 2, 2));
        for z in 0..2 {
            for y in 0..2 {
                // blocks 0 and 1 cover x in [0, 16), block 2 straddles x = 20
                assert_eq!(grid.get(UVec3::new(0, y, z)), Some(EMPTY));
                assert_eq!(grid.get(UVec3::new(1, y, z)), Some(EMPTY));
                assert_eq!(grid.get(UVec3::new(2, y, z)), Some(OCCUPIED));
                assert_eq!(grid.get(UVec3::new(3, y, z)), Some(OCCUPIED));
            }
        }
        assert_eq!(grid.occupied_count(), 8);
    }

    #[test]
    fn early_exit_matches_exhaustive_scan() {
        let volume = volume_from(UVec3::new(37, 29, 23), |p| {
            if (p.x * 7 + p.y * 13 + p.z * 31) % 97 == 0 { 180 } else { 30 }
        });
        let table = threshold_table();
        for block_size in [1, 3, 8, 16, 64] {
            let fast =
                OccupancyGrid::classify(&volume, &table, block_size, ScanMode::EarlyExit).unwrap();
            let full =
                OccupancyGrid::classify(&volume, &table, block_size, ScanMode::Exhaustive).unwrap();
            assert_eq!(fast, full, "block size {block_size}");
        }
    }

    #[test]
    fn edge_blocks_only_sample_in_bounds_voxels() {
        // 10 voxels wide with blocks of 8: the second block holds only x = 8 and 9
        let volume = volume_from(UVec3::new(10, 1, 1), |p| if p.x == 9 { 255 } else { 0 });
        let grid =
            OccupancyGrid::classify(&volume, &threshold_table(), 8, ScanMode::EarlyExit).unwrap();
        assert_eq!(grid.dims(), UVec3::new(2, 1, 1));
        assert_eq!(grid.data(), &[EMPTY, OCCUPIED]);
    }

    #[test]
    fn block_larger_than_volume_yields_single_cell() {
        let volume = volume_from(UVec3::new(5, 6, 7), |_| 120);
        let grid =
            OccupancyGrid::classify(&volume, &threshold_table(), 64, ScanMode::EarlyExit).unwrap();
        assert_eq!(grid.dims(), UVec3::ONE);
        assert!(grid.is_occupied(UVec3::ZERO));
    }

    #[test]
    fn largest_block_size_covers_the_whole_volume() {
        let volume = volume_from(UVec3::splat(5), |_| 255);
        let table = TransferFunctionTable::identity(Precision::STANDARD);
        let grid = OccupancyGrid::classify(&volume, &table, u32::MAX, ScanMode::EarlyExit).unwrap();
        assert_eq!(grid.dims(), UVec3::ONE);
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn rejects_zero_block_size() {
        let volume = volume_from(UVec3::splat(4), |_| 0);
        let err = OccupancyGrid::classify(&volume, &threshold_table(), 0, ScanMode::EarlyExit)
            .unwrap_err();
        assert!(matches!(err, PreprocessError::InvalidBlockSize { block_size: 0 }));
    }

    #[test]
    fn rejects_samples_beyond_table_precision() {
        let dims = UVec3::new(2, 1, 1);
        let volume = Volume::<u16>::new(dims, vec![12, 300]).unwrap();
        let err = OccupancyGrid::classify(&volume, &threshold_table(), 1, ScanMode::EarlyExit)
            .unwrap_err();
        assert!(matches!(
            err,
            PreprocessError::PrecisionMismatch { precision: 256, max_sample: 300 }
        ));
    }

    #[test]
    fn from_blocks_normalises_flags() {
        let grid = OccupancyGrid::from_blocks(UVec3::new(3, 1, 1), vec![0, 1, 200], 4).unwrap();
        assert_eq!(grid.data(), &[EMPTY, OCCUPIED, OCCUPIED]);
        assert!(OccupancyGrid::from_blocks(UVec3::new(3, 1, 1), vec![0, 1], 4).is_err());
    }
}
