use glam::UVec3;

use crate::buf3d::{coord_of, Buf3D};
use crate::error::Result;
use crate::grid::Grid;
use crate::occupancy::{self, block_bounds, block_count, OccupancyGrid, EMPTY, OCCUPIED};
use crate::parallel;
use crate::transfer::TransferFunctionTable;

/// Per-block `[min, max]` density over the same block layout as [`OccupancyGrid`].
///
/// Computing the ranges costs one full pass over the volume. Afterwards a
/// transfer function can be re-applied per block without touching voxels, which
/// keeps interactive editing of the table cheap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockRanges {
    block_size: u32,
    ranges: Buf3D<[u32; 2]>,
}

impl BlockRanges {
    pub fn compute<G: Grid>(volume: &G, block_size: u32) -> Result<Self> {
        occupancy::validate_block_size(block_size)?;
        let extent = volume.index_extent();
        let mut ranges = Buf3D::new(block_count(extent, block_size));
        let stride = ranges.stride;

        parallel::for_each_indexed_mut(&mut ranges.data, |index, range| {
            let (min, max) = block_bounds(coord_of(stride, index), block_size, extent);
            let mut local_min = u32::MAX;
            let mut local_max = 0;
            for z in min.z..max.z {
                for y in min.y..max.y {
                    for x in min.x..max.x {
                        let density = volume.lookup(UVec3::new(x, y, z));
                        local_min = local_min.min(density);
                        local_max = local_max.max(density);
                    }
                }
            }
            *range = [local_min, local_max];
        });

        Ok(Self { block_size, ranges })
    }

    pub fn dims(&self) -> UVec3 {
        self.ranges.stride
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn get(&self, block: UVec3) -> Option<[u32; 2]> {
        self.ranges.get(block).copied()
    }

    /// Conservative classification: a block is empty only if no table entry in
    /// its density range has non-zero alpha. Never reports a block empty that
    /// [`OccupancyGrid::classify`] reports occupied.
    pub fn classify(&self, table: &TransferFunctionTable) -> Result<OccupancyGrid> {
        let max_sample = self.ranges.data.iter().map(|range| range[1]).max().unwrap_or(0);
        occupancy::check_precision(table, max_sample)?;

        let prefix = table.alpha_prefix();
        let cells = self.ranges.map(|&[min, max]| {
            if prefix[max as usize + 1] > prefix[min as usize] { OCCUPIED } else { EMPTY }
        });
        Ok(OccupancyGrid::from_cells(self.block_size, cells))
    }
}
