use glam::UVec3;

/// Read-only density source the classifier scans.
pub trait Grid: Sync {
    /// index-space grid lookup, returns the density used to index a transfer table
    fn lookup(&self, ipos: UVec3) -> u32;
    /// global minorant and majorant of the stored densities
    fn minorant_majorant(&self) -> (u32, u32);
    /// max of index space voxel AABB, origin always (0, 0, 0)
    fn index_extent(&self) -> UVec3;
    /// number of voxels in this grid
    fn num_voxels(&self) -> usize;
    /// required bytes to store this grid
    fn size_bytes(&self) -> usize;
    /// hash over all densities in index order, equal grids hash equal
    fn content_hash(&self) -> u64;
}
