use bytemuck::Pod;
use glam::UVec3;

use crate::buf3d::{cell_count, Buf3D};
use crate::error::{PreprocessError, Result};
use crate::grid::Grid;

/// Unsigned scalar sample type a volume can store.
pub trait Sample: Pod + Default + Send + Sync {
    fn density(self) -> u32;
}

impl Sample for u8 {
    #[inline]
    fn density(self) -> u32 {
        self as u32
    }
}

impl Sample for u16 {
    #[inline]
    fn density(self) -> u32 {
        self as u32
    }
}

/// Immutable dense density volume.
///
/// Samples must already be mapped into the index domain of the transfer table
/// they will be classified against. The sample range is recorded on construction
/// so that mismatched table precisions are rejected before any block is scanned.
#[derive(Clone, Debug)]
pub struct Volume<S: Sample> {
    data: Buf3D<S>,
    min: u32,
    max: u32,
    hash: u64,
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

impl<S: Sample> Volume<S> {
    pub fn new(dims: UVec3, samples: Vec<S>) -> Result<Self> {
        if dims.cmpeq(UVec3::ZERO).any() {
            return Err(PreprocessError::EmptyVolume { dims });
        }
        let actual = samples.len();
        let data = Buf3D::from_data(dims, samples).ok_or(PreprocessError::VolumeSizeMismatch {
            dims,
            expected: cell_count(dims),
            actual,
        })?;

        let (min, max, hash) = data.data.iter().fold(
            (u32::MAX, 0, FNV_OFFSET),
            |(min, max, hash), sample| {
                let density = sample.density();
                let hash = density
                    .to_le_bytes()
                    .iter()
                    .fold(hash, |hash, &byte| (hash ^ byte as u64).wrapping_mul(FNV_PRIME));
                (min.min(density), max.max(density), hash)
            },
        );

        Ok(Self { data, min, max, hash })
    }

    /// Reinterprets a raw native-endian byte buffer (little-endian on wasm32).
    pub fn from_bytes(dims: UVec3, bytes: &[u8]) -> Result<Self> {
        let sample_size = size_of::<S>();
        if bytes.len() % sample_size != 0 {
            return Err(PreprocessError::VolumeSizeMismatch {
                dims,
                expected: cell_count(dims),
                actual: bytes.len() / sample_size,
            });
        }
        Self::new(dims, bytemuck::pod_collect_to_vec(bytes))
    }

    pub fn dims(&self) -> UVec3 {
        self.data.stride
    }

    pub fn samples(&self) -> &[S] {
        &self.data.data
    }

    pub fn min_sample(&self) -> u32 {
        self.min
    }

    pub fn max_sample(&self) -> u32 {
        self.max
    }
}

impl<S: Sample> Grid for Volume<S> {
    #[inline]
    fn lookup(&self, ipos: UVec3) -> u32 {
        self.data.data[self.data.calculate_index(ipos)].density()
    }

    fn minorant_majorant(&self) -> (u32, u32) {
        (self.min, self.max)
    }

    fn index_extent(&self) -> UVec3 {
        self.data.stride
    }

    fn num_voxels(&self) -> usize {
        self.data.len()
    }

    fn size_bytes(&self) -> usize {
        self.data.len() * size_of::<S>()
    }

    fn content_hash(&self) -> u64 {
        self.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_sample_range() {
        let volume = Volume::new(UVec3::new(2, 2, 1), vec![3u8, 9, 4, 200]).unwrap();
        assert_eq!(volume.minorant_majorant(), (3, 200));
        assert_eq!(volume.lookup(UVec3::new(1, 1, 0)), 200);
        assert_eq!(volume.size_bytes(), 4);
    }

    #[test]
    fn content_hash_tracks_samples() {
        let dims = UVec3::new(2, 2, 1);
        let a = Volume::new(dims, vec![3u8, 9, 4, 200]).unwrap();
        let b = Volume::new(dims, vec![3u8, 9, 4, 200]).unwrap();
        let swapped = Volume::new(dims, vec![9u8, 3, 4, 200]).unwrap();
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.content_hash(), swapped.content_hash());
        // same densities, different sample width
        let wide = Volume::new(dims, vec![3u16, 9, 4, 200]).unwrap();
        assert_eq!(a.content_hash(), wide.content_hash());
        assert_eq!(a.num_voxels(), 4);
    }

    #[test]
    fn rejects_wrong_sample_count() {
        let err = Volume::new(UVec3::new(2, 2, 2), vec![0u8; 7]).unwrap_err();
        assert!(matches!(
            err,
            PreprocessError::VolumeSizeMismatch { expected: 8, actual: 7, .. }
        ));
    }

    #[test]
    fn rejects_zero_dimension() {
        let err = Volume::<u8>::new(UVec3::new(4, 0, 4), Vec::new()).unwrap_err();
        assert!(matches!(err, PreprocessError::EmptyVolume { .. }));
    }

    #[test]
    fn reads_16_bit_samples_from_bytes() {
        let samples = [1u16, 4095, 300, 0];
        let bytes: &[u8] = bytemuck::cast_slice(&samples);
        let volume = Volume::<u16>::from_bytes(UVec3::new(4, 1, 1), bytes).unwrap();
        assert_eq!(volume.samples(), &samples);
        assert_eq!((volume.min_sample(), volume.max_sample()), (0, 4095));
        assert_eq!(volume.size_bytes(), 8);
    }

    #[test]
    fn rejects_odd_byte_count_for_16_bit() {
        let err = Volume::<u16>::from_bytes(UVec3::new(1, 1, 1), &[0, 1, 2]).unwrap_err();
        assert!(matches!(err, PreprocessError::VolumeSizeMismatch { .. }));
    }
}
