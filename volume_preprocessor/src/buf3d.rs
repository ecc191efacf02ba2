use glam::UVec3;

/// Dense 3D storage, laid out as `x + y * stride.x + z * stride.x * stride.y`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Buf3D<T> {
    pub stride: UVec3,
    pub data: Vec<T>,
}

impl<T: Default + Clone> Buf3D<T> {
    pub fn new(stride: UVec3) -> Self {
        Self::filled(stride, T::default())
    }
}

impl<T: Clone> Buf3D<T> {
    pub fn filled(stride: UVec3, value: T) -> Self {
        Self { stride, data: vec![value; cell_count(stride)] }
    }
}

impl<T> Buf3D<T> {
    /// Wraps existing data. Returns `None` when the length doesn't match the stride.
    pub fn from_data(stride: UVec3, data: Vec<T>) -> Option<Self> {
        (data.len() == cell_count(stride)).then_some(Self { stride, data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains(&self, coord: UVec3) -> bool {
        coord.cmplt(self.stride).all()
    }

    pub fn calculate_index(&self, coord: UVec3) -> usize {
        index_of(self.stride, coord)
    }

    pub fn calculate_coord(&self, index: usize) -> UVec3 {
        coord_of(self.stride, index)
    }

    pub fn get(&self, coord: UVec3) -> Option<&T> {
        if !self.contains(coord) {
            return None;
        }
        self.data.get(self.calculate_index(coord))
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Buf3D<U> {
        Buf3D { stride: self.stride, data: self.data.iter().map(f).collect() }
    }
}

pub fn cell_count(stride: UVec3) -> usize {
    stride.x as usize * stride.y as usize * stride.z as usize
}

pub fn index_of(stride: UVec3, coord: UVec3) -> usize {
    let (sx, sy) = (stride.x as usize, stride.y as usize);
    coord.z as usize * sx * sy + coord.y as usize * sx + coord.x as usize
}

pub fn coord_of(stride: UVec3, index: usize) -> UVec3 {
    let (sx, sy) = (stride.x as usize, stride.y as usize);
    UVec3::new(
        (index % sx) as u32,
        ((index / sx) % sy) as u32,
        (index / (sx * sy)) as u32,
    )
}

pub fn div_round_up(num: UVec3, denom: UVec3) -> UVec3 {
    UVec3::new(num.x.div_ceil(denom.x), num.y.div_ceil(denom.y), num.z.div_ceil(denom.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_and_coord_agree() {
        let buf: Buf3D<u8> = Buf3D::new(UVec3::new(5, 3, 4));
        assert_eq!(buf.len(), 60);
        for index in 0..buf.len() {
            assert_eq!(buf.calculate_index(buf.calculate_coord(index)), index);
        }
        assert_eq!(buf.calculate_index(UVec3::new(1, 2, 3)), 1 + 2 * 5 + 3 * 15);
    }

    #[test]
    fn from_data_checks_length() {
        assert!(Buf3D::from_data(UVec3::new(2, 2, 2), vec![0u8; 8]).is_some());
        assert!(Buf3D::from_data(UVec3::new(2, 2, 2), vec![0u8; 7]).is_none());
    }

    #[test]
    fn get_is_bounds_checked() {
        let buf = Buf3D::filled(UVec3::new(2, 2, 2), 7u8);
        assert_eq!(buf.get(UVec3::new(1, 1, 1)), Some(&7));
        assert_eq!(buf.get(UVec3::new(2, 0, 0)), None);
    }

    #[test]
    fn div_round_up_rounds_partial_blocks() {
        assert_eq!(div_round_up(UVec3::new(64, 65, 1), UVec3::splat(8)), UVec3::new(8, 9, 1));
    }

    #[test]
    fn div_round_up_does_not_overflow_for_huge_divisors() {
        assert_eq!(div_round_up(UVec3::new(5, 1, 0), UVec3::splat(u32::MAX)), UVec3::new(1, 1, 0));
        assert_eq!(div_round_up(UVec3::splat(u32::MAX), UVec3::splat(2)), UVec3::splat(1 << 31));
    }
}
