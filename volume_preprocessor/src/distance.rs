//! Chebyshev distance to the nearest occupied block.
//!
//! The 3D chessboard distance `min_c max(|dx|, |dy|, |dz|)` separates into three
//! 1D passes, one per axis, each computing
//! `out(u) = min_i max(|u - i|, in(i))` along every line of that axis. The passes
//! use the linear-time lower envelope scan of Meijster et al. with the separator
//! for the chessboard metric, so the whole transform is O(blocks).

use std::fmt;

use glam::UVec3;

use crate::buf3d::Buf3D;
use crate::occupancy::{OccupancyGrid, EMPTY};
use crate::parallel;

/// Largest representable distance, everything farther saturates to it.
pub const MAX_DISTANCE: u8 = u8::MAX;

const INFINITE: u32 = u32::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Order in which the passes run.
    pub const ORDER: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    fn next(self) -> Option<Axis> {
        match self {
            Axis::X => Some(Axis::Y),
            Axis::Y => Some(Axis::Z),
            Axis::Z => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        })
    }
}

/// Saturated per-block distance, in blocks, to the nearest occupied block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistanceField {
    cells: Buf3D<u8>,
}

impl DistanceField {
    pub fn dims(&self) -> UVec3 {
        self.cells.stride
    }

    pub fn get(&self, block: UVec3) -> Option<u8> {
        self.cells.get(block).copied()
    }

    /// Whole blocks around `block` that are guaranteed empty in every direction.
    pub fn skip_blocks(&self, block: UVec3) -> Option<u8> {
        self.get(block).map(|distance| distance.saturating_sub(1))
    }

    pub fn data(&self) -> &[u8] {
        &self.cells.data
    }
}

/// Runs the transform one pass at a time.
///
/// Each pass reads the complete output of the previous one, so passes are
/// strictly sequential while the lines inside a pass run in parallel.
#[derive(Clone, Debug)]
pub struct DistanceFieldBuilder {
    field: Buf3D<u32>,
    next: Option<Axis>,
}

impl DistanceFieldBuilder {
    pub fn new(occupancy: &OccupancyGrid) -> Self {
        let field = occupancy.cells().map(|&cell| if cell == EMPTY { INFINITE } else { 0 });
        Self { field, next: Some(Axis::X) }
    }

    /// Axis of the pass [`Self::run_next_pass`] would run, `None` once all three ran.
    pub fn next_axis(&self) -> Option<Axis> {
        self.next
    }

    /// Runs the next pass and returns its axis.
    pub fn run_next_pass(&mut self) -> Option<Axis> {
        let axis = self.next?;
        transform_axis(&mut self.field, axis);
        self.next = axis.next();
        Some(axis)
    }

    /// Runs the remaining passes and saturates the result.
    pub fn finish(mut self) -> DistanceField {
        while self.run_next_pass().is_some() {}
        let cells = self.field.map(|&distance| distance.min(MAX_DISTANCE as u32) as u8);
        DistanceField { cells }
    }
}

/// Builds the saturated Chebyshev distance field of `occupancy`.
///
/// A grid without any occupied block has no reference point; every entry is
/// [`MAX_DISTANCE`] then.
pub fn build_chebyshev_field(occupancy: &OccupancyGrid) -> DistanceField {
    DistanceFieldBuilder::new(occupancy).finish()
}

struct Lines {
    len: usize,
    count: usize,
    step: usize,
    dims: UVec3,
    axis: Axis,
}

impl Lines {
    fn new(dims: UVec3, axis: Axis) -> Self {
        let (dx, dy, dz) = (dims.x as usize, dims.y as usize, dims.z as usize);
        let (len, count, step) = match axis {
            Axis::X => (dx, dy * dz, 1),
            Axis::Y => (dy, dx * dz, dx),
            Axis::Z => (dz, dx * dy, dx * dy),
        };
        Self { len, count, step, dims, axis }
    }

    fn start(&self, line: usize) -> usize {
        let (dx, dy) = (self.dims.x as usize, self.dims.y as usize);
        match self.axis {
            Axis::X => line * dx,
            Axis::Y => line % dx + (line / dx) * dx * dy,
            Axis::Z => line,
        }
    }
}

fn transform_axis(field: &mut Buf3D<u32>, axis: Axis) {
    let lines = Lines::new(field.stride, axis);
    if lines.len == 0 {
        return;
    }

    let source = &field.data;
    let transformed = parallel::map_indices(lines.count, |line| {
        let start = lines.start(line);
        let input: Vec<u32> = (0..lines.len).map(|i| source[start + i * lines.step]).collect();
        let mut output = vec![0; lines.len];
        chessboard_1d(&input, &mut output);
        output
    });

    for (line, values) in transformed.into_iter().enumerate() {
        let start = lines.start(line);
        for (i, value) in values.into_iter().enumerate() {
            field.data[start + i * lines.step] = value;
        }
    }
}

/// `output[u] = min_i max(|u - i|, input[i])`, with [`INFINITE`] absorbing.
fn chessboard_1d(input: &[u32], output: &mut [u32]) {
    let m = input.len() as i64;
    let g = |i: i64| input[i as usize] as i64;
    let f = |x: i64, i: i64| (x - i).abs().max(g(i));
    // last position where `i` is at least as close as `u`, for `i < u`
    let sep = |i: i64, u: i64| {
        if g(i) <= g(u) {
            (i + g(u)).max((i + u) / 2)
        } else {
            (u - g(i)).min((i + u) / 2)
        }
    };

    // lower envelope: segment `q` is owned by site `s[q]` from position `t[q]` on
    let mut s = vec![0i64; input.len()];
    let mut t = vec![0i64; input.len()];
    let mut q: isize = 0;

    for u in 1..m {
        while q >= 0 && f(t[q as usize], s[q as usize]) > f(t[q as usize], u) {
            q -= 1;
        }
        if q < 0 {
            q = 0;
            s[0] = u;
        } else {
            let w = 1 + sep(s[q as usize], u);
            if w < m {
                q += 1;
                s[q as usize] = u;
                t[q as usize] = w;
            }
        }
    }

    for u in (0..m).rev() {
        output[u as usize] = f(u, s[q as usize]).min(INFINITE as i64) as u32;
        if u == t[q as usize] {
            q -= 1;
        }
    }
}
