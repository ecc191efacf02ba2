//! 1D interpolants over sparse `(density, value)` control points.
//!
//! The cubic kind is an Akima spline: a piecewise cubic Hermite curve whose node
//! slopes are weighted averages of the neighbouring secants. It passes through
//! every control point and stays flat across plateaus, which keeps zero-alpha
//! ranges of a transfer function exactly zero.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationKind {
    #[default]
    Cubic,
    Linear,
}

#[derive(Error, Clone, Copy, Debug, PartialEq)]
pub enum SplineError {
    #[error("at least 2 control points are required, got {0}")]
    TooFewPoints(usize),

    #[error("duplicate density {0}")]
    DuplicateDensity(f64),

    #[error("control point {0} is not in ascending density order")]
    Unsorted(usize),

    #[error("control point {0} is not finite")]
    NonFinite(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Spline {
    kind: InterpolationKind,
    xs: Vec<f64>,
    ys: Vec<f64>,
    // node derivatives, only used by the cubic kind
    slopes: Vec<f64>,
}

impl Spline {
    /// Fits an interpolant through `points`, which must be sorted by strictly
    /// increasing density.
    pub fn fit(points: &[(f64, f64)], kind: InterpolationKind) -> Result<Self, SplineError> {
        validate(points)?;
        let (xs, ys): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
        let slopes = match kind {
            InterpolationKind::Cubic => akima_slopes(&xs, &ys),
            InterpolationKind::Linear => Vec::new(),
        };
        Ok(Self { kind, xs, ys, slopes })
    }

    pub fn kind(&self) -> InterpolationKind {
        self.kind
    }

    /// First and last control point densities.
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Evaluates the interpolant. Queries outside the control point range are
    /// clamped to it, so the boundary values extend flat.
    pub fn evaluate(&self, x: f64) -> f64 {
        let (lo, hi) = self.domain();
        let x = x.clamp(lo, hi);

        let last_segment = self.xs.len() - 2;
        let segment = self
            .xs
            .partition_point(|&knot| knot <= x)
            .saturating_sub(1)
            .min(last_segment);

        let (x0, x1) = (self.xs[segment], self.xs[segment + 1]);
        let (y0, y1) = (self.ys[segment], self.ys[segment + 1]);
        let h = x1 - x0;
        let t = (x - x0) / h;

        match self.kind {
            InterpolationKind::Linear => y0 + (y1 - y0) * t,
            InterpolationKind::Cubic => {
                let (m0, m1) = (self.slopes[segment], self.slopes[segment + 1]);
                let t2 = t * t;
                let t3 = t2 * t;
                let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
                let h10 = t3 - 2.0 * t2 + t;
                let h01 = -2.0 * t3 + 3.0 * t2;
                let h11 = t3 - t2;
                h00 * y0 + h10 * h * m0 + h01 * y1 + h11 * h * m1
            }
        }
    }
}

fn validate(points: &[(f64, f64)]) -> Result<(), SplineError> {
    if points.len() < 2 {
        return Err(SplineError::TooFewPoints(points.len()));
    }
    for (index, &(x, y)) in points.iter().enumerate() {
        if !x.is_finite() || !y.is_finite() {
            return Err(SplineError::NonFinite(index));
        }
    }
    for (index, pair) in points.windows(2).enumerate() {
        let (prev, next) = (pair[0].0, pair[1].0);
        if next == prev {
            return Err(SplineError::DuplicateDensity(next));
        }
        if next < prev {
            return Err(SplineError::Unsorted(index + 1));
        }
    }
    Ok(())
}

fn akima_slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let secants: Vec<f64> = (0..n - 1)
        .map(|i| (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i]))
        .collect();
    if n == 2 {
        return vec![secants[0]; 2];
    }

    // two extrapolated secants on each side, so secant `k` sits at `m[k + 2]`
    let before = 2.0 * secants[0] - secants[1];
    let after = 2.0 * secants[n - 2] - secants[n - 3];
    let mut m = Vec::with_capacity(n + 3);
    m.push(2.0 * before - secants[0]);
    m.push(before);
    m.extend_from_slice(&secants);
    m.push(after);
    m.push(2.0 * after - secants[n - 2]);

    (0..n)
        .map(|i| {
            let (m0, m1, m2, m3) = (m[i], m[i + 1], m[i + 2], m[i + 3]);
            let w1 = (m3 - m2).abs();
            let w2 = (m1 - m0).abs();
            if w1 + w2 <= f64::EPSILON {
                0.5 * (m1 + m2)
            } else {
                (w1 * m1 + w2 * m2) / (w1 + w2)
            }
        })
        .collect()
}
