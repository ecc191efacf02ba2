use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PreprocessError, Result};
use crate::spline::{InterpolationKind, Spline};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
            Channel::Alpha => "alpha",
        })
    }
}

/// Color control point, channel values in `[0, 255]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorPoint {
    pub density: f64,
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl ColorPoint {
    pub const fn new(density: f64, r: f64, g: f64, b: f64) -> Self {
        Self { density, r, g, b }
    }
}

/// Opacity control point, alpha in `[0, 255]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlphaPoint {
    pub density: f64,
    pub a: f64,
}

impl AlphaPoint {
    pub const fn new(density: f64, a: f64) -> Self {
        Self { density, a }
    }
}

/// Number of entries in a transfer table, i.e. the width of its density index domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Precision(u32);

impl Precision {
    /// 8-bit sources.
    pub const STANDARD: Precision = Precision(256);
    /// Sources with more than 8 bits of native range, e.g. 12-bit CT.
    pub const EXTENDED: Precision = Precision(4096);
    pub const MAX: u32 = 1 << 16;

    pub fn new(precision: u32) -> Result<Self> {
        if precision < 2 || precision > Self::MAX || !precision.is_power_of_two() {
            return Err(PreprocessError::InvalidPrecision { precision });
        }
        Ok(Self(precision))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn len(self) -> usize {
        self.0 as usize
    }

    /// Factor mapping densities authored against the 8-bit domain onto this one.
    pub fn scale_from_standard(self) -> f64 {
        self.0 as f64 / Self::STANDARD.0 as f64
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl TryFrom<u32> for Precision {
    type Error = PreprocessError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Precision> for u32 {
    fn from(precision: Precision) -> Self {
        precision.0
    }
}

/// Color and opacity control points of one transfer function.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferPoints {
    pub color: Vec<ColorPoint>,
    pub alpha: Vec<AlphaPoint>,
}

impl TransferPoints {
    /// Multiplies every density by `factor`, values are left untouched.
    pub fn rescaled(&self, factor: f64) -> Self {
        Self {
            color: self
                .color
                .iter()
                .map(|p| ColorPoint { density: p.density * factor, ..*p })
                .collect(),
            alpha: self
                .alpha
                .iter()
                .map(|p| AlphaPoint { density: p.density * factor, ..*p })
                .collect(),
        }
    }

    pub fn build(
        &self,
        precision: Precision,
        kind: InterpolationKind,
    ) -> Result<TransferFunctionTable> {
        TransferFunctionTable::build(&self.color, &self.alpha, precision, kind)
    }
}

/// Dense RGBA lookup table over the density index domain `[0, precision)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferFunctionTable {
    precision: Precision,
    entries: Vec<[u8; 4]>,
}

impl TransferFunctionTable {
    pub fn build(
        color_points: &[ColorPoint],
        alpha_points: &[AlphaPoint],
        precision: Precision,
        kind: InterpolationKind,
    ) -> Result<Self> {
        let fit = |channel: Channel, points: Vec<(f64, f64)>| {
            Spline::fit(&points, kind)
                .map_err(|source| PreprocessError::ControlPoints { channel, source })
        };
        let red = fit(Channel::Red, color_points.iter().map(|p| (p.density, p.r)).collect())?;
        let green = fit(Channel::Green, color_points.iter().map(|p| (p.density, p.g)).collect())?;
        let blue = fit(Channel::Blue, color_points.iter().map(|p| (p.density, p.b)).collect())?;
        let alpha = fit(Channel::Alpha, alpha_points.iter().map(|p| (p.density, p.a)).collect())?;

        let entries = (0..precision.len())
            .map(|index| {
                let density = index as f64;
                [
                    to_byte(red.evaluate(density)),
                    to_byte(green.evaluate(density)),
                    to_byte(blue.evaluate(density)),
                    to_byte(alpha.evaluate(density)),
                ]
            })
            .collect();

        Ok(Self { precision, entries })
    }

    /// Grey ramp with alpha equal to intensity, spanning the whole index domain.
    pub fn identity(precision: Precision) -> Self {
        let last = (precision.len() - 1) as f64;
        let entries = (0..precision.len())
            .map(|index| {
                let v = to_byte(255.0 * index as f64 / last);
                [v, v, v, v]
            })
            .collect();
        Self { precision, entries }
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> [u8; 4] {
        self.entries[index]
    }

    #[inline]
    pub fn alpha(&self, index: usize) -> u8 {
        self.entries[index][3]
    }

    pub fn entries(&self) -> &[[u8; 4]] {
        &self.entries
    }

    /// RGBA bytes, `precision * 4` long.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.entries)
    }

    /// `prefix[i]` counts the entries below `i` with non-zero alpha, `precision + 1` long.
    pub fn alpha_prefix(&self) -> Vec<u32> {
        let mut prefix = Vec::with_capacity(self.entries.len() + 1);
        let mut visible = 0;
        prefix.push(visible);
        for entry in &self.entries {
            visible += u32::from(entry[3] != 0);
            prefix.push(visible);
        }
        prefix
    }
}

fn to_byte(value: f64) -> u8 {
    value.clamp(0.0, 255.0).round() as u8
}
