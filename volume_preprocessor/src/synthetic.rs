use glam::{DVec3, UVec3};
use wasm_bindgen::prelude::wasm_bindgen;

use crate::error::Result;
use crate::volume::Volume;

#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneratedDataType {
    Sphere,
    Sinusoid,
    Pillars,
}

fn sphere(p: DVec3, size: DVec3) -> f64 {
    1.0 - (p - size / 2.0).length_squared() / (size.max_element() * 0.9 / 2.0).powi(2)
}

fn sinusoid(p: DVec3, _size: DVec3) -> f64 {
    // 20 voxels above the floor, rippled along x and z
    let surface = 20.0 + 10.0 * (0.2 * p.x / ((p.z + 1.0) * 0.05)).sin() * (0.1 * p.z).sin();
    (surface - p.y).clamp(0.0, 1.0)
}

fn pillars(p: DVec3, size: DVec3) -> f64 {
    let wave_x = (p.x / size.x * 16.0).sin() * 0.5 + 0.7;
    let wave_z = (p.z / size.z * 16.0).sin() * 0.5 + 0.7;
    let height = wave_x * wave_z * 0.5 * size.y;
    if p.y < height { 1.0 } else { 0.0 }
}

/// Generates an 8-bit test volume, densities are the generator output in `[0, 1]`
/// scaled to `[0, 255]`.
pub fn generate(dims: UVec3, how: GeneratedDataType) -> Result<Volume<u8>> {
    let generator = match how {
        GeneratedDataType::Sphere => sphere,
        GeneratedDataType::Sinusoid => sinusoid,
        GeneratedDataType::Pillars => pillars,
    };
    let size = dims.as_dvec3();
    let mut samples = Vec::with_capacity(dims.x as usize * dims.y as usize * dims.z as usize);
    for z in 0..dims.z {
        for y in 0..dims.y {
            for x in 0..dims.x {
                let density = generator(UVec3::new(x, y, z).as_dvec3(), size);
                samples.push((density.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
        }
    }
    Volume::new(dims, samples)
}
