use rayon::prelude::*;

use crate::rng::{hash2, seed_u32};

#[inline]
fn smootherstep(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// 2D gradient noise (Perlin-style). Better isotropy than value noise --
/// no grid-aligned diagonal artifacts.
#[inline]
pub fn gradient_noise(x: f32, y: f32, seed: u32) -> f32 {
    let ix = x.floor() as i32;
    let iy = y.floor() as i32;
    let fx = x - ix as f32;
    let fy = y - iy as f32;
    let sx = smootherstep(fx);
    let sy = smootherstep(fy);

    #[inline]
    fn grad(hash: u32, dx: f32, dy: f32) -> f32 {
        // 16 evenly-spaced unit gradients (every 22.5°).
        // Eliminates the directional bias of 4-gradient Perlin.
        match hash & 15 {
            0  =>  dx,
            1  =>  0.924 * dx + 0.383 * dy,
            2  =>  0.707 * (dx + dy),
            3  =>  0.383 * dx + 0.924 * dy,
            4  =>  dy,
            5  => -0.383 * dx + 0.924 * dy,
            6  =>  0.707 * (-dx + dy),
            7  => -0.924 * dx + 0.383 * dy,
            8  => -dx,
            9  => -0.924 * dx - 0.383 * dy,
            10 =>  0.707 * (-dx - dy),
            11 => -0.383 * dx - 0.924 * dy,
            12 => -dy,
            13 =>  0.383 * dx - 0.924 * dy,
            14 =>  0.707 * (dx - dy),
            _  =>  0.924 * dx - 0.383 * dy,
        }
    }

    let v00 = grad(hash2(ix, iy, seed), fx, fy);
    let v10 = grad(hash2(ix + 1, iy, seed), fx - 1.0, fy);
    let v01 = grad(hash2(ix, iy + 1, seed), fx, fy - 1.0);
    let v11 = grad(hash2(ix + 1, iy + 1, seed), fx - 1.0, fy - 1.0);

    let a = lerp(v00, v10, sx);
    let b = lerp(v01, v11, sx);
    // Scale to approximately [-1, 1] range (raw range is ~[-0.7, 0.7])
    lerp(a, b, sy) * 1.414
}

/// Alias for gradient_noise.
pub fn value_noise(x: f32, y: f32, seed: u32) -> f32 {
    gradient_noise(x, y, seed)
}

/// Fractal Brownian Motion with per-octave rotation to break grid alignment.
pub fn fbm(x: f32, y: f32, seed: u32, octaves: u32, freq0: f32, lac: f32, gain: f32) -> f32 {
    let mut sum = 0.0;
    let mut amp = 1.0;
    let mut freq = freq0;
    let mut norm = 0.0;
    // Rotate ~30° per octave to decorrelate
    const COS30: f32 = 0.866025;
    const SIN30: f32 = 0.5;
    let mut px = x;
    let mut py = y;
    for i in 0..octaves {
        sum += gradient_noise(px * freq, py * freq, seed.wrapping_add(i)) * amp;
        norm += amp;
        amp *= gain;
        freq *= lac;
        let (rx, ry) = (px * COS30 - py * SIN30, px * SIN30 + py * COS30);
        px = rx;
        py = ry;
    }
    if norm > 0.0 { sum / norm } else { 0.0 }
}

const SALT_NOISE_CACHE: u64 = 0x5077_1CE_CACE_0005;

const NOISE_SCALES: [f32; 6] = [1.0, 2.0, 4.0, 16.0, 32.0, 64.0];
/// Hard-coded per-scale offsets so the six samples don't share axis
/// alignment even though they all read the same underlying field.
const NOISE_OFFSETS: [(f32, f32); 6] = [
    (0.0, 0.0),
    (3.7, 1.2),
    (11.3, 7.7),
    (23.1, 41.9),
    (53.0, 13.0),
    (101.0, 67.0),
];

/// Precomputed six-scale noise per solid triangle. Built once per seed
/// and reused across every later stage that reads `elevation.rs`'s `n0..n5`.
pub struct NoiseCache {
    pub samples: Vec<[f32; 6]>,
}

impl NoiseCache {
    pub fn build(triangle_pos: &[[f32; 2]], num_solid_triangles: usize, seed: u64) -> Self {
        let base_seed = seed_u32(seed, SALT_NOISE_CACHE);
        let samples = (0..num_solid_triangles)
            .into_par_iter()
            .map(|t| {
                let p = triangle_pos[t];
                let nx = (p[0] - 500.0) / 500.0;
                let ny = (p[1] - 500.0) / 500.0;
                let mut v = [0.0f32; 6];
                for i in 0..6 {
                    let (ox, oy) = NOISE_OFFSETS[i];
                    let scale = NOISE_SCALES[i];
                    v[i] = gradient_noise(nx * scale + ox, ny * scale + oy, base_seed.wrapping_add(i as u32));
                }
                v
            })
            .collect();
        NoiseCache { samples }
    }
}

/// Ridged FBM with per-octave rotation.
pub fn ridged_fbm(
    x: f32, y: f32, seed: u32, octaves: u32, freq0: f32, lac: f32, gain: f32,
) -> f32 {
    let mut sum = 0.0;
    let mut amp = 1.0;
    let mut freq = freq0;
    let mut norm = 0.0;
    const COS30: f32 = 0.866025;
    const SIN30: f32 = 0.5;
    let mut px = x;
    let mut py = y;
    for i in 0..octaves {
        let n = gradient_noise(px * freq, py * freq, seed.wrapping_add(i));
        sum += (1.0 - n.abs()) * amp;
        norm += amp;
        amp *= gain;
        freq *= lac;
        let (rx, ry) = (px * COS30 - py * SIN30, px * SIN30 + py * COS30);
        px = rx;
        py = ry;
    }
    if norm > 0.0 { sum / norm } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_cache_is_deterministic() {
        let pos = vec![[10.0, 20.0], [500.0, 500.0], [990.0, 5.0]];
        let a = NoiseCache::build(&pos, pos.len(), 42);
        let b = NoiseCache::build(&pos, pos.len(), 42);
        assert_eq!(a.samples, b.samples);
    }

    #[test]
    fn noise_cache_varies_with_seed() {
        let pos = vec![[500.0, 500.0]];
        let a = NoiseCache::build(&pos, pos.len(), 1);
        let b = NoiseCache::build(&pos, pos.len(), 2);
        assert_ne!(a.samples, b.samples);
    }

    #[test]
    fn gradient_noise_is_bounded() {
        for i in 0..50 {
            let v = gradient_noise(i as f32 * 0.37, i as f32 * 1.91, 7);
            assert!((-1.5..=1.5).contains(&v));
        }
    }
}
