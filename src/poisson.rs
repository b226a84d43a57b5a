//! Poisson-disk point sampling (Bridson's algorithm): blue-noise points
//! with a guaranteed minimum pairwise separation, seedable with
//! pre-placed constraint points.

use tracing::debug;

use crate::error::GenError;
use crate::rng::Rng;

const MIN_TRIES: usize = 5;

pub struct Poisson {
    width: f32,
    height: f32,
    radius: f32,
    tries: usize,
    cell_size: f32,
    grid_w: usize,
    grid_h: usize,
    grid: Vec<i32>,
    points: Vec<[f32; 2]>,
    active: Vec<usize>,
    rng: Rng,
}

impl Poisson {
    /// `tries` below 5 makes Bridson's algorithm unstable (visible gaps);
    /// 6-30 is the practical range.
    pub fn construct(width: f32, height: f32, radius: f32, tries: usize, seed: u64) -> Self {
        let tries = tries.max(MIN_TRIES);
        let cell_size = radius / std::f32::consts::SQRT_2;
        let grid_w = (width / cell_size).ceil().max(1.0) as usize;
        let grid_h = (height / cell_size).ceil().max(1.0) as usize;
        Self {
            width,
            height,
            radius,
            tries,
            cell_size,
            grid_w,
            grid_h,
            grid: vec![-1; grid_w * grid_h],
            points: Vec::new(),
            active: Vec::new(),
            rng: Rng::new(seed),
        }
    }

    #[inline]
    fn cell_of(&self, p: [f32; 2]) -> (usize, usize) {
        let gx = ((p[0] / self.cell_size) as usize).min(self.grid_w - 1);
        let gy = ((p[1] / self.cell_size) as usize).min(self.grid_h - 1);
        (gx, gy)
    }

    fn in_bounds(&self, p: [f32; 2]) -> bool {
        p[0] >= 0.0 && p[0] < self.width && p[1] >= 0.0 && p[1] < self.height
    }

    fn far_enough(&self, p: [f32; 2]) -> bool {
        let (gx, gy) = self.cell_of(p);
        let r2 = self.radius * self.radius;
        let search = 2usize;
        for dy in -(search as i32)..=(search as i32) {
            for dx in -(search as i32)..=(search as i32) {
                let nx = gx as i32 + dx;
                let ny = gy as i32 + dy;
                if nx < 0 || ny < 0 || nx >= self.grid_w as i32 || ny >= self.grid_h as i32 {
                    continue;
                }
                let gi = ny as usize * self.grid_w + nx as usize;
                let pi = self.grid[gi];
                if pi < 0 {
                    continue;
                }
                let q = self.points[pi as usize];
                let ddx = q[0] - p[0];
                let ddy = q[1] - p[1];
                if ddx * ddx + ddy * ddy < r2 {
                    return false;
                }
            }
        }
        true
    }

    fn insert(&mut self, p: [f32; 2]) -> usize {
        let idx = self.points.len();
        self.points.push(p);
        let (gx, gy) = self.cell_of(p);
        self.grid[gy * self.grid_w + gx] = idx as i32;
        self.active.push(idx);
        idx
    }

    /// Inject a pre-placed point (e.g. a boundary vertex). Returns false
    /// only if the point is out of bounds or violates the radius against
    /// an already-accepted point -- a pre-seeded set should be chosen so
    /// this never happens; callers that see `false` here have a bug in
    /// how they chose their seed points, not in the sampler.
    pub fn add_point(&mut self, p: [f32; 2]) -> bool {
        if !self.in_bounds(p) || !self.far_enough(p) {
            return false;
        }
        self.insert(p);
        true
    }

    /// Run Bridson's algorithm to completion and return every accepted
    /// point, pre-seeded ones first in insertion order.
    pub fn fill(mut self) -> Vec<[f32; 2]> {
        if self.active.is_empty() {
            let p = [
                self.rng.range_f32(0.0, self.width),
                self.rng.range_f32(0.0, self.height),
            ];
            self.insert(p);
        }

        let mut rejections = 0u64;
        while let Some(&src_idx) = self.active.last() {
            let src = self.points[src_idx];
            let mut placed = false;
            for _ in 0..self.tries {
                let ang = self.rng.range_f32(0.0, std::f32::consts::TAU);
                let rad = self.rng.range_f32(self.radius, 2.0 * self.radius);
                let cand = [src[0] + ang.cos() * rad, src[1] + ang.sin() * rad];
                if self.in_bounds(cand) && self.far_enough(cand) {
                    self.insert(cand);
                    placed = true;
                    break;
                }
                rejections += 1;
            }
            if !placed {
                self.active.pop();
            }
        }

        debug!(points = self.points.len(), rejections, tries = self.tries, "poisson fill done");
        self.points
    }
}

/// Fill a region with Poisson-disk points, pre-seeding with `exclude` so
/// the result never places a new point within `radius` of one of them.
/// Returns only the newly accepted points.
pub fn fill_excluding(
    width: f32,
    height: f32,
    radius: f32,
    tries: usize,
    seed: u64,
    exclude: &[[f32; 2]],
) -> Result<Vec<[f32; 2]>, GenError> {
    let mut sampler = Poisson::construct(width, height, radius, tries, seed);
    for &p in exclude {
        // Exclusion points outside bounds are legitimate (e.g. an
        // exterior boundary ring used to keep the interior clear) --
        // only reject when a point inside bounds collides with one
        // already accepted, which should never happen for a
        // consistently chosen boundary set.
        if sampler.in_bounds(p) && !sampler.far_enough(p) {
            return Err(GenError::AlgorithmStuck(format!(
                "pre-seeded point ({}, {}) violates the poisson radius",
                p[0], p[1]
            )));
        }
        if sampler.in_bounds(p) {
            sampler.insert(p);
        }
    }
    let before = sampler.points.len();
    let all = sampler.fill();
    Ok(all[before..].to_vec())
}
