//! Elevation pipeline (C7): bilinear sample of the painted constraint
//! grid, noise-modulated hill/mountain mixing, then region aggregation.

use rayon::prelude::*;

use crate::config::{ConstraintGrid, ElevationParams};
use crate::mesh::Mesh;
use crate::noise::NoiseCache;

const MAP_SIZE: f32 = 1000.0;
/// Fixed design constant (the spec calls for "approximately 16-20").
const MOUNTAIN_SLOPE: f32 = 18.0;

/// Per-solid-triangle elevation in `[-1, 1]`. Ghost triangles carry no
/// entry -- every caller that walks mesh adjacency treats a ghost
/// neighbor as elevation `+inf`, i.e. never the lower side of a slope.
pub fn triangle_elevation(
    mesh: &Mesh,
    constraints: &ConstraintGrid,
    noise: &NoiseCache,
    mountain_dist: &[f32],
    params: &ElevationParams,
) -> Vec<f32> {
    (0..mesh.num_solid_triangles)
        .into_par_iter()
        .map(|t| {
            let p = mesh.triangle_pos[t];
            let u = (p[0] / MAP_SIZE).clamp(0.0, 1.0);
            let v = (p[1] / MAP_SIZE).clamp(0.0, 1.0);
            let mut e = constraints.sample_bilinear(u, v);

            let n = noise.samples[t];
            // n4, n5, n6 in the source numbering are this cache's
            // 1-indexed high-frequency samples, i.e. n[3], n[4], n[5] here.
            let coastal = n[3] + n[4] / 2.0 + n[5] / 4.0;
            e += params.noisy_coastlines * (1.0 - e.powi(4)) * coastal;

            if e > 0.0 {
                let w = 1.0 - 0.5 * (1.0 + n[0]);
                let eh = (w * n[4] + (1.0 - w) * n[5]).max(0.01) * params.hill_height;
                let em = (1.0
                    - MOUNTAIN_SLOPE / 2f32.powf(params.mountain_sharpness) * mountain_dist[t])
                    .max(0.01);
                e = (1.0 - e * e) * eh + e * e * em;
            } else {
                e *= params.ocean_depth + n[1];
            }

            e.clamp(-1.0, 1.0)
        })
        .collect()
}

/// Per-region elevation: mean of incident solid-triangle elevations,
/// snapped below sea level if any incident triangle is underwater --
/// a region touching ocean must itself read as water.
pub fn region_elevation(mesh: &Mesh, triangle_elev: &[f32]) -> Vec<f32> {
    let mut out = vec![0.0f32; mesh.num_regions];
    for r in 0..mesh.num_regions {
        if mesh.is_ghost_r(r) {
            continue;
        }
        let mut sum = 0.0f32;
        let mut count = 0u32;
        let mut any_water = false;
        for t in mesh.t_around_r(r) {
            if mesh.is_ghost_t(t) {
                continue;
            }
            let e = triangle_elev[t];
            sum += e;
            count += 1;
            if e < 0.0 {
                any_water = true;
            }
        }
        let avg = if count > 0 { sum / count as f32 } else { 0.0 };
        out[r] = if any_water && avg >= 0.0 { -0.001 } else { avg.clamp(-1.0, 1.0) };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::NoiseCache;

    fn flat_grid(size: usize, v: f32) -> ConstraintGrid {
        ConstraintGrid { size, constraints: vec![v; size * size] }
    }

    fn small_mesh() -> Mesh {
        let pts = vec![
            [0.0, 0.0], [1000.0, 0.0], [1000.0, 1000.0], [0.0, 1000.0],
            [500.0, 500.0], [200.0, 800.0], [800.0, 200.0],
        ];
        Mesh::build(&pts, 4).unwrap()
    }

    #[test]
    fn elevation_stays_in_range() {
        let mesh = small_mesh();
        let grid = flat_grid(8, 0.4);
        let noise = NoiseCache::build(&mesh.triangle_pos, mesh.num_solid_triangles, 3);
        let dist = vec![5.0; mesh.num_triangles];
        let params = ElevationParams::default();
        let elev = triangle_elevation(&mesh, &grid, &noise, &dist, &params);
        for &e in &elev {
            assert!((-1.0..=1.0).contains(&e));
        }
    }

    #[test]
    fn all_ocean_grid_keeps_every_region_underwater() {
        let mesh = small_mesh();
        let grid = flat_grid(8, -0.8);
        let noise = NoiseCache::build(&mesh.triangle_pos, mesh.num_solid_triangles, 3);
        let dist = vec![-1.0; mesh.num_triangles];
        let params = ElevationParams::default();
        let t_elev = triangle_elevation(&mesh, &grid, &noise, &dist, &params);
        let r_elev = region_elevation(&mesh, &t_elev);
        for r in 0..mesh.num_regions {
            if !mesh.is_ghost_r(r) {
                assert!(r_elev[r] < 0.0);
            }
        }
    }

    #[test]
    fn coastal_region_snaps_below_sea_level() {
        let mesh = small_mesh();
        let mut t_elev = vec![0.2f32; mesh.num_solid_triangles];
        t_elev[0] = -0.2;
        let r_elev = region_elevation(&mesh, &t_elev);
        for r in 0..mesh.num_regions {
            if mesh.is_ghost_r(r) {
                continue;
            }
            let touches_t0 = mesh.t_around_r(r).any(|t| t == 0);
            if touches_t0 {
                assert!(r_elev[r] < 0.0);
            }
        }
    }
}
