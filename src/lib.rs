pub mod climate;
pub mod config;
pub mod distance;
pub mod elevation;
pub mod error;
pub mod geometry;
pub mod hydrology;
pub mod mesh;
pub mod noise;
pub mod points;
pub mod poisson;
pub mod rng;
pub mod serialize;

use std::time::Instant;

use tracing::{debug, info_span, warn};

use config::Params;
use error::GenError;
use geometry::{GeometryBuffers, RiverGeometry};
use hydrology::RiverNetwork;
use mesh::Mesh;
use noise::NoiseCache;
use points::PointSet;

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// Tracks which downstream stages a parameter change invalidates.
/// `elevation`/`rainfall`/`rivers` gate C7-C10; `seed_changed` also
/// forces the noise cache, `jaggedness_changed` also forces the
/// mountain distance field even if the seed didn't move.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirtyBits {
    pub elevation: bool,
    pub rainfall: bool,
    pub rivers: bool,
    pub seed_changed: bool,
    pub jaggedness_changed: bool,
}

impl DirtyBits {
    pub fn all() -> Self {
        Self { elevation: true, rainfall: true, rivers: true, seed_changed: true, jaggedness_changed: true }
    }

    /// Marking a stage dirty also marks everything that depends on it.
    pub fn mark_elevation(&mut self) {
        self.elevation = true;
        self.rainfall = true;
        self.rivers = true;
    }

    pub fn mark_rainfall(&mut self) {
        self.rainfall = true;
        self.rivers = true;
    }

    pub fn mark_rivers(&mut self) {
        self.rivers = true;
    }
}

/// Everything derived from a fixed mesh: the per-stage outputs plus enough
/// bookkeeping for `recompute` to honor dirty bits across calls.
pub struct WorldMap {
    pub mesh: Mesh,
    pub points: PointSet,

    noise: Option<NoiseCache>,
    mountain_dist: Option<Vec<f32>>,
    pub triangle_elev: Vec<f32>,
    pub region_elev: Vec<f32>,
    pub region_humidity: Vec<f32>,
    pub region_rainfall: Vec<f32>,
    pub rivers: Option<RiverNetwork>,
    pub geometry: Option<GeometryBuffers>,
    pub river_geometry: Option<RiverGeometry>,

    last_seed: Option<u64>,
    last_jaggedness: Option<f32>,
    last_wind_angle: Option<f32>,
    wind_order_cache: Option<(Vec<usize>, Vec<f32>)>,
}

impl WorldMap {
    /// Builds the mesh from a point set; every other stage starts empty
    /// and must be filled in by `recompute` with all bits set.
    pub fn build(points: PointSet) -> Result<Self, GenError> {
        let num_boundary_regions = points.counts.num_boundary();
        let mesh = Mesh::build(&points.points, num_boundary_regions)?;
        let num_st = mesh.num_solid_triangles;
        let num_r = mesh.num_regions;
        Ok(Self {
            mesh,
            points,
            noise: None,
            mountain_dist: None,
            triangle_elev: vec![0.0; num_st],
            region_elev: vec![0.0; num_r],
            region_humidity: vec![0.0; num_r],
            region_rainfall: vec![0.0; num_r],
            rivers: None,
            geometry: None,
            river_geometry: None,
            last_seed: None,
            last_jaggedness: None,
            last_wind_angle: None,
            wind_order_cache: None,
        })
    }

    /// One arbitrary triangle per peak region -- not every incident
    /// triangle, which would seed the mountain distance BFS from a much
    /// larger zero-set and flatten every peak.
    fn peak_triangles(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .points
            .counts
            .peaks_range()
            .filter_map(|r| self.mesh.t_around_r(r).find(|&t| !self.mesh.is_ghost_t(t)))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Runs every stage whose dirty bit is set, in dependency order:
    /// noise (seed) -> mountain distance (seed/jaggedness) -> elevation
    /// -> rainfall -> rivers -> geometry. Boundary contract: a painted-grid
    /// change sets all three stage bits; a rainfall-only parameter change
    /// sets only rainfall and rivers.
    pub fn recompute(
        &mut self,
        params: &Params,
        constraints: &config::ConstraintGrid,
        dirty: DirtyBits,
    ) -> Result<Vec<Timing>, GenError> {
        params.validate()?;
        constraints.validate()?;

        let mut timings = Vec::new();
        let seed = params.elevation.seed;
        let jaggedness = params.elevation.mountain_jagged;

        debug!(
            regions = self.mesh.num_regions,
            triangles = self.mesh.num_solid_triangles,
            sides = self.mesh.num_solid_sides,
            "recompute starting"
        );

        let seed_changed = dirty.seed_changed || self.last_seed != Some(seed);
        let jaggedness_changed = dirty.jaggedness_changed || self.last_jaggedness != Some(jaggedness);

        if seed_changed || self.noise.is_none() {
            let t = Instant::now();
            let _span = info_span!("noise_cache").entered();
            self.noise = Some(NoiseCache::build(&self.mesh.triangle_pos, self.mesh.num_solid_triangles, seed));
            let ms = t.elapsed().as_secs_f64() * 1000.0;
            debug!(triangles = self.mesh.num_solid_triangles, ms, "noise cache built");
            timings.push(Timing { name: "noise_cache", ms });
        }

        if seed_changed || jaggedness_changed || self.mountain_dist.is_none() {
            let t = Instant::now();
            let _span = info_span!("mountain_distance").entered();
            let peaks = self.peak_triangles();
            if peaks.len() < self.points.counts.num_mountain_peaks {
                warn!(
                    expected = self.points.counts.num_mountain_peaks,
                    found = peaks.len(),
                    "fewer peak seed triangles than peak regions"
                );
            }
            self.mountain_dist = Some(distance::mountain_distance(
                &self.mesh,
                &peaks,
                params.mesh.spacing,
                jaggedness,
                seed,
            ));
            let ms = t.elapsed().as_secs_f64() * 1000.0;
            debug!(peaks = peaks.len(), ms, "mountain distance field built");
            timings.push(Timing { name: "mountain_distance", ms });
        }

        self.last_seed = Some(seed);
        self.last_jaggedness = Some(jaggedness);

        if dirty.elevation {
            let t = Instant::now();
            let _span = info_span!("elevation").entered();
            let noise = self.noise.as_ref().unwrap();
            let mountain_dist = self.mountain_dist.as_ref().unwrap();
            self.triangle_elev = elevation::triangle_elevation(
                &self.mesh, constraints, noise, mountain_dist, &params.elevation,
            );
            self.region_elev = elevation::region_elevation(&self.mesh, &self.triangle_elev);
            let ms = t.elapsed().as_secs_f64() * 1000.0;
            let land = self.region_elev.iter().filter(|&&e| e >= 0.0).count();
            debug!(regions = self.mesh.num_regions, land, ms, "elevation computed");
            timings.push(Timing { name: "elevation", ms });
        }

        if dirty.rainfall {
            let t = Instant::now();
            let _span = info_span!("rainfall").entered();
            let wind_angle_changed = self.last_wind_angle != Some(params.biomes.wind_angle_deg);
            if wind_angle_changed || self.wind_order_cache.is_none() {
                self.wind_order_cache = Some(climate::wind_order(&self.mesh, params.biomes.wind_angle_deg));
                self.last_wind_angle = Some(params.biomes.wind_angle_deg);
            }
            let (order, projection) = self.wind_order_cache.as_ref().unwrap();
            let (humidity, rainfall) =
                climate::compute_rainfall(&self.mesh, &self.region_elev, order, projection, &params.biomes);
            self.region_humidity = humidity;
            self.region_rainfall = rainfall;
            let ms = t.elapsed().as_secs_f64() * 1000.0;
            let mean_rain =
                self.region_rainfall.iter().sum::<f32>() / self.region_rainfall.len().max(1) as f32;
            debug!(mean_rain, ms, "rainfall computed");
            timings.push(Timing { name: "rainfall", ms });
        }

        if dirty.rivers {
            let t = Instant::now();
            let _span = info_span!("rivers").entered();
            let net = hydrology::compute_rivers(
                &self.mesh, &mut self.triangle_elev, &self.region_rainfall, params.rivers.flow,
            );
            self.region_elev = elevation::region_elevation(&self.mesh, &self.triangle_elev);
            let ms = t.elapsed().as_secs_f64() * 1000.0;
            debug!(triangles_covered = net.t_order.len(), ms, "rivers computed");
            self.rivers = Some(net);
            timings.push(Timing { name: "rivers", ms });

            let t = Instant::now();
            let _span = info_span!("geometry").entered();
            let net = self.rivers.as_ref().unwrap();
            self.geometry = Some(geometry::emit_geometry(
                &self.mesh, &self.region_elev, &self.region_rainfall, &self.triangle_elev, &net.flow_s,
            ));
            let river_geometry = geometry::emit_rivers(
                &self.mesh,
                &net.flow_t,
                &net.flow_s,
                params.mesh.spacing,
                params.rivers.lg_min_flow,
                params.rivers.lg_river_width,
            );
            let ms = t.elapsed().as_secs_f64() * 1000.0;
            debug!(river_triangles = river_geometry.count, ms, "geometry emitted");
            if river_geometry.count == 0 {
                warn!("no river triangles emitted -- flow never exceeded lg_min_flow anywhere");
            }
            self.river_geometry = Some(river_geometry);
            timings.push(Timing { name: "geometry", ms });
        }

        Ok(timings)
    }
}

/// Runs the full pipeline from scratch: points -> mesh -> every stage.
pub fn generate(
    params: &Params,
    constraints: &config::ConstraintGrid,
) -> Result<(WorldMap, Vec<Timing>), GenError> {
    let total_start = Instant::now();
    let mut timings = Vec::new();

    let t = Instant::now();
    let point_set =
        points::generate_points(params.elevation.seed, params.mesh.spacing, params.mesh.mountain_spacing)?;
    timings.push(Timing { name: "points", ms: t.elapsed().as_secs_f64() * 1000.0 });

    let t = Instant::now();
    let mut map = WorldMap::build(point_set)?;
    timings.push(Timing { name: "mesh", ms: t.elapsed().as_secs_f64() * 1000.0 });

    let mut stage_timings = map.recompute(params, constraints, DirtyBits::all())?;
    timings.append(&mut stage_timings);

    timings.push(Timing { name: "TOTAL", ms: total_start.elapsed().as_secs_f64() * 1000.0 });
    Ok((map, timings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::ConstraintGrid;

    fn flat_grid(v: f32) -> ConstraintGrid {
        ConstraintGrid { size: 16, constraints: vec![v; 16 * 16] }
    }

    #[test]
    fn generate_runs_end_to_end() {
        let mut params = Params::default();
        params.mesh.spacing = 60.0;
        params.mesh.mountain_spacing = 200.0;
        let grid = flat_grid(0.3);
        let (map, timings) = generate(&params, &grid).unwrap();
        assert!(map.geometry.is_some());
        assert!(map.river_geometry.is_some());
        assert!(timings.iter().any(|t| t.name == "TOTAL"));
    }

    #[test]
    fn recompute_with_only_rainfall_dirty_skips_elevation() {
        let mut params = Params::default();
        params.mesh.spacing = 60.0;
        params.mesh.mountain_spacing = 200.0;
        let grid = flat_grid(0.3);
        let (mut map, _) = generate(&params, &grid).unwrap();
        let before = map.region_elev.clone();

        params.biomes.raininess = 0.1;
        let mut dirty = DirtyBits::default();
        dirty.mark_rainfall();
        map.recompute(&params, &grid, dirty).unwrap();
        assert_eq!(map.region_elev, before);
    }

    #[test]
    fn peak_triangles_has_one_entry_per_peak_region() {
        let mut params = Params::default();
        params.mesh.spacing = 60.0;
        params.mesh.mountain_spacing = 200.0;
        let grid = flat_grid(0.3);
        let (map, _) = generate(&params, &grid).unwrap();
        assert_eq!(map.peak_triangles().len(), map.points.counts.num_mountain_peaks);
    }

    #[test]
    fn rainfall_recompute_with_unchanged_wind_angle_is_stable() {
        let mut params = Params::default();
        params.mesh.spacing = 60.0;
        params.mesh.mountain_spacing = 200.0;
        let grid = flat_grid(0.3);
        let (mut map, _) = generate(&params, &grid).unwrap();
        let before = map.region_rainfall.clone();

        let mut dirty = DirtyBits::default();
        dirty.mark_rainfall();
        map.recompute(&params, &grid, dirty).unwrap();
        assert_eq!(map.region_rainfall, before);
    }
}
