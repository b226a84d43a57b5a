//! Point generator (C4): builds the single ordered point array the dual
//! mesh is triangulated from -- exterior boundary ring, interior
//! boundary ring, mountain peaks, infill -- and records where each
//! block starts so downstream code can tell a peak triangle from an
//! infill one.

use tracing::{debug, warn};

use crate::error::GenError;
use crate::poisson;

const MAP_SIZE: f32 = 1000.0;
const SALT_PEAKS: u64 = 0x9A5E_BEEF_7E47_0001;
const SALT_INFILL: u64 = 0x9A5E_BEEF_7E47_0002;
const INFILL_TRIES: usize = 6;
const PEAK_TRIES: usize = 20;

pub struct PointCounts {
    pub num_exterior_boundary: usize,
    pub num_interior_boundary: usize,
    pub num_mountain_peaks: usize,
    pub num_infill: usize,
}

impl PointCounts {
    pub fn num_boundary(&self) -> usize {
        self.num_exterior_boundary + self.num_interior_boundary
    }

    pub fn peaks_range(&self) -> std::ops::Range<usize> {
        let start = self.num_boundary();
        start..start + self.num_mountain_peaks
    }
}

pub struct PointSet {
    pub points: Vec<[f32; 2]>,
    pub counts: PointCounts,
}

#[inline]
fn edge_point(edge: usize, t: f32) -> ([f32; 2], [f32; 2]) {
    match edge {
        0 => ([t * MAP_SIZE, 0.0], [0.0, 1.0]),               // top, inward = +y
        1 => ([MAP_SIZE, t * MAP_SIZE], [-1.0, 0.0]),          // right, inward = -x
        2 => ([MAP_SIZE - t * MAP_SIZE, MAP_SIZE], [0.0, -1.0]), // bottom, inward = -y
        _ => ([0.0, MAP_SIZE - t * MAP_SIZE], [1.0, 0.0]),      // left, inward = +x
    }
}

/// Ring just inside the map square, bulged inward near each edge's
/// corners to keep triangles along the boundary from going long and thin.
fn interior_boundary_ring(mesh_spacing: f32) -> Vec<[f32; 2]> {
    let spacing = mesh_spacing * std::f32::consts::SQRT_2;
    let curvature = mesh_spacing;
    let n = ((MAP_SIZE / spacing).round() as usize).max(1);
    let mut pts = Vec::with_capacity(4 * n);
    for edge in 0..4 {
        for i in 0..n {
            let t = i as f32 / n as f32;
            let bulge = curvature * 4.0 * (t - 0.5).powi(2);
            let (p, inward) = edge_point(edge, t);
            pts.push([p[0] + inward[0] * bulge, p[1] + inward[1] * bulge]);
        }
    }
    pts
}

/// Ring just outside the map square plus the four outer corners, used
/// only to give the hull well-behaved triangles; never pre-seeds peaks
/// or infill.
fn exterior_boundary_ring(mesh_spacing: f32) -> Vec<[f32; 2]> {
    let spacing = mesh_spacing * std::f32::consts::SQRT_2;
    let off = mesh_spacing / std::f32::consts::SQRT_2;
    let n = ((MAP_SIZE / spacing).round() as usize).max(1);
    let mut pts = Vec::with_capacity(4 * n + 4);
    for edge in 0..4 {
        for i in 0..n {
            let t = i as f32 / n as f32;
            let (p, inward) = edge_point(edge, t);
            pts.push([p[0] - inward[0] * off, p[1] - inward[1] * off]);
        }
    }
    pts.push([-off, -off]);
    pts.push([MAP_SIZE + off, -off]);
    pts.push([MAP_SIZE + off, MAP_SIZE + off]);
    pts.push([-off, MAP_SIZE + off]);
    pts
}

/// Deterministic given `(seed, mesh_spacing, mountain_spacing)`.
pub fn generate_points(
    seed: u64,
    mesh_spacing: f32,
    mountain_spacing: f32,
) -> Result<PointSet, GenError> {
    if mesh_spacing <= 0.0 {
        return Err(GenError::InvalidParameter {
            field: "mesh_spacing",
            reason: "must be positive".into(),
        });
    }
    if mountain_spacing <= mesh_spacing {
        return Err(GenError::InvalidParameter {
            field: "mountain_spacing",
            reason: "must exceed mesh_spacing".into(),
        });
    }

    let exterior = exterior_boundary_ring(mesh_spacing);
    let interior = interior_boundary_ring(mesh_spacing);

    let peaks = poisson::fill_excluding(
        MAP_SIZE,
        MAP_SIZE,
        mountain_spacing,
        PEAK_TRIES,
        seed ^ SALT_PEAKS,
        &interior,
    )?;

    let mut peak_exclude = interior.clone();
    peak_exclude.extend_from_slice(&peaks);
    let infill = poisson::fill_excluding(
        MAP_SIZE,
        MAP_SIZE,
        mesh_spacing,
        INFILL_TRIES,
        seed ^ SALT_INFILL,
        &peak_exclude,
    )?;

    // Loose sanity floor for blue-noise packing: a well-behaved Bridson
    // fill rarely drops below half of area / radius^2 accepted points.
    let area = MAP_SIZE * MAP_SIZE;
    let expected_peaks = (area / (mountain_spacing * mountain_spacing)).max(1.0);
    if (peaks.len() as f32) < expected_peaks * 0.5 {
        warn!(found = peaks.len(), expected = expected_peaks, "mountain peak count lower than expected");
    }
    let expected_infill = (area / (mesh_spacing * mesh_spacing)).max(1.0);
    if (infill.len() as f32) < expected_infill * 0.5 {
        warn!(found = infill.len(), expected = expected_infill, "infill point count lower than expected");
    }

    let counts = PointCounts {
        num_exterior_boundary: exterior.len(),
        num_interior_boundary: interior.len(),
        num_mountain_peaks: peaks.len(),
        num_infill: infill.len(),
    };
    debug!(
        exterior = counts.num_exterior_boundary,
        interior = counts.num_interior_boundary,
        peaks = counts.num_mountain_peaks,
        infill = counts.num_infill,
        "point set generated"
    );

    let mut points = Vec::with_capacity(
        counts.num_exterior_boundary + counts.num_interior_boundary + counts.num_mountain_peaks
            + counts.num_infill,
    );
    points.extend_from_slice(&exterior);
    points.extend_from_slice(&interior);
    points.extend_from_slice(&peaks);
    points.extend_from_slice(&infill);

    Ok(PointSet { points, counts })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_given_same_inputs() {
        let a = generate_points(187, 5.0, 35.0).unwrap();
        let b = generate_points(187, 5.0, 35.0).unwrap();
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn counts_sum_to_total_points() {
        let set = generate_points(1, 8.0, 40.0).unwrap();
        let c = &set.counts;
        assert_eq!(
            set.points.len(),
            c.num_exterior_boundary + c.num_interior_boundary + c.num_mountain_peaks + c.num_infill
        );
    }

    #[test]
    fn rejects_non_positive_spacing() {
        assert!(generate_points(1, 0.0, 10.0).is_err());
    }

    #[test]
    fn rejects_mountain_spacing_not_exceeding_mesh_spacing() {
        assert!(generate_points(1, 10.0, 10.0).is_err());
    }
}
