//! Dual mesh: Delaunay triangulation plus its Voronoi dual, closed with
//! ghost elements so every algorithm downstream can treat the hull like
//! any other edge.
//!
//! Three parallel index spaces share one side array: regions `R`
//! (Voronoi cells / Delaunay vertices), sides `S` (directed half-edges,
//! three per triangle), triangles `T` (Delaunay faces / Voronoi
//! vertices). `triangles[s]` gives the region a side originates from;
//! `halfedges[s]` gives its opposite side.

use std::collections::HashMap;

use delaunator::Point;

use crate::error::GenError;

const GHOST_OFFSET: f32 = 10.0;

#[inline]
pub fn next_side(s: usize) -> usize {
    if s % 3 == 2 { s - 2 } else { s + 1 }
}

#[inline]
pub fn prev_side(s: usize) -> usize {
    if s % 3 == 0 { s + 2 } else { s - 1 }
}

pub struct Mesh {
    pub num_regions: usize,
    pub num_boundary_regions: usize,
    pub num_solid_sides: usize,
    pub num_sides: usize,
    pub num_solid_triangles: usize,
    pub num_triangles: usize,

    pub region_pos: Vec<[f32; 2]>,
    pub triangle_pos: Vec<[f32; 2]>,

    /// `triangles[s]` = region side `s` originates from (`r_begin(s)`).
    triangles: Vec<u32>,
    /// `halfedges[s]` = opposite side. Never -1 once closure has run.
    halfedges: Vec<i32>,
    /// One incoming side per region (`r_end(s_of_r[r]) == r`), used as
    /// the starting point for `*_around_r` circulation.
    s_of_r: Vec<u32>,
}

impl Mesh {
    #[inline]
    pub fn r_begin(&self, s: usize) -> u32 {
        self.triangles[s]
    }

    #[inline]
    pub fn r_end(&self, s: usize) -> u32 {
        self.triangles[next_side(s)]
    }

    #[inline]
    pub fn opposite(&self, s: usize) -> usize {
        self.halfedges[s] as usize
    }

    #[inline]
    pub fn t_inner(&self, s: usize) -> usize {
        s / 3
    }

    #[inline]
    pub fn t_outer(&self, s: usize) -> usize {
        self.opposite(s) / 3
    }

    #[inline]
    pub fn is_ghost_s(&self, s: usize) -> bool {
        s >= self.num_solid_sides
    }

    #[inline]
    pub fn is_ghost_t(&self, t: usize) -> bool {
        t >= self.num_solid_triangles
    }

    #[inline]
    pub fn is_ghost_r(&self, r: usize) -> bool {
        r == self.num_regions - 1
    }

    #[inline]
    pub fn s_around_t(&self, t: usize) -> [usize; 3] {
        [3 * t, 3 * t + 1, 3 * t + 2]
    }

    #[inline]
    pub fn r_around_t(&self, t: usize) -> [u32; 3] {
        let s = self.s_around_t(t);
        [self.triangles[s[0]], self.triangles[s[1]], self.triangles[s[2]]]
    }

    #[inline]
    pub fn t_around_t(&self, t: usize) -> [usize; 3] {
        let s = self.s_around_t(t);
        [self.t_outer(s[0]), self.t_outer(s[1]), self.t_outer(s[2])]
    }

    /// Incoming sides (`r_end(s) == r`) circulating once around `r`.
    pub fn s_around_r(&self, r: usize) -> SAroundR<'_> {
        let start = self.s_of_r[r] as usize;
        SAroundR { mesh: self, start, current: Some(start) }
    }

    pub fn r_around_r(&self, r: usize) -> impl Iterator<Item = u32> + '_ {
        self.s_around_r(r).map(move |s| self.triangles[s])
    }

    pub fn t_around_r(&self, r: usize) -> impl Iterator<Item = usize> + '_ {
        self.s_around_r(r).map(move |s| self.t_inner(s))
    }

    pub fn build(points: &[[f32; 2]], num_boundary_regions: usize) -> Result<Mesh, GenError> {
        if points.len() < 3 {
            return Err(GenError::DegenerateInput(format!(
                "need at least 3 points, got {}",
                points.len()
            )));
        }

        let d_points: Vec<Point> = points
            .iter()
            .map(|p| Point { x: p[0] as f64, y: p[1] as f64 })
            .collect();
        let triangulation = delaunator::triangulate(&d_points);
        if triangulation.triangles.is_empty() {
            return Err(GenError::DegenerateInput(
                "triangulation is empty -- points are likely collinear".into(),
            ));
        }

        let num_solid_sides = triangulation.triangles.len();
        let num_solid_triangles = num_solid_sides / 3;

        let mut triangles: Vec<u32> =
            triangulation.triangles.iter().map(|&r| r as u32).collect();
        let mut halfedges: Vec<i32> = triangulation
            .halfedges
            .iter()
            .map(|&h| if h == delaunator::EMPTY { -1 } else { h as i32 })
            .collect();
        let is_hull: Vec<bool> = halfedges.iter().map(|&h| h < 0).collect();

        // Ordered hull walk: chain unpaired sides head-to-tail by region.
        let mut start_region_to_side: HashMap<u32, usize> = HashMap::new();
        for s in 0..num_solid_sides {
            if is_hull[s] {
                start_region_to_side.insert(triangles[s], s);
            }
        }

        let first_unpaired = (0..num_solid_sides).find(|&s| is_hull[s]);
        let mut hull: Vec<usize> = Vec::new();
        if let Some(s0) = first_unpaired {
            let mut cur = s0;
            loop {
                hull.push(cur);
                let end_r = triangles[next_side(cur)];
                cur = *start_region_to_side.get(&end_r).ok_or_else(|| {
                    GenError::MeshInvariantViolated(
                        "hull endpoint has no continuing unpaired side".into(),
                    )
                })?;
                if cur == s0 {
                    break;
                }
            }
        }

        let ghost_r = points.len() as u32;
        let num_regions = points.len() + 1;
        let n_hull = hull.len();
        let num_triangles = num_solid_triangles + n_hull;
        let num_sides = num_solid_sides + 3 * n_hull;

        triangles.resize(num_sides, 0);
        halfedges.resize(num_sides, -1);

        for (k, &hull_side) in hull.iter().enumerate() {
            let t_new = num_solid_triangles + k;
            let g0 = 3 * t_new;
            let g1 = g0 + 1;
            let g2 = g0 + 2;

            triangles[g0] = triangles[next_side(hull_side)]; // r_end(hull_side)
            triangles[g1] = triangles[hull_side]; // r_begin(hull_side)
            triangles[g2] = ghost_r;

            halfedges[g0] = hull_side as i32;
            halfedges[hull_side] = g0 as i32;
        }
        for k in 0..n_hull {
            let g1 = 3 * (num_solid_triangles + k) + 1;
            let prev_k = (k + n_hull - 1) % n_hull;
            let g2_prev = 3 * (num_solid_triangles + prev_k) + 2;
            halfedges[g1] = g2_prev as i32;
            halfedges[g2_prev] = g1 as i32;
        }

        if halfedges.iter().any(|&h| h < 0) {
            return Err(GenError::MeshInvariantViolated(
                "side left unpaired after ghost closure".into(),
            ));
        }

        // Representative incoming side per region, preferring hull sides
        // so the pick is stable regardless of triangle enumeration order.
        let mut s_of_r: Vec<u32> = vec![u32::MAX; num_regions];
        for s in 0..num_solid_sides {
            let r = triangles[s] as usize;
            let incoming = prev_side(s) as u32;
            if s_of_r[r] == u32::MAX || is_hull[s] {
                s_of_r[r] = incoming;
            }
        }
        for k in 0..n_hull {
            let g2 = 3 * (num_solid_triangles + k) + 2;
            s_of_r[ghost_r as usize] = prev_side(g2) as u32;
        }
        if s_of_r.iter().any(|&s| s == u32::MAX) {
            return Err(GenError::MeshInvariantViolated(
                "region with no incident side".into(),
            ));
        }

        let mut region_pos: Vec<[f32; 2]> = points.to_vec();
        region_pos.push([f32::NAN, f32::NAN]); // ghost position is undefined

        let mut triangle_pos = vec![[0.0f32; 2]; num_triangles];
        for t in 0..num_solid_triangles {
            let r = [
                triangles[3 * t] as usize,
                triangles[3 * t + 1] as usize,
                triangles[3 * t + 2] as usize,
            ];
            let cx = (region_pos[r[0]][0] + region_pos[r[1]][0] + region_pos[r[2]][0]) / 3.0;
            let cy = (region_pos[r[0]][1] + region_pos[r[1]][1] + region_pos[r[2]][1]) / 3.0;
            triangle_pos[t] = [cx, cy];
        }
        for (k, &hull_side) in hull.iter().enumerate() {
            let a = region_pos[triangles[hull_side] as usize];
            let b = region_pos[triangles[next_side(hull_side)] as usize];
            let mx = (a[0] + b[0]) * 0.5;
            let my = (a[1] + b[1]) * 0.5;
            let dx = b[0] - a[0];
            let dy = b[1] - a[1];
            let len = (dx * dx + dy * dy).sqrt().max(1e-6);
            // Rotate the edge direction -90 degrees; with delaunator's
            // CCW winding this points away from the hull interior.
            let (nx, ny) = (dy / len, -dx / len);
            triangle_pos[num_solid_triangles + k] = [mx + nx * GHOST_OFFSET, my + ny * GHOST_OFFSET];
        }

        Ok(Mesh {
            num_regions,
            num_boundary_regions,
            num_solid_sides,
            num_sides,
            num_solid_triangles,
            num_triangles,
            region_pos,
            triangle_pos,
            triangles,
            halfedges,
            s_of_r,
        })
    }
}

pub struct SAroundR<'a> {
    mesh: &'a Mesh,
    start: usize,
    current: Option<usize>,
}

impl<'a> Iterator for SAroundR<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let incoming = self.current?;
        let outgoing = next_side(incoming);
        let next_incoming = self.mesh.opposite(outgoing);
        self.current = if next_incoming == self.start { None } else { Some(next_incoming) };
        Some(incoming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_points() -> Vec<[f32; 2]> {
        vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [5.0, 5.0]]
    }

    #[test]
    fn opposite_is_involution() {
        let mesh = Mesh::build(&square_points(), 4).unwrap();
        for s in 0..mesh.num_sides {
            assert_eq!(mesh.opposite(mesh.opposite(s)), s);
        }
    }

    #[test]
    fn next_preserves_shared_endpoint() {
        let mesh = Mesh::build(&square_points(), 4).unwrap();
        for s in 0..mesh.num_sides {
            assert_eq!(mesh.r_end(s), mesh.r_begin(mesh.opposite(s)));
        }
    }

    #[test]
    fn triangle_membership_is_consistent() {
        let mesh = Mesh::build(&square_points(), 4).unwrap();
        for t in 0..mesh.num_triangles {
            for s in mesh.s_around_t(t) {
                assert_eq!(mesh.t_inner(s), t);
            }
        }
    }

    #[test]
    fn ghost_closure_leaves_no_unpaired_sides() {
        let mesh = Mesh::build(&square_points(), 4).unwrap();
        for s in 0..mesh.num_sides {
            assert!(mesh.opposite(s) < mesh.num_sides);
        }
        assert_eq!(mesh.num_regions - 1, 5);
        assert!(mesh.is_ghost_r(mesh.num_regions - 1));
    }

    #[test]
    fn r_around_r_returns_to_start() {
        let mesh = Mesh::build(&square_points(), 4).unwrap();
        // Interior point (index 4) should see all four corners once.
        let mut seen: Vec<u32> = mesh.r_around_r(4).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), mesh.r_around_r(4).count());
    }

    #[test]
    fn too_few_points_is_degenerate() {
        let err = Mesh::build(&[[0.0, 0.0], [1.0, 1.0]], 0).unwrap_err();
        assert!(matches!(err, GenError::DegenerateInput(_)));
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let pts = vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];
        let err = Mesh::build(&pts, 0).unwrap_err();
        assert!(matches!(err, GenError::DegenerateInput(_)));
    }
}
