//! Rivers pipeline (C9): priority-queue downslope assignment over the
//! dual mesh, then reverse-order flow accumulation along the resulting
//! forest.

use std::collections::BinaryHeap;

use crate::mesh::Mesh;

const UNPROCESSED: i64 = i64::MIN;

#[derive(PartialEq)]
struct Entry {
    elev: f32,
    t: usize,
}

impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other.elev.total_cmp(&self.elev)
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

pub struct RiverNetwork {
    /// Side each triangle drains through, or -1 at a local minimum.
    pub downslope_side: Vec<i64>,
    /// Pop order from the priority queue -- root (ocean) first.
    pub t_order: Vec<usize>,
    pub moisture: Vec<f32>,
    pub flow_t: Vec<f32>,
    pub flow_s: Vec<f32>,
}

/// `triangle_elev` is mutated in place: a trunk triangle is never left
/// higher than a land tributary that drains into it, so the downslope
/// forest's elevation is monotone along every path even where the
/// original priority-queue ties left a bump.
pub fn compute_rivers(
    mesh: &Mesh,
    triangle_elev: &mut [f32],
    region_rainfall: &[f32],
    rivers_flow: f32,
) -> RiverNetwork {
    let n = mesh.num_solid_triangles;
    let mut downslope_side = vec![UNPROCESSED; n];
    let mut heap = BinaryHeap::new();

    // Phase A: deep-ocean seeds. If the painted grid is all-land there
    // are none -- fall back to hull-adjacent triangles so every land
    // triangle still drains somewhere.
    let mut seeds: Vec<usize> = (0..n).filter(|&t| triangle_elev[t] < -0.1).collect();
    if seeds.is_empty() {
        seeds = (0..n)
            .filter(|&t| mesh.s_around_t(t).iter().any(|&s| mesh.is_ghost_t(mesh.t_outer(s))))
            .collect();
    }

    for &t in &seeds {
        let e = triangle_elev[t];
        let mut best_s: i64 = -1;
        let mut best_e = e;
        for s in mesh.s_around_t(t) {
            let t_nb = mesh.t_outer(s);
            if mesh.is_ghost_t(t_nb) {
                continue;
            }
            let e_nb = triangle_elev[t_nb];
            if e_nb < best_e {
                best_e = e_nb;
                best_s = s as i64;
            }
        }
        downslope_side[t] = best_s;
        heap.push(Entry { elev: e, t });
    }

    // Phase B: expand outward; each newly reached triangle's downslope
    // side points back at whichever lower neighbor discovered it first.
    let mut t_order = Vec::with_capacity(n);
    while let Some(Entry { elev: _, t: t_cur }) = heap.pop() {
        t_order.push(t_cur);
        for s in mesh.s_around_t(t_cur) {
            let t_nb = mesh.t_outer(s);
            if mesh.is_ghost_t(t_nb) {
                continue;
            }
            if downslope_side[t_nb] == UNPROCESSED {
                downslope_side[t_nb] = mesh.opposite(s) as i64;
                heap.push(Entry { elev: triangle_elev[t_nb], t: t_nb });
            }
        }
    }

    let mut moisture = vec![0.0f32; n];
    let mut flow_t = vec![0.0f32; n];
    for t in 0..n {
        let r = mesh.r_around_t(t);
        let m = (region_rainfall[r[0] as usize]
            + region_rainfall[r[1] as usize]
            + region_rainfall[r[2] as usize])
            / 3.0;
        moisture[t] = m;
        flow_t[t] = if triangle_elev[t] >= 0.0 { rivers_flow * m * m } else { 0.0 };
    }

    let mut flow_s = vec![0.0f32; mesh.num_sides];
    for &t1 in t_order.iter().rev() {
        let s = downslope_side[t1];
        if s < 0 {
            continue;
        }
        let s = s as usize;
        let trunk = mesh.t_outer(s);
        flow_t[trunk] += flow_t[t1];
        flow_s[s] += flow_t[t1];
        if triangle_elev[t1] >= 0.0 && triangle_elev[trunk] > triangle_elev[t1] {
            triangle_elev[trunk] = triangle_elev[t1];
        }
    }

    RiverNetwork { downslope_side, t_order, moisture, flow_t, flow_s }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_mesh() -> Mesh {
        let pts = vec![
            [0.0, 0.0], [1000.0, 0.0], [1000.0, 1000.0], [0.0, 1000.0],
            [500.0, 500.0], [200.0, 800.0], [800.0, 200.0], [500.0, 100.0],
        ];
        Mesh::build(&pts, 4).unwrap()
    }

    #[test]
    fn downslope_never_points_uphill() {
        let mesh = small_mesh();
        let n = mesh.num_solid_triangles;
        let mut elev: Vec<f32> = (0..n).map(|t| (t as f32 * 0.31).sin() * 0.5).collect();
        elev[0] = -0.9;
        let rainfall = vec![0.5f32; mesh.num_regions];
        let net = compute_rivers(&mesh, &mut elev, &rainfall, 0.3);
        for t in 0..n {
            let s = net.downslope_side[t];
            if s >= 0 {
                let outer = mesh.t_outer(s as usize);
                assert!(elev[outer] <= elev[t] + 1e-5);
            }
        }
    }

    #[test]
    fn all_land_still_covers_every_triangle() {
        let mesh = small_mesh();
        let n = mesh.num_solid_triangles;
        let mut elev = vec![0.3f32; n];
        let rainfall = vec![0.5f32; mesh.num_regions];
        let net = compute_rivers(&mesh, &mut elev, &rainfall, 0.3);
        assert_eq!(net.t_order.len(), n);
    }

    #[test]
    fn land_flow_meets_the_moisture_floor() {
        let mesh = small_mesh();
        let n = mesh.num_solid_triangles;
        let mut elev = vec![0.2f32; n];
        elev[0] = -0.5;
        let rainfall = vec![0.7f32; mesh.num_regions];
        let rivers_flow = 0.4;
        let net = compute_rivers(&mesh, &mut elev, &rainfall, rivers_flow);
        for t in 0..n {
            if elev[t] >= 0.0 {
                assert!(net.flow_t[t] >= rivers_flow * net.moisture[t].powi(2) - 1e-5);
            }
        }
    }

    #[test]
    fn zero_flow_parameter_yields_zero_flow() {
        let mesh = small_mesh();
        let n = mesh.num_solid_triangles;
        let mut elev = vec![0.2f32; n];
        elev[0] = -0.5;
        let rainfall = vec![0.7f32; mesh.num_regions];
        let net = compute_rivers(&mesh, &mut elev, &rainfall, 0.0);
        assert!(net.flow_s.iter().all(|&v| v == 0.0));
    }
}
