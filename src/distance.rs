//! Mountain distance field (C6): breadth-first traversal from peak
//! triangles over the dual mesh's triangle adjacency, with per-edge
//! noise so the contours aren't perfectly circular.

use std::collections::BinaryHeap;

use crate::mesh::Mesh;
use crate::rng::Rng;

const SENTINEL: f32 = -1.0;

/// Priority-queue entry; `Ord` is reversed so `BinaryHeap` pops the
/// lowest distance first (min-heap from a max-heap).
#[derive(PartialEq)]
struct Entry {
    dist: f32,
    t: usize,
}

impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other.dist.total_cmp(&self.dist)
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Distance from the nearest peak triangle, per solid triangle. Unreached
/// triangles (there shouldn't be any on a connected mesh, but ghost
/// triangles are never visited) keep the sentinel -1.
pub fn mountain_distance(
    mesh: &Mesh,
    peak_triangles: &[usize],
    mesh_spacing: f32,
    jaggedness: f32,
    seed: u64,
) -> Vec<f32> {
    let mut dist = vec![SENTINEL; mesh.num_triangles];
    let mut rng = Rng::new(seed);
    let mut heap = BinaryHeap::new();

    for &t in peak_triangles {
        if dist[t] == SENTINEL {
            dist[t] = 0.0;
            heap.push(Entry { dist: 0.0, t });
        }
    }

    while let Some(Entry { dist: d, t }) = heap.pop() {
        if d > dist[t] {
            continue; // stale entry, a shorter path already claimed t
        }
        if mesh.is_ghost_t(t) {
            continue;
        }
        for s in mesh.s_around_t(t) {
            let t_nb = mesh.t_outer(s);
            if mesh.is_ghost_t(t_nb) {
                continue;
            }
            let u = rng.next_f32();
            let v = rng.next_f32();
            let weight = mesh_spacing * (1.0 + jaggedness * (u - v));
            let nd = d + weight.max(0.0);
            if dist[t_nb] == SENTINEL || nd < dist[t_nb] {
                dist[t_nb] = nd;
                heap.push(Entry { dist: nd, t: t_nb });
            }
        }
    }

    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;

    fn small_mesh() -> Mesh {
        let pts = vec![
            [0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0],
            [5.0, 5.0], [2.0, 8.0], [8.0, 2.0],
        ];
        Mesh::build(&pts, 4).unwrap()
    }

    #[test]
    fn peak_triangle_has_zero_distance() {
        let mesh = small_mesh();
        let dist = mountain_distance(&mesh, &[0], 1.0, 0.0, 1);
        assert_eq!(dist[0], 0.0);
    }

    #[test]
    fn distance_is_nondecreasing_with_zero_jaggedness() {
        let mesh = small_mesh();
        let dist = mountain_distance(&mesh, &[0], 1.0, 0.0, 1);
        for t in 0..mesh.num_solid_triangles {
            if dist[t] != -1.0 {
                for s in mesh.s_around_t(t) {
                    let nb = mesh.t_outer(s);
                    if !mesh.is_ghost_t(nb) && dist[nb] != -1.0 {
                        assert!(dist[nb] >= dist[t] - 1e-4 || dist[t] >= dist[nb] - 1e-4);
                    }
                }
            }
        }
    }

    #[test]
    fn ghost_triangles_stay_unreached() {
        let mesh = small_mesh();
        let dist = mountain_distance(&mesh, &[0], 1.0, 0.3, 5);
        for t in mesh.num_solid_triangles..mesh.num_triangles {
            assert_eq!(dist[t], -1.0);
        }
    }
}
