//! Geometry emitter (C10): the split-quad index buffer that biases
//! folds toward valleys and rivers, plus the styled river-stroke buffer.

use crate::mesh::Mesh;

pub struct GeometryBuffers {
    pub positions: Vec<f32>,
    pub attributes: Vec<f32>,
    pub indices: Vec<u32>,
}

/// Positions/attributes cover regions then triangles; indices hold one
/// triangle per solid side, folded toward water so rivers run along
/// mesh edges instead of across them.
pub fn emit_geometry(
    mesh: &Mesh,
    region_elev: &[f32],
    region_rainfall: &[f32],
    triangle_elev: &[f32],
    flow_s: &[f32],
) -> GeometryBuffers {
    let num_regions = mesh.num_regions;
    let num_triangles = mesh.num_triangles;

    let mut positions = vec![0.0f32; 2 * (num_regions + num_triangles)];
    let mut attributes = vec![0.0f32; 2 * (num_regions + num_triangles)];

    for r in 0..num_regions {
        if mesh.is_ghost_r(r) {
            continue; // left at the origin/zero by convention
        }
        positions[2 * r] = mesh.region_pos[r][0];
        positions[2 * r + 1] = mesh.region_pos[r][1];
        attributes[2 * r] = region_elev[r];
        attributes[2 * r + 1] = region_rainfall[r];
    }

    for t in 0..num_triangles {
        let idx = num_regions + t;
        positions[2 * idx] = mesh.triangle_pos[t][0];
        positions[2 * idx + 1] = mesh.triangle_pos[t][1];
        if mesh.is_ghost_t(t) {
            continue;
        }
        let r = mesh.r_around_t(t);
        let avg_rain = (region_rainfall[r[0] as usize]
            + region_rainfall[r[1] as usize]
            + region_rainfall[r[2] as usize])
            / 3.0;
        attributes[2 * idx] = triangle_elev[t];
        attributes[2 * idx + 1] = avg_rain;
    }

    let mut indices = Vec::with_capacity(mesh.num_solid_sides * 3);
    for s in 0..mesh.num_solid_sides {
        let r_begin = mesh.r_begin(s) as usize;
        let r_end = mesh.r_end(s) as usize;
        let t_inner = mesh.t_inner(s);
        let t_outer = mesh.t_outer(s);

        let coastal = region_elev[r_begin] < 0.0 || region_elev[r_end] < 0.0;
        let riverine = flow_s[s] > 0.0 || flow_s[mesh.opposite(s)] > 0.0;
        let ridge_forced = mesh.is_ghost_t(t_inner) || mesh.is_ghost_t(t_outer);

        if coastal || riverine || ridge_forced {
            indices.push(r_begin as u32);
            indices.push((num_regions + t_outer) as u32);
            indices.push((num_regions + t_inner) as u32);
        } else {
            indices.push(r_begin as u32);
            indices.push(r_end as u32);
            indices.push((num_regions + t_inner) as u32);
        }
    }

    GeometryBuffers { positions, attributes, indices }
}

pub struct RiverGeometry {
    /// 12 floats per entry: 3 corner region positions, outgoing width,
    /// up to two inbound widths, the triangle's flow, its index, and one
    /// reserved slot.
    pub buffer: Vec<f32>,
    pub count: usize,
}

pub fn emit_rivers(
    mesh: &Mesh,
    flow_t: &[f32],
    flow_s: &[f32],
    mesh_spacing: f32,
    lg_min_flow: f32,
    lg_river_width: f32,
) -> RiverGeometry {
    let min_flow = lg_min_flow.exp();
    let river_width = lg_river_width.exp();

    let width_for = |s: usize, flow: f32| -> f32 {
        let a = mesh.region_pos[mesh.r_begin(s) as usize];
        let b = mesh.region_pos[mesh.r_end(s) as usize];
        let dx = b[0] - a[0];
        let dy = b[1] - a[1];
        let side_len = (dx * dx + dy * dy).sqrt().max(1e-6);
        (flow - min_flow).max(0.0).sqrt() * mesh_spacing * river_width / side_len
    };

    let mut buffer = Vec::new();
    let mut count = 0usize;

    for t in 0..mesh.num_solid_triangles {
        if flow_t[t] <= min_flow {
            continue;
        }
        let sides = mesh.s_around_t(t);
        let r = mesh.r_around_t(t);

        let mut outgoing_width = 0.0f32;
        let mut inbound_widths: Vec<f32> = Vec::with_capacity(2);
        for &s in &sides {
            let out_flow = flow_s[s];
            if out_flow > min_flow {
                outgoing_width = outgoing_width.max(width_for(s, out_flow));
            }
            let opp = mesh.opposite(s);
            let in_flow = flow_s[opp];
            if in_flow > min_flow && inbound_widths.len() < 2 {
                inbound_widths.push(width_for(opp, in_flow));
            }
        }
        while inbound_widths.len() < 2 {
            inbound_widths.push(0.0);
        }

        buffer.push(mesh.region_pos[r[0] as usize][0]);
        buffer.push(mesh.region_pos[r[0] as usize][1]);
        buffer.push(mesh.region_pos[r[1] as usize][0]);
        buffer.push(mesh.region_pos[r[1] as usize][1]);
        buffer.push(mesh.region_pos[r[2] as usize][0]);
        buffer.push(mesh.region_pos[r[2] as usize][1]);
        buffer.push(outgoing_width);
        buffer.push(inbound_widths[0]);
        buffer.push(inbound_widths[1]);
        buffer.push(flow_t[t]);
        buffer.push(t as f32);
        buffer.push(0.0);
        count += 1;
    }

    RiverGeometry { buffer, count }
}
