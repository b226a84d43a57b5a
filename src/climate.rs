//! Rainfall pipeline (C8): direction-sorted sweep that advects humidity
//! downwind and converts the excess into rainfall via orographic lift.

use crate::config::BiomeParams;
use crate::mesh::Mesh;

/// Region traversal order for a given wind angle: ascending projection
/// onto the wind direction, so index 0 is the most upwind region.
/// Callers that only change other parameters can reuse this order --
/// it depends on `wind_angle_deg` alone.
pub fn wind_order(mesh: &Mesh, wind_angle_deg: f32) -> (Vec<usize>, Vec<f32>) {
    let angle = wind_angle_deg.to_radians();
    let wind_dir = [angle.cos(), angle.sin()];
    let mut projection = vec![0.0f32; mesh.num_regions];
    for r in 0..mesh.num_regions {
        if mesh.is_ghost_r(r) {
            continue;
        }
        let p = mesh.region_pos[r];
        projection[r] = p[0] * wind_dir[0] + p[1] * wind_dir[1];
    }
    let mut order: Vec<usize> = (0..mesh.num_regions).filter(|&r| !mesh.is_ghost_r(r)).collect();
    order.sort_by(|&a, &b| projection[a].total_cmp(&projection[b]));
    (order, projection)
}

/// Humidity and rainfall per region. `region_elev` indexes by region id.
pub fn compute_rainfall(
    mesh: &Mesh,
    region_elev: &[f32],
    order: &[usize],
    projection: &[f32],
    params: &BiomeParams,
) -> (Vec<f32>, Vec<f32>) {
    let mut humidity = vec![0.0f32; mesh.num_regions];
    let mut rainfall = vec![0.0f32; mesh.num_regions];

    for &r in order {
        let is_boundary = r < mesh.num_boundary_regions;
        let mut h = if is_boundary {
            1.0
        } else {
            let mut sum = 0.0f32;
            let mut count = 0u32;
            for nb in mesh.r_around_r(r) {
                let nb = nb as usize;
                if mesh.is_ghost_r(nb) || projection[nb] >= projection[r] {
                    continue;
                }
                sum += humidity[nb];
                count += 1;
            }
            if count > 0 { sum / count as f32 } else { 0.0 }
        };

        let mut rain = params.raininess * h;

        let elev = region_elev[r];
        if elev <= 0.0 {
            h += params.evaporation * elev.abs();
        }

        let capacity = 1.0 - elev;
        if h > capacity {
            let orographic = params.rain_shadow * (h - capacity);
            rain += params.raininess * orographic;
            h -= orographic;
        }

        humidity[r] = h.max(0.0);
        rainfall[r] = rain.max(0.0);
    }

    (humidity, rainfall)
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
    fn zero_raininess_yields_zero_rainfall() {
        let mesh = small_mesh();
        let elev = vec![0.1f32; mesh.num_regions];
        let (order, proj) = wind_order(&mesh, 0.0);
        let params = BiomeParams { raininess: 0.0, ..BiomeParams::default() };
        let (_h, rain) = compute_rainfall(&mesh, &elev, &order, &proj, &params);
        assert!(rain.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn full_rotation_reproduces_rainfall() {
        let mesh = small_mesh();
        let elev: Vec<f32> = (0..mesh.num_regions).map(|i| (i as f32 * 0.07).sin() * 0.3).collect();
        let params = BiomeParams::default();
        let (order0, proj0) = wind_order(&mesh, 0.0);
        let (_, rain0) = compute_rainfall(&mesh, &elev, &order0, &proj0, &params);
        let (order360, proj360) = wind_order(&mesh, 360.0);
        let (_, rain360) = compute_rainfall(&mesh, &elev, &order360, &proj360, &params);
        for (a, b) in rain0.iter().zip(rain360.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn boundary_regions_start_saturated() {
        let mesh = small_mesh();
        let elev = vec![-0.1f32; mesh.num_regions];
        let (order, proj) = wind_order(&mesh, 45.0);
        let params = BiomeParams::default();
        let (humidity, _) = compute_rainfall(&mesh, &elev, &order, &proj, &params);
        for r in 0..mesh.num_boundary_regions {
            assert!(humidity[r] >= 1.0);
        }
    }
}
