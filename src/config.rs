//! Parameter bundle and painted constraint grid -- the two inputs
//! collaborators hand to the core, plus the spacing pair the point
//! generator and mesh are built from.

use serde::{Deserialize, Serialize};

use crate::error::GenError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElevationParams {
    pub seed: u64,
    pub island: f32,
    pub noisy_coastlines: f32,
    pub hill_height: f32,
    pub mountain_jagged: f32,
    pub mountain_sharpness: f32,
    pub ocean_depth: f32,
}

impl Default for ElevationParams {
    fn default() -> Self {
        Self {
            seed: 187,
            island: 0.5,
            noisy_coastlines: 0.02,
            hill_height: 0.02,
            mountain_jagged: 0.5,
            mountain_sharpness: 6.0,
            ocean_depth: 1.5,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BiomeParams {
    pub wind_angle_deg: f32,
    pub raininess: f32,
    pub rain_shadow: f32,
    pub evaporation: f32,
}

impl Default for BiomeParams {
    fn default() -> Self {
        Self {
            wind_angle_deg: 0.0,
            raininess: 0.9,
            rain_shadow: 0.5,
            evaporation: 0.5,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiverParams {
    pub lg_min_flow: f32,
    pub lg_river_width: f32,
    pub flow: f32,
}

impl Default for RiverParams {
    fn default() -> Self {
        Self { lg_min_flow: -4.5, lg_river_width: -3.0, flow: 0.2 }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MeshSpacing {
    pub spacing: f32,
    pub mountain_spacing: f32,
}

impl Default for MeshSpacing {
    fn default() -> Self {
        Self { spacing: 5.0, mountain_spacing: 35.0 }
    }
}

impl MeshSpacing {
    pub fn validate(&self) -> Result<(), GenError> {
        if !(self.spacing > 0.0) {
            return Err(GenError::InvalidParameter {
                field: "spacing",
                reason: "must be positive".into(),
            });
        }
        if !(self.mountain_spacing > self.spacing) {
            return Err(GenError::InvalidParameter {
                field: "mountain_spacing",
                reason: "must exceed spacing".into(),
            });
        }
        Ok(())
    }
}

/// The dense painted elevation grid authored externally (row-major,
/// values in [-1, 1]). The core treats it as read-only during a run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConstraintGrid {
    pub size: usize,
    pub constraints: Vec<f32>,
}

impl ConstraintGrid {
    pub fn validate(&self) -> Result<(), GenError> {
        if self.size < 8 {
            return Err(GenError::InvalidParameter {
                field: "constraints.size",
                reason: "must be at least 8".into(),
            });
        }
        if self.constraints.len() != self.size * self.size {
            return Err(GenError::InvalidParameter {
                field: "constraints",
                reason: format!(
                    "expected {} values for a {0}x{0} grid, got {1}",
                    self.size,
                    self.constraints.len()
                ),
            });
        }
        if self.constraints.iter().any(|v| !(-1.0..=1.0).contains(v)) {
            return Err(GenError::InvalidParameter {
                field: "constraints",
                reason: "all values must be in [-1, 1]".into(),
            });
        }
        Ok(())
    }

    /// Bilinear sample at normalized coordinates `(u, v)` in `[0, 1]`,
    /// clamping the footprint to `[0, size-2]` so the linear neighbor is
    /// always in range -- callers never see out-of-bounds reads even for
    /// `u, v` exactly at 1.0.
    pub fn sample_bilinear(&self, u: f32, v: f32) -> f32 {
        let max_idx = (self.size - 2) as f32;
        let fx = (u * (self.size - 1) as f32).clamp(0.0, max_idx);
        let fy = (v * (self.size - 1) as f32).clamp(0.0, max_idx);
        let x0 = fx as usize;
        let y0 = fy as usize;
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let at = |x: usize, y: usize| self.constraints[y * self.size + x];
        let top = at(x0, y0) + (at(x0 + 1, y0) - at(x0, y0)) * tx;
        let bot = at(x0, y0 + 1) + (at(x0 + 1, y0 + 1) - at(x0, y0 + 1)) * tx;
        top + (bot - top) * ty
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Params {
    pub elevation: ElevationParams,
    pub biomes: BiomeParams,
    pub rivers: RiverParams,
    pub mesh: MeshSpacing,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            elevation: ElevationParams::default(),
            biomes: BiomeParams::default(),
            rivers: RiverParams::default(),
            mesh: MeshSpacing::default(),
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), GenError> {
        self.mesh.validate()?;
        if !(self.elevation.mountain_sharpness > 0.0) {
            return Err(GenError::InvalidParameter {
                field: "elevation.mountain_sharpness",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_validate() {
        Params::default().validate().unwrap();
    }

    #[test]
    fn rejects_nan_mountain_sharpness() {
        let mut p = Params::default();
        p.elevation.mountain_sharpness = f32::NAN;
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_small_constraint_grid() {
        let g = ConstraintGrid { size: 4, constraints: vec![0.0; 16] };
        assert!(g.validate().is_err());
    }

    #[test]
    fn rejects_mismatched_constraint_length() {
        let g = ConstraintGrid { size: 8, constraints: vec![0.0; 10] };
        assert!(g.validate().is_err());
    }

    #[test]
    fn bilinear_sample_is_bounded_at_corners() {
        let g = ConstraintGrid { size: 8, constraints: vec![0.25; 64] };
        assert_eq!(g.sample_bilinear(1.0, 1.0), 0.25);
        assert_eq!(g.sample_bilinear(0.0, 0.0), 0.25);
    }
}
