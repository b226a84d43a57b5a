use std::path::PathBuf;
use std::process::ExitCode;

use mapgen_core::{points, serialize};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn run() -> Result<(), mapgen_core::error::GenError> {
    let args: Vec<String> = std::env::args().collect();

    let seed: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(187);
    let mesh_spacing: f32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(5.0);
    let mountain_spacing: f32 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(35.0);
    let out_dir: PathBuf = args.get(4).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("artifacts"));

    std::fs::create_dir_all(&out_dir).map_err(|e| {
        mapgen_core::error::GenError::InvalidParameter {
            field: "out_dir",
            reason: e.to_string(),
        }
    })?;

    info!(seed, mesh_spacing, mountain_spacing, "generating point set");
    let t = std::time::Instant::now();
    let set = points::generate_points(seed, mesh_spacing, mountain_spacing)?;
    info!(
        ms = t.elapsed().as_secs_f64() * 1000.0,
        total = set.points.len(),
        exterior = set.counts.num_exterior_boundary,
        interior = set.counts.num_interior_boundary,
        peaks = set.counts.num_mountain_peaks,
        infill = set.counts.num_infill,
        "points generated"
    );

    let t = std::time::Instant::now();
    let bytes = serialize::encode(&set)?;
    let path = out_dir.join(format!("points-{mesh_spacing}.data"));
    std::fs::write(&path, &bytes).map_err(|e| mapgen_core::error::GenError::InvalidParameter {
        field: "out_dir",
        reason: e.to_string(),
    })?;
    info!(
        ms = t.elapsed().as_secs_f64() * 1000.0,
        bytes = bytes.len(),
        path = %path.display(),
        "point blob written"
    );

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "generation failed");
            ExitCode::FAILURE
        }
    }
}
