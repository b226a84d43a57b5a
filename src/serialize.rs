//! Point blob serialization (C12): caches Poisson sampler output between
//! runs as a little-endian sequence of 16-bit unsigned integers.

use crate::error::GenError;
use crate::points::{PointCounts, PointSet};

const RANGE_MIN: f32 = -100.0;
const RANGE_MAX: f32 = 1100.0;
const RANGE_SPAN: f32 = RANGE_MAX - RANGE_MIN;

fn encode_coord(v: f32) -> Result<u16, GenError> {
    if !(RANGE_MIN..=RANGE_MAX).contains(&v) {
        return Err(GenError::RangeError(format!(
            "coordinate {v} outside the declared rescale range [{RANGE_MIN}, {RANGE_MAX}]"
        )));
    }
    let t = (v - RANGE_MIN) / RANGE_SPAN;
    Ok((t * 65535.0).round() as u16)
}

fn decode_coord(v: u16) -> f32 {
    (v as f32 / 65535.0) * RANGE_SPAN + RANGE_MIN
}

fn encode_count(n: usize) -> Result<u16, GenError> {
    u16::try_from(n).map_err(|_| {
        GenError::RangeError(format!("point count {n} does not fit in the blob's 16-bit header"))
    })
}

pub fn encode(set: &PointSet) -> Result<Vec<u8>, GenError> {
    let mut words = Vec::with_capacity(3 + set.points.len() * 2);
    words.push(encode_count(set.counts.num_exterior_boundary)?);
    words.push(encode_count(set.counts.num_interior_boundary)?);
    words.push(encode_count(set.counts.num_mountain_peaks)?);
    for p in &set.points {
        words.push(encode_coord(p[0])?);
        words.push(encode_coord(p[1])?);
    }

    let mut bytes = Vec::with_capacity(words.len() * 2);
    for w in words {
        bytes.extend_from_slice(&w.to_le_bytes());
    }
    Ok(bytes)
}

pub fn decode(bytes: &[u8]) -> Result<PointSet, GenError> {
    if bytes.len() < 6 || bytes.len() % 2 != 0 {
        return Err(GenError::RangeError(format!(
            "point blob length {} is not a valid header+payload size",
            bytes.len()
        )));
    }
    let words: Vec<u16> = bytes.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect();

    let num_exterior_boundary = words[0] as usize;
    let num_interior_boundary = words[1] as usize;
    let num_mountain_peaks = words[2] as usize;
    let coord_words = &words[3..];
    if coord_words.len() % 2 != 0 {
        return Err(GenError::RangeError("point blob has a dangling coordinate".into()));
    }

    let points: Vec<[f32; 2]> = coord_words
        .chunks_exact(2)
        .map(|c| [decode_coord(c[0]), decode_coord(c[1])])
        .collect();
    let num_infill = points
        .len()
        .checked_sub(num_exterior_boundary + num_interior_boundary + num_mountain_peaks)
        .ok_or_else(|| GenError::RangeError("point blob header counts exceed payload".into()))?;

    Ok(PointSet {
        points,
        counts: PointCounts {
            num_exterior_boundary,
            num_interior_boundary,
            num_mountain_peaks,
            num_infill,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_set(points: Vec<[f32; 2]>) -> PointSet {
        PointSet {
            counts: PointCounts {
                num_exterior_boundary: 1,
                num_interior_boundary: 1,
                num_mountain_peaks: 1,
                num_infill: points.len() - 3,
            },
            points,
        }
    }

    #[test]
    fn round_trips_within_tolerance() {
        let set = make_set(vec![[0.0, 0.0], [500.0, 500.0], [999.0, 1.0], [250.0, 750.0]]);
        let bytes = encode(&set).unwrap();
        let back = decode(&bytes).unwrap();
        let tol = 1.0 / 65535.0 * 1200.0;
        for (a, b) in set.points.iter().zip(back.points.iter()) {
            assert!((a[0] - b[0]).abs() <= tol);
            assert!((a[1] - b[1]).abs() <= tol);
        }
        assert_eq!(back.counts.num_exterior_boundary, 1);
        assert_eq!(back.counts.num_interior_boundary, 1);
        assert_eq!(back.counts.num_mountain_peaks, 1);
    }

    #[test]
    fn out_of_range_coordinate_is_rejected() {
        let set = make_set(vec![[-200.0, 0.0]]);
        assert!(matches!(encode(&set), Err(GenError::RangeError(_))));
    }

    #[test]
    fn random_points_round_trip_with_small_error() {
        let mut rng = crate::rng::Rng::new(55);
        let points: Vec<[f32; 2]> = (0..64)
            .map(|_| [rng.range_f32(0.0, 1000.0), rng.range_f32(0.0, 1000.0)])
            .collect();
        let set = make_set(points.clone());
        let bytes = encode(&set).unwrap();
        let back = decode(&bytes).unwrap();
        for (a, b) in points.iter().zip(back.points.iter()) {
            assert!((a[0] - b[0]).abs() < 0.02);
            assert!((a[1] - b[1]).abs() < 0.02);
        }
    }
}
