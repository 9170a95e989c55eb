use crate::{Coordinate, Polyline};

// Pieces that come out a hair over the threshold from rounding still count as short enough
const RELATIVE_TOLERANCE: f64 = 1e-9;
// Per pair of input points
const MAX_PIECES: usize = 100_000;

/// Inserts evenly spaced points along the great circle between any two consecutive points that
/// are more than `max_segment_meters` apart. Every input point is kept, so the first and last
/// point are unchanged, and densifying the result again does nothing.
pub fn densify(polyline: &Polyline, max_segment_meters: f64) -> Polyline {
    if polyline.len() < 2 {
        return polyline.clone();
    }
    if !(max_segment_meters.is_finite() && max_segment_meters > 0.0) {
        warn!("Not densifying with a threshold of {max_segment_meters} meters");
        return polyline.clone();
    }

    let limit = max_segment_meters * (1.0 + RELATIVE_TOLERANCE);
    let input = polyline.points();
    let mut pts = Vec::with_capacity(input.len());
    pts.push(input[0]);
    for pair in input.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let dist = from.distance_to(to);
        if dist > limit {
            let mut pieces = (dist / max_segment_meters).ceil();
            if pieces > MAX_PIECES as f64 {
                warn!(
                    "Capping a {dist:.1}m gap at {MAX_PIECES} pieces, so it'll have gaps over {max_segment_meters}m"
                );
                pieces = MAX_PIECES as f64;
            }
            let pieces = pieces as usize;
            for step in 1..pieces {
                pts.push(from.point_at_ratio(to, step as f64 / pieces as f64));
            }
        }
        pts.push(to);
    }

    debug!(
        "Densified {} points to {} at {max_segment_meters}m",
        polyline.len(),
        pts.len()
    );
    Polyline::new(pts)
}
