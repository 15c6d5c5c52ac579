use geo::{Coord, LineString};

pub const DEFAULT_ARC_SEGMENTS: usize = 25;

/// Perpendicular displacement of the control point, as a fraction of the
/// endpoint distance.
const ARC_BULGE: f64 = 0.18;

/// Quadratic Bézier arc from `from` to `to`, used when no rail geometry is
/// known for a pair.
///
/// Works directly in lon/lat degrees. Returns `segments + 1` points; the
/// first and last are exactly `from` and `to`. Coincident endpoints give the
/// repeated point, and zero segments give `from` alone.
pub fn synthesize_arc(from: Coord, to: Coord, segments: usize) -> LineString {
    if segments == 0 {
        return LineString::new(vec![from]);
    }

    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let distance = dx.hypot(dy);

    if distance == 0.0 {
        return LineString::new(vec![from; segments + 1]);
    }

    let mid = Coord {
        x: (from.x + to.x) / 2.0,
        y: (from.y + to.y) / 2.0,
    };
    let offset = ARC_BULGE * distance;
    let control = Coord {
        x: mid.x - dy / distance * offset,
        y: mid.y + dx / distance * offset,
    };

    let points = (0..=segments)
        .map(|i| {
            if i == segments {
                return to;
            }
            let t = i as f64 / segments as f64;
            let u = 1.0 - t;
            Coord {
                x: u * u * from.x + 2.0 * u * t * control.x + t * t * to.x,
                y: u * u * from.y + 2.0 * u * t * control.y + t * t * to.y,
            }
        })
        .collect();

    LineString::new(points)
}
