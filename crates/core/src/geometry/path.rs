use geo::{Coord, LineString};

/// Position at progress `t` along `path`.
///
/// Every segment gets the same share of `t` regardless of its length, so
/// unevenly sampled paths produce uneven apparent speed. `t` is clamped to
/// `[0, 1]`; `t = 0` and `t = 1` return the first and last points exactly.
/// Returns `None` for an empty path.
pub fn interpolate_along_path(path: &[Coord], t: f64) -> Option<Coord> {
    let (first, last) = (*path.first()?, *path.last()?);
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

    if path.len() == 1 || t == 0.0 {
        return Some(first);
    }
    if t == 1.0 {
        return Some(last);
    }

    let segments = path.len() - 1;
    let position = t * segments as f64;
    let index = (position.floor() as usize).min(segments - 1);
    let local = position - index as f64;

    let a = path[index];
    let b = path[index + 1];
    Some(Coord {
        x: a.x + (b.x - a.x) * local,
        y: a.y + (b.y - a.y) * local,
    })
}

/// Uniform-stride subsampling down to at most `max_points`, keeping the
/// first and the exact last point.
pub fn simplify_polyline(path: LineString, max_points: usize) -> LineString {
    let max_points = max_points.max(2);
    let len = path.0.len();
    if len <= max_points {
        return path;
    }

    let stride = (len - 1).div_ceil(max_points - 1);
    let mut points: Vec<Coord> = path.0.iter().step_by(stride).copied().collect();

    if (len - 1) % stride != 0 {
        points.push(path.0[len - 1]);
    }

    LineString::new(points)
}

/// Replace the endpoints with the exact platform coordinates.
pub fn snap_endpoints(mut path: LineString, from: Coord, to: Coord) -> LineString {
    if let Some(first) = path.0.first_mut() {
        *first = from;
    }
    if let Some(last) = path.0.last_mut() {
        *last = to;
    }
    path
}
