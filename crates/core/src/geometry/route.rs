use geo::{Coord, LineString};

use crate::geometry::arc::{DEFAULT_ARC_SEGMENTS, synthesize_arc};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// Real-world rail path from the routing service
    Rail,
    /// Arc drawn because no rail path is known
    Synthesized,
}

/// The path drawn and simulated for one origin/destination pair.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteGeometry {
    pub kind: GeometryKind,
    pub path: LineString,
}

impl RouteGeometry {
    pub fn rail(path: LineString) -> Self {
        Self {
            kind: GeometryKind::Rail,
            path,
        }
    }

    pub fn synthesized(from: Coord, to: Coord) -> Self {
        Self {
            kind: GeometryKind::Synthesized,
            path: synthesize_arc(from, to, DEFAULT_ARC_SEGMENTS),
        }
    }

    pub fn is_rail(&self) -> bool {
        self.kind == GeometryKind::Rail
    }

    /// `[lat, lon]` pairs, the order the map and the cache use.
    pub fn lat_lon(&self) -> Vec<[f64; 2]> {
        self.path.0.iter().map(|c| [c.y, c.x]).collect()
    }
}
