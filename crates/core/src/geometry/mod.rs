pub mod arc;
pub mod path;
pub mod route;

pub use arc::{DEFAULT_ARC_SEGMENTS, synthesize_arc};
pub use path::{interpolate_along_path, simplify_polyline, snap_endpoints};
pub use route::{GeometryKind, RouteGeometry};
