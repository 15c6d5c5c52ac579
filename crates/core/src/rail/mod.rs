//! Real rail geometry for platform pairs.
//!
//! [`RailGeometryResolver`] checks the [`RailGeometryCache`] first and only
//! then walks its fallback strategies against the routing and map-data
//! services. Every external call goes through the injected [`Pacer`].

pub mod brouter;
pub mod cache;
pub mod error;
pub mod overpass;
pub mod pacer;
pub mod resolver;
pub mod sqlite;
pub mod strategy;

pub use brouter::{BRouterClient, RoutingService};
pub use cache::{CacheError, MemoryStore, PolylineMap, PolylineStore, RailGeometryCache};
pub use error::{FetchError, ResolveError};
pub use overpass::{NodeLocator, OverpassClient};
pub use pacer::{ExternalCall, FixedPacer, NoPacing, Pacer};
pub use resolver::{RailGeometryResolver, WarmSummary};
pub use sqlite::{RAIL_CACHE_KEY, SqliteStore};
pub use strategy::{
    DirectPerturbation, Endpoints, ExternalServices, FallbackStrategy, NodeSnap, WideOffset,
    default_chain,
};
