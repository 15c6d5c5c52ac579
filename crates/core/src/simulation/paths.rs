use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use fretmap_transit::{Route, SitePair};

use crate::geometry::RouteGeometry;

/// Current path for every known pair.
///
/// Seeded with synthesized arcs so every route is drawable immediately;
/// entries are upgraded in place as rail geometry resolves.
#[derive(Default)]
pub struct PathRegistry {
    paths: RwLock<HashMap<SitePair, Arc<RouteGeometry>>>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded<'a>(routes: impl IntoIterator<Item = &'a Route>) -> Self {
        let paths = routes
            .into_iter()
            .map(|route| {
                let geometry = RouteGeometry::synthesized(route.from.0, route.to.0);
                (route.pair.clone(), Arc::new(geometry))
            })
            .collect();

        Self {
            paths: RwLock::new(paths),
        }
    }

    pub fn get(&self, pair: &SitePair) -> Option<Arc<RouteGeometry>> {
        self.paths
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(pair)
            .cloned()
    }

    pub fn insert(&self, pair: SitePair, geometry: RouteGeometry) {
        self.paths
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pair, Arc::new(geometry));
    }

    pub fn len(&self) -> usize {
        self.paths.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rail_count(&self) -> usize {
        self.paths
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|g| g.is_rail())
            .count()
    }
}
