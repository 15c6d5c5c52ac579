//! In-memory schedule provider backed by an export of the relational store.
//!
//! Holds every platform and service in memory and aggregates services into
//! routes once, at construction.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::identifiers::*;
use crate::models::{traits::*, types::*};

/// Platforms and services exactly as exported, before validation
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScheduleExport {
    pub platforms: Vec<PlatformRecord>,
    pub services: Vec<ServiceRecord>,
}

/// In-memory schedule provider
///
/// This type is cheap to clone since all data is stored in `Arc`s.
#[derive(Clone, Debug)]
pub struct StaticScheduleProvider {
    // Core data
    platforms: Vec<Arc<Platform>>,
    services: Vec<Arc<Service>>,
    routes: Vec<Arc<Route>>,

    // Lookup maps
    platform_map: HashMap<SiteIdentifier, Arc<Platform>>,
    service_map: HashMap<ServiceIdentifier, Arc<Service>>,
    route_map: HashMap<SitePair, Arc<Route>>,
}

impl StaticScheduleProvider {
    /// Create a new empty provider
    pub fn new() -> Self {
        Self {
            platforms: Vec::new(),
            services: Vec::new(),
            routes: Vec::new(),
            platform_map: HashMap::new(),
            service_map: HashMap::new(),
            route_map: HashMap::new(),
        }
    }

    /// Validate and index an export of the relational store.
    pub fn from_export(export: ScheduleExport) -> Result<Self> {
        let platforms = export
            .platforms
            .into_iter()
            .map(Platform::try_from)
            .collect::<Result<Vec<_>>>()?;

        let services = export
            .services
            .into_iter()
            .map(Service::try_from)
            .collect::<Result<Vec<_>>>()?;

        Self::from_data(platforms, services)
    }

    /// Build provider from validated data.
    ///
    /// Every service must reference known platforms, and site codes must be unique.
    pub fn from_data(platforms: Vec<Platform>, services: Vec<Service>) -> Result<Self> {
        let platforms: Vec<Arc<Platform>> = platforms.into_iter().map(Arc::new).collect();
        let services: Vec<Arc<Service>> = services.into_iter().map(Arc::new).collect();

        // Build lookup maps
        let mut platform_map = HashMap::with_capacity(platforms.len());
        for platform in &platforms {
            if platform_map
                .insert(platform.site.clone(), platform.clone())
                .is_some()
            {
                return Err(TransitError::InvalidData(format!(
                    "duplicate platform site {}",
                    platform.site
                )));
            }
        }

        let mut service_map = HashMap::with_capacity(services.len());
        for service in &services {
            for site in [&service.origin, &service.destination] {
                if !platform_map.contains_key(site) {
                    return Err(TransitError::PlatformNotFound(site.clone()));
                }
            }
            if service_map
                .insert(service.id.clone(), service.clone())
                .is_some()
            {
                return Err(TransitError::InvalidData(format!(
                    "duplicate service id {}",
                    service.id
                )));
            }
        }

        // Aggregate services into routes, in first-seen order
        let mut order: Vec<SitePair> = Vec::new();
        let mut aggregates: HashMap<SitePair, (usize, BTreeSet<OperatorIdentifier>)> =
            HashMap::new();
        for service in &services {
            let pair = service.pair();
            let entry = aggregates.entry(pair.clone()).or_insert_with(|| {
                order.push(pair);
                (0, BTreeSet::new())
            });
            entry.0 += 1;
            entry.1.insert(service.operator.clone());
        }

        let routes: Vec<Arc<Route>> = order
            .into_iter()
            .filter_map(|pair| {
                let (weekly_frequency, operators) = aggregates.remove(&pair)?;
                let from = platform_map.get(&pair.origin)?.location;
                let to = platform_map.get(&pair.destination)?.location;
                Some(Arc::new(Route {
                    pair,
                    from,
                    to,
                    weekly_frequency,
                    operators,
                }))
            })
            .collect();

        let route_map = routes
            .iter()
            .map(|r| (r.pair.clone(), r.clone()))
            .collect();

        Ok(Self {
            platforms,
            services,
            routes,
            platform_map,
            service_map,
            route_map,
        })
    }
}

impl Default for StaticScheduleProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleProvider for StaticScheduleProvider {
    fn get_platform(&self, site: &SiteIdentifier) -> Option<Arc<Platform>> {
        self.platform_map.get(site).cloned()
    }

    fn get_service(&self, id: &ServiceIdentifier) -> Option<Arc<Service>> {
        self.service_map.get(id).cloned()
    }

    fn get_route(&self, pair: &SitePair) -> Option<Arc<Route>> {
        self.route_map.get(pair).cloned()
    }

    fn all_platforms(&self) -> Vec<Arc<Platform>> {
        self.platforms.clone()
    }

    fn all_services(&self) -> Vec<Arc<Service>> {
        self.services.clone()
    }

    fn all_routes(&self) -> Vec<Arc<Route>> {
        self.routes.clone()
    }
}
