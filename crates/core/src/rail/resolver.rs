use std::sync::Arc;

use fretmap_transit::{Route, SitePair};
use geo::{Coord, LineString};
use tracing::{debug, info, warn};

use crate::config::ResolverConfig;
use crate::geometry::{RouteGeometry, simplify_polyline, snap_endpoints};
use crate::rail::brouter::{BRouterClient, RoutingService};
use crate::rail::cache::RailGeometryCache;
use crate::rail::error::Result;
use crate::rail::overpass::{NodeLocator, OverpassClient};
use crate::rail::pacer::{FixedPacer, Pacer};
use crate::rail::strategy::{Endpoints, ExternalServices, FallbackStrategy, default_chain};
use crate::simulation::PathRegistry;

/// Resolves rail geometry for platform pairs, cache first.
pub struct RailGeometryResolver {
    cache: Arc<RailGeometryCache>,
    routing: Arc<dyn RoutingService>,
    locator: Arc<dyn NodeLocator>,
    pacer: Arc<dyn Pacer>,
    strategies: Vec<Box<dyn FallbackStrategy>>,
    max_points: usize,
}

/// Outcome of a warm-up pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WarmSummary {
    pub rail: usize,
    pub synthesized: usize,
}

impl RailGeometryResolver {
    pub fn new(
        cache: Arc<RailGeometryCache>,
        routing: Arc<dyn RoutingService>,
        locator: Arc<dyn NodeLocator>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self {
            cache,
            routing,
            locator,
            pacer,
            strategies: default_chain(),
            max_points: ResolverConfig::default().max_points,
        }
    }

    /// Resolver backed by the configured BRouter and Overpass endpoints.
    pub fn from_config(config: &ResolverConfig, cache: Arc<RailGeometryCache>) -> Result<Self> {
        let routing = Arc::new(BRouterClient::new(config)?);
        let locator = Arc::new(OverpassClient::new(config)?);
        let pacer = Arc::new(FixedPacer::from_config(config));

        Ok(Self::new(cache, routing, locator, pacer).with_max_points(config.max_points))
    }

    pub fn with_strategies(mut self, strategies: Vec<Box<dyn FallbackStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    pub fn cache(&self) -> &RailGeometryCache {
        &self.cache
    }

    /// Rail path between two platforms, or `None` once every strategy has
    /// failed.
    ///
    /// A pair already cached in either direction never reaches the network.
    /// A fresh result is simplified, stored, and returned snapped onto
    /// `from` and `to`.
    pub async fn resolve(
        &self,
        pair: &SitePair,
        from: Coord,
        to: Coord,
    ) -> Result<Option<LineString>> {
        if let Some(path) = self.cache.lookup(pair, from, to)? {
            debug!(%pair, "rail geometry cache hit");
            return Ok(Some(path));
        }

        let endpoints = Endpoints::new(from, to);
        let services = ExternalServices {
            routing: self.routing.as_ref(),
            locator: self.locator.as_ref(),
            pacer: self.pacer.as_ref(),
        };

        for strategy in &self.strategies {
            let Some(path) = strategy.attempt(endpoints, services).await else {
                debug!(%pair, strategy = strategy.name(), "strategy exhausted");
                continue;
            };

            let simplified = simplify_polyline(path, self.max_points);
            self.cache.insert(pair, &simplified)?;
            info!(
                %pair,
                strategy = strategy.name(),
                points = simplified.0.len(),
                "cached rail geometry"
            );

            return Ok(Some(snap_endpoints(simplified, from, to)));
        }

        warn!(%pair, "no rail geometry found");
        Ok(None)
    }

    /// Rail geometry when resolvable, otherwise a synthesized arc.
    pub async fn resolve_or_synthesize(
        &self,
        pair: &SitePair,
        from: Coord,
        to: Coord,
    ) -> Result<RouteGeometry> {
        Ok(match self.resolve(pair, from, to).await? {
            Some(path) => RouteGeometry::rail(path),
            None => RouteGeometry::synthesized(from, to),
        })
    }

    /// Resolve every route in order, upgrading `registry` as paths arrive.
    ///
    /// Routes are handled one at a time so pacing holds across the pass.
    pub async fn warm<'a>(
        &self,
        routes: impl IntoIterator<Item = &'a Arc<Route>>,
        registry: &PathRegistry,
    ) -> Result<WarmSummary> {
        let mut summary = WarmSummary::default();

        for route in routes {
            let geometry = self.resolve_or_synthesize(&route.pair, route.from.0, route.to.0).await?;
            if geometry.is_rail() {
                summary.rail += 1;
            } else {
                summary.synthesized += 1;
            }
            registry.insert(route.pair.clone(), geometry);
        }

        info!(
            rail = summary.rail,
            synthesized = summary.synthesized,
            "rail geometry warm-up finished"
        );
        Ok(summary)
    }
}
