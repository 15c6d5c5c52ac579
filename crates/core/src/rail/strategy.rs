//! Ordered fallbacks for coaxing a rail route out of the routing service.
//!
//! Platforms often sit a few hundred metres off the rail graph, so an
//! unmodified request fails surprisingly often. Each strategy proposes
//! candidate endpoint pairs and stops at the first one that routes.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use geo::{Coord, LineString};
use itertools::iproduct;
use tracing::debug;

use crate::rail::brouter::RoutingService;
use crate::rail::overpass::NodeLocator;
use crate::rail::pacer::{ExternalCall, Pacer};

/// `(dlat, dlon)` offsets of roughly 0.5 to 1.4 km.
pub const SMALL_OFFSETS: [(f64, f64); 8] = [
    (0.005, 0.0),
    (-0.005, 0.0),
    (0.0, 0.007),
    (0.0, -0.007),
    (0.008, 0.008),
    (-0.008, -0.008),
    (0.0125, 0.0),
    (-0.0125, 0.0),
];

/// Search radii for node snapping, in kilometres.
pub const SNAP_RADII_KM: [u32; 5] = [3, 5, 8, 12, 20];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Endpoints {
    pub from: Coord,
    pub to: Coord,
}

impl Endpoints {
    pub fn new(from: Coord, to: Coord) -> Self {
        Self { from, to }
    }

    fn shift_from(self, (dlat, dlon): (f64, f64)) -> Self {
        Self {
            from: Coord { x: self.from.x + dlon, y: self.from.y + dlat },
            ..self
        }
    }

    fn shift_to(self, (dlat, dlon): (f64, f64)) -> Self {
        Self {
            to: Coord { x: self.to.x + dlon, y: self.to.y + dlat },
            ..self
        }
    }
}

/// External collaborators a strategy may call, all behind the same pacer.
#[derive(Clone, Copy)]
pub struct ExternalServices<'a> {
    pub routing: &'a dyn RoutingService,
    pub locator: &'a dyn NodeLocator,
    pub pacer: &'a dyn Pacer,
}

pub trait FallbackStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// First route found among this strategy's candidates, if any.
    fn attempt<'a>(
        &'a self,
        endpoints: Endpoints,
        services: ExternalServices<'a>,
    ) -> BoxFuture<'a, Option<LineString>>;
}

/// The unmodified pair, then each offset applied to the origin, then each
/// applied to the destination.
pub fn perturbations(endpoints: Endpoints, offsets: &[(f64, f64)]) -> Vec<Endpoints> {
    std::iter::once(endpoints)
        .chain(offsets.iter().map(|&offset| endpoints.shift_from(offset)))
        .chain(offsets.iter().map(|&offset| endpoints.shift_to(offset)))
        .collect()
}

/// Route each candidate in turn until one succeeds.
///
/// Failures of any kind only end the current candidate.
pub async fn try_candidates(
    strategy: &'static str,
    candidates: impl IntoIterator<Item = Endpoints>,
    services: ExternalServices<'_>,
) -> Option<LineString> {
    for (attempt, candidate) in candidates.into_iter().enumerate() {
        services.pacer.pause(ExternalCall::Routing).await;

        match services.routing.route(candidate.from, candidate.to).await {
            Ok(path) => {
                debug!(strategy, attempt, points = path.0.len(), "candidate routed");
                return Some(path);
            }
            Err(e) => debug!(strategy, attempt, error = %e, "candidate failed"),
        }
    }

    None
}

/// Exact coordinates first, then small nudges of either endpoint.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectPerturbation;

impl FallbackStrategy for DirectPerturbation {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn attempt<'a>(
        &'a self,
        endpoints: Endpoints,
        services: ExternalServices<'a>,
    ) -> BoxFuture<'a, Option<LineString>> {
        try_candidates(self.name(), perturbations(endpoints, &SMALL_OFFSETS), services).boxed()
    }
}

/// Move endpoints onto nearby railway nodes, then retry the direct list.
#[derive(Clone, Debug)]
pub struct NodeSnap {
    pub radii_km: Vec<u32>,
}

impl Default for NodeSnap {
    fn default() -> Self {
        Self {
            radii_km: SNAP_RADII_KM.to_vec(),
        }
    }
}

impl NodeSnap {
    async fn snap(&self, point: Coord, services: ExternalServices<'_>) -> Option<Coord> {
        for &radius_km in &self.radii_km {
            services.pacer.pause(ExternalCall::NodeSearch).await;

            match services.locator.nearest_rail_node(point, radius_km * 1000).await {
                Ok(Some(node)) => return Some(node),
                Ok(None) => {}
                Err(e) => debug!(radius_km, error = %e, "railway node search failed"),
            }
        }

        None
    }

    async fn run(
        &self,
        endpoints: Endpoints,
        services: ExternalServices<'_>,
    ) -> Option<LineString> {
        let snapped_from = self.snap(endpoints.from, services).await;
        let snapped_to = self.snap(endpoints.to, services).await;

        let mut variants = Vec::new();
        if let (Some(from), Some(to)) = (snapped_from, snapped_to) {
            variants.push(Endpoints::new(from, to));
        }
        if let Some(from) = snapped_from {
            variants.push(Endpoints { from, ..endpoints });
        }
        if let Some(to) = snapped_to {
            variants.push(Endpoints { to, ..endpoints });
        }

        for variant in variants {
            let candidates = perturbations(variant, &SMALL_OFFSETS);
            if let Some(path) = try_candidates(self.name(), candidates, services).await {
                return Some(path);
            }
        }

        None
    }
}

impl FallbackStrategy for NodeSnap {
    fn name(&self) -> &'static str {
        "node_snap"
    }

    fn attempt<'a>(
        &'a self,
        endpoints: Endpoints,
        services: ExternalServices<'a>,
    ) -> BoxFuture<'a, Option<LineString>> {
        self.run(endpoints, services).boxed()
    }
}

/// Offsets of roughly 2 to 6 km, diagonals included.
pub fn wide_offsets() -> Vec<(f64, f64)> {
    const STEPS: [f64; 3] = [-0.04, 0.0, 0.04];

    let mut offsets = vec![(0.02, 0.0), (-0.02, 0.0), (0.0, 0.03), (0.0, -0.03)];
    offsets.extend(iproduct!(STEPS, STEPS).filter(|&(dlat, dlon)| dlat != 0.0 || dlon != 0.0));
    offsets
}

/// Larger jumps of the origin, then of the destination.
#[derive(Clone, Debug)]
pub struct WideOffset {
    pub offsets: Vec<(f64, f64)>,
}

impl Default for WideOffset {
    fn default() -> Self {
        Self {
            offsets: wide_offsets(),
        }
    }
}

impl FallbackStrategy for WideOffset {
    fn name(&self) -> &'static str {
        "wide_offset"
    }

    fn attempt<'a>(
        &'a self,
        endpoints: Endpoints,
        services: ExternalServices<'a>,
    ) -> BoxFuture<'a, Option<LineString>> {
        // the unmodified pair already failed in the direct phase
        let candidates = perturbations(endpoints, &self.offsets).into_iter().skip(1);
        try_candidates(self.name(), candidates, services).boxed()
    }
}

pub fn default_chain() -> Vec<Box<dyn FallbackStrategy>> {
    vec![
        Box::new(DirectPerturbation),
        Box::new(NodeSnap::default()),
        Box::new(WideOffset::default()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rail::error::FetchError;
    use crate::rail::pacer::NoPacing;
    use approx::assert_abs_diff_eq;
    use std::sync::Mutex;

    const FROM: Coord = Coord { x: 4.80, y: 45.70 };
    const TO: Coord = Coord { x: 5.40, y: 43.30 };

    /// Routes only the listed candidate and records every request.
    struct ScriptedRouting {
        accept: Option<Endpoints>,
        calls: Mutex<Vec<Endpoints>>,
    }

    impl ScriptedRouting {
        fn new(accept: Option<Endpoints>) -> Self {
            Self {
                accept,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Endpoints> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl RoutingService for ScriptedRouting {
        fn route<'a>(
            &'a self,
            from: Coord,
            to: Coord,
        ) -> BoxFuture<'a, Result<LineString, FetchError>> {
            let candidate = Endpoints::new(from, to);
            self.calls.lock().unwrap().push(candidate);
            let result = if self.accept == Some(candidate) {
                Ok(LineString::new(vec![from, to]))
            } else {
                Err(FetchError::NoRoute("not mapped".to_string()))
            };
            futures_util::future::ready(result).boxed()
        }
    }

    /// Finds a node only beyond `min_radius_m`, at a fixed offset.
    struct RingLocator {
        min_radius_m: u32,
        radii: Mutex<Vec<u32>>,
    }

    impl NodeLocator for RingLocator {
        fn nearest_rail_node<'a>(
            &'a self,
            around: Coord,
            radius_m: u32,
        ) -> BoxFuture<'a, Result<Option<Coord>, FetchError>> {
            self.radii.lock().unwrap().push(radius_m);
            let node = (radius_m >= self.min_radius_m).then(|| Coord {
                x: around.x + 0.03,
                y: around.y,
            });
            futures_util::future::ready(Ok(node)).boxed()
        }
    }

    fn locator(min_radius_m: u32) -> RingLocator {
        RingLocator {
            min_radius_m,
            radii: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn test_perturbation_order() {
        let candidates = perturbations(Endpoints::new(FROM, TO), &SMALL_OFFSETS);
        assert_eq!(candidates.len(), 17);
        assert_eq!(candidates[0], Endpoints::new(FROM, TO));
        assert!(candidates[1..9].iter().all(|c| c.to == TO && c.from != FROM));
        assert!(candidates[9..].iter().all(|c| c.from == FROM && c.to != TO));
        assert_abs_diff_eq!(candidates[1].from.y, 45.705, epsilon = 1e-12);
        assert_eq!(candidates[1].from.x, FROM.x);
    }

    #[test]
    fn test_wide_offsets_cover_diagonals() {
        let offsets = wide_offsets();
        assert_eq!(offsets.len(), 12);
        assert!(offsets.contains(&(0.04, -0.04)));
        assert!(!offsets.contains(&(0.0, 0.0)));
        assert!(offsets.iter().all(|&(dlat, dlon)| dlat.abs().max(dlon.abs()) >= 0.02));
    }

    #[tokio::test]
    async fn test_direct_stops_at_first_success() {
        let endpoints = Endpoints::new(FROM, TO);
        let third = perturbations(endpoints, &SMALL_OFFSETS)[2];
        let routing = ScriptedRouting::new(Some(third));
        let locator = locator(0);
        let services = ExternalServices {
            routing: &routing,
            locator: &locator,
            pacer: &NoPacing,
        };

        let path = DirectPerturbation.attempt(endpoints, services).await.unwrap();
        assert_eq!(path.0, vec![third.from, third.to]);
        assert_eq!(routing.calls().len(), 3);
        assert!(locator.radii.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_node_snap_grows_radius_and_tries_both_snapped_first() {
        let endpoints = Endpoints::new(FROM, TO);
        let locator = locator(8000);
        let snapped = Endpoints::new(
            Coord { x: FROM.x + 0.03, y: FROM.y },
            Coord { x: TO.x + 0.03, y: TO.y },
        );
        let routing = ScriptedRouting::new(Some(snapped));
        let services = ExternalServices {
            routing: &routing,
            locator: &locator,
            pacer: &NoPacing,
        };

        let path = NodeSnap::default().attempt(endpoints, services).await.unwrap();
        assert_eq!(path.0, vec![snapped.from, snapped.to]);
        assert_eq!(*locator.radii.lock().unwrap(), vec![3000, 5000, 8000, 3000, 5000, 8000]);
        assert_eq!(routing.calls(), vec![snapped]);
    }

    #[tokio::test]
    async fn test_node_snap_without_nodes_makes_no_routing_calls() {
        let locator = locator(u32::MAX);
        let routing = ScriptedRouting::new(None);
        let services = ExternalServices {
            routing: &routing,
            locator: &locator,
            pacer: &NoPacing,
        };

        assert!(NodeSnap::default().attempt(Endpoints::new(FROM, TO), services).await.is_none());
        assert_eq!(locator.radii.lock().unwrap().len(), 10);
        assert!(routing.calls().is_empty());
    }

    #[tokio::test]
    async fn test_wide_offset_skips_unmodified_pair() {
        let routing = ScriptedRouting::new(None);
        let locator = locator(0);
        let services = ExternalServices {
            routing: &routing,
            locator: &locator,
            pacer: &NoPacing,
        };

        assert!(WideOffset::default().attempt(Endpoints::new(FROM, TO), services).await.is_none());
        let calls = routing.calls();
        assert_eq!(calls.len(), 24);
        assert!(!calls.contains(&Endpoints::new(FROM, TO)));
    }
}
