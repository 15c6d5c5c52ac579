//! Core traits for freight schedule data.
//!
//! The relational store is owned by the import pipeline; these traits are
//! the read-only view the simulation works against.

use std::sync::Arc;

use crate::identifiers::*;
use crate::models::types::*;

// ============================================================================
// Provider Trait
// ============================================================================

/// Provider of platforms, services and route aggregates
pub trait ScheduleProvider: Send + Sync {
    // ---- Lookups ----
    fn get_platform(&self, site: &SiteIdentifier) -> Option<Arc<Platform>>;
    fn get_service(&self, id: &ServiceIdentifier) -> Option<Arc<Service>>;
    fn get_route(&self, pair: &SitePair) -> Option<Arc<Route>>;

    // ---- Collections ----
    fn all_platforms(&self) -> Vec<Arc<Platform>>;
    fn all_services(&self) -> Vec<Arc<Service>>;
    fn all_routes(&self) -> Vec<Arc<Route>>;

    /// Both endpoint platforms of a pair, if both are known
    fn endpoints(&self, pair: &SitePair) -> Option<(Arc<Platform>, Arc<Platform>)> {
        Some((
            self.get_platform(&pair.origin)?,
            self.get_platform(&pair.destination)?,
        ))
    }
}
