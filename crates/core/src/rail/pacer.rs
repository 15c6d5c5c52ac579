use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::config::ResolverConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExternalCall {
    Routing,
    NodeSearch,
}

/// Delay policy applied before every external call.
pub trait Pacer: Send + Sync {
    fn pause(&self, call: ExternalCall) -> BoxFuture<'_, ()>;
}

/// Sleeps a fixed amount per kind of call.
#[derive(Clone, Debug)]
pub struct FixedPacer {
    pub routing: Duration,
    pub node_search: Duration,
}

impl FixedPacer {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            routing: config.routing_delay,
            node_search: config.overpass_delay,
        }
    }
}

impl Pacer for FixedPacer {
    fn pause(&self, call: ExternalCall) -> BoxFuture<'_, ()> {
        let delay = match call {
            ExternalCall::Routing => self.routing,
            ExternalCall::NodeSearch => self.node_search,
        };
        tokio::time::sleep(delay).boxed()
    }
}

/// No pacing at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPacing;

impl Pacer for NoPacing {
    fn pause(&self, _call: ExternalCall) -> BoxFuture<'_, ()> {
        futures_util::future::ready(()).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_fixed_pacer_delays_per_call_kind() {
        let pacer = FixedPacer::from_config(&ResolverConfig::default());

        let started = Instant::now();
        pacer.pause(ExternalCall::Routing).await;
        let routing = started.elapsed();
        assert!(routing >= Duration::from_millis(150) && routing < Duration::from_millis(200));

        let started = Instant::now();
        pacer.pause(ExternalCall::NodeSearch).await;
        let node_search = started.elapsed();
        assert!(
            node_search >= Duration::from_millis(1500) && node_search < Duration::from_millis(1600)
        );
    }
}
