use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use geo::{Coord, LineString};
use geojson::{GeoJson, Value};
use reqwest::Url;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::rail::error::FetchError;

/// Point-to-point rail routing.
pub trait RoutingService: Send + Sync {
    /// Rail path from `from` to `to`, x = longitude, y = latitude.
    fn route<'a>(&'a self, from: Coord, to: Coord) -> BoxFuture<'a, Result<LineString, FetchError>>;
}

/// Client for a BRouter-compatible routing endpoint.
pub struct BRouterClient {
    client: reqwest::Client,
    base_url: String,
    profile: String,
}

impl BRouterClient {
    pub fn new(config: &ResolverConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.routing_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.routing_url.clone(),
            profile: config.routing_profile.clone(),
        })
    }

    fn request_url(&self, from: Coord, to: Coord) -> Result<Url, FetchError> {
        let lonlats = format!("{:.6},{:.6}|{:.6},{:.6}", from.x, from.y, to.x, to.y);
        Url::parse_with_params(
            &self.base_url,
            &[
                ("lonlats", lonlats.as_str()),
                ("profile", self.profile.as_str()),
                ("alternativeidx", "0"),
                ("format", "geojson"),
            ],
        )
        .map_err(|e| FetchError::Url(e.to_string()))
    }

    async fn fetch(&self, from: Coord, to: Coord) -> Result<LineString, FetchError> {
        let url = self.request_url(from, to)?;
        debug!(%url, "requesting rail route");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(%status, body = %first_line(&body), "routing service refused request");
            return Err(FetchError::Status(status));
        }

        parse_route(&body)
    }
}

impl RoutingService for BRouterClient {
    fn route<'a>(
        &'a self,
        from: Coord,
        to: Coord,
    ) -> BoxFuture<'a, Result<LineString, FetchError>> {
        self.fetch(from, to).boxed()
    }
}

/// First LineString of a GeoJSON FeatureCollection.
///
/// Plain-text bodies ("... not mapped", "operation killed", ...) are how the
/// service reports that no route exists.
pub fn parse_route(body: &str) -> Result<LineString, FetchError> {
    let body = body.trim_start();
    if !body.starts_with('{') {
        return Err(FetchError::NoRoute(first_line(body).to_string()));
    }

    let geojson: GeoJson = body
        .parse()
        .map_err(|e: geojson::Error| FetchError::Body(e.to_string()))?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(FetchError::Body("expected a FeatureCollection".to_string()));
    };

    let geometry = collection
        .features
        .into_iter()
        .next()
        .and_then(|feature| feature.geometry)
        .ok_or_else(|| FetchError::NoRoute("response has no route feature".to_string()))?;

    let Value::LineString(positions) = geometry.value else {
        return Err(FetchError::Body("route feature is not a LineString".to_string()));
    };

    let coords = positions
        .iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] => Ok(Coord { x: *lon, y: *lat }),
            _ => Err(FetchError::Body("position has fewer than two values".to_string())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if coords.len() < 2 {
        return Err(FetchError::NoRoute("route has fewer than two points".to_string()));
    }

    Ok(LineString::new(coords))
}

fn first_line(body: &str) -> &str {
    body.lines().next().unwrap_or_default().trim()
}
