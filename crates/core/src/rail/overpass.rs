use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use geo::Coord;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::rail::error::FetchError;

/// Railway node kinds an endpoint may be snapped onto.
pub const RAILWAY_NODE_PATTERN: &str = "^(station|halt|yard|junction|facility)$";

/// Finds rail infrastructure near a point.
pub trait NodeLocator: Send + Sync {
    /// Closest railway node within `radius_m` metres of `around`.
    fn nearest_rail_node<'a>(
        &'a self,
        around: Coord,
        radius_m: u32,
    ) -> BoxFuture<'a, Result<Option<Coord>, FetchError>>;
}

/// Client for an Overpass-compatible interpreter.
pub struct OverpassClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Deserialize)]
struct OverpassElement {
    lat: Option<f64>,
    lon: Option<f64>,
}

impl OverpassClient {
    pub fn new(config: &ResolverConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.overpass_timeout)
            .build()?;

        Ok(Self {
            client,
            url: config.overpass_url.clone(),
        })
    }

    async fn query_nearest(
        &self,
        around: Coord,
        radius_m: u32,
    ) -> Result<Option<Coord>, FetchError> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(node_query(around, radius_m))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        let nearest = nearest_node(&body, around)?;
        debug!(
            lat = around.y,
            lon = around.x,
            radius_m,
            found = nearest.is_some(),
            "railway node search"
        );
        Ok(nearest)
    }
}

impl NodeLocator for OverpassClient {
    fn nearest_rail_node<'a>(
        &'a self,
        around: Coord,
        radius_m: u32,
    ) -> BoxFuture<'a, Result<Option<Coord>, FetchError>> {
        self.query_nearest(around, radius_m).boxed()
    }
}

pub fn node_query(around: Coord, radius_m: u32) -> String {
    format!(
        "[out:json][timeout:25];\
         node[\"railway\"~\"{RAILWAY_NODE_PATTERN}\"](around:{radius_m},{:.6},{:.6});out;",
        around.y, around.x
    )
}

/// Element of an Overpass JSON answer closest to `around`.
///
/// Distance is plain Euclidean in degrees; elements without coordinates
/// are skipped.
pub fn nearest_node(body: &str, around: Coord) -> Result<Option<Coord>, FetchError> {
    let response: OverpassResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Body(e.to_string()))?;

    let nearest = response
        .elements
        .into_iter()
        .filter_map(|element| Some(Coord { x: element.lon?, y: element.lat? }))
        .filter(|c| c.x.is_finite() && c.y.is_finite())
        .map(|c| (c, (c.x - around.x).hypot(c.y - around.y)))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(c, _)| c);

    Ok(nearest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AROUND: Coord = Coord { x: 4.80, y: 45.70 };

    #[test]
    fn test_query_shape() {
        let query = node_query(AROUND, 3000);
        assert!(query.starts_with("[out:json]"));
        assert!(query.contains(r#"node["railway"~"^(station|halt|yard|junction|facility)$"]"#));
        assert!(query.contains("(around:3000,45.700000,4.800000)"));
        assert!(query.ends_with("out;"));
    }

    #[test]
    fn test_picks_nearest_element() {
        let body = r#"{
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 1, "lat": 45.75, "lon": 4.85},
                {"type": "node", "id": 2, "lat": 45.71, "lon": 4.79},
                {"type": "node", "id": 3},
                {"type": "node", "id": 4, "lat": 45.60, "lon": 4.80}
            ]
        }"#;
        assert_eq!(nearest_node(body, AROUND).unwrap(), Some(Coord { x: 4.79, y: 45.71 }));
    }

    #[test]
    fn test_no_elements() {
        assert_eq!(nearest_node(r#"{"elements": []}"#, AROUND).unwrap(), None);
        assert_eq!(nearest_node("{}", AROUND).unwrap(), None);
    }

    #[test]
    fn test_error_page_is_a_body_error() {
        let body = "<?xml version=\"1.0\"?><html><body>rate_limited</body></html>";
        assert!(matches!(nearest_node(body, AROUND), Err(FetchError::Body(_))));
    }
}
