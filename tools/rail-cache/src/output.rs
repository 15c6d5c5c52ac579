use anyhow::{Context, Result};
use fretmap_core::rail::PolylineMap;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use std::path::Path;

/// Convert cached `[lat, lon]` points to a GeoJSON LineString
fn polyline_to_geojson(points: &[[f64; 2]]) -> Value {
    Value::LineString(points.iter().map(|&[lat, lon]| vec![lon, lat]).collect())
}

/// Create a GeoJSON Feature from one cache entry
fn entry_to_feature(key: &str, points: &[[f64; 2]]) -> Feature {
    let (from, to) = key.split_once("||").unwrap_or((key, ""));

    let mut properties = serde_json::Map::new();
    properties.insert("from".to_string(), serde_json::json!(from));
    properties.insert("to".to_string(), serde_json::json!(to));
    properties.insert("point_count".to_string(), serde_json::json!(points.len()));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(polyline_to_geojson(points))),
        id: Some(geojson::feature::Id::String(key.to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn cache_to_feature_collection(entries: &PolylineMap) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: entries.iter().map(|(key, points)| entry_to_feature(key, points)).collect(),
        foreign_members: None,
    }
}

/// Write every cached rail path to a GeoJSON file (one feature per pair)
pub fn write_cache_geojson(entries: &PolylineMap, output_path: &Path) -> Result<()> {
    log::info!("Writing {} rail paths to {}", entries.len(), output_path.display());

    let geojson = GeoJson::from(cache_to_feature_collection(entries));
    let json_string =
        serde_json::to_string_pretty(&geojson).context("Failed to serialize GeoJSON")?;

    std::fs::write(output_path, json_string)
        .with_context(|| format!("Failed to write GeoJSON to {}", output_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_become_lon_lat() {
        match polyline_to_geojson(&[[45.7, 4.8], [43.3, 5.4]]) {
            Value::LineString(coords) => {
                assert_eq!(coords, vec![vec![4.8, 45.7], vec![5.4, 43.3]]);
            }
            _ => panic!("Expected LineString value"),
        }
    }

    #[test]
    fn test_feature_properties_from_key() {
        let mut entries = PolylineMap::new();
        entries.insert("Lyon||Marseille".to_string(), vec![[45.7, 4.8], [44.5, 5.0], [43.3, 5.4]]);

        let collection = cache_to_feature_collection(&entries);
        assert_eq!(collection.features.len(), 1);

        let feature = &collection.features[0];
        assert_eq!(feature.property("from"), Some(&serde_json::json!("Lyon")));
        assert_eq!(feature.property("to"), Some(&serde_json::json!("Marseille")));
        assert_eq!(feature.property("point_count"), Some(&serde_json::json!(3)));
    }
}
