//! Copyright 2025 - The Parcel Explorer Developers
//! SPDX-License-Identifier: GPL-3.0-or-later

use geojson::GeoJson;
use serde_json::Value;
use std::collections::HashMap;

use crate::feature_store::{AttributeValue, Feature, FeatureStore, Geometry};

/// The one identifier attribute every loaded feature carries.
pub const CANONICAL_ID_FIELD: &str = "parcel_id";

/// Legacy identifier column names seen across dataset exports, normalized to
/// [`CANONICAL_ID_FIELD`] at load time.
const ID_FIELD_ALIASES: [&str; 3] = [CANONICAL_ID_FIELD, "GlobalID", "PID"];

/// Area column some exports carry, in square meters.
const AREA_FIELD: &str = "Shape__Area";
/// Acreage derived from [`AREA_FIELD`] at load time.
pub const ACRES_FIELD: &str = "ACRES";

const ACRES_PER_SQUARE_METER: f64 = 0.000247105;

/// Parse a GeoJSON dataset and build the immutable feature store.
///
/// Load failures are fatal for the session: a malformed document, a missing
/// identifier column or an empty collection all refuse to produce a store,
/// never a partial one.
pub fn load_features(bytes: &[u8]) -> Result<FeatureStore, String> {
    let geojson = GeoJson::from_reader(bytes)
        .map_err(|e| format!("Failed to parse GeoJSON dataset: {}", e))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        other => {
            return Err(format!(
                "Expected a FeatureCollection, got {}",
                geojson_kind(&other)
            ))
        }
    };

    if collection.features.is_empty() {
        return Err("Dataset contains no features".to_string());
    }

    let id_field = detect_id_field(&collection)
        .ok_or_else(|| {
            format!(
                "Dataset has no identifier column (looked for {})",
                ID_FIELD_ALIASES.join(", ")
            )
        })?;
    log::info!(
        "Loading {} features, identifier column {:?}",
        collection.features.len(),
        id_field
    );

    let mut features = Vec::with_capacity(collection.features.len());
    for (i, feature) in collection.features.iter().enumerate() {
        let geometry = feature
            .geometry
            .as_ref()
            .ok_or_else(|| format!("Feature {} has no geometry", i))?;
        let geometry = convert_geometry(&geometry.value)
            .map_err(|e| format!("Feature {}: {}", i, e))?;

        let mut attributes = HashMap::new();
        if let Some(properties) = &feature.properties {
            for (name, value) in properties {
                attributes.insert(name.clone(), convert_value(value));
            }
        }

        // Normalize the identifier under the canonical name; features whose
        // identifier is null stay loaded but unselectable.
        let id = attributes
            .remove(&id_field)
            .filter(|v| !v.is_null())
            .map(|v| v.display());
        if let Some(id) = &id {
            attributes.insert(
                CANONICAL_ID_FIELD.to_string(),
                AttributeValue::Text(id.clone()),
            );
        }

        if let Some(area) = attributes.get(AREA_FIELD).and_then(AttributeValue::as_number) {
            let acres = (area * ACRES_PER_SQUARE_METER * 100.0).round() / 100.0;
            attributes.insert(ACRES_FIELD.to_string(), AttributeValue::Number(acres));
        }

        features.push(Feature {
            id,
            geometry,
            attributes,
        });
    }

    Ok(FeatureStore::new(features))
}

/// Read and load a dataset from disk.
#[cfg(not(target_arch = "wasm32"))]
pub fn load_dataset_file(path: &std::path::Path) -> Result<FeatureStore, String> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    load_features(&bytes)
}

/// First identifier alias that carries a value in at least one feature.
fn detect_id_field(collection: &geojson::FeatureCollection) -> Option<String> {
    for alias in ID_FIELD_ALIASES {
        let present = collection.features.iter().any(|f| {
            f.properties
                .as_ref()
                .and_then(|p| p.get(alias))
                .is_some_and(|v| !v.is_null())
        });
        if present {
            return Some(alias.to_string());
        }
    }
    None
}

fn convert_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Boolean(*b),
        Value::Number(n) => match n.as_f64() {
            Some(n) => AttributeValue::Number(n),
            None => AttributeValue::Text(n.to_string()),
        },
        Value::String(s) => AttributeValue::Text(s.clone()),
        // Nested values are kept as their JSON text for table display.
        other => AttributeValue::Text(other.to_string()),
    }
}

fn convert_geometry(value: &geojson::Value) -> Result<Geometry, String> {
    fn position(p: &[f64]) -> Result<[f64; 2], String> {
        if p.len() < 2 {
            return Err("position with fewer than two coordinates".to_string());
        }
        Ok([p[0], p[1]])
    }

    fn ring(r: &[Vec<f64>]) -> Result<Vec<[f64; 2]>, String> {
        r.iter().map(|p| position(p)).collect()
    }

    fn rings(poly: &[Vec<Vec<f64>>]) -> Result<Vec<Vec<[f64; 2]>>, String> {
        poly.iter().map(|r| ring(r)).collect()
    }

    match value {
        geojson::Value::Point(p) => Ok(Geometry::Point(position(p)?)),
        geojson::Value::Polygon(poly) => Ok(Geometry::Polygon(rings(poly)?)),
        geojson::Value::MultiPolygon(polys) => Ok(Geometry::MultiPolygon(
            polys.iter().map(|p| rings(p)).collect::<Result<_, _>>()?,
        )),
        other => {
            let kind = match other {
                geojson::Value::MultiPoint(_) => "MultiPoint",
                geojson::Value::LineString(_) => "LineString",
                geojson::Value::MultiLineString(_) => "MultiLineString",
                geojson::Value::GeometryCollection(_) => "GeometryCollection",
                _ => "unknown",
            };
            Err(format!("Unsupported geometry type {}", kind))
        }
    }
}

fn geojson_kind(geojson: &GeoJson) -> &'static str {
    match geojson {
        GeoJson::Geometry(_) => "a bare Geometry",
        GeoJson::Feature(_) => "a single Feature",
        GeoJson::FeatureCollection(_) => "a FeatureCollection",
    }
}
