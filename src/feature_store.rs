//! Copyright 2025 - The Parcel Explorer Developers
//! SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::{BTreeSet, HashMap};

/// Sentinel category used when a feature's grouping attribute is null or missing.
pub const NA_CATEGORY: &str = "N/A";

/// One attribute value attached to a feature.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl AttributeValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Textual representation used for grouping and table display.
    /// Null renders as the [`NA_CATEGORY`] sentinel.
    pub fn display(&self) -> String {
        match self {
            AttributeValue::Text(s) => s.clone(),
            AttributeValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            AttributeValue::Boolean(b) => b.to_string(),
            AttributeValue::Null => NA_CATEGORY.to_string(),
        }
    }

    /// Truthiness used for partition flags (e.g. the licensed flag).
    pub fn as_flag(&self) -> bool {
        match self {
            AttributeValue::Boolean(b) => *b,
            AttributeValue::Number(n) => *n != 0.0,
            AttributeValue::Text(s) => matches!(s.as_str(), "true" | "yes" | "1"),
            AttributeValue::Null => false,
        }
    }
}

/// Geographic bounding box in (lon, lat) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Bounds {
    pub fn of_point(p: [f64; 2]) -> Self {
        Bounds { min: p, max: p }
    }

    pub fn merge(&mut self, other: Bounds) {
        self.min[0] = self.min[0].min(other.min[0]);
        self.min[1] = self.min[1].min(other.min[1]);
        self.max[0] = self.max[0].max(other.max[0]);
        self.max[1] = self.max[1].max(other.max[1]);
    }

    /// Center of the bounding box, used to position the map view.
    pub fn center(&self) -> [f64; 2] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
        ]
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }
}

/// Feature geometry in (lon, lat) coordinates.
///
/// Opaque to the selection/styling core; only the map renderer reads the
/// coordinates, for projection, fill triangulation and bounds math.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// First ring is the exterior, any further rings are holes.
    Polygon(Vec<Vec<[f64; 2]>>),
    MultiPolygon(Vec<Vec<Vec<[f64; 2]>>>),
    Point([f64; 2]),
}

impl Geometry {
    pub fn is_point(&self) -> bool {
        matches!(self, Geometry::Point(_))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        fn ring_bounds(ring: &[[f64; 2]]) -> Option<Bounds> {
            let mut iter = ring.iter();
            let mut bounds = Bounds::of_point(*iter.next()?);
            for p in iter {
                bounds.merge(Bounds::of_point(*p));
            }
            Some(bounds)
        }

        match self {
            Geometry::Point(p) => Some(Bounds::of_point(*p)),
            Geometry::Polygon(rings) => ring_bounds(rings.first()?),
            Geometry::MultiPolygon(polygons) => {
                let mut merged: Option<Bounds> = None;
                for rings in polygons {
                    if let Some(b) = rings.first().and_then(|r| ring_bounds(r)) {
                        match &mut merged {
                            Some(m) => m.merge(b),
                            None => merged = Some(b),
                        }
                    }
                }
                merged
            }
        }
    }
}

/// One geometric record (parcel polygon or point of interest) with attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Stable identifier. Features without one cannot be selected.
    pub id: Option<String>,
    pub geometry: Geometry,
    pub attributes: HashMap<String, AttributeValue>,
}

impl Feature {
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Category of this feature under the given grouping attribute.
    /// Missing or null values normalize to [`NA_CATEGORY`].
    pub fn category(&self, attribute: &str) -> String {
        match self.attributes.get(attribute) {
            Some(value) => value.display(),
            None => NA_CATEGORY.to_string(),
        }
    }

    /// Partition flag of this feature (e.g. licensed), false when absent.
    pub fn flag(&self, attribute: &str) -> bool {
        self.attributes
            .get(attribute)
            .map(AttributeValue::as_flag)
            .unwrap_or(false)
    }
}

/// Immutable collection of loaded features with an id lookup index.
///
/// Built once per dataset load and only replaced on explicit reload.
#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    features: Vec<Feature>,
    index: HashMap<String, usize>,
}

impl FeatureStore {
    pub fn new(features: Vec<Feature>) -> Self {
        let mut index = HashMap::new();
        for (i, feature) in features.iter().enumerate() {
            if let Some(id) = &feature.id {
                if index.insert(id.clone(), i).is_some() {
                    log::warn!("Duplicate feature id {:?}, keeping the last occurrence", id);
                }
            }
        }
        FeatureStore { features, index }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature_by_id(&self, id: &str) -> Option<&Feature> {
        self.index.get(id).map(|&i| &self.features[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Distinct categories under the given attribute, ascending and
    /// case-sensitive, independent of feature order.
    pub fn distinct_categories(&self, attribute: &str) -> Vec<String> {
        let set: BTreeSet<String> = self
            .features
            .iter()
            .map(|f| f.category(attribute))
            .collect();
        set.into_iter().collect()
    }

    /// Bounding box over all features, or over the subset accepted by `keep`.
    pub fn bounds_where<F>(&self, keep: F) -> Option<Bounds>
    where
        F: Fn(&Feature) -> bool,
    {
        let mut merged: Option<Bounds> = None;
        for feature in self.features.iter().filter(|f| keep(f)) {
            if let Some(b) = feature.geometry.bounds() {
                match &mut merged {
                    Some(m) => m.merge(b),
                    None => merged = Some(b),
                }
            }
        }
        merged
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds_where(|_| true)
    }
}
