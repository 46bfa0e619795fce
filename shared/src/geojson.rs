//! The GeoJSON subset the panel feeds into layer sources.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Coordinate, RouteGeometry};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Coordinate },
    LineString { coordinates: Vec<Coordinate> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub properties: Map<String, Value>,
    pub geometry: Geometry,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            properties: Map::new(),
            geometry,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

/// Data backing a `geojson` source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SourceData {
    Feature(Feature),
    FeatureCollection(FeatureCollection),
}

impl SourceData {
    /// A collection holding a single point feature, the shape marker sources use.
    pub fn point(position: Coordinate) -> Self {
        SourceData::FeatureCollection(FeatureCollection {
            features: vec![Feature::new(Geometry::Point {
                coordinates: position,
            })],
        })
    }

    pub fn line(route: &RouteGeometry) -> Self {
        SourceData::Feature(Feature::new(Geometry::LineString {
            coordinates: route.coordinates().to_vec(),
        }))
    }

    /// Every position in the data, in document order.
    pub fn coordinates(&self) -> Vec<Coordinate> {
        let features: &[Feature] = match self {
            SourceData::Feature(feature) => std::slice::from_ref(feature),
            SourceData::FeatureCollection(collection) => &collection.features,
        };
        features
            .iter()
            .flat_map(|feature| match &feature.geometry {
                Geometry::Point { coordinates } => vec![*coordinates],
                Geometry::LineString { coordinates } => coordinates.clone(),
            })
            .collect()
    }
}
