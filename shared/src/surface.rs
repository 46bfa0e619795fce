use serde::{Deserialize, Serialize};

use crate::{
    Coordinate,
    geojson::SourceData,
    style::{CirclePaint, LineLayout, LinePaint},
};

pub const ROUTE_LAYER_ID: &str = "route";
pub const START_LAYER_ID: &str = "start";
pub const END_LAYER_ID: &str = "end";

pub const DEFAULT_STYLE: &str = "mapbox://styles/mapbox/streets-v11";
pub const DEFAULT_ZOOM: f64 = 9.0;
const DEFAULT_CENTER: (f64, f64) = (-100.5, 40.0);

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("map surface could not be created: {0}")]
    Init(String),
    #[error("layer `{0}` already exists")]
    DuplicateLayer(String),
    #[error("no source named `{0}`")]
    MissingSource(String),
    #[error("map surface has been removed")]
    Removed,
    #[error("map surface call failed: {0}")]
    Backend(String),
    #[error("map surface error: {0}")]
    Runtime(String),
}

/// Options passed to the rendering surface when it is created.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOptions {
    pub center: Coordinate,
    pub zoom: f64,
    pub style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: Coordinate {
                lon: DEFAULT_CENTER.0,
                lat: DEFAULT_CENTER.1,
            },
            zoom: DEFAULT_ZOOM,
            style: DEFAULT_STYLE.to_string(),
            access_token: None,
        }
    }
}

impl MapOptions {
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Applies caller overrides on top of `self`.
    pub fn merge(mut self, overrides: &MapOptionsOverride) -> Self {
        if let Some(center) = overrides.center {
            self.center = center;
        }
        if let Some(zoom) = overrides.zoom {
            self.zoom = zoom;
        }
        if let Some(style) = &overrides.style {
            self.style = style.clone();
        }
        self
    }
}

/// Caller-supplied surface options. The container is deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapOptionsOverride {
    #[serde(default)]
    pub center: Option<Coordinate>,
    #[serde(default)]
    pub zoom: Option<f64>,
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    Line { layout: LineLayout, paint: LinePaint },
    Circle { paint: CirclePaint },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "geojson")]
pub struct GeoJsonSource {
    pub data: SourceData,
}

/// A layer with an inline source. The source takes the layer's id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSpec {
    pub id: String,
    #[serde(flatten)]
    pub kind: LayerKind,
    pub source: GeoJsonSource,
}

impl LayerSpec {
    pub fn circle(id: &str, paint: CirclePaint, data: SourceData) -> Self {
        Self {
            id: id.to_string(),
            kind: LayerKind::Circle { paint },
            source: GeoJsonSource { data },
        }
    }

    pub fn line(id: &str, layout: LineLayout, paint: LinePaint, data: SourceData) -> Self {
        Self {
            id: id.to_string(),
            kind: LayerKind::Line { layout, paint },
            source: GeoJsonSource { data },
        }
    }
}

/// The live map view. Implementations own every layer and source added to them.
pub trait MapSurface {
    fn create(container: &str, options: &MapOptions) -> Result<Self, SurfaceError>
    where
        Self: Sized;

    fn has_layer(&self, id: &str) -> bool;

    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), SurfaceError>;

    /// Replaces the data of the source named `id` in place.
    fn set_source_data(&mut self, id: &str, data: SourceData) -> Result<(), SurfaceError>;

    /// Releases the surface. Calling it more than once has no effect.
    fn remove(&mut self);

    fn is_removed(&self) -> bool;
}

/// In-memory surface with no rendering, layers kept in insertion order.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    container: String,
    options: MapOptions,
    layers: Vec<LayerSpec>,
    removed: bool,
}

impl HeadlessSurface {
    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn source_data(&self, id: &str) -> Option<&SourceData> {
        self.layer(id).map(|layer| &layer.source.data)
    }
}

impl MapSurface for HeadlessSurface {
    fn create(container: &str, options: &MapOptions) -> Result<Self, SurfaceError> {
        if container.trim().is_empty() {
            return Err(SurfaceError::Init("empty container id".into()));
        }
        Ok(Self {
            container: container.to_string(),
            options: options.clone(),
            layers: Vec::new(),
            removed: false,
        })
    }

    fn has_layer(&self, id: &str) -> bool {
        !self.removed && self.layer(id).is_some()
    }

    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), SurfaceError> {
        if self.removed {
            return Err(SurfaceError::Removed);
        }
        if self.layer(&layer.id).is_some() {
            return Err(SurfaceError::DuplicateLayer(layer.id));
        }
        self.layers.push(layer);
        Ok(())
    }

    fn set_source_data(&mut self, id: &str, data: SourceData) -> Result<(), SurfaceError> {
        if self.removed {
            return Err(SurfaceError::Removed);
        }
        let layer = self
            .layers
            .iter_mut()
            .find(|layer| layer.id == id)
            .ok_or_else(|| SurfaceError::MissingSource(id.to_string()))?;
        layer.source.data = data;
        Ok(())
    }

    fn remove(&mut self) {
        self.removed = true;
        self.layers.clear();
    }

    fn is_removed(&self) -> bool {
        self.removed
    }
}
