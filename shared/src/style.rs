use std::borrow::Cow;

use serde::Serialize;

use crate::Coordinate;

/// Fixed start of every route request.
pub const FIXED_START: (f64, f64) = (37.8948, 55.6788);
/// End point used for the route drawn when the surface becomes ready.
pub const DEFAULT_END: (f64, f64) = (37.8465, 55.6277);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CirclePaint {
    #[serde(rename = "circle-radius")]
    pub radius: f64,
    #[serde(rename = "circle-color")]
    pub color: Cow<'static, str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    Bevel,
    Round,
    Miter,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineLayout {
    #[serde(rename = "line-join")]
    pub join: LineJoin,
    #[serde(rename = "line-cap")]
    pub cap: LineCap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePaint {
    #[serde(rename = "line-color")]
    pub color: Cow<'static, str>,
    #[serde(rename = "line-width")]
    pub width: f64,
    #[serde(rename = "line-opacity")]
    pub opacity: f64,
}

pub fn start_marker() -> CirclePaint {
    CirclePaint {
        radius: 10.0,
        color: Cow::Borrowed("red"),
    }
}

pub fn end_marker() -> CirclePaint {
    CirclePaint {
        radius: 10.0,
        color: Cow::Borrowed("#f30"),
    }
}

pub fn route_layout() -> LineLayout {
    LineLayout {
        join: LineJoin::Round,
        cap: LineCap::Round,
    }
}

pub fn route_paint() -> LinePaint {
    LinePaint {
        color: Cow::Borrowed("#3887be"),
        width: 5.0,
        opacity: 0.75,
    }
}

/// A point marker: position plus circle style.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerState {
    pub position: Coordinate,
    pub paint: CirclePaint,
}
