pub mod directions;
pub mod geojson;
pub mod panel;
pub mod style;
pub mod surface;

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6_371.0;

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("coordinate component is not a finite number: lon={lon}, lat={lat}")]
    NotFinite { lon: f64, lat: f64 },
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A geographic position, serialized as a GeoJSON `[lon, lat]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    lon: f64,
    lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Result<Self, CoordinateError> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(CoordinateError::NotFinite { lon, lat });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lon, lat })
    }

    pub fn lon(self) -> f64 {
        self.lon
    }

    pub fn lat(self) -> f64 {
        self.lat
    }
}

impl TryFrom<[f64; 2]> for Coordinate {
    type Error = CoordinateError;

    fn try_from([lon, lat]: [f64; 2]) -> Result<Self, Self::Error> {
        Coordinate::new(lon, lat)
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coord: Coordinate) -> Self {
        [coord.lon, coord.lat]
    }
}

impl std::str::FromStr for Coordinate {
    type Err = String;

    /// Parses `lon,lat`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lon, lat) = s
            .split_once(',')
            .ok_or_else(|| format!("expected `lon,lat`, got `{s}`"))?;
        let parse = |field: &str, label: &str| {
            field
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid {label} `{field}`"))
        };
        Coordinate::new(parse(lon, "longitude")?, parse(lat, "latitude")?).map_err(|e| e.to_string())
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..180.0).contains(&lon) {
        return lon;
    }
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Pointer position as delivered by the map surface's click event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl TryFrom<LngLat> for Coordinate {
    type Error = CoordinateError;

    fn try_from(value: LngLat) -> Result<Self, Self::Error> {
        if !value.lng.is_finite() || !value.lat.is_finite() {
            return Err(CoordinateError::NotFinite {
                lon: value.lng,
                lat: value.lat,
            });
        }
        Coordinate::new(wrap_longitude(value.lng), value.lat)
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("route geometry needs at least 2 points, got {0}")]
    TooShort(usize),
}

/// Path from the fixed start point to the current end point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coordinate>", into = "Vec<Coordinate>")]
pub struct RouteGeometry(Vec<Coordinate>);

impl RouteGeometry {
    pub fn new(coordinates: Vec<Coordinate>) -> Result<Self, GeometryError> {
        if coordinates.len() < 2 {
            return Err(GeometryError::TooShort(coordinates.len()));
        }
        Ok(Self(coordinates))
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.0
    }

    pub fn first(&self) -> Coordinate {
        self.0[0]
    }

    pub fn last(&self) -> Coordinate {
        self.0[self.0.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn distance_km(&self) -> f64 {
        self.0.windows(2).map(|w| haversine_km(w[0], w[1])).sum()
    }
}

impl TryFrom<Vec<Coordinate>> for RouteGeometry {
    type Error = GeometryError;

    fn try_from(value: Vec<Coordinate>) -> Result<Self, Self::Error> {
        RouteGeometry::new(value)
    }
}

impl From<RouteGeometry> for Vec<Coordinate> {
    fn from(geometry: RouteGeometry) -> Self {
        geometry.0
    }
}

pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}
