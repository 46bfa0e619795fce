//! Wire format of the external directions service.
//!
//! Request: `GET {base}/directions/v5/{profile}/{startLon},{startLat};{endLon},{endLat}`
//! with `geometries=geojson` and the access token as query parameters. The
//! first entry of the `routes` array carries the path as a GeoJSON
//! `LineString`.

use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::{Coordinate, RouteGeometry};

pub const DEFAULT_BASE_URL: &str = "https://api.mapbox.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    DrivingTraffic,
    Driving,
    Walking,
    Cycling,
}

impl Profile {
    pub fn as_path(self) -> &'static str {
        match self {
            Profile::DrivingTraffic => "mapbox/driving-traffic",
            Profile::Driving => "mapbox/driving",
            Profile::Walking => "mapbox/walking",
            Profile::Cycling => "mapbox/cycling",
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches("mapbox/") {
            "driving-traffic" => Ok(Profile::DrivingTraffic),
            "driving" => Ok(Profile::Driving),
            "walking" => Ok(Profile::Walking),
            "cycling" => Ok(Profile::Cycling),
            other => Err(format!("unknown directions profile `{other}`")),
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum DirectionsError {
    #[error("directions request failed: {0}")]
    Network(String),
    #[error("directions request timed out after {0} ms")]
    Timeout(u64),
    #[error("directions service answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("directions service returned no route (code {code:?})")]
    NoRoute { code: Option<String> },
    #[error("malformed directions response: {0}")]
    Malformed(String),
}

/// Anything that can compute a route between two coordinates.
///
/// Implementations issue exactly one request per call: no retry, no cache.
#[allow(async_fn_in_trait)]
pub trait DirectionsClient {
    async fn fetch_route(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<RouteGeometry, DirectionsError>;
}

pub fn route_path(profile: Profile, start: Coordinate, end: Coordinate) -> String {
    format!(
        "/directions/v5/{}/{},{};{},{}",
        profile.as_path(),
        start.lon(),
        start.lat(),
        end.lon(),
        end.lat()
    )
}

pub fn route_url(
    base: &str,
    profile: Profile,
    start: Coordinate,
    end: Coordinate,
    access_token: &str,
) -> String {
    format!(
        "{}{}?geometries=geojson&access_token={}",
        base.trim_end_matches('/'),
        route_path(profile, start, end),
        access_token
    )
}

#[derive(Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    routes: Vec<RouteEntry>,
}

#[derive(Deserialize)]
struct RouteEntry {
    #[serde(default)]
    geometry: Value,
}

#[derive(Deserialize)]
struct LineGeometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Vec<[f64; 2]>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Turns a raw HTTP answer into the first route's geometry.
pub fn parse_route(status: u16, body: &[u8]) -> Result<RouteGeometry, DirectionsError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| String::from_utf8_lossy(body).chars().take(200).collect());
        return Err(DirectionsError::Status { status, message });
    }

    let response: DirectionsResponse =
        serde_json::from_slice(body).map_err(|err| DirectionsError::Malformed(err.to_string()))?;
    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or(DirectionsError::NoRoute {
            code: response.code,
        })?;

    let geometry: LineGeometry = serde_json::from_value(route.geometry)
        .map_err(|err| DirectionsError::Malformed(format!("route geometry: {err}")))?;
    if geometry.kind != "LineString" {
        return Err(DirectionsError::Malformed(format!(
            "expected LineString geometry, got {}",
            geometry.kind
        )));
    }

    let coordinates = geometry
        .coordinates
        .into_iter()
        .map(Coordinate::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| DirectionsError::Malformed(err.to_string()))?;
    RouteGeometry::new(coordinates).map_err(|err| DirectionsError::Malformed(err.to_string()))
}
