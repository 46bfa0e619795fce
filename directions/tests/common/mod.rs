use std::{collections::HashMap, time::Duration};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use directions::{DirectionsSettings, MapboxDirections};
use serde_json::json;
use shared::{Coordinate, directions::Profile};

pub const TOKEN: &str = "pk.test";

/// How far the mock service moves endpoints onto its imaginary road network.
pub const SNAP_OFFSET: f64 = 0.0003;

#[derive(Clone, Copy, Debug)]
#[allow(dead_code)]
pub enum Scenario {
    Snapped,
    NoRoute,
    Malformed,
    ServerError,
    Slow(u64),
}

pub async fn spawn_mock(scenario: Scenario) -> String {
    let app = Router::new()
        .route("/directions/v5/mapbox/:profile/:coords", get(directions))
        .with_state(scenario);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[allow(dead_code)]
pub fn client(base_url: String, timeout: Duration) -> MapboxDirections {
    MapboxDirections::new(DirectionsSettings {
        base_url,
        profile: Profile::DrivingTraffic,
        access_token: TOKEN.to_string(),
        timeout,
    })
    .unwrap()
}

async fn directions(
    State(scenario): State<Scenario>,
    Path((profile, coords)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if params.get("access_token").map(String::as_str) != Some(TOKEN) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Not Authorized - Invalid Token"})),
        )
            .into_response();
    }
    if params.get("geometries").map(String::as_str) != Some("geojson") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"message": "geometries must be geojson", "code": "InvalidInput"})),
        )
            .into_response();
    }
    if !["driving-traffic", "driving", "walking", "cycling"].contains(&profile.as_str()) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Profile not found", "code": "ProfileNotFound"})),
        )
            .into_response();
    }

    let points: Vec<Coordinate> = match coords
        .split(';')
        .map(str::parse::<Coordinate>)
        .collect::<Result<Vec<Coordinate>, _>>()
    {
        Ok(points) if points.len() == 2 => points,
        _ => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"message": "Invalid coordinates", "code": "InvalidInput"})),
            )
                .into_response();
        }
    };
    let (start, end) = (points[0], points[1]);

    match scenario {
        Scenario::NoRoute => Json(json!({"code": "NoRoute", "routes": []})).into_response(),
        Scenario::Malformed => {
            Json(json!({"code": "Ok", "routes": [{"geometry": "_p~iF~ps|U_ulLnnqC"}]})).into_response()
        }
        Scenario::ServerError => (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response(),
        Scenario::Slow(ms) => {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Json(snapped_route(start, end)).into_response()
        }
        Scenario::Snapped => Json(snapped_route(start, end)).into_response(),
    }
}

fn snapped_route(start: Coordinate, end: Coordinate) -> serde_json::Value {
    let mid = [
        (start.lon() + end.lon()) / 2.0,
        (start.lat() + end.lat()) / 2.0 + SNAP_OFFSET,
    ];
    json!({
        "code": "Ok",
        "routes": [{
            "geometry": {
                "type": "LineString",
                "coordinates": [
                    [start.lon() + SNAP_OFFSET, start.lat() - SNAP_OFFSET],
                    mid,
                    [end.lon() - SNAP_OFFSET, end.lat() + SNAP_OFFSET]
                ]
            },
            "duration": 600.0,
            "distance": 7300.0
        }]
    })
}
