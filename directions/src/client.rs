use std::time::Duration;

use shared::{
    Coordinate, RouteGeometry,
    directions::{DirectionsClient, DirectionsError, Profile, parse_route, route_url},
};

use crate::error::AppError;

/// Connection settings for the directions service.
#[derive(Debug, Clone)]
pub struct DirectionsSettings {
    pub base_url: String,
    pub profile: Profile,
    pub access_token: String,
    pub timeout: Duration,
}

/// `DirectionsClient` backed by the Mapbox Directions HTTP API.
///
/// Every call is a single GET bounded by `DirectionsSettings::timeout`. The
/// underlying `reqwest::Client` is shared by clones.
#[derive(Clone)]
pub struct MapboxDirections {
    http: reqwest::Client,
    settings: DirectionsSettings,
}

impl MapboxDirections {
    pub fn new(settings: DirectionsSettings) -> Result<Self, AppError> {
        if settings.access_token.trim().is_empty() {
            return Err(AppError::MissingToken);
        }
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &DirectionsSettings {
        &self.settings
    }

    fn classify(&self, err: reqwest::Error) -> DirectionsError {
        if err.is_timeout() {
            DirectionsError::Timeout(self.settings.timeout.as_millis() as u64)
        } else {
            // the URL carries the access token
            DirectionsError::Network(err.without_url().to_string())
        }
    }
}

impl DirectionsClient for MapboxDirections {
    async fn fetch_route(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<RouteGeometry, DirectionsError> {
        let url = route_url(
            &self.settings.base_url,
            self.settings.profile,
            start,
            end,
            &self.settings.access_token,
        );
        tracing::debug!(
            "requesting {} route {:?} -> {:?}",
            self.settings.profile.as_path(),
            start,
            end
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| self.classify(err))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|err| self.classify(err))?;

        let route = parse_route(status, &body);
        match &route {
            Ok(geometry) => tracing::debug!(
                "directions answered {status} with {} points",
                geometry.len()
            ),
            Err(err) => tracing::warn!("directions request failed: {err}"),
        }
        route
    }
}
