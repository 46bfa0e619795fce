use seed::prelude::*;
use shared::{
    Coordinate, RouteGeometry,
    directions::{DEFAULT_BASE_URL, DirectionsClient, DirectionsError, Profile, parse_route, route_url},
};

const DEFAULT_TIMEOUT_MS: u32 = 10_000;

pub fn directions_root() -> String {
    if let Some(url) = option_env!("DIRECTIONS_BASE_URL") {
        return url.trim_end_matches('/').to_string();
    }
    DEFAULT_BASE_URL.to_string()
}

pub fn access_token() -> String {
    option_env!("MAPBOX_ACCESS_TOKEN").unwrap_or_default().to_string()
}

/// `DirectionsClient` running on the browser's fetch.
#[derive(Clone, Debug)]
pub struct SeedDirections {
    base_url: String,
    profile: Profile,
    access_token: String,
    timeout_ms: u32,
}

impl SeedDirections {
    pub fn new(base_url: String, access_token: String) -> Self {
        Self {
            base_url,
            profile: Profile::DrivingTraffic,
            access_token,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn from_env() -> Self {
        Self::new(directions_root(), access_token())
    }

    fn classify(&self, err: FetchError) -> DirectionsError {
        if is_abort(&err) {
            DirectionsError::Timeout(u64::from(self.timeout_ms))
        } else {
            DirectionsError::Network(format!("{err:?}"))
        }
    }
}

/// The request timeout aborts the fetch through its `AbortController`, which
/// rejects the pending promise with an `AbortError` `DOMException`.
fn is_abort(err: &FetchError) -> bool {
    match err {
        FetchError::NetworkError(value) | FetchError::PromiseError(value) => value
            .dyn_ref::<web_sys::DomException>()
            .is_some_and(|exception| exception.name() == "AbortError"),
        FetchError::DomException(exception) => exception.name() == "AbortError",
        _ => false,
    }
}

impl DirectionsClient for SeedDirections {
    async fn fetch_route(
        &self,
        start: Coordinate,
        end: Coordinate,
    ) -> Result<RouteGeometry, DirectionsError> {
        let url = route_url(&self.base_url, self.profile, start, end, &self.access_token);
        let response = Request::new(url)
            .method(Method::Get)
            .timeout(self.timeout_ms)
            .fetch()
            .await
            .map_err(|err| self.classify(err))?;
        let status = response.status().code;
        let body = response.text().await.map_err(|err| self.classify(err))?;
        parse_route(status, body.as_bytes())
    }
}
