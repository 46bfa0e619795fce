mod fetch;
mod surface;

use seed::{prelude::*, *};
use shared::{
    Coordinate, LngLat, RouteGeometry,
    directions::DirectionsError,
    panel::{PanelConfig, PanelError, PanelHost, RoutePanel, RouteTicket},
    surface::{MapOptions, MapOptionsOverride},
};
use wasm_bindgen::{JsCast, prelude::wasm_bindgen};

pub use fetch::SeedDirections;
pub use surface::JsSurface;

const MAP_CONTAINER: &str = "map";
const INITIAL_CENTER: (f64, f64) = (38.0983, 55.7038);

pub struct Model {
    panel: Option<RoutePanel<JsSurface, PanelStatus>>,
    client: SeedDirections,
    mount_error: Option<String>,
}

/// What the panel reported to the app so far.
#[derive(Debug, Default)]
pub struct PanelStatus {
    loaded: bool,
    removed: bool,
    route: Option<(usize, f64)>,
    last_error: Option<String>,
}

impl<S> PanelHost<S> for PanelStatus {
    fn on_loaded(&mut self, _surface: &S) {
        self.loaded = true;
    }

    fn on_route(&mut self, route: &RouteGeometry) {
        self.route = Some((route.len(), route.distance_km()));
        self.last_error = None;
    }

    fn on_error(&mut self, error: &PanelError) {
        self.last_error = Some(error.to_string());
    }

    fn on_removed(&mut self) {
        self.removed = true;
    }
}

impl PanelStatus {
    fn headline(&self) -> String {
        if self.removed {
            return "Map closed".into();
        }
        if !self.loaded {
            return "Loading map…".into();
        }
        match self.route {
            Some((points, km)) => format!("{km:.2} km route, {points} points"),
            None => "Fetching route…".into(),
        }
    }
}

pub enum Msg {
    SurfaceLoaded,
    SurfaceFailed(String),
    SurfaceError(String),
    MapClicked(Result<LngLat, String>),
    RouteFetched(RouteTicket, Result<RouteGeometry, DirectionsError>),
    Unmount,
}

fn initial_overrides() -> MapOptionsOverride {
    MapOptionsOverride {
        center: Coordinate::new(INITIAL_CENTER.0, INITIAL_CENTER.1).ok(),
        ..Default::default()
    }
}

pub fn init(_: Url, orders: &mut impl Orders<Msg>) -> Model {
    orders
        .stream(streams::window_event(Ev::from("map-load"), |_| {
            Msg::SurfaceLoaded
        }))
        .stream(streams::window_event(Ev::from("map-click"), |event| {
            Msg::MapClicked(click_payload(event))
        }))
        .stream(streams::window_event(Ev::from("map-failed"), |event| {
            Msg::SurfaceFailed(error_reason(event))
        }))
        .stream(streams::window_event(Ev::from("map-error"), |event| {
            Msg::SurfaceError(error_reason(event))
        }))
        .stream(streams::window_event(Ev::from("pagehide"), |_| Msg::Unmount));

    let client = SeedDirections::from_env();
    let options = MapOptions::default().with_access_token(fetch::access_token());
    let (panel, mount_error) = match RoutePanel::mount(
        MAP_CONTAINER,
        options,
        &initial_overrides(),
        PanelConfig::default(),
        PanelStatus::default(),
    ) {
        Ok(panel) => (Some(panel), None),
        Err(err) => {
            web_sys::console::error_1(&format!("[frontend] map mount failed: {err}").into());
            (None, Some(err.to_string()))
        }
    };

    Model {
        panel,
        client,
        mount_error,
    }
}

fn error_reason(event: web_sys::Event) -> String {
    event
        .dyn_into::<web_sys::CustomEvent>()
        .ok()
        .and_then(|event| event.detail().as_string())
        .unwrap_or_else(|| "map error".to_string())
}

fn click_payload(event: web_sys::Event) -> Result<LngLat, String> {
    let event = event
        .dyn_into::<web_sys::CustomEvent>()
        .map_err(|_| "map-click is not a CustomEvent".to_string())?;
    serde_wasm_bindgen::from_value(event.detail()).map_err(|err| err.to_string())
}

pub fn update(msg: Msg, model: &mut Model, orders: &mut impl Orders<Msg>) {
    let Some(panel) = model.panel.as_mut() else {
        return;
    };
    match msg {
        Msg::SurfaceLoaded => {
            if let Some(ticket) = panel.on_ready() {
                orders.perform_cmd(request_route(model.client.clone(), ticket));
            }
        }
        Msg::SurfaceFailed(reason) => {
            web_sys::console::error_1(&format!("[frontend] map style failed: {reason}").into());
            panel.on_surface_failed(reason);
        }
        Msg::SurfaceError(reason) => {
            web_sys::console::warn_1(&format!("[frontend] map error: {reason}").into());
            panel.on_surface_error(reason);
        }
        Msg::MapClicked(Ok(position)) => {
            web_sys::console::debug_1(
                &format!(
                    "[frontend] map click lng={:.5} lat={:.5}",
                    position.lng, position.lat
                )
                .into(),
            );
            if let Ok(Some(ticket)) = panel.on_click(position) {
                orders.perform_cmd(request_route(model.client.clone(), ticket));
            }
        }
        Msg::MapClicked(Err(err)) => {
            web_sys::console::warn_1(&format!("[frontend] unreadable click payload: {err}").into());
            panel.on_unreadable_click(err);
        }
        Msg::RouteFetched(ticket, result) => {
            let outcome = panel.apply_route(ticket, result);
            web_sys::console::debug_1(
                &format!("[frontend] route #{} {:?}", ticket.id, outcome).into(),
            );
        }
        Msg::Unmount => panel.destroy(),
    }
}

async fn request_route(client: SeedDirections, ticket: RouteTicket) -> Msg {
    let (ticket, result) = ticket.resolve(&client).await;
    Msg::RouteFetched(ticket, result)
}

pub fn view(model: &Model) -> Node<Msg> {
    let Some(panel) = &model.panel else {
        return div![
            C!["route-panel", "degraded"],
            p![C!["error"], "The map could not be created."],
            model
                .mount_error
                .as_ref()
                .map(|err| small![err])
                .unwrap_or_else(|| empty![]),
        ];
    };
    let status = panel.host();

    div![
        C!["route-panel"],
        p![C!["status"], status.headline()],
        p![
            C!["hint"],
            "Click the map to route there from the red marker."
        ],
        if let Some(error) = &status.last_error {
            p![C!["error"], error]
        } else {
            empty![]
        }
    ]
}

#[wasm_bindgen(start)]
pub fn start() {
    App::start("app", init, update, view);
}

#[cfg(test)]
mod tests {
    use shared::surface::HeadlessSurface;

    use super::*;

    fn panel() -> RoutePanel<HeadlessSurface, PanelStatus> {
        RoutePanel::mount(
            MAP_CONTAINER,
            MapOptions::default(),
            &initial_overrides(),
            PanelConfig::default(),
            PanelStatus::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_initial_center_override() {
        let overrides = initial_overrides();
        assert_eq!(overrides.center, Coordinate::new(38.0983, 55.7038).ok());
        let options = MapOptions::default().merge(&overrides);
        assert_eq!(options.zoom, 9.0);
    }

    #[test]
    fn test_headline_follows_lifecycle() {
        let mut panel = panel();
        assert_eq!(panel.host().headline(), "Loading map…");

        let ticket = panel.on_ready().unwrap();
        assert_eq!(panel.host().headline(), "Fetching route…");

        let route = RouteGeometry::new(vec![ticket.start, ticket.end]).unwrap();
        panel.apply_route(ticket, Ok(route));
        assert!(panel.host().headline().ends_with("km route, 2 points"));

        panel.destroy();
        assert_eq!(panel.host().headline(), "Map closed");
    }

    #[test]
    fn test_route_error_shown_until_next_route() {
        let mut panel = panel();
        let ticket = panel.on_ready().unwrap();
        panel.apply_route(ticket, Err(DirectionsError::Timeout(10_000)));
        assert_eq!(
            panel.host().last_error.as_deref(),
            Some("directions request timed out after 10000 ms")
        );

        let ticket = panel
            .on_click(LngLat { lng: 37.9, lat: 55.7 })
            .unwrap()
            .unwrap();
        let route = RouteGeometry::new(vec![ticket.start, ticket.end]).unwrap();
        panel.apply_route(ticket, Ok(route));
        assert!(panel.host().last_error.is_none());
    }

    #[test]
    fn test_unreadable_click_reaches_status() {
        let mut panel = panel();
        panel.on_ready();
        panel.on_unreadable_click("invalid type: string \"x\", expected f64");
        assert_eq!(
            panel.host().last_error.as_deref(),
            Some("unreadable click payload: invalid type: string \"x\", expected f64")
        );
    }

    #[test]
    fn test_tile_error_leaves_map_usable() {
        let mut panel = panel();
        panel.on_surface_error("tile 404");
        assert!(panel.on_ready().is_some());
        assert_eq!(panel.host().headline(), "Fetching route…");
        assert_eq!(
            panel.host().last_error.as_deref(),
            Some("map surface error: tile 404")
        );
    }
}
