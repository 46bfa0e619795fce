//! The route panel controller.
//!
//! The controller never performs I/O. Surface readiness and clicks hand back a
//! [`RouteTicket`]; the caller resolves it against a
//! [`DirectionsClient`](crate::directions::DirectionsClient) on its own event
//! loop and feeds the result to [`RoutePanel::apply_route`]. Only the most
//! recently issued ticket may draw.

use crate::{
    Coordinate, CoordinateError, LngLat, RouteGeometry,
    directions::{DirectionsClient, DirectionsError},
    geojson::SourceData,
    style::{self, DEFAULT_END, FIXED_START, MarkerState},
    surface::{
        END_LAYER_ID, LayerSpec, MapOptions, MapOptionsOverride, MapSurface, ROUTE_LAYER_ID,
        START_LAYER_ID, SurfaceError,
    },
};

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum PanelError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error(transparent)]
    Directions(#[from] DirectionsError),
    #[error("invalid click position: {0}")]
    InvalidClick(#[from] CoordinateError),
    #[error("unreadable click payload: {0}")]
    UnreadableClick(String),
}

/// Callbacks into the application hosting the panel. All default to no-ops.
pub trait PanelHost<S> {
    fn on_created(&mut self, _surface: &S) {}

    fn on_loaded(&mut self, _surface: &S) {}

    fn on_route(&mut self, _route: &RouteGeometry) {}

    fn on_error(&mut self, _error: &PanelError) {}

    fn on_removed(&mut self) {}
}

impl<S> PanelHost<S> for () {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelConfig {
    pub start: Coordinate,
    pub default_end: Coordinate,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            start: Coordinate {
                lon: FIXED_START.0,
                lat: FIXED_START.1,
            },
            default_end: Coordinate {
                lon: DEFAULT_END.0,
                lat: DEFAULT_END.1,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Surface created, style still loading.
    Loading,
    Ready,
    /// Surface failed before becoming ready.
    Failed,
    Destroyed,
}

/// One issued route request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteTicket {
    pub id: u64,
    pub start: Coordinate,
    pub end: Coordinate,
}

impl RouteTicket {
    pub async fn resolve<C: DirectionsClient>(
        self,
        client: &C,
    ) -> (RouteTicket, Result<RouteGeometry, DirectionsError>) {
        let result = client.fetch_route(self.start, self.end).await;
        (self, result)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    Drawn,
    /// A newer request was issued after this one.
    Stale,
    /// The surface was destroyed while the request was in flight.
    Detached,
    Failed(PanelError),
}

pub struct RoutePanel<S, H> {
    surface: S,
    host: H,
    config: PanelConfig,
    phase: Phase,
    end: Option<Coordinate>,
    route: Option<RouteGeometry>,
    last_issued: u64,
}

impl<S: MapSurface, H: PanelHost<S>> RoutePanel<S, H> {
    /// Creates the surface in `container` with `overrides` merged over `base`.
    pub fn mount(
        container: &str,
        base: MapOptions,
        overrides: &MapOptionsOverride,
        config: PanelConfig,
        mut host: H,
    ) -> Result<Self, PanelError> {
        let options = base.merge(overrides);
        let surface = match S::create(container, &options) {
            Ok(surface) => surface,
            Err(err) => {
                let err = PanelError::from(err);
                tracing::warn!("map surface creation failed: {err}");
                host.on_error(&err);
                return Err(err);
            }
        };
        host.on_created(&surface);
        tracing::info!("map surface created in `{container}`");

        Ok(Self {
            surface,
            host,
            config,
            phase: Phase::Loading,
            end: None,
            route: None,
            last_issued: 0,
        })
    }

    /// Surface finished loading. Fires at most once, never after `destroy`.
    pub fn on_ready(&mut self) -> Option<RouteTicket> {
        if self.phase != Phase::Loading {
            tracing::debug!("ignoring readiness in phase {:?}", self.phase);
            return None;
        }
        self.phase = Phase::Ready;
        self.host.on_loaded(&self.surface);
        tracing::info!("map surface ready");

        let ticket = self.trigger(self.config.default_end);
        if !self.surface.has_layer(START_LAYER_ID) {
            let layer = LayerSpec::circle(
                START_LAYER_ID,
                style::start_marker(),
                SourceData::point(self.config.start),
            );
            if let Err(err) = self.surface.add_layer(layer) {
                self.report(err.into());
            }
        }
        Some(ticket)
    }

    /// A pointer click on the surface. Ignored until the surface is ready.
    pub fn on_click(&mut self, position: LngLat) -> Result<Option<RouteTicket>, PanelError> {
        if self.phase != Phase::Ready {
            tracing::debug!("ignoring click in phase {:?}", self.phase);
            return Ok(None);
        }
        match Coordinate::try_from(position) {
            Ok(end) => Ok(Some(self.trigger(end))),
            Err(err) => {
                let err = PanelError::InvalidClick(err);
                self.report(err.clone());
                Err(err)
            }
        }
    }

    /// The surface could not load its style. Before readiness this degrades
    /// the panel for good.
    pub fn on_surface_failed(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        match self.phase {
            Phase::Destroyed => {}
            Phase::Loading | Phase::Failed => {
                self.phase = Phase::Failed;
                self.report(SurfaceError::Init(reason).into());
            }
            Phase::Ready => self.report(SurfaceError::Runtime(reason).into()),
        }
    }

    /// A non-fatal surface error, such as a missing tile or sprite. Reported
    /// only; the phase is unchanged.
    pub fn on_surface_error(&mut self, reason: impl Into<String>) {
        if self.phase == Phase::Destroyed {
            return;
        }
        self.report(SurfaceError::Runtime(reason.into()).into());
    }

    /// The surface delivered a click event whose payload is not a position.
    pub fn on_unreadable_click(&mut self, reason: impl Into<String>) {
        if self.is_detached() {
            return;
        }
        self.report(PanelError::UnreadableClick(reason.into()));
    }

    fn trigger(&mut self, end: Coordinate) -> RouteTicket {
        if let Err(err) = self.upsert_end_marker(end) {
            self.report(err);
        }
        self.last_issued += 1;
        tracing::debug!("route request #{} to {:?}", self.last_issued, end);
        RouteTicket {
            id: self.last_issued,
            start: self.config.start,
            end,
        }
    }

    /// Moves the end marker to `position`, creating it the first time.
    pub fn upsert_end_marker(&mut self, position: Coordinate) -> Result<(), PanelError> {
        if self.is_detached() {
            return Ok(());
        }
        self.end = Some(position);
        self.upsert(END_LAYER_ID, SourceData::point(position), |data| {
            LayerSpec::circle(END_LAYER_ID, style::end_marker(), data)
        })?;
        Ok(())
    }

    /// Applies the answer to `ticket`. Only the latest ticket may draw.
    pub fn apply_route(
        &mut self,
        ticket: RouteTicket,
        result: Result<RouteGeometry, DirectionsError>,
    ) -> RouteOutcome {
        if self.is_detached() {
            tracing::debug!("route response #{} after teardown dropped", ticket.id);
            return RouteOutcome::Detached;
        }
        if ticket.id != self.last_issued {
            tracing::debug!(
                "discarding stale route response #{} (latest #{})",
                ticket.id,
                self.last_issued
            );
            return RouteOutcome::Stale;
        }

        let route = match result {
            Ok(route) => route,
            Err(err) => {
                let err = PanelError::Directions(err);
                self.report(err.clone());
                return RouteOutcome::Failed(err);
            }
        };

        let drawn = self.upsert(ROUTE_LAYER_ID, SourceData::line(&route), |data| {
            LayerSpec::line(ROUTE_LAYER_ID, style::route_layout(), style::route_paint(), data)
        });
        match drawn {
            Ok(()) => {
                tracing::debug!(
                    "route #{} drawn: {} points, {:.2} km",
                    ticket.id,
                    route.len(),
                    route.distance_km()
                );
                self.host.on_route(&route);
                self.route = Some(route);
                RouteOutcome::Drawn
            }
            Err(err) => {
                let err = PanelError::Surface(err);
                self.report(err.clone());
                RouteOutcome::Failed(err)
            }
        }
    }

    /// Tears down the surface and every layer. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        if self.phase == Phase::Destroyed {
            return;
        }
        self.phase = Phase::Destroyed;
        self.surface.remove();
        self.host.on_removed();
        tracing::info!("map surface removed");
    }

    fn upsert(
        &mut self,
        id: &str,
        data: SourceData,
        build: impl FnOnce(SourceData) -> LayerSpec,
    ) -> Result<(), SurfaceError> {
        if self.surface.has_layer(id) {
            self.surface.set_source_data(id, data)
        } else {
            self.surface.add_layer(build(data))
        }
    }

    fn is_detached(&self) -> bool {
        self.phase == Phase::Destroyed || self.surface.is_removed()
    }

    fn report(&mut self, err: PanelError) {
        tracing::warn!("{err}");
        self.host.on_error(&err);
    }
}

impl<S, H> RoutePanel<S, H> {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn start(&self) -> Coordinate {
        self.config.start
    }

    pub fn end(&self) -> Option<Coordinate> {
        self.end
    }

    pub fn start_marker(&self) -> MarkerState {
        MarkerState {
            position: self.config.start,
            paint: style::start_marker(),
        }
    }

    pub fn end_marker(&self) -> Option<MarkerState> {
        self.end.map(|position| MarkerState {
            position,
            paint: style::end_marker(),
        })
    }

    /// The route currently on the surface.
    pub fn route(&self) -> Option<&RouteGeometry> {
        self.route.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessSurface;

    #[derive(Default)]
    struct RecordingHost {
        events: Vec<&'static str>,
        errors: Vec<PanelError>,
    }

    impl PanelHost<HeadlessSurface> for RecordingHost {
        fn on_created(&mut self, _surface: &HeadlessSurface) {
            self.events.push("created");
        }

        fn on_loaded(&mut self, _surface: &HeadlessSurface) {
            self.events.push("loaded");
        }

        fn on_route(&mut self, _route: &RouteGeometry) {
            self.events.push("route");
        }

        fn on_error(&mut self, error: &PanelError) {
            self.errors.push(error.clone());
        }

        fn on_removed(&mut self) {
            self.events.push("removed");
        }
    }

    type Panel = RoutePanel<HeadlessSurface, RecordingHost>;

    fn coord(lon: f64, lat: f64) -> Coordinate {
        Coordinate::new(lon, lat).unwrap()
    }

    fn mounted() -> Panel {
        RoutePanel::mount(
            "map",
            MapOptions::default(),
            &MapOptionsOverride::default(),
            PanelConfig::default(),
            RecordingHost::default(),
        )
        .unwrap()
    }

    fn straight(ticket: &RouteTicket) -> RouteGeometry {
        RouteGeometry::new(vec![ticket.start, ticket.end]).unwrap()
    }

    fn layer_points(panel: &Panel, id: &str) -> Vec<Coordinate> {
        panel.surface().source_data(id).unwrap().coordinates()
    }

    #[test]
    fn test_initial_load_draws_start_marker_and_route() {
        let mut panel = mounted();
        let ticket = panel.on_ready().expect("first readiness issues a request");

        assert_eq!(ticket.start, coord(37.8948, 55.6788));
        assert_eq!(ticket.end, coord(37.8465, 55.6277));
        assert_eq!(layer_points(&panel, START_LAYER_ID), vec![ticket.start]);

        let outcome = panel.apply_route(ticket, Ok(straight(&ticket)));
        assert_eq!(outcome, RouteOutcome::Drawn);
        assert!(!layer_points(&panel, ROUTE_LAYER_ID).is_empty());
        assert_eq!(panel.host().events, vec!["created", "loaded", "route"]);
    }

    #[test]
    fn test_ready_fires_once() {
        let mut panel = mounted();
        assert!(panel.on_ready().is_some());
        assert!(panel.on_ready().is_none());
        assert_eq!(
            panel.host().events.iter().filter(|e| **e == "loaded").count(),
            1
        );
    }

    #[test]
    fn test_click_replaces_marker_and_route_in_place() {
        let mut panel = mounted();
        let first = panel.on_ready().unwrap();
        panel.apply_route(first, Ok(straight(&first)));
        let layers_before = panel.surface().layer_count();

        let ticket = panel
            .on_click(LngLat {
                lng: 37.90,
                lat: 55.70,
            })
            .unwrap()
            .unwrap();
        assert_eq!(layer_points(&panel, END_LAYER_ID), vec![coord(37.90, 55.70)]);

        let route = RouteGeometry::new(vec![ticket.start, coord(37.91, 55.69), ticket.end]).unwrap();
        assert_eq!(panel.apply_route(ticket, Ok(route.clone())), RouteOutcome::Drawn);
        assert_eq!(layer_points(&panel, ROUTE_LAYER_ID), route.coordinates());
        assert_eq!(panel.surface().layer_count(), layers_before);
        assert_eq!(panel.route(), Some(&route));
    }

    #[test]
    fn test_zero_routes_keeps_previous_route() {
        let mut panel = mounted();
        let first = panel.on_ready().unwrap();
        panel.apply_route(first, Ok(straight(&first)));
        let before = layer_points(&panel, ROUTE_LAYER_ID);

        let ticket = panel
            .on_click(LngLat { lng: 37.9, lat: 55.7 })
            .unwrap()
            .unwrap();
        let err = DirectionsError::NoRoute {
            code: Some("NoRoute".into()),
        };
        let outcome = panel.apply_route(ticket, Err(err.clone()));

        assert_eq!(outcome, RouteOutcome::Failed(PanelError::Directions(err.clone())));
        assert_eq!(layer_points(&panel, ROUTE_LAYER_ID), before);
        assert_eq!(panel.host().errors, vec![PanelError::Directions(err)]);
    }

    #[test]
    fn test_destroy_before_ready_cancels_ready() {
        let mut panel = mounted();
        panel.destroy();
        assert!(panel.on_ready().is_none());
        assert_eq!(panel.host().events, vec!["created", "removed"]);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut panel = mounted();
        panel.destroy();
        panel.destroy();
        assert_eq!(panel.phase(), Phase::Destroyed);
        assert_eq!(
            panel.host().events.iter().filter(|e| **e == "removed").count(),
            1
        );
    }

    #[test]
    fn test_response_after_destroy_is_dropped() {
        let mut panel = mounted();
        let ticket = panel.on_ready().unwrap();
        panel.destroy();
        assert_eq!(
            panel.apply_route(ticket, Ok(straight(&ticket))),
            RouteOutcome::Detached
        );
        assert!(panel.host().errors.is_empty());
        assert!(panel.route().is_none());
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut panel = mounted();
        let first = panel.on_ready().unwrap();
        let second = panel
            .on_click(LngLat { lng: 37.9, lat: 55.7 })
            .unwrap()
            .unwrap();

        assert_eq!(
            panel.apply_route(second, Ok(straight(&second))),
            RouteOutcome::Drawn
        );
        assert_eq!(
            panel.apply_route(first, Ok(straight(&first))),
            RouteOutcome::Stale
        );
        assert_eq!(panel.route().unwrap().last(), coord(37.9, 55.7));
    }

    #[test]
    fn test_click_before_ready_is_ignored() {
        let mut panel = mounted();
        let ticket = panel.on_click(LngLat { lng: 1.0, lat: 1.0 }).unwrap();
        assert!(ticket.is_none());
        assert_eq!(panel.surface().layer_count(), 0);
    }

    #[test]
    fn test_invalid_click_is_reported() {
        let mut panel = mounted();
        panel.on_ready();
        let err = panel
            .on_click(LngLat {
                lng: 10.0,
                lat: f64::NAN,
            })
            .unwrap_err();
        assert!(matches!(err, PanelError::InvalidClick(_)));
        assert_eq!(panel.host().errors.len(), 1);
    }

    #[test]
    fn test_upsert_end_marker_twice_keeps_one_layer() {
        let mut panel = mounted();
        panel.upsert_end_marker(coord(1.0, 1.0)).unwrap();
        panel.upsert_end_marker(coord(2.0, 2.0)).unwrap();
        let end_layers = panel
            .surface()
            .layers()
            .iter()
            .filter(|layer| layer.id == END_LAYER_ID)
            .count();
        assert_eq!(end_layers, 1);
        assert_eq!(layer_points(&panel, END_LAYER_ID), vec![coord(2.0, 2.0)]);
        assert_eq!(panel.end_marker().unwrap().position, coord(2.0, 2.0));
        assert_eq!(panel.start_marker().paint, style::start_marker());
    }

    #[test]
    fn test_style_failure_before_ready_degrades() {
        let mut panel = mounted();
        panel.on_surface_failed("style unreachable");
        assert_eq!(panel.phase(), Phase::Failed);
        assert!(panel.on_ready().is_none());
        assert_eq!(
            panel.host().errors,
            vec![PanelError::Surface(SurfaceError::Init(
                "style unreachable".into()
            ))]
        );
    }

    #[test]
    fn test_tile_error_before_load_keeps_panel_alive() {
        let mut panel = mounted();
        panel.on_surface_error("tile 404");
        assert_eq!(panel.phase(), Phase::Loading);

        let ticket = panel.on_ready().expect("load after a tile error still readies");
        assert_eq!(panel.apply_route(ticket, Ok(straight(&ticket))), RouteOutcome::Drawn);
        let click = panel.on_click(LngLat { lng: 37.9, lat: 55.7 }).unwrap();
        assert!(click.is_some());
        assert_eq!(panel.surface().layer_count(), 3);
        assert_eq!(
            panel.host().errors,
            vec![PanelError::Surface(SurfaceError::Runtime("tile 404".into()))]
        );
    }

    #[test]
    fn test_errors_after_ready_are_runtime_errors() {
        let mut panel = mounted();
        panel.on_ready();
        panel.on_surface_error("sprite 404");
        panel.on_surface_failed("style reload failed");
        assert_eq!(panel.phase(), Phase::Ready);
        assert_eq!(
            panel.host().errors,
            vec![
                PanelError::Surface(SurfaceError::Runtime("sprite 404".into())),
                PanelError::Surface(SurfaceError::Runtime("style reload failed".into())),
            ]
        );
    }

    #[test]
    fn test_unreadable_click_is_reported() {
        let mut panel = mounted();
        panel.on_ready();
        panel.on_unreadable_click("missing field `lat`");
        assert_eq!(
            panel.host().errors,
            vec![PanelError::UnreadableClick("missing field `lat`".into())]
        );

        panel.destroy();
        panel.on_unreadable_click("late");
        assert_eq!(panel.host().errors.len(), 1);
    }

    #[test]
    fn test_mount_failure_is_returned() {
        let result: Result<Panel, _> = RoutePanel::mount(
            "",
            MapOptions::default(),
            &MapOptionsOverride::default(),
            PanelConfig::default(),
            RecordingHost::default(),
        );
        assert!(matches!(
            result,
            Err(PanelError::Surface(SurfaceError::Init(_)))
        ));
    }
}
