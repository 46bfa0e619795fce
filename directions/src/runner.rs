//! Single-threaded event loop driving a `RoutePanel` without a browser.
//!
//! Route requests run as local tasks on a `LocalSet`; their answers are fed
//! back to the panel as they land, so out-of-order responses exercise the
//! panel's request sequencing the same way rapid clicks do in the browser.

use std::time::Duration;

use serde::Serialize;
use shared::{
    Coordinate, LngLat, RouteGeometry,
    directions::{DirectionsClient, DirectionsError},
    panel::{PanelError, PanelHost, RouteOutcome, RoutePanel, RouteTicket},
    surface::{HeadlessSurface, MapSurface},
};
use tokio::task::{JoinError, JoinSet, LocalSet};

/// Clicks to replay once the surface is ready.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub clicks: Vec<Coordinate>,
    pub click_delay: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub issued: usize,
    pub drawn: usize,
    pub stale: usize,
    pub failed: usize,
    pub detached: usize,
}

impl RunReport {
    fn record(&mut self, outcome: &RouteOutcome) {
        match outcome {
            RouteOutcome::Drawn => self.drawn += 1,
            RouteOutcome::Stale => self.stale += 1,
            RouteOutcome::Failed(_) => self.failed += 1,
            RouteOutcome::Detached => self.detached += 1,
        }
    }
}

/// Host that logs every panel callback and keeps the reported errors.
#[derive(Debug, Default)]
pub struct LoggingHost {
    pub errors: Vec<PanelError>,
    pub last_route_km: Option<f64>,
}

impl PanelHost<HeadlessSurface> for LoggingHost {
    fn on_created(&mut self, surface: &HeadlessSurface) {
        tracing::info!(
            "surface created in `{}`: center={:?} zoom={} style={}",
            surface.container(),
            surface.options().center,
            surface.options().zoom,
            surface.options().style
        );
    }

    fn on_loaded(&mut self, _surface: &HeadlessSurface) {
        tracing::info!("surface loaded");
    }

    fn on_route(&mut self, route: &RouteGeometry) {
        let km = route.distance_km();
        tracing::info!("route drawn: {} points, {km:.2} km", route.len());
        self.last_route_km = Some(km);
    }

    fn on_error(&mut self, error: &PanelError) {
        tracing::warn!("panel reported: {error}");
        self.errors.push(error.clone());
    }

    fn on_removed(&mut self) {
        tracing::info!("surface removed");
    }
}

type Answer = (RouteTicket, Result<RouteGeometry, DirectionsError>);

/// Marks the surface ready, replays `script` and waits for every request.
pub async fn run<C, S, H>(client: C, panel: &mut RoutePanel<S, H>, script: &Script) -> RunReport
where
    C: DirectionsClient + Clone + 'static,
    S: MapSurface,
    H: PanelHost<S>,
{
    let local = LocalSet::new();
    local
        .run_until(async move {
            let mut report = RunReport::default();
            let mut in_flight: JoinSet<Answer> = JoinSet::new();
            let dispatch = |set: &mut JoinSet<Answer>, report: &mut RunReport, ticket: RouteTicket| {
                report.issued += 1;
                let client = client.clone();
                set.spawn_local(async move { ticket.resolve(&client).await });
            };

            if let Some(ticket) = panel.on_ready() {
                dispatch(&mut in_flight, &mut report, ticket);
            }

            for click in &script.clicks {
                let pause = tokio::time::sleep(script.click_delay);
                tokio::pin!(pause);
                loop {
                    tokio::select! {
                        _ = &mut pause => break,
                        Some(joined) = in_flight.join_next() => apply(panel, joined, &mut report),
                    }
                }

                let position = LngLat {
                    lng: click.lon(),
                    lat: click.lat(),
                };
                match panel.on_click(position) {
                    Ok(Some(ticket)) => dispatch(&mut in_flight, &mut report, ticket),
                    Ok(None) => tracing::debug!("click at {:?} ignored", click),
                    // already reported to the host
                    Err(_) => {}
                }
            }

            while let Some(joined) = in_flight.join_next().await {
                apply(panel, joined, &mut report);
            }
            report
        })
        .await
}

fn apply<S, H>(panel: &mut RoutePanel<S, H>, joined: Result<Answer, JoinError>, report: &mut RunReport)
where
    S: MapSurface,
    H: PanelHost<S>,
{
    match joined {
        Ok((ticket, result)) => {
            let outcome = panel.apply_route(ticket, result);
            tracing::debug!("route response #{}: {:?}", ticket.id, outcome);
            report.record(&outcome);
        }
        Err(err) => tracing::error!("route request task failed: {err}"),
    }
}
