use clap::Parser;
use directions::{
    AppError, MapboxDirections,
    config::Args,
    runner::{self, LoggingHost},
};
use serde_json::json;
use shared::{
    panel::{PanelConfig, RoutePanel},
    surface::HeadlessSurface,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONTAINER: &str = "route-panel";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "directions=debug,route_panel=debug,shared=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let client = MapboxDirections::new(args.directions_settings())?;
    tracing::info!(
        "using {} profile at {}",
        args.profile.as_path(),
        client.settings().base_url
    );

    let mut panel: RoutePanel<HeadlessSurface, LoggingHost> = RoutePanel::mount(
        CONTAINER,
        args.map_options(),
        &args.overrides(),
        PanelConfig::default(),
        LoggingHost::default(),
    )?;

    let report = runner::run(client, &mut panel, &args.script()).await;
    tracing::info!(
        "issued={} drawn={} stale={} failed={}",
        report.issued,
        report.drawn,
        report.stale,
        report.failed
    );

    let state = json!({
        "report": report,
        "route_km": panel.host().last_route_km,
        "layers": panel.surface().layers(),
    });
    println!("{}", serde_json::to_string_pretty(&state)?);

    panel.destroy();
    Ok(())
}
