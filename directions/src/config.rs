use std::time::Duration;

use clap::Parser;
use shared::{
    Coordinate,
    directions::{DEFAULT_BASE_URL, Profile},
    surface::{MapOptions, MapOptionsOverride},
};

use crate::{client::DirectionsSettings, runner::Script};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Draw a driving route from a fixed start point to clicked points on a headless map panel"
)]
pub struct Args {
    /// Access token sent to the directions service and the map surface
    #[arg(long, env = "MAPBOX_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// Root URL of the directions service
    #[arg(long, env = "DIRECTIONS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Routing profile: driving-traffic, driving, walking or cycling
    #[arg(long, default_value = "driving-traffic")]
    pub profile: Profile,

    /// Upper bound on a single directions request
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Initial camera center as `lon,lat`
    #[arg(long, allow_hyphen_values = true)]
    pub center: Option<Coordinate>,

    #[arg(long)]
    pub zoom: Option<f64>,

    /// Base style identifier
    #[arg(long)]
    pub style: Option<String>,

    /// Simulated click as `lon,lat`; repeat for several clicks
    #[arg(long = "click", allow_hyphen_values = true)]
    pub clicks: Vec<Coordinate>,

    /// Pause between simulated clicks
    #[arg(long, default_value_t = 0)]
    pub click_delay_ms: u64,
}

impl Args {
    pub fn directions_settings(&self) -> DirectionsSettings {
        DirectionsSettings {
            base_url: self.base_url.clone(),
            profile: self.profile,
            access_token: self.access_token.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn map_options(&self) -> MapOptions {
        MapOptions::default().with_access_token(self.access_token.clone())
    }

    pub fn overrides(&self) -> MapOptionsOverride {
        MapOptionsOverride {
            center: self.center,
            zoom: self.zoom,
            style: self.style.clone(),
        }
    }

    pub fn script(&self) -> Script {
        Script {
            clicks: self.clicks.clone(),
            click_delay: Duration::from_millis(self.click_delay_ms),
        }
    }
}
