use shared::panel::PanelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("an access token is required for the directions service")]
    MissingToken,
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("route panel error: {0}")]
    Panel(#[from] PanelError),
    #[error("failed to encode panel state: {0}")]
    Json(#[from] serde_json::Error),
}
