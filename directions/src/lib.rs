pub mod client;
pub mod config;
pub mod error;
pub mod runner;

pub use client::{DirectionsSettings, MapboxDirections};
pub use error::AppError;
