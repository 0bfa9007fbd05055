//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather source abstraction and its OpenWeather implementation
//! - Fetch cycles exposing an observable loading / error / ready state
//! - Shared domain models (location records, fetch results)
//!
//! It is used by `weather-cli`, but can also be reused by other front-ends.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod provider;

pub use config::Config;
pub use error::FetchError;
pub use fetcher::{FetchQuery, WeatherFetcher};
pub use model::{Condition, FetchResult, LocationWeatherRecord};
pub use provider::{WeatherSource, source_from_config};
