use crate::{Config, FetchError, LocationWeatherRecord, provider::openweather::OpenWeatherGroupProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// A remote service that returns current conditions for many locations at once.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    /// One round trip for all `location_ids`, records in server order.
    async fn fetch_group(
        &self,
        api_key: &str,
        location_ids: &[u64],
    ) -> Result<Vec<LocationWeatherRecord>, FetchError>;
}

#[async_trait]
impl<S: WeatherSource + ?Sized> WeatherSource for Box<S> {
    async fn fetch_group(
        &self,
        api_key: &str,
        location_ids: &[u64],
    ) -> Result<Vec<LocationWeatherRecord>, FetchError> {
        (**self).fetch_group(api_key, location_ids).await
    }
}

/// Construct the OpenWeather source from config.
pub fn source_from_config(config: &Config) -> Box<dyn WeatherSource> {
    let provider = match config.base_url.as_deref() {
        Some(base_url) => OpenWeatherGroupProvider::with_base_url(base_url),
        None => OpenWeatherGroupProvider::new(),
    };
    Box::new(provider)
}
