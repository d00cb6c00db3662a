use crate::{
    Config,
    error::FetchError,
    model::{CurrentWeatherReading, ForecastReading, Position},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_current(&self, position: &Position) -> Result<CurrentWeatherReading, FetchError>;

    async fn fetch_forecast(&self, position: &Position) -> Result<ForecastReading, FetchError>;
}

/// Construct the OpenWeatherMap provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let base_url = config.base_url.trim_end_matches('/');
    if base_url.is_empty() {
        return Err(anyhow::anyhow!(
            "No weather API base URL configured.\n\
             Hint: set `base_url` in the config file or remove it to use the default."
        ));
    }

    Ok(Box::new(OpenWeatherProvider::new(base_url.to_owned(), config.api_key.clone())))
}
