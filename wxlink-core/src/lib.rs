//! Core library for `wxlink`.
//!
//! This crate defines:
//! - Configuration handling
//! - Location providers and the position policy
//! - The OpenWeatherMap fetcher and response decoding
//! - AppMessage dictionaries and dispatchers for the paired watch
//! - The application context that runs refresh cycles
//!
//! It is used by `wxlink-cli`, but can also be embedded by other hosts that
//! supply their own location provider and dispatcher.

pub mod app;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod location;
pub mod model;
pub mod provider;

pub use app::{AppContext, BranchOutcome, RefreshReport};
pub use config::Config;
pub use dispatch::{JsonLinesDispatcher, MessageDispatcher};
pub use error::{DispatchError, FetchError, LocationError};
pub use location::{CachedLocationProvider, FixedLocationProvider, LocationProvider, PositionOptions};
pub use model::{
    CurrentWeatherReading, DictValue, DispatchDictionary, ForecastDay, ForecastReading,
    MessageKey, Position,
};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
