//! Refresh cycle: location fix, then current weather and forecast fetched
//! concurrently, each forwarded to the watch as soon as it arrives.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    dispatch::MessageDispatcher,
    error::{DispatchError, FetchError, LocationError},
    location::{LocationProvider, PositionOptions, acquire_position},
    model::{DispatchDictionary, Position},
    provider::WeatherProvider,
};

/// What happened to one branch of a refresh cycle.
#[derive(Debug)]
pub enum BranchOutcome {
    Sent,
    /// Message built but the host link refused it. Not retried.
    DispatchFailed(DispatchError),
    /// Nothing was sent.
    FetchFailed(FetchError),
}

impl BranchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, BranchOutcome::Sent)
    }
}

#[derive(Debug)]
pub enum RefreshReport {
    /// Cycle ended before any request was made.
    LocationFailed(LocationError),
    Completed {
        position: Position,
        current: BranchOutcome,
        forecast: BranchOutcome,
    },
}

/// Holds the collaborators for the lifetime of the process. The hosting layer
/// calls [`AppContext::trigger_refresh`] on startup and on every inbound
/// message from the watch.
#[derive(Debug, Clone)]
pub struct AppContext {
    location: Arc<dyn LocationProvider>,
    weather: Arc<dyn WeatherProvider>,
    dispatcher: Arc<dyn MessageDispatcher>,
    options: PositionOptions,
}

impl AppContext {
    pub fn new(
        location: Arc<dyn LocationProvider>,
        weather: Arc<dyn WeatherProvider>,
        dispatcher: Arc<dyn MessageDispatcher>,
        options: PositionOptions,
    ) -> Self {
        Self { location, weather, dispatcher, options }
    }

    /// Runs one full cycle. Overlapping calls are independent; nothing is
    /// deduplicated or cancelled.
    #[instrument(skip(self))]
    pub async fn trigger_refresh(&self) -> RefreshReport {
        let position = match acquire_position(self.location.as_ref(), &self.options).await {
            Ok(pos) => pos,
            Err(e) => {
                warn!("Error requesting location: {e}");
                return RefreshReport::LocationFailed(e);
            }
        };
        debug!(latitude = position.latitude, longitude = position.longitude, "got location fix");

        let (current, forecast) = tokio::join!(
            self.refresh_current(&position),
            self.refresh_forecast(&position)
        );

        info!(current = current.is_sent(), forecast = forecast.is_sent(), "refresh finished");
        RefreshReport::Completed { position, current, forecast }
    }

    /// Fire-and-forget variant for event handlers.
    pub fn spawn_refresh(&self) -> JoinHandle<RefreshReport> {
        let ctx = self.clone();
        tokio::spawn(async move { ctx.trigger_refresh().await })
    }

    async fn refresh_current(&self, position: &Position) -> BranchOutcome {
        match self.weather.fetch_current(position).await {
            Ok(reading) => self.dispatch("current", DispatchDictionary::from(&reading)).await,
            Err(e) => {
                error!("Current weather fetch failed: {e}");
                BranchOutcome::FetchFailed(e)
            }
        }
    }

    async fn refresh_forecast(&self, position: &Position) -> BranchOutcome {
        match self.weather.fetch_forecast(position).await {
            Ok(reading) => self.dispatch("forecast", DispatchDictionary::from(&reading)).await,
            Err(e) => {
                error!("Forecast fetch failed: {e}");
                BranchOutcome::FetchFailed(e)
            }
        }
    }

    async fn dispatch(&self, kind: &'static str, message: DispatchDictionary) -> BranchOutcome {
        let keys = message.len();
        match self.dispatcher.send(message).await {
            Ok(()) => {
                debug!(kind, keys, "message sent to watch");
                BranchOutcome::Sent
            }
            Err(e) => {
                debug!(kind, "message send failed, dropping: {e}");
                BranchOutcome::DispatchFailed(e)
            }
        }
    }
}
