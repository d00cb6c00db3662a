use async_trait::async_trait;
use chrono::Utc;
use std::{fmt::Debug, time::Duration};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    config::{DEFAULT_MAXIMUM_AGE_MS, DEFAULT_TIMEOUT_MS},
    error::LocationError,
    model::Position,
};

/// Policy for a single position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Upper bound on how long acquisition may take.
    pub timeout: Duration,
    /// Oldest fix that is still acceptable.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            maximum_age: Duration::from_millis(DEFAULT_MAXIMUM_AGE_MS),
        }
    }
}

impl PositionOptions {
    pub fn accepts(&self, position: &Position) -> bool {
        let age = position.age(Utc::now());
        chrono::Duration::from_std(self.maximum_age).is_ok_and(|max| age <= max)
    }
}

#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    async fn current_position(&self, options: &PositionOptions) -> Result<Position, LocationError>;
}

/// Reports a configured position; the CLI host has no positioning hardware.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationProvider {
    latitude: f64,
    longitude: f64,
}

impl FixedLocationProvider {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_position(&self, _options: &PositionOptions) -> Result<Position, LocationError> {
        Ok(Position::new(self.latitude, self.longitude))
    }
}

/// Reuses the last fix from `inner` while it is younger than `maximum_age`.
#[derive(Debug)]
pub struct CachedLocationProvider<P> {
    inner: P,
    last: Mutex<Option<Position>>,
}

impl<P: LocationProvider> CachedLocationProvider<P> {
    pub fn new(inner: P) -> Self {
        Self { inner, last: Mutex::new(None) }
    }
}

#[async_trait]
impl<P: LocationProvider> LocationProvider for CachedLocationProvider<P> {
    async fn current_position(&self, options: &PositionOptions) -> Result<Position, LocationError> {
        let cached = *self.last.lock().await;
        if let Some(pos) = cached.filter(|p| options.accepts(p)) {
            debug!(latitude = pos.latitude, longitude = pos.longitude, "reusing cached fix");
            return Ok(pos);
        }

        // Not held across the inner call; overlapping cycles each ask `inner`.
        let pos = self.inner.current_position(options).await?;
        *self.last.lock().await = Some(pos);
        Ok(pos)
    }
}

/// Runs `provider` under the timeout and max-age policy in `options`.
pub async fn acquire_position(
    provider: &dyn LocationProvider,
    options: &PositionOptions,
) -> Result<Position, LocationError> {
    let pos = tokio::time::timeout(options.timeout, provider.current_position(options))
        .await
        .map_err(|_| LocationError::Timeout(options.timeout.as_millis() as u64))??;

    if !options.accepts(&pos) {
        return Err(LocationError::Stale {
            age_ms: pos.age(Utc::now()).num_milliseconds(),
            max_age_ms: options.maximum_age.as_millis() as u64,
        });
    }

    Ok(pos)
}
