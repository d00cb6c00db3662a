use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{CustomType, Text};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use wxlink_core::{
    AppContext, CachedLocationProvider, Config, FixedLocationProvider, JsonLinesDispatcher,
    RefreshReport, config::validate_coordinates, provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxlink", version, about = "Forward weather to a paired watch")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set the API key and location.
    Configure,

    /// Refresh on startup, then once per line received on stdin.
    Run,

    /// Run a single refresh cycle and exit.
    Refresh {
        /// Latitude override, in degrees.
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,

        /// Longitude override, in degrees.
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Run => {
                let ctx = build_context(&Config::load()?, None)?;
                serve(ctx).await
            }
            Command::Refresh { lat, lon } => {
                let ctx = build_context(&Config::load()?, lat.zip(lon))?;
                log_report(&ctx.trigger_refresh().await);
                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Text::new("OpenWeatherMap API key (blank for none):")
        .with_default(cfg.api_key.as_deref().unwrap_or_default())
        .prompt()
        .context("Failed to read API key")?;
    cfg.set_api_key(api_key);

    let mut lat_prompt = CustomType::<f64>::new("Latitude:");
    if let Some(lat) = cfg.location.latitude {
        lat_prompt = lat_prompt.with_default(lat);
    }
    let latitude = lat_prompt.prompt().context("Failed to read latitude")?;

    let mut lon_prompt = CustomType::<f64>::new("Longitude:");
    if let Some(lon) = cfg.location.longitude {
        lon_prompt = lon_prompt.with_default(lon);
    }
    let longitude = lon_prompt.prompt().context("Failed to read longitude")?;

    validate_coordinates(latitude, longitude)?;
    cfg.set_location(latitude, longitude);

    let path = cfg.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

fn build_context(config: &Config, coordinates: Option<(f64, f64)>) -> anyhow::Result<AppContext> {
    let (lat, lon) = match coordinates {
        Some((lat, lon)) => {
            validate_coordinates(lat, lon)?;
            (lat, lon)
        }
        None => config.coordinates()?,
    };

    let location = CachedLocationProvider::new(FixedLocationProvider::new(lat, lon));
    let weather = provider_from_config(config)?;
    let dispatcher = JsonLinesDispatcher::stdout(config.numeric_keys);

    Ok(AppContext::new(
        Arc::new(location),
        Arc::from(weather),
        Arc::new(dispatcher),
        config.position_options(),
    ))
}

/// Ready trigger first, then one refresh per inbound line until EOF.
async fn serve(ctx: AppContext) -> anyhow::Result<()> {
    info!("ready");
    let mut in_flight = vec![ctx.spawn_refresh()];

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
        debug!(message = %line.trim(), "inbound message from watch");
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(ctx.spawn_refresh());
    }

    for handle in in_flight {
        if let Ok(report) = handle.await {
            log_report(&report);
        }
    }
    Ok(())
}

fn log_report(report: &RefreshReport) {
    match report {
        RefreshReport::LocationFailed(e) => debug!("cycle aborted: {e}"),
        RefreshReport::Completed { current, forecast, .. } => {
            debug!(current = current.is_sent(), forecast = forecast.is_sent(), "cycle complete");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_refresh_with_negative_coordinates() {
        let cli = Cli::try_parse_from(["wxlink", "refresh", "--lat", "-33.87", "--lon", "151.21"])
            .expect("should parse");

        match cli.command {
            Command::Refresh { lat, lon } => {
                assert_eq!(lat, Some(-33.87));
                assert_eq!(lon, Some(151.21));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn lat_requires_lon() {
        assert!(Cli::try_parse_from(["wxlink", "refresh", "--lat", "10"]).is_err());
    }

    #[test]
    fn build_context_requires_location() {
        let err = build_context(&Config::default(), None).unwrap_err();
        assert!(err.to_string().contains("No location configured"));
    }

    #[test]
    fn build_context_accepts_override() {
        assert!(build_context(&Config::default(), Some((1.0, 2.0))).is_ok());
        assert!(build_context(&Config::default(), Some((1.0, 200.0))).is_err());
    }
}
