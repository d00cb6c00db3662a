use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::FetchError,
    model::{
        CurrentWeatherReading, FORECAST_DAYS, ForecastDay, ForecastReading, Position,
        kelvin_to_celsius, round_half_up,
    },
};

use super::WeatherProvider;

const CURRENT_ENDPOINT: &str = "current weather";
const FORECAST_ENDPOINT: &str = "daily forecast";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    base_url: String,
    api_key: Option<String>,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            base_url,
            api_key,
            http: Client::new(),
        }
    }

    /// GET `{base_url}{path}` for `position` and return the body of a 2xx response.
    async fn get(
        &self,
        endpoint: &'static str,
        path: &str,
        position: &Position,
    ) -> Result<String, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, latitude = position.latitude, longitude = position.longitude, "requesting {endpoint}");

        let mut query = vec![
            ("lat", position.latitude.to_string()),
            ("lon", position.longitude.to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("appid", key.clone()));
        }

        let res = self.http.get(&url).query(&query).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct OwDescription {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    wind: OwWind,
    weather: Vec<OwDescription>,
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwTempRange {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    weather: Vec<OwCondition>,
    temp: OwTempRange,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

/// Decode a `/weather` body. Temperatures arrive in Kelvin.
pub fn parse_current(body: &str) -> Result<CurrentWeatherReading, FetchError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::malformed(CURRENT_ENDPOINT, e.to_string()))?;

    let description = parsed
        .weather
        .into_iter()
        .next()
        .map(|w| w.description)
        .ok_or_else(|| FetchError::malformed(CURRENT_ENDPOINT, "empty `weather` array"))?;

    Ok(CurrentWeatherReading {
        temperature: kelvin_to_celsius(parsed.main.temp),
        wind_speed: round_half_up(parsed.wind.speed),
        wind_direction: round_half_up(parsed.wind.deg),
        description,
    })
}

/// Decode a `/forecast/daily` body, keeping the first three days.
pub fn parse_forecast(body: &str) -> Result<ForecastReading, FetchError> {
    let parsed: OwForecastResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::malformed(FORECAST_ENDPOINT, e.to_string()))?;

    if parsed.list.len() < FORECAST_DAYS {
        return Err(FetchError::malformed(
            FORECAST_ENDPOINT,
            format!("expected {FORECAST_DAYS} entries in `list`, got {}", parsed.list.len()),
        ));
    }

    let days = parsed
        .list
        .into_iter()
        .take(FORECAST_DAYS)
        .enumerate()
        .map(|(i, entry)| {
            let conditions = entry
                .weather
                .into_iter()
                .next()
                .map(|w| w.main)
                .ok_or_else(|| {
                    FetchError::malformed(FORECAST_ENDPOINT, format!("empty `weather` in list[{i}]"))
                })?;

            Ok(ForecastDay {
                time: entry.dt,
                conditions,
                temp_min: kelvin_to_celsius(entry.temp.min),
                temp_max: kelvin_to_celsius(entry.temp.max),
            })
        })
        .collect::<Result<Vec<_>, FetchError>>()?;

    let days: [ForecastDay; FORECAST_DAYS] = days
        .try_into()
        .map_err(|_| FetchError::malformed(FORECAST_ENDPOINT, "forecast day count mismatch"))?;

    Ok(ForecastReading { days })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_current(&self, position: &Position) -> Result<CurrentWeatherReading, FetchError> {
        let body = self.get(CURRENT_ENDPOINT, "/weather", position).await?;
        parse_current(&body)
    }

    async fn fetch_forecast(&self, position: &Position) -> Result<ForecastReading, FetchError> {
        let body = self.get(FORECAST_ENDPOINT, "/forecast/daily", position).await?;
        parse_forecast(&body)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT: &str = r#"{
        "coord": {"lon": 4.89, "lat": 52.37},
        "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
        "main": {"temp": 285.4, "humidity": 81},
        "wind": {"speed": 5.7, "deg": 232.4},
        "dt": 1700000000,
        "name": "Amsterdam"
    }"#;

    fn forecast_with(entries: usize) -> String {
        let list: Vec<_> = (0..entries)
            .map(|i| {
                let main = ["Clouds", "Rain", "Clear", "Snow"][i % 4];
                serde_json::json!({
                    "dt": 1_700_000_000 + i as i64 * 86_400,
                    "temp": {"day": 280.0, "min": 275.15 + i as f64, "max": 284.15 + i as f64},
                    "weather": [{"main": main, "description": "x"}]
                })
            })
            .collect();
        serde_json::json!({ "city": {"name": "Amsterdam"}, "cnt": entries, "list": list }).to_string()
    }

    #[test]
    fn parses_current_fields() {
        let reading = parse_current(CURRENT).unwrap();

        assert_eq!(
            reading,
            CurrentWeatherReading {
                temperature: 12,
                wind_speed: 6,
                wind_direction: 232,
                description: "light rain".into(),
            }
        );
    }

    #[test]
    fn out_of_range_temperature_is_forwarded_unwrapped() {
        let body = r#"{"main": {"temp": 1e12}, "wind": {"speed": 1.0, "deg": 10}, "weather": [{"description": "hot"}]}"#;
        let reading = parse_current(body).unwrap();
        assert_eq!(reading.temperature, 999_999_999_727);
    }

    #[test]
    fn current_without_wind_direction_is_malformed() {
        let body = r#"{"main": {"temp": 280.0}, "wind": {"speed": 1.0}, "weather": [{"description": "mist"}]}"#;
        let err = parse_current(body).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn current_with_empty_weather_is_malformed() {
        let body = r#"{"main": {"temp": 280.0}, "wind": {"speed": 1.0, "deg": 10}, "weather": []}"#;
        let err = parse_current(body).unwrap_err();
        assert!(err.to_string().contains("empty `weather` array"));
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(parse_current("<html>").unwrap_err().is_malformed());
        assert!(parse_forecast("").unwrap_err().is_malformed());
    }

    #[test]
    fn parses_first_three_forecast_days() {
        let reading = parse_forecast(&forecast_with(7)).unwrap();

        assert_eq!(reading.days[0].time, 1_700_000_000);
        assert_eq!(reading.days[0].conditions, "Clouds");
        assert_eq!(reading.days[0].temp_min, 2);
        assert_eq!(reading.days[0].temp_max, 11);
        assert_eq!(reading.days[2].time, 1_700_172_800);
        assert_eq!(reading.days[2].conditions, "Clear");
        assert_eq!(reading.days[2].temp_min, 4);
    }

    #[test]
    fn short_forecast_is_malformed() {
        let err = parse_forecast(&forecast_with(2)).unwrap_err();
        assert!(err.to_string().contains("expected 3 entries"));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
