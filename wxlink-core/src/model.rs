use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Offset between Kelvin and Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Number of forecast days forwarded to the watch.
pub const FORECAST_DAYS: usize = 3;

/// A single location fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub taken_at: DateTime<Utc>,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude, taken_at: Utc::now() }
    }

    /// Age of the fix relative to `now`, clamped at zero.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.taken_at).max(chrono::Duration::zero())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentWeatherReading {
    /// Degrees Celsius.
    pub temperature: i64,
    pub wind_speed: i64,
    /// Degrees.
    pub wind_direction: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastDay {
    /// Unix seconds, as reported by the provider.
    pub time: i64,
    pub conditions: String,
    pub temp_min: i64,
    pub temp_max: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastReading {
    pub days: [ForecastDay; FORECAST_DAYS],
}

/// Rounds like the watch-side tooling does: halves go toward positive infinity.
/// Out-of-range values saturate at the `i64` bounds.
pub fn round_half_up(value: f64) -> i64 {
    let floor = value.floor();
    let rounded = if value - floor >= 0.5 { floor + 1.0 } else { floor };
    rounded as i64
}

/// Kelvin to whole degrees Celsius.
pub fn kelvin_to_celsius(kelvin: f64) -> i64 {
    round_half_up(kelvin - KELVIN_OFFSET)
}

/// AppMessage keys shared with the watch app. The numeric ids must match the
/// watch's appinfo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageKey {
    Temperature,
    WindSpeed,
    WindDirection,
    Description,
    Day1Conditions,
    Day1TempMin,
    Day1TempMax,
    Day1Time,
    Day2Conditions,
    Day2TempMin,
    Day2TempMax,
    Day2Time,
    Day3Conditions,
    Day3TempMin,
    Day3TempMax,
    Day3Time,
}

impl MessageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKey::Temperature => "KEY_TEMPERATURE",
            MessageKey::WindSpeed => "KEY_WIND_SPEED",
            MessageKey::WindDirection => "KEY_WIND_DIRECTION",
            MessageKey::Description => "KEY_DESCRIPTION",
            MessageKey::Day1Conditions => "KEY_DAY1_CONDITIONS",
            MessageKey::Day1TempMin => "KEY_DAY1_TEMP_MIN",
            MessageKey::Day1TempMax => "KEY_DAY1_TEMP_MAX",
            MessageKey::Day1Time => "KEY_DAY1_TIME",
            MessageKey::Day2Conditions => "KEY_DAY2_CONDITIONS",
            MessageKey::Day2TempMin => "KEY_DAY2_TEMP_MIN",
            MessageKey::Day2TempMax => "KEY_DAY2_TEMP_MAX",
            MessageKey::Day2Time => "KEY_DAY2_TIME",
            MessageKey::Day3Conditions => "KEY_DAY3_CONDITIONS",
            MessageKey::Day3TempMin => "KEY_DAY3_TEMP_MIN",
            MessageKey::Day3TempMax => "KEY_DAY3_TEMP_MAX",
            MessageKey::Day3Time => "KEY_DAY3_TIME",
        }
    }

    pub fn id(&self) -> u32 {
        match self {
            MessageKey::Temperature => 0,
            MessageKey::WindSpeed => 4,
            MessageKey::WindDirection => 5,
            MessageKey::Description => 7,
            MessageKey::Day1Conditions => 8,
            MessageKey::Day1TempMin => 9,
            MessageKey::Day1TempMax => 10,
            MessageKey::Day1Time => 11,
            MessageKey::Day2Conditions => 12,
            MessageKey::Day2TempMin => 13,
            MessageKey::Day2TempMax => 14,
            MessageKey::Day2Time => 15,
            MessageKey::Day3Conditions => 16,
            MessageKey::Day3TempMin => 17,
            MessageKey::Day3TempMax => 18,
            MessageKey::Day3Time => 19,
        }
    }

    pub const fn all() -> &'static [MessageKey] {
        &[
            MessageKey::Temperature,
            MessageKey::WindSpeed,
            MessageKey::WindDirection,
            MessageKey::Description,
            MessageKey::Day1Conditions,
            MessageKey::Day1TempMin,
            MessageKey::Day1TempMax,
            MessageKey::Day1Time,
            MessageKey::Day2Conditions,
            MessageKey::Day2TempMin,
            MessageKey::Day2TempMax,
            MessageKey::Day2Time,
            MessageKey::Day3Conditions,
            MessageKey::Day3TempMin,
            MessageKey::Day3TempMax,
            MessageKey::Day3Time,
        ]
    }
}

/// `(time, conditions, min, max)` keys per forecast day.
const FORECAST_KEYS: [[MessageKey; 4]; FORECAST_DAYS] = {
    use MessageKey::*;
    [
        [Day1Time, Day1Conditions, Day1TempMin, Day1TempMax],
        [Day2Time, Day2Conditions, Day2TempMin, Day2TempMax],
        [Day3Time, Day3Conditions, Day3TempMin, Day3TempMax],
    ]
};

impl std::fmt::Display for MessageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar value carried in a dispatch dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DictValue {
    Int(i64),
    Str(String),
}

impl From<i32> for DictValue {
    fn from(v: i32) -> Self {
        DictValue::Int(v.into())
    }
}

impl From<i64> for DictValue {
    fn from(v: i64) -> Self {
        DictValue::Int(v)
    }
}

impl From<String> for DictValue {
    fn from(v: String) -> Self {
        DictValue::Str(v)
    }
}

/// Flat key/value message sent to the watch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchDictionary {
    entries: BTreeMap<MessageKey, DictValue>,
}

impl DispatchDictionary {
    pub fn insert(&mut self, key: MessageKey, value: impl Into<DictValue>) {
        self.entries.insert(key, value.into());
    }

    pub fn get(&self, key: MessageKey) -> Option<&DictValue> {
        self.entries.get(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = MessageKey> + '_ {
        self.entries.keys().copied()
    }

    /// JSON object keyed by key name, or by numeric AppMessage id.
    pub fn to_json(&self, numeric_keys: bool) -> serde_json::Value {
        let map = self
            .entries
            .iter()
            .map(|(k, v)| {
                let key = if numeric_keys { k.id().to_string() } else { k.as_str().to_string() };
                (key, serde_json::to_value(v).unwrap_or(serde_json::Value::Null))
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl From<&CurrentWeatherReading> for DispatchDictionary {
    fn from(reading: &CurrentWeatherReading) -> Self {
        let mut dict = DispatchDictionary::default();
        dict.insert(MessageKey::Temperature, reading.temperature);
        dict.insert(MessageKey::WindSpeed, reading.wind_speed);
        dict.insert(MessageKey::WindDirection, reading.wind_direction);
        dict.insert(MessageKey::Description, reading.description.clone());
        dict
    }
}

impl From<&ForecastReading> for DispatchDictionary {
    fn from(reading: &ForecastReading) -> Self {
        let mut dict = DispatchDictionary::default();
        for (day, [time, conditions, min, max]) in reading.days.iter().zip(FORECAST_KEYS) {
            dict.insert(time, day.time);
            dict.insert(conditions, day.conditions.clone());
            dict.insert(min, day.temp_min);
            dict.insert(max, day.temp_max);
        }
        dict
    }
}
