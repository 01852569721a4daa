//! Weather for a city on a given date, from OpenWeatherMap.
//!
//! Today's date uses the current-conditions endpoint. Other dates are served
//! from the 5-day / 3-hour forecast, aggregated per UTC calendar day; dates
//! outside that window are reported as an error result.

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::{FetchError, ToolSettings, error_result, get_json};
use crate::normalize::{normalize_city, normalize_date};
use crate::tools::{ArgumentError, ParamType, ParameterSpec, Tool, ToolArguments, ToolSpec};

const FORECAST_NOTE: &str = "Forecast derived from OpenWeatherMap 5-day/3-hour forecasts. \
     For exact historical data use a paid historical API.";

#[derive(Debug, Deserialize)]
struct GeoMatch {
    lat: f64,
    lon: f64,
    name: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Readings {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Wind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    main: Readings,
    #[serde(default)]
    weather: Vec<Condition>,
    #[serde(default)]
    wind: Wind,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastEntry>,
}

/// One 3-hour slot of the forecast.
#[derive(Debug, Deserialize)]
pub struct ForecastEntry {
    /// Slot start, seconds since the Unix epoch.
    pub dt: Option<i64>,
    #[serde(default)]
    main: Readings,
    #[serde(default)]
    weather: Vec<Condition>,
}

impl ForecastEntry {
    fn utc_date(&self) -> Option<NaiveDate> {
        DateTime::from_timestamp(self.dt?, 0).map(|ts| ts.date_naive())
    }

    fn description(&self) -> Option<String> {
        self.weather
            .first()
            .and_then(|c| c.description.as_deref())
            .map(str::to_lowercase)
            .filter(|d| !d.is_empty())
    }
}

/// Aggregated forecast readings for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub temp_min_c: Option<f64>,
    pub temp_max_c: Option<f64>,
    pub temp_avg_c: Option<f64>,
    pub feels_like_avg_c: Option<f64>,
    pub humidity_avg: Option<f64>,
    /// Most frequent description; ties go to the earliest slot.
    pub condition: Option<String>,
}

/// Aggregate the slots falling on `target` (UTC). `None` when no slot does.
pub fn summarize_forecast(entries: &[ForecastEntry], target: NaiveDate) -> Option<ForecastSummary> {
    let day: Vec<&ForecastEntry> = entries
        .iter()
        .filter(|e| e.utc_date() == Some(target))
        .collect();
    if day.is_empty() {
        return None;
    }

    let temps: Vec<f64> = day.iter().filter_map(|e| e.main.temp).collect();
    let feels: Vec<f64> = day.iter().filter_map(|e| e.main.feels_like).collect();
    let humidity: Vec<f64> = day.iter().filter_map(|e| e.main.humidity).collect();

    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for description in day.iter().filter_map(|e| e.description()) {
        *counts.entry(description).or_default() += 1;
    }
    let mut condition: Option<(String, usize)> = None;
    for (description, count) in counts {
        if condition.as_ref().is_none_or(|(_, best)| count > *best) {
            condition = Some((description, count));
        }
    }

    Some(ForecastSummary {
        temp_min_c: temps.iter().copied().reduce(f64::min),
        temp_max_c: temps.iter().copied().reduce(f64::max),
        temp_avg_c: mean(&temps),
        feels_like_avg_c: mean(&feels),
        humidity_avg: mean(&humidity),
        condition: condition.map(|(description, _)| description),
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Current weather or a daily forecast summary for a city.
pub struct WeatherTool {
    spec: ToolSpec,
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl WeatherTool {
    pub fn new(client: reqwest::Client, settings: &ToolSettings) -> Self {
        let spec = ToolSpec::new(
            "get_weather_for_date",
            "Get weather for a city on a particular date (YYYY-MM-DD). \
             Uses OpenWeatherMap current/forecast endpoints.",
        )
        .param(ParameterSpec::required("city", ParamType::String))
        .param(ParameterSpec::required("date", ParamType::String).describe("YYYY-MM-DD"));

        Self {
            spec,
            client,
            api_key: settings.openweather_api_key.clone(),
            base_url: settings.openweather_url.trim_end_matches('/').to_string(),
        }
    }

    async fn geocode(&self, city: &str, api_key: &str) -> Result<GeoMatch, FetchError> {
        let url = format!("{}/geo/1.0/direct", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("q", city), ("limit", "1"), ("appid", api_key)]);
        let matches: Vec<GeoMatch> = get_json(request).await?;
        matches.into_iter().next().ok_or_else(|| {
            FetchError::Data(format!("Could not geocode city '{city}' (check spelling)."))
        })
    }

    async fn current(
        &self,
        place: &GeoMatch,
        date: &str,
        api_key: &str,
    ) -> Result<Value, FetchError> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        let request = self.coordinates_request(&url, place, api_key);
        let data: CurrentResponse = get_json(request).await?;

        Ok(json!({
            "date": date,
            "city": place.name,
            "country": place.country,
            "type": "current",
            "temperature_c": data.main.temp,
            "feels_like_c": data.main.feels_like,
            "humidity": data.main.humidity,
            "condition": data.weather.first().and_then(|c| c.description.clone()),
            "wind_mps": data.wind.speed,
        }))
    }

    async fn forecast(
        &self,
        place: &GeoMatch,
        date: &str,
        target: NaiveDate,
        api_key: &str,
    ) -> Result<Value, FetchError> {
        let url = format!("{}/data/2.5/forecast", self.base_url);
        let request = self.coordinates_request(&url, place, api_key);
        let data: ForecastResponse = get_json(request).await?;

        let summary = summarize_forecast(&data.list, target).ok_or_else(|| {
            FetchError::Data(
                "Requested date is outside the available forecast window \
                 (OpenWeatherMap 5-day forecast)."
                    .to_string(),
            )
        })?;

        Ok(json!({
            "date": date,
            "city": place.name,
            "country": place.country,
            "type": "forecast",
            "temp_min_c": summary.temp_min_c,
            "temp_max_c": summary.temp_max_c,
            "temp_avg_c": summary.temp_avg_c,
            "feels_like_avg_c": summary.feels_like_avg_c,
            "humidity_avg": summary.humidity_avg,
            "condition": summary.condition,
            "note": FORECAST_NOTE,
        }))
    }

    fn coordinates_request(
        &self,
        url: &str,
        place: &GeoMatch,
        api_key: &str,
    ) -> reqwest::RequestBuilder {
        self.client.get(url).query(&[
            ("lat", place.lat.to_string()),
            ("lon", place.lon.to_string()),
            ("appid", api_key.to_string()),
            ("units", "metric".to_string()),
        ])
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<Value, ArgumentError> {
        let city = arguments.get_str("city")?;
        let date = arguments.get_str("date")?;

        let (city, date) = match (normalize_city(city), normalize_date(date)) {
            (Ok(city), Ok(date)) => (city, date),
            (Err(e), _) | (_, Err(e)) => return Ok(error_result(e)),
        };
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(error_result("Missing OPENWEATHER_API_KEY in environment"));
        };
        let target = match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
            Ok(target) => target,
            Err(e) => return Ok(error_result(format!("Invalid date format. Use YYYY-MM-DD. ({e})"))),
        };

        debug!(%city, %date, "fetching weather");
        let outcome = match self.geocode(&city, api_key).await {
            Ok(place) if target == Local::now().date_naive() => {
                self.current(&place, &date, api_key).await
            }
            Ok(place) => self.forecast(&place, &date, target, api_key).await,
            Err(e) => Err(e),
        };

        Ok(outcome.unwrap_or_else(FetchError::into_result))
    }
}
