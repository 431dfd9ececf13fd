//! weatherapi.com client and report formatting.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    errors::Error,
    ports::{WeatherPort, WeatherReport},
    Result,
};

const FORECAST_URL: &str = "https://api.weatherapi.com/v1/forecast.json";

#[derive(Clone)]
pub struct WeatherApiClient {
    api_key: String,
    http: reqwest::Client,
}

impl WeatherApiClient {
    pub fn new(api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| Error::External(format!("weatherapi client build error: {e}")))?;
        Ok(Self { api_key, http })
    }
}

#[async_trait]
impl WeatherPort for WeatherApiClient {
    async fn current(&self, location: &str) -> Result<WeatherReport> {
        let resp = self
            .http
            .get(FORECAST_URL)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", location),
                ("aqi", "no"),
            ])
            .send()
            .await
            .map_err(|e| Error::External(format!("weatherapi request error: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "weatherapi request failed: HTTP {status}: {body}"
            )));
        }

        let forecast = resp
            .json::<Forecast>()
            .await
            .map_err(|e| Error::External(format!("weatherapi response parse error: {e}")))?;
        Ok(forecast.into_report())
    }
}

#[derive(Debug, Deserialize)]
struct Forecast {
    location: Location,
    current: Current,
}

#[derive(Debug, Deserialize)]
struct Location {
    name: String,
    region: String,
    localtime: String,
}

#[derive(Debug, Deserialize)]
struct Current {
    temp_f: f64,
    temp_c: f64,
    humidity: u32,
    condition: Condition,
    last_updated: String,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: String,
}

impl Forecast {
    fn into_report(self) -> WeatherReport {
        WeatherReport {
            location_name: self.location.name,
            region: self.location.region,
            local_time: time_part(&self.location.localtime),
            temp_f: self.current.temp_f,
            temp_c: self.current.temp_c,
            condition: title_case(&self.current.condition.text),
            humidity: self.current.humidity,
            last_updated: time_part(&self.current.last_updated),
        }
    }
}

/// `"2023-02-20 14:05"` -> `"14:05"`.
fn time_part(stamp: &str) -> String {
    stamp.split_whitespace().last().unwrap_or(stamp).to_string()
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn format_report(r: &WeatherReport) -> String {
    format!(
        "Currently in {}, {} it is {}. Weather data indicates that it is {}℉/{}℃. Conditions are {}. Humidity is {}%. Data was last updated at {}.",
        r.location_name,
        r.region,
        r.local_time,
        r.temp_f,
        r.temp_c,
        r.condition,
        r.humidity,
        r.last_updated
    )
}
