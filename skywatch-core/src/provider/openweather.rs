use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    error::FetchError,
    model::{Coordinates, Precipitation, UnitSystem, WeatherSnapshot, Wind},
};

use super::{WeatherProvider, truncate_body};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            http: Client::new(),
            base_url,
        }
    }

    async fn fetch_current(
        &self,
        coordinates: Coordinates,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, FetchError> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        let lat = coordinates.latitude.to_string();
        let lon = coordinates.longitude.to_string();

        let res = self
            .http
            .get(url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", units.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            warn!(%status, body = %snippet, "OpenWeather current request failed");
            return Err(FetchError::Http(status));
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)?;
        let snapshot = snapshot_from(parsed);
        debug!(description = %snapshot.description, "received current conditions");

        Ok(snapshot)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current_conditions(
        &self,
        coordinates: Coordinates,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, FetchError> {
        self.fetch_current(coordinates, units).await
    }
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    weather: Vec<OwWeather>,
    main: OwMain,
    // Occasionally absent from rural stations.
    #[serde(default)]
    visibility: u32,
    wind: OwWind,
    rain: Option<OwPrecipitation>,
    snow: Option<OwPrecipitation>,
    clouds: OwClouds,
    dt: i64,
    sys: OwSys,
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: u32,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: u16,
    gust: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwPrecipitation {
    #[serde(rename = "1h")]
    one_h: f64,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: i64,
    sunset: i64,
}

fn snapshot_from(parsed: OwCurrentResponse) -> WeatherSnapshot {
    let (description, icon) = parsed
        .weather
        .first()
        .map(|w| (w.description.clone(), w.icon.clone()))
        .unwrap_or_else(|| ("Unknown".to_string(), "01d".to_string()));

    let precipitation = match (parsed.rain, parsed.snow) {
        (Some(rain), _) => Some(Precipitation::Rain(rain.one_h)),
        (None, Some(snow)) => Some(Precipitation::Snow(snow.one_h)),
        (None, None) => None,
    };

    WeatherSnapshot {
        description,
        icon,
        temperature: parsed.main.temp,
        feels_like: parsed.main.feels_like,
        temp_min: parsed.main.temp_min,
        temp_max: parsed.main.temp_max,
        pressure_hpa: parsed.main.pressure,
        humidity_pct: parsed.main.humidity,
        clouds_pct: parsed.clouds.all,
        visibility_m: parsed.visibility,
        wind: Wind {
            speed: parsed.wind.speed,
            direction_deg: parsed.wind.deg,
            gust: parsed.wind.gust,
        },
        precipitation,
        sunrise: parsed.sys.sunrise,
        sunset: parsed.sys.sunset,
        timezone_offset: parsed.timezone,
        observed_at: unix_to_utc(parsed.dt).unwrap_or_else(Utc::now),
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}
