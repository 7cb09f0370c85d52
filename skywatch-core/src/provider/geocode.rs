use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    error::FetchError,
    model::{Coordinates, PlaceInfo},
};

use super::{PlaceProvider, truncate_body};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// OpenWeather's reverse geocoding endpoint, used to turn the fix from
/// the location provider into a name worth printing.
#[derive(Debug, Clone)]
pub struct ReverseGeoClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl ReverseGeoClient {
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

    async fn fetch_place(&self, coordinates: Coordinates) -> Result<PlaceInfo, FetchError> {
        let url = format!("{}/geo/1.0/reverse", self.base_url);
        let lat = coordinates.latitude.to_string();
        let lon = coordinates.longitude.to_string();

        let res = self
            .http
            .get(url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("limit", "1"),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            warn!(%status, body = %snippet, "OpenWeather reverse geocode failed");
            return Err(FetchError::Http(status));
        }

        // The endpoint answers with an array that is empty over open
        // ocean and other unnamed coordinates.
        let parsed: Vec<OwPlace> = serde_json::from_str(&body)?;
        let place = parsed.into_iter().next().ok_or(FetchError::EmptyResult)?;

        debug!(name = %place.name, "resolved place");

        Ok(PlaceInfo {
            name: place.name,
            region: place.state,
            country: place.country,
        })
    }
}

#[async_trait]
impl PlaceProvider for ReverseGeoClient {
    async fn resolve_place(&self, coordinates: Coordinates) -> Result<PlaceInfo, FetchError> {
        self.fetch_place(coordinates).await
    }
}

#[derive(Debug, Deserialize)]
struct OwPlace {
    name: String,
    state: Option<String>,
    country: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LOS_ANGELES: &str = r#"[
        {"name": "Los Angeles", "lat": 34.0536909, "lon": -118.242766,
         "country": "US", "state": "California"}
    ]"#;

    fn coords() -> Coordinates {
        Coordinates {
            latitude: 34.0,
            longitude: -118.0,
        }
    }

    async fn mounted_client(server: &MockServer, body: &str) -> ReverseGeoClient {
        Mock::given(method("GET"))
            .and(path("/geo/1.0/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
            .mount(server)
            .await;

        ReverseGeoClient::with_base_url("test-key".into(), server.uri())
    }

    #[tokio::test]
    async fn resolves_the_first_entry() {
        let server = MockServer::start().await;
        let client = mounted_client(&server, LOS_ANGELES).await;

        let place = client
            .resolve_place(coords())
            .await
            .expect("resolve should succeed");

        assert_eq!(place.name, "Los Angeles");
        assert_eq!(place.region.as_deref(), Some("California"));
        assert_eq!(place.country, "US");
    }

    #[tokio::test]
    async fn asks_for_a_single_result() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/reverse"))
            .and(query_param("lat", "34"))
            .and(query_param("lon", "-118"))
            .and(query_param("limit", "1"))
            .and(query_param("appid", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(LOS_ANGELES, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let client = ReverseGeoClient::with_base_url("test-key".into(), server.uri());
        client
            .resolve_place(coords())
            .await
            .expect("resolve should succeed");
    }

    #[tokio::test]
    async fn empty_array_becomes_empty_result() {
        let server = MockServer::start().await;
        let client = mounted_client(&server, "[]").await;

        let err = client.resolve_place(coords()).await.unwrap_err();

        assert!(matches!(err, FetchError::EmptyResult));
    }

    #[tokio::test]
    async fn missing_state_is_allowed() {
        let body = r#"[{"name": "Monaco", "lat": 43.73, "lon": 7.42, "country": "MC"}]"#;

        let server = MockServer::start().await;
        let client = mounted_client(&server, body).await;

        let place = client
            .resolve_place(coords())
            .await
            .expect("resolve should succeed");

        assert_eq!(place.name, "Monaco");
        assert!(place.region.is_none());
    }

    #[tokio::test]
    async fn non_success_status_becomes_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/reverse"))
            .respond_with(ResponseTemplate::new(429).set_body_raw("rate limited", "text/plain"))
            .mount(&server)
            .await;

        let client = ReverseGeoClient::with_base_url("test-key".into(), server.uri());
        let err = client.resolve_place(coords()).await.unwrap_err();

        assert!(matches!(err, FetchError::Http(status) if status.as_u16() == 429));
    }
}
