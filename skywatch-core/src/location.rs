use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{config::Config, error::FetchError, model::Coordinates};

/// How hard the provider should try for a precise fix. Providers that
/// only have one accuracy to offer may ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyHint {
    High,
    Balanced,
    Low,
}

/// Source of the machine's current position.
///
/// `Ok(None)` means the provider answered but has no usable fix right
/// now. The token lets a superseded cycle abandon a lookup that is
/// still in flight.
#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    async fn current_position(
        &self,
        hint: AccuracyHint,
        cancel: &CancellationToken,
    ) -> Result<Option<Coordinates>, FetchError>;
}

/// Fixed coordinates from the config file, for machines that should not
/// or cannot be located automatically.
#[derive(Debug, Clone)]
pub struct FixedLocation {
    coordinates: Coordinates,
}

impl FixedLocation {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(
        &self,
        hint: AccuracyHint,
        cancel: &CancellationToken,
    ) -> Result<Option<Coordinates>, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        debug!(?hint, "returning fixed coordinates");
        Ok(Some(self.coordinates))
    }
}

const DEFAULT_IPINFO_URL: &str = "https://ipinfo.io/json";

/// Approximate position from the machine's public IP, via ipinfo.io.
/// The `loc` field of the response is a "lat,lon" string.
#[derive(Debug, Clone)]
pub struct IpLocationProvider {
    http: Client,
    base_url: String,
}

impl IpLocationProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_IPINFO_URL.to_string())
    }

    fn with_base_url(base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    async fn fetch_position(&self) -> Result<Option<Coordinates>, FetchError> {
        let res = self.http.get(&self.base_url).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            warn!(%status, "ipinfo request failed");
            return Err(FetchError::Http(status));
        }

        let parsed: IpInfoResponse = serde_json::from_str(&body)?;
        let position = parse_loc(&parsed.loc);
        if position.is_none() {
            warn!(loc = %parsed.loc, "ipinfo returned an unparseable loc field");
        }

        Ok(position)
    }
}

impl Default for IpLocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationProvider for IpLocationProvider {
    async fn current_position(
        &self,
        hint: AccuracyHint,
        cancel: &CancellationToken,
    ) -> Result<Option<Coordinates>, FetchError> {
        debug!(?hint, "requesting position from ip geolocation");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            res = self.fetch_position() => res,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpInfoResponse {
    loc: String,
}

fn parse_loc(loc: &str) -> Option<Coordinates> {
    let (lat, lon) = loc.split_once(',')?;
    let latitude = lat.trim().parse().ok()?;
    let longitude = lon.trim().parse().ok()?;

    Some(Coordinates {
        latitude,
        longitude,
    })
}

/// Pick a location provider from config.
///
/// Fixed coordinates in the file take precedence and need no consent,
/// since the user typed them in. Automatic lookup requires an explicit
/// grant; anything else is a permission failure.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn LocationProvider>, FetchError> {
    match (config.location, config.location_consent) {
        (Some(coordinates), _) => Ok(Arc::new(FixedLocation::new(coordinates))),
        (None, Some(true)) => Ok(Arc::new(IpLocationProvider::new())),
        (None, _) => Err(FetchError::PermissionDenied),
    }
}
