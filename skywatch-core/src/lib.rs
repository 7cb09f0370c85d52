//! Core library for the `skywatch` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Location acquisition, with a consent gate in front of it
//! - Clients for the OpenWeather current-conditions and reverse-geocoding APIs
//! - The refresh loop that ties them together on a fixed cadence
//!
//! It is used by `skywatch-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod provider;
pub mod refresh;
pub mod units;

pub use config::Config;
pub use error::FetchError;
pub use location::{AccuracyHint, FixedLocation, IpLocationProvider, LocationProvider};
pub use model::{
    ConditionsReport, Coordinates, PlaceInfo, Precipitation, UnitSystem, WeatherSnapshot, Wind,
};
pub use provider::geocode::ReverseGeoClient;
pub use provider::openweather::OpenWeatherClient;
pub use provider::{PlaceProvider, WeatherProvider};
pub use refresh::{CycleState, Presenter, RefreshLoop};
