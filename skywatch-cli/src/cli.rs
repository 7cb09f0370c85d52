use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Select, Text};
use tokio_util::sync::CancellationToken;
use tracing::info;

use skywatch_core::{
    Config, Coordinates, FetchError, LocationProvider, OpenWeatherClient, Presenter, RefreshLoop,
    ReverseGeoClient, UnitSystem, location,
};

use crate::console::ConsolePresenter;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skywatch", version, about = "Current conditions for wherever you are")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, units, location consent and coordinates.
    Configure,

    /// Fetch and print current conditions once.
    Show,

    /// Keep refreshing conditions until interrupted.
    Watch {
        /// Seconds between refresh cycles (defaults to the configured value).
        #[arg(long)]
        interval: Option<u64>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show => show().await,
            Command::Watch { interval } => watch(interval).await,
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let key_help = if config.api_key.is_some() {
        "Press Enter to keep the current key"
    } else {
        "Used for both the weather and reverse-geocoding endpoints"
    };
    let key = Text::new("OpenWeather API key:")
        .with_help_message(key_help)
        .prompt()?;
    let key = key.trim();
    if !key.is_empty() {
        config.upsert_api_key(key.to_string());
    }

    config.units = Select::new("Preferred units:", UnitSystem::all().to_vec()).prompt()?;

    let granted = Confirm::new("Allow skywatch to look up this machine's approximate location?")
        .with_default(config.location_consent.unwrap_or(true))
        .with_help_message("Uses your public IP; no GPS involved")
        .prompt()?;
    config.location_consent = Some(granted);

    let current = config
        .location
        .map(|c| format!("{},{}", c.latitude, c.longitude))
        .unwrap_or_default();
    let fixed = Text::new("Fixed coordinates (lat,lon), empty for automatic:")
        .with_initial_value(&current)
        .prompt()?;
    config.location = parse_coordinates(&fixed)?;

    config.save()?;
    println!(
        "Saved configuration to {}",
        Config::config_file_path()?.display()
    );

    Ok(())
}

async fn show() -> Result<()> {
    let mut config = Config::load()?;
    prompt_consent_if_unanswered(&mut config)?;

    let Some(provider) = location_provider(&config)? else {
        return Ok(());
    };

    let (refresh, presenter) = build_refresh_loop(&config, provider, config.interval())?;

    let report = refresh
        .run_once()
        .await
        .context("Failed to fetch current conditions")?;
    presenter.show_conditions(&report);

    Ok(())
}

async fn watch(interval: Option<u64>) -> Result<()> {
    let mut config = Config::load()?;
    prompt_consent_if_unanswered(&mut config)?;

    let Some(provider) = location_provider(&config)? else {
        return Ok(());
    };

    let interval = interval
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| config.interval());

    let (refresh, _presenter) = build_refresh_loop(&config, provider, interval)?;

    println!(
        "Watching conditions every {}s. Press Ctrl-C to stop.",
        interval.as_secs()
    );

    let shutdown = CancellationToken::new();
    let worker = tokio::spawn(refresh.run(shutdown.clone()));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("interrupt received, stopping");
    shutdown.cancel();
    worker.await.context("Refresh loop task panicked")?;

    println!("Stopped.");
    Ok(())
}

/// Ask for location consent the first time it is needed. The answer is
/// persisted either way, so the question is only ever asked once.
fn prompt_consent_if_unanswered(config: &mut Config) -> Result<()> {
    if config.location_consent.is_some() || config.location.is_some() {
        return Ok(());
    }

    let granted = Confirm::new("Allow skywatch to look up this machine's approximate location?")
        .with_default(true)
        .with_help_message("Uses your public IP; no GPS involved")
        .prompt()?;

    config.location_consent = Some(granted);
    config.save()?;

    Ok(())
}

fn location_provider(config: &Config) -> Result<Option<Arc<dyn LocationProvider>>> {
    match location::provider_from_config(config) {
        Ok(provider) => Ok(Some(provider)),
        Err(FetchError::PermissionDenied) => {
            println!(
                "Location lookup is not allowed. Run `skywatch configure` to grant it\n\
                 or to set fixed coordinates instead."
            );
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn build_refresh_loop(
    config: &Config,
    provider: Arc<dyn LocationProvider>,
    interval: Duration,
) -> Result<(RefreshLoop, Arc<ConsolePresenter>)> {
    let api_key = config.require_api_key()?.to_string();

    let weather = Arc::new(OpenWeatherClient::new(api_key.clone()));
    let places = Arc::new(ReverseGeoClient::new(api_key));
    let presenter = Arc::new(ConsolePresenter::new(config.units));

    let refresh = RefreshLoop::new(
        provider,
        weather,
        places,
        presenter.clone(),
        config.units,
        interval,
    );

    Ok((refresh, presenter))
}

fn parse_coordinates(input: &str) -> Result<Option<Coordinates>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }

    let (lat, lon) = input
        .split_once(',')
        .ok_or_else(|| anyhow::anyhow!("Expected coordinates as `lat,lon`, got '{input}'"))?;

    let latitude: f64 = lat
        .trim()
        .parse()
        .with_context(|| format!("Invalid latitude '{}'", lat.trim()))?;
    let longitude: f64 = lon
        .trim()
        .parse()
        .with_context(|| format!("Invalid longitude '{}'", lon.trim()))?;

    if !(-90.0..=90.0).contains(&latitude) {
        anyhow::bail!("Latitude {latitude} is outside -90..=90");
    }
    if !(-180.0..=180.0).contains(&longitude) {
        anyhow::bail!("Longitude {longitude} is outside -180..=180");
    }

    Ok(Some(Coordinates {
        latitude,
        longitude,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_means_automatic_location() {
        assert!(parse_coordinates("").expect("should parse").is_none());
        assert!(parse_coordinates("   ").expect("should parse").is_none());
    }

    #[test]
    fn parses_lat_lon_with_optional_spaces() {
        let coords = parse_coordinates("50.45, 30.52")
            .expect("should parse")
            .expect("should be set");
        assert_eq!(coords.latitude, 50.45);
        assert_eq!(coords.longitude, 30.52);
    }

    #[test]
    fn rejects_garbage_and_out_of_range_values() {
        assert!(parse_coordinates("fifty,thirty").is_err());
        assert!(parse_coordinates("50.45").is_err());
        assert!(parse_coordinates("95,30").is_err());
        assert!(parse_coordinates("50,200").is_err());
    }
}
