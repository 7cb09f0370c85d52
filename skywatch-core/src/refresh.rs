//! The refresh loop: every tick it acquires a position, fetches the
//! weather and the place name for it concurrently, and hands the pair
//! to a presenter. A tick that arrives while the previous cycle is
//! still running cancels it; completions from superseded cycles are
//! discarded by generation number, so only the newest cycle can ever
//! reach the screen.

use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    error::FetchError,
    location::{AccuracyHint, LocationProvider},
    model::{ConditionsReport, UnitSystem},
    provider::{PlaceProvider, WeatherProvider},
};

/// What the loop remembers between cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleState {
    /// Failed cycles since the last success.
    pub consecutive_failures: u32,
    /// Whether any cycle has ever completed. Controls how a failure is
    /// worded: stale data on screen reads differently from no data.
    pub has_succeeded: bool,
}

impl CycleState {
    fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.has_succeeded = true;
    }

    fn record_failure(&mut self) {
        self.consecutive_failures += 1;
    }
}

/// Outbound edge of the refresh loop.
///
/// Calls arrive from the loop task only, one at a time, so
/// implementations need no locking of their own.
pub trait Presenter: Send + Sync {
    fn show_conditions(&self, report: &ConditionsReport);
    fn show_failure(&self, state: &CycleState);
}

struct CycleCompletion {
    generation: u64,
    outcome: Result<ConditionsReport, FetchError>,
}

struct InflightCycle {
    token: CancellationToken,
    generation: u64,
}

impl InflightCycle {
    fn cancel(self) {
        debug!(generation = self.generation, "cancelling in-flight cycle");
        self.token.cancel();
    }
}

pub struct RefreshLoop {
    location: Arc<dyn LocationProvider>,
    weather: Arc<dyn WeatherProvider>,
    places: Arc<dyn PlaceProvider>,
    presenter: Arc<dyn Presenter>,
    units: UnitSystem,
    interval: Duration,
}

impl RefreshLoop {
    pub fn new(
        location: Arc<dyn LocationProvider>,
        weather: Arc<dyn WeatherProvider>,
        places: Arc<dyn PlaceProvider>,
        presenter: Arc<dyn Presenter>,
        units: UnitSystem,
        interval: Duration,
    ) -> Self {
        Self {
            location,
            weather,
            places,
            presenter,
            units,
            interval,
        }
    }

    /// Run until `shutdown` is cancelled. The first cycle starts
    /// immediately; later ones start a fixed interval apart, measured
    /// start to start.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = CycleState::default();
        let mut generation: u64 = 0;
        let mut inflight: Option<InflightCycle> = None;

        info!(interval_secs = self.interval.as_secs(), "refresh loop started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Some(previous) = inflight.take() {
                        previous.cancel();
                    }
                    generation += 1;
                    inflight = Some(self.start_cycle(generation, &shutdown, tx.clone()));
                }
                Some(completion) = rx.recv() => {
                    self.handle_completion(&mut state, generation, completion);
                }
            }
        }

        if let Some(previous) = inflight.take() {
            previous.cancel();
        }
        info!("refresh loop stopped");
    }

    /// Run a single cycle to completion and return its report, without
    /// a ticker or a presenter in the way.
    pub async fn run_once(&self) -> Result<ConditionsReport, FetchError> {
        run_cycle(
            Arc::clone(&self.location),
            Arc::clone(&self.weather),
            Arc::clone(&self.places),
            self.units,
            CancellationToken::new(),
        )
        .await
    }

    fn start_cycle(
        &self,
        generation: u64,
        shutdown: &CancellationToken,
        tx: mpsc::UnboundedSender<CycleCompletion>,
    ) -> InflightCycle {
        // Child of the shutdown token, so teardown reaches a cycle in
        // flight without extra bookkeeping.
        let token = shutdown.child_token();
        let cancel = token.clone();
        let location = Arc::clone(&self.location);
        let weather = Arc::clone(&self.weather);
        let places = Arc::clone(&self.places);
        let units = self.units;

        debug!(generation, "starting refresh cycle");
        tokio::spawn(async move {
            let outcome = run_cycle(location, weather, places, units, cancel).await;
            let _ = tx.send(CycleCompletion { generation, outcome });
        });

        InflightCycle { token, generation }
    }

    fn handle_completion(
        &self,
        state: &mut CycleState,
        current_generation: u64,
        completion: CycleCompletion,
    ) {
        if completion.generation != current_generation {
            debug!(
                generation = completion.generation,
                current_generation, "discarding completion from a superseded cycle"
            );
            return;
        }

        match completion.outcome {
            Ok(report) => {
                state.record_success();
                info!(
                    place = %report.place.name,
                    description = %report.weather.description,
                    "conditions refreshed"
                );
                self.presenter.show_conditions(&report);
            }
            Err(err) if err.is_failure() => {
                state.record_failure();
                warn!(
                    error = %err,
                    consecutive_failures = state.consecutive_failures,
                    "refresh cycle failed"
                );
                self.presenter.show_failure(state);
            }
            Err(_) => {
                debug!(generation = completion.generation, "cycle cancelled");
            }
        }
    }
}

/// One full cycle: position, then weather and place for it fetched
/// concurrently. Either leg failing fails the pair, so a report is
/// always internally consistent.
async fn run_cycle(
    location: Arc<dyn LocationProvider>,
    weather: Arc<dyn WeatherProvider>,
    places: Arc<dyn PlaceProvider>,
    units: UnitSystem,
    cancel: CancellationToken,
) -> Result<ConditionsReport, FetchError> {
    let position = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(FetchError::Cancelled),
        res = location.current_position(AccuracyHint::High, &cancel) => res?,
    };

    let Some(coordinates) = position else {
        return Err(FetchError::LocationUnavailable);
    };

    let (snapshot, place) = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(FetchError::Cancelled),
        res = async {
            tokio::try_join!(
                weather.current_conditions(coordinates, units),
                places.resolve_place(coordinates),
            )
        } => res?,
    };

    Ok(ConditionsReport {
        coordinates,
        weather: snapshot,
        place,
        fetched_at: Utc::now(),
    })
}
