use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use skycast_core::AppError;
use skycast_weather::{CityDirectory, WeatherProvider};

use crate::models::session::{Completion, SessionState};
use crate::services::weather_service::{self, WeatherError, WeatherServiceMessage};

/// Owns a [`SessionState`] and wires its fetch requests to the weather
/// service. All state changes happen on the thread that owns the model.
pub struct WeatherModel {
    session: SessionState,
    provider: Arc<WeatherProvider>,
    runtime: tokio::runtime::Handle,
    tx: Sender<WeatherServiceMessage>,
    rx: Receiver<WeatherServiceMessage>,
    response_timeout: Duration,
}

impl WeatherModel {
    pub fn new(
        provider: Arc<WeatherProvider>,
        directory: Arc<CityDirectory>,
        runtime: tokio::runtime::Handle,
        response_timeout: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            session: SessionState::new(directory),
            provider,
            runtime,
            tx,
            rx,
            response_timeout,
        }
    }

    /// Build a model from the services registered in [`crate::bridge`]
    pub fn from_bridge(response_timeout: Duration) -> Result<Self, WeatherError> {
        match crate::bridge::get_weather_services() {
            Some((provider, directory, runtime)) => {
                tracing::info!("WeatherModel initialized from global services");
                Ok(Self::new(provider, directory, runtime, response_timeout))
            }
            None => {
                tracing::error!("Cannot initialize WeatherModel - global services not ready");
                Err(WeatherError::NotInitialized)
            }
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    // =========== User actions ===========

    pub fn select_city(&mut self, name: &str) {
        if let Some(request) = self.session.select_city(name) {
            weather_service::request_fetch(
                &self.tx,
                self.provider.clone(),
                &self.runtime,
                request,
                self.response_timeout,
            );
        }
    }

    pub fn add_city(&mut self, name: &str) -> bool {
        self.session.add_city(name)
    }

    pub fn remove_city(&mut self, name: &str) -> bool {
        self.session.remove_city(name)
    }

    pub fn set_search_text(&mut self, text: &str) {
        self.session.set_search_text(text);
    }

    pub fn focus_search(&mut self) {
        self.session.focus_search();
    }

    pub fn dismiss_suggestions(&mut self) {
        self.session.dismiss_suggestions();
    }

    pub fn set_dialog_open(&mut self, open: bool) {
        self.session.set_dialog_open(open);
    }

    // =========== Service messages ===========

    /// Apply every message already waiting on the channel (non-blocking).
    /// Returns how many changed the session.
    pub fn poll_channel(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(msg) = self.rx.try_recv() {
            if self.apply(msg) == Completion::Applied {
                applied += 1;
            }
        }
        applied
    }

    /// Block until the tracked fetch resolves or `limit` passes.
    /// Returns true if the session is no longer loading.
    pub fn wait_for_fetch(&mut self, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        while self.session.is_loading() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(msg) => {
                    self.apply(msg);
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        !self.session.is_loading()
    }

    fn apply(&mut self, msg: WeatherServiceMessage) -> Completion {
        match msg {
            WeatherServiceMessage::FetchDone {
                attempt,
                city,
                result: Ok(record),
            } => {
                let outcome = self.session.on_fetch_succeeded(attempt, &city, record);
                if outcome == Completion::Applied {
                    tracing::info!(city = %city, %attempt, "Weather data fetched successfully");
                }
                outcome
            }
            WeatherServiceMessage::FetchDone {
                attempt,
                city,
                result: Err(e),
            } => {
                let outcome = self.session.on_fetch_failed(attempt, &city);
                if outcome == Completion::Applied {
                    log_failure(&city, e);
                }
                outcome
            }
            WeatherServiceMessage::TimedOut { attempt, city } => {
                let outcome = self.session.on_timeout(attempt, &city);
                if outcome == Completion::Applied {
                    log_failure(&city, WeatherError::TimedOut(self.response_timeout.as_secs()));
                }
                outcome
            }
        }
    }
}

fn log_failure(city: &str, error: WeatherError) {
    let error = AppError::from(error);
    tracing::warn!(city, "Failed to fetch weather: {}", error);
}
