//! Weather backend: async weather fetching.
//! Network work and the response timer run on the tokio runtime; both report
//! to the owning thread via mpsc.

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use skycast_weather::{WeatherProvider, WeatherRecord};

use crate::models::session::{AttemptToken, FetchRequest};

/// Error type for weather operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherError {
    /// The request failed or returned an unusable body
    Fetch(String),
    /// No response within the wait, in seconds
    TimedOut(u64),
    NotInitialized,
}

impl std::fmt::Display for WeatherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherError::Fetch(s) => write!(f, "Weather error: {}", s),
            WeatherError::TimedOut(secs) => write!(f, "No weather response within {}s", secs),
            WeatherError::NotInitialized => write!(f, "Weather service not initialized"),
        }
    }
}

impl std::error::Error for WeatherError {}

/// Messages sent from async operations back to the owning thread
#[derive(Debug)]
pub enum WeatherServiceMessage {
    /// The request for `city` completed
    FetchDone {
        attempt: AttemptToken,
        city: String,
        result: Result<WeatherRecord, WeatherError>,
    },
    /// The response wait for `city` ran out. Sent whether or not the request
    /// already completed.
    TimedOut { attempt: AttemptToken, city: String },
}

impl WeatherServiceMessage {
    pub fn attempt(&self) -> AttemptToken {
        match self {
            WeatherServiceMessage::FetchDone { attempt, .. }
            | WeatherServiceMessage::TimedOut { attempt, .. } => *attempt,
        }
    }
}

/// Issue `request` and start its response timer.
///
/// Sends one `FetchDone` and one `TimedOut` on the channel, in whichever order
/// they happen. Neither task is cancelled by the other.
pub fn request_fetch(
    tx: &Sender<WeatherServiceMessage>,
    provider: Arc<WeatherProvider>,
    runtime: &tokio::runtime::Handle,
    request: FetchRequest,
    wait: Duration,
) {
    let FetchRequest { attempt, city } = request;
    tracing::debug!(city = %city, %attempt, "Requesting weather");

    let timer_tx = tx.clone();
    let timer_city = city.clone();
    runtime.spawn(async move {
        tokio::time::sleep(wait).await;
        let _ = timer_tx.send(WeatherServiceMessage::TimedOut {
            attempt,
            city: timer_city,
        });
    });

    let tx = tx.clone();
    runtime.spawn(async move {
        let result = provider
            .fetch(&city)
            .await
            .map_err(|e| WeatherError::Fetch(e.to_string()));
        let _ = tx.send(WeatherServiceMessage::FetchDone {
            attempt,
            city,
            result,
        });
    });
}
