//! Process-wide services shared by every weather view: the tokio runtime,
//! the HTTP provider and the city directory.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use skycast_core::Config;
use skycast_weather::{CityDirectory, WeatherProvider};

// Static tokio runtime that lives for the duration of the application
static RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();

// Weather services
static WEATHER_PROVIDER: OnceLock<Arc<WeatherProvider>> = OnceLock::new();
static CITY_DIRECTORY: OnceLock<Arc<CityDirectory>> = OnceLock::new();

/// Initialize the tokio runtime (first call builds it)
fn get_or_init_runtime() -> Result<tokio::runtime::Handle> {
    if let Some(runtime) = RUNTIME.get() {
        return Ok(runtime.handle().clone());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("skycast-tokio")
        .build()
        .context("Failed to create tokio runtime")?;

    // Another thread may have won the race; keep whichever was stored
    let _ = RUNTIME.set(runtime);
    RUNTIME
        .get()
        .map(|r| r.handle().clone())
        .context("Tokio runtime unavailable")
}

/// Handle to the shared runtime, if it was initialized
pub fn get_runtime() -> Option<tokio::runtime::Handle> {
    RUNTIME.get().map(|r| r.handle().clone())
}

/// Initialize weather services from config.
/// Must be called before any `WeatherModel::from_bridge`.
pub fn initialize_weather_services(config: &Config) -> Result<()> {
    let _runtime = get_or_init_runtime()?;

    let provider = WeatherProvider::new(
        &config.weather.api_base_url,
        config.weather.request_timeout(),
    )
    .context("Failed to create weather provider")?;

    let directory = match &config.directory.cities_path {
        Some(path) => CityDirectory::load(Path::new(path)),
        None => CityDirectory::bundled(),
    }
    .context("Failed to load city directory")?;

    tracing::info!(
        api = %provider.base_url(),
        cities = directory.len(),
        "Weather services initialized"
    );

    if WEATHER_PROVIDER.set(Arc::new(provider)).is_err() {
        tracing::warn!("Weather provider already initialized");
    }
    if CITY_DIRECTORY.set(Arc::new(directory)).is_err() {
        tracing::warn!("City directory already initialized");
    }

    Ok(())
}

/// Get the initialized weather services and runtime
pub fn get_weather_services() -> Option<(
    Arc<WeatherProvider>,
    Arc<CityDirectory>,
    tokio::runtime::Handle,
)> {
    let provider = WEATHER_PROVIDER.get()?.clone();
    let directory = CITY_DIRECTORY.get()?.clone();
    let runtime = get_runtime()?;
    Some((provider, directory, runtime))
}
