use crate::services::weather_service::WeatherError as UiWeatherError;
use skycast_core::{AppError, WeatherError};

impl From<UiWeatherError> for AppError {
    fn from(e: UiWeatherError) -> Self {
        match e {
            UiWeatherError::Fetch(s) => AppError::Weather(WeatherError::ApiError(s)),
            UiWeatherError::TimedOut(secs) => AppError::Weather(WeatherError::Timeout(secs)),
            UiWeatherError::NotInitialized => AppError::Weather(WeatherError::ServiceUnavailable),
        }
    }
}
