pub mod bridge;
pub mod error_mapping;
pub mod models;
pub mod services;

pub use models::session::{AttemptToken, FetchRequest, FetchStatus, SessionState};
pub use models::weather_model::WeatherModel;
