//! Weather lookup for Skycast
//!
//! City autocomplete over a bundled directory, per-city weather records fetched
//! from a goweather-style REST endpoint, and the in-memory cache they live in.

pub mod cache;
pub mod directory;
pub mod provider;
pub mod types;

pub use cache::WeatherCache;
pub use directory::{CityDirectory, SUGGESTION_LIMIT};
pub use provider::{city_segment, WeatherProvider, DEFAULT_API_BASE};
pub use types::*;
