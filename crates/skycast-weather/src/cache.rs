//! In-memory weather cache keyed by city name.
//!
//! Entries are written once, on the first successful fetch for a city, and
//! live for the rest of the process. Nothing is evicted or refreshed.

use std::collections::HashMap;

use crate::types::WeatherRecord;

#[derive(Debug, Clone, Default)]
pub struct WeatherCache {
    entries: HashMap<String, WeatherRecord>,
}

impl WeatherCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, city: &str) -> Option<&WeatherRecord> {
        self.entries.get(city)
    }

    pub fn contains(&self, city: &str) -> bool {
        self.entries.contains_key(city)
    }

    /// Store `record` for `city` unless an entry already exists.
    ///
    /// Returns true when the record was stored.
    pub fn insert(&mut self, city: &str, record: WeatherRecord) -> bool {
        if self.entries.contains_key(city) {
            tracing::debug!("Weather cache already holds {}", city);
            return false;
        }
        self.entries.insert(city.to_string(), record);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
