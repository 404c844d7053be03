//! Static list of known city names and the autocomplete filter over it.

use std::path::Path;

use crate::types::WeatherError;

/// Maximum number of suggestions returned for one query
pub const SUGGESTION_LIMIT: usize = 5;

const BUNDLED_CITIES: &str = include_str!("../data/cities.json");

/// Read-only, ordered list of city names
#[derive(Debug, Clone, Default)]
pub struct CityDirectory {
    names: Vec<String>,
    // Lowercased copy of `names`, index-aligned
    folded: Vec<String>,
}

impl CityDirectory {
    pub fn new(names: Vec<String>) -> Self {
        let folded = names.iter().map(|n| n.to_lowercase()).collect();
        Self { names, folded }
    }

    /// The city list compiled into the binary
    pub fn bundled() -> Result<Self, WeatherError> {
        Self::from_json(BUNDLED_CITIES)
    }

    /// Parse a JSON array of strings
    pub fn from_json(json: &str) -> Result<Self, WeatherError> {
        let names: Vec<String> =
            serde_json::from_str(json).map_err(|e| WeatherError::Directory(e.to_string()))?;
        Ok(Self::new(names))
    }

    /// Load a JSON array of strings from disk
    pub fn load(path: &Path) -> Result<Self, WeatherError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| WeatherError::Directory(format!("{}: {}", path.display(), e)))?;
        let directory = Self::from_json(&contents)?;
        tracing::info!(
            "Loaded {} cities from {}",
            directory.len(),
            path.display()
        );
        Ok(directory)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Up to [`SUGGESTION_LIMIT`] names containing `query` (case-insensitive),
    /// in directory order, skipping anything in `saved`.
    ///
    /// An empty query suggests nothing.
    pub fn suggest(&self, query: &str, saved: &[String]) -> Vec<String> {
        if query.is_empty() {
            return Vec::new();
        }

        let needle = query.to_lowercase();
        self.names
            .iter()
            .zip(&self.folded)
            .filter(|(name, folded)| folded.contains(&needle) && !saved.contains(*name))
            .map(|(name, _)| name.clone())
            .take(SUGGESTION_LIMIT)
            .collect()
    }
}
