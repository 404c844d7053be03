//! Search, selection and fetch state behind the weather view.
//!
//! The session is owned by one thread. Network and timer completions come back
//! as method calls carrying the [`AttemptToken`] and city they were issued for;
//! a completion that does not match the tracked attempt for the current
//! selection is stale and changes nothing.

use std::fmt;
use std::sync::Arc;

use skycast_weather::{CityDirectory, WeatherCache, WeatherRecord};

/// Identifies one outbound fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptToken(u64);

impl AttemptToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AttemptToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A fetch the owner of the session must issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub attempt: AttemptToken,
    pub city: String,
}

/// Fetch state of the current selection.
///
/// Loading and error are variants of one enum, so they can never be set
/// together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    /// Nothing selected, or the error was dismissed
    #[default]
    Idle,
    /// Waiting on the tracked attempt
    Loading(AttemptToken),
    /// The selection's record is in the cache
    Ready,
    /// The tracked attempt failed or timed out
    Failed,
}

/// Outcome of feeding a completion into the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    directory: Arc<CityDirectory>,
    cache: WeatherCache,
    saved: Vec<String>,
    selected: Option<String>,
    dialog_open: bool,
    status: FetchStatus,
    search_text: String,
    suggestions: Vec<String>,
    suggestions_visible: bool,
    last_attempt: u64,
}

impl SessionState {
    pub fn new(directory: Arc<CityDirectory>) -> Self {
        Self {
            directory,
            cache: WeatherCache::new(),
            saved: Vec::new(),
            selected: None,
            dialog_open: false,
            status: FetchStatus::Idle,
            search_text: String::new(),
            suggestions: Vec::new(),
            suggestions_visible: false,
            last_attempt: 0,
        }
    }

    // =========== Search ===========

    /// Update the search box text and recompute suggestions
    pub fn set_search_text(&mut self, text: &str) {
        self.search_text = text.to_string();
        self.refresh_suggestions();
        self.suggestions_visible = true;
    }

    /// Search box regained focus
    pub fn focus_search(&mut self) {
        self.refresh_suggestions();
    }

    /// Search box lost focus
    pub fn dismiss_suggestions(&mut self) {
        self.suggestions_visible = false;
    }

    fn refresh_suggestions(&mut self) {
        self.suggestions = self.directory.suggest(&self.search_text, &self.saved);
    }

    // =========== Selection ===========

    /// Select `name` and open the detail view.
    ///
    /// Returns the fetch to issue when `name` is not cached. Any attempt
    /// tracked for the previous selection becomes stale.
    pub fn select_city(&mut self, name: &str) -> Option<FetchRequest> {
        self.selected = Some(name.to_string());
        self.dialog_open = true;

        if self.cache.contains(name) {
            tracing::debug!(city = name, "Selected cached city");
            self.status = FetchStatus::Ready;
            return None;
        }

        self.last_attempt += 1;
        let attempt = AttemptToken(self.last_attempt);
        self.status = FetchStatus::Loading(attempt);
        tracing::debug!(city = name, %attempt, "Selected uncached city");

        Some(FetchRequest {
            attempt,
            city: name.to_string(),
        })
    }

    /// Save `name`. Returns false if it was already saved.
    pub fn add_city(&mut self, name: &str) -> bool {
        if self.is_saved(name) {
            return false;
        }

        self.saved.push(name.to_string());
        self.search_text.clear();
        self.suggestions.clear();
        self.suggestions_visible = false;

        if self.selected.as_deref() != Some(name) {
            self.selected = Some(name.to_string());
            self.status = if self.cache.contains(name) {
                FetchStatus::Ready
            } else {
                FetchStatus::Idle
            };
        }

        self.set_dialog_open(false);
        tracing::info!(city = name, saved = self.saved.len(), "Saved city");
        true
    }

    /// Forget `name` and close the detail view. Its cache entry stays.
    ///
    /// Returns false if it was not saved.
    pub fn remove_city(&mut self, name: &str) -> bool {
        let before = self.saved.len();
        self.saved.retain(|c| c != name);
        self.set_dialog_open(false);

        let removed = self.saved.len() != before;
        if removed {
            tracing::info!(city = name, saved = self.saved.len(), "Removed city");
        }
        removed
    }

    /// Open or close the detail view; any change dismisses a shown error
    pub fn set_dialog_open(&mut self, open: bool) {
        if self.dialog_open == open {
            return;
        }
        self.dialog_open = open;
        if self.status == FetchStatus::Failed {
            self.status = FetchStatus::Idle;
        }
    }

    // =========== Fetch completions ===========

    /// The tracked attempt returned a usable record
    pub fn on_fetch_succeeded(
        &mut self,
        attempt: AttemptToken,
        city: &str,
        record: WeatherRecord,
    ) -> Completion {
        if !self.is_tracked(attempt, city) {
            tracing::debug!(city, %attempt, "Ignoring stale weather response");
            return Completion::Stale;
        }

        self.cache.insert(city, record);
        self.status = FetchStatus::Ready;
        Completion::Applied
    }

    /// The tracked attempt returned something unusable
    pub fn on_fetch_failed(&mut self, attempt: AttemptToken, city: &str) -> Completion {
        if !self.is_tracked(attempt, city) {
            tracing::debug!(city, %attempt, "Ignoring stale weather failure");
            return Completion::Stale;
        }

        self.status = FetchStatus::Failed;
        Completion::Applied
    }

    /// The bounded wait for the tracked attempt ran out
    pub fn on_timeout(&mut self, attempt: AttemptToken, city: &str) -> Completion {
        if !self.is_tracked(attempt, city) {
            return Completion::Stale;
        }

        self.status = FetchStatus::Failed;
        Completion::Applied
    }

    fn is_tracked(&self, attempt: AttemptToken, city: &str) -> bool {
        self.status == FetchStatus::Loading(attempt) && self.selected.as_deref() == Some(city)
    }

    // =========== Accessors ===========

    pub fn directory(&self) -> &CityDirectory {
        &self.directory
    }

    pub fn cache(&self) -> &WeatherCache {
        &self.cache
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Suggestions for the current search text, empty while hidden
    pub fn visible_suggestions(&self) -> &[String] {
        if self.suggestions_visible {
            &self.suggestions
        } else {
            &[]
        }
    }

    pub fn saved_cities(&self) -> &[String] {
        &self.saved
    }

    pub fn is_saved(&self, name: &str) -> bool {
        self.saved.iter().any(|c| c == name)
    }

    /// Saved cities in order, with whatever the cache holds for each
    pub fn saved_entries(&self) -> Vec<(&str, Option<&WeatherRecord>)> {
        self.saved
            .iter()
            .map(|c| (c.as_str(), self.cache.get(c)))
            .collect()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_record(&self) -> Option<&WeatherRecord> {
        self.selected.as_deref().and_then(|c| self.cache.get(c))
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog_open
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn tracked_attempt(&self) -> Option<AttemptToken> {
        match self.status {
            FetchStatus::Loading(attempt) => Some(attempt),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, FetchStatus::Loading(_))
    }

    pub fn has_error(&self) -> bool {
        self.status == FetchStatus::Failed
    }

    /// "Save" is offered for an unsaved selection with no fetch pending or failed
    pub fn can_save(&self) -> bool {
        match self.selected.as_deref() {
            Some(city) => !self.is_saved(city) && !self.is_loading() && !self.has_error(),
            None => false,
        }
    }

    /// "Remove" is offered for a saved selection with no fetch pending or failed
    pub fn can_remove(&self) -> bool {
        match self.selected.as_deref() {
            Some(city) => self.is_saved(city) && !self.is_loading() && !self.has_error(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skycast_weather::Reading;

    fn session() -> SessionState {
        let names = ["London", "Long Beach", "Paris", "Tokyo", "Reykjavik", "Nowhere"];
        SessionState::new(Arc::new(CityDirectory::new(
            names.iter().map(|n| n.to_string()).collect(),
        )))
    }

    fn sunny() -> WeatherRecord {
        WeatherRecord {
            temperature: Some(Reading::Number(70.0)),
            description: "Sunny".to_string(),
            wind: Some(Reading::Number(5.0)),
            forecast: Vec::new(),
        }
    }

    fn fetched(state: &mut SessionState, city: &str) {
        let request = state.select_city(city).unwrap();
        assert_eq!(
            state.on_fetch_succeeded(request.attempt, city, sunny()),
            Completion::Applied
        );
    }

    #[test]
    fn search_suggests_and_shows() {
        let mut state = session();
        state.set_search_text("lon");
        assert_eq!(state.visible_suggestions(), ["London", "Long Beach"]);

        state.dismiss_suggestions();
        assert!(state.visible_suggestions().is_empty());

        state.set_search_text("");
        assert!(state.visible_suggestions().is_empty());
    }

    #[test]
    fn suggestions_skip_saved_cities() {
        let mut state = session();
        fetched(&mut state, "London");
        state.add_city("London");

        state.set_search_text("lon");
        assert_eq!(state.visible_suggestions(), ["Long Beach"]);
    }

    #[test]
    fn focus_recomputes_against_saved_list() {
        let mut state = session();
        state.set_search_text("lon");
        state.dismiss_suggestions();
        state.saved.push("Long Beach".to_string());

        state.focus_search();
        state.suggestions_visible = true;
        assert_eq!(state.visible_suggestions(), ["London"]);
    }

    #[test]
    fn select_uncached_starts_loading() {
        let mut state = session();
        let request = state.select_city("Tokyo").unwrap();

        assert_eq!(request.city, "Tokyo");
        assert_eq!(state.status(), FetchStatus::Loading(request.attempt));
        assert!(state.is_loading());
        assert!(!state.has_error());
        assert!(state.is_dialog_open());
        assert_eq!(state.selected(), Some("Tokyo"));
    }

    #[test]
    fn response_with_description_becomes_ready() {
        let mut state = session();
        let request = state.select_city("Tokyo").unwrap();

        let outcome = state.on_fetch_succeeded(request.attempt, "Tokyo", sunny());

        assert_eq!(outcome, Completion::Applied);
        assert_eq!(state.status(), FetchStatus::Ready);
        assert!(!state.is_loading());
        assert!(!state.has_error());
        assert_eq!(state.cache().get("Tokyo"), Some(&sunny()));
        assert_eq!(state.selected_record(), Some(&sunny()));
    }

    #[test]
    fn unusable_response_becomes_error_without_caching() {
        let mut state = session();
        let request = state.select_city("Nowhere").unwrap();

        assert_eq!(
            state.on_fetch_failed(request.attempt, "Nowhere"),
            Completion::Applied
        );
        assert!(state.has_error());
        assert!(!state.is_loading());
        assert!(state.cache().is_empty());
    }

    #[test]
    fn timeout_for_current_selection_becomes_error() {
        let mut state = session();
        let request = state.select_city("Reykjavik").unwrap();

        assert_eq!(
            state.on_timeout(request.attempt, "Reykjavik"),
            Completion::Applied
        );
        assert!(state.has_error());
        assert!(!state.is_loading());
        assert!(state.cache().is_empty());
    }

    #[test]
    fn response_after_timeout_is_ignored() {
        let mut state = session();
        let request = state.select_city("Reykjavik").unwrap();
        state.on_timeout(request.attempt, "Reykjavik");

        assert_eq!(
            state.on_fetch_succeeded(request.attempt, "Reykjavik", sunny()),
            Completion::Stale
        );
        assert!(state.has_error());
        assert!(!state.cache().contains("Reykjavik"));
    }

    #[test]
    fn timeout_after_response_is_ignored() {
        let mut state = session();
        fetched(&mut state, "Tokyo");
        let attempt = AttemptToken(state.last_attempt);

        assert_eq!(state.on_timeout(attempt, "Tokyo"), Completion::Stale);
        assert_eq!(state.status(), FetchStatus::Ready);
    }

    #[test]
    fn stale_timeout_does_not_touch_new_selection() {
        let mut state = session();
        let first = state.select_city("Tokyo").unwrap();
        let second = state.select_city("Paris").unwrap();
        assert_ne!(first.attempt, second.attempt);

        assert_eq!(state.on_timeout(first.attempt, "Tokyo"), Completion::Stale);
        assert_eq!(state.status(), FetchStatus::Loading(second.attempt));
        assert!(!state.has_error());

        assert_eq!(
            state.on_fetch_succeeded(second.attempt, "Paris", sunny()),
            Completion::Applied
        );
        assert_eq!(state.status(), FetchStatus::Ready);
    }

    #[test]
    fn stale_timeout_after_switching_to_cached_city() {
        let mut state = session();
        fetched(&mut state, "Paris");
        let pending = state.select_city("Tokyo").unwrap();

        assert!(state.select_city("Paris").is_none());
        assert_eq!(state.on_timeout(pending.attempt, "Tokyo"), Completion::Stale);
        assert_eq!(state.status(), FetchStatus::Ready);
        assert!(!state.has_error());
        assert!(!state.is_loading());
    }

    #[test]
    fn stale_response_is_not_cached() {
        let mut state = session();
        let first = state.select_city("Tokyo").unwrap();
        state.select_city("Paris");

        assert_eq!(
            state.on_fetch_succeeded(first.attempt, "Tokyo", sunny()),
            Completion::Stale
        );
        assert!(!state.cache().contains("Tokyo"));
        assert!(state.is_loading());
    }

    #[test]
    fn reselecting_same_city_supersedes_attempt() {
        let mut state = session();
        let first = state.select_city("Tokyo").unwrap();
        let second = state.select_city("Tokyo").unwrap();

        assert_eq!(state.on_timeout(first.attempt, "Tokyo"), Completion::Stale);
        assert!(state.is_loading());
        assert_eq!(state.tracked_attempt(), Some(second.attempt));
    }

    #[test]
    fn cached_city_never_loads_again() {
        let mut state = session();
        fetched(&mut state, "Tokyo");

        for _ in 0..3 {
            state.set_dialog_open(false);
            assert!(state.select_city("Tokyo").is_none());
            assert_eq!(state.status(), FetchStatus::Ready);
        }
    }

    #[test]
    fn reselect_after_failure_retries() {
        let mut state = session();
        let first = state.select_city("Nowhere").unwrap();
        state.on_fetch_failed(first.attempt, "Nowhere");

        let retry = state.select_city("Nowhere").unwrap();
        assert_ne!(retry.attempt, first.attempt);
        assert!(state.is_loading());
        assert!(!state.has_error());
    }

    #[test]
    fn dialog_change_clears_error_only() {
        let mut state = session();
        let request = state.select_city("Nowhere").unwrap();
        state.on_fetch_failed(request.attempt, "Nowhere");

        state.set_dialog_open(false);
        assert!(!state.has_error());
        assert_eq!(state.status(), FetchStatus::Idle);

        let pending = state.select_city("Tokyo").unwrap();
        state.set_dialog_open(false);
        assert_eq!(state.status(), FetchStatus::Loading(pending.attempt));
    }

    #[test]
    fn add_city_is_idempotent() {
        let mut state = session();
        fetched(&mut state, "Tokyo");

        assert!(state.add_city("Tokyo"));
        assert!(!state.add_city("Tokyo"));
        assert_eq!(state.saved_cities(), ["Tokyo"]);
    }

    #[test]
    fn add_city_resets_search_and_closes_dialog() {
        let mut state = session();
        state.set_search_text("tok");
        fetched(&mut state, "Tokyo");

        state.add_city("Tokyo");

        assert_eq!(state.search_text(), "");
        assert!(state.visible_suggestions().is_empty());
        assert!(!state.is_dialog_open());
        assert_eq!(state.selected(), Some("Tokyo"));
    }

    #[test]
    fn saved_order_is_insertion_order() {
        let mut state = session();
        for city in ["Paris", "Tokyo", "London"] {
            fetched(&mut state, city);
            state.add_city(city);
        }
        assert_eq!(state.saved_cities(), ["Paris", "Tokyo", "London"]);
    }

    #[test]
    fn remove_city_keeps_cache() {
        let mut state = session();
        fetched(&mut state, "Tokyo");
        state.add_city("Tokyo");
        state.select_city("Tokyo");

        assert!(state.remove_city("Tokyo"));
        assert!(state.saved_cities().is_empty());
        assert!(!state.is_dialog_open());
        assert!(state.cache().contains("Tokyo"));

        assert!(state.select_city("Tokyo").is_none());
        assert!(state.add_city("Tokyo"));
    }

    #[test]
    fn remove_unsaved_city_is_noop_on_list() {
        let mut state = session();
        fetched(&mut state, "Paris");
        state.add_city("Paris");

        assert!(!state.remove_city("London"));
        assert_eq!(state.saved_cities(), ["Paris"]);
    }

    #[test]
    fn save_and_remove_affordances() {
        let mut state = session();
        assert!(!state.can_save());
        assert!(!state.can_remove());

        let request = state.select_city("Tokyo").unwrap();
        assert!(!state.can_save(), "hidden while loading");

        state.on_fetch_succeeded(request.attempt, "Tokyo", sunny());
        assert!(state.can_save());
        assert!(!state.can_remove());

        state.add_city("Tokyo");
        state.select_city("Tokyo");
        assert!(!state.can_save());
        assert!(state.can_remove());
    }

    #[test]
    fn affordances_hidden_on_error() {
        let mut state = session();
        let request = state.select_city("Nowhere").unwrap();
        state.on_fetch_failed(request.attempt, "Nowhere");

        assert!(!state.can_save());
        assert!(!state.can_remove());
    }

    #[test]
    fn saved_entries_pair_cache() {
        let mut state = session();
        fetched(&mut state, "Tokyo");
        state.add_city("Tokyo");
        state.add_city("Paris");

        let entries = state.saved_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "Tokyo");
        assert!(entries[0].1.is_some());
        assert_eq!(entries[1].0, "Paris");
        assert!(entries[1].1.is_none());
    }

    #[test]
    fn adding_other_city_moves_selection() {
        let mut state = session();
        let pending = state.select_city("Tokyo").unwrap();

        state.add_city("Paris");
        assert_eq!(state.selected(), Some("Paris"));
        assert_eq!(state.status(), FetchStatus::Idle);
        assert_eq!(state.on_timeout(pending.attempt, "Tokyo"), Completion::Stale);
        assert!(!state.has_error());
    }
}
