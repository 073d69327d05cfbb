use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::services::SearchController;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub controller: SearchController,
    /// Searches issued through the HTTP surface whose completion callback has
    /// not run yet; drives the loading indicator
    pending_searches: Arc<AtomicUsize>,
}

impl AppState {
    /// Creates state around an already configured controller
    pub fn new(controller: SearchController) -> Self {
        Self {
            controller,
            pending_searches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Switches the loading indicator on and returns the completion callback
    /// that switches it off again
    ///
    /// The indicator stays on until every issued search has completed.
    pub fn begin_search(&self) -> impl FnOnce() + Send + 'static {
        self.pending_searches.fetch_add(1, Ordering::SeqCst);
        let pending = self.pending_searches.clone();
        move || {
            pending.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Whether the loading indicator is on
    pub fn is_loading(&self) -> bool {
        self.pending_searches.load(Ordering::SeqCst) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::OmdbClient;

    fn create_test_state() -> AppState {
        let client = OmdbClient::new("test_key".to_string(), "http://test.local".to_string());
        AppState::new(SearchController::new(Arc::new(client)))
    }

    #[test]
    fn test_loading_until_every_search_completes() {
        let state = create_test_state();
        assert!(!state.is_loading());

        let first_done = state.begin_search();
        let second_done = state.begin_search();
        assert!(state.is_loading());

        first_done();
        assert!(state.is_loading());

        second_done();
        assert!(!state.is_loading());
    }
}
