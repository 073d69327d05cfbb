use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::services::{
    providers::MovieCatalog,
    result_set::{ObservableResultSet, ResultSet},
    sanitizer::sanitize_results,
};

/// Which of several overlapping searches gets to publish
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PublishPolicy {
    /// Every search publishes when it settles; the last one to settle wins
    #[default]
    LastSettled,
    /// Only the most recently issued search publishes its results
    LatestIssued,
}

/// Whether any search task is still waiting on the catalog
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    Idle,
    Searching,
}

/// How a single search settled
///
/// The published result set is empty for both `NoMatches` and `Failed`; this
/// is the only place the two can be told apart.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "count")]
pub enum SearchOutcome {
    Found(usize),
    NoMatches,
    Failed,
    /// A newer search was issued before this one settled, so its results were dropped
    Superseded,
}

/// Runs the wrapped callback when dropped, at most once
struct CompletionGuard<F: FnOnce()> {
    on_complete: Option<F>,
    in_flight: Arc<AtomicUsize>,
}

impl<F: FnOnce()> Drop for CompletionGuard<F> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if let Some(on_complete) = self.on_complete.take() {
            on_complete();
        }
    }
}

/// Orchestrates movie searches and owns the published result set
///
/// Each non-blank query clears the current results, fetches from the catalog
/// on a Tokio task, sanitizes what comes back and publishes it. Failures
/// degrade to an empty result set; nothing is raised to the caller.
#[derive(Clone)]
pub struct SearchController {
    catalog: Arc<dyn MovieCatalog>,
    results: ObservableResultSet,
    policy: PublishPolicy,
    in_flight: Arc<AtomicUsize>,
    latest_request: Arc<AtomicU64>,
    last_outcome: Arc<watch::Sender<Option<SearchOutcome>>>,
}

impl SearchController {
    /// Creates a controller with the default [`PublishPolicy`]
    pub fn new(catalog: Arc<dyn MovieCatalog>) -> Self {
        Self::with_policy(catalog, PublishPolicy::default())
    }

    /// Creates a controller that resolves overlapping searches with `policy`
    pub fn with_policy(catalog: Arc<dyn MovieCatalog>, policy: PublishPolicy) -> Self {
        let (last_outcome, _) = watch::channel(None);
        Self {
            catalog,
            results: ObservableResultSet::new(),
            policy,
            in_flight: Arc::new(AtomicUsize::new(0)),
            latest_request: Arc::new(AtomicU64::new(0)),
            last_outcome: Arc::new(last_outcome),
        }
    }

    /// Starts a search for `query`
    ///
    /// A blank query is ignored: nothing is published, `on_complete` is
    /// dropped without being called and `None` is returned. Otherwise the
    /// result set is cleared before this returns and `on_complete` runs exactly
    /// once when the spawned task finishes. Must be called from within a Tokio
    /// runtime.
    pub fn search<F>(&self, query: &str, on_complete: F) -> Option<JoinHandle<SearchOutcome>>
    where
        F: FnOnce() + Send + 'static,
    {
        if query.trim().is_empty() {
            tracing::debug!("Ignoring blank search query");
            return None;
        }

        let request_id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = CompletionGuard {
            on_complete: Some(on_complete),
            in_flight: self.in_flight.clone(),
        };

        self.results.publish(Vec::new());

        let controller = self.clone();
        let query = query.to_string();
        Some(tokio::spawn(async move {
            let _guard = guard;
            controller.run(request_id, &query).await
        }))
    }

    async fn run(&self, request_id: u64, query: &str) -> SearchOutcome {
        tracing::info!(
            query = %query,
            request_id,
            provider = self.catalog.name(),
            "Search started"
        );

        let (movies, outcome) = match self.catalog.fetch(query).await {
            Ok(response) if response.results.is_some() => {
                let movies = sanitize_results(response);
                let found = movies.len();
                (movies, SearchOutcome::Found(found))
            }
            Ok(_) => (Vec::new(), SearchOutcome::NoMatches),
            Err(e) => {
                tracing::error!(query = %query, error = %e, "Error fetching movies");
                (Vec::new(), SearchOutcome::Failed)
            }
        };

        // The sequence check runs under the result set's lock so a search
        // issued in between cannot have its clear overwritten by stale results.
        let published = self
            .results
            .publish_if(movies, || !self.is_stale(request_id));

        let outcome = if published {
            outcome
        } else {
            tracing::debug!(
                query = %query,
                request_id,
                "Dropping results of superseded search"
            );
            SearchOutcome::Superseded
        };

        self.last_outcome.send_replace(Some(outcome));

        tracing::info!(query = %query, request_id, outcome = ?outcome, "Search settled");

        outcome
    }

    fn is_stale(&self, request_id: u64) -> bool {
        match self.policy {
            PublishPolicy::LastSettled => false,
            PublishPolicy::LatestIssued => {
                self.latest_request.load(Ordering::SeqCst) != request_id
            }
        }
    }

    /// Current result set
    pub fn results(&self) -> ResultSet {
        self.results.snapshot()
    }

    /// Subscribes to result set publishes
    pub fn subscribe(&self) -> watch::Receiver<ResultSet> {
        self.results.subscribe()
    }

    /// `Searching` while at least one search task is in flight
    pub fn state(&self) -> SearchState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            SearchState::Searching
        } else {
            SearchState::Idle
        }
    }

    /// Outcome of the most recently settled search, if any
    pub fn last_outcome(&self) -> Option<SearchOutcome> {
        *self.last_outcome.borrow()
    }

    /// Policy deciding which overlapping search publishes
    pub fn policy(&self) -> PublishPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{RawMovie, SearchResponse};
    use crate::services::providers::MockMovieCatalog;
    use crate::services::sanitizer::{default_movie, PLACEHOLDER_POSTER_URL};

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = calls.clone();
        (calls, move || {
            handle.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn batman_response() -> SearchResponse {
        SearchResponse {
            results: Some(vec![Some(RawMovie {
                title: Some("Batman".to_string()),
                year: Some("1989".to_string()),
                poster: Some("N/A".to_string()),
            })]),
            ..Default::default()
        }
    }

    fn controller_with(mock: MockMovieCatalog) -> SearchController {
        SearchController::new(Arc::new(mock))
    }

    fn mock_returning(response: SearchResponse) -> MockMovieCatalog {
        let mut mock = MockMovieCatalog::new();
        mock.expect_name().return_const("mock");
        mock.expect_fetch()
            .times(1)
            .returning(move |_| Ok(response.clone()));
        mock
    }

    #[tokio::test]
    async fn test_blank_query_is_noop() {
        let mut mock = MockMovieCatalog::new();
        mock.expect_fetch().never();
        let controller = controller_with(mock);
        controller.results.publish(vec![default_movie()]);
        let rx = controller.subscribe();
        let (calls, on_complete) = counter();

        assert!(controller.search("", on_complete).is_none());
        let (_, on_complete) = counter();
        assert!(controller.search("   ", on_complete).is_none());

        assert_eq!(controller.results().len(), 1);
        assert!(!rx.has_changed().unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(controller.state(), SearchState::Idle);
        assert_eq!(controller.last_outcome(), None);
    }

    #[tokio::test]
    async fn test_results_sanitized_and_published() {
        let mock = mock_returning(batman_response());
        let controller = controller_with(mock);
        let (calls, on_complete) = counter();

        let outcome = controller.search("batman", on_complete).unwrap().await.unwrap();

        assert_eq!(outcome, SearchOutcome::Found(1));
        let results = controller.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title(), "Batman");
        assert_eq!(results[0].year(), "1989");
        assert_eq!(results[0].poster_url(), PLACEHOLDER_POSTER_URL);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state(), SearchState::Idle);
        assert_eq!(controller.last_outcome(), Some(SearchOutcome::Found(1)));
    }

    #[tokio::test]
    async fn test_query_forwarded_verbatim() {
        let mut mock = MockMovieCatalog::new();
        mock.expect_name().return_const("mock");
        mock.expect_fetch()
            .withf(|query| query.to_string() == "  Star Wars: Episode IV ")
            .times(1)
            .returning(|_| Ok(SearchResponse::default()));
        let controller = controller_with(mock);

        controller
            .search("  Star Wars: Episode IV ", || {})
            .unwrap()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_slots_use_default_movie() {
        let response = SearchResponse {
            results: Some(vec![None, batman_response().results.unwrap()[0].clone(), None]),
            ..Default::default()
        };
        let controller = controller_with(mock_returning(response));

        controller.search("batman", || {}).unwrap().await.unwrap();

        let results = controller.results();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], default_movie());
        assert_eq!(results[1].title(), "Batman");
        assert_eq!(results[2], default_movie());
    }

    #[tokio::test]
    async fn test_zero_matches_publishes_empty() {
        let response = SearchResponse {
            response: Some("False".to_string()),
            error: Some("Movie not found!".to_string()),
            ..Default::default()
        };
        let controller = controller_with(mock_returning(response));
        controller.results.publish(vec![default_movie()]);
        let (calls, on_complete) = counter();

        let outcome = controller
            .search("zzzxnotreal", on_complete)
            .unwrap()
            .await
            .unwrap();

        assert_eq!(outcome, SearchOutcome::NoMatches);
        assert!(controller.results().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_on_failure() {
        let mut mock = MockMovieCatalog::new();
        mock.expect_name().return_const("mock");
        mock.expect_fetch()
            .times(1)
            .returning(|_| Err(AppError::ExternalApi("connection reset".to_string())));
        let controller = controller_with(mock);
        controller.results.publish(vec![default_movie(), default_movie()]);
        let (calls, on_complete) = counter();

        let outcome = controller.search("batman", on_complete).unwrap().await.unwrap();

        assert_eq!(outcome, SearchOutcome::Failed);
        assert!(controller.results().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state(), SearchState::Idle);
    }

    #[tokio::test]
    async fn test_results_cleared_before_search_returns() {
        let mut mock = MockMovieCatalog::new();
        mock.expect_name().return_const("mock");
        mock.expect_fetch()
            .returning(|_| Ok(SearchResponse::default()));
        let controller = controller_with(mock);
        controller.results.publish(vec![default_movie()]);

        let handle = controller.search("batman", || {}).unwrap();

        assert!(controller.results().is_empty());
        assert_eq!(controller.state(), SearchState::Searching);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_latest_issued_stale_run_keeps_newer_clear() {
        let mock = mock_returning(batman_response());
        let controller = SearchController::with_policy(Arc::new(mock), PublishPolicy::LatestIssued);
        assert_eq!(controller.policy(), PublishPolicy::LatestIssued);
        controller.latest_request.store(2, Ordering::SeqCst);
        controller.results.publish(Vec::new());
        let rx = controller.subscribe();

        let outcome = controller.run(1, "batman").await;

        assert_eq!(outcome, SearchOutcome::Superseded);
        assert!(controller.results().is_empty());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_completion_guard_runs_once_on_drop() {
        let in_flight = Arc::new(AtomicUsize::new(1));
        let (calls, on_complete) = counter();

        let guard = CompletionGuard {
            on_complete: Some(on_complete),
            in_flight: in_flight.clone(),
        };
        drop(guard);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_outcome_serialization() {
        assert_eq!(
            serde_json::to_value(SearchOutcome::Found(3)).unwrap(),
            serde_json::json!({"kind": "found", "count": 3})
        );
        assert_eq!(
            serde_json::to_value(SearchOutcome::Failed).unwrap(),
            serde_json::json!({"kind": "failed"})
        );
    }
}
