use std::sync::Arc;

use tokio::sync::watch;

use crate::models::Movie;

/// Snapshot of the movies currently on display
pub type ResultSet = Arc<[Movie]>;

/// Publish/subscribe holder for the current result set
///
/// Every publish swaps the whole sequence; subscribers always see a complete
/// snapshot, never a partially updated one.
#[derive(Clone)]
pub struct ObservableResultSet {
    tx: Arc<watch::Sender<ResultSet>>,
}

impl Default for ObservableResultSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservableResultSet {
    /// Creates an empty result set
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ResultSet::from(Vec::new()));
        Self { tx: Arc::new(tx) }
    }

    /// Replaces the current sequence and notifies subscribers
    pub fn publish(&self, movies: Vec<Movie>) {
        self.tx.send_replace(movies.into());
    }

    /// Replaces the current sequence only if `keep` still holds once the
    /// sender is locked; returns whether it published
    ///
    /// `keep` runs while other publishers are blocked, so a check made there
    /// cannot be invalidated by a concurrent publish before the swap.
    pub fn publish_if<P>(&self, movies: Vec<Movie>, keep: P) -> bool
    where
        P: FnOnce() -> bool,
    {
        self.tx.send_if_modified(move |current| {
            if keep() {
                *current = movies.into();
                true
            } else {
                false
            }
        })
    }

    /// Current sequence
    pub fn snapshot(&self) -> ResultSet {
        self.tx.borrow().clone()
    }

    /// Subscribes to future publishes
    ///
    /// The receiver keeps the latest value only; a slow subscriber may skip
    /// intermediate publishes but always ends on the newest one.
    pub fn subscribe(&self) -> watch::Receiver<ResultSet> {
        self.tx.subscribe()
    }
}
