//! Movie catalog abstraction
//!
//! A catalog issues one remote lookup per query. Implementations own their
//! transport and credentials so the search controller can be handed any of
//! them, including test doubles.

use crate::{error::AppResult, models::SearchResponse};

pub mod omdb;

/// Trait for remote movie catalogs
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Searches the catalog by free-text query
    ///
    /// Transport, status and decode problems all come back as a single error;
    /// a successful response may still carry no results.
    async fn fetch(&self, query: &str) -> AppResult<SearchResponse>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
