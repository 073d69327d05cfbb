pub mod providers;
pub mod result_set;
pub mod sanitizer;
pub mod search_controller;

pub use providers::{omdb::OmdbClient, MovieCatalog};
pub use result_set::{ObservableResultSet, ResultSet};
pub use search_controller::{PublishPolicy, SearchController, SearchOutcome, SearchState};
