mod movie;

pub use movie::{Movie, RawMovie, SearchResponse};
