use crate::models::{Movie, RawMovie, SearchResponse};

/// Poster shown when the catalog has no usable image
pub const PLACEHOLDER_POSTER_URL: &str = "https://via.placeholder.com/150";

/// Title shown when the catalog has none
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Marker the catalog uses for unavailable fields
pub const UNAVAILABLE: &str = "N/A";

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn or_default(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !is_blank(&v) => v,
        _ => default.to_string(),
    }
}

/// Normalizes a raw catalog entry into a display-safe movie
///
/// Blank titles and years get fixed fallbacks; blank or `"N/A"` posters are
/// replaced with [`PLACEHOLDER_POSTER_URL`]. Nothing else is touched.
pub fn sanitize(raw: RawMovie) -> Movie {
    let poster_url = match raw.poster {
        Some(p) if !is_blank(&p) && p != UNAVAILABLE => p,
        _ => PLACEHOLDER_POSTER_URL.to_string(),
    };

    Movie::from_parts(
        or_default(raw.title, UNKNOWN_TITLE),
        or_default(raw.year, UNAVAILABLE),
        poster_url,
    )
}

/// Stand-in for a slot the catalog left empty
pub fn default_movie() -> Movie {
    Movie::from_parts(
        UNKNOWN_TITLE.to_string(),
        UNAVAILABLE.to_string(),
        PLACEHOLDER_POSTER_URL.to_string(),
    )
}

/// Sanitizes every slot of a response, keeping one movie per slot
pub fn sanitize_results(response: SearchResponse) -> Vec<Movie> {
    response
        .results
        .unwrap_or_default()
        .into_iter()
        .map(|slot| slot.map_or_else(default_movie, sanitize))
        .collect()
}
