use serde::{Deserialize, Deserializer, Serialize};

/// A display-ready movie
///
/// Only produced by the sanitizer, so every instance has a non-blank title and
/// year and a usable poster URL. There are no mutators.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Movie {
    title: String,
    year: String,
    poster_url: String,
}

impl Movie {
    pub(crate) fn from_parts(title: String, year: String, poster_url: String) -> Self {
        Self {
            title,
            year,
            poster_url,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn poster_url(&self) -> &str {
        &self.poster_url
    }
}

// ============================================================================
// OMDb API Types
// ============================================================================

/// Raw search entry from the OMDb API
///
/// Any field may be missing, `null`, blank or the `"N/A"` sentinel.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RawMovie {
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
    #[serde(rename = "Year", default)]
    pub year: Option<String>,
    #[serde(rename = "Poster", default)]
    pub poster: Option<String>,
}

impl From<Movie> for RawMovie {
    fn from(movie: Movie) -> Self {
        Self {
            title: Some(movie.title),
            year: Some(movie.year),
            poster: Some(movie.poster_url),
        }
    }
}

/// Envelope returned by the OMDb search endpoint
///
/// `results` is absent when the API reports no matches or an error. Slots that
/// are `null` or not shaped like a movie are kept as `None` so the sequence
/// length matches what the API sent. The remaining fields are informational;
/// a value of an unexpected type decodes as its text form or `None` instead of
/// rejecting the envelope.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SearchResponse {
    #[serde(rename = "Search", default, deserialize_with = "lenient_slots")]
    pub results: Option<Vec<Option<RawMovie>>>,
    #[serde(rename = "Response", default, deserialize_with = "lenient_text")]
    pub response: Option<String>,
    #[serde(rename = "Error", default, deserialize_with = "lenient_text")]
    pub error: Option<String>,
    #[serde(rename = "totalResults", default, deserialize_with = "lenient_text")]
    pub total_results: Option<String>,
}

fn lenient_slots<'de, D>(deserializer: D) -> Result<Option<Vec<Option<RawMovie>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let slots = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(slots.map(|values| {
        values
            .into_iter()
            .map(|value| serde_json::from_value::<RawMovie>(value).ok())
            .collect()
    }))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => Some(text),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
