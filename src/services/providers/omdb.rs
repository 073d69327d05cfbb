//! OMDb API provider
//!
//! Wraps the `/?s=<query>&apikey=<key>` search endpoint. A body without a
//! `Search` array (OMDb's "Movie not found!" shape) is a successful response
//! with no results, not an error.

use crate::{
    error::{AppError, AppResult},
    models::SearchResponse,
    services::providers::MovieCatalog,
};
use reqwest::Client as HttpClient;

const PROVIDER_NAME: &str = "omdb";

/// Catalog backed by the OMDb search endpoint
#[derive(Clone)]
pub struct OmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl OmdbClient {
    /// Creates a client with a default reqwest `Client`
    pub fn new(api_key: String, api_url: String) -> Self {
        Self::with_http_client(HttpClient::new(), api_key, api_url)
    }

    /// Creates a client on top of a preconfigured reqwest `Client`
    pub fn with_http_client(http_client: HttpClient, api_key: String, api_url: String) -> Self {
        Self {
            http_client,
            api_key,
            api_url,
        }
    }

    fn search_url(&self) -> String {
        format!("{}/", self.api_url.trim_end_matches('/'))
    }

    async fn request(&self, query: &str) -> AppResult<SearchResponse> {
        let response = self
            .http_client
            .get(self.search_url())
            .query(&[("s", query), ("apikey", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OMDb API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        tracing::debug!(response = %response_text, "Raw OMDb API response");

        let search: SearchResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                response = %response_text,
                "Failed to deserialize OMDb response"
            );
            AppError::Decode(e)
        })?;

        Ok(search)
    }
}

#[async_trait::async_trait]
impl MovieCatalog for OmdbClient {
    async fn fetch(&self, query: &str) -> AppResult<SearchResponse> {
        match self.request(query).await {
            Ok(search) => {
                tracing::info!(
                    query = %query,
                    results = search.results.as_ref().map_or(0, Vec::len),
                    total_results = search.total_results.as_deref().unwrap_or("0"),
                    api_error = search.error.as_deref().unwrap_or(""),
                    provider = PROVIDER_NAME,
                    "Movie search completed"
                );
                Ok(search)
            }
            Err(e) => {
                tracing::error!(
                    query = %query,
                    error = %e,
                    provider = PROVIDER_NAME,
                    "Movie search failed"
                );
                Err(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
