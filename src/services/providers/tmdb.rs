/// TMDB API provider
///
/// Implements every [`MetadataProvider`] operation against TMDB v3:
///
/// 1. Search: /search/multi (movies and series, person hits dropped)
/// 2. Detail: /movie/{id} or /tv/{id} with ?append_to_response=credits
/// 3. Offers: /{kind}/{id}/watch/providers (US region)
/// 4. Similar: /{kind}/{id}/similar
/// 5. People: /person/{id}/combined_credits
///
/// Raw payloads are coerced into the strict snapshot types at this
/// boundary; responses are cached in Redis with per-endpoint TTLs.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        tmdb::{ApiListResponse, ApiPersonCredits, ApiTitleDetail, ApiWatchProvidersResponse},
        MediaKind, PersonCredit, TitleCandidate, TmdbDetail, WatchProvider,
    },
    services::providers::MetadataProvider,
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const DETAIL_CACHE_TTL: u64 = 86400; // 1 day
const PROVIDERS_CACHE_TTL: u64 = 604800; // 1 week
const SIMILAR_CACHE_TTL: u64 = 86400; // 1 day
const PERSON_CACHE_TTL: u64 = 86400; // 1 day

/// Region used for watch-provider lookups
const WATCH_REGION: &str = "US";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_url: String,
    cache: Cache,
}

impl TmdbProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String, image_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            image_url,
            cache,
        }
    }

    /// Path segment TMDB uses for each media kind
    fn kind_path(kind: MediaKind) -> &'static str {
        match kind {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }

    /// Cache key id of the form `{kind}:{tmdb_id}`
    fn kind_key(tmdb_id: i64, kind: MediaKind) -> String {
        format!("{}:{}", kind.as_str(), tmdb_id)
    }

    /// Performs a GET against a TMDB path and deserializes the response
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        extra_query: &[(&str, &str)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let mut query: Vec<(&str, &str)> = vec![("api_key", self.api_key.as_str())];
        query.extend_from_slice(extra_query);

        let response = self.http_client.get(&url).query(&query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn search_titles(&self, query: &str) -> AppResult<Vec<TitleCandidate>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::TitleSearch(query.to_string()),
            SEARCH_CACHE_TTL,
            async move {
                let response: ApiListResponse = self
                    .get_json("/search/multi", &[("query", query), ("include_adult", "false")])
                    .await?;

                let candidates: Vec<TitleCandidate> = response
                    .results
                    .into_iter()
                    .filter_map(|entry| entry.into_candidate(&self.image_url, None))
                    .collect();

                tracing::info!(
                    query = %query,
                    results = candidates.len(),
                    provider = "tmdb",
                    "Title search completed"
                );

                Ok::<_, AppError>(candidates)
            }
        )
    }

    async fn fetch_detail(&self, tmdb_id: i64, kind: MediaKind) -> AppResult<TmdbDetail> {
        cached!(
            self.cache,
            CacheKey::Detail(Self::kind_key(tmdb_id, kind)),
            DETAIL_CACHE_TTL,
            async move {
                let path = format!("/{}/{}", Self::kind_path(kind), tmdb_id);
                let raw: ApiTitleDetail = self
                    .get_json(&path, &[("append_to_response", "credits")])
                    .await?;

                let detail = TmdbDetail::from_api(raw, kind, &self.image_url);

                tracing::debug!(
                    tmdb_id = tmdb_id,
                    kind = kind.as_str(),
                    genres = detail.genres.len(),
                    provider = "tmdb",
                    "Detail fetched"
                );

                Ok::<_, AppError>(detail)
            }
        )
    }

    async fn fetch_watch_providers(
        &self,
        tmdb_id: i64,
        kind: MediaKind,
    ) -> AppResult<Vec<WatchProvider>> {
        cached!(
            self.cache,
            CacheKey::Providers(Self::kind_key(tmdb_id, kind)),
            PROVIDERS_CACHE_TTL,
            async move {
                let path = format!("/{}/{}/watch/providers", Self::kind_path(kind), tmdb_id);
                let mut response: ApiWatchProvidersResponse = self.get_json(&path, &[]).await?;

                let providers = response
                    .results
                    .remove(WATCH_REGION)
                    .map(|region| region.into_providers(&self.image_url))
                    .unwrap_or_default();

                tracing::info!(
                    tmdb_id = tmdb_id,
                    offers = providers.len(),
                    provider = "tmdb",
                    "Watch providers fetched"
                );

                Ok::<_, AppError>(providers)
            }
        )
    }

    async fn fetch_similar(&self, tmdb_id: i64, kind: MediaKind) -> AppResult<Vec<TitleCandidate>> {
        cached!(
            self.cache,
            CacheKey::Similar(Self::kind_key(tmdb_id, kind)),
            SIMILAR_CACHE_TTL,
            async move {
                let path = format!("/{}/{}/similar", Self::kind_path(kind), tmdb_id);
                let response: ApiListResponse = self.get_json(&path, &[]).await?;

                // /similar omits media_type; results share the request kind
                let candidates: Vec<TitleCandidate> = response
                    .results
                    .into_iter()
                    .filter_map(|entry| entry.into_candidate(&self.image_url, Some(kind)))
                    .collect();

                Ok::<_, AppError>(candidates)
            }
        )
    }

    async fn fetch_person_credits(&self, person_id: i64) -> AppResult<Vec<PersonCredit>> {
        cached!(
            self.cache,
            CacheKey::PersonCredits(person_id),
            PERSON_CACHE_TTL,
            async move {
                let path = format!("/person/{}/combined_credits", person_id);
                let response: ApiPersonCredits = self.get_json(&path, &[]).await?;

                let credits: Vec<PersonCredit> = response
                    .cast
                    .into_iter()
                    .filter_map(|entry| entry.into_credit(&self.image_url))
                    .collect();

                tracing::info!(
                    person_id = person_id,
                    credits = credits.len(),
                    provider = "tmdb",
                    "Person credits fetched"
                );

                Ok::<_, AppError>(credits)
            }
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_path() {
        assert_eq!(TmdbProvider::kind_path(MediaKind::Movie), "movie");
        assert_eq!(TmdbProvider::kind_path(MediaKind::Series), "tv");
    }

    #[test]
    fn test_kind_key() {
        assert_eq!(TmdbProvider::kind_key(27205, MediaKind::Movie), "movie:27205");
        assert_eq!(TmdbProvider::kind_key(1396, MediaKind::Series), "series:1396");
    }
}
