/// Metadata provider abstraction
///
/// The application only ever talks to the external title database through
/// this trait, so the TMDB implementation can be swapped (or mocked in
/// tests) without touching the aggregation core.
use crate::{
    error::AppResult,
    models::{MediaKind, PersonCredit, TitleCandidate, TmdbDetail, WatchProvider},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Read-only client for the external title metadata API
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Search movies and series by name, ranked by the provider.
    async fn search_titles(&self, query: &str) -> AppResult<Vec<TitleCandidate>>;

    /// Fetch the detail snapshot (with credits) for one title.
    ///
    /// This is the enrichment lookup the analytics aggregator batches;
    /// a failure here degrades one title, never a whole aggregation.
    async fn fetch_detail(&self, tmdb_id: i64, kind: MediaKind) -> AppResult<TmdbDetail>;

    /// Fetch streaming/rental/purchase offers for one title.
    async fn fetch_watch_providers(
        &self,
        tmdb_id: i64,
        kind: MediaKind,
    ) -> AppResult<Vec<WatchProvider>>;

    /// Fetch titles similar to the given one.
    async fn fetch_similar(&self, tmdb_id: i64, kind: MediaKind) -> AppResult<Vec<TitleCandidate>>;

    /// Fetch a person's acting filmography.
    async fn fetch_person_credits(&self, person_id: i64) -> AppResult<Vec<PersonCredit>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
