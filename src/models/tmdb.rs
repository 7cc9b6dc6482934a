use serde::{Deserialize, Serialize};

use crate::models::MediaKind;

/// Number of cast members kept in a detail snapshot
const TOP_CAST_LIMIT: usize = 10;

/// Poster size token used when composing image URLs
pub const POSTER_SIZE: &str = "w342";

/// Composes a full image URL from TMDB's relative path convention.
pub fn image_url(base: &str, size: &str, path: &str) -> String {
    format!("{}/{}{}", base.trim_end_matches('/'), size, path)
}

/// A ranked search or discovery candidate returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleCandidate {
    pub tmdb_id: i64,
    pub title: String,
    pub media_kind: MediaKind,
    pub release_year: Option<i32>,
    pub poster_url: Option<String>,
    pub vote_average: Option<f64>,
}

/// Per-title enrichment snapshot, validated once at the fetch boundary.
///
/// Ephemeral: built per analytics session and never written to the
/// datastore. Derivations read these fields directly without any further
/// defensive checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbDetail {
    pub tmdb_id: i64,
    pub kind: MediaKind,
    /// Runtime in minutes; movies only
    pub runtime: Option<u32>,
    /// Season/episode counts; series only
    pub seasons: Option<u32>,
    pub episodes: Option<u32>,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
    pub top_cast: Vec<String>,
    /// Crowd rating on TMDB's 0-10 scale; absent when unrated
    pub vote_average: Option<f64>,
    pub release_year: Option<i32>,
    pub poster_url: Option<String>,
}

/// A streaming/rental/purchase offer for a title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchProvider {
    pub provider_name: String,
    pub logo_url: Option<String>,
    pub offer_type: OfferType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OfferType {
    Flatrate,
    Rent,
    Buy,
}

/// One credit from a person's filmography
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonCredit {
    pub tmdb_id: i64,
    pub title: String,
    pub media_kind: MediaKind,
    pub role: Option<String>,
    pub release_year: Option<i32>,
    pub poster_url: Option<String>,
}

// ============================================================================
// Raw TMDB API payloads
// ============================================================================

/// Entry from /search/multi or a /similar listing.
///
/// Movie results carry `title`/`release_date`; TV results carry
/// `name`/`first_air_date`. `media_type` is absent on /similar responses,
/// where the kind is known from the request.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiListEntry {
    pub id: i64,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiListResponse {
    #[serde(default)]
    pub results: Vec<ApiListEntry>,
}

/// Detail response for /movie/{id} or /tv/{id} with appended credits
#[derive(Debug, Clone, Deserialize)]
pub struct ApiTitleDetail {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub number_of_episodes: Option<u32>,
    #[serde(default)]
    pub genres: Vec<ApiGenre>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub credits: Option<ApiCredits>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiGenre {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCredits {
    #[serde(default)]
    pub cast: Vec<ApiCastMember>,
    #[serde(default)]
    pub crew: Vec<ApiCrewMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCastMember {
    pub name: String,
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(default)]
    pub character: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCrewMember {
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
}

/// Response for /{kind}/{id}/watch/providers
#[derive(Debug, Clone, Deserialize)]
pub struct ApiWatchProvidersResponse {
    #[serde(default)]
    pub results: std::collections::HashMap<String, ApiRegionProviders>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiRegionProviders {
    #[serde(default)]
    pub flatrate: Vec<ApiProvider>,
    #[serde(default)]
    pub rent: Vec<ApiProvider>,
    #[serde(default)]
    pub buy: Vec<ApiProvider>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiProvider {
    pub provider_name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
}

/// Response for /person/{id}/combined_credits
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPersonCredits {
    #[serde(default)]
    pub cast: Vec<ApiPersonCreditEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPersonCreditEntry {
    pub id: i64,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

// ============================================================================
// Boundary conversions
// ============================================================================

/// Parses the year out of a TMDB `YYYY-MM-DD` date string.
pub fn parse_release_year(date: Option<&str>) -> Option<i32> {
    date?.get(..4)?.parse().ok()
}

/// Maps TMDB's `media_type` discriminator onto [`MediaKind`].
pub fn parse_media_type(media_type: &str) -> Option<MediaKind> {
    match media_type {
        "movie" => Some(MediaKind::Movie),
        "tv" => Some(MediaKind::Series),
        _ => None,
    }
}

impl ApiListEntry {
    /// Converts a raw list entry into a candidate, composing image URLs
    /// against the given CDN base. Returns `None` for person results and
    /// other non-title media types.
    pub fn into_candidate(self, image_base: &str, fallback_kind: Option<MediaKind>) -> Option<TitleCandidate> {
        let media_kind = match self.media_type.as_deref() {
            Some(t) => parse_media_type(t)?,
            None => fallback_kind?,
        };

        let title = match media_kind {
            MediaKind::Movie => self.title.or(self.name),
            MediaKind::Series => self.name.or(self.title),
        }?;

        let release_year =
            parse_release_year(self.release_date.as_deref().or(self.first_air_date.as_deref()));

        Some(TitleCandidate {
            tmdb_id: self.id,
            title,
            media_kind,
            release_year,
            poster_url: self
                .poster_path
                .map(|p| image_url(image_base, POSTER_SIZE, &p)),
            // TMDB reports 0.0 for unrated titles
            vote_average: self.vote_average.filter(|v| *v > 0.0),
        })
    }
}

impl TmdbDetail {
    /// Builds the snapshot from a raw detail payload. All coercion and
    /// fallback handling happens here so derivations downstream never
    /// touch raw fields.
    pub fn from_api(raw: ApiTitleDetail, kind: MediaKind, image_base: &str) -> Self {
        let release_year =
            parse_release_year(raw.release_date.as_deref().or(raw.first_air_date.as_deref()));

        let (directors, top_cast) = match raw.credits {
            Some(credits) => {
                let mut directors: Vec<String> = credits
                    .crew
                    .into_iter()
                    .filter(|c| c.job.as_deref() == Some("Director"))
                    .map(|c| c.name)
                    .collect();
                directors.dedup();

                let mut cast = credits.cast;
                cast.sort_by_key(|c| c.order.unwrap_or(u32::MAX));
                let top_cast = cast
                    .into_iter()
                    .take(TOP_CAST_LIMIT)
                    .map(|c| c.name)
                    .collect();

                (directors, top_cast)
            }
            None => (Vec::new(), Vec::new()),
        };

        Self {
            tmdb_id: raw.id,
            kind,
            runtime: raw.runtime.filter(|r| *r > 0),
            seasons: raw.number_of_seasons,
            episodes: raw.number_of_episodes,
            genres: raw.genres.into_iter().map(|g| g.name).collect(),
            directors,
            top_cast,
            vote_average: raw.vote_average.filter(|v| *v > 0.0),
            release_year,
            poster_url: raw
                .poster_path
                .map(|p| image_url(image_base, POSTER_SIZE, &p)),
        }
    }
}

impl ApiPersonCreditEntry {
    pub fn into_credit(self, image_base: &str) -> Option<PersonCredit> {
        let media_kind = parse_media_type(self.media_type.as_deref()?)?;
        let title = self.title.or(self.name)?;
        let release_year =
            parse_release_year(self.release_date.as_deref().or(self.first_air_date.as_deref()));

        Some(PersonCredit {
            tmdb_id: self.id,
            title,
            media_kind,
            role: self.character,
            release_year,
            poster_url: self
                .poster_path
                .map(|p| image_url(image_base, POSTER_SIZE, &p)),
        })
    }
}

impl ApiRegionProviders {
    pub fn into_providers(self, image_base: &str) -> Vec<WatchProvider> {
        let convert = |entries: Vec<ApiProvider>, offer_type: OfferType, out: &mut Vec<WatchProvider>| {
            for entry in entries {
                out.push(WatchProvider {
                    provider_name: entry.provider_name,
                    logo_url: entry
                        .logo_path
                        .map(|p| image_url(image_base, "w92", &p)),
                    offer_type,
                });
            }
        };

        let mut providers = Vec::new();
        convert(self.flatrate, OfferType::Flatrate, &mut providers);
        convert(self.rent, OfferType::Rent, &mut providers);
        convert(self.buy, OfferType::Buy, &mut providers);
        providers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGES: &str = "https://image.tmdb.org/t/p";

    #[test]
    fn test_parse_release_year() {
        assert_eq!(parse_release_year(Some("2010-07-16")), Some(2010));
        assert_eq!(parse_release_year(Some("1999")), Some(1999));
        assert_eq!(parse_release_year(Some("")), None);
        assert_eq!(parse_release_year(Some("n/a")), None);
        assert_eq!(parse_release_year(None), None);
    }

    #[test]
    fn test_image_url_composition() {
        assert_eq!(
            image_url(IMAGES, "w342", "/abc.jpg"),
            "https://image.tmdb.org/t/p/w342/abc.jpg"
        );
        assert_eq!(
            image_url("https://image.tmdb.org/t/p/", "w342", "/abc.jpg"),
            "https://image.tmdb.org/t/p/w342/abc.jpg"
        );
    }

    #[test]
    fn test_list_entry_movie_candidate() {
        let json = r#"{
            "id": 27205,
            "media_type": "movie",
            "title": "Inception",
            "release_date": "2010-07-16",
            "poster_path": "/inception.jpg",
            "vote_average": 8.4
        }"#;
        let entry: ApiListEntry = serde_json::from_str(json).unwrap();
        let candidate = entry.into_candidate(IMAGES, None).unwrap();

        assert_eq!(candidate.tmdb_id, 27205);
        assert_eq!(candidate.title, "Inception");
        assert_eq!(candidate.media_kind, MediaKind::Movie);
        assert_eq!(candidate.release_year, Some(2010));
        assert_eq!(
            candidate.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w342/inception.jpg")
        );
        assert_eq!(candidate.vote_average, Some(8.4));
    }

    #[test]
    fn test_list_entry_skips_person_results() {
        let json = r#"{ "id": 1, "media_type": "person", "name": "Nolan" }"#;
        let entry: ApiListEntry = serde_json::from_str(json).unwrap();
        assert!(entry.into_candidate(IMAGES, None).is_none());
    }

    #[test]
    fn test_list_entry_uses_fallback_kind_for_similar() {
        let json = r#"{ "id": 603, "title": "The Matrix", "release_date": "1999-03-31" }"#;
        let entry: ApiListEntry = serde_json::from_str(json).unwrap();
        let candidate = entry
            .into_candidate(IMAGES, Some(MediaKind::Movie))
            .unwrap();
        assert_eq!(candidate.media_kind, MediaKind::Movie);
        assert_eq!(candidate.release_year, Some(1999));
    }

    #[test]
    fn test_unrated_vote_average_becomes_none() {
        let json = r#"{
            "id": 9,
            "media_type": "movie",
            "title": "Obscure",
            "vote_average": 0.0
        }"#;
        let entry: ApiListEntry = serde_json::from_str(json).unwrap();
        let candidate = entry.into_candidate(IMAGES, None).unwrap();
        assert_eq!(candidate.vote_average, None);
    }

    #[test]
    fn test_detail_snapshot_movie() {
        let json = r#"{
            "id": 27205,
            "title": "Inception",
            "runtime": 148,
            "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}],
            "release_date": "2010-07-16",
            "vote_average": 8.4,
            "poster_path": "/inception.jpg",
            "credits": {
                "cast": [
                    {"name": "Elliot Page", "order": 2},
                    {"name": "Leonardo DiCaprio", "order": 0},
                    {"name": "Joseph Gordon-Levitt", "order": 1}
                ],
                "crew": [
                    {"name": "Christopher Nolan", "job": "Director"},
                    {"name": "Hans Zimmer", "job": "Original Music Composer"}
                ]
            }
        }"#;
        let raw: ApiTitleDetail = serde_json::from_str(json).unwrap();
        let detail = TmdbDetail::from_api(raw, MediaKind::Movie, IMAGES);

        assert_eq!(detail.tmdb_id, 27205);
        assert_eq!(detail.runtime, Some(148));
        assert_eq!(detail.genres, vec!["Action", "Science Fiction"]);
        assert_eq!(detail.directors, vec!["Christopher Nolan"]);
        assert_eq!(
            detail.top_cast,
            vec!["Leonardo DiCaprio", "Joseph Gordon-Levitt", "Elliot Page"]
        );
        assert_eq!(detail.vote_average, Some(8.4));
        assert_eq!(detail.release_year, Some(2010));
    }

    #[test]
    fn test_detail_snapshot_series_counts() {
        let json = r#"{
            "id": 1396,
            "name": "Breaking Bad",
            "number_of_seasons": 5,
            "number_of_episodes": 62,
            "first_air_date": "2008-01-20",
            "vote_average": 8.9
        }"#;
        let raw: ApiTitleDetail = serde_json::from_str(json).unwrap();
        let detail = TmdbDetail::from_api(raw, MediaKind::Series, IMAGES);

        assert_eq!(detail.kind, MediaKind::Series);
        assert_eq!(detail.seasons, Some(5));
        assert_eq!(detail.episodes, Some(62));
        assert_eq!(detail.runtime, None);
        assert_eq!(detail.release_year, Some(2008));
        assert!(detail.directors.is_empty());
    }

    #[test]
    fn test_region_providers_flattened_with_offer_types() {
        let json = r#"{
            "flatrate": [{"provider_name": "Netflix", "logo_path": "/n.jpg"}],
            "rent": [{"provider_name": "Apple TV"}],
            "buy": [{"provider_name": "Amazon Video"}]
        }"#;
        let region: ApiRegionProviders = serde_json::from_str(json).unwrap();
        let providers = region.into_providers(IMAGES);

        assert_eq!(providers.len(), 3);
        assert_eq!(providers[0].offer_type, OfferType::Flatrate);
        assert_eq!(
            providers[0].logo_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w92/n.jpg")
        );
        assert_eq!(providers[1].offer_type, OfferType::Rent);
        assert_eq!(providers[2].offer_type, OfferType::Buy);
    }
}
