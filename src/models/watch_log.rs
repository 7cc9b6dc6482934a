use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Kind of tracked title
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(MediaKind::Movie),
            "series" => Some(MediaKind::Series),
            _ => None,
        }
    }
}

/// Where a title was watched
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Theater,
    Netflix,
    PrimeVideo,
    DisneyPlus,
    HboMax,
    Hulu,
    AppleTv,
    PhysicalMedia,
    CableTv,
    Other,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Theater => "theater",
            Platform::Netflix => "netflix",
            Platform::PrimeVideo => "prime_video",
            Platform::DisneyPlus => "disney_plus",
            Platform::HboMax => "hbo_max",
            Platform::Hulu => "hulu",
            Platform::AppleTv => "apple_tv",
            Platform::PhysicalMedia => "physical_media",
            Platform::CableTv => "cable_tv",
            Platform::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "theater" => Some(Platform::Theater),
            "netflix" => Some(Platform::Netflix),
            "prime_video" => Some(Platform::PrimeVideo),
            "disney_plus" => Some(Platform::DisneyPlus),
            "hbo_max" => Some(Platform::HboMax),
            "hulu" => Some(Platform::Hulu),
            "apple_tv" => Some(Platform::AppleTv),
            "physical_media" => Some(Platform::PhysicalMedia),
            "cable_tv" => Some(Platform::CableTv),
            "other" => Some(Platform::Other),
            _ => None,
        }
    }
}

/// How the user found out about a title
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    Friend,
    Family,
    SocialMedia,
    Recommendation,
    Trailer,
    Browsing,
    Article,
    Other,
}

impl DiscoverySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoverySource::Friend => "friend",
            DiscoverySource::Family => "family",
            DiscoverySource::SocialMedia => "social_media",
            DiscoverySource::Recommendation => "recommendation",
            DiscoverySource::Trailer => "trailer",
            DiscoverySource::Browsing => "browsing",
            DiscoverySource::Article => "article",
            DiscoverySource::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "friend" => Some(DiscoverySource::Friend),
            "family" => Some(DiscoverySource::Family),
            "social_media" => Some(DiscoverySource::SocialMedia),
            "recommendation" => Some(DiscoverySource::Recommendation),
            "trailer" => Some(DiscoverySource::Trailer),
            "browsing" => Some(DiscoverySource::Browsing),
            "article" => Some(DiscoverySource::Article),
            "other" => Some(DiscoverySource::Other),
            _ => None,
        }
    }
}

/// How likely the user is to watch the title again
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RewatchLikelihood {
    Definitely,
    Probably,
    Maybe,
    Unlikely,
    Never,
}

impl RewatchLikelihood {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewatchLikelihood::Definitely => "definitely",
            RewatchLikelihood::Probably => "probably",
            RewatchLikelihood::Maybe => "maybe",
            RewatchLikelihood::Unlikely => "unlikely",
            RewatchLikelihood::Never => "never",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "definitely" => Some(RewatchLikelihood::Definitely),
            "probably" => Some(RewatchLikelihood::Probably),
            "maybe" => Some(RewatchLikelihood::Maybe),
            "unlikely" => Some(RewatchLikelihood::Unlikely),
            "never" => Some(RewatchLikelihood::Never),
            _ => None,
        }
    }
}

/// Who the user watched with
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Companionship {
    Alone,
    Partner,
    Family,
    Friends,
    Other,
}

impl Companionship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Companionship::Alone => "alone",
            Companionship::Partner => "partner",
            Companionship::Family => "family",
            Companionship::Friends => "friends",
            Companionship::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "alone" => Some(Companionship::Alone),
            "partner" => Some(Companionship::Partner),
            "family" => Some(Companionship::Family),
            "friends" => Some(Companionship::Friends),
            "other" => Some(Companionship::Other),
            _ => None,
        }
    }
}

/// How many times the user has watched a title.
///
/// The form offers 1 through 5 plus a "6+" option. "6+" is deliberately
/// lossy: it always counts as exactly 6 views so totals stay reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimesWatched {
    Count(u8),
    SixPlus,
}

impl TimesWatched {
    /// `Count` carries a value in 1-5; anything else collapses to the
    /// nearest bound so views and serialization always agree.
    fn clamped(n: u8) -> u8 {
        n.clamp(1, 5)
    }

    /// Number of views this value contributes to view totals.
    pub fn views(&self) -> u32 {
        match self {
            TimesWatched::Count(n) => u32::from(Self::clamped(*n)),
            TimesWatched::SixPlus => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimesWatched::SixPlus => "6+",
            TimesWatched::Count(n) => match Self::clamped(*n) {
                1 => "1",
                2 => "2",
                3 => "3",
                4 => "4",
                _ => "5",
            },
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1" => Some(TimesWatched::Count(1)),
            "2" => Some(TimesWatched::Count(2)),
            "3" => Some(TimesWatched::Count(3)),
            "4" => Some(TimesWatched::Count(4)),
            "5" => Some(TimesWatched::Count(5)),
            "6+" => Some(TimesWatched::SixPlus),
            _ => None,
        }
    }
}

impl Serialize for TimesWatched {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TimesWatched {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TimesWatched::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid times_watched: {}", s)))
    }
}

/// The six optional per-aspect ratings, each 1-5 when present
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRatings {
    pub plot: Option<i16>,
    pub cinematography: Option<i16>,
    pub acting: Option<i16>,
    pub soundtrack: Option<i16>,
    pub pacing: Option<i16>,
    pub casting: Option<i16>,
}

/// Names for the per-aspect rating fields
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RatingCategory {
    Plot,
    Cinematography,
    Acting,
    Soundtrack,
    Pacing,
    Casting,
}

impl RatingCategory {
    pub const ALL: [RatingCategory; 6] = [
        RatingCategory::Plot,
        RatingCategory::Cinematography,
        RatingCategory::Acting,
        RatingCategory::Soundtrack,
        RatingCategory::Pacing,
        RatingCategory::Casting,
    ];
}

impl CategoryRatings {
    /// Value for one category, with 0 normalized to "not rated".
    pub fn get(&self, category: RatingCategory) -> Option<i16> {
        let raw = match category {
            RatingCategory::Plot => self.plot,
            RatingCategory::Cinematography => self.cinematography,
            RatingCategory::Acting => self.acting,
            RatingCategory::Soundtrack => self.soundtrack,
            RatingCategory::Pacing => self.pacing,
            RatingCategory::Casting => self.casting,
        };
        raw.filter(|v| *v > 0)
    }
}

/// One user's record of having watched a title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchLogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    /// TMDB id, absent for user-entered titles with no metadata match
    pub tmdb_id: Option<i64>,
    pub title: String,
    pub media_kind: MediaKind,
    /// Overall rating in half steps, 0.5-5.0
    pub rating: f32,
    pub review: Option<String>,
    /// Calendar date the title was watched; distinct from the log date
    pub watched_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub category_ratings: CategoryRatings,
    pub platform: Option<Platform>,
    pub discovered_via: Option<DiscoverySource>,
    pub rewatch_likelihood: Option<RewatchLikelihood>,
    pub watched_with: Option<Companionship>,
    pub times_watched: Option<TimesWatched>,
    /// Poster snapshot taken at log time, decoupled from later TMDB changes
    pub poster_url: Option<String>,
}

impl WatchLogEntry {
    /// Timestamp used for chronological ordering and month bucketing:
    /// the watched date when present, otherwise the log creation time.
    pub fn watched_or_created(&self) -> DateTime<Utc> {
        match self.watched_on {
            Some(date) => date.and_time(NaiveTime::MIN).and_utc(),
            None => self.created_at,
        }
    }
}

/// Fields submitted when creating or editing a watch log
#[derive(Debug, Clone, Deserialize)]
pub struct WatchLogInput {
    pub tmdb_id: Option<i64>,
    pub title: String,
    pub media_kind: MediaKind,
    pub rating: f32,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub watched_on: Option<NaiveDate>,
    #[serde(flatten)]
    pub category_ratings: CategoryRatings,
    #[serde(default)]
    pub platform: Option<Platform>,
    #[serde(default)]
    pub discovered_via: Option<DiscoverySource>,
    #[serde(default)]
    pub rewatch_likelihood: Option<RewatchLikelihood>,
    #[serde(default)]
    pub watched_with: Option<Companionship>,
    #[serde(default)]
    pub times_watched: Option<TimesWatched>,
    #[serde(default)]
    pub poster_url: Option<String>,
}

impl WatchLogInput {
    /// Validates the submission before any I/O happens.
    ///
    /// The watched date is intentionally not checked against the log date or
    /// the title's release date: backfilling historical watches is allowed.
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::InvalidInput("Title cannot be empty".to_string()));
        }

        let doubled = self.rating * 2.0;
        if !(0.5..=5.0).contains(&self.rating) || doubled.fract() != 0.0 {
            return Err(AppError::InvalidInput(
                "Rating must be between 0.5 and 5.0 in half steps".to_string(),
            ));
        }

        for category in RatingCategory::ALL {
            if let Some(value) = self.category_ratings.get(category) {
                if !(1..=5).contains(&value) {
                    return Err(AppError::InvalidInput(format!(
                        "Category rating {:?} must be between 1 and 5",
                        category
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> WatchLogInput {
        WatchLogInput {
            tmdb_id: Some(27205),
            title: "Inception".to_string(),
            media_kind: MediaKind::Movie,
            rating: 4.5,
            review: None,
            watched_on: None,
            category_ratings: CategoryRatings::default(),
            platform: Some(Platform::Netflix),
            discovered_via: None,
            rewatch_likelihood: None,
            watched_with: None,
            times_watched: None,
            poster_url: None,
        }
    }

    #[test]
    fn test_validate_accepts_half_step_ratings() {
        for rating in [0.5, 1.0, 2.5, 5.0] {
            let mut input = valid_input();
            input.rating = rating;
            assert!(input.validate().is_ok(), "rating {} should pass", rating);
        }
    }

    #[test]
    fn test_validate_rejects_out_of_domain_ratings() {
        for rating in [0.0, 0.3, 2.7, 5.5] {
            let mut input = valid_input();
            input.rating = rating;
            assert!(input.validate().is_err(), "rating {} should fail", rating);
        }
    }

    #[test]
    fn test_validate_rejects_empty_title() {
        let mut input = valid_input();
        input.title = "   ".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_category_rating_out_of_range() {
        let mut input = valid_input();
        input.category_ratings.plot = Some(6);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_times_watched_views() {
        assert_eq!(TimesWatched::Count(3).views(), 3);
        assert_eq!(TimesWatched::SixPlus.views(), 6);
    }

    #[test]
    fn test_times_watched_parse_round_trip() {
        for raw in ["1", "2", "3", "4", "5", "6+"] {
            let parsed = TimesWatched::parse(raw).unwrap();
            assert_eq!(parsed.as_str(), raw);
        }
        assert_eq!(TimesWatched::parse("7"), None);
        assert_eq!(TimesWatched::parse("0"), None);
    }

    #[test]
    fn test_times_watched_out_of_range_count_clamps_consistently() {
        assert_eq!(TimesWatched::Count(7).as_str(), "5");
        assert_eq!(TimesWatched::Count(7).views(), 5);
        assert_eq!(TimesWatched::Count(0).as_str(), "1");
        assert_eq!(TimesWatched::Count(0).views(), 1);
    }

    #[test]
    fn test_times_watched_serde_uses_string_form() {
        let json = serde_json::to_string(&TimesWatched::SixPlus).unwrap();
        assert_eq!(json, "\"6+\"");
        let back: TimesWatched = serde_json::from_str("\"2\"").unwrap();
        assert_eq!(back, TimesWatched::Count(2));
    }

    #[test]
    fn test_category_ratings_zero_means_not_rated() {
        let ratings = CategoryRatings {
            plot: Some(0),
            acting: Some(4),
            ..Default::default()
        };
        assert_eq!(ratings.get(RatingCategory::Plot), None);
        assert_eq!(ratings.get(RatingCategory::Acting), Some(4));
        assert_eq!(ratings.get(RatingCategory::Pacing), None);
    }

    #[test]
    fn test_platform_serde_matches_as_str() {
        let json = serde_json::to_string(&Platform::PrimeVideo).unwrap();
        assert_eq!(json, format!("\"{}\"", Platform::PrimeVideo.as_str()));
    }

    #[test]
    fn test_watched_or_created_prefers_watched_date() {
        let entry = WatchLogEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            tmdb_id: None,
            title: "Heat".to_string(),
            media_kind: MediaKind::Movie,
            rating: 5.0,
            review: None,
            watched_on: Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
            created_at: Utc::now(),
            category_ratings: CategoryRatings::default(),
            platform: None,
            discovered_via: None,
            rewatch_likelihood: None,
            watched_with: None,
            times_watched: None,
            poster_url: None,
        };
        assert_eq!(
            entry.watched_or_created().date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }
}
