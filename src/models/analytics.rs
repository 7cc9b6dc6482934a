use serde::Serialize;
use uuid::Uuid;

use crate::models::RatingCategory;

/// Everything the analytics page renders, derived in one pass from a user's
/// watch logs plus the enrichment snapshots that could be fetched.
///
/// All fields are recomputed fully on each load; nothing here is persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalyticsView {
    pub totals: Totals,
    pub rating_distribution: Vec<RatingBucket>,
    pub monthly_activity: Vec<MonthlyActivity>,
    pub media_split: Vec<BreakdownEntry>,
    pub platforms: Vec<BreakdownEntry>,
    pub category_averages: Vec<CategoryAverage>,
    pub rewatch_likelihood: Vec<BreakdownEntry>,
    pub discovery_sources: Vec<BreakdownEntry>,
    pub highest_rated: Option<EntryRef>,
    pub lowest_rated: Option<EntryRef>,
    pub genres: Vec<BreakdownEntry>,
    pub decades: Vec<DecadeBucket>,
    pub runtime: Option<RuntimeStats>,
    pub release_scatter: Vec<ScatterPoint>,
    pub top_directors: Vec<PersonCount>,
    pub top_cast: Vec<PersonCount>,
    pub hidden_gem: Option<Divergence>,
    pub unpopular_opinion: Option<Divergence>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Totals {
    pub entries: u32,
    pub movies: u32,
    pub series: u32,
    /// Arithmetic mean over all overall ratings, one decimal place
    pub mean_rating: f64,
    /// Views including rewatches; `"6+"` counts as exactly 6
    pub total_views: u32,
    pub has_rewatches: bool,
}

/// One bar of the overall-rating histogram
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RatingBucket {
    pub rating: f32,
    pub count: u32,
}

/// One month of the trailing 12-month activity window
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlyActivity {
    /// `YYYY-MM`
    pub month: String,
    pub movies: u32,
    pub series: u32,
}

/// Generic grouped count used by the platform/genre/enum breakdowns
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BreakdownEntry {
    pub label: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryAverage {
    pub category: RatingCategory,
    /// Absent when no entry rated this category; a 0.0 average cannot occur
    /// since the rating domain starts at 1
    pub average: Option<f64>,
    pub count: u32,
}

/// Minimal reference to a single log entry, for extrema display
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntryRef {
    pub id: Uuid,
    pub title: String,
    pub rating: f32,
    pub poster_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DecadeBucket {
    pub decade: i32,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RuntimeStats {
    /// Mean runtime in minutes, rounded to the nearest integer
    pub average_minutes: u32,
    pub buckets: Vec<RuntimeBucket>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RuntimeBucket {
    pub label: &'static str,
    pub count: u32,
}

/// One point of the release-year vs. watch-date chart
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScatterPoint {
    pub watched_at_ms: i64,
    pub release_year: i32,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PersonCount {
    pub name: String,
    pub count: u32,
}

/// A title where the user's rating diverges most from the crowd.
///
/// `delta` is the user rating doubled onto TMDB's 0-10 scale minus the
/// external vote average, rounded to one decimal.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Divergence {
    pub entry_id: Uuid,
    pub title: String,
    pub user_rating: f32,
    pub vote_average: f64,
    pub delta: f64,
}
