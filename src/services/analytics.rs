//! Watch-history analytics aggregation.
//!
//! Everything here is a pure fold over immutable inputs: the caller loads a
//! user's watch logs, fetches enrichment snapshots through the metadata
//! provider, and [`compute_analytics`] derives the full view in one pass.
//! The derivations never mutate their inputs and are deterministic given
//! `(entries, enrichment, now)`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    AnalyticsView, BreakdownEntry, CategoryAverage, DecadeBucket, Divergence, EntryRef, MediaKind,
    MonthlyActivity, PersonCount, RatingBucket, RatingCategory, RuntimeBucket, RuntimeStats,
    ScatterPoint, TmdbDetail, Totals, WatchLogEntry,
};
use crate::services::providers::MetadataProvider;
use crate::services::{friends, watch_logs};
use crate::state::Session;

/// Peak concurrent enrichment fetches; batches run sequentially
const ENRICHMENT_BATCH_SIZE: usize = 10;

/// Number of genre buckets reported
const GENRE_LIMIT: usize = 10;

/// Number of directors/cast members reported
const PEOPLE_LIMIT: usize = 5;

/// Months covered by the activity window
const ACTIVITY_MONTHS: usize = 12;

/// Loads a user's watch history and derives the analytics view.
///
/// Visibility is gated the same way as the raw logs: the viewer must be the
/// owner or an accepted friend. A failed watch-log read degrades to the
/// "no data" state rather than an error; enrichment failures degrade
/// per-title inside [`fetch_enrichment`].
pub async fn user_analytics(
    pool: &PgPool,
    provider: Arc<dyn MetadataProvider>,
    session: &Session,
    owner_id: Uuid,
) -> AppResult<Option<AnalyticsView>> {
    friends::require_view_access(pool, session, owner_id).await?;

    let entries = match watch_logs::logs_for_user(pool, owner_id).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(user_id = %owner_id, error = %e, "Watch log query failed, rendering empty analytics");
            return Ok(None);
        }
    };

    let enrichment = fetch_enrichment(provider, &entries).await;
    Ok(compute_analytics(&entries, &enrichment, Utc::now()))
}

/// Fetches detail snapshots for every distinct TMDB id the entries reference.
///
/// Ids are deduplicated, then fetched in batches of [`ENRICHMENT_BATCH_SIZE`]:
/// fetches within a batch run concurrently, batches strictly in sequence, so
/// peak outbound concurrency stays bounded. A failed fetch logs a warning and
/// leaves that title out of the map; it never aborts the batch.
pub async fn fetch_enrichment(
    provider: Arc<dyn MetadataProvider>,
    entries: &[WatchLogEntry],
) -> HashMap<i64, TmdbDetail> {
    let mut seen = HashSet::new();
    let mut refs: Vec<(i64, MediaKind)> = Vec::new();
    for entry in entries {
        if let Some(id) = entry.tmdb_id {
            if seen.insert(id) {
                refs.push((id, entry.media_kind));
            }
        }
    }

    let mut enrichment = HashMap::new();

    for batch in refs.chunks(ENRICHMENT_BATCH_SIZE) {
        let mut tasks = Vec::new();
        for (tmdb_id, kind) in batch.iter().copied() {
            let provider = Arc::clone(&provider);
            tasks.push(tokio::spawn(async move {
                (tmdb_id, provider.fetch_detail(tmdb_id, kind).await)
            }));
        }

        for task in tasks {
            match task.await {
                Ok((tmdb_id, Ok(detail))) => {
                    enrichment.insert(tmdb_id, detail);
                }
                Ok((tmdb_id, Err(e))) => {
                    tracing::warn!(
                        tmdb_id = tmdb_id,
                        error = %e,
                        "Enrichment fetch failed, excluding title from enriched derivations"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Enrichment task join error");
                }
            }
        }
    }

    tracing::debug!(
        referenced = refs.len(),
        enriched = enrichment.len(),
        "Enrichment fetch completed"
    );

    enrichment
}

/// Derives the full analytics view. Returns `None` for an empty history;
/// that is the "no data" state, not an error.
pub fn compute_analytics(
    entries: &[WatchLogEntry],
    enrichment: &HashMap<i64, TmdbDetail>,
    now: DateTime<Utc>,
) -> Option<AnalyticsView> {
    if entries.is_empty() {
        return None;
    }

    // Chronological ordering fixes tie-breaks in the extrema and divergence
    // folds: the earliest entry wins.
    let mut ordered: Vec<&WatchLogEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| e.watched_or_created());

    let (highest_rated, lowest_rated) = extrema(&ordered);
    let (genres, decades) = genre_and_decade_distributions(entries, enrichment);
    let (top_directors, top_cast) = top_people(entries, enrichment);
    let (hidden_gem, unpopular_opinion) = divergence(&ordered, enrichment);

    Some(AnalyticsView {
        totals: totals(entries),
        rating_distribution: rating_distribution(entries),
        monthly_activity: monthly_activity(entries, now),
        media_split: media_split(entries),
        platforms: breakdown(entries.iter().filter_map(|e| e.platform.map(|p| p.as_str()))),
        category_averages: category_averages(entries),
        rewatch_likelihood: breakdown(
            entries
                .iter()
                .filter_map(|e| e.rewatch_likelihood.map(|r| r.as_str())),
        ),
        discovery_sources: breakdown(
            entries
                .iter()
                .filter_map(|e| e.discovered_via.map(|d| d.as_str())),
        ),
        highest_rated,
        lowest_rated,
        genres,
        decades,
        runtime: runtime_stats(entries, enrichment),
        release_scatter: release_scatter(entries, enrichment),
        top_directors,
        top_cast,
        hidden_gem,
        unpopular_opinion,
    })
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn totals(entries: &[WatchLogEntry]) -> Totals {
    let count = entries.len() as u32;
    let movies = entries
        .iter()
        .filter(|e| e.media_kind == MediaKind::Movie)
        .count() as u32;

    let rating_sum: f64 = entries.iter().map(|e| f64::from(e.rating)).sum();

    // An entry without a repeat count contributes one view; "6+" contributes
    // exactly 6 so totals stay reproducible.
    let total_views: u32 = entries
        .iter()
        .map(|e| e.times_watched.map_or(1, |t| t.views()))
        .sum();

    Totals {
        entries: count,
        movies,
        series: count - movies,
        mean_rating: round1(rating_sum / f64::from(count)),
        total_views,
        has_rewatches: total_views > count,
    }
}

/// Histogram over the fixed half-step domain 0.5-5.0, highest rating first.
/// Out-of-domain ratings are dropped, so this is a partial partition.
fn rating_distribution(entries: &[WatchLogEntry]) -> Vec<RatingBucket> {
    // Index 0 holds 5.0, index 9 holds 0.5.
    let mut counts = [0u32; 10];

    for entry in entries {
        let doubled = entry.rating * 2.0;
        if doubled.fract() == 0.0 && (1.0..=10.0).contains(&doubled) {
            counts[10 - doubled as usize] += 1;
        }
    }

    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| RatingBucket {
            rating: (10 - i) as f32 / 2.0,
            count,
        })
        .collect()
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Trailing 12-month window ending at `now`'s calendar month, oldest first.
/// Entries bucket by watched date when present, else log creation time;
/// anything outside the window is dropped.
fn monthly_activity(entries: &[WatchLogEntry], now: DateTime<Utc>) -> Vec<MonthlyActivity> {
    let mut months = Vec::with_capacity(ACTIVITY_MONTHS);
    let (mut year, mut month) = (now.year(), now.month());
    for _ in 0..ACTIVITY_MONTHS {
        months.push((year, month));
        (year, month) = previous_month(year, month);
    }
    months.reverse();

    let index: HashMap<(i32, u32), usize> = months
        .iter()
        .enumerate()
        .map(|(i, &ym)| (ym, i))
        .collect();

    let mut buckets: Vec<MonthlyActivity> = months
        .iter()
        .map(|(y, m)| MonthlyActivity {
            month: format!("{:04}-{:02}", y, m),
            movies: 0,
            series: 0,
        })
        .collect();

    for entry in entries {
        let at = entry.watched_or_created();
        if let Some(&i) = index.get(&(at.year(), at.month())) {
            match entry.media_kind {
                MediaKind::Movie => buckets[i].movies += 1,
                MediaKind::Series => buckets[i].series += 1,
            }
        }
    }

    buckets
}

fn media_split(entries: &[WatchLogEntry]) -> Vec<BreakdownEntry> {
    let movies = entries
        .iter()
        .filter(|e| e.media_kind == MediaKind::Movie)
        .count() as u32;
    let series = entries.len() as u32 - movies;

    let mut split = Vec::new();
    if movies > 0 {
        split.push(BreakdownEntry {
            label: "movies".to_string(),
            count: movies,
        });
    }
    if series > 0 {
        split.push(BreakdownEntry {
            label: "series".to_string(),
            count: series,
        });
    }
    split
}

/// Group-count over an optional label, descending by count. Entries without
/// the field are omitted entirely. Ties break alphabetically so the output
/// is stable under input reordering.
fn breakdown<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<BreakdownEntry> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }

    let mut entries: Vec<BreakdownEntry> = counts
        .into_iter()
        .map(|(label, count)| BreakdownEntry {
            label: label.to_string(),
            count,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    entries
}

/// Per-category averages over entries that rated the category. Unrated
/// entries leave both numerator and denominator; a category nobody rated
/// reports `count: 0` with no average.
fn category_averages(entries: &[WatchLogEntry]) -> Vec<CategoryAverage> {
    RatingCategory::ALL
        .into_iter()
        .map(|category| {
            let values: Vec<i16> = entries
                .iter()
                .filter_map(|e| e.category_ratings.get(category))
                .collect();

            let count = values.len() as u32;
            let average = if values.is_empty() {
                None
            } else {
                let sum: i64 = values.iter().map(|&v| i64::from(v)).sum();
                Some(round1(sum as f64 / f64::from(count)))
            };

            CategoryAverage {
                category,
                average,
                count,
            }
        })
        .collect()
}

/// Highest and lowest rated entries; `ordered` must be chronological so the
/// earliest entry wins ties deterministically.
fn extrema(ordered: &[&WatchLogEntry]) -> (Option<EntryRef>, Option<EntryRef>) {
    let mut highest: Option<&WatchLogEntry> = None;
    let mut lowest: Option<&WatchLogEntry> = None;

    for &entry in ordered {
        if highest.map_or(true, |h| entry.rating > h.rating) {
            highest = Some(entry);
        }
        if lowest.map_or(true, |l| entry.rating < l.rating) {
            lowest = Some(entry);
        }
    }

    let to_ref = |e: &WatchLogEntry| EntryRef {
        id: e.id,
        title: e.title.clone(),
        rating: e.rating,
        poster_url: e.poster_url.clone(),
    };

    (highest.map(to_ref), lowest.map(to_ref))
}

/// Genre and decade histograms over enriched entries. An entry with N
/// genres counts once per genre; the decade is `floor(year/10)*10`.
fn genre_and_decade_distributions(
    entries: &[WatchLogEntry],
    enrichment: &HashMap<i64, TmdbDetail>,
) -> (Vec<BreakdownEntry>, Vec<DecadeBucket>) {
    let mut genre_counts: HashMap<&str, u32> = HashMap::new();
    let mut decade_counts: HashMap<i32, u32> = HashMap::new();

    for entry in entries {
        let Some(detail) = entry.tmdb_id.and_then(|id| enrichment.get(&id)) else {
            continue;
        };

        for genre in &detail.genres {
            *genre_counts.entry(genre.as_str()).or_insert(0) += 1;
        }

        if let Some(year) = detail.release_year {
            *decade_counts.entry(year.div_euclid(10) * 10).or_insert(0) += 1;
        }
    }

    let mut genres: Vec<BreakdownEntry> = genre_counts
        .into_iter()
        .map(|(label, count)| BreakdownEntry {
            label: label.to_string(),
            count,
        })
        .collect();
    genres.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    genres.truncate(GENRE_LIMIT);

    let mut decades: Vec<DecadeBucket> = decade_counts
        .into_iter()
        .map(|(decade, count)| DecadeBucket { decade, count })
        .collect();
    decades.sort_by_key(|d| d.decade);

    (genres, decades)
}

/// Runtime mean and histogram over movie entries whose enrichment carries a
/// runtime. Fixed boundaries: <90, 90-119, 120-149, >=150 minutes.
fn runtime_stats(
    entries: &[WatchLogEntry],
    enrichment: &HashMap<i64, TmdbDetail>,
) -> Option<RuntimeStats> {
    let runtimes: Vec<u32> = entries
        .iter()
        .filter(|e| e.media_kind == MediaKind::Movie)
        .filter_map(|e| e.tmdb_id.and_then(|id| enrichment.get(&id)))
        .filter_map(|d| d.runtime)
        .collect();

    if runtimes.is_empty() {
        return None;
    }

    let mut counts = [0u32; 4];
    for &minutes in &runtimes {
        let i = match minutes {
            0..=89 => 0,
            90..=119 => 1,
            120..=149 => 2,
            _ => 3,
        };
        counts[i] += 1;
    }

    let sum: u64 = runtimes.iter().map(|&m| u64::from(m)).sum();
    let average_minutes = (sum as f64 / runtimes.len() as f64).round() as u32;

    let labels = ["<90", "90-119", "120-149", "150+"];
    Some(RuntimeStats {
        average_minutes,
        buckets: labels
            .iter()
            .zip(counts)
            .map(|(&label, count)| RuntimeBucket { label, count })
            .collect(),
    })
}

/// One point per enriched entry with a known release year, pairing the
/// numeric watch timestamp with the release year for charting.
fn release_scatter(
    entries: &[WatchLogEntry],
    enrichment: &HashMap<i64, TmdbDetail>,
) -> Vec<ScatterPoint> {
    entries
        .iter()
        .filter_map(|entry| {
            let detail = entry.tmdb_id.and_then(|id| enrichment.get(&id))?;
            let release_year = detail.release_year?;
            Some(ScatterPoint {
                watched_at_ms: entry.watched_or_created().timestamp_millis(),
                release_year,
                title: entry.title.clone(),
            })
        })
        .collect()
}

/// Most-watched directors and cast members, counted separately across all
/// enriched entries and truncated to the top five each.
fn top_people(
    entries: &[WatchLogEntry],
    enrichment: &HashMap<i64, TmdbDetail>,
) -> (Vec<PersonCount>, Vec<PersonCount>) {
    let mut director_counts: HashMap<&str, u32> = HashMap::new();
    let mut cast_counts: HashMap<&str, u32> = HashMap::new();

    for entry in entries {
        let Some(detail) = entry.tmdb_id.and_then(|id| enrichment.get(&id)) else {
            continue;
        };
        for name in &detail.directors {
            *director_counts.entry(name.as_str()).or_insert(0) += 1;
        }
        for name in &detail.top_cast {
            *cast_counts.entry(name.as_str()).or_insert(0) += 1;
        }
    }

    let rank = |counts: HashMap<&str, u32>| {
        let mut people: Vec<PersonCount> = counts
            .into_iter()
            .map(|(name, count)| PersonCount {
                name: name.to_string(),
                count,
            })
            .collect();
        people.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        people.truncate(PEOPLE_LIMIT);
        people
    };

    (rank(director_counts), rank(cast_counts))
}

/// Hidden gem and unpopular opinion: the entries whose normalized rating
/// diverges most from the TMDB crowd, positive and negative respectively.
/// `delta = rating * 2 - vote_average`; entries without enrichment or a
/// vote average are skipped. `ordered` must be chronological so ties keep
/// the earliest entry.
fn divergence(
    ordered: &[&WatchLogEntry],
    enrichment: &HashMap<i64, TmdbDetail>,
) -> (Option<Divergence>, Option<Divergence>) {
    let mut best: Option<(f64, &WatchLogEntry, f64)> = None;
    let mut worst: Option<(f64, &WatchLogEntry, f64)> = None;

    for &entry in ordered {
        let Some(detail) = entry.tmdb_id.and_then(|id| enrichment.get(&id)) else {
            continue;
        };
        let Some(vote_average) = detail.vote_average else {
            continue;
        };

        let delta = f64::from(entry.rating) * 2.0 - vote_average;
        if best.map_or(true, |(d, _, _)| delta > d) {
            best = Some((delta, entry, vote_average));
        }
        if worst.map_or(true, |(d, _, _)| delta < d) {
            worst = Some((delta, entry, vote_average));
        }
    }

    let to_divergence = |(delta, entry, vote_average): (f64, &WatchLogEntry, f64)| Divergence {
        entry_id: entry.id,
        title: entry.title.clone(),
        user_rating: entry.rating,
        vote_average,
        delta: round1(delta),
    };

    (
        best.filter(|(d, _, _)| *d > 0.0).map(to_divergence),
        worst.filter(|(d, _, _)| *d < 0.0).map(to_divergence),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{CategoryRatings, Platform, TimesWatched};
    use crate::services::providers::MockMetadataProvider;
    use chrono::{NaiveDate, TimeZone};

    fn entry(rating: f32, watched: &str) -> WatchLogEntry {
        WatchLogEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            tmdb_id: None,
            title: format!("Title {}", rating),
            media_kind: MediaKind::Movie,
            rating,
            review: None,
            watched_on: Some(NaiveDate::parse_from_str(watched, "%Y-%m-%d").unwrap()),
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            category_ratings: CategoryRatings::default(),
            platform: None,
            discovered_via: None,
            rewatch_likelihood: None,
            watched_with: None,
            times_watched: None,
            poster_url: None,
        }
    }

    fn detail(tmdb_id: i64) -> TmdbDetail {
        TmdbDetail {
            tmdb_id,
            kind: MediaKind::Movie,
            runtime: Some(120),
            seasons: None,
            episodes: None,
            genres: vec!["Drama".to_string()],
            directors: vec!["Director A".to_string()],
            top_cast: vec!["Actor A".to_string(), "Actor B".to_string()],
            vote_average: Some(7.0),
            release_year: Some(1999),
            poster_url: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_input_reports_no_data() {
        assert_eq!(compute_analytics(&[], &HashMap::new(), now()), None);
    }

    #[test]
    fn test_totals_scenario_two_entries() {
        // Ratings 5 and 1 -> mean 3.0, highest first entry,
        // lowest second.
        let entries = vec![entry(5.0, "2024-01-01"), entry(1.0, "2024-01-02")];
        let view = compute_analytics(&entries, &HashMap::new(), now()).unwrap();

        assert_eq!(view.totals.entries, 2);
        assert_eq!(view.totals.mean_rating, 3.0);
        assert_eq!(view.highest_rated.as_ref().unwrap().id, entries[0].id);
        assert_eq!(view.lowest_rated.as_ref().unwrap().id, entries[1].id);
    }

    #[test]
    fn test_mean_rating_invariant_under_reordering() {
        let mut entries = vec![
            entry(5.0, "2024-01-01"),
            entry(2.5, "2024-02-01"),
            entry(4.0, "2024-03-01"),
        ];
        let forward = compute_analytics(&entries, &HashMap::new(), now()).unwrap();
        entries.reverse();
        let backward = compute_analytics(&entries, &HashMap::new(), now()).unwrap();

        assert_eq!(forward.totals.mean_rating, backward.totals.mean_rating);
        assert_eq!(forward.rating_distribution, backward.rating_distribution);
    }

    #[test]
    fn test_total_views_scenario_with_six_plus_sentinel() {
        // "6+", none, "2" -> 6 + 1 + 2 = 9 views.
        let mut e1 = entry(4.0, "2024-01-01");
        e1.times_watched = Some(TimesWatched::SixPlus);
        let e2 = entry(3.0, "2024-01-02");
        let mut e3 = entry(2.0, "2024-01-03");
        e3.times_watched = Some(TimesWatched::Count(2));

        let view = compute_analytics(&[e1, e2, e3], &HashMap::new(), now()).unwrap();
        assert_eq!(view.totals.total_views, 9);
        assert_eq!(view.totals.entries, 3);
        assert!(view.totals.has_rewatches);
    }

    #[test]
    fn test_total_views_equals_entry_count_without_rewatches() {
        let entries = vec![entry(4.0, "2024-01-01"), entry(3.0, "2024-01-02")];
        let view = compute_analytics(&entries, &HashMap::new(), now()).unwrap();
        assert_eq!(view.totals.total_views, view.totals.entries);
        assert!(!view.totals.has_rewatches);
    }

    #[test]
    fn test_rating_distribution_is_partial_partition() {
        let mut entries = vec![
            entry(5.0, "2024-01-01"),
            entry(5.0, "2024-01-02"),
            entry(0.5, "2024-01-03"),
        ];
        // Out-of-domain rating must be dropped without crashing.
        entries.push(entry(3.75, "2024-01-04"));

        let view = compute_analytics(&entries, &HashMap::new(), now()).unwrap();
        let buckets = &view.rating_distribution;

        assert_eq!(buckets.len(), 10);
        // Ordered descending by rating value.
        assert_eq!(buckets[0].rating, 5.0);
        assert_eq!(buckets[9].rating, 0.5);
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[9].count, 1);

        let in_domain: u32 = buckets.iter().map(|b| b.count).sum();
        assert_eq!(in_domain, 3);
    }

    #[test]
    fn test_monthly_activity_window_and_bucketing() {
        let inside = entry(4.0, "2024-06-10");
        let mut inside_series = entry(3.0, "2024-05-20");
        inside_series.media_kind = MediaKind::Series;
        let outside = entry(2.0, "2022-01-01");

        let view =
            compute_analytics(&[inside, inside_series, outside], &HashMap::new(), now()).unwrap();
        let months = &view.monthly_activity;

        assert_eq!(months.len(), 12);
        assert_eq!(months[0].month, "2023-07");
        assert_eq!(months[11].month, "2024-06");
        assert_eq!(months[11].movies, 1);
        assert_eq!(months[10].series, 1);

        let total: u32 = months.iter().map(|m| m.movies + m.series).sum();
        assert_eq!(total, 2, "entry outside the window must be dropped");
    }

    #[test]
    fn test_monthly_activity_falls_back_to_created_at() {
        let mut e = entry(4.0, "2024-06-10");
        e.watched_on = None; // created_at is 2024-06-01
        let view = compute_analytics(&[e], &HashMap::new(), now()).unwrap();
        assert_eq!(view.monthly_activity[11].movies, 1);
    }

    #[test]
    fn test_media_split_excludes_zero_categories() {
        let entries = vec![entry(4.0, "2024-01-01")];
        let view = compute_analytics(&entries, &HashMap::new(), now()).unwrap();
        assert_eq!(view.media_split.len(), 1);
        assert_eq!(view.media_split[0].label, "movies");
    }

    #[test]
    fn test_platform_breakdown_omits_unset_and_sorts_descending() {
        let mut e1 = entry(4.0, "2024-01-01");
        e1.platform = Some(Platform::Netflix);
        let mut e2 = entry(3.0, "2024-01-02");
        e2.platform = Some(Platform::Netflix);
        let mut e3 = entry(2.0, "2024-01-03");
        e3.platform = Some(Platform::Theater);
        let e4 = entry(1.0, "2024-01-04");

        let view = compute_analytics(&[e1, e2, e3, e4], &HashMap::new(), now()).unwrap();
        assert_eq!(view.platforms.len(), 2);
        assert_eq!(view.platforms[0].label, "netflix");
        assert_eq!(view.platforms[0].count, 2);
        assert_eq!(view.platforms[1].label, "theater");
    }

    #[test]
    fn test_category_average_distinguishes_no_data_from_low_average() {
        let mut e1 = entry(4.0, "2024-01-01");
        e1.category_ratings.plot = Some(3);
        let mut e2 = entry(3.0, "2024-01-02");
        e2.category_ratings.plot = Some(4);
        // Zero means "not rated" and must stay out of both sides of the mean.
        let mut e3 = entry(2.0, "2024-01-03");
        e3.category_ratings.plot = Some(0);

        let view = compute_analytics(&[e1, e2, e3], &HashMap::new(), now()).unwrap();
        let plot = view
            .category_averages
            .iter()
            .find(|c| c.category == RatingCategory::Plot)
            .unwrap();
        assert_eq!(plot.count, 2);
        assert_eq!(plot.average, Some(3.5));

        let acting = view
            .category_averages
            .iter()
            .find(|c| c.category == RatingCategory::Acting)
            .unwrap();
        assert_eq!(acting.count, 0);
        assert_eq!(acting.average, None);
    }

    #[test]
    fn test_extrema_tie_breaks_to_earliest_entry() {
        let first = entry(5.0, "2024-01-01");
        let second = entry(5.0, "2024-01-05");
        let first_id = first.id;
        // Input order reversed; chronology must decide.
        let view = compute_analytics(&[second, first], &HashMap::new(), now()).unwrap();
        assert_eq!(view.highest_rated.unwrap().id, first_id);
    }

    #[test]
    fn test_genre_decade_and_runtime_from_enrichment() {
        let mut e1 = entry(4.0, "2024-01-01");
        e1.tmdb_id = Some(1);
        let mut e2 = entry(3.0, "2024-01-02");
        e2.tmdb_id = Some(2);
        let unmatched = entry(2.0, "2024-01-03");

        let mut enrichment = HashMap::new();
        let mut d1 = detail(1);
        d1.genres = vec!["Drama".to_string(), "Crime".to_string()];
        d1.release_year = Some(1995);
        d1.runtime = Some(171);
        enrichment.insert(1, d1);
        let mut d2 = detail(2);
        d2.release_year = Some(2008);
        d2.runtime = Some(85);
        enrichment.insert(2, d2);

        let view = compute_analytics(&[e1, e2, unmatched], &enrichment, now()).unwrap();

        // e1 contributes to two genre buckets.
        let drama = view.genres.iter().find(|g| g.label == "Drama").unwrap();
        assert_eq!(drama.count, 2);
        assert!(view.genres.iter().any(|g| g.label == "Crime"));

        assert_eq!(
            view.decades,
            vec![
                DecadeBucket { decade: 1990, count: 1 },
                DecadeBucket { decade: 2000, count: 1 },
            ]
        );

        let runtime = view.runtime.unwrap();
        assert_eq!(runtime.average_minutes, 128); // (171 + 85) / 2
        assert_eq!(runtime.buckets[0].count, 1); // <90
        assert_eq!(runtime.buckets[3].count, 1); // 150+

        // Scatter only covers enriched entries with a release year.
        assert_eq!(view.release_scatter.len(), 2);
    }

    #[test]
    fn test_runtime_ignores_series_entries() {
        let mut e = entry(4.0, "2024-01-01");
        e.tmdb_id = Some(1);
        e.media_kind = MediaKind::Series;
        let mut enrichment = HashMap::new();
        enrichment.insert(1, detail(1));

        let view = compute_analytics(&[e], &enrichment, now()).unwrap();
        assert!(view.runtime.is_none());
    }

    #[test]
    fn test_top_people_ranked_and_truncated() {
        let mut entries = Vec::new();
        let mut enrichment = HashMap::new();
        for i in 0..7i64 {
            let mut e = entry(3.0, "2024-01-01");
            e.tmdb_id = Some(i);
            entries.push(e);
            let mut d = detail(i);
            d.directors = vec![if i < 4 {
                "Prolific".to_string()
            } else {
                format!("Director {}", i)
            }];
            d.top_cast = vec![format!("Actor {}", i)];
            enrichment.insert(i, d);
        }

        let view = compute_analytics(&entries, &enrichment, now()).unwrap();
        assert_eq!(view.top_directors[0].name, "Prolific");
        assert_eq!(view.top_directors[0].count, 4);
        assert!(view.top_directors.len() <= 5);
        assert!(view.top_cast.len() <= 5);
    }

    #[test]
    fn test_divergence_hidden_gem_and_unpopular_opinion() {
        let mut loved = entry(5.0, "2024-01-01"); // 10 - 6.0 = +4.0
        loved.tmdb_id = Some(1);
        let mut hated = entry(1.0, "2024-01-02"); // 2 - 8.5 = -6.5
        hated.tmdb_id = Some(2);
        let mut agreed = entry(3.5, "2024-01-03"); // 7 - 7.0 = 0.0
        agreed.tmdb_id = Some(3);

        let mut enrichment = HashMap::new();
        let mut d1 = detail(1);
        d1.vote_average = Some(6.0);
        enrichment.insert(1, d1);
        let mut d2 = detail(2);
        d2.vote_average = Some(8.5);
        enrichment.insert(2, d2);
        let mut d3 = detail(3);
        d3.vote_average = Some(7.0);
        enrichment.insert(3, d3);

        let loved_id = loved.id;
        let hated_id = hated.id;
        let view = compute_analytics(&[loved, hated, agreed], &enrichment, now()).unwrap();

        let gem = view.hidden_gem.unwrap();
        assert_eq!(gem.entry_id, loved_id);
        assert_eq!(gem.delta, 4.0);

        let opinion = view.unpopular_opinion.unwrap();
        assert_eq!(opinion.entry_id, hated_id);
        assert_eq!(opinion.delta, -6.5);
    }

    #[test]
    fn test_divergence_excludes_entries_without_vote_average() {
        let mut e = entry(5.0, "2024-01-01");
        e.tmdb_id = Some(1);
        let mut enrichment = HashMap::new();
        let mut d = detail(1);
        d.vote_average = None;
        enrichment.insert(1, d);

        let view = compute_analytics(&[e], &enrichment, now()).unwrap();
        assert!(view.hidden_gem.is_none());
        assert!(view.unpopular_opinion.is_none());
    }

    #[test]
    fn test_unenriched_entries_still_count_in_core_derivations() {
        // One of three enrichment fetches fails; totals and
        // distribution still cover all three entries, enriched views only two.
        let mut e1 = entry(5.0, "2024-01-01");
        e1.tmdb_id = Some(1);
        let mut e2 = entry(4.0, "2024-01-02");
        e2.tmdb_id = Some(2);
        let mut e3 = entry(3.0, "2024-01-03");
        e3.tmdb_id = Some(3); // fetch for this one "failed"

        let mut enrichment = HashMap::new();
        enrichment.insert(1, detail(1));
        enrichment.insert(2, detail(2));

        let view = compute_analytics(&[e1, e2, e3], &enrichment, now()).unwrap();
        assert_eq!(view.totals.entries, 3);
        let distributed: u32 = view.rating_distribution.iter().map(|b| b.count).sum();
        assert_eq!(distributed, 3);
        assert_eq!(view.release_scatter.len(), 2);
        assert_eq!(view.decades.iter().map(|d| d.count).sum::<u32>(), 2);
    }

    #[tokio::test]
    async fn test_fetch_enrichment_dedupes_and_degrades_on_failure() {
        let mut e1 = entry(5.0, "2024-01-01");
        e1.tmdb_id = Some(1);
        let mut e2 = entry(4.0, "2024-01-02");
        e2.tmdb_id = Some(2);
        // Duplicate reference must not trigger a second fetch.
        let mut e3 = entry(3.0, "2024-01-03");
        e3.tmdb_id = Some(1);
        let unmatched = entry(2.0, "2024-01-04");

        let mut provider = MockMetadataProvider::new();
        provider
            .expect_fetch_detail()
            .times(2)
            .returning(|tmdb_id, _| {
                if tmdb_id == 2 {
                    Err(AppError::ExternalApi("boom".to_string()))
                } else {
                    Ok(detail(tmdb_id))
                }
            });

        let provider: Arc<dyn MetadataProvider> = Arc::new(provider);
        let enrichment = fetch_enrichment(provider, &[e1, e2, e3, unmatched]).await;

        assert_eq!(enrichment.len(), 1);
        assert!(enrichment.contains_key(&1));
    }
}
