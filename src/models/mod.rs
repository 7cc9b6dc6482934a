pub mod analytics;
pub mod friendship;
pub mod list;
pub mod profile;
pub mod tmdb;
pub mod watch_log;

pub use analytics::{
    AnalyticsView, BreakdownEntry, CategoryAverage, DecadeBucket, Divergence, EntryRef,
    MonthlyActivity, PersonCount, RatingBucket, RuntimeBucket, RuntimeStats, ScatterPoint, Totals,
};
pub use friendship::{Friendship, FriendshipStatus, RelationshipState};
pub use list::{List, ListInput, ListItem, ListWithItems, SavedTitleInput, WatchlistItem};
pub use profile::{AnnotatedProfile, Profile, ProfileInput};
pub use tmdb::{OfferType, PersonCredit, TitleCandidate, TmdbDetail, WatchProvider};
pub use watch_log::{
    CategoryRatings, Companionship, DiscoverySource, MediaKind, Platform, RatingCategory,
    RewatchLikelihood, TimesWatched, WatchLogEntry, WatchLogInput,
};
