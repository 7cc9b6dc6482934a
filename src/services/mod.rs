pub mod analytics;
pub mod friends;
pub mod lists;
pub mod profiles;
pub mod providers;
pub mod watch_logs;
