//! Query cache configuration.
//!
//! Reads cache lifetime and paging settings from environment variables.

use std::env;
use std::time::Duration;

/// Default lifetime of an entry with no subscribers (5 minutes).
pub const DEFAULT_GC_SECS: u64 = 300;

/// Default interval between garbage collection sweeps.
pub const DEFAULT_GC_INTERVAL_SECS: u64 = 60;

/// Configuration for the query cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// How long an entry survives after its last subscriber is gone.
    /// `None` keeps entries until they are invalidated.
    pub gc_time: Option<Duration>,
    /// How often the background sweep runs.
    pub gc_interval: Duration,
    /// Page size requested for community events, if any.
    pub events_page_size: Option<u32>,
}

impl QueryConfig {
    /// Load configuration from environment variables.
    ///
    /// - `GATHER_QUERY_GC_SECS`: seconds, or `never` to disable eviction
    /// - `GATHER_QUERY_GC_INTERVAL_SECS`: seconds between sweeps
    /// - `GATHER_EVENTS_PAGE_SIZE`: page size for event lists
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let gc_time = match lookup("GATHER_QUERY_GC_SECS") {
            Some(value) => parse_gc_time(&value),
            None => Some(Duration::from_secs(DEFAULT_GC_SECS)),
        };

        let gc_interval = lookup("GATHER_QUERY_GC_INTERVAL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_GC_INTERVAL_SECS);

        Self {
            gc_time,
            gc_interval: Duration::from_secs(gc_interval),
            events_page_size: lookup("GATHER_EVENTS_PAGE_SIZE")
                .and_then(|v| v.trim().parse().ok()),
        }
    }

    /// Keep inactive entries forever.
    pub fn without_eviction(mut self) -> Self {
        self.gc_time = None;
        self
    }

    /// Set the inactivity period after which entries are evicted.
    pub fn with_gc_time(mut self, gc_time: Duration) -> Self {
        self.gc_time = Some(gc_time);
        self
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Parse a GC lifetime. `never` (or `off`) disables eviction; unparsable
/// values fall back to the default.
fn parse_gc_time(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("never") || value.eq_ignore_ascii_case("off") {
        return None;
    }
    let secs = value.parse::<u64>().unwrap_or(DEFAULT_GC_SECS);
    Some(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> QueryConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        QueryConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = config_from(&[]);
        assert_eq!(config.gc_time, Some(Duration::from_secs(DEFAULT_GC_SECS)));
        assert_eq!(config.gc_interval, Duration::from_secs(DEFAULT_GC_INTERVAL_SECS));
        assert_eq!(config.events_page_size, None);
    }

    #[test]
    fn test_config_from_variables() {
        let config = config_from(&[
            ("GATHER_QUERY_GC_SECS", "never"),
            ("GATHER_QUERY_GC_INTERVAL_SECS", "0"),
            ("GATHER_EVENTS_PAGE_SIZE", " 12 "),
        ]);
        assert_eq!(config.gc_time, None);
        // A zero interval falls back to the default
        assert_eq!(config.gc_interval, Duration::from_secs(DEFAULT_GC_INTERVAL_SECS));
        assert_eq!(config.events_page_size, Some(12));

        let config = config_from(&[
            ("GATHER_QUERY_GC_SECS", "45"),
            ("GATHER_EVENTS_PAGE_SIZE", "x"),
        ]);
        assert_eq!(config.gc_time, Some(Duration::from_secs(45)));
        assert_eq!(config.events_page_size, None);
    }

    #[test]
    fn test_parse_gc_time() {
        assert_eq!(parse_gc_time("never"), None);
        assert_eq!(parse_gc_time("OFF"), None);
        assert_eq!(parse_gc_time("30"), Some(Duration::from_secs(30)));
        assert_eq!(
            parse_gc_time("soon"),
            Some(Duration::from_secs(DEFAULT_GC_SECS))
        );
    }

    #[test]
    fn test_builders() {
        let config = config_from(&[]).without_eviction();
        assert_eq!(config.gc_time, None);

        let config = config.with_gc_time(Duration::ZERO);
        assert_eq!(config.gc_time, Some(Duration::ZERO));
    }
}
