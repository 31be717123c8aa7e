//! Refresh orchestration: the four polled queries and their snapshots.
//!
//! Periodic ticks and manual refreshes both produce [`FetchOutcome`]s that
//! are applied through the same path. Queries are idempotent reads, so
//! when a tick and a manual refresh race, the last response wins.

use std::time::Duration;

use tracing::{debug, warn};

use crate::client::{EarthquakeSource, Query};
use crate::errors::QuakeError;
use crate::models::{ApiResponse, Earthquake, EarthquakeStats};
use crate::snapshot::QuerySnapshot;

/// Minimum poll interval in seconds.
pub const MIN_POLL_INTERVAL_SECS: u64 = 30;

/// Refresh configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Shared period for every polled query
    pub poll_interval: Duration,
    /// Size of the all-earthquakes query
    pub earthquake_limit: usize,
    /// Size of the top-by-magnitude query
    pub top_count: usize,
    /// Size of the most-recent query
    pub recent_count: usize,
    /// Markers drawn from the head of the current set
    pub map_limit: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            earthquake_limit: 50,
            top_count: 5,
            recent_count: 10,
            map_limit: 30,
        }
    }
}

impl RefreshConfig {
    /// Build a config with a poll interval clamped to the minimum.
    #[must_use]
    pub fn with_poll_secs(secs: u64) -> Self {
        let clamped = secs.max(MIN_POLL_INTERVAL_SECS);
        if clamped != secs {
            warn!("poll interval clamped to minimum of {} seconds", MIN_POLL_INTERVAL_SECS);
        }
        Self {
            poll_interval: Duration::from_secs(clamped),
            ..Self::default()
        }
    }
}

/// A successful response for one polled query.
#[derive(Debug, Clone)]
pub enum Payload {
    Earthquakes(ApiResponse<Vec<Earthquake>>),
    Top(ApiResponse<Vec<Earthquake>>),
    Recent(ApiResponse<Vec<Earthquake>>),
    Stats(ApiResponse<EarthquakeStats>),
}

/// The four queries kept fresh by polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolledQuery {
    Earthquakes,
    Top,
    Recent,
    Stats,
}

impl PolledQuery {
    pub const ALL: [Self; 4] = [Self::Earthquakes, Self::Top, Self::Recent, Self::Stats];

    /// The API query this poll issues.
    #[must_use]
    pub const fn query(self) -> Query {
        match self {
            Self::Earthquakes => Query::Earthquakes,
            Self::Top => Query::Top,
            Self::Recent => Query::Recent,
            Self::Stats => Query::Stats,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.query().as_str()
    }
}

impl From<PolledQuery> for Query {
    fn from(polled: PolledQuery) -> Self {
        polled.query()
    }
}

/// The result of fetching one polled query.
#[derive(Debug)]
pub struct FetchOutcome {
    pub query: PolledQuery,
    pub result: Result<Payload, QuakeError>,
}

/// Fetch one polled query.
pub async fn fetch_query(
    source: &dyn EarthquakeSource,
    query: PolledQuery,
    config: &RefreshConfig,
) -> FetchOutcome {
    let result = match query {
        PolledQuery::Earthquakes => source
            .list(Some(config.earthquake_limit), None)
            .await
            .map(Payload::Earthquakes),
        PolledQuery::Top => source.top(config.top_count).await.map(Payload::Top),
        PolledQuery::Recent => source.recent(config.recent_count).await.map(Payload::Recent),
        PolledQuery::Stats => source.stats().await.map(Payload::Stats),
    };

    match &result {
        Ok(_) => debug!("{} query settled", query.as_str()),
        Err(e) => warn!("{} query failed: {}", query.as_str(), e),
    }

    FetchOutcome { query, result }
}

/// Fire all four polled queries concurrently and wait for every one.
pub async fn refresh_all(source: &dyn EarthquakeSource, config: &RefreshConfig) -> Vec<FetchOutcome> {
    let (earthquakes, top, recent, stats) = tokio::join!(
        fetch_query(source, PolledQuery::Earthquakes, config),
        fetch_query(source, PolledQuery::Top, config),
        fetch_query(source, PolledQuery::Recent, config),
        fetch_query(source, PolledQuery::Stats, config),
    );
    vec![earthquakes, top, recent, stats]
}

/// Aggregate result of a manual refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Queries whose fetch failed
    pub failed: Vec<PolledQuery>,
}

impl RefreshReport {
    /// True only when every query succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The four polled snapshots.
#[derive(Debug, Default)]
pub struct Snapshots {
    pub earthquakes: QuerySnapshot<Vec<Earthquake>>,
    pub top: QuerySnapshot<Vec<Earthquake>>,
    pub recent: QuerySnapshot<Vec<Earthquake>>,
    pub stats: QuerySnapshot<EarthquakeStats>,
}

impl Snapshots {
    /// Mark a fetch of `query` as started.
    pub fn begin(&mut self, query: PolledQuery) {
        match query {
            PolledQuery::Earthquakes => self.earthquakes.begin(),
            PolledQuery::Top => self.top.begin(),
            PolledQuery::Recent => self.recent.begin(),
            PolledQuery::Stats => self.stats.begin(),
        }
    }

    /// Settle the snapshot the outcome belongs to.
    ///
    /// Returns `false` if the fetch failed.
    pub fn apply(&mut self, outcome: FetchOutcome) -> bool {
        match outcome.result {
            Ok(Payload::Earthquakes(r)) => self.earthquakes.settle(Ok(r)),
            Ok(Payload::Top(r)) => self.top.settle(Ok(r)),
            Ok(Payload::Recent(r)) => self.recent.settle(Ok(r)),
            Ok(Payload::Stats(r)) => self.stats.settle(Ok(r)),
            Err(e) => {
                match outcome.query {
                    PolledQuery::Earthquakes => self.earthquakes.settle(Err(e)),
                    PolledQuery::Top => self.top.settle(Err(e)),
                    PolledQuery::Recent => self.recent.settle(Err(e)),
                    PolledQuery::Stats => self.stats.settle(Err(e)),
                }
                return false;
            }
        }
        true
    }

    /// Apply every outcome of a manual refresh and summarize.
    ///
    /// Successful snapshots are never rolled back because a sibling failed.
    pub fn apply_all(&mut self, outcomes: Vec<FetchOutcome>) -> RefreshReport {
        let mut report = RefreshReport::default();
        for outcome in outcomes {
            let query = outcome.query;
            if !self.apply(outcome) {
                report.failed.push(query);
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::stub::StubSource;
    use crate::models::fixtures::quake;

    fn source() -> StubSource {
        StubSource::with(vec![
            quake("13.80", "120.25", 2.4),
            quake("10.50°N", "125.10°E", 5.1),
            quake("9.10", "126.30", 6.3),
        ])
    }

    fn timestamp(snapshot: &QuerySnapshot<Vec<Earthquake>>) -> Option<&str> {
        snapshot.response().map(|r| r.meta.timestamp.as_str())
    }

    #[test]
    fn test_polled_queries_exclude_filter() {
        let queries: Vec<Query> = PolledQuery::ALL.iter().map(|q| q.query()).collect();
        assert_eq!(queries, vec![Query::Earthquakes, Query::Top, Query::Recent, Query::Stats]);
        assert_eq!(PolledQuery::Stats.as_str(), "stats");
    }

    #[test]
    fn test_poll_interval_clamped() {
        assert_eq!(RefreshConfig::with_poll_secs(5).poll_interval, Duration::from_secs(30));
        assert_eq!(RefreshConfig::with_poll_secs(90).poll_interval, Duration::from_secs(90));
        assert_eq!(RefreshConfig::default().poll_interval, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_fetch_query_uses_configured_sizes() {
        let source = source();
        let config = RefreshConfig {
            earthquake_limit: 2,
            top_count: 1,
            ..RefreshConfig::default()
        };

        let mut snapshots = Snapshots::default();
        assert!(snapshots.apply(fetch_query(&source, PolledQuery::Earthquakes, &config).await));
        assert!(snapshots.apply(fetch_query(&source, PolledQuery::Top, &config).await));

        assert_eq!(snapshots.earthquakes.data().map(Vec::len), Some(2));
        let top = snapshots.top.data().expect("top data");
        assert_eq!(top.len(), 1);
        assert!((top[0].magnitude_numeric - 6.3).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_refresh_all_hits_every_query_once() {
        let source = source();
        let outcomes = refresh_all(&source, &RefreshConfig::default()).await;

        assert_eq!(outcomes.len(), 4);
        for query in PolledQuery::ALL {
            assert_eq!(source.calls(query), 1);
        }
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_successful_snapshots() {
        let source = source();
        let config = RefreshConfig::default();
        let mut snapshots = Snapshots::default();
        assert!(snapshots.apply_all(refresh_all(&source, &config).await).is_success());

        source.advance();
        source.fail(Query::Top);
        let report = snapshots.apply_all(refresh_all(&source, &config).await);

        assert!(!report.is_success());
        assert_eq!(report.failed, vec![PolledQuery::Top]);
        assert_eq!(timestamp(&snapshots.earthquakes), Some("gen-1"));
        assert_eq!(timestamp(&snapshots.recent), Some("gen-1"));
        assert_eq!(
            snapshots.stats.response().map(|r| r.meta.timestamp.as_str()),
            Some("gen-1")
        );
        // The failed query keeps its last good data with the error flag set
        assert_eq!(timestamp(&snapshots.top), Some("gen-0"));
        assert!(snapshots.top.error().is_some());
    }
}
