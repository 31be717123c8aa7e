//! The dashboard state container.
//!
//! One `Dashboard` owns every piece of view state: the four snapshots, the
//! filter override, connectivity, the selected earthquake and the map
//! synchronizer. It is the only mutator. After each mutation it re-derives
//! the current earthquake set, reconciles the map and then calls every
//! registered observer synchronously.

use tracing::{debug, info};

use crate::errors::QuakeError;
use crate::filter::{FilterSession, FilterTicket};
use crate::markers::{MapSurface, MapSynchronizer, MarkerId};
use crate::models::{ApiResponse, Earthquake, EarthquakeStats};
use crate::notify::{Notifier, Toast};
use crate::refresh::{FetchOutcome, PolledQuery, RefreshConfig, RefreshReport, Snapshots};

/// The two clickable earthquake lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Top,
    Recent,
}

impl std::str::FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "recent" => Ok(Self::Recent),
            _ => Err(format!("unknown list: {s} (expected: top, recent)")),
        }
    }
}

/// Called after every state change.
pub trait DashboardObserver<S>: Send {
    fn on_change(&mut self, dashboard: &Dashboard<S>);
}

/// Owner of all dashboard state.
pub struct Dashboard<S> {
    config: RefreshConfig,
    snapshots: Snapshots,
    filter: FilterSession,
    map: MapSynchronizer<S>,
    online: bool,
    selected: Option<Earthquake>,
    notifier: Box<dyn Notifier>,
    observers: Vec<Box<dyn DashboardObserver<S>>>,
}

/// The override when present, else the polled all-earthquakes data.
fn current_set<'a>(filter: &'a FilterSession, snapshots: &'a Snapshots) -> &'a [Earthquake] {
    filter
        .active()
        .or_else(|| snapshots.earthquakes.data().map(Vec::as_slice))
        .unwrap_or(&[])
}

fn head(list: Option<&Vec<Earthquake>>, n: usize) -> &[Earthquake] {
    list.map(|l| &l[..l.len().min(n)]).unwrap_or(&[])
}

impl<S: MapSurface> Dashboard<S> {
    /// Create a dashboard that starts online with an empty map.
    pub fn new(config: RefreshConfig, surface: S, notifier: Box<dyn Notifier>) -> Self {
        Self {
            config,
            snapshots: Snapshots::default(),
            filter: FilterSession::new(),
            map: MapSynchronizer::new(surface, true),
            online: true,
            selected: None,
            notifier,
            observers: Vec::new(),
        }
    }

    /// Register an observer and bring it up to date immediately.
    pub fn observe(&mut self, mut observer: Box<dyn DashboardObserver<S>>) {
        observer.on_change(self);
        self.observers.push(observer);
    }

    #[must_use]
    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    #[must_use]
    pub fn snapshots(&self) -> &Snapshots {
        &self.snapshots
    }

    #[must_use]
    pub fn map(&self) -> &MapSynchronizer<S> {
        &self.map
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Earthquake> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn has_filter(&self) -> bool {
        self.filter.active().is_some()
    }

    /// The earthquake set feeding the map.
    #[must_use]
    pub fn current_earthquakes(&self) -> &[Earthquake] {
        current_set(&self.filter, &self.snapshots)
    }

    /// The head of the current set that is drawn as markers.
    #[must_use]
    pub fn map_earthquakes(&self) -> &[Earthquake] {
        let set = self.current_earthquakes();
        &set[..set.len().min(self.config.map_limit)]
    }

    #[must_use]
    pub fn top(&self) -> &[Earthquake] {
        head(self.snapshots.top.data(), self.config.top_count)
    }

    #[must_use]
    pub fn recent(&self) -> &[Earthquake] {
        head(self.snapshots.recent.data(), self.config.recent_count)
    }

    #[must_use]
    pub fn stats(&self) -> Option<&EarthquakeStats> {
        self.snapshots.stats.data()
    }

    /// "Data as of" time of the all-earthquakes snapshot.
    #[must_use]
    pub fn last_update(&self) -> Option<&str> {
        self.snapshots
            .earthquakes
            .response()
            .map(|r| r.meta.timestamp.as_str())
    }

    /// True while the list or stats are loading for the first time.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.snapshots.earthquakes.is_loading() || self.snapshots.stats.is_loading()
    }

    /// A fetch of `query` has been issued.
    pub fn begin(&mut self, query: PolledQuery) {
        self.snapshots.begin(query);
        self.changed();
    }

    /// Apply one periodic poll result.
    pub fn apply_poll(&mut self, outcome: FetchOutcome) {
        let query = outcome.query;
        if !self.snapshots.apply(outcome) && query == PolledQuery::Earthquakes {
            self.notifier.notify(Toast::error("Failed to load earthquake data"));
        }
        self.changed();
    }

    /// Apply the four results of a manual refresh and emit one toast.
    pub fn apply_manual_refresh(&mut self, outcomes: Vec<FetchOutcome>) -> RefreshReport {
        let report = self.snapshots.apply_all(outcomes);
        if report.is_success() {
            self.notifier.notify(Toast::success("Data refreshed successfully"));
        } else {
            let failed: Vec<&str> = report.failed.iter().map(|q| q.as_str()).collect();
            info!("manual refresh partially failed: {}", failed.join(", "));
            self.notifier.notify(Toast::error("Failed to refresh data"));
        }
        self.changed();
        report
    }

    /// A filter request is about to be issued.
    pub fn begin_filter(&mut self) -> FilterTicket {
        self.filter.begin()
    }

    /// Apply the outcome of the filter submission `ticket`.
    ///
    /// Responses superseded by a later submission or a clear are dropped
    /// silently.
    pub fn apply_filter(
        &mut self,
        ticket: FilterTicket,
        result: Result<ApiResponse<Vec<Earthquake>>, QuakeError>,
    ) {
        match self.filter.apply(ticket, result) {
            Some(Ok(found)) => self
                .notifier
                .notify(Toast::success(format!("Found {found} earthquakes"))),
            Some(Err(_)) => self.notifier.notify(Toast::error("Failed to apply filters")),
            None => return,
        }
        self.changed();
    }

    /// Drop the filter override.
    pub fn clear_filter(&mut self) {
        self.filter.clear();
        self.changed();
    }

    /// Handle a connectivity-change notification.
    pub fn set_online(&mut self, online: bool) {
        if self.online == online {
            return;
        }
        self.online = online;
        self.map.set_online(online);
        self.changed();
    }

    /// Emit the "earthquake selected" event.
    pub fn select(&mut self, earthquake: Earthquake) {
        self.notifier.notify(Toast::info(
            format!("M{} - {}", earthquake.magnitude_numeric, earthquake.location),
            format!("{} {}", earthquake.date, earthquake.time),
        ));
        self.selected = Some(earthquake);
        self.changed();
    }

    /// Select the earthquake behind a clicked marker.
    ///
    /// Returns `false` for ids that are no longer on the map.
    pub fn select_marker(&mut self, id: MarkerId) -> bool {
        match self.map.earthquake_for(id).cloned() {
            Some(earthquake) => {
                self.select(earthquake);
                true
            }
            None => {
                debug!("click on stale marker {}", id);
                false
            }
        }
    }

    /// Select the earthquake in row `index` of a list.
    pub fn select_row(&mut self, list: ListKind, index: usize) -> bool {
        let rows = match list {
            ListKind::Top => self.top(),
            ListKind::Recent => self.recent(),
        };
        match rows.get(index).cloned() {
            Some(earthquake) => {
                self.select(earthquake);
                true
            }
            None => false,
        }
    }

    /// Reconcile the map, then notify observers.
    fn changed(&mut self) {
        let set = current_set(&self.filter, &self.snapshots);
        let set = &set[..set.len().min(self.config.map_limit)];
        self.map.sync(set);

        let mut observers = std::mem::take(&mut self.observers);
        for observer in &mut observers {
            observer.on_change(self);
        }
        self.observers = observers;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::client::{EarthquakeSource, Query};
    use crate::client::stub::StubSource;
    use crate::filter::FilterCriteria;
    use crate::markers::MarkerLayer;
    use crate::models::fixtures::quake;
    use crate::notify::ToastLevel;
    use crate::notify::recording::RecordingNotifier;
    use crate::refresh::{fetch_query, refresh_all};

    struct Counting(Arc<Mutex<Vec<usize>>>);

    impl DashboardObserver<MarkerLayer> for Counting {
        fn on_change(&mut self, dashboard: &Dashboard<MarkerLayer>) {
            self.0
                .lock()
                .expect("poisoned")
                .push(dashboard.map().markers().len());
        }
    }

    fn sample() -> Vec<Earthquake> {
        vec![
            quake("13.80", "120.25", 2.4),
            quake("10.50°N", "125.10°E", 5.1),
            quake("9.10", "126.30", 6.3),
            quake("garbage", "garbage", 3.3),
        ]
    }

    fn dashboard() -> (Dashboard<MarkerLayer>, RecordingNotifier) {
        let notifier = RecordingNotifier::default();
        let dashboard = Dashboard::new(
            RefreshConfig::default(),
            MarkerLayer::new(),
            Box::new(notifier.clone()),
        );
        (dashboard, notifier)
    }

    async fn poll_all(dashboard: &mut Dashboard<MarkerLayer>, source: &StubSource) {
        for query in PolledQuery::ALL {
            let outcome = fetch_query(source, query, &RefreshConfig::default()).await;
            dashboard.apply_poll(outcome);
        }
    }

    #[tokio::test]
    async fn test_poll_populates_views_and_map() {
        let source = StubSource::with(sample());
        let (mut dashboard, notifier) = dashboard();
        dashboard.begin(PolledQuery::Earthquakes);
        assert!(dashboard.is_loading());

        poll_all(&mut dashboard, &source).await;

        assert!(!dashboard.is_loading());
        assert_eq!(dashboard.current_earthquakes().len(), 4);
        assert_eq!(dashboard.map().markers().len(), 3);
        assert_eq!(dashboard.top().len(), 4);
        assert_eq!(dashboard.last_update(), Some("gen-0"));
        assert_eq!(dashboard.stats().map(|s| s.total_count), Some(4));
        assert!(notifier.toasts().is_empty());
    }

    #[tokio::test]
    async fn test_filter_override_and_clear() {
        let source = StubSource::with(sample());
        let (mut dashboard, notifier) = dashboard();
        poll_all(&mut dashboard, &source).await;

        let criteria = FilterCriteria {
            min_magnitude: Some(5.0),
            ..Default::default()
        };
        let ticket = dashboard.begin_filter();
        dashboard.apply_filter(ticket, source.filter(&criteria).await);

        assert!(dashboard.has_filter());
        assert!(
            dashboard
                .current_earthquakes()
                .iter()
                .all(|e| e.magnitude_numeric >= 5.0)
        );
        assert_eq!(dashboard.map().markers().len(), 2);
        assert_eq!(notifier.toasts()[0].message, "Found 2 earthquakes");

        // Polling underneath does not disturb the override
        source.advance();
        poll_all(&mut dashboard, &source).await;
        assert_eq!(dashboard.current_earthquakes().len(), 2);

        dashboard.clear_filter();
        assert!(!dashboard.has_filter());
        assert_eq!(
            dashboard.current_earthquakes(),
            dashboard.snapshots().earthquakes.data().map(Vec::as_slice).unwrap_or(&[])
        );
        assert_eq!(dashboard.map().markers().len(), 3);
    }

    #[tokio::test]
    async fn test_filter_response_after_clear_is_ignored() {
        let source = StubSource::with(sample());
        let (mut dashboard, notifier) = dashboard();
        poll_all(&mut dashboard, &source).await;

        let ticket = dashboard.begin_filter();
        let pending = source
            .filter(&FilterCriteria {
                min_magnitude: Some(5.0),
                ..Default::default()
            })
            .await;
        dashboard.clear_filter();
        dashboard.apply_filter(ticket, pending);

        assert!(!dashboard.has_filter());
        assert_eq!(dashboard.current_earthquakes().len(), 4);
        assert!(notifier.toasts().is_empty());
    }

    #[tokio::test]
    async fn test_failed_filter_keeps_view() {
        let source = StubSource::with(sample());
        let (mut dashboard, notifier) = dashboard();
        poll_all(&mut dashboard, &source).await;

        source.fail(Query::Filter);
        let ticket = dashboard.begin_filter();
        dashboard.apply_filter(ticket, source.filter(&FilterCriteria::default()).await);

        assert!(!dashboard.has_filter());
        assert_eq!(dashboard.current_earthquakes().len(), 4);
        assert_eq!(notifier.toasts()[0].message, "Failed to apply filters");
    }

    #[tokio::test]
    async fn test_manual_refresh_single_failure_single_toast() {
        let source = StubSource::with(sample());
        let (mut dashboard, notifier) = dashboard();
        poll_all(&mut dashboard, &source).await;

        source.advance();
        source.fail(Query::Earthquakes);
        let outcomes = refresh_all(&source, dashboard.config()).await;
        let report = dashboard.apply_manual_refresh(outcomes);

        assert_eq!(report.failed, vec![PolledQuery::Earthquakes]);
        let toasts = notifier.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0], Toast::error("Failed to refresh data"));

        let ts = |s: &crate::snapshot::QuerySnapshot<Vec<Earthquake>>| {
            s.response().map(|r| r.meta.timestamp.clone())
        };
        assert_eq!(ts(&dashboard.snapshots().top).as_deref(), Some("gen-1"));
        assert_eq!(ts(&dashboard.snapshots().recent).as_deref(), Some("gen-1"));
        assert_eq!(
            dashboard.snapshots().stats.response().map(|r| r.meta.timestamp.as_str()),
            Some("gen-1")
        );
        // Stale but present
        assert_eq!(dashboard.last_update(), Some("gen-0"));
        assert_eq!(dashboard.map().markers().len(), 3);
    }

    #[tokio::test]
    async fn test_manual_refresh_success_toast() {
        let source = StubSource::with(sample());
        let (mut dashboard, notifier) = dashboard();

        let outcomes = refresh_all(&source, dashboard.config()).await;
        let report = dashboard.apply_manual_refresh(outcomes);

        assert!(report.is_success());
        assert_eq!(notifier.toasts(), vec![Toast::success("Data refreshed successfully")]);
    }

    #[tokio::test]
    async fn test_failed_earthquake_poll_toasts() {
        let source = StubSource::with(sample());
        let (mut dashboard, notifier) = dashboard();
        source.fail(Query::Earthquakes);
        source.fail(Query::Stats);

        poll_all(&mut dashboard, &source).await;

        assert_eq!(notifier.count(ToastLevel::Error), 1);
        assert_eq!(notifier.toasts()[0].message, "Failed to load earthquake data");
        assert!(dashboard.current_earthquakes().is_empty());
    }

    #[tokio::test]
    async fn test_connectivity_round_trip() {
        let source = StubSource::with(sample());
        let (mut dashboard, _) = dashboard();
        poll_all(&mut dashboard, &source).await;
        let before: Vec<(f64, f64)> = dashboard.map().markers().iter().map(|(_, m)| (m.lat, m.lng)).collect();

        dashboard.set_online(false);
        assert!(dashboard.map().markers().is_empty());
        assert!(dashboard.map().surface().viewport().is_none());

        dashboard.set_online(true);
        let after: Vec<(f64, f64)> = dashboard.map().markers().iter().map(|(_, m)| (m.lat, m.lng)).collect();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_map_capped_at_limit() {
        let many: Vec<Earthquake> = (0..40_i32)
            .map(|i| quake(&format!("{}.5", 5 + i % 10), "121.0", 3.0))
            .collect();
        let source = StubSource::with(many);
        let (mut dashboard, _) = dashboard();
        poll_all(&mut dashboard, &source).await;

        assert_eq!(dashboard.current_earthquakes().len(), 40);
        assert_eq!(dashboard.map_earthquakes().len(), 30);
        assert_eq!(dashboard.map().markers().len(), 30);
    }

    #[tokio::test]
    async fn test_marker_and_row_selection() {
        let source = StubSource::with(sample());
        let (mut dashboard, notifier) = dashboard();
        poll_all(&mut dashboard, &source).await;

        let (id, marker) = dashboard.map().markers()[1].clone();
        assert!(dashboard.select_marker(id));
        assert_eq!(dashboard.selected(), Some(&marker.earthquake));
        let toast = &notifier.toasts()[0];
        assert_eq!(toast.level, ToastLevel::Info);
        assert_eq!(toast.message, format!("M5.1 - {}", marker.earthquake.location));
        assert_eq!(toast.description.as_deref(), Some("2025-01-15 08:30:00"));

        assert!(dashboard.select_row(ListKind::Top, 0));
        assert!((dashboard.selected().map_or(0.0, |e| e.magnitude_numeric) - 6.3).abs() < f64::EPSILON);
        assert!(!dashboard.select_row(ListKind::Recent, 99));
        assert!(!dashboard.select_marker(9_999));
        assert_eq!(notifier.toasts().len(), 2);
    }

    #[tokio::test]
    async fn test_observers_run_after_each_change() {
        let source = StubSource::with(sample());
        let (mut dashboard, _) = dashboard();
        let seen = Arc::new(Mutex::new(Vec::new()));
        dashboard.observe(Box::new(Counting(seen.clone())));

        let outcome = fetch_query(&source, PolledQuery::Earthquakes, dashboard.config()).await;
        dashboard.apply_poll(outcome);
        dashboard.clear_filter();

        // Registration, poll, clear; the map was already reconciled each time
        assert_eq!(*seen.lock().expect("poisoned"), vec![0, 3, 3]);
    }

    #[test]
    fn test_list_kind_parse() {
        assert_eq!("top".parse::<ListKind>(), Ok(ListKind::Top));
        assert_eq!("Recent".parse::<ListKind>(), Ok(ListKind::Recent));
        assert!("other".parse::<ListKind>().is_err());
    }

    #[test]
    fn test_empty_dashboard_derives_nothing() {
        let (dashboard, _) = dashboard();
        assert!(dashboard.current_earthquakes().is_empty());
        assert!(dashboard.top().is_empty());
        assert!(dashboard.stats().is_none());
        assert!(dashboard.last_update().is_none());
    }
}
