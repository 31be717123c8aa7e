//! The coordinating task that drives a [`Dashboard`].
//!
//! Four interval timers (one per polled query) and a command channel feed
//! a single loop. Requests run as spawned tasks and report back over an
//! internal channel, so a slow fetch never blocks a click or a tick. The
//! loop is the only code that touches the dashboard.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::client::EarthquakeSource;
use crate::dashboard::{Dashboard, ListKind};
use crate::errors::QuakeError;
use crate::filter::{FilterCriteria, FilterTicket};
use crate::markers::{MapSurface, MarkerId};
use crate::models::{ApiResponse, Earthquake};
use crate::refresh::{FetchOutcome, PolledQuery, RefreshConfig, fetch_query, refresh_all};

/// User actions forwarded to the coordinating task.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Manual refresh of all four queries
    Refresh,
    /// Submit filter criteria
    Filter(FilterCriteria),
    /// Remove the filter override
    ClearFilter,
    /// Connectivity-change notification
    Connectivity(bool),
    /// A marker was clicked
    SelectMarker(MarkerId),
    /// A list row was clicked
    SelectRow(ListKind, usize),
    /// Stop polling and return the dashboard
    Shutdown,
}

/// Results of spawned requests.
enum Event {
    Polled(FetchOutcome),
    Refreshed(Vec<FetchOutcome>),
    Filtered(FilterTicket, Result<ApiResponse<Vec<Earthquake>>, QuakeError>),
}

fn poll_timer(config: &RefreshConfig) -> Interval {
    let mut timer = interval(config.poll_interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

/// Run the dashboard until `Shutdown` arrives or every command sender is
/// dropped. Returns the dashboard so callers can inspect its final state.
///
/// Timers live inside this future, so polling stops when it returns.
/// Requests still in flight complete but their results are discarded.
pub async fn run<S>(
    mut dashboard: Dashboard<S>,
    source: Arc<dyn EarthquakeSource>,
    mut commands: mpsc::Receiver<Command>,
) -> Dashboard<S>
where
    S: MapSurface + Send + 'static,
{
    let config = dashboard.config().clone();
    let (tx, mut events) = mpsc::unbounded_channel::<Event>();

    let mut earthquakes_timer = poll_timer(&config);
    let mut top_timer = poll_timer(&config);
    let mut recent_timer = poll_timer(&config);
    let mut stats_timer = poll_timer(&config);

    info!(
        "dashboard running (poll every {}s)",
        config.poll_interval.as_secs()
    );

    let poll = |dashboard: &mut Dashboard<S>, query: PolledQuery| {
        dashboard.begin(query);
        let source = Arc::clone(&source);
        let config = config.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let outcome = fetch_query(source.as_ref(), query, &config).await;
            let _ = tx.send(Event::Polled(outcome));
        });
    };

    loop {
        tokio::select! {
            _ = earthquakes_timer.tick() => poll(&mut dashboard, PolledQuery::Earthquakes),
            _ = top_timer.tick() => poll(&mut dashboard, PolledQuery::Top),
            _ = recent_timer.tick() => poll(&mut dashboard, PolledQuery::Recent),
            _ = stats_timer.tick() => poll(&mut dashboard, PolledQuery::Stats),

            Some(event) = events.recv() => match event {
                Event::Polled(outcome) => dashboard.apply_poll(outcome),
                Event::Refreshed(outcomes) => {
                    dashboard.apply_manual_refresh(outcomes);
                }
                Event::Filtered(ticket, result) => dashboard.apply_filter(ticket, result),
            },

            command = commands.recv() => {
                let Some(command) = command else { break };
                debug!("command: {:?}", command);
                match command {
                    Command::Refresh => {
                        for query in PolledQuery::ALL {
                            dashboard.begin(query);
                        }
                        let source = Arc::clone(&source);
                        let config = config.clone();
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            let outcomes = refresh_all(source.as_ref(), &config).await;
                            let _ = tx.send(Event::Refreshed(outcomes));
                        });
                    }
                    Command::Filter(criteria) => {
                        if criteria.is_empty() {
                            debug!("filter submitted without criteria");
                        }
                        let ticket = dashboard.begin_filter();
                        let source = Arc::clone(&source);
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            let result = source.filter(&criteria).await;
                            let _ = tx.send(Event::Filtered(ticket, result));
                        });
                    }
                    Command::ClearFilter => dashboard.clear_filter(),
                    Command::Connectivity(online) => dashboard.set_online(online),
                    Command::SelectMarker(id) => {
                        dashboard.select_marker(id);
                    }
                    Command::SelectRow(list, index) => {
                        dashboard.select_row(list, index);
                    }
                    Command::Shutdown => break,
                }
            }
        }
    }

    info!("dashboard stopped");
    dashboard
}
