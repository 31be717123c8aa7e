//! Web server for the QuakePH dashboard.
//!
//! Provides the live dashboard using:
//! - Axum for HTTP server
//! - SSE (Server-Sent Events) for frames and toasts
//! - HTMX for the action buttons and list rows
//! - Leaflet for the map, mirrored from the in-memory marker layer
//!
//! There is one dashboard per server. Every tab sees the same frame, so
//! connectivity and selection are shared: an `offline` report from any tab
//! tears the map down in all of them until some tab reports `online`.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{
        Html, IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};

use crate::client::{DEFAULT_BASE_URL, EarthquakeSource, PhivolcsClient};
use crate::dashboard::{Dashboard, DashboardObserver, ListKind};
use crate::filter::{FilterCriteria, SLIDER_MAX, SLIDER_MIN};
use crate::markers::{MarkerId, MarkerLayer};
use crate::notify::{BroadcastNotifier, Toast};
use crate::refresh::RefreshConfig;
use crate::runtime::{self, Command};
use crate::views::{self, MapPayload};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub api_url: String,
    pub refresh: RefreshConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            api_url: DEFAULT_BASE_URL.to_string(),
            refresh: RefreshConfig::default(),
        }
    }
}

/// One rendered dashboard, pushed to every browser.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardFrame {
    pub header: String,
    pub stats: String,
    pub legend: String,
    pub top: String,
    pub recent: String,
    pub selected: String,
    pub online: bool,
    pub map: MapPayload,
}

/// Render every view of the dashboard.
#[must_use]
pub fn render_frame(dashboard: &Dashboard<MarkerLayer>) -> DashboardFrame {
    DashboardFrame {
        header: views::header_html(
            dashboard.last_update(),
            dashboard.is_loading(),
            dashboard.has_filter(),
            dashboard.snapshots().earthquakes.error(),
        ),
        stats: views::stats_html(dashboard.stats()),
        legend: views::legend_html(dashboard.map_earthquakes().len()),
        top: views::list_html("Top by Magnitude", ListKind::Top, dashboard.top()),
        recent: views::list_html("Recent Earthquakes", ListKind::Recent, dashboard.recent()),
        selected: views::selected_html(dashboard.selected()),
        online: dashboard.is_online(),
        map: views::map_payload(dashboard.map()),
    }
}

/// Publishes a fresh frame after every dashboard change.
pub struct WebPublisher {
    tx: watch::Sender<Arc<DashboardFrame>>,
}

impl WebPublisher {
    #[must_use]
    pub fn new(tx: watch::Sender<Arc<DashboardFrame>>) -> Self {
        Self { tx }
    }
}

impl DashboardObserver<MarkerLayer> for WebPublisher {
    fn on_change(&mut self, dashboard: &Dashboard<MarkerLayer>) {
        self.tx.send_replace(Arc::new(render_frame(dashboard)));
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Channel into the coordinating task
    commands: mpsc::Sender<Command>,
    /// Latest rendered frame
    frames: watch::Receiver<Arc<DashboardFrame>>,
    /// Toast fan-out for SSE clients
    toasts: broadcast::Sender<Toast>,
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/stream", get(sse_handler))
        .route("/state", get(state_handler))
        .route("/refresh", post(refresh_handler))
        .route("/filter", post(filter_handler))
        .route("/filter/clear", post(clear_filter_handler))
        .route("/connectivity", post(connectivity_handler))
        .route("/select/marker/{id}", post(select_marker_handler))
        .route("/select/{list}/{index}", post(select_row_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Start the web server.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let client = PhivolcsClient::with_base_url(&config.api_url)?;
    let api_url = client.base_url().to_string();
    let source: Arc<dyn EarthquakeSource> = Arc::new(client);

    let (toast_tx, _toast_rx) = broadcast::channel::<Toast>(64);
    let (command_tx, command_rx) = mpsc::channel::<Command>(64);

    let mut dashboard = Dashboard::new(
        config.refresh.clone(),
        MarkerLayer::new(),
        Box::new(BroadcastNotifier::new(toast_tx.clone())),
    );
    let (frame_tx, frame_rx) = watch::channel(Arc::new(render_frame(&dashboard)));
    dashboard.observe(Box::new(WebPublisher::new(frame_tx)));

    let dashboard_task = tokio::spawn(runtime::run(dashboard, source, command_rx));

    let state = AppState {
        commands: command_tx.clone(),
        frames: frame_rx,
        toasts: toast_tx,
    };
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("QuakePH dashboard starting at http://{} (API {})", addr, api_url);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // SSE streams never end, so there is no graceful drain
    tokio::select! {
        result = axum::serve(listener, app) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }

    let _ = command_tx.send(Command::Shutdown).await;
    let _ = dashboard_task.await;
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Main page handler - serves the HTML UI.
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

fn frame_event(frame: &DashboardFrame) -> Event {
    let data = serde_json::to_string(frame).unwrap_or_else(|_| "{}".to_string());
    Event::default().event("dashboard").data(data)
}

fn toast_event(toast: &Toast) -> Event {
    let data = serde_json::to_string(toast).unwrap_or_else(|_| "{}".to_string());
    Event::default().event("toast").data(data)
}

/// SSE stream: the current frame immediately, then every change, plus toasts.
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let frames = WatchStream::new(state.frames.clone())
        .map(|frame| Ok::<_, Infallible>(frame_event(&frame)));
    let toasts = BroadcastStream::new(state.toasts.subscribe()).filter_map(|result| match result {
        Ok(toast) => Some(Ok::<_, Infallible>(toast_event(&toast))),
        // Lagged receivers skip missed toasts
        Err(_) => None,
    });

    Sse::new(frames.merge(toasts)).keep_alive(KeepAlive::default())
}

/// Current frame as JSON.
async fn state_handler(State(state): State<AppState>) -> Json<DashboardFrame> {
    Json(DashboardFrame::clone(&state.frames.borrow()))
}

async fn dispatch(state: &AppState, command: Command) -> StatusCode {
    match state.commands.send(command).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(_) => {
            tracing::warn!("dashboard task is gone; dropping command");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn refresh_handler(State(state): State<AppState>) -> StatusCode {
    tracing::info!("manual refresh via UI");
    dispatch(&state, Command::Refresh).await
}

/// Filter panel submission.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct FilterForm {
    min_magnitude: f64,
    max_magnitude: f64,
    location: String,
}

impl Default for FilterForm {
    fn default() -> Self {
        Self {
            min_magnitude: SLIDER_MIN,
            max_magnitude: SLIDER_MAX,
            location: String::new(),
        }
    }
}

async fn filter_handler(State(state): State<AppState>, Form(form): Form<FilterForm>) -> StatusCode {
    let criteria = FilterCriteria::from_panel(form.min_magnitude, form.max_magnitude, &form.location);
    tracing::info!("filter via UI: {:?}", criteria);
    dispatch(&state, Command::Filter(criteria)).await
}

async fn clear_filter_handler(State(state): State<AppState>) -> StatusCode {
    tracing::info!("filter cleared via UI");
    dispatch(&state, Command::ClearFilter).await
}

#[derive(Debug, Deserialize)]
struct ConnectivityForm {
    online: bool,
}

async fn connectivity_handler(
    State(state): State<AppState>,
    Form(form): Form<ConnectivityForm>,
) -> StatusCode {
    dispatch(&state, Command::Connectivity(form.online)).await
}

async fn select_marker_handler(
    State(state): State<AppState>,
    Path(id): Path<MarkerId>,
) -> StatusCode {
    dispatch(&state, Command::SelectMarker(id)).await
}

async fn select_row_handler(
    State(state): State<AppState>,
    Path((list, index)): Path<(String, usize)>,
) -> impl IntoResponse {
    match list.parse::<ListKind>() {
        Ok(kind) => dispatch(&state, Command::SelectRow(kind, index)).await.into_response(),
        Err(e) => (StatusCode::NOT_FOUND, e).into_response(),
    }
}

/// Health check endpoint.
async fn health_handler() -> &'static str {
    "OK"
}

// ============================================================================
// HTML Template (embedded for single-binary deployment)
// ============================================================================

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en" data-theme="dark">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>QuakePH | PHIVOLCS Earthquake Monitor</title>

    <link rel="preconnect" href="https://fonts.googleapis.com">
    <link rel="preconnect" href="https://fonts.gstatic.com" crossorigin>
    <link href="https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700&display=swap" rel="stylesheet">

    <script src="https://unpkg.com/htmx.org@1.9.10"></script>

    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>

    <style>
        :root {
            --font: 'Inter', -apple-system, BlinkMacSystemFont, sans-serif;

            --bg-primary: #09090b;
            --bg-secondary: #0f0f12;
            --bg-tertiary: #18181b;
            --bg-elevated: #1c1c1f;
            --bg-hover: #27272a;

            --text-primary: #fafafa;
            --text-secondary: #a1a1aa;
            --text-tertiary: #52525b;

            --border: #27272a;
            --border-hover: #3f3f46;

            --accent: #818cf8;
            --accent-hover: #6366f1;
            --accent-soft: rgba(129, 140, 248, 0.1);

            --success: #10b981;
            --danger: #ef4444;

            --magnitude-low: 142 71% 45%;
            --magnitude-medium: 38 92% 50%;
            --magnitude-high: 0 84% 60%;

            --radius-sm: 6px;
            --radius-md: 10px;
            --radius-lg: 16px;
            --radius-full: 9999px;
        }

        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: var(--font);
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
            min-height: 100vh;
            -webkit-font-smoothing: antialiased;
        }

        /* ===== HEADER ===== */
        .header {
            position: sticky;
            top: 0;
            z-index: 1000;
            backdrop-filter: blur(12px);
            background: rgba(9, 9, 11, 0.8);
            border-bottom: 1px solid var(--border);
        }

        .header-inner {
            max-width: 1400px;
            margin: 0 auto;
            padding: 0.875rem 1.5rem;
            display: flex;
            justify-content: space-between;
            align-items: center;
        }

        .logo { display: flex; flex-direction: column; line-height: 1.2; }
        .logo-title { font-weight: 700; font-size: 1.125rem; letter-spacing: -0.02em; }
        .logo-subtitle { font-size: 0.75rem; color: var(--text-secondary); }

        .header-meta { display: flex; align-items: center; gap: 0.75rem; }
        .refresh-icon { display: inline-block; }
        .refresh-icon.spin { animation: spin 1s linear infinite; }
        @keyframes spin { to { transform: rotate(360deg); } }
        .last-update { font-size: 0.8125rem; color: var(--text-secondary); }

        .status-pill {
            padding: 0.25rem 0.75rem;
            border-radius: var(--radius-full);
            font-size: 0.75rem;
            font-weight: 500;
            background: var(--bg-tertiary);
            border: 1px solid var(--border);
        }
        .status-filtered { color: var(--accent); border-color: var(--accent); }
        .status-stale { color: var(--danger); border-color: var(--danger); }

        .btn {
            display: inline-flex;
            align-items: center;
            gap: 0.375rem;
            padding: 0.5rem 1rem;
            border-radius: var(--radius-md);
            font-size: 0.8125rem;
            font-weight: 500;
            border: none;
            cursor: pointer;
            font-family: var(--font);
        }
        .btn:disabled { opacity: 0.5; cursor: wait; }
        .btn-primary { background: var(--accent); color: white; }
        .btn-primary:hover:not(:disabled) { background: var(--accent-hover); }
        .btn-ghost { background: transparent; color: var(--text-secondary); border: 1px solid var(--border); }
        .btn-ghost:hover { background: var(--bg-hover); color: var(--text-primary); }

        /* ===== LAYOUT ===== */
        .main { max-width: 1400px; margin: 0 auto; padding: 1.5rem; display: grid; gap: 1.5rem; }
        .stats-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); gap: 1rem; }
        .content-grid { display: grid; grid-template-columns: 2fr 1fr; gap: 1.5rem; }
        @media (max-width: 960px) { .content-grid { grid-template-columns: 1fr; } }
        .side { display: grid; gap: 1.5rem; align-content: start; }

        /* ===== STAT CARDS ===== */
        .stat-card {
            background: var(--bg-elevated);
            border: 1px solid var(--border);
            border-radius: var(--radius-lg);
            padding: 1rem 1.25rem;
        }
        .stat-title { font-size: 0.8125rem; color: var(--text-secondary); }
        .stat-value { font-size: 1.5rem; font-weight: 700; }
        .stat-subtitle { font-size: 0.75rem; color: var(--text-tertiary); }
        .card-primary .stat-value { color: var(--accent); }
        .card-destructive .stat-value { color: hsl(var(--magnitude-high)); }

        /* ===== FILTER PANEL ===== */
        .filter-panel {
            background: var(--bg-elevated);
            border: 1px solid var(--border);
            border-radius: var(--radius-lg);
            padding: 1rem 1.25rem;
            display: flex;
            flex-wrap: wrap;
            align-items: flex-end;
            gap: 1rem;
        }
        .filter-field { display: flex; flex-direction: column; gap: 0.25rem; font-size: 0.8125rem; color: var(--text-secondary); }
        .filter-field input[type="text"] {
            background: var(--bg-tertiary);
            border: 1px solid var(--border);
            border-radius: var(--radius-sm);
            color: var(--text-primary);
            padding: 0.375rem 0.625rem;
            font-family: var(--font);
        }

        /* ===== MAP ===== */
        .map-panel {
            position: relative;
            height: 560px;
            border-radius: var(--radius-lg);
            overflow: hidden;
            border: 1px solid var(--border);
            background: var(--bg-secondary);
        }
        #map { position: absolute; inset: 0; }
        .map-offline {
            position: absolute;
            inset: 0;
            display: none;
            align-items: center;
            justify-content: center;
            text-align: center;
            padding: 2rem;
            color: var(--text-secondary);
        }
        .map-panel.offline .map-offline { display: flex; }
        .map-panel.offline #map, .map-panel.offline .legend { display: none; }

        .legend {
            position: absolute;
            right: 1rem;
            bottom: 1rem;
            z-index: 500;
            background: rgba(9, 9, 11, 0.85);
            border: 1px solid var(--border);
            border-radius: var(--radius-md);
            padding: 0.75rem 1rem;
            font-size: 0.75rem;
        }
        .legend-title { font-weight: 600; margin-bottom: 0.25rem; }
        .legend-row { display: flex; align-items: center; gap: 0.5rem; }
        .legend-dot { width: 10px; height: 10px; border-radius: 50%; display: inline-block; }
        .legend-count { margin-top: 0.25rem; color: var(--text-secondary); }
        .magnitude-low { background: hsl(var(--magnitude-low)); }
        .magnitude-medium { background: hsl(var(--magnitude-medium)); }
        .magnitude-high { background: hsl(var(--magnitude-high)); }

        .earthquake-marker-container { background: none; border: none; }
        .eq-marker { position: relative; width: var(--marker-size); height: var(--marker-size); }
        .eq-pulse {
            position: absolute;
            inset: 0;
            border-radius: 50%;
            background: var(--marker-color);
            opacity: 0.4;
            animation: pulse 2s infinite;
            animation-delay: var(--pulse-delay);
        }
        .eq-dot {
            position: absolute;
            inset: 20%;
            border-radius: 50%;
            background: var(--marker-color);
            border: 2px solid rgba(255, 255, 255, 0.8);
            display: flex;
            align-items: center;
            justify-content: center;
        }
        .eq-mag { font-size: 0.625rem; font-weight: 700; color: white; }
        @keyframes pulse {
            0% { transform: scale(0.8); opacity: 0.5; }
            100% { transform: scale(1.6); opacity: 0; }
        }

        .eq-popup-head { display: flex; gap: 0.5rem; align-items: center; }
        .eq-popup-mag { color: white; padding: 0 0.375rem; border-radius: var(--radius-sm); font-weight: 700; }
        .eq-popup-location { font-weight: 600; margin: 0.25rem 0 0; }
        .eq-popup-time { color: #52525b; margin: 0; }

        /* ===== LISTS ===== */
        .list-panel {
            background: var(--bg-elevated);
            border: 1px solid var(--border);
            border-radius: var(--radius-lg);
            overflow: hidden;
        }
        .list-title { font-weight: 600; padding: 0.75rem 1rem; border-bottom: 1px solid var(--border); }
        .quake-row { padding: 0.75rem 1rem; border-bottom: 1px solid var(--border); cursor: pointer; }
        .quake-row:hover { background: var(--bg-hover); }
        .quake-row-head { display: flex; justify-content: space-between; align-items: center; }
        .quake-depth, .quake-row-meta { font-size: 0.75rem; color: var(--text-secondary); }
        .quake-row-meta { display: flex; gap: 1rem; }
        .quake-location { font-size: 0.875rem; }
        .badge { padding: 0.125rem 0.5rem; border-radius: var(--radius-full); font-size: 0.75rem; font-weight: 600; }
        .badge-destructive { background: hsl(var(--magnitude-high)); color: white; }
        .badge-default { background: var(--accent); color: white; }
        .badge-secondary { background: var(--bg-tertiary); color: var(--text-secondary); }
        .empty-state { padding: 2rem 1rem; text-align: center; color: var(--text-tertiary); }
        .selected-card { padding: 0.75rem 1rem; }
        .selected-empty { padding: 0.75rem 1rem; font-size: 0.8125rem; color: var(--text-tertiary); }

        /* ===== TOASTS ===== */
        #toasts { position: fixed; right: 1rem; bottom: 1rem; z-index: 2000; display: grid; gap: 0.5rem; }
        .toast {
            min-width: 260px;
            background: var(--bg-elevated);
            border: 1px solid var(--border);
            border-left: 4px solid var(--accent);
            border-radius: var(--radius-md);
            padding: 0.625rem 0.875rem;
            font-size: 0.8125rem;
        }
        .toast-success { border-left-color: var(--success); }
        .toast-error { border-left-color: var(--danger); }
        .toast-description { color: var(--text-secondary); font-size: 0.75rem; }
    </style>
</head>
<body>
    <header class="header">
        <div class="header-inner">
            <div class="logo">
                <span class="logo-title">QuakePH</span>
                <span class="logo-subtitle">PHIVOLCS Monitor</span>
            </div>
            <div id="header"></div>
        </div>
    </header>

    <main class="main">
        <section class="stats-grid" id="stats"></section>

        <form class="filter-panel" id="filter-form" hx-post="/filter" hx-swap="none">
            <label class="filter-field">
                Min magnitude <span id="min-label">0.0</span>
                <input type="range" name="min_magnitude" min="0" max="10" step="0.5" value="0"
                       oninput="document.getElementById('min-label').textContent = Number(this.value).toFixed(1)">
            </label>
            <label class="filter-field">
                Max magnitude <span id="max-label">10.0</span>
                <input type="range" name="max_magnitude" min="0" max="10" step="0.5" value="10"
                       oninput="document.getElementById('max-label').textContent = Number(this.value).toFixed(1)">
            </label>
            <label class="filter-field">
                Location
                <input type="text" name="location" placeholder="e.g. Batangas">
            </label>
            <button type="submit" class="btn btn-primary">Apply Filters</button>
            <button type="button" class="btn btn-ghost" id="filter-clear"
                    hx-post="/filter/clear" hx-swap="none">Clear</button>
        </form>

        <section class="content-grid">
            <div class="map-panel" id="map-panel">
                <div id="map"></div>
                <div class="legend" id="legend"></div>
                <div class="map-offline">
                    <p>Map is unavailable. Please check your internet connection.</p>
                </div>
            </div>
            <div class="side">
                <div class="list-panel">
                    <div class="list-title">Selected</div>
                    <div id="selected"></div>
                </div>
                <div id="top"></div>
                <div id="recent"></div>
            </div>
        </section>
    </main>

    <div id="toasts"></div>

    <script>
        let map = null;
        let markerLayer = null;
        let generation = null;

        function swap(id, html) {
            const el = document.getElementById(id);
            el.innerHTML = html;
            htmx.process(el);
        }

        function tearDownMap() {
            if (map) {
                map.remove();
                map = null;
                markerLayer = null;
            }
            generation = null;
        }

        function applyMap(payload) {
            const panel = document.getElementById('map-panel');
            if (payload.state === 'offline' || !payload.viewport) {
                panel.classList.add('offline');
                tearDownMap();
                return;
            }
            panel.classList.remove('offline');

            if (!map || generation !== payload.generation) {
                tearDownMap();
                map = L.map('map', { zoomControl: true })
                    .setView([payload.viewport.lat, payload.viewport.lng], payload.viewport.zoom);
                L.tileLayer(payload.tile_url, {
                    attribution: payload.attribution,
                    subdomains: 'abcd',
                    maxZoom: 19
                }).addTo(map);
                markerLayer = L.layerGroup().addTo(map);
                generation = payload.generation;
            }

            markerLayer.clearLayers();
            payload.markers.forEach(m => {
                const icon = L.divIcon({
                    className: 'earthquake-marker-container',
                    html: `<div class="eq-marker" style="--marker-color: ${m.color}; --marker-size: ${m.size}px; --pulse-delay: ${m.delay}s">
                             <div class="eq-pulse"></div>
                             <div class="eq-dot"><span class="eq-mag">${m.label}</span></div>
                           </div>`,
                    iconSize: [m.size, m.size],
                    iconAnchor: [m.size / 2, m.size / 2]
                });
                L.marker([m.lat, m.lng], { icon })
                    .bindPopup(m.popup)
                    .on('click', () => fetch('/select/marker/' + m.id, { method: 'POST' }))
                    .addTo(markerLayer);
            });
        }

        function showToast(toast) {
            const el = document.createElement('div');
            el.className = 'toast toast-' + toast.level;
            el.textContent = toast.message;
            if (toast.description) {
                const desc = document.createElement('div');
                desc.className = 'toast-description';
                desc.textContent = toast.description;
                el.appendChild(desc);
            }
            document.getElementById('toasts').appendChild(el);
            setTimeout(() => el.remove(), 4000);
        }

        function reportConnectivity(online) {
            fetch('/connectivity', {
                method: 'POST',
                headers: { 'Content-Type': 'application/x-www-form-urlencoded' },
                body: 'online=' + online
            }).catch(() => {});
        }

        const source = new EventSource('/stream');
        source.addEventListener('dashboard', e => {
            const frame = JSON.parse(e.data);
            swap('header', frame.header);
            swap('stats', frame.stats);
            swap('top', frame.top);
            swap('recent', frame.recent);
            swap('selected', frame.selected);
            document.getElementById('legend').innerHTML = frame.legend;
            applyMap(frame.map);
        });
        source.addEventListener('toast', e => showToast(JSON.parse(e.data)));

        document.getElementById('filter-clear').addEventListener('click', () => {
            const form = document.getElementById('filter-form');
            form.reset();
            document.getElementById('min-label').textContent = '0.0';
            document.getElementById('max-label').textContent = '10.0';
        });

        window.addEventListener('online', () => reportConnectivity(true));
        window.addEventListener('offline', () => reportConnectivity(false));
        reportConnectivity(navigator.onLine);
    </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{list, quake, stats};
    use crate::notify::recording::RecordingNotifier;
    use crate::client::Query;
    use crate::errors::QuakeError;
    use crate::refresh::{FetchOutcome, Payload, PolledQuery};

    fn app_state() -> (AppState, mpsc::Receiver<Command>, watch::Sender<Arc<DashboardFrame>>) {
        let dashboard = Dashboard::new(
            RefreshConfig::default(),
            MarkerLayer::new(),
            Box::new(RecordingNotifier::default()),
        );
        let (frame_tx, frame_rx) = watch::channel(Arc::new(render_frame(&dashboard)));
        let (commands, rx) = mpsc::channel(8);
        let (toasts, _) = broadcast::channel(8);
        let state = AppState {
            commands,
            frames: frame_rx,
            toasts,
        };
        (state, rx, frame_tx)
    }

    #[test]
    fn test_empty_frame() {
        let dashboard = Dashboard::new(
            RefreshConfig::default(),
            MarkerLayer::new(),
            Box::new(RecordingNotifier::default()),
        );
        let frame = render_frame(&dashboard);

        assert!(frame.online);
        assert!(frame.legend.contains("0 events"));
        assert!(frame.top.contains("No earthquakes found"));
        assert!(frame.map.markers.is_empty());
    }

    #[test]
    fn test_publisher_sends_frame_on_change() {
        let mut dashboard = Dashboard::new(
            RefreshConfig::default(),
            MarkerLayer::new(),
            Box::new(RecordingNotifier::default()),
        );
        let (tx, rx) = watch::channel(Arc::new(render_frame(&dashboard)));
        dashboard.observe(Box::new(WebPublisher::new(tx)));

        dashboard.apply_poll(FetchOutcome {
            query: PolledQuery::Earthquakes,
            result: Ok(Payload::Earthquakes(list(
                "2025-01-15T08:45:12.000Z",
                vec![quake("13.80", "120.25", 2.4), quake("9.10", "126.30", 6.3)],
            ))),
        });
        dashboard.apply_poll(FetchOutcome {
            query: PolledQuery::Stats,
            result: Ok(Payload::Stats(stats("2025-01-15T08:45:12.000Z", 2))),
        });

        let frame = rx.borrow().clone();
        assert_eq!(frame.map.markers.len(), 2);
        assert!(frame.legend.contains("2 events"));
        assert!(frame.header.contains("Last update:"));
        assert!(frame.stats.contains("M 5.6"));
        assert!(frame.selected.contains("Click a marker"));

        let id = dashboard.map().markers()[0].0;
        assert!(dashboard.select_marker(id));
        assert!(rx.borrow().selected.contains("Calatagan (Batangas)"));

        dashboard.apply_poll(FetchOutcome {
            query: PolledQuery::Earthquakes,
            result: Err(QuakeError::Api {
                query: Query::Earthquakes,
                status: 503,
            }),
        });
        let frame = rx.borrow().clone();
        assert!(frame.header.contains("Stale"));
        assert_eq!(frame.map.markers.len(), 2);
    }

    #[test]
    fn test_frame_json_shape() {
        let (state, _rx, _tx) = app_state();
        let frame = state.frames.borrow().clone();
        let json = serde_json::to_value(&*frame).expect("json");

        assert_eq!(json["online"], true);
        assert_eq!(json["map"]["state"], "online");
        assert!(json["map"]["markers"].as_array().expect("markers").is_empty());
    }

    #[tokio::test]
    async fn test_action_handlers_forward_commands() {
        let (state, mut rx, _tx) = app_state();

        assert_eq!(refresh_handler(State(state.clone())).await, StatusCode::ACCEPTED);
        assert_eq!(rx.recv().await, Some(Command::Refresh));

        clear_filter_handler(State(state.clone())).await;
        assert_eq!(rx.recv().await, Some(Command::ClearFilter));

        connectivity_handler(State(state.clone()), Form(ConnectivityForm { online: false })).await;
        assert_eq!(rx.recv().await, Some(Command::Connectivity(false)));

        select_marker_handler(State(state.clone()), Path(7)).await;
        assert_eq!(rx.recv().await, Some(Command::SelectMarker(7)));

        let _ = select_row_handler(State(state.clone()), Path(("recent".to_string(), 2))).await;
        assert_eq!(rx.recv().await, Some(Command::SelectRow(ListKind::Recent, 2)));
    }

    #[tokio::test]
    async fn test_filter_form_maps_slider_extremes_to_no_bound() {
        let (state, mut rx, _tx) = app_state();

        let form = FilterForm {
            min_magnitude: 4.5,
            max_magnitude: 10.0,
            location: "  Batangas ".to_string(),
        };
        filter_handler(State(state), Form(form)).await;

        assert_eq!(
            rx.recv().await,
            Some(Command::Filter(FilterCriteria {
                min_magnitude: Some(4.5),
                max_magnitude: None,
                location: Some("Batangas".to_string()),
            }))
        );
    }

    #[tokio::test]
    async fn test_unknown_list_is_not_found() {
        let (state, mut rx, _tx) = app_state();

        let response = select_row_handler(State(state), Path(("bogus".to_string(), 0)))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dispatch_without_dashboard_task() {
        let (state, rx, _tx) = app_state();
        drop(rx);

        assert_eq!(refresh_handler(State(state)).await, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(health_handler().await, "OK");
    }
}
